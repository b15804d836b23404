use crate::model::NodeKind;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Folder hierarchy kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Folder;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderFields {
    pub name: String,
}

impl FolderFields {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl NodeKind for Folder {
    type Fields = FolderFields;
    const KIND: &'static str = "folder";
}

/// Book hierarchy kind (series, volumes, chapters...).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Book;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookFields {
    pub title: String,
    pub author: String,
}

impl BookFields {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
        }
    }
}

impl NodeKind for Book {
    type Fields = BookFields;
    const KIND: &'static str = "book";
}
