use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::action::TreeAction;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum KeymapProfile {
    #[default]
    Default,
    Vim,
    Arrows,
}

#[derive(Clone, Copy, Debug)]
pub struct TreeKeyBindings {
    profile: KeymapProfile,
}

impl Default for TreeKeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeKeyBindings {
    pub const fn new() -> Self {
        Self {
            profile: KeymapProfile::Default,
        }
    }

    pub const fn with_profile(profile: KeymapProfile) -> Self {
        Self { profile }
    }

    pub const fn profile(&self) -> KeymapProfile {
        self.profile
    }

    pub const fn set_profile(&mut self, profile: KeymapProfile) {
        self.profile = profile;
    }

    pub fn resolve<C>(&self, key: KeyEvent) -> Option<TreeAction<C>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return None;
        }

        let nav_action = match self.profile {
            KeymapProfile::Default => Self::resolve_default_nav(key),
            KeymapProfile::Vim => Self::resolve_vim_nav(key),
            KeymapProfile::Arrows => Self::resolve_arrow_nav(key),
        };
        if nav_action.is_some() {
            return nav_action;
        }

        Self::resolve_common(key)
    }

    pub fn resolve_with<C, F>(&self, key: KeyEvent, custom: F) -> Option<TreeAction<C>>
    where
        F: Fn(KeyEvent) -> Option<C>,
    {
        if let Some(action) = custom(key) {
            return Some(TreeAction::Custom(action));
        }

        self.resolve(key)
    }

    const fn resolve_default_nav<C>(key: KeyEvent) -> Option<TreeAction<C>> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(TreeAction::SelectPrev),
            KeyCode::Down | KeyCode::Char('j') => Some(TreeAction::SelectNext),
            KeyCode::Left | KeyCode::Char('h') => Some(TreeAction::CollapseOrSelectParent),
            KeyCode::Right | KeyCode::Char('l') => Some(TreeAction::ExpandOrSelectChild),
            _ => None,
        }
    }

    const fn resolve_vim_nav<C>(key: KeyEvent) -> Option<TreeAction<C>> {
        match key.code {
            KeyCode::Char('k') => Some(TreeAction::SelectPrev),
            KeyCode::Char('j') => Some(TreeAction::SelectNext),
            KeyCode::Char('h') => Some(TreeAction::CollapseOrSelectParent),
            KeyCode::Char('l') => Some(TreeAction::ExpandOrSelectChild),
            KeyCode::Char('g') => Some(TreeAction::SelectFirst),
            KeyCode::Char('G') => Some(TreeAction::SelectLast),
            _ => None,
        }
    }

    const fn resolve_arrow_nav<C>(key: KeyEvent) -> Option<TreeAction<C>> {
        match key.code {
            KeyCode::Up => Some(TreeAction::SelectPrev),
            KeyCode::Down => Some(TreeAction::SelectNext),
            KeyCode::Left => Some(TreeAction::CollapseOrSelectParent),
            KeyCode::Right => Some(TreeAction::ExpandOrSelectChild),
            _ => None,
        }
    }

    const fn resolve_common<C>(key: KeyEvent) -> Option<TreeAction<C>> {
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => Some(TreeAction::ToggleNode),
            KeyCode::Home => Some(TreeAction::SelectFirst),
            KeyCode::End => Some(TreeAction::SelectLast),
            KeyCode::Char('+' | '*') => Some(TreeAction::ExpandAll),
            KeyCode::Char('-') => Some(TreeAction::CollapseAll),
            KeyCode::Char('r') => Some(TreeAction::Reset),
            KeyCode::Delete | KeyCode::Char('D') => Some(TreeAction::DeleteNode),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrows_profile_leaves_letters_alone() {
        let bindings = TreeKeyBindings::with_profile(KeymapProfile::Arrows);

        assert_eq!(bindings.resolve::<()>(key(KeyCode::Char('j'))), None);
        assert_eq!(
            bindings.resolve::<()>(key(KeyCode::Right)),
            Some(TreeAction::ExpandOrSelectChild)
        );
    }

    #[test]
    fn enter_and_space_toggle() {
        let bindings = TreeKeyBindings::new();

        assert_eq!(bindings.resolve::<()>(key(KeyCode::Enter)), Some(TreeAction::ToggleNode));
        assert_eq!(bindings.resolve::<()>(key(KeyCode::Char(' '))), Some(TreeAction::ToggleNode));
        assert_eq!(bindings.resolve::<()>(key(KeyCode::Delete)), Some(TreeAction::DeleteNode));
    }

    #[test]
    fn reset_is_bound_in_every_profile() {
        for profile in [KeymapProfile::Default, KeymapProfile::Vim, KeymapProfile::Arrows] {
            let bindings = TreeKeyBindings::with_profile(profile);
            assert_eq!(bindings.resolve::<()>(key(KeyCode::Char('r'))), Some(TreeAction::Reset));
        }
    }

    #[test]
    fn custom_mapping_wins() {
        let bindings = TreeKeyBindings::new();
        let custom = |event: KeyEvent| (event.code == KeyCode::Char('j')).then_some(42_u8);

        assert_eq!(
            bindings.resolve_with(key(KeyCode::Char('j')), custom),
            Some(TreeAction::Custom(42))
        );
        assert_eq!(
            bindings.resolve_with(
                KeyEvent::new(KeyCode::Char('j'), KeyModifiers::CONTROL),
                |_| None::<u8>
            ),
            None
        );
    }
}
