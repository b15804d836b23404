//! Lazy child loading.
//!
//! A node moves through `Unloaded -> Loading -> Loaded`. Expanding an unloaded
//! node marks it loading and queues a request on the view state; the
//! [`LazyLoader`] turns queued requests into fetches against a [`ChildSource`]
//! and hands completed [`FetchOutcome`]s back for merging. Merging re-checks
//! that the node still exists, so a late answer for a removed node is dropped.

use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use rustc_hash::{FxBuildHasher, FxHashSet};
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::forest::Forest;
use crate::model::{NodeId, NodeKind, NodeSeed};
use crate::state::TreeViewState;

pub type FetchResult<K> = Result<Vec<NodeSeed<K>>, FetchError>;
pub type FetchFuture<K> = BoxFuture<'static, FetchResult<K>>;

/// Data source that resolves (or fails) exactly once per call.
pub trait ChildSource<K: NodeKind> {
    fn fetch_children(&self, id: &NodeId) -> FetchFuture<K>;
}

impl<K, F> ChildSource<K> for F
where
    K: NodeKind,
    F: Fn(&NodeId) -> FetchFuture<K>,
{
    #[inline]
    fn fetch_children(&self, id: &NodeId) -> FetchFuture<K> {
        self(id)
    }
}

/// A completed fetch, ready to be merged.
pub struct FetchOutcome<K: NodeKind> {
    pub id: NodeId,
    pub result: FetchResult<K>,
}

/// What merging a [`FetchOutcome`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchApplied {
    /// Children were installed and the node expanded.
    Installed,
    /// The fetch failed; the node is unloaded again and may be retried.
    Failed,
    /// The node was removed while the fetch was in flight; the result was dropped.
    Stale,
}

/// Marks `id` as loading if its children are unknown and no fetch is in flight.
///
/// Returns `None` when no fetch should be started.
pub fn begin_load<K: NodeKind>(forest: &Forest<K>, id: &NodeId) -> Option<Forest<K>> {
    let node = forest.get(id)?;
    if node.children().is_known() || node.is_loading() {
        return None;
    }
    Some(forest.set_loading(id, true))
}

/// Merges a completed fetch into `forest`.
pub fn apply_outcome<K: NodeKind>(
    forest: &Forest<K>,
    outcome: FetchOutcome<K>,
) -> (Forest<K>, FetchApplied) {
    let FetchOutcome { id, result } = outcome;
    if !forest.contains(&id) {
        debug!(kind = K::KIND, %id, "stale fetch result dropped");
        return (forest.clone(), FetchApplied::Stale);
    }
    match result {
        Ok(children) => {
            debug!(kind = K::KIND, %id, count = children.len(), "children installed");
            (forest.set_children(&id, children), FetchApplied::Installed)
        }
        Err(err) => {
            warn!(kind = K::KIND, %id, error = %err, "children fetch failed");
            (forest.set_loading(&id, false), FetchApplied::Failed)
        }
    }
}

/// Drives fetches for any number of nodes concurrently, at most one per node.
pub struct LazyLoader<K: NodeKind, S> {
    source: S,
    in_flight: FuturesUnordered<BoxFuture<'static, FetchOutcome<K>>>,
    pending: FxHashSet<NodeId>,
}

impl<K: NodeKind, S: ChildSource<K>> LazyLoader<K, S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            in_flight: FuturesUnordered::new(),
            pending: FxHashSet::with_hasher(FxBuildHasher),
        }
    }

    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Number of fetches not yet resolved.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Starts a fetch for `id`; returns `false` if one is already in flight.
    pub fn dispatch(&mut self, id: NodeId) -> bool {
        if !self.pending.insert(id.clone()) {
            debug!(kind = K::KIND, %id, "fetch already in flight");
            return false;
        }
        let fetch = self.source.fetch_children(&id);
        self.in_flight.push(
            async move {
                let result = fetch.await;
                FetchOutcome { id, result }
            }
            .boxed(),
        );
        true
    }

    /// Starts fetches for every request queued on `state`.
    pub fn dispatch_pending(&mut self, state: &mut TreeViewState<K>) -> usize {
        let mut started = 0;
        for id in state.take_fetch_requests() {
            if self.dispatch(id) {
                started += 1;
            }
        }
        started
    }

    /// Waits for the next fetch to resolve. `None` once nothing is in flight.
    pub async fn next_outcome(&mut self) -> Option<FetchOutcome<K>> {
        let outcome = self.in_flight.next().await?;
        self.pending.remove(&outcome.id);
        Some(outcome)
    }

    /// Dispatches and merges until no fetch remains, returning how many were merged.
    pub async fn run_until_idle(&mut self, state: &mut TreeViewState<K>) -> usize {
        let mut merged = 0;
        loop {
            self.dispatch_pending(state);
            let Some(outcome) = self.next_outcome().await else {
                break;
            };
            state.apply_fetch(outcome);
            merged += 1;
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::kinds::{Folder, FolderFields};
    use crate::model::ForestOrigin;

    #[derive(Clone, Default)]
    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    impl ChildSource<Folder> for CountingSource {
        fn fetch_children(&self, id: &NodeId) -> FetchFuture<Folder> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let parent = id.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok((0..3)
                    .map(|i| {
                        let id = format!("{parent}-{i}");
                        NodeSeed::lazy(id.as_str(), FolderFields::new(id.as_str()))
                    })
                    .collect())
            }
            .boxed()
        }
    }

    fn failing(_: &NodeId) -> FetchFuture<Folder> {
        async { Err(FetchError::rejected("offline")) }.boxed()
    }

    fn lazy_state() -> TreeViewState<Folder> {
        let forest = Forest::from_seeds(
            ForestOrigin(0),
            [
                NodeSeed::lazy("x", FolderFields::new("x")),
                NodeSeed::lazy("y", FolderFields::new("y")),
            ],
        );
        TreeViewState::new(forest)
    }

    #[test]
    fn begin_load_only_for_idle_unloaded_nodes() {
        let forest = lazy_state().forest().clone();
        let x = NodeId::from("x");

        let loading = begin_load(&forest, &x).expect("x is unloaded");
        assert!(loading.get(&x).is_some_and(|n| n.is_loading()));
        assert!(begin_load(&loading, &x).is_none());
        assert!(begin_load(&forest, &NodeId::from("missing")).is_none());
    }

    #[tokio::test]
    async fn installs_fetched_children() {
        let source = CountingSource::default();
        let mut loader = LazyLoader::new(source.clone());
        let mut state = lazy_state();
        let x = NodeId::from("x");

        state.toggle(&x);
        assert_eq!(loader.dispatch_pending(&mut state), 1);
        let merged = loader.run_until_idle(&mut state).await;

        assert_eq!(merged, 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        let ids: Vec<_> = state.view().ids().map(NodeId::as_str).collect();
        assert_eq!(ids, vec!["x", "x-0", "x-1", "x-2", "y"]);
    }

    #[tokio::test]
    async fn concurrent_fetches_for_different_nodes() {
        let source = CountingSource::default();
        let mut loader = LazyLoader::new(source.clone());
        let mut state = lazy_state();

        state.toggle(&NodeId::from("x"));
        state.toggle(&NodeId::from("y"));
        assert_eq!(loader.dispatch_pending(&mut state), 2);
        assert_eq!(loader.in_flight(), 2);

        loader.run_until_idle(&mut state).await;
        assert_eq!(state.view().len(), 8);
        assert!(loader.is_idle());
    }

    #[tokio::test]
    async fn dispatch_dedupes_in_flight_node() {
        let source = CountingSource::default();
        let mut loader = LazyLoader::new(source.clone());

        assert!(loader.dispatch(NodeId::from("x")));
        assert!(!loader.dispatch(NodeId::from("x")));
        assert_eq!(loader.in_flight(), 1);

        let outcome = loader.next_outcome().await.expect("one fetch");
        assert_eq!(outcome.id.as_str(), "x");
        assert!(loader.dispatch(NodeId::from("x")));
    }

    #[tokio::test]
    async fn failure_reverts_to_unloaded_and_allows_retry() {
        let mut loader = LazyLoader::new(failing);
        let mut state = lazy_state();
        let x = NodeId::from("x");

        state.toggle(&x);
        loader.dispatch_pending(&mut state);
        let outcome = loader.next_outcome().await.expect("one fetch");
        assert_eq!(state.apply_fetch(outcome), FetchApplied::Failed);

        let node = state.forest().get(&x).unwrap();
        assert!(!node.is_loading());
        assert!(!node.children().is_known());

        state.toggle(&x);
        assert_eq!(loader.dispatch_pending(&mut state), 1);
    }

    #[tokio::test]
    async fn result_for_removed_node_is_stale() {
        let mut loader = LazyLoader::new(CountingSource::default());
        let mut state = lazy_state();
        let x = NodeId::from("x");

        state.toggle(&x);
        loader.dispatch_pending(&mut state);
        assert!(state.delete(&x));

        let outcome = loader.next_outcome().await.expect("one fetch");
        assert_eq!(state.apply_fetch(outcome), FetchApplied::Stale);
        assert_eq!(state.forest().len(), 1);
        assert!(!state.forest().contains(&NodeId::from("x-0")));
    }
}
