//! Views and the surface that displays them.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one constructed view. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ViewId(u64);

impl std::fmt::Display for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "view-{}", self.0)
    }
}

/// Sole owner of a constructed view tree.
///
/// Not `Clone`: a view lives in exactly one place at a time (the surface, the `ViewSlot`, or
/// nowhere, which means it was dropped).
#[derive(Debug)]
pub struct ViewHandle<V> {
    id: ViewId,
    view: V,
}

impl<V> ViewHandle<V> {
    pub fn new(view: V) -> Self {
        Self {
            id: ViewId(NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed)),
            view,
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn into_inner(self) -> V {
        self.view
    }
}

/// The host area that shows one top-level view.
pub trait DisplaySurface<V> {
    /// Detaches the shown view and hands it back intact. The surface is empty afterwards.
    fn take_view(&mut self) -> Option<ViewHandle<V>>;

    /// Shows `view`. Whatever view was still attached is destroyed.
    fn replace_view(&mut self, view: ViewHandle<V>);

    fn current_view(&self) -> Option<&ViewHandle<V>>;

    fn current_view_mut(&mut self) -> Option<&mut ViewHandle<V>>;
}
