//! Switching between top-level layouts.
//!
//! The primary layout's view is expensive (it owns the library tree, scroll positions, open
//! device views), so it's kept aside in a `ViewSlot` while an alternate layout shows and put
//! back on return. Alternates are rebuilt on every activation.
//!
//! The surface destroys whatever it still shows when told to replace it, so the primary view is
//! always detached and captured before anything else happens.

use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;

use super::slot::{SlotOccupied, ViewSlot};
use super::surface::{DisplaySurface, ViewHandle, ViewId};

/// The layout whose view survives switching away and back.
pub const PRIMARY_LAYOUT_ID: &str = "primary";

/// One top-level presentation of the app.
pub trait Layout<V> {
    /// Human-readable name for the layout picker.
    fn name(&self) -> &str;

    /// Constructs a new view tree for this layout.
    fn build_view(&mut self) -> V;

    /// Captures whatever should survive this layout being rebuilt later.
    fn save_state(&self, _view: &V) -> Option<serde_json::Value> {
        None
    }

    /// Applies state from `save_state` to a freshly built view.
    fn restore_state(&mut self, _view: &mut V, _state: &serde_json::Value) {}

    /// Called once the view is on screen.
    fn on_activated(&mut self, _view: &mut V) {}

    /// Called on the outgoing view after its state is saved, before it's kept aside or dropped.
    /// Stop timers and detach from shared services here.
    fn on_deactivated(&mut self, _view: &mut V) {}
}

/// Which layouts exist and which one is showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSelection {
    pub active_id: String,
    pub available_ids: Vec<String>,
}

/// What a successful `switch_to` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutTransition {
    /// The target was already active.
    Unchanged,
    Switched {
        from: String,
        to: String,
        /// The view now on screen
        view: ViewId,
        /// True if the view came back out of the slot instead of being built
        restored: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutError {
    UnknownLayout { id: String },
    /// The slot already held a view when the primary one needed to go there
    SlotOccupied { held: ViewId },
    DuplicateLayout { id: String },
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLayout { id } => write!(f, "Unknown layout: {}", id),
            Self::SlotOccupied { held } => write!(f, "Primary view can't be kept aside, slot already holds {}", held),
            Self::DuplicateLayout { id } => write!(f, "Layout already registered: {}", id),
        }
    }
}

impl std::error::Error for LayoutError {}

impl<V> From<&SlotOccupied<V>> for LayoutError {
    fn from(err: &SlotOccupied<V>) -> Self {
        Self::SlotOccupied { held: err.held }
    }
}

struct RegisteredLayout<V> {
    id: String,
    layout: Box<dyn Layout<V>>,
}

/// Owns the display surface and decides which layout's view it shows.
pub struct LayoutStateMachine<V, S: DisplaySurface<V>> {
    surface: S,
    /// Registration order, primary first.
    layouts: Vec<RegisteredLayout<V>>,
    active_id: String,
    slot: ViewSlot<V>,
    saved_states: HashMap<String, serde_json::Value>,
}

impl<V, S: DisplaySurface<V>> LayoutStateMachine<V, S> {
    /// Creates a machine with `primary` registered as the primary layout. Nothing is built until
    /// `initialize` or the first switch.
    pub fn new(surface: S, primary: Box<dyn Layout<V>>) -> Self {
        Self {
            surface,
            layouts: vec![RegisteredLayout {
                id: PRIMARY_LAYOUT_ID.to_string(),
                layout: primary,
            }],
            active_id: PRIMARY_LAYOUT_ID.to_string(),
            slot: ViewSlot::new(),
            saved_states: HashMap::new(),
        }
    }

    /// Adds an alternate layout.
    pub fn register(&mut self, id: impl Into<String>, layout: Box<dyn Layout<V>>) -> Result<(), LayoutError> {
        let id = id.into();
        if self.position(&id).is_some() {
            return Err(LayoutError::DuplicateLayout { id });
        }
        debug!("LayoutStateMachine::register: {} ({})", id, layout.name());
        self.layouts.push(RegisteredLayout { id, layout });
        Ok(())
    }

    /// `(id, name)` pairs in registration order.
    pub fn available_layouts(&self) -> Vec<(String, String)> {
        self.layouts
            .iter()
            .map(|l| (l.id.clone(), l.layout.name().to_string()))
            .collect()
    }

    pub fn selection(&self) -> LayoutSelection {
        LayoutSelection {
            active_id: self.active_id.clone(),
            available_ids: self.layouts.iter().map(|l| l.id.clone()).collect(),
        }
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Startup: shows the primary view, then switches to `preferred` if it's a known layout.
    /// An unknown preference (say, from an older version's settings) falls back to primary.
    pub fn initialize(&mut self, preferred: Option<&str>) -> Result<LayoutTransition, LayoutError> {
        if self.surface.current_view().is_none() && self.active_id == PRIMARY_LAYOUT_ID {
            let view = self.build(0);
            let id = view.id();
            self.install(0, view);
            info!("LayoutStateMachine::initialize: primary view {} shown", id);
        }

        match preferred {
            Some(target) if self.position(target).is_some() => self.switch_to(target),
            Some(target) => {
                warn!(
                    "LayoutStateMachine::initialize: unknown layout '{}', staying on {}",
                    target, self.active_id
                );
                Ok(LayoutTransition::Unchanged)
            }
            None => Ok(LayoutTransition::Unchanged),
        }
    }

    /// Makes `target_id` the active layout.
    ///
    /// Either completes or fails before anything is destroyed: an unknown id or an occupied slot
    /// leaves the current view on screen and the active id unchanged, and no hook runs.
    pub fn switch_to(&mut self, target_id: &str) -> Result<LayoutTransition, LayoutError> {
        let Some(target) = self.position(target_id) else {
            warn!("LayoutStateMachine::switch_to: unknown layout '{}'", target_id);
            return Err(LayoutError::UnknownLayout {
                id: target_id.to_string(),
            });
        };
        if target_id == self.active_id {
            debug!("LayoutStateMachine::switch_to: already on {}", target_id);
            return Ok(LayoutTransition::Unchanged);
        }

        let from = self.active_id.clone();
        let outgoing_state = match (self.position(&from), self.surface.current_view()) {
            (Some(index), Some(view)) => self.layouts[index].layout.save_state(view.view()),
            _ => None,
        };

        if from == PRIMARY_LAYOUT_ID
            && let Some(held) = self.slot.held_id()
        {
            warn!("LayoutStateMachine::switch_to: slot already holds {}, staying on primary", held);
            return Err(LayoutError::SlotOccupied { held });
        }
        if let (Some(index), Some(view)) = (self.position(&from), self.surface.current_view_mut()) {
            self.layouts[index].layout.on_deactivated(view.view_mut());
        }

        // Must happen before the surface is told to replace anything
        if from == PRIMARY_LAYOUT_ID
            && let Some(primary) = self.surface.take_view()
            && let Err(err) = self.slot.capture(primary)
        {
            let error = LayoutError::from(&err);
            warn!("LayoutStateMachine::switch_to: {}, staying on primary", err);
            self.surface.replace_view(err.rejected);
            return Err(error);
        }

        if let Some(state) = outgoing_state {
            self.saved_states.insert(from.clone(), state);
        }

        let (view, restored) = match (target_id == PRIMARY_LAYOUT_ID).then(|| self.slot.take()).flatten() {
            Some(view) => (view, true),
            None => (self.build(target), false),
        };
        let view_id = view.id();
        self.install(target, view);
        self.active_id = target_id.to_string();

        info!(
            "LayoutStateMachine::switch_to: {} -> {} ({}, {})",
            from,
            target_id,
            view_id,
            if restored { "restored" } else { "built" }
        );
        Ok(LayoutTransition::Switched {
            from,
            to: target_id.to_string(),
            view: view_id,
            restored,
        })
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.layouts.iter().position(|l| l.id == id)
    }

    /// Builds a fresh view and applies the layout's saved state to it.
    fn build(&mut self, index: usize) -> ViewHandle<V> {
        let entry = &mut self.layouts[index];
        let mut view = entry.layout.build_view();
        if let Some(state) = self.saved_states.get(&entry.id) {
            entry.layout.restore_state(&mut view, state);
        }
        ViewHandle::new(view)
    }

    fn install(&mut self, index: usize, view: ViewHandle<V>) {
        self.surface.replace_view(view);
        if let Some(shown) = self.surface.current_view_mut() {
            self.layouts[index].layout.on_activated(shown.view_mut());
        }
    }
}
