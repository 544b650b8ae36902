//! Holder for the primary view while another layout is showing.

use super::surface::{ViewHandle, ViewId};

/// Returned when capturing into a slot that already holds a view. Carries the rejected handle
/// back to the caller so nothing gets destroyed.
pub struct SlotOccupied<V> {
    pub rejected: ViewHandle<V>,
    /// The view already in the slot.
    pub held: ViewId,
}

impl<V> std::fmt::Debug for SlotOccupied<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotOccupied")
            .field("rejected", &self.rejected.id())
            .field("held", &self.held)
            .finish()
    }
}

impl<V> std::fmt::Display for SlotOccupied<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Can't keep {} aside, the slot already holds {}",
            self.rejected.id(),
            self.held
        )
    }
}

impl<V> std::error::Error for SlotOccupied<V> {}

/// Keeps at most one view alive while it's off screen. Foreground use only.
pub struct ViewSlot<V> {
    held: Option<ViewHandle<V>>,
}

impl<V> Default for ViewSlot<V> {
    fn default() -> Self {
        Self { held: None }
    }
}

impl<V> ViewSlot<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture(&mut self, handle: ViewHandle<V>) -> Result<(), SlotOccupied<V>> {
        match &self.held {
            Some(held) => Err(SlotOccupied {
                rejected: handle,
                held: held.id(),
            }),
            None => {
                self.held = Some(handle);
                Ok(())
            }
        }
    }

    pub fn take(&mut self) -> Option<ViewHandle<V>> {
        self.held.take()
    }

    pub fn held_id(&self) -> Option<ViewId> {
        self.held.as_ref().map(ViewHandle::id)
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_none()
    }
}
