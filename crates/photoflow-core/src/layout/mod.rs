//! Top-level layouts and the view they show.
//!
//! Views are owned through move-only `ViewHandle`s. The `LayoutStateMachine` is the only thing
//! that moves them between the display surface and the `ViewSlot`.

mod machine;
mod slot;
mod surface;


pub use machine::{Layout, LayoutError, LayoutSelection, LayoutStateMachine, LayoutTransition, PRIMARY_LAYOUT_ID};
pub use slot::{SlotOccupied, ViewSlot};
pub use surface::{DisplaySurface, ViewHandle, ViewId};
