//! Pure application state: image slots and mode selections.
//! Nothing in here touches the UI toolkit, the camera, or the network.

pub mod mode;
pub mod slots;

pub use mode::{GradingMode, InputMode};
pub use slots::{ImageSlot, SlotId, SlotPair};
