//! Context stack
//!
//! The stack of frames the user has navigated into, plus the pinned listings that make
//! index selectors (`set vpc 2`) meaningful.

pub mod frame;
pub mod selection;
pub mod stack;

pub use frame::{ContextFrame, FrameDetail};
pub use selection::{select, PinKey, Selector, SelectionPins};
pub use stack::{ContextStack, MAX_DEPTH};
