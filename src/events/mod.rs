pub mod keyboard;
pub mod window;

pub use keyboard::{KeyState, LogicalKey, Modifiers, RawKeyEvent};
pub use window::{WindowGeometry, WindowHandle, WindowId};
