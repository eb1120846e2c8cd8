pub mod event_bus;
pub mod frame;

pub use event_bus::*;
pub use frame::*;
