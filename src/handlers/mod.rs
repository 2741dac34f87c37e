//! Handler implementations

pub mod stream;

pub use stream::{SharedBuffer, Sink, StreamHandler};

pub use crate::core::Handler;
