//! Wire models for the HTTP surface.

mod background;

pub use background::*;
