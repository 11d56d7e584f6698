//! Domain models for stock tracking

mod batch;
mod catalog;
mod cost;
mod movement;
mod status;
mod stock;

pub use batch::*;
pub use catalog::*;
pub use cost::*;
pub use movement::*;
pub use status::*;
pub use stock::*;
