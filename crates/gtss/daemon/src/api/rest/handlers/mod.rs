//! API request handlers

mod entities;
mod system;

pub use entities::*;
pub use system::*;
