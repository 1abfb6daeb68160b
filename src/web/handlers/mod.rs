//! API handlers for the filegate web API.

pub mod upload;

pub use upload::*;
