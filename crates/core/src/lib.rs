#![forbid(unsafe_code)]

//! Shared models, request bodies and response rules for the xray-load scenario.

pub mod api;
pub mod config;
pub mod model;
pub mod names;
pub mod time;
pub mod verdict;

pub use config::*;
pub use model::*;
pub use names::*;
pub use time::*;
pub use verdict::*;
