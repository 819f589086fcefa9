#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use mesh_validator_api as api;
pub use mesh_validator_checks as checks;
pub use mesh_validator_core as core;

mod args;
mod resources;

pub use self::{args::Args, resources::Resources};
