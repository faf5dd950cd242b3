//! CLI command implementations

pub mod generate;
pub mod scan;
pub mod validate;
pub mod verify;
