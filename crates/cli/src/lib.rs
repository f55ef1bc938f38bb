//! Public library modules for the CLI crate
pub mod history;
pub mod migrate;
pub mod save;
