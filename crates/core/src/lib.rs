//! Core library: configuration, usage records, backend selection and the record transfer.

pub mod config;
pub mod models;
pub mod selector;
pub mod store;
pub mod transfer;
