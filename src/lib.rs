pub mod catalog;
pub mod config;
pub mod dsl;
pub mod loader;
