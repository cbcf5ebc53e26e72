pub mod config;
pub mod gif;
pub mod landscape;
pub mod loader;
pub mod report;
pub mod runner;
pub mod util;
