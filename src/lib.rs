pub mod config;
pub mod error;
pub mod grid;
pub mod instance;
pub mod optimizer;
pub mod results;
pub mod solver;
// cmd and reports belong to the binary (main.rs).
