pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod plan;
pub mod report;
pub mod score;
pub mod source;
pub mod state;
pub mod util;
