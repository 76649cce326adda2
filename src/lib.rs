pub mod config;
pub mod generator;
pub mod github;
pub mod llm;
pub mod models;
pub mod parser;
pub mod personality;
pub mod store;

pub use config::Config;
