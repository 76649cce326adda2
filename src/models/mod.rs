pub mod github;
pub mod problem;
pub mod task;
