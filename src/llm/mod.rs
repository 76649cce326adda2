pub mod client;

pub use client::{NullGenerator, TextGenerator};
