pub mod client;
pub mod http;

pub use client::{GitHubClient, InvalidUrlError, PROGRESS_HEADER};
pub use http::{ApiError, RateLimitState, RestClient};
