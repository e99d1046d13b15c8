pub mod client;
mod mapper;
pub mod wire;

pub use client::GitHubPlatform;
