pub mod client;
pub mod retry;

pub use client::{CanisterClient, CanisterClientConfig};
pub use retry::RetryPolicy;
