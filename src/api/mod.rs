pub mod client;

pub use client::{GradingClient, GradingOutcome, GradingRequest};
