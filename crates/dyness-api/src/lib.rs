// dyness-api: Async Rust client for the Dyness battery-storage open API.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod sign;

pub use client::{DEFAULT_TIMEOUT, DynessClient, Region};
pub use error::Error;
pub use models::{Envelope, PointRecord, SUCCESS_CODES};
