//! Client side of the detection/clustering backend.

mod client;
mod error;

pub use client::{Backend, HttpBackend};
pub use error::ApiError;
