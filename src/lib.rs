//! Client-side data layer for Tichu tournament scoring front ends.
//!
//! Talks to the tournament REST API and keeps one canonical, shared object
//! per tournament, pair, movement and hand, so every part of a front end
//! observes the same state. Failures come back in one uniform
//! [`Rejection`] shape; identical concurrent fetches are collapsed into a
//! single request.

pub mod config;
mod dto;
pub mod error;
pub mod model;
pub mod services;
pub mod store;

pub use config::ClientConfig;
pub use error::{ClientResult, Rejection};
pub use services::{CodeResolution, TichuClient};
