//! Shared test utilities for stockmeta integration tests.
//!
//! This module provides:
//! - In-memory image fixtures generated with the `image` crate
//! - `FakeExtractor`, a scriptable stand-in for the inference service
//! - `MockServer`, a loopback HTTP stub of the `generateContent` endpoint

pub mod extractors;
pub mod images;
pub mod mock_server;

pub use extractors::*;
pub use images::*;
pub use mock_server::{candidate_response, MockServer, RecordedRequest};
