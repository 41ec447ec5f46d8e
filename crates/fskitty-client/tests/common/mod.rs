//! Common test utilities for client integration tests.

#![allow(dead_code)]

pub mod assertions;
pub mod harness;

pub use assertions::*;
pub use harness::{FakeBackend, TestServer, init_tracing};
