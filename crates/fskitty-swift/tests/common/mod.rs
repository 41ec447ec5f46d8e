//! Common test utilities for fskitty-swift integration tests.

#![allow(dead_code)]

pub mod harness;

pub use harness::{TestBackend, TestSession};
