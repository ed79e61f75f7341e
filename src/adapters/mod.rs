//! Device adapter implementations
//!
//! This module contains implementations of the `DeviceAdapter` trait.
//! Protocol bindings for real instruments live in their own crates; the
//! in-memory mock here backs the tests and the demo binary.

pub mod mock;

pub use mock::MockAdapter;
