//! Cucumber step definitions for interface tests.

pub mod lease_store;
