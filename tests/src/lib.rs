//! # Cascade-Chain Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── properties/       # Property tests over the core invariants
//! │   ├── delta_set.rs
//! │   ├── observer_symmetry.rs
//! │   ├── dispatcher_ordering.rs
//! │   └── pruning.rs
//! │
//! └── integration/      # Cross-subsystem scenarios
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p cascade-tests
//!
//! # By category
//! cargo test -p cascade-tests properties::
//! cargo test -p cascade-tests integration::
//! ```

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
pub mod properties;
