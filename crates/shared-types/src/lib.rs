//! # Shared Types Crate
//!
//! Core domain entities shared by every Cascade-Chain subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: all cross-subsystem types are defined here.
//! - **Deterministic Encoding**: entity hashes are Keccak-256 over the
//!   canonical bincode encoding, so every subsystem derives the same ids.

pub mod entities;

pub use entities::*;
