//! Infrastructure Layer
//!
//! Repository and notifier implementations.

pub mod memory;
pub mod notifier;
pub mod postgres;
