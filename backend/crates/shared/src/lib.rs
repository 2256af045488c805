//! Shared Kernel
//!
//! Vocabulary shared by every Dewordle crate:
//! - The unified error type and its HTTP classification
//! - Typed UUID identifiers for persisted records
//!
//! Only things with the same meaning in every crate belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
