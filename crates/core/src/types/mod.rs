//! Core types for the shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod catalog;
pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use catalog::{Color, PotSize, PotType, ProductType, ToolType};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::round_money;
pub use status::{DeliveryMethod, OrderStatus, Role};

/// Error returned when a string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} value: {value}")]
pub struct UnknownVariant {
    /// Human readable name of the enum being parsed (e.g. "product type").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
