//! Succulent Shop Core - Shared domain library.
//!
//! This crate holds the rules every other component of the shop relies on:
//! - `api` - JSON/HTTP backend (axum + `PostgreSQL`)
//! - `cli` - Command-line tools for migrations and maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Order totals, delivery pricing, the order status machine,
//! sale pricing and request validation all live here so they can be tested
//! without a running server.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, money helpers and domain enums
//! - [`pricing`] - Sale discount projection (and the legacy stored-price toggle)
//! - [`order`] - Order totals, delivery cost, order codes and the status log
//! - [`product`] - Product entity and type/pot/tool field rules
//! - [`validation`] - Aggregated violation collection
//! - [`pagination`] - Page requests and page envelopes
//! - [`requests`] - Inbound request bodies with their validators

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod order;
pub mod pagination;
pub mod pricing;
pub mod product;
pub mod requests;
pub mod types;
pub mod validation;

pub use order::{Order, OrderItem, OrderTotals, TransitionError};
pub use pagination::{Page, PageRequest, SortDirection};
pub use product::Product;
pub use types::*;
pub use validation::{ValidationError, Violations};
