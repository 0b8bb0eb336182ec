//! Bloom Core - Shared domain library.
//!
//! This crate provides the domain model used across all Bloom components:
//! - `store` - Document store (Postgres or local JSON files)
//! - `storefront` - Public shop API
//! - `admin` - Back-office API
//! - `cli` - Migrations, seeding and maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Pricing, cart merging, shipping quotes,
//! customer aggregates and finance reports all live here so they can be
//! tested without a running store.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, contact details, money, status enums
//! - [`catalog`] - Products, filtering and sorting
//! - [`cart`] - Cart lines with quantity merging, favorites
//! - [`shipping`] - Great-circle distance and delivery fee quotes
//! - [`order`] - Orders, checkout validation, status history
//! - [`customer`] - Customer records and order aggregates
//! - [`chat`] - Feedback, chat messages and the canned responder
//! - [`finance`] - Revenue reports and dashboard metrics

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod chat;
pub mod customer;
pub mod finance;
pub mod order;
pub mod shipping;
pub mod types;

pub use types::*;
