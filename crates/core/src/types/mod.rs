//! Primitive types shared by every Bloom component.
//!
//! This module provides type-safe wrappers for ids, contact details, money
//! and the status enums stored in documents.

pub mod contact;
pub mod id;
pub mod money;
pub mod status;

pub use contact::{ContactError, Email, Phone};
pub use id::*;
pub use money::{CurrencyCode, Money};
pub use status::*;
