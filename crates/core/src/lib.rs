//! Orchard Core - Shared domain types.
//!
//! This crate provides the types shared between the Orchard Market server
//! and any client-side tooling:
//!
//! - [`types`] - Newtype wrappers for IDs, emails, roles, and order statuses
//! - [`cart`] - The client-resident cart aggregate
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartItem, ProductRef};
pub use types::*;
