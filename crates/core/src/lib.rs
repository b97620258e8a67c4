//! Storefront Cart Core - Shared types library.
//!
//! This crate provides common types used across the cart workspace:
//! - `storefront-cart` - Cart state container, stock client and storage backends
//! - `storefront-cart-cli` - Command-line driver for the cart
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe product IDs and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
