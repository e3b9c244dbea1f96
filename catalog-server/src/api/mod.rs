//! API routing modules
//!
//! # Structure
//!
//! - [`health`] - health check
//! - [`products`] - product CRUD, listing and photo attachment
//! - [`uploads`] - uploaded photo file serving

pub mod health;
pub mod products;
pub mod uploads;
