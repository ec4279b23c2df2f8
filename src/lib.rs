//! Confab - Conference registration and session catalog backend.
//!
//! This crate implements transactional seat booking for conferences and a
//! session catalog with per-attendee wishlists, backed by an abstract
//! transactional document store and a side cache.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
