//! Common library for the Maly identity platform
//!
//! This crate provides shared infrastructure used across the Maly services:
//! PostgreSQL connection pooling, configuration, and error types.

pub mod database;
pub mod error;
