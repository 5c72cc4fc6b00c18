//! Shared types, errors, and configuration for the e-coop posting engine.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Money and rate rounding with decimal precision
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, EngineConfig};
pub use error::{AppError, AppResult};
