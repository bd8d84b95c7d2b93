//! Progulka Engine Library
//!
//! This library provides the core functionality of the Progulka route
//! recommendation engine. It is used by both the main binary and
//! integration tests.

/// Configuration management module
pub mod config;

/// Engine error types
pub mod error;

/// Telemetry and Observability
pub mod telemetry;

/// Remote inference capabilities (embeddings, chat completions)
pub mod inference;

/// Sightseeing category taxonomy
pub mod taxonomy;

/// Place catalog loading
pub mod catalog;

/// Query-to-category classification
pub mod classifier;

/// Candidate place selection
pub mod selector;

/// Route composition (generative with deterministic fallback)
pub mod composer;

/// Itinerary assembly from a composed route and the catalog
pub mod assembler;

/// Engine entry point wiring the pipeline together
pub mod engine;

/// HTTP API surface
pub mod server;

/// Telegram bot surface
pub mod bot;

/// CLI interface module
pub mod cli;
