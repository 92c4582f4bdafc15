// crates/translatable-config/src/lib.rs
// ============================================================================
// Module: Translatable Config Library
// Description: Canonical configuration model and validation.
// Purpose: Select the backing store, fallback policy, and delete lifecycle.
// Dependencies: translatable-core, translatable-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Strict, fail-closed configuration for the translation overlay: the
//! backing-store connection, the global missing-translation fallback
//! directive with per-record-type overrides, and the soft-delete flush
//! policy. Loading guards path length, file size, and encoding before the
//! TOML parser runs.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ConfigError;
pub use config::FallbackBehavior;
pub use config::FallbackConfig;
pub use config::FallbackOverride;
pub use config::LifecycleConfig;
pub use config::TranslatableConfig;
