// crates/translatable-store-sqlite/src/lib.rs
// ============================================================================
// Module: Translatable SQLite Store Library
// Description: Durable TranslationGateway implementation backed by SQLite.
// Purpose: Persist record translations under a composite primary key.
// Dependencies: translatable-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! SQLite-backed implementation of the translation gateway contract. Rows
//! are keyed by (translatable_type, translatable_id, locale, key); upserts
//! with the same composite key overwrite the value, and every gateway call
//! executes as one transaction.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteStoreOpCounts;
pub use store::SqliteSyncMode;
pub use store::SqliteTranslationStore;
