// crates/translatable-core/src/lib.rs
// ============================================================================
// Module: Translatable Core Library
// Description: Translation overlay cache, key resolution, and gateway contract.
// Purpose: Present per-locale translated attributes as ordinary record fields.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Translatable Core augments a persistent record with per-locale textual
//! attribute values stored behind a [`TranslationGateway`], while presenting
//! them to callers as ordinary fields. The [`TranslationOverlay`] reconciles
//! three views of a record's translations (loaded snapshot, staged updates,
//! staged deletions) and resolves reads through a single-hop locale fallback,
//! including for attributes nested inside structured values addressed by
//! dotted paths.
//!
//! Invariants:
//! - A locale's snapshot is fetched at most once per overlay lifetime.
//! - Staged updates and deletions are mutually exclusive per (locale, key).
//! - The backing store never holds null values; null writes delete.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod memory;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::fallback::FallbackDirective;
pub use crate::core::fallback::LocaleContext;
pub use crate::core::fallback::fallback_target;
pub use crate::core::identifiers::EntityId;
pub use crate::core::identifiers::EntityType;
pub use crate::core::identifiers::Locale;
pub use crate::core::identifiers::RecordIdentity;
pub use crate::core::identifiers::TranslationKey;
pub use crate::core::keys::KeyClass;
pub use crate::core::keys::classify;
pub use crate::core::keys::nested_keys_under;
pub use crate::core::overlay::TranslationOverlay;
pub use crate::core::paths::set_value_at;
pub use crate::core::paths::value_at;
pub use crate::core::record::DeleteKind;
pub use crate::core::record::TranslatableRecord;
pub use crate::interfaces::GatewayError;
pub use crate::interfaces::LocaleTranslations;
pub use crate::interfaces::TranslationGateway;
pub use crate::interfaces::TranslationMap;
pub use crate::interfaces::TranslationWrites;
pub use crate::memory::GatewayCallCounts;
pub use crate::memory::MemoryTranslationGateway;
