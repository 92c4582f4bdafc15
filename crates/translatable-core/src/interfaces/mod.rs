// crates/translatable-core/src/interfaces/mod.rs
// ============================================================================
// Module: Translatable Interfaces
// Description: Backend-agnostic persistence contract for record translations.
// Purpose: Define the gateway surface the overlay cache flushes through.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The gateway contract scopes every operation to one record identity and
//! promises single round-trips: no per-key calls, and each call executes as
//! one atomic statement against the backing store. Implementations never
//! persist null values; a `None` write payload requests deletion instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::identifiers::Locale;
use crate::core::identifiers::RecordIdentity;
use crate::core::identifiers::TranslationKey;

// ============================================================================
// SECTION: Wire Shapes
// ============================================================================

/// Translations for one locale, keyed by translation key.
pub type TranslationMap = BTreeMap<TranslationKey, String>;

/// Translations for one record across locales.
pub type LocaleTranslations = BTreeMap<Locale, TranslationMap>;

/// Upsert payload for one locale; `None` requests deletion of the key.
pub type TranslationWrites = BTreeMap<TranslationKey, Option<String>>;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Translation gateway errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Error messages avoid embedding translation values.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Gateway I/O error.
    #[error("translation gateway io error: {0}")]
    Io(String),
    /// Backing store reported an error.
    #[error("translation gateway store error: {0}")]
    Store(String),
    /// Invalid data passed through the gateway.
    #[error("translation gateway invalid data: {0}")]
    Invalid(String),
    /// Stored data is corrupted or fails integrity checks.
    #[error("translation gateway corruption: {0}")]
    Corrupt(String),
    /// Stored schema version is incompatible.
    #[error("translation gateway version mismatch: {0}")]
    VersionMismatch(String),
}

// ============================================================================
// SECTION: Translation Gateway
// ============================================================================

/// Persistence gateway for record translations.
///
/// All operations are scoped to a single record identity and complete in one
/// blocking round-trip. Implementations must be safe to share across record
/// instances; each call is independent and atomic.
pub trait TranslationGateway {
    /// Fetches all stored translations for the record in one locale.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the fetch fails.
    fn fetch_for_locale(
        &self,
        identity: &RecordIdentity,
        locale: &Locale,
    ) -> Result<TranslationMap, GatewayError>;

    /// Fetches all stored translations for the record across all locales.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the fetch fails.
    fn fetch_all(&self, identity: &RecordIdentity) -> Result<LocaleTranslations, GatewayError>;

    /// Upserts translations for one locale; `None` values delete the key
    /// instead of writing null. Returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the write fails.
    fn upsert_many(
        &self,
        identity: &RecordIdentity,
        locale: &Locale,
        writes: &TranslationWrites,
    ) -> Result<u64, GatewayError>;

    /// Deletes the named keys for one locale. Returns the number of affected
    /// rows.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the delete fails.
    fn delete_by_keys(
        &self,
        identity: &RecordIdentity,
        locale: &Locale,
        keys: &[TranslationKey],
    ) -> Result<u64, GatewayError>;

    /// Deletes every translation for the record across all locales. Returns
    /// the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the delete fails.
    fn delete_all(&self, identity: &RecordIdentity) -> Result<u64, GatewayError>;
}
