// crates/translatable-core/src/memory.rs
// ============================================================================
// Module: In-Memory Translation Gateway
// Description: Reference TranslationGateway backed by process memory.
// Purpose: Provide a deterministic gateway for tests and embedding.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! A ready-made [`TranslationGateway`] holding rows in memory. Operation
//! counters expose how many round-trips the overlay issued, which tests use
//! to assert the one-fetch-per-locale guarantee. Writes can be made to fail
//! on demand to exercise commit-retry behavior.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use crate::core::identifiers::Locale;
use crate::core::identifiers::RecordIdentity;
use crate::core::identifiers::TranslationKey;
use crate::interfaces::GatewayError;
use crate::interfaces::LocaleTranslations;
use crate::interfaces::TranslationGateway;
use crate::interfaces::TranslationMap;
use crate::interfaces::TranslationWrites;

// ============================================================================
// SECTION: Call Counters
// ============================================================================

/// Per-operation call counters for the in-memory gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayCallCounts {
    /// Calls to `fetch_for_locale`.
    pub fetch_for_locale: u64,
    /// Calls to `fetch_all`.
    pub fetch_all: u64,
    /// Calls to `upsert_many`.
    pub upsert_many: u64,
    /// Calls to `delete_by_keys`.
    pub delete_by_keys: u64,
    /// Calls to `delete_all`.
    pub delete_all: u64,
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// In-memory reference gateway.
///
/// # Invariants
/// - Row access is serialized through a mutex; each call is atomic.
/// - Null values are never stored; `None` upsert payloads delete.
#[derive(Debug, Default)]
pub struct MemoryTranslationGateway {
    /// Stored rows keyed by record identity.
    rows: Mutex<BTreeMap<RecordIdentity, LocaleTranslations>>,
    /// Per-operation call counters.
    counts: Mutex<GatewayCallCounts>,
    /// When set, write operations fail with a store error.
    fail_writes: AtomicBool,
}

impl MemoryTranslationGateway {
    /// Creates an empty in-memory gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a stored translation row.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the row mutex is poisoned.
    pub fn seed(
        &self,
        identity: &RecordIdentity,
        locale: &Locale,
        key: &TranslationKey,
        value: impl Into<String>,
    ) -> Result<(), GatewayError> {
        let mut rows = self.lock_rows()?;
        rows.entry(identity.clone())
            .or_default()
            .entry(locale.clone())
            .or_default()
            .insert(key.clone(), value.into());
        Ok(())
    }

    /// Returns a snapshot of the per-operation call counters.
    #[must_use]
    pub fn call_counts(&self) -> GatewayCallCounts {
        self.counts.lock().map(|guard| *guard).unwrap_or_default()
    }

    /// Makes subsequent write operations fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Locks the row table, mapping poisoning into a gateway error.
    fn lock_rows(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<RecordIdentity, LocaleTranslations>>, GatewayError>
    {
        self.rows.lock().map_err(|_| GatewayError::Io("memory gateway mutex poisoned".to_string()))
    }

    /// Increments one call counter via the supplied accessor.
    fn record_call(&self, bump: impl FnOnce(&mut GatewayCallCounts)) {
        if let Ok(mut counts) = self.counts.lock() {
            bump(&mut counts);
        }
    }

    /// Fails the call when write failures are enabled.
    fn check_writable(&self) -> Result<(), GatewayError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(GatewayError::Store("injected write failure".to_string()));
        }
        Ok(())
    }
}

impl TranslationGateway for MemoryTranslationGateway {
    fn fetch_for_locale(
        &self,
        identity: &RecordIdentity,
        locale: &Locale,
    ) -> Result<TranslationMap, GatewayError> {
        self.record_call(|counts| counts.fetch_for_locale += 1);
        let rows = self.lock_rows()?;
        Ok(rows
            .get(identity)
            .and_then(|locales| locales.get(locale))
            .cloned()
            .unwrap_or_default())
    }

    fn fetch_all(&self, identity: &RecordIdentity) -> Result<LocaleTranslations, GatewayError> {
        self.record_call(|counts| counts.fetch_all += 1);
        let rows = self.lock_rows()?;
        Ok(rows.get(identity).cloned().unwrap_or_default())
    }

    fn upsert_many(
        &self,
        identity: &RecordIdentity,
        locale: &Locale,
        writes: &TranslationWrites,
    ) -> Result<u64, GatewayError> {
        self.record_call(|counts| counts.upsert_many += 1);
        self.check_writable()?;
        let mut rows = self.lock_rows()?;
        let stored = rows.entry(identity.clone()).or_default().entry(locale.clone()).or_default();
        let mut affected = 0_u64;
        for (key, value) in writes {
            match value {
                Some(text) => {
                    stored.insert(key.clone(), text.clone());
                    affected += 1;
                }
                None => {
                    if stored.remove(key).is_some() {
                        affected += 1;
                    }
                }
            }
        }
        Ok(affected)
    }

    fn delete_by_keys(
        &self,
        identity: &RecordIdentity,
        locale: &Locale,
        keys: &[TranslationKey],
    ) -> Result<u64, GatewayError> {
        self.record_call(|counts| counts.delete_by_keys += 1);
        self.check_writable()?;
        let mut rows = self.lock_rows()?;
        let Some(stored) = rows.get_mut(identity).and_then(|locales| locales.get_mut(locale))
        else {
            return Ok(0);
        };
        let mut affected = 0_u64;
        for key in keys {
            if stored.remove(key).is_some() {
                affected += 1;
            }
        }
        Ok(affected)
    }

    fn delete_all(&self, identity: &RecordIdentity) -> Result<u64, GatewayError> {
        self.record_call(|counts| counts.delete_all += 1);
        self.check_writable()?;
        let mut rows = self.lock_rows()?;
        let affected = rows
            .remove(identity)
            .map(|locales| {
                locales
                    .values()
                    .map(|stored| u64::try_from(stored.len()).unwrap_or(u64::MAX))
                    .sum()
            })
            .unwrap_or(0);
        Ok(affected)
    }
}
