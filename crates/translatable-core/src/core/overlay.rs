// crates/translatable-core/src/core/overlay.rs
// ============================================================================
// Module: Translation Overlay Cache
// Description: Per-record, per-locale, write-deferred translation cache.
// Purpose: Reconcile stored, staged, and deleted translations into one view.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The overlay holds three layers per record instance, each keyed first by
//! locale and then by translation key:
//!
//! - a snapshot of the last values loaded from the gateway, populated lazily
//!   and independently per locale on first access;
//! - pending updates staged by writes since the last commit;
//! - pending deletions staged since the last commit.
//!
//! Reads layer pending-deletion over pending-update over snapshot, then walk
//! a single-hop locale fallback. Writes stage only; [`TranslationOverlay::commit`]
//! flushes staged state to the gateway in whole-locale batches and merges it
//! into the snapshot.
//!
//! ## Invariants
//! - For a given (locale, key), at most one of pending-update and
//!   pending-delete holds the key; staging either clears the other.
//! - A locale's snapshot is fetched at most once per overlay lifetime; a
//!   commit merges into it rather than replacing it.
//! - Flush payloads are null-free; a null write is redirected to deletion
//!   before it reaches the gateway.
//! - A failed gateway call leaves in-memory state exactly as it was before
//!   the call, so a retry re-attempts the same work.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::core::fallback::FallbackDirective;
use crate::core::fallback::LocaleContext;
use crate::core::fallback::fallback_target;
use crate::core::identifiers::Locale;
use crate::core::identifiers::RecordIdentity;
use crate::core::identifiers::TranslationKey;
use crate::core::keys::KeyClass;
use crate::core::keys::classify;
use crate::interfaces::GatewayError;
use crate::interfaces::LocaleTranslations;
use crate::interfaces::TranslationGateway;
use crate::interfaces::TranslationMap;
use crate::interfaces::TranslationWrites;

// ============================================================================
// SECTION: Overlay
// ============================================================================

/// Per-record translation overlay cache.
///
/// # Invariants
/// - Exclusively owned by one in-memory record instance; never shared across
///   concurrent execution contexts.
/// - The record identity is immutable for the overlay's lifetime.
#[derive(Clone)]
pub struct TranslationOverlay {
    /// Identity of the record owning these translations.
    identity: RecordIdentity,
    /// Gateway used for snapshot loads and staged-change flushes.
    gateway: Arc<dyn TranslationGateway>,
    /// Last-loaded-from-store values, populated lazily per locale.
    snapshot: LocaleTranslations,
    /// Values staged by writes since the last commit.
    pending_updates: LocaleTranslations,
    /// Keys staged for removal since the last commit.
    pending_deletes: BTreeMap<Locale, BTreeSet<TranslationKey>>,
    /// Translatable keys declared at construction, if any.
    declared_keys: Option<Vec<TranslationKey>>,
    /// Memoized translatable-key set; computed once and never re-derived.
    materialized_keys: Option<Vec<TranslationKey>>,
}

impl TranslationOverlay {
    /// Creates an empty overlay for a record instance.
    ///
    /// When `declared_keys` is `None`, the translatable-key set is inferred
    /// lazily from whatever keys are staged or already persisted for this
    /// record at the time of the first key-set query.
    #[must_use]
    pub fn new(
        identity: RecordIdentity,
        gateway: Arc<dyn TranslationGateway>,
        declared_keys: Option<Vec<TranslationKey>>,
    ) -> Self {
        Self {
            identity,
            gateway,
            snapshot: BTreeMap::new(),
            pending_updates: BTreeMap::new(),
            pending_deletes: BTreeMap::new(),
            declared_keys,
            materialized_keys: None,
        }
    }

    /// Returns the identity of the record owning this overlay.
    #[must_use]
    pub const fn identity(&self) -> &RecordIdentity {
        &self.identity
    }

    /// Returns true when staged updates or deletions await a commit.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending_updates.is_empty() || !self.pending_deletes.is_empty()
    }

    // ========================================================================
    // SECTION: Translatable Key Set
    // ========================================================================

    /// Returns the translatable-key set for this record instance.
    ///
    /// The set is materialized once: from the declared keys when provided,
    /// otherwise inferred from the union of staged and persisted keys. Keys
    /// introduced purely through remote writes after materialization are not
    /// picked up by this instance.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when lazy inference needs a gateway fetch and
    /// that fetch fails.
    pub fn translatable_keys(&mut self) -> Result<&[TranslationKey], GatewayError> {
        if self.materialized_keys.is_none() {
            let keys = match &self.declared_keys {
                Some(declared) => declared.clone(),
                None => {
                    let mut union: BTreeSet<TranslationKey> = BTreeSet::new();
                    for staged in self.pending_updates.values() {
                        union.extend(staged.keys().cloned());
                    }
                    let persisted = self.gateway.fetch_all(&self.identity)?;
                    for stored in persisted.values() {
                        union.extend(stored.keys().cloned());
                    }
                    union.into_iter().collect()
                }
            };
            self.materialized_keys = Some(keys);
        }
        Ok(self.materialized_keys.as_deref().unwrap_or_default())
    }

    /// Classifies an attribute key against the translatable-key set.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when key-set inference fails.
    pub fn classify_key(&mut self, key: &str) -> Result<KeyClass, GatewayError> {
        Ok(classify(key, self.translatable_keys()?))
    }

    /// Returns true when `key` is a directly translatable attribute.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when key-set inference fails.
    pub fn is_translatable(&mut self, key: &str) -> Result<bool, GatewayError> {
        Ok(self.classify_key(key)? == KeyClass::Translatable)
    }

    /// Returns true when `key` contains nested translatable sub-keys.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when key-set inference fails.
    pub fn is_nesting(&mut self, key: &str) -> Result<bool, GatewayError> {
        Ok(self.classify_key(key)? == KeyClass::Nesting)
    }

    // ========================================================================
    // SECTION: Resolution
    // ========================================================================

    /// Resolves the translation for `key`, walking at most one fallback hop.
    ///
    /// The locale defaults to the context's current locale. Within a locale,
    /// a pending deletion masks both a pending update and the stored
    /// snapshot; a pending update masks the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when a lazy snapshot load fails.
    pub fn translation(
        &mut self,
        key: &TranslationKey,
        locale: Option<&Locale>,
        directive: &FallbackDirective,
        ctx: &LocaleContext,
    ) -> Result<Option<String>, GatewayError> {
        let locale = locale.cloned().unwrap_or_else(|| ctx.current_locale.clone());
        self.resolve(key, &locale, directive, ctx)
    }

    /// Returns true when `key` has a translation in `locale` itself, without
    /// consulting any fallback locale.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when a lazy snapshot load fails.
    pub fn has_translation(
        &mut self,
        key: &TranslationKey,
        locale: Option<&Locale>,
        ctx: &LocaleContext,
    ) -> Result<bool, GatewayError> {
        Ok(self.translation(key, locale, &FallbackDirective::Disabled, ctx)?.is_some())
    }

    /// Layered lookup for one locale plus a single optional fallback hop.
    ///
    /// Staged layers decide without touching the store: a pending deletion
    /// masks the key and a pending update answers directly. The snapshot is
    /// loaded lazily only when it is actually consulted, so resolving staged
    /// state costs no gateway round-trip.
    fn resolve(
        &mut self,
        key: &TranslationKey,
        locale: &Locale,
        directive: &FallbackDirective,
        ctx: &LocaleContext,
    ) -> Result<Option<String>, GatewayError> {
        let deleted = self.pending_deletes.get(locale).is_some_and(|keys| keys.contains(key));
        let raw = if deleted {
            None
        } else if let Some(staged) = self.pending_updates.get(locale).and_then(|map| map.get(key))
        {
            Some(staged.clone())
        } else {
            self.ensure_snapshot(locale)?;
            self.snapshot.get(locale).and_then(|stored| stored.get(key)).cloned()
        };
        if raw.is_none()
            && let Some(next) = fallback_target(locale, directive, ctx)
        {
            // Fallback probes never fall back again; chains stop at one hop.
            return self.resolve(key, &next, &FallbackDirective::Disabled, ctx);
        }
        Ok(raw)
    }

    /// Loads a locale's snapshot from the gateway on first access.
    fn ensure_snapshot(&mut self, locale: &Locale) -> Result<(), GatewayError> {
        if !self.snapshot.contains_key(locale) {
            let stored = self.gateway.fetch_for_locale(&self.identity, locale)?;
            self.snapshot.insert(locale.clone(), stored);
        }
        Ok(())
    }

    // ========================================================================
    // SECTION: Staging
    // ========================================================================

    /// Stages a translation update for one locale.
    ///
    /// The locale defaults to the context's current locale. A `None` value
    /// stages a deletion instead. Staging an update clears a matching pending
    /// deletion, and vice versa; the last stage operation for a (locale, key)
    /// wins.
    pub fn stage_update(
        &mut self,
        key: &TranslationKey,
        value: Option<String>,
        locale: Option<&Locale>,
        ctx: &LocaleContext,
    ) {
        let locale = locale.cloned().unwrap_or_else(|| ctx.current_locale.clone());
        self.stage_update_at(key, value, &locale);
    }

    /// Stages translation updates for several locales at once.
    ///
    /// `None` values stage deletions for their locale.
    pub fn stage_update_many(
        &mut self,
        key: &TranslationKey,
        per_locale: BTreeMap<Locale, Option<String>>,
    ) {
        for (locale, value) in per_locale {
            self.stage_update_at(key, value, &locale);
        }
    }

    /// Stages removal of a translation for one locale.
    ///
    /// The locale defaults to the context's current locale.
    pub fn stage_remove(
        &mut self,
        key: &TranslationKey,
        locale: Option<&Locale>,
        ctx: &LocaleContext,
    ) {
        let locale = locale.cloned().unwrap_or_else(|| ctx.current_locale.clone());
        self.stage_remove_at(key.clone(), &locale);
    }

    /// Staging worker for a single (locale, value) pair.
    fn stage_update_at(&mut self, key: &TranslationKey, value: Option<String>, locale: &Locale) {
        let Some(value) = value else {
            self.stage_remove_at(key.clone(), locale);
            return;
        };
        self.pending_updates.entry(locale.clone()).or_default().insert(key.clone(), value);
        if let Some(deletes) = self.pending_deletes.get_mut(locale) {
            deletes.remove(key);
            if deletes.is_empty() {
                self.pending_deletes.remove(locale);
            }
        }
        self.note_staged_key(key);
    }

    /// Staging worker for a single (locale, key) removal.
    fn stage_remove_at(&mut self, key: TranslationKey, locale: &Locale) {
        if let Some(updates) = self.pending_updates.get_mut(locale) {
            updates.remove(&key);
            if updates.is_empty() {
                self.pending_updates.remove(locale);
            }
        }
        self.pending_deletes.entry(locale.clone()).or_default().insert(key);
    }

    /// Appends a newly staged key to the key set, if already materialized.
    fn note_staged_key(&mut self, key: &TranslationKey) {
        if let Some(keys) = self.materialized_keys.as_mut()
            && !keys.contains(key)
        {
            keys.push(key.clone());
        }
    }

    // ========================================================================
    // SECTION: Commit and Flush
    // ========================================================================

    /// Flushes staged updates and deletions to the gateway.
    ///
    /// Each locale with pending updates is flushed in one upsert batch, then
    /// each locale with pending deletions in one keyed delete. A locale's
    /// staging is merged into the snapshot and cleared only after its gateway
    /// call succeeds, so a mid-commit failure leaves exactly the unflushed
    /// staging in place for retry. With nothing staged, no gateway writes are
    /// issued.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when a flush call fails.
    pub fn commit(&mut self) -> Result<(), GatewayError> {
        let update_locales: Vec<Locale> = self.pending_updates.keys().cloned().collect();
        for locale in update_locales {
            let staged = self.pending_updates.get(&locale).cloned().unwrap_or_default();
            if staged.is_empty() {
                self.pending_updates.remove(&locale);
                continue;
            }
            let writes: TranslationWrites =
                staged.iter().map(|(key, value)| (key.clone(), Some(value.clone()))).collect();
            self.gateway.upsert_many(&self.identity, &locale, &writes)?;
            self.pending_updates.remove(&locale);
            self.snapshot.entry(locale).or_default().extend(staged);
        }
        let delete_locales: Vec<Locale> = self.pending_deletes.keys().cloned().collect();
        for locale in delete_locales {
            let staged: Vec<TranslationKey> = self
                .pending_deletes
                .get(&locale)
                .map(|keys| keys.iter().cloned().collect())
                .unwrap_or_default();
            if staged.is_empty() {
                self.pending_deletes.remove(&locale);
                continue;
            }
            self.gateway.delete_by_keys(&self.identity, &locale, &staged)?;
            self.pending_deletes.remove(&locale);
            if let Some(stored) = self.snapshot.get_mut(&locale) {
                for key in &staged {
                    stored.remove(key);
                }
            }
        }
        Ok(())
    }

    /// Stages removal of every known translation for the target locale(s).
    ///
    /// The key universe is the union of the snapshot, pending updates, and a
    /// fresh gateway fetch, which covers keys never loaded into this
    /// instance. The gateway is only read; deletion happens on the next
    /// [`TranslationOverlay::commit`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the covering fetch fails; nothing is
    /// staged in that case.
    pub fn remove_all(&mut self, locale: Option<&Locale>) -> Result<(), GatewayError> {
        let targets: LocaleTranslations = match locale {
            None => {
                let mut union = self.snapshot.clone();
                merge_locale_maps(&mut union, self.pending_updates.clone());
                merge_locale_maps(&mut union, self.gateway.fetch_all(&self.identity)?);
                union
            }
            Some(locale) => {
                let mut known = self.snapshot.get(locale).cloned().unwrap_or_default();
                if let Some(staged) = self.pending_updates.get(locale) {
                    known.extend(staged.clone());
                }
                known.extend(self.gateway.fetch_for_locale(&self.identity, locale)?);
                BTreeMap::from([(locale.clone(), known)])
            }
        };
        for (target_locale, translations) in targets {
            for key in translations.into_keys() {
                self.stage_remove_at(key, &target_locale);
            }
        }
        Ok(())
    }

    /// Deletes every stored translation for the record, bypassing staging,
    /// and discards all cached state. Returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the delete fails; cached state is kept
    /// in that case.
    pub fn purge_all(&mut self) -> Result<u64, GatewayError> {
        let affected = self.gateway.delete_all(&self.identity)?;
        self.snapshot.clear();
        self.pending_updates.clear();
        self.pending_deletes.clear();
        Ok(affected)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Merges `incoming` into `union`, locale by locale; incoming values win.
fn merge_locale_maps(union: &mut LocaleTranslations, incoming: LocaleTranslations) {
    for (locale, translations) in incoming {
        union.entry(locale).or_insert_with(TranslationMap::new).extend(translations);
    }
}
