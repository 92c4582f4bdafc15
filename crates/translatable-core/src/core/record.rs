// crates/translatable-core/src/core/record.rs
// ============================================================================
// Module: Translatable Record Binding
// Description: Presents overlay translations as ordinary record attributes.
// Purpose: Branch attribute access across translated, nested, and plain reads.
// Dependencies: crate::core, crate::interfaces, serde_json
// ============================================================================

//! ## Overview
//! The binding pairs a record's plain attribute map with its translation
//! overlay and exposes typed accessors in place of dynamic property
//! interception: every access classifies the key first, then branches to a
//! translated read, a nested composite read, or a plain read. Lifecycle
//! hooks are plain methods the host invokes synchronously: [`TranslatableRecord::saved`]
//! commits staged translations and [`TranslatableRecord::deleted`] purges
//! them, honoring the soft-delete flush policy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::core::fallback::FallbackDirective;
use crate::core::fallback::LocaleContext;
use crate::core::identifiers::Locale;
use crate::core::identifiers::RecordIdentity;
use crate::core::identifiers::TranslationKey;
use crate::core::keys::KeyClass;
use crate::core::keys::nested_keys_under;
use crate::core::overlay::TranslationOverlay;
use crate::core::paths::set_value_at;
use crate::core::paths::value_at;
use crate::interfaces::GatewayError;
use crate::interfaces::TranslationGateway;

// ============================================================================
// SECTION: Lifecycle
// ============================================================================

/// Kind of delete the host record went through.
///
/// # Invariants
/// - Variants are stable for lifecycle-policy dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteKind {
    /// Reversible delete; the record row remains in the host store.
    Soft,
    /// Permanent delete; the record row is gone.
    Hard,
}

// ============================================================================
// SECTION: Record Binding
// ============================================================================

/// A record's plain attributes paired with its translation overlay.
///
/// # Invariants
/// - Translated attribute slots in the plain map hold null; the overlay is
///   the only source of translated text.
#[derive(Clone)]
pub struct TranslatableRecord {
    /// Plain (untranslated) attribute values.
    attributes: BTreeMap<String, Value>,
    /// Translation overlay for this record instance.
    overlay: TranslationOverlay,
}

impl TranslatableRecord {
    /// Creates a binding with an empty attribute map.
    #[must_use]
    pub fn new(
        identity: RecordIdentity,
        gateway: Arc<dyn TranslationGateway>,
        declared_keys: Option<Vec<TranslationKey>>,
    ) -> Self {
        Self {
            attributes: BTreeMap::new(),
            overlay: TranslationOverlay::new(identity, gateway, declared_keys),
        }
    }

    /// Replaces the plain attribute map wholesale.
    #[must_use]
    pub fn with_attributes(mut self, attributes: BTreeMap<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Returns the identity of the bound record.
    #[must_use]
    pub const fn identity(&self) -> &RecordIdentity {
        self.overlay.identity()
    }

    /// Returns the plain attribute map.
    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Returns the translation overlay.
    #[must_use]
    pub const fn overlay(&self) -> &TranslationOverlay {
        &self.overlay
    }

    /// Returns the translation overlay mutably.
    pub const fn overlay_mut(&mut self) -> &mut TranslationOverlay {
        &mut self.overlay
    }

    // ========================================================================
    // SECTION: Attribute Access
    // ========================================================================

    /// Reads an attribute, resolving translations where the key calls for it.
    ///
    /// Translatable keys resolve through the overlay with the context's
    /// default directive. Nesting keys return the plain container with every
    /// nested translatable leaf spliced in at its relative path. Ordinary
    /// keys return the plain value.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when a snapshot load or key-set inference
    /// fails.
    pub fn attribute(
        &mut self,
        key: &str,
        ctx: &LocaleContext,
    ) -> Result<Option<Value>, GatewayError> {
        match self.overlay.classify_key(key)? {
            KeyClass::Translatable => {
                let translated = self.overlay.translation(
                    &TranslationKey::new(key),
                    None,
                    &ctx.default_directive,
                    ctx,
                )?;
                Ok(translated.map(Value::String))
            }
            KeyClass::Nesting => Ok(Some(self.nesting_attribute(key, ctx)?)),
            KeyClass::Ordinary => Ok(self.attributes.get(key).cloned()),
        }
    }

    /// Writes an attribute, staging translations where the key calls for it.
    ///
    /// Translatable keys accept text (staged for the current locale), null
    /// (staged removal), or a locale-to-text map; the raw attribute slot is
    /// cleared to null so it never shadows the overlay. Nesting keys have
    /// every nested translatable leaf extracted, staged, and nulled before
    /// the remaining plain container is stored. Ordinary keys store plainly.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when key-set inference fails or a
    /// translatable slot holds a value that is not text, null, or a locale
    /// map.
    pub fn set_attribute(
        &mut self,
        key: &str,
        value: Value,
        ctx: &LocaleContext,
    ) -> Result<(), GatewayError> {
        match self.overlay.classify_key(key)? {
            KeyClass::Translatable => self.set_translatable(&TranslationKey::new(key), value, ctx),
            KeyClass::Nesting => self.set_nesting(key, value, ctx),
            KeyClass::Ordinary => {
                self.attributes.insert(key.to_string(), value);
                Ok(())
            }
        }
    }

    /// Exports the full attribute map with every declared translatable key's
    /// resolved translation spliced in at its dotted path.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when a snapshot load or key-set inference
    /// fails.
    pub fn localized_attributes(
        &mut self,
        ctx: &LocaleContext,
    ) -> Result<BTreeMap<String, Value>, GatewayError> {
        let mut localized = self.attributes.clone();
        let keys: Vec<TranslationKey> = self.overlay.translatable_keys()?.to_vec();
        for key in keys {
            let translated = self.overlay.translation(&key, None, &ctx.default_directive, ctx)?;
            let leaf = translated.map_or(Value::Null, Value::String);
            if key.is_nested() {
                let root = key.root().to_string();
                let slot = localized.entry(root.clone()).or_insert(Value::Null);
                if let Some(relative) = key.relative_to(&root) {
                    set_value_at(slot, relative, leaf);
                }
            } else {
                localized.insert(key.as_str().to_string(), leaf);
            }
        }
        Ok(localized)
    }

    /// Composite read for a container holding nested translatable leaves.
    fn nesting_attribute(&mut self, key: &str, ctx: &LocaleContext) -> Result<Value, GatewayError> {
        let mut container = self.attributes.get(key).cloned().unwrap_or(Value::Null);
        let nested: Vec<TranslationKey> =
            nested_keys_under(key, self.overlay.translatable_keys()?).cloned().collect();
        for nested_key in nested {
            let translated = self.overlay.translation(&nested_key, None, &ctx.default_directive, ctx)?;
            if let Some(relative) = nested_key.relative_to(key) {
                set_value_at(&mut container, relative, translated.map_or(Value::Null, Value::String));
            }
        }
        Ok(container)
    }

    /// Write branch for a directly translatable key.
    fn set_translatable(
        &mut self,
        key: &TranslationKey,
        value: Value,
        ctx: &LocaleContext,
    ) -> Result<(), GatewayError> {
        match value {
            Value::Null => {
                self.set_translation(key, None, None, ctx);
                Ok(())
            }
            Value::String(text) => {
                self.set_translation(key, Some(text), None, ctx);
                Ok(())
            }
            Value::Object(per_locale) => {
                let mut translations: BTreeMap<Locale, Option<String>> = BTreeMap::new();
                for (locale, leaf) in per_locale {
                    let locale = Locale::parse(&locale).ok_or_else(|| {
                        GatewayError::Invalid(format!("empty locale for translatable key {key}"))
                    })?;
                    let staged = match leaf {
                        Value::Null => None,
                        Value::String(text) => Some(text),
                        _ => {
                            return Err(GatewayError::Invalid(format!(
                                "translatable value for {key} in {locale} must be text or null"
                            )));
                        }
                    };
                    translations.insert(locale, staged);
                }
                self.set_translations(key, translations);
                Ok(())
            }
            _ => Err(GatewayError::Invalid(format!(
                "translatable attribute {key} accepts text, null, or a locale map"
            ))),
        }
    }

    /// Write branch for a container holding nested translatable leaves.
    fn set_nesting(
        &mut self,
        key: &str,
        mut value: Value,
        ctx: &LocaleContext,
    ) -> Result<(), GatewayError> {
        let nested: Vec<TranslationKey> =
            nested_keys_under(key, self.overlay.translatable_keys()?).cloned().collect();
        for nested_key in nested {
            let Some(relative) = nested_key.relative_to(key) else {
                continue;
            };
            let staged = match value_at(&value, relative).cloned() {
                None | Some(Value::Null) => None,
                Some(Value::String(text)) => Some(text),
                Some(_) => {
                    return Err(GatewayError::Invalid(format!(
                        "translatable value at {nested_key} must be text or null"
                    )));
                }
            };
            self.overlay.stage_update(&nested_key, staged, None, ctx);
            set_value_at(&mut value, relative, Value::Null);
        }
        self.attributes.insert(key.to_string(), value);
        Ok(())
    }

    // ========================================================================
    // SECTION: Translation API
    // ========================================================================

    /// Resolves the translation for a translatable key.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when a snapshot load fails.
    pub fn translation(
        &mut self,
        key: &TranslationKey,
        locale: Option<&Locale>,
        directive: &FallbackDirective,
        ctx: &LocaleContext,
    ) -> Result<Option<String>, GatewayError> {
        self.overlay.translation(key, locale, directive, ctx)
    }

    /// Stages a translation for one locale and clears the raw slot.
    ///
    /// A `None` value stages a removal. The locale defaults to the context's
    /// current locale.
    pub fn set_translation(
        &mut self,
        key: &TranslationKey,
        value: Option<String>,
        locale: Option<&Locale>,
        ctx: &LocaleContext,
    ) {
        self.overlay.stage_update(key, value, locale, ctx);
        self.clear_raw_slot(key);
    }

    /// Stages translations for several locales and clears the raw slot.
    ///
    /// `None` values stage removals for their locale.
    pub fn set_translations(
        &mut self,
        key: &TranslationKey,
        per_locale: BTreeMap<Locale, Option<String>>,
    ) {
        self.overlay.stage_update_many(key, per_locale);
        self.clear_raw_slot(key);
    }

    /// Stages removal of a translation for one locale.
    ///
    /// The locale defaults to the context's current locale.
    pub fn remove_translation(
        &mut self,
        key: &TranslationKey,
        locale: Option<&Locale>,
        ctx: &LocaleContext,
    ) {
        self.overlay.stage_remove(key, locale, ctx);
    }

    /// Returns true when the key has a translation in the locale itself.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when a snapshot load fails.
    pub fn has_translation(
        &mut self,
        key: &TranslationKey,
        locale: Option<&Locale>,
        ctx: &LocaleContext,
    ) -> Result<bool, GatewayError> {
        self.overlay.has_translation(key, locale, ctx)
    }

    /// Stages removal of every known translation for the target locale(s).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the covering fetch fails.
    pub fn flush_translations(&mut self, locale: Option<&Locale>) -> Result<(), GatewayError> {
        self.overlay.remove_all(locale)
    }

    /// Nulls the raw slot backing a translatable key so the plain value never
    /// shadows the overlay.
    fn clear_raw_slot(&mut self, key: &TranslationKey) {
        if key.is_nested() {
            let root = key.root().to_string();
            if let Some(container) = self.attributes.get_mut(&root)
                && let Some(relative) = key.relative_to(&root)
            {
                set_value_at(container, relative, Value::Null);
            }
        } else {
            self.attributes.insert(key.as_str().to_string(), Value::Null);
        }
    }

    // ========================================================================
    // SECTION: Lifecycle Hooks
    // ========================================================================

    /// Post-save hook: flushes staged translations to the gateway.
    ///
    /// Invoked by the host exactly once per save, after all attribute
    /// mutations for that save have been staged.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the flush fails; staging is kept for
    /// retry.
    pub fn saved(&mut self) -> Result<(), GatewayError> {
        self.overlay.commit()
    }

    /// Post-delete hook: purges stored translations, bypassing staging.
    ///
    /// Soft deletes purge only when `flush_on_soft_delete` is set; hard
    /// deletes always purge. Returns the number of deleted rows.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the purge fails.
    pub fn deleted(
        &mut self,
        kind: DeleteKind,
        flush_on_soft_delete: bool,
    ) -> Result<u64, GatewayError> {
        match kind {
            DeleteKind::Hard => self.overlay.purge_all(),
            DeleteKind::Soft if flush_on_soft_delete => self.overlay.purge_all(),
            DeleteKind::Soft => Ok(0),
        }
    }
}
