// crates/translatable-core/src/core/keys.rs
// ============================================================================
// Module: Translatable Key Resolver
// Description: Classifies attribute keys against a record's translatable set.
// Purpose: Route attribute access to translated, nested, or plain handling.
// Dependencies: crate::core::identifiers
// ============================================================================

//! ## Overview
//! An attribute key is either directly translatable (an exact match in the
//! record's translatable-key set), a container of nested translatable
//! sub-keys (some declared key lives below it at a dotted path), or an
//! ordinary attribute. Classification drives the two-step accessor branch on
//! the record binding; the overlay cache only ever sees translatable keys.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::identifiers::TranslationKey;

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Classification of an attribute key against a translatable-key set.
///
/// # Invariants
/// - Variants are exhaustive; every key classifies into exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// The key is itself a translatable attribute.
    Translatable,
    /// The key is a container holding nested translatable sub-keys.
    Nesting,
    /// The key is an ordinary attribute.
    Ordinary,
}

/// Classifies `key` against the declared translatable-key set.
#[must_use]
pub fn classify(key: &str, translatables: &[TranslationKey]) -> KeyClass {
    if translatables.iter().any(|candidate| candidate.as_str() == key) {
        return KeyClass::Translatable;
    }
    if translatables.iter().any(|candidate| candidate.nests_under(key)) {
        return KeyClass::Nesting;
    }
    KeyClass::Ordinary
}

/// Returns the declared translatable keys nested below the container `prefix`.
pub fn nested_keys_under<'k>(
    prefix: &'k str,
    translatables: &'k [TranslationKey],
) -> impl Iterator<Item = &'k TranslationKey> {
    translatables.iter().filter(move |candidate| candidate.nests_under(prefix))
}
