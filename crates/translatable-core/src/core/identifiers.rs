// crates/translatable-core/src/core/identifiers.rs
// ============================================================================
// Module: Translatable Identifiers
// Description: Canonical opaque identifiers for translated records and keys.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout the
//! translation overlay. Entity tags and keys are opaque and serialize as
//! strings on the wire. Locales enforce non-emptiness at construction
//! boundaries; no other format validation is applied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Entity Identity
// ============================================================================

/// Application-chosen type tag identifying the owning entity's kind.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
/// - Not necessarily a literal class or table name; callers supply whatever
///   stable tag they use for polymorphic identification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(String);

impl EntityType {
    /// Creates a new entity type tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for EntityType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityType {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Primary-key value of the owning record.
///
/// # Invariants
/// - Opaque UTF-8 string; numeric identifiers are stringified by callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Creates a new entity identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Identity of the record owning a set of translations.
///
/// # Invariants
/// - Immutable for the lifetime of an overlay instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordIdentity {
    /// Type tag of the owning entity.
    pub entity_type: EntityType,
    /// Primary-key value of the owning entity.
    pub entity_id: EntityId,
}

impl RecordIdentity {
    /// Creates a new record identity from a type tag and key value.
    #[must_use]
    pub fn new(entity_type: impl Into<EntityType>, entity_id: impl Into<EntityId>) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
        }
    }
}

impl fmt::Display for RecordIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.entity_id)
    }
}

// ============================================================================
// SECTION: Locale
// ============================================================================

/// Locale identifier for a stored translation.
///
/// # Invariants
/// - Always non-empty after trimming; no other format validation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    /// Attempts to parse a locale value (returns `None` if empty after trimming).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        Some(Self(value.to_string()))
    }

    /// Returns the locale as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Translation Key
// ============================================================================

/// Separator between path segments in a translation key.
const PATH_SEPARATOR: char = '.';

/// Dotted-path key identifying a translatable attribute or a path into a
/// structured attribute.
///
/// # Invariants
/// - Opaque UTF-8 string; segments are separated by `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationKey(String);

impl TranslationKey {
    /// Creates a new translation key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the key addresses a path inside a structured attribute.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.0.contains(PATH_SEPARATOR)
    }

    /// Returns the top-level attribute name this key belongs to.
    #[must_use]
    pub fn root(&self) -> &str {
        self.0.split(PATH_SEPARATOR).next().unwrap_or(&self.0)
    }

    /// Returns true when this key addresses a path below `prefix`.
    #[must_use]
    pub fn nests_under(&self, prefix: &str) -> bool {
        self.0.len() > prefix.len() + 1
            && self.0.starts_with(prefix)
            && self.0.as_bytes().get(prefix.len()) == Some(&b'.')
    }

    /// Returns the path of this key relative to `prefix`, if nested under it.
    #[must_use]
    pub fn relative_to(&self, prefix: &str) -> Option<&str> {
        if self.nests_under(prefix) {
            self.0.get(prefix.len() + 1 ..)
        } else {
            None
        }
    }
}

impl fmt::Display for TranslationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TranslationKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TranslationKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
