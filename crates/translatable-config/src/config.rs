// crates/translatable-config/src/config.rs
// ============================================================================
// Module: Translatable Configuration Model
// Description: TOML-backed configuration with strict fail-closed validation.
// Purpose: Select the backing store and the locale fallback policy.
// Dependencies: translatable-core, translatable-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration covers three surfaces: the backing-store connection (the
//! `SQLite` database the gateway opens), the global missing-translation
//! fallback directive (fall back to a named locale, to the process fallback
//! locale, or not at all), and per-record-type overrides of that directive.
//! Loading is strict and fail-closed: oversized files, over-long paths, and
//! non-UTF-8 content are rejected before parsing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use translatable_core::FallbackDirective;
use translatable_core::Locale;
use translatable_core::LocaleContext;
use translatable_store_sqlite::SqliteStoreConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default config path used when the caller does not name one.
const DEFAULT_CONFIG_PATH: &str = "translatable.toml";
/// Maximum config file size in bytes.
const MAX_CONFIG_BYTES: u64 = 1_048_576;
/// Maximum length of a single config path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total config path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
///
/// # Invariants
/// - Messages are stable needles for programmatic assertions.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config I/O error.
    #[error("config io error: {0}")]
    Io(String),
    /// Config parse error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid config contents.
    #[error("config invalid: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Fallback Settings
// ============================================================================

/// Missing-translation fallback behavior selector.
///
/// # Invariants
/// - Variants are stable for TOML parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FallbackBehavior {
    /// Do not fall back to any locale.
    None,
    /// Fall back to the process fallback locale.
    #[default]
    Default,
    /// Fall back to the locale named alongside this selector.
    Locale,
}

/// Global fallback settings.
///
/// # Invariants
/// - `locale` must be set and non-empty when `behavior` selects a named
///   locale.
/// - `default_locale` is the process's current locale; `fallback_locale`
///   defaults to it when unset.
#[derive(Debug, Clone, Deserialize)]
pub struct FallbackConfig {
    /// Fallback behavior selector.
    #[serde(default)]
    pub behavior: FallbackBehavior,
    /// Named fallback locale, when `behavior` is `locale`.
    #[serde(default)]
    pub locale: Option<String>,
    /// Process current locale.
    pub default_locale: String,
    /// Process fallback locale; defaults to `default_locale` when unset.
    #[serde(default)]
    pub fallback_locale: Option<String>,
}

/// Per-record-type override of the fallback directive.
///
/// # Invariants
/// - `locale` must be set and non-empty when `behavior` selects a named
///   locale.
#[derive(Debug, Clone, Deserialize)]
pub struct FallbackOverride {
    /// Fallback behavior selector for this record type.
    pub behavior: FallbackBehavior,
    /// Named fallback locale, when `behavior` is `locale`.
    #[serde(default)]
    pub locale: Option<String>,
}

// ============================================================================
// SECTION: Lifecycle Settings
// ============================================================================

/// Delete-lifecycle settings.
///
/// # Invariants
/// - Soft deletes purge translations only when `flush_on_soft_delete` is set;
///   hard deletes always purge.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LifecycleConfig {
    /// When set, soft deletes also flush stored translations.
    #[serde(default)]
    pub flush_on_soft_delete: bool,
}

// ============================================================================
// SECTION: Config Root
// ============================================================================

/// Canonical configuration for the translation overlay.
///
/// # Invariants
/// - `validate` must pass before the config is used to build contexts or
///   stores.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslatableConfig {
    /// Backing-store connection settings.
    pub store: SqliteStoreConfig,
    /// Global fallback settings.
    pub fallback: FallbackConfig,
    /// Delete-lifecycle settings.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    /// Per-record-type fallback overrides keyed by entity-type tag.
    #[serde(default)]
    pub overrides: BTreeMap<String, FallbackOverride>,
}

impl TranslatableConfig {
    /// Loads and validates configuration from a TOML file.
    ///
    /// When `path` is `None`, the default path `translatable.toml` is used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the path is unsafe, the file is
    /// oversized, unreadable, or not UTF-8, parsing fails, or validation
    /// fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        validate_config_path(path)?;
        let metadata = std::fs::metadata(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if metadata.len() > MAX_CONFIG_BYTES {
            return Err(ConfigError::Invalid(format!(
                "config file exceeds size limit: {} bytes (max {MAX_CONFIG_BYTES})",
                metadata.len()
            )));
        }
        let bytes = std::fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(&text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration, failing closed on the first problem.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("store.path must be non-empty".to_string()));
        }
        if self.store.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "store.busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if Locale::parse(&self.fallback.default_locale).is_none() {
            return Err(ConfigError::Invalid(
                "fallback.default_locale must be non-empty".to_string(),
            ));
        }
        if let Some(fallback_locale) = &self.fallback.fallback_locale
            && Locale::parse(fallback_locale).is_none()
        {
            return Err(ConfigError::Invalid(
                "fallback.fallback_locale must be non-empty".to_string(),
            ));
        }
        validate_behavior(self.fallback.behavior, self.fallback.locale.as_deref(), "fallback")?;
        for (entity_type, entry) in &self.overrides {
            if entity_type.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "overrides keys must be non-empty entity-type tags".to_string(),
                ));
            }
            validate_behavior(entry.behavior, entry.locale.as_deref(), "overrides")?;
        }
        Ok(())
    }

    /// Builds the locale context implied by the fallback settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a configured locale is empty.
    pub fn locale_context(&self) -> Result<LocaleContext, ConfigError> {
        let current = Locale::parse(&self.fallback.default_locale).ok_or_else(|| {
            ConfigError::Invalid("fallback.default_locale must be non-empty".to_string())
        })?;
        let fallback = match &self.fallback.fallback_locale {
            Some(locale) => Locale::parse(locale).ok_or_else(|| {
                ConfigError::Invalid("fallback.fallback_locale must be non-empty".to_string())
            })?,
            None => current.clone(),
        };
        Ok(LocaleContext::new(current, fallback).with_directive(self.directive_for(None)))
    }

    /// Resolves the fallback directive for a record type, honoring overrides.
    ///
    /// A named-locale selector whose locale is missing or empty degrades to
    /// no fallback.
    #[must_use]
    pub fn directive_for(&self, entity_type: Option<&str>) -> FallbackDirective {
        let (behavior, locale) = entity_type
            .and_then(|tag| self.overrides.get(tag))
            .map_or_else(
                || (self.fallback.behavior, self.fallback.locale.as_deref()),
                |entry| (entry.behavior, entry.locale.as_deref()),
            );
        match behavior {
            FallbackBehavior::None => FallbackDirective::Disabled,
            FallbackBehavior::Default => FallbackDirective::DefaultLocale,
            FallbackBehavior::Locale => locale
                .and_then(Locale::parse)
                .map_or(FallbackDirective::Disabled, FallbackDirective::Locale),
        }
    }

    /// Returns whether soft deletes flush stored translations.
    #[must_use]
    pub const fn flush_on_soft_delete(&self) -> bool {
        self.lifecycle.flush_on_soft_delete
    }
}

// ============================================================================
// SECTION: Validation Helpers
// ============================================================================

/// Validates one behavior selector plus its optional named locale.
fn validate_behavior(
    behavior: FallbackBehavior,
    locale: Option<&str>,
    section: &str,
) -> Result<(), ConfigError> {
    if behavior == FallbackBehavior::Locale && locale.map_or(true, |value| value.trim().is_empty())
    {
        return Err(ConfigError::Invalid(format!(
            "{section}.locale must be non-empty when behavior is locale"
        )));
    }
    Ok(())
}

/// Validates the config path before any filesystem access.
fn validate_config_path(path: &Path) -> Result<(), ConfigError> {
    let raw = path.as_os_str();
    if raw.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "config path exceeds max length: {} (max {MAX_TOTAL_PATH_LENGTH})",
            raw.len()
        )));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "config path component too long (max {MAX_PATH_COMPONENT_LENGTH})"
            )));
        }
    }
    Ok(())
}
