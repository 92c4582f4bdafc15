// crates/translatable-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Translation Store
// Description: Durable TranslationGateway backed by SQLite.
// Purpose: Persist translation rows under a composite primary key.
// Dependencies: translatable-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`TranslationGateway`] using `SQLite`.
//! Rows live in a single `model_translations` table keyed by
//! (translatable_type, translatable_id, locale, key); an upsert with the same
//! composite key overwrites the value. Null values never reach the table: a
//! `None` write payload is partitioned into a keyed delete inside the same
//! transaction. Each gateway call executes as one transaction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::ToSql;
use rusqlite::params;
use rusqlite::params_from_iter;
use serde::Deserialize;
use thiserror::Error;
use translatable_core::GatewayError;
use translatable_core::Locale;
use translatable_core::LocaleTranslations;
use translatable_core::RecordIdentity;
use translatable_core::TranslationGateway;
use translatable_core::TranslationKey;
use translatable_core::TranslationMap;
use translatable_core::TranslationWrites;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` translation store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config for `path` with default pragma settings.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding translation values.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Invalid store data or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
}

impl From<SqliteStoreError> for GatewayError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
        }
    }
}

// ============================================================================
// SECTION: Op Counters
// ============================================================================

/// Store-level operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqliteStoreOpCounts {
    /// Fetch operations (`fetch_for_locale`, `fetch_all`).
    pub fetch: u64,
    /// Upsert operations (`upsert_many`).
    pub upsert: u64,
    /// Delete operations (`delete_by_keys`, `delete_all`).
    pub delete: u64,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed translation store.
///
/// # Invariants
/// - Connection access is serialized through a mutex.
/// - Every gateway call executes inside one transaction.
#[derive(Clone)]
pub struct SqliteTranslationStore {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
    /// Lightweight operation counters for local diagnostics.
    op_counts: Arc<Mutex<SqliteStoreOpCounts>>,
}

impl SqliteTranslationStore {
    /// Opens an `SQLite`-backed translation store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            op_counts: Arc::new(Mutex::new(SqliteStoreOpCounts::default())),
        })
    }

    /// Returns a snapshot of the per-operation counters.
    #[must_use]
    pub fn op_counts_snapshot(&self) -> SqliteStoreOpCounts {
        self.op_counts.lock().map(|guard| *guard).unwrap_or_default()
    }

    /// Verifies the store can execute a simple SQL statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the mutex is poisoned or the query
    /// fails.
    pub fn check_connection(&self) -> Result<(), SqliteStoreError> {
        let guard = self.lock_connection()?;
        guard.execute("SELECT 1", []).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Locks the connection, mapping poisoning into a store error.
    fn lock_connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite connection mutex poisoned".to_string()))
    }

    /// Increments one operation counter via the supplied accessor.
    fn record_op(&self, bump: impl FnOnce(&mut SqliteStoreOpCounts)) {
        if let Ok(mut counts) = self.op_counts.lock() {
            bump(&mut counts);
        }
    }
}

impl TranslationGateway for SqliteTranslationStore {
    fn fetch_for_locale(
        &self,
        identity: &RecordIdentity,
        locale: &Locale,
    ) -> Result<TranslationMap, GatewayError> {
        self.record_op(|counts| counts.fetch = counts.fetch.saturating_add(1));
        let guard = self.lock_connection()?;
        let mut stmt = guard
            .prepare(
                "SELECT key, value FROM model_translations WHERE translatable_type = ?1 AND \
                 translatable_id = ?2 AND locale = ?3",
            )
            .map_err(|err| GatewayError::Store(err.to_string()))?;
        let rows = stmt
            .query_map(
                params![
                    identity.entity_type.as_str(),
                    identity.entity_id.as_str(),
                    locale.as_str()
                ],
                |row| {
                    let key: String = row.get(0)?;
                    let value: String = row.get(1)?;
                    Ok((key, value))
                },
            )
            .map_err(|err| GatewayError::Store(err.to_string()))?;
        let mut translations = TranslationMap::new();
        for row in rows {
            let (key, value) = row.map_err(|err| GatewayError::Store(err.to_string()))?;
            translations.insert(TranslationKey::new(key), value);
        }
        Ok(translations)
    }

    fn fetch_all(&self, identity: &RecordIdentity) -> Result<LocaleTranslations, GatewayError> {
        self.record_op(|counts| counts.fetch = counts.fetch.saturating_add(1));
        let guard = self.lock_connection()?;
        let mut stmt = guard
            .prepare(
                "SELECT locale, key, value FROM model_translations WHERE translatable_type = ?1 \
                 AND translatable_id = ?2",
            )
            .map_err(|err| GatewayError::Store(err.to_string()))?;
        let rows = stmt
            .query_map(
                params![identity.entity_type.as_str(), identity.entity_id.as_str()],
                |row| {
                    let locale: String = row.get(0)?;
                    let key: String = row.get(1)?;
                    let value: String = row.get(2)?;
                    Ok((locale, key, value))
                },
            )
            .map_err(|err| GatewayError::Store(err.to_string()))?;
        let mut translations = LocaleTranslations::new();
        for row in rows {
            let (locale, key, value) = row.map_err(|err| GatewayError::Store(err.to_string()))?;
            let locale = Locale::parse(&locale).ok_or_else(|| {
                GatewayError::Corrupt(format!("empty locale stored for {identity}"))
            })?;
            translations.entry(locale).or_default().insert(TranslationKey::new(key), value);
        }
        Ok(translations)
    }

    fn upsert_many(
        &self,
        identity: &RecordIdentity,
        locale: &Locale,
        writes: &TranslationWrites,
    ) -> Result<u64, GatewayError> {
        self.record_op(|counts| counts.upsert = counts.upsert.saturating_add(1));
        let mut values: BTreeMap<&TranslationKey, &String> = BTreeMap::new();
        let mut removals: Vec<&TranslationKey> = Vec::new();
        for (key, value) in writes {
            match value {
                Some(text) => {
                    values.insert(key, text);
                }
                None => removals.push(key),
            }
        }
        let mut guard = self.lock_connection()?;
        let tx = guard.transaction().map_err(|err| GatewayError::Store(err.to_string()))?;
        let mut affected = 0_u64;
        if !values.is_empty() {
            let now = unix_millis();
            let timestamp_index = values.len() * 5 + 1;
            let placeholders: Vec<String> = (0 .. values.len())
                .map(|index| {
                    let base = index * 5;
                    format!(
                        "(?{}, ?{}, ?{}, ?{}, ?{}, ?{timestamp_index}, ?{timestamp_index})",
                        base + 1,
                        base + 2,
                        base + 3,
                        base + 4,
                        base + 5
                    )
                })
                .collect();
            let sql = format!(
                "INSERT INTO model_translations (translatable_type, translatable_id, locale, \
                 key, value, created_at, updated_at) VALUES {} ON CONFLICT(translatable_type, \
                 translatable_id, locale, key) DO UPDATE SET value = excluded.value, updated_at \
                 = excluded.updated_at",
                placeholders.join(", ")
            );
            let str_values: Vec<&str> = values
                .iter()
                .flat_map(|(key, value)| {
                    [
                        identity.entity_type.as_str(),
                        identity.entity_id.as_str(),
                        locale.as_str(),
                        key.as_str(),
                        value.as_str(),
                    ]
                })
                .collect();
            let mut bound: Vec<&dyn ToSql> = Vec::with_capacity(timestamp_index);
            for str_value in &str_values {
                bound.push(str_value);
            }
            bound.push(&now);
            let changed = tx
                .execute(&sql, params_from_iter(bound))
                .map_err(|err| GatewayError::Store(err.to_string()))?;
            affected = affected.saturating_add(u64::try_from(changed).unwrap_or(u64::MAX));
        }
        if !removals.is_empty() {
            let changed = delete_keys_in_tx(&tx, identity, locale, &removals)?;
            affected = affected.saturating_add(changed);
        }
        tx.commit().map_err(|err| GatewayError::Store(err.to_string()))?;
        Ok(affected)
    }

    fn delete_by_keys(
        &self,
        identity: &RecordIdentity,
        locale: &Locale,
        keys: &[TranslationKey],
    ) -> Result<u64, GatewayError> {
        self.record_op(|counts| counts.delete = counts.delete.saturating_add(1));
        if keys.is_empty() {
            return Ok(0);
        }
        let key_refs: Vec<&TranslationKey> = keys.iter().collect();
        let mut guard = self.lock_connection()?;
        let tx = guard.transaction().map_err(|err| GatewayError::Store(err.to_string()))?;
        let affected = delete_keys_in_tx(&tx, identity, locale, &key_refs)?;
        tx.commit().map_err(|err| GatewayError::Store(err.to_string()))?;
        Ok(affected)
    }

    fn delete_all(&self, identity: &RecordIdentity) -> Result<u64, GatewayError> {
        self.record_op(|counts| counts.delete = counts.delete.saturating_add(1));
        let guard = self.lock_connection()?;
        let changed = guard
            .execute(
                "DELETE FROM model_translations WHERE translatable_type = ?1 AND translatable_id \
                 = ?2",
                params![identity.entity_type.as_str(), identity.entity_id.as_str()],
            )
            .map_err(|err| GatewayError::Store(err.to_string()))?;
        Ok(u64::try_from(changed).unwrap_or(u64::MAX))
    }
}

// ============================================================================
// SECTION: SQL Helpers
// ============================================================================

/// Deletes the named keys for one (record, locale) inside a transaction.
fn delete_keys_in_tx(
    tx: &rusqlite::Transaction<'_>,
    identity: &RecordIdentity,
    locale: &Locale,
    keys: &[&TranslationKey],
) -> Result<u64, GatewayError> {
    let placeholders: Vec<String> =
        (0 .. keys.len()).map(|index| format!("?{}", index + 4)).collect();
    let sql = format!(
        "DELETE FROM model_translations WHERE translatable_type = ?1 AND translatable_id = ?2 \
         AND locale = ?3 AND key IN ({})",
        placeholders.join(", ")
    );
    let mut bound: Vec<&str> = Vec::with_capacity(keys.len() + 3);
    bound.push(identity.entity_type.as_str());
    bound.push(identity.entity_id.as_str());
    bound.push(locale.as_str());
    for key in keys {
        bound.push(key.as_str());
    }
    let changed = tx
        .execute(&sql, params_from_iter(bound.iter()))
        .map_err(|err| GatewayError::Store(err.to_string()))?;
    Ok(u64::try_from(changed).unwrap_or(u64::MAX))
}

// ============================================================================
// SECTION: Connection Lifecycle
// ============================================================================

/// Validates the configured store path.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let raw = path.as_os_str();
    if raw.is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    if raw.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid(format!(
            "store path exceeds max length: {} (max {MAX_TOTAL_PATH_LENGTH})",
            raw.len()
        )));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(format!(
                "store path component too long (max {MAX_PATH_COMPONENT_LENGTH})"
            )));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Creates the parent directory of the store path if missing.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS model_translations (
                    translatable_type TEXT NOT NULL,
                    translatable_id TEXT NOT NULL,
                    locale TEXT NOT NULL,
                    key TEXT NOT NULL,
                    value TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL,
                    PRIMARY KEY (translatable_type, translatable_id, locale, key)
                );
                CREATE INDEX IF NOT EXISTS idx_model_translations_locale
                    ON model_translations (translatable_type, translatable_id, locale);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

// ============================================================================
// SECTION: Time
// ============================================================================

/// Returns the current unix epoch in milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
