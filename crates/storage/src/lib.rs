//! Sqlite-backed key/value persistence.
//!
//! Values are stored as JSON text. Reads and writes never fail from the
//! caller's point of view: problems are logged and masked by defaults.

use std::path::Path;

use anyhow::Context as _;
use rusqlite::{Connection, OptionalExtension as _};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Keys shared by the shell's persisted state.
pub mod keys {
    pub const THEME: &str = "theme";
    pub const SIDER_COLLAPSED: &str = "siderCollapsed";
    pub const ACTIVE_TAB: &str = "activeTab";
    pub const OPEN_TABS: &str = "openTabs";
    pub const USER: &str = "user";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScope {
    /// Survives restarts.
    Durable,
    /// Lives as long as the store value.
    Ephemeral,
}

impl StoreScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreScope::Durable => "durable",
            StoreScope::Ephemeral => "ephemeral",
        }
    }
}

impl std::fmt::Display for StoreScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct KvStore {
    conn: Connection,
    scope: StoreScope,
}

impl KvStore {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("open sqlite db at {}", path.as_ref().display()))?;
        let store = Self {
            conn,
            scope: StoreScope::Durable,
        };
        store.migrate()?;
        Ok(store)
    }

    pub fn ephemeral() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        let store = Self {
            conn,
            scope: StoreScope::Ephemeral,
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );
                "#,
            )
            .context("create kv table")?;
        Ok(())
    }

    pub fn scope(&self) -> StoreScope {
        self.scope
    }

    /// Returns the stored value for `key`, or `default` when the key is
    /// absent or its text does not parse.
    pub fn read<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let raw = match self.read_raw(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(err) => {
                tracing::warn!(scope = %self.scope, key, "error reading key: {err:#}");
                return default;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(scope = %self.scope, key, "error parsing stored value: {err}");
                default
            }
        }
    }

    /// Stores `value` under `key`. On failure the previous value is kept and
    /// `false` is returned.
    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(scope = %self.scope, key, "error serializing value: {err}");
                return false;
            }
        };

        match self.write_raw(key, &json) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(scope = %self.scope, key, "error setting key: {err:#}");
                false
            }
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        match self.conn.execute("DELETE FROM kv WHERE key = ?", [key]) {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(scope = %self.scope, key, "error removing key: {err}");
                false
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        matches!(self.read_raw(key), Ok(Some(_)))
    }

    fn read_raw(&self, key: &str) -> anyhow::Result<Option<String>> {
        let raw = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |row| row.get(0))
            .optional()
            .with_context(|| format!("select {key}"))?;
        Ok(raw)
    }

    fn write_raw(&self, key: &str, json: &str) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO kv (key, value) VALUES (?, ?)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                "#,
                (key, json),
            )
            .with_context(|| format!("upsert {key}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use adminshell_core::{SessionUser, TabDescriptor, default_tabs};

    use super::*;

    #[test]
    fn value_roundtrip() -> anyhow::Result<()> {
        let store = KvStore::ephemeral()?;
        let tabs = vec![
            TabDescriptor::home(),
            TabDescriptor::new("user-list", "用户列表"),
        ];
        assert!(store.write(keys::OPEN_TABS, &tabs));
        assert_eq!(store.read(keys::OPEN_TABS, default_tabs()), tabs);

        assert!(store.write(keys::THEME, &true));
        assert!(store.read(keys::THEME, false));
        Ok(())
    }

    #[test]
    fn missing_key_yields_default() -> anyhow::Result<()> {
        let store = KvStore::ephemeral()?;
        assert_eq!(store.read(keys::ACTIVE_TAB, "dashboard".to_string()), "dashboard");
        assert!(!store.contains(keys::ACTIVE_TAB));
        Ok(())
    }

    #[test]
    fn corrupt_value_yields_default() -> anyhow::Result<()> {
        let store = KvStore::ephemeral()?;
        store.write_raw(keys::USER, "{not json")?;
        let user: Option<SessionUser> = store.read(keys::USER, None);
        assert_eq!(user, None);
        Ok(())
    }

    #[test]
    fn failed_write_keeps_prior_value() -> anyhow::Result<()> {
        let store = KvStore::ephemeral()?;
        assert!(store.write(keys::SIDER_COLLAPSED, &true));
        store.conn.execute_batch("PRAGMA query_only = ON")?;
        assert!(!store.write(keys::SIDER_COLLAPSED, &false));
        assert!(store.read(keys::SIDER_COLLAPSED, false));
        Ok(())
    }

    #[test]
    fn unserializable_value_is_not_written() -> anyhow::Result<()> {
        let store = KvStore::ephemeral()?;
        let mut bad = HashMap::new();
        bad.insert((1, 2), "tuple keys are not valid json object keys");
        assert!(!store.write("bad", &bad));
        assert!(!store.contains("bad"));
        Ok(())
    }

    #[test]
    fn kv_table_holds_only_key_and_value() -> anyhow::Result<()> {
        let store = KvStore::ephemeral()?;
        let mut stmt = store.conn.prepare("SELECT name FROM pragma_table_info('kv')")?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(columns, vec!["key".to_string(), "value".to_string()]);
        Ok(())
    }

    #[test]
    fn remove_clears_key() -> anyhow::Result<()> {
        let store = KvStore::ephemeral()?;
        store.write(keys::USER, &SessionUser::new("admin"));
        assert!(store.contains(keys::USER));
        assert!(store.remove(keys::USER));
        assert!(!store.contains(keys::USER));
        Ok(())
    }

    #[test]
    fn durable_store_survives_reopen() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("shell.db");
        {
            let store = KvStore::open(&path)?;
            assert_eq!(store.scope(), StoreScope::Durable);
            store.write(keys::ACTIVE_TAB, "user-list");
        }
        let store = KvStore::open(&path)?;
        assert_eq!(store.read(keys::ACTIVE_TAB, String::new()), "user-list");
        Ok(())
    }

    #[test]
    fn ephemeral_stores_are_isolated() -> anyhow::Result<()> {
        let first = KvStore::ephemeral()?;
        first.write(keys::USER, &SessionUser::new("admin"));
        let second = KvStore::ephemeral()?;
        assert_eq!(second.scope(), StoreScope::Ephemeral);
        assert!(!second.contains(keys::USER));
        Ok(())
    }
}
