//! Shell variable and environment stores.
//!
//! [`VarStore`] is the observable variable map: `set` publishes a
//! [`VarChange`] carrying both the old and new value on an explicit change
//! channel. There is no implicit interception — callers go through `set`.
//!
//! [`EnvStore`] holds the exported environment. An entry is either a literal
//! string or a computed value evaluated against the shared [`VarStore`] on
//! every read (the way `PWD` tracks the `pwd` shell variable).
//!
//! Both stores are shared by reference across a session's nested contexts:
//! a mutation from any pipeline stage is visible to siblings and the parent.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;

/// A change notification from [`VarStore::set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarChange {
    /// The variable name.
    pub key: String,
    /// The previous value, if the variable existed.
    pub old: Option<String>,
    /// The new value.
    pub new: String,
}

/// Observable shell-variable map.
pub struct VarStore {
    map: RwLock<HashMap<String, String>>,
    changes: broadcast::Sender<VarChange>,
}

impl VarStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            map: RwLock::new(HashMap::new()),
            changes,
        }
    }

    /// Get a variable's value.
    pub fn get(&self, key: &str) -> Option<String> {
        self.map
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    /// Set a variable and publish a change notification.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let old = self
            .map
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.clone(), value.clone());
        // No subscribers is fine; the notification is best-effort.
        let _ = self.changes.send(VarChange {
            key,
            old,
            new: value,
        });
    }

    /// Subscribe to change notifications. Changes published before this
    /// call are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<VarChange> {
        self.changes.subscribe()
    }

    /// All variables as sorted (name, value) pairs.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = self
            .map
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
        pairs
    }
}

impl Default for VarStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VarStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VarStore").finish_non_exhaustive()
    }
}

/// One exported environment entry.
#[derive(Clone)]
pub enum EnvEntry {
    /// A fixed string value.
    Literal(String),
    /// A value computed from the variable store on every read.
    Computed(Arc<dyn Fn(&VarStore) -> String + Send + Sync>),
}

impl std::fmt::Debug for EnvEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvEntry::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            EnvEntry::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Exported environment, backed by the shared variable store for computed
/// entries.
pub struct EnvStore {
    entries: RwLock<HashMap<String, EnvEntry>>,
    vars: Arc<VarStore>,
}

impl EnvStore {
    /// Create an empty environment bound to `vars`.
    pub fn new(vars: Arc<VarStore>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            vars,
        }
    }

    /// Export a literal value.
    pub fn export(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), EnvEntry::Literal(value.into()));
    }

    /// Export a computed entry evaluated against the variable store.
    pub fn export_computed(
        &self,
        key: impl Into<String>,
        compute: impl Fn(&VarStore) -> String + Send + Sync + 'static,
    ) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), EnvEntry::Computed(Arc::new(compute)));
    }

    /// Read an entry, evaluating computed values.
    pub fn get(&self, key: &str) -> Option<String> {
        let entry = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()?;
        Some(match entry {
            EnvEntry::Literal(s) => s,
            EnvEntry::Computed(f) => f(&self.vars),
        })
    }

    /// The full environment as sorted (name, value) pairs, computed entries
    /// evaluated.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let entries: Vec<(String, EnvEntry)> = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let mut pairs: Vec<(String, String)> = entries
            .into_iter()
            .map(|(k, entry)| {
                let value = match entry {
                    EnvEntry::Literal(s) => s,
                    EnvEntry::Computed(f) => f(&self.vars),
                };
                (k, value)
            })
            .collect();
        pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
        pairs
    }
}

impl std::fmt::Debug for EnvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvStore").finish_non_exhaustive()
    }
}
