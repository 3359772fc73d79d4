//! Snap configuration with dotted-key access.
//!
//! Nested keys are addressed with dotted notation, so `baz.bbb.ccc` reads
//! the `ccc` entry of the `bbb` tree under the top-level `baz` key.

use crate::ctl::{CtlRunner, ProcessRunner, SnapCtl};
use crate::error::{Result, SnapError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// A configuration tree as returned by `snapctl get -d`.
pub type ConfigTree = Map<String, Value>;

/// Snapshot of a set of top-level configuration keys.
///
/// Empty until [`SnapConfigOptions::fetch`] is called. Fetching again
/// replaces the snapshot.
#[derive(Debug)]
pub struct SnapConfigOptions<'a, R = ProcessRunner> {
    snapctl: &'a SnapCtl<R>,
    keys: Vec<String>,
    config: ConfigTree,
}

impl<'a, R: CtlRunner> SnapConfigOptions<'a, R> {
    pub fn new<I, S>(keys: I, snapctl: &'a SnapCtl<R>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            snapctl,
            keys: keys.into_iter().map(Into::into).collect(),
            config: ConfigTree::new(),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Fetch the current configuration for the top-level keys.
    pub fn fetch(&mut self) -> Result<()> {
        self.config = self.snapctl.config_get(self.keys.iter().cloned())?;
        Ok(())
    }

    /// Return the value at a dotted key.
    pub fn lookup(&self, key: &str) -> Result<&Value> {
        let unknown = || SnapError::UnknownConfigKey {
            key: key.to_string(),
        };
        let mut segments = key.split('.');
        let first = segments.next().unwrap_or_default();
        let mut value = self.config.get(first).ok_or_else(unknown)?;
        for segment in segments {
            value = value
                .as_object()
                .and_then(|tree| tree.get(segment))
                .ok_or_else(unknown)?;
        }
        Ok(value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_ok()
    }

    /// Return the value at a dotted key, or `default` if it's not set.
    pub fn get(&self, key: &str, default: Value) -> Value {
        self.lookup(key).cloned().unwrap_or(default)
    }

    /// Return a copy of the fetched configuration.
    pub fn as_tree(&self) -> ConfigTree {
        self.config.clone()
    }
}

/// Interact with the snap configuration.
#[derive(Debug)]
pub struct SnapConfig<R = ProcessRunner> {
    snapctl: Arc<SnapCtl<R>>,
}

impl<R: CtlRunner> SnapConfig<R> {
    pub fn new(snapctl: Arc<SnapCtl<R>>) -> Self {
        Self { snapctl }
    }

    /// Return a fetched [`SnapConfigOptions`] for the given top-level keys.
    ///
    /// Dotted keys are rejected before anything is fetched.
    pub fn get_options<I, S>(&self, keys: I) -> Result<SnapConfigOptions<'_, R>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        if let Some(key) = keys.iter().find(|key| key.contains('.')) {
            return Err(SnapError::InvalidKey { key: key.clone() });
        }
        let mut options = SnapConfigOptions::new(keys, self.snapctl.as_ref());
        options.fetch()?;
        Ok(options)
    }

    /// Return the value for a single, possibly dotted, key.
    ///
    /// Each call fetches the key's top-level tree anew.
    pub fn get(&self, key: &str) -> Result<Value> {
        let top_level = key.split_once('.').map_or(key, |(top, _)| top);
        let options = self.get_options([top_level])?;
        let value = options.lookup(key)?.clone();
        Ok(value)
    }

    /// Set configuration values. Keys can use dotted notation.
    pub fn set<I, K, V>(&self, configs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Serialize,
    {
        self.snapctl.config_set(configs)
    }

    /// Unset configuration keys.
    ///
    /// Removing the last child of a tree leaves the parent key set to an
    /// empty tree; unset the parent to remove it.
    pub fn unset<I, S>(&self, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.snapctl.config_unset(keys)
    }
}
