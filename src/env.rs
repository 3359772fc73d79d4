use crate::error::{Result, SnapError};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::env;

const PREFIX: &str = "SNAP_";

/// Return whether the current process runs inside a snap.
pub fn is_snap() -> bool {
    env::var("SNAP").map(|value| !value.is_empty()).unwrap_or(false)
}

/// Return whether the given variables describe a snap environment.
pub fn is_snap_in<I, K, V>(vars: I) -> bool
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    vars.into_iter()
        .any(|(key, value)| key.as_ref() == "SNAP" && !value.as_ref().is_empty())
}

/// Read-only view of the `SNAP_*` environment variables.
///
/// Keys are stored without the `SNAP_` prefix, so `SNAP_DATA` is available
/// as `DATA`. The `SNAP` variable itself is kept under `SNAP`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapEnviron {
    vars: BTreeMap<String, String>,
}

impl SnapEnviron {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut collected = BTreeMap::new();
        let mut snap = None;
        for (key, value) in vars {
            let key = key.into();
            if key == "SNAP" {
                snap = Some(value.into());
            } else if let Some(stripped) = key.strip_prefix(PREFIX) {
                collected.insert(stripped.to_string(), value.into());
            }
        }
        match snap {
            Some(value) if !value.is_empty() => {
                collected.insert("SNAP".to_string(), value);
            }
            _ => return Err(SnapError::NotASnap),
        }
        Ok(Self { vars: collected })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Like [`SnapEnviron::get`], failing with the full variable name when absent.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| SnapError::MissingEnv(variable_name(key)))
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn name(&self) -> Option<&str> {
        self.get("NAME")
    }

    pub fn instance_name(&self) -> Option<&str> {
        self.get("INSTANCE_NAME")
    }

    pub fn version(&self) -> Option<&str> {
        self.get("VERSION")
    }

    /// The numeric revision. Locally installed snaps use `x<N>` revisions,
    /// which yield `None`.
    pub fn revision(&self) -> Option<u32> {
        self.get("REVISION").and_then(|value| value.parse().ok())
    }
}

impl<'a> IntoIterator for &'a SnapEnviron {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn variable_name(key: &str) -> String {
    if key == "SNAP" {
        key.to_string()
    } else {
        format!("{PREFIX}{key}")
    }
}
