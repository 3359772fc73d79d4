//! Lifecycle hooks registered by the application.
//!
//! The application builds a [`HookRegistry`] in its `main` and hands it to
//! [`crate::cli::main`], which writes hook stubs at build time and runs the
//! requested hook when snapd invokes one.

use crate::error::{Result, SnapError};
use crate::snap::Snap;
use std::any;
use std::collections::BTreeMap;
use std::fmt;

type HookFn = Box<dyn Fn(&Snap) -> anyhow::Result<()>>;

pub struct Hook {
    name: String,
    target: &'static str,
    func: HookFn,
}

impl Hook {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the function implementing the hook.
    pub fn target(&self) -> &str {
        self.target
    }

    pub fn call(&self, snap: &Snap) -> anyhow::Result<()> {
        (self.func)(snap)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("target", &self.target)
            .finish()
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.target)
    }
}

#[derive(Debug, Default)]
pub struct HookRegistry {
    hooks: Vec<Hook>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `func` as the hook called `name`.
    ///
    /// Registering the same name twice is reported by [`HookRegistry::validate`].
    pub fn register<F>(&mut self, name: &str, func: F) -> &mut Self
    where
        F: Fn(&Snap) -> anyhow::Result<()> + 'static,
    {
        self.hooks.push(Hook {
            name: name.to_string(),
            target: any::type_name::<F>(),
            func: Box::new(func),
        });
        self
    }

    /// Registered hooks, sorted by name.
    pub fn hooks(&self) -> Vec<&Hook> {
        let mut hooks: Vec<&Hook> = self.hooks.iter().collect();
        hooks.sort_by(|a, b| a.name.cmp(&b.name));
        hooks
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Hook> {
        self.hooks.iter().find(|hook| hook.name == name)
    }

    /// Check that every hook name is registered once.
    pub fn validate(&self) -> Result<()> {
        let mut by_name: BTreeMap<&str, Vec<&Hook>> = BTreeMap::new();
        for hook in &self.hooks {
            by_name.entry(hook.name.as_str()).or_default().push(hook);
        }
        let duplicated: Vec<_> = by_name
            .into_iter()
            .filter(|(_, hooks)| hooks.len() > 1)
            .collect();
        if duplicated.is_empty() {
            return Ok(());
        }
        let mut message = vec!["Multiple definitions found for hook(s):".to_string()];
        for (name, hooks) in duplicated {
            message.push(format!("- {name}"));
            let mut targets: Vec<String> = hooks.iter().map(|hook| hook.to_string()).collect();
            targets.sort();
            message.extend(targets.into_iter().map(|target| format!("    {target}")));
        }
        Err(SnapError::Hook(message.join("\n")))
    }

    /// Run the hook called `name`.
    pub fn run(&self, name: &str, snap: &Snap) -> Result<()> {
        let hook = self
            .get(name)
            .ok_or_else(|| SnapError::Hook(format!("Hook function(s) not found:\n- {name}")))?;
        log::info!("running hook {hook}");
        hook.call(snap)
            .map_err(|err| SnapError::Hook(format!("Hook {name} failed: {err:#}")))
    }
}
