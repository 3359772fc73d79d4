//! Adapter around the `snapctl` control command.

use crate::config::ConfigTree;
use crate::env::SnapEnviron;
use crate::error::{Result, SnapError};
use regex::Regex;
use serde::Serialize;
use std::env;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

pub const DEFAULT_SNAPCTL: &str = "/usr/bin/snapctl";

static SERVICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^.]+\.(?P<name>\S+)\s+(?P<startup>\S+)\s+(?P<current>\S+)\s+(?P<notes>\S+)")
        .expect("valid service regex")
});

/// Captured result of a finished control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Executes the control command. Swapped out in tests.
pub trait CtlRunner {
    fn run(&self, executable: &Path, args: &[String]) -> Result<CommandOutput, io::Error>;
}

/// Runs the control command as a child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CtlRunner for ProcessRunner {
    fn run(&self, executable: &Path, args: &[String]) -> Result<CommandOutput, io::Error> {
        let output = Command::new(executable).args(args).output()?;
        let status_code = output
            .status
            .code()
            .unwrap_or(if output.status.success() { 0 } else { 1 });
        Ok(CommandOutput {
            status_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Information for a service in the snap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: String,
    pub enabled: bool,
    pub active: bool,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapHealthStatus {
    Okay,
    Waiting,
    Blocked,
    Error,
}

impl SnapHealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapHealthStatus::Okay => "okay",
            SnapHealthStatus::Waiting => "waiting",
            SnapHealthStatus::Blocked => "blocked",
            SnapHealthStatus::Error => "error",
        }
    }
}

impl fmt::Display for SnapHealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action requested through `snapctl refresh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshAction {
    Proceed,
    Hold,
}

/// Resolve the control executable, honoring `SNAPHELPERS_SNAPCTL`.
pub fn resolve_executable() -> PathBuf {
    match env::var("SNAPHELPERS_SNAPCTL") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_SNAPCTL),
    }
}

pub struct SnapCtl<R = ProcessRunner> {
    executable: PathBuf,
    instance_name: String,
    runner: R,
}

impl SnapCtl<ProcessRunner> {
    pub fn new(executable: impl Into<PathBuf>, instance_name: impl Into<String>) -> Self {
        Self::with_runner(executable, instance_name, ProcessRunner)
    }

    pub fn from_environ(env: &SnapEnviron) -> Self {
        Self::new(resolve_executable(), env.instance_name().unwrap_or_default())
    }
}

impl<R: CtlRunner> SnapCtl<R> {
    pub fn with_runner(
        executable: impl Into<PathBuf>,
        instance_name: impl Into<String>,
        runner: R,
    ) -> Self {
        Self {
            executable: executable.into(),
            instance_name: instance_name.into(),
            runner,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Execute the command with the given arguments and return its output.
    pub fn run<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        log::debug!("running {} {}", self.executable.display(), args.join(" "));
        let output = self
            .runner
            .run(&self.executable, &args)
            .map_err(|source| SnapError::Spawn {
                executable: self.executable.clone(),
                source,
            })?;
        if output.status_code != 0 {
            return Err(SnapError::SnapCtl {
                returncode: output.status_code,
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }
        String::from_utf8(output.stdout).map_err(SnapError::OutputEncoding)
    }

    /// Return the configuration for the given top-level keys.
    pub fn config_get<I, S>(&self, keys: I) -> Result<ConfigTree>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = vec!["get".to_string(), "-d".to_string()];
        args.extend(keys.into_iter().map(Into::into));
        decode_json(&self.run(args)?)
    }

    /// Set configuration values. Keys may use dotted notation.
    ///
    /// All pairs are passed to a single `snapctl set` invocation.
    pub fn config_set<I, K, V>(&self, configs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Serialize,
    {
        let mut args = vec!["set".to_string()];
        args.extend(set_args(configs)?);
        self.run(args).map(drop)
    }

    pub fn config_unset<I, S>(&self, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = vec!["set".to_string()];
        args.extend(unset_args(keys));
        self.run(args).map(drop)
    }

    /// Set plug or slot configuration.
    pub fn connection_set<I, K, V>(&self, name: &str, configs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Serialize,
    {
        let mut args = vec!["set".to_string(), format!(":{name}")];
        args.extend(set_args(configs)?);
        self.run(args).map(drop)
    }

    pub fn connection_unset<I, S>(&self, name: &str, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = vec!["set".to_string(), format!(":{name}")];
        args.extend(unset_args(keys));
        self.run(args).map(drop)
    }

    /// Whether a plug or slot is connected. A failing `is-connected` call
    /// means it is not; other errors are returned.
    pub fn is_connected(&self, name: &str) -> Result<bool> {
        match self.run(["is-connected", name]) {
            Ok(_) => Ok(true),
            Err(SnapError::SnapCtl { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Plug configuration, from the connected slot when `remote` is set.
    pub fn plug_get<I, S>(&self, name: &str, keys: I, remote: bool) -> Result<ConfigTree>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.connection_get(name, keys, remote.then_some("slot"))
    }

    /// Slot configuration, from the connected plug when `remote` is set.
    pub fn slot_get<I, S>(&self, name: &str, keys: I, remote: bool) -> Result<ConfigTree>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.connection_get(name, keys, remote.then_some("plug"))
    }

    /// Start all services, or only the given ones.
    pub fn start(&self, services: &[&str], enable: bool) -> Result<()> {
        self.run_for_services("start", services, enable.then_some("--enable"))
            .map(drop)
    }

    pub fn stop(&self, services: &[&str], disable: bool) -> Result<()> {
        self.run_for_services("stop", services, disable.then_some("--disable"))
            .map(drop)
    }

    pub fn restart(&self, services: &[&str], reload: bool) -> Result<()> {
        self.run_for_services("restart", services, reload.then_some("--reload"))
            .map(drop)
    }

    /// Status of all services, or only the given ones.
    pub fn services(&self, services: &[&str]) -> Result<Vec<ServiceInfo>> {
        let output = self.run_for_services("services", services, None)?;
        Ok(parse_services(&output))
    }

    pub fn set_health(
        &self,
        status: SnapHealthStatus,
        message: Option<&str>,
        code: Option<&str>,
    ) -> Result<()> {
        let mut args = vec!["set-health".to_string(), status.as_str().to_string()];
        if let Some(message) = message {
            args.push(message.to_string());
        }
        if let Some(code) = code {
            args.push("--code".to_string());
            args.push(code.to_string());
        }
        self.run(args).map(drop)
    }

    /// Information on the device's current system mode.
    pub fn system_mode(&self) -> Result<ConfigTree> {
        decode_yaml(&self.run(["system-mode"])?)
    }

    /// Pending refresh state, optionally requesting an action. Actions need
    /// the `snap-refresh-control` interface.
    pub fn refresh(&self, action: Option<RefreshAction>) -> Result<ConfigTree> {
        let mut args = vec!["refresh", "--pending"];
        match action {
            Some(RefreshAction::Proceed) => args.push("--proceed"),
            Some(RefreshAction::Hold) => args.push("--hold"),
            None => {}
        }
        decode_yaml(&self.run(args)?)
    }

    fn run_for_services(
        &self,
        cmd: &str,
        services: &[&str],
        option: Option<&str>,
    ) -> Result<String> {
        let mut args = vec![cmd.to_string()];
        if let Some(option) = option {
            args.push(option.to_string());
        }
        if services.is_empty() {
            args.push(self.instance_name.clone());
        } else {
            args.extend(
                services
                    .iter()
                    .map(|service| format!("{}.{}", self.instance_name, service)),
            );
        }
        self.run(args)
    }

    fn connection_get<I, S>(
        &self,
        name: &str,
        keys: I,
        remote_type: Option<&str>,
    ) -> Result<ConfigTree>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = vec!["get".to_string(), "-d".to_string()];
        if let Some(remote_type) = remote_type {
            args.push(format!("--{remote_type}"));
        }
        args.push(format!(":{name}"));
        args.extend(keys.into_iter().map(Into::into));
        decode_json(&self.run(args)?)
    }
}

impl<R> fmt::Debug for SnapCtl<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapCtl")
            .field("executable", &self.executable)
            .field("instance_name", &self.instance_name)
            .finish()
    }
}

fn set_args<I, K, V>(configs: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Serialize,
{
    configs
        .into_iter()
        .map(|(key, value)| {
            let value = serde_json::to_string(&value)?;
            Ok(format!("{}={}", key.as_ref(), value))
        })
        .collect()
}

fn unset_args<I, S>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keys.into_iter()
        .map(|key| format!("{}!", key.as_ref()))
        .collect()
}

fn decode_json(text: &str) -> Result<ConfigTree> {
    serde_json::from_str(text).map_err(SnapError::Decode)
}

fn decode_yaml(text: &str) -> Result<ConfigTree> {
    Ok(serde_yaml::from_str(text)?)
}

fn parse_services(text: &str) -> Vec<ServiceInfo> {
    // first line is the table header
    text.lines()
        .skip(1)
        .filter_map(|line| SERVICE_RE.captures(line))
        .map(|caps| {
            let notes = match &caps["notes"] {
                "-" => Vec::new(),
                notes => notes.split(',').map(str::to_string).collect(),
            };
            ServiceInfo {
                name: caps["name"].to_string(),
                enabled: &caps["startup"] == "enabled",
                active: &caps["current"] == "active",
                notes,
            }
        })
        .collect()
}
