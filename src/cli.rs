//! Command line entry points for applications shipping hooks.
//!
//! ```no_run
//! use snaphelpers::{cli, HookRegistry, Snap};
//!
//! fn install(snap: &Snap) -> anyhow::Result<()> {
//!     snap.config.set([("ready", true)])?;
//!     Ok(())
//! }
//!
//! fn main() -> std::process::ExitCode {
//!     let mut hooks = HookRegistry::new();
//!     hooks.register("install", install);
//!     cli::main(&hooks)
//! }
//! ```

use crate::error::{Result, SnapError};
use crate::hook::{Hook, HookRegistry};
use crate::snap::Snap;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

pub const LOG_ENV: &str = "SNAPHELPERS_LOG";

#[derive(Parser, Debug)]
#[command(name = "snap-helpers", version, about = "Tool to perform snap-helpers tasks")]
pub struct Cli {
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write hook files
    WriteHooks {
        /// snap prime directory (default from CRAFT_PRIME or SNAPCRAFT_PRIME)
        #[arg(long)]
        prime_dir: Option<PathBuf>,
        /// command run by hook files, relative to $SNAP (default bin/<this executable>)
        #[arg(long)]
        command: Option<String>,
        /// fail if no hook is found
        #[arg(long)]
        fail_empty: bool,
    },
    /// Run the specified hook
    Hook {
        /// name of the hook to run
        name: String,
    },
}

#[derive(Debug, Serialize)]
struct JsonResult<T: Serialize> {
    ok: bool,
    result: Option<T>,
    error: Option<String>,
}

/// A hook script to be rendered into the snap's hooks directory.
#[derive(Debug)]
pub struct HookScript<'a> {
    hook: &'a Hook,
    command: &'a str,
}

impl<'a> HookScript<'a> {
    pub fn new(hook: &'a Hook, command: &'a str) -> Self {
        Self { hook, command }
    }

    pub fn render(&self) -> String {
        format!(
            "#!/bin/sh\n\
             # {target}\n\
             exec \"$SNAP/{command}\" hook {name} \"$@\"\n",
            target = self.hook.target(),
            command = self.command,
            name = self.hook.name(),
        )
    }

    /// Write the script in the hooks directory, returning its path.
    pub fn write(&self, hooks_dir: &Path) -> Result<PathBuf> {
        let path = hooks_dir.join(self.hook.name());
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let tmp_path = hooks_dir.join(format!(
            ".{}.tmp.{}.{}",
            self.hook.name(),
            std::process::id(),
            ts
        ));
        fs::write(&tmp_path, self.render())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(err) = fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o755)) {
                let _ = fs::remove_file(&tmp_path);
                return Err(err.into());
            }
        }
        if let Err(err) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }
        Ok(path)
    }
}

/// Parse the process arguments and run, returning the exit code.
pub fn main(registry: &HookRegistry) -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    let json = cli.json;
    match run(registry, cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json {
                let payload = JsonResult::<serde_json::Value> {
                    ok: false,
                    result: None,
                    error: Some(err.to_string()),
                };
                if let Err(print_err) = print_json(&payload) {
                    eprintln!("{print_err}");
                }
            } else {
                eprintln!("{err}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Like [`main`], with explicit arguments (the first one is the program name).
pub fn run_from<I, T>(registry: &HookRegistry, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(|err| SnapError::Hook(err.to_string()))?;
    run(registry, cli)
}

pub fn run(registry: &HookRegistry, cli: Cli) -> Result<()> {
    match cli.command {
        Commands::WriteHooks {
            prime_dir,
            command,
            fail_empty,
        } => handle_write_hooks(registry, cli.json, prime_dir, command, fail_empty),
        Commands::Hook { name } => handle_hook(registry, &name),
    }
}

fn init_logging() {
    let env = env_logger::Env::default().filter_or(LOG_ENV, "warn");
    // a host application may already have installed a logger
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn handle_write_hooks(
    registry: &HookRegistry,
    json: bool,
    prime_dir: Option<PathBuf>,
    command: Option<String>,
    fail_empty: bool,
) -> Result<()> {
    let prime_dir = match prime_dir {
        Some(path) => path,
        None => ensure_env_path("CRAFT_PRIME", "SNAPCRAFT_PRIME")?,
    };
    registry.validate()?;
    let hooks = registry.hooks();
    if hooks.is_empty() {
        if fail_empty {
            return Err(SnapError::Hook("No hooks defined in the snap.".to_string()));
        }
        if json {
            return output(json!({"hooks_dir": null, "hooks": []}));
        }
        println!(
            "No hooks defined in the snap.\n\
             Hooks must be registered in the application's HookRegistry."
        );
        return Ok(());
    }

    let command = match command {
        Some(command) => command,
        None => default_command()?,
    };
    let hooks_dir = prime_dir.join("snap").join("hooks");
    fs::create_dir_all(&hooks_dir)?;
    let hooks_dir = fs::canonicalize(&hooks_dir)?;

    if !json {
        println!("Writing hook files to {}", hooks_dir.display());
    }
    let mut written = Vec::new();
    for hook in hooks {
        if !json {
            println!(" {}: {}", hook.name(), hook.target());
        }
        let path = HookScript::new(hook, &command).write(&hooks_dir)?;
        log::info!("wrote hook {} to {}", hook.name(), path.display());
        written.push(hook.name().to_string());
    }
    if json {
        return output(json!({"hooks_dir": hooks_dir, "hooks": written}));
    }
    Ok(())
}

fn handle_hook(registry: &HookRegistry, name: &str) -> Result<()> {
    // look the hook up first so a missing one fails outside a snap too
    if registry.get(name).is_none() {
        return Err(SnapError::Hook(format!(
            "Hook function(s) not found:\n- {name}"
        )));
    }
    let snap = Snap::from_env()?;
    registry.run(name, &snap)
}

fn ensure_env_path(name: &str, fallback: &str) -> Result<PathBuf> {
    env::var_os(name)
        .or_else(|| env::var_os(fallback))
        .map(PathBuf::from)
        .ok_or_else(|| SnapError::MissingEnv(name.to_string()))
}

fn default_command() -> Result<String> {
    let exe = env::current_exe()?;
    let name = exe
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| SnapError::Hook("cannot determine executable name".to_string()))?;
    Ok(format!("bin/{name}"))
}

fn output(payload: serde_json::Value) -> Result<()> {
    let wrapper = JsonResult {
        ok: true,
        result: Some(payload),
        error: None,
    };
    print_json(&wrapper)
}

fn print_json<T: Serialize>(payload: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(payload)?;
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn noop(_snap: &Snap) -> anyhow::Result<()> {
        Ok(())
    }

    fn registry() -> HookRegistry {
        let mut registry = HookRegistry::new();
        registry.register("install", noop).register("configure", noop);
        registry
    }

    #[test]
    fn render_hook_script() {
        let registry = registry();
        let hook = registry.get("install").unwrap();
        let script = HookScript::new(hook, "bin/myapp").render();
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("tests::noop"));
        assert!(script.ends_with("exec \"$SNAP/bin/myapp\" hook install \"$@\"\n"));
    }

    #[cfg(unix)]
    #[test]
    fn write_hook_script_is_executable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let registry = registry();
        let hook = registry.get("configure").unwrap();
        let path = HookScript::new(hook, "bin/myapp").write(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("configure"));
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn write_hook_script_replaces_existing_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("install"), "stale").unwrap();
        let registry = registry();
        let hook = registry.get("install").unwrap();
        let path = HookScript::new(hook, "bin/myapp").write(dir.path()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("hook install"));
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![OsString::from("install")]);
    }

    #[test]
    fn write_hooks_with_prime_dir() {
        let dir = tempdir().unwrap();
        let prime = dir.path().to_string_lossy().to_string();
        run_from(
            &registry(),
            ["snap-helpers", "write-hooks", "--prime-dir", prime.as_str(), "--command", "bin/app"],
        )
        .unwrap();
        let hooks_dir = dir.path().join("snap/hooks");
        for name in ["install", "configure"] {
            let content = fs::read_to_string(hooks_dir.join(name)).unwrap();
            assert!(content.contains(&format!("hook {name}")));
        }
    }

    #[test]
    fn write_hooks_rejects_duplicates() {
        let dir = tempdir().unwrap();
        let prime = dir.path().to_string_lossy().to_string();
        let mut registry = registry();
        registry.register("install", noop);
        let err = run_from(&registry, ["snap-helpers", "write-hooks", "--prime-dir", prime.as_str()])
            .unwrap_err();
        assert!(err.to_string().contains("- install"));
        assert!(!dir.path().join("snap/hooks").exists());
    }

    #[test]
    fn write_hooks_empty_registry_succeeds_by_default() {
        let dir = tempdir().unwrap();
        let prime = dir.path().to_string_lossy().to_string();
        run_from(
            &HookRegistry::new(),
            ["snap-helpers", "write-hooks", "--prime-dir", prime.as_str()],
        )
        .unwrap();
        assert!(!dir.path().join("snap/hooks").exists());
    }

    #[test]
    fn write_hooks_fail_empty() {
        let dir = tempdir().unwrap();
        let prime = dir.path().to_string_lossy().to_string();
        let err = run_from(
            &HookRegistry::new(),
            ["snap-helpers", "write-hooks", "--prime-dir", prime.as_str(), "--fail-empty"],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "No hooks defined in the snap.");
        assert!(!dir.path().join("snap/hooks").exists());
    }

    #[test]
    fn write_hooks_fail_empty_ignored_with_hooks() {
        let dir = tempdir().unwrap();
        let prime = dir.path().to_string_lossy().to_string();
        run_from(
            &registry(),
            ["snap-helpers", "write-hooks", "--prime-dir", prime.as_str(), "--fail-empty"],
        )
        .unwrap();
        assert!(dir.path().join("snap/hooks/install").exists());
    }

    #[test]
    fn hook_not_registered() {
        let err = run_from(&registry(), ["snap-helpers", "hook", "remove"]).unwrap_err();
        assert_eq!(err.to_string(), "Hook function(s) not found:\n- remove");
    }

    #[test]
    fn invalid_arguments() {
        assert!(run_from(&registry(), ["snap-helpers", "bogus"]).is_err());
    }
}
