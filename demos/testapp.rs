use anyhow::Context;
use snaphelpers::{cli, HookRegistry, Snap};
use std::fs::OpenOptions;
use std::io::Write;
use std::process::ExitCode;

fn log_hook(snap: &Snap, message: &str) -> anyhow::Result<()> {
    let path = snap.paths.common.join("hooks.log");
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    writeln!(file, "{message}")?;
    log::info!("{message}");
    Ok(())
}

fn install_hook(snap: &Snap) -> anyhow::Result<()> {
    log_hook(snap, "Install hook called")
}

fn configure_hook(snap: &Snap) -> anyhow::Result<()> {
    log_hook(snap, "Configure hook called")?;
    let greeting = snap
        .config
        .get_options(["greeting"])?
        .get("greeting.text", serde_json::Value::from("hello"));
    log_hook(snap, &format!("greeting: {greeting}"))
}

fn main() -> ExitCode {
    let mut hooks = HookRegistry::new();
    hooks
        .register("install", install_hook)
        .register("configure", configure_hook);
    cli::main(&hooks)
}
