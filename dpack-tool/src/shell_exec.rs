use anyhow::{Context, Result, bail};
use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};

/// Runs a hook command through `sh -c`, echoing its output line by line.
///
/// Returns `Ok(())` on exit code 0; anything else (including failure to
/// spawn the shell) is a hard failure for the caller.
pub fn run_hook(label: &str, command: &str) -> Result<()> {
    println!("Running {label} hook: {command}");

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdout(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn {label} hook '{command}'"))?;

    let stdout = child
        .stdout
        .take()
        .context("child process did not expose stdout")?;
    for line in BufReader::new(stdout).lines() {
        let line = line.context("reading output from hook")?;
        println!("{line}");
    }

    let status = child.wait().context("waiting for hook to finish")?;
    if !status.success() {
        bail!(
            "{label} hook '{command}' failed with exit code {}",
            status.code().unwrap_or(-1)
        );
    }
    Ok(())
}
