use anyhow::{Context, Result, anyhow};
use std::process::{Command, Stdio};
use tracing::info;

pub fn check_command_exists(command: &str) -> Result<(), String> {
    let check = if cfg!(windows) {
        Command::new("where").arg(command).output()
    } else {
        Command::new("which").arg(command).output()
    };

    match check {
        Ok(output) if output.status.success() => Ok(()),
        _ => Err(format!("'{command}' not found in PATH")),
    }
}

/// Opens the manager UI in a new window by running the configured
/// `popup_command`, detached from the server.
#[derive(Debug, Clone, Default)]
pub struct PopupLauncher {
    command: Option<String>,
}

impl PopupLauncher {
    pub fn new(command: Option<String>) -> Self {
        Self {
            command: command.filter(|c| !c.trim().is_empty()),
        }
    }

    pub fn launch(&self) -> Result<()> {
        let command_line = self
            .command
            .as_deref()
            .ok_or_else(|| anyhow!("no popup_command configured in config.toml"))?;

        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("popup_command is empty"))?;
        let args: Vec<&str> = parts.collect();

        check_command_exists(program).map_err(|e| anyhow!(e))?;

        let child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to execute '{program}'"))?;

        info!(program, pid = child.id(), "Opened popup");
        Ok(())
    }
}
