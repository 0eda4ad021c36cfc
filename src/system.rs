use crate::{
    assistant::SystemControl,
    error::{DispatcherError, DispatcherResult},
};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::*;

/// Linux host controlled through shell utilities
#[derive(Debug, Clone, Default)]
pub struct LinuxSystemControl;

#[async_trait]
impl SystemControl for LinuxSystemControl {
    async fn shutdown(&self) -> anyhow::Result<()> {
        warn!("Shutting down");
        run_command("sudo", &["shutdown", "now"]).await?;
        Ok(())
    }

    async fn reboot(&self) -> anyhow::Result<()> {
        warn!("Rebooting");
        run_command("sudo", &["reboot"]).await?;
        Ok(())
    }

    async fn primary_ip_address(&self) -> anyhow::Result<String> {
        let output = run_command("hostname", &["-I"]).await?;
        Ok(first_field(&output)?)
    }
}

/// Machine hardware name as reported by `uname -m`
pub async fn machine_architecture() -> DispatcherResult<String> {
    let output = run_command("uname", &["-m"]).await?;
    first_field(&output)
}

async fn run_command(program: &str, args: &[&str]) -> DispatcherResult<String> {
    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await?;
    if !output.status.success() {
        error!("Command {} {:?} failed: {:?}", program, args, output);
        return Err(DispatcherError::CommandFailed(format!(
            "{} {}",
            program,
            args.join(" ")
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn first_field(text: &str) -> DispatcherResult<String> {
    text.split_whitespace()
        .next()
        .map(ToOwned::to_owned)
        .ok_or_else(|| DispatcherError::FailedParsingCommandOutput(text.to_owned()))
}
