//! Build command handler

use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::*;
use tokio::process::Command;
use tracing::warn;

use crate::commands::CliContext;
use crate::sandbox::{teardown, SandboxProvider};
use crate::storage::artifact::SandboxArtifact;

/// Provision, run the downstream command, then clean up.
///
/// Exits with the downstream command's exit code. Teardown failures are
/// reported but do not change it.
pub async fn handle_build_command(command: Vec<String>, ctx: &CliContext) -> Result<ExitCode> {
    let Some((program, args)) = command.split_first() else {
        anyhow::bail!("no build command given");
    };

    let provider = ctx.provider()?;
    println!("{}", "=== Starting sandbox ===".bold());
    let deployment = ctx.pipeline(provider.clone())?.run().await?;
    let sandbox_id = deployment.environment.id.clone();
    println!("  {} {}", "WordPress is live at:".green(), deployment.url);
    println!("  {} {}", "Sandbox ID:".green(), sandbox_id);

    let file = ctx.artifact_file();
    let artifact = SandboxArtifact {
        wordpress_url: deployment.url.clone(),
        sandbox_id: Some(sandbox_id.clone()),
    };
    if let Err(e) = artifact.write(&file).await {
        stop_sandbox(provider.as_ref(), &sandbox_id).await;
        return Err(anyhow::Error::from(e)
            .context(format!("failed to write {}", file.path().display())));
    }

    println!("{}", format!("=== Running {} ===", command.join(" ")).bold());
    let status = Command::new(program)
        .args(args)
        .env("WORDPRESS_URL", &deployment.url)
        .env("SANDBOX_ID", &sandbox_id)
        .status()
        .await
        .with_context(|| format!("failed to run {}", program));

    stop_sandbox(provider.as_ref(), &sandbox_id).await;

    if let Err(e) = file.delete().await {
        warn!("Failed to delete {}: {}", file.path().display(), e);
    }

    let code = match status?.code() {
        Some(code) => code,
        None => {
            warn!("{} was terminated by a signal", program);
            1
        }
    };
    Ok(exit_code(code))
}

/// Best-effort teardown; failures are reported, never returned
async fn stop_sandbox(provider: &dyn SandboxProvider, id: &str) {
    println!("{}", "=== Stopping sandbox ===".bold());
    match teardown(provider, id).await {
        Ok(outcome) => println!("  Sandbox {}", outcome.as_str()),
        Err(e) => println!("  {} {}", "Could not stop sandbox:".yellow(), e),
    }
}

fn exit_code(code: i32) -> ExitCode {
    match u8::try_from(code) {
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::FAILURE,
    }
}
