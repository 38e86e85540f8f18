//! Init command handler

use std::process::ExitCode;

use anyhow::Result;
use colored::*;

use crate::commands::CliContext;
use crate::storage::artifact::SandboxArtifact;

/// Provision a sandbox and persist its URL and id
pub async fn handle_init_command(ctx: &CliContext) -> Result<ExitCode> {
    let deployment = ctx.pipeline(ctx.provider()?)?.run().await?;

    let artifact = SandboxArtifact {
        wordpress_url: deployment.url.clone(),
        sandbox_id: Some(deployment.environment.id.clone()),
    };
    let file = ctx.artifact_file();
    artifact.write(&file).await?;

    println!("{}", "✓ WordPress is live!".green().bold());
    println!("  {} {}", "URL:".bold(), deployment.url);
    println!("  {} {}", "Sandbox:".bold(), deployment.environment.id);
    println!("  {} {}", "Written to".dimmed(), file.path().display());
    Ok(ExitCode::SUCCESS)
}
