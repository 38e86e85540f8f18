//! Teardown command handler

use std::process::ExitCode;

use anyhow::Result;
use colored::*;

use crate::commands::CliContext;
use crate::sandbox::teardown;
use crate::storage::artifact::SandboxArtifact;

/// Stop the sandbox recorded in the artifact, then delete the artifact
pub async fn handle_teardown_command(ctx: &CliContext) -> Result<ExitCode> {
    let file = ctx.artifact_file();
    let Some(artifact) = SandboxArtifact::read(&file).await? else {
        println!(
            "No {} found, nothing to clean up.",
            file.path().display()
        );
        return Ok(ExitCode::SUCCESS);
    };

    match artifact.sandbox_id {
        Some(id) => {
            println!("Stopping sandbox: {}", id);
            let stopped = async {
                let provider = ctx.provider()?;
                Ok::<_, anyhow::Error>(teardown(provider.as_ref(), &id).await?)
            };
            match stopped.await {
                Ok(outcome) => println!("  {} {}", "✓".green(), outcome.as_str()),
                Err(e) => println!(
                    "  {} {}",
                    "Could not stop sandbox (may already be stopped):".yellow(),
                    e
                ),
            }
        }
        None => println!("No SANDBOX_ID found, nothing to stop."),
    }

    file.delete().await?;
    println!("Removed {}", file.path().display());
    Ok(ExitCode::SUCCESS)
}
