//! Bounded readiness polling for background services

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

use crate::errors::ProvisionError;
use crate::sandbox::{CommandSpec, RemoteExecutor};
use crate::utils::{calc_exp_backoff, CooldownOptions};

/// Readiness polling options
#[derive(Debug, Clone)]
pub struct ReadinessOptions {
    /// Probes before giving up
    pub max_attempts: u32,

    /// Delay between probes
    pub cooldown: CooldownOptions,
}

impl Default for ReadinessOptions {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            cooldown: CooldownOptions::default(),
        }
    }
}

/// Run `probe` until it exits 0, sleeping with exponential backoff between
/// attempts. Returns the number of attempts used.
///
/// Transport errors count as failed probes. Exhausting the attempts is a
/// startup-class failure.
pub async fn wait_until_ready<S, F>(
    executor: &dyn RemoteExecutor,
    what: &str,
    probe: &CommandSpec,
    options: &ReadinessOptions,
    sleep_fn: S,
) -> Result<u32, ProvisionError>
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    let mut last_failure = String::from("never probed");

    for attempt in 0..options.max_attempts {
        if attempt > 0 {
            sleep_fn(calc_exp_backoff(&options.cooldown, attempt - 1)).await;
        }

        match executor.run_command(probe).await {
            Ok(output) if output.success() => {
                info!("{} ready after {} attempt(s)", what, attempt + 1);
                return Ok(attempt + 1);
            }
            Ok(output) => {
                last_failure = format!("exit code {}", output.exit_code);
            }
            Err(e) => {
                last_failure = e.to_string();
            }
        }
        debug!(
            "{} not ready (attempt {}/{}): {}",
            what,
            attempt + 1,
            options.max_attempts,
            last_failure
        );
    }

    Err(ProvisionError::StartupError(format!(
        "{} not ready after {} attempts ({})",
        what, options.max_attempts, last_failure
    )))
}
