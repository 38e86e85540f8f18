//! Provisioning pipeline
//!
//! Walks the step table in order, awaiting every remote call before the
//! next one. The first failed step ends the run with a single error record.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::app::options::ProvisionOptions;
use crate::config::{
    render_fpm_conf, render_nginx_conf, render_wp_config, ConnectionDescriptor, EnvSource,
    SecurityKeys,
};
use crate::errors::{ProvisionError, SandboxError};
use crate::provision::fsm::{ProvisionEvent, ProvisionFsm, ProvisionState};
use crate::provision::progress::{NullSink, ProgressReporter, ProgressSink};
use crate::provision::readiness::wait_until_ready;
use crate::provision::steps::{total_steps, Emission, StepAction, PORT_PLACEHOLDER, STEPS};
use crate::sandbox::{
    teardown, CommandOutput, CommandSpec, Environment, FileWrite, Lease, LeaseRegistry,
    RemoteExecutor, SandboxProvider,
};
use crate::utils::shell_quote;

/// A successfully provisioned sandbox
#[derive(Debug, Clone)]
pub struct Deployment {
    pub environment: Environment,

    /// Public URL of the served port
    pub url: String,
}

/// Per-run state threaded through the steps
#[derive(Default)]
struct Run {
    executor: Option<Arc<dyn RemoteExecutor>>,
    _lease: Option<Lease>,
    url: Option<String>,
}

impl Run {
    fn executor(&self) -> Result<Arc<dyn RemoteExecutor>, ProvisionError> {
        self.executor
            .clone()
            .ok_or_else(|| ProvisionError::CreateError("no sandbox for this run".to_string()))
    }
}

/// Provisions one sandbox per run
pub struct Pipeline {
    provider: Arc<dyn SandboxProvider>,
    leases: LeaseRegistry,
    env: Arc<dyn EnvSource>,
    options: ProvisionOptions,
}

impl Pipeline {
    /// Create a pipeline, rejecting options no run could succeed with
    pub fn new(
        provider: Arc<dyn SandboxProvider>,
        leases: LeaseRegistry,
        env: Arc<dyn EnvSource>,
        options: ProvisionOptions,
    ) -> Result<Self, ProvisionError> {
        options.validate()?;
        Ok(Self {
            provider,
            leases,
            env,
            options,
        })
    }

    pub fn options(&self) -> &ProvisionOptions {
        &self.options
    }

    /// Provision without a caller-facing progress stream
    pub async fn run(&self) -> Result<Deployment, ProvisionError> {
        let mut sink = NullSink;
        self.run_with_progress(&mut sink).await
    }

    /// Provision, reporting every milestone to `sink`.
    ///
    /// The sink receives steps `1..=totalSteps` ending in `ready`, or stops
    /// at the failing step with a single `error` record.
    pub async fn run_with_progress(
        &self,
        sink: &mut dyn ProgressSink,
    ) -> Result<Deployment, ProvisionError> {
        let mut reporter = ProgressReporter::new(sink, total_steps());
        let mut fsm = ProvisionFsm::new();
        let mut run = Run::default();

        for step in STEPS.iter() {
            if let Emission::Progress { action, text } = step.emission {
                let text = text.replace(PORT_PLACEHOLDER, &self.options.port().to_string());
                reporter.announce(action, &text);
            }

            debug!("Running step {} ({})", step.ordinal, step.label);
            let result = match step.action {
                StepAction::CreateSandbox => self.create_sandbox(&mut run).await,
                StepAction::InstallRuntime => self.install_runtime(&run).await,
                StepAction::FetchApp => self.fetch_app(&run).await,
                StepAction::FixPermissions => self.fix_permissions(&run).await,
                StepAction::WriteAppConfig => self.write_app_config(&run).await,
                StepAction::WriteServerConfig => self.write_server_config(&run).await,
                StepAction::ValidateServerConfig => self.validate_server_config(&run).await,
                StepAction::StartServices => self.start_services(&run).await,
                StepAction::Publish => self.publish(&mut run),
            };

            if let Err(e) = result {
                let _ = fsm.process(ProvisionEvent::Failed(e.to_string()));
                warn!(
                    "Provisioning failed at step {} ({}, {} error): {}",
                    step.ordinal,
                    step.label,
                    e.class(),
                    e
                );
                self.teardown_after_failure(&run).await;
                reporter.error(&format!("Error: {}", e));
                return Err(e);
            }

            if let Some(state) = step.completes {
                if let Err(e) = fsm.process(ProvisionEvent::Reached(state)) {
                    warn!("{}", e);
                }
            }

            if let Emission::Ready { text } = step.emission {
                let url = run.url.clone().unwrap_or_default();
                reporter.ready(text, &url);
            }
        }

        let executor = run.executor()?;
        let url = run.url.take().unwrap_or_default();
        debug_assert_eq!(fsm.state(), ProvisionState::Ready);
        info!("Sandbox {} ready at {}", executor.environment().id, url);

        Ok(Deployment {
            environment: executor.environment().clone(),
            url,
        })
    }

    async fn create_sandbox(&self, run: &mut Run) -> Result<(), ProvisionError> {
        let executor = self
            .provider
            .create(&self.options.environment)
            .await
            .map_err(|e| ProvisionError::CreateError(e.to_string()))?;

        let id = executor.environment().id.clone();
        run.executor = Some(executor);

        let lease = self
            .leases
            .acquire(&id)
            .map_err(|e| ProvisionError::CreateError(e.to_string()))?;
        run._lease = Some(lease);

        info!("Sandbox {} created", id);
        Ok(())
    }

    async fn install_runtime(&self, run: &Run) -> Result<(), ProvisionError> {
        let executor = run.executor()?;
        let mut args = vec!["install".to_string(), "-y".to_string()];
        args.extend(self.options.packages.iter().cloned());

        exec(
            executor.as_ref(),
            &CommandSpec::new("dnf", args).sudo(),
            ProvisionError::InstallError,
        )
        .await?;
        Ok(())
    }

    async fn fetch_app(&self, run: &Run) -> Result<(), ProvisionError> {
        let executor = run.executor()?;
        let layout = &self.options.layout;
        let archive = "pressbox-app.tar.gz";

        let script = [
            format!("mkdir -p {}", shell_quote(&layout.work_dir)),
            format!("cd {}", shell_quote(&layout.work_dir)),
            format!(
                "curl -fsSL {} -o {}",
                shell_quote(&self.options.archive_url),
                archive
            ),
            format!("tar -xzf {}", archive),
            format!("rm -f {}", archive),
            format!("test -d {}", shell_quote(&layout.app_root())),
        ]
        .join(" && ");

        exec(
            executor.as_ref(),
            &CommandSpec::shell(script),
            ProvisionError::FetchError,
        )
        .await?;
        Ok(())
    }

    async fn fix_permissions(&self, run: &Run) -> Result<(), ProvisionError> {
        let executor = run.executor()?;
        let layout = &self.options.layout;
        let app_root = layout.app_root();
        let owner = format!("{0}:{0}", layout.web_user);

        let mut traversable = layout.work_dir_ancestors();
        traversable.push(layout.work_dir.clone());

        best_effort(
            executor.as_ref(),
            &CommandSpec::new("chmod", ["o+x".to_string()].into_iter().chain(traversable))
                .sudo(),
        )
        .await;
        best_effort(
            executor.as_ref(),
            &CommandSpec::new("chown", ["-R".to_string(), owner, app_root.clone()]).sudo(),
        )
        .await;
        best_effort(
            executor.as_ref(),
            &CommandSpec::new(
                "find",
                [app_root.as_str(), "-type", "d", "-exec", "chmod", "755", "{}", "+"],
            )
            .sudo(),
        )
        .await;
        best_effort(
            executor.as_ref(),
            &CommandSpec::new(
                "find",
                [app_root.as_str(), "-type", "f", "-exec", "chmod", "644", "{}", "+"],
            )
            .sudo(),
        )
        .await;
        Ok(())
    }

    async fn write_app_config(&self, run: &Run) -> Result<(), ProvisionError> {
        let executor = run.executor()?;
        let layout = &self.options.layout;

        // Resolved fresh for every run, before anything is written
        let db = ConnectionDescriptor::resolve(self.env.as_ref())?;
        info!(
            "Using database {} on {} as {}",
            db.name,
            db.host_with_port(),
            db.user
        );

        let wp_config = render_wp_config(&db, &SecurityKeys::random(), &self.options.wordpress);
        let staged = layout.staged_wp_config();
        let target = layout.wp_config();
        let config_error = ProvisionError::ConfigError;

        exec(
            executor.as_ref(),
            &CommandSpec::new("mkdir", ["-p".to_string(), layout.staging_dir(), layout.log_dir()]),
            config_error,
        )
        .await?;
        executor
            .write_files(&[FileWrite::new(staged.clone(), wp_config)])
            .await
            .map_err(|e| ProvisionError::ConfigError(e.to_string()))?;
        exec(
            executor.as_ref(),
            &CommandSpec::new("cp", [staged.clone(), target.clone()]).sudo(),
            config_error,
        )
        .await?;
        exec(
            executor.as_ref(),
            &CommandSpec::new(
                "chown",
                [format!("{0}:{0}", layout.web_user), target.clone()],
            )
            .sudo(),
            config_error,
        )
        .await?;
        exec(
            executor.as_ref(),
            &CommandSpec::new("chmod", ["640".to_string(), target]).sudo(),
            config_error,
        )
        .await?;

        // The staged copy holds the database password
        best_effort(
            executor.as_ref(),
            &CommandSpec::new("rm", ["-f".to_string(), staged]),
        )
        .await;
        Ok(())
    }

    async fn write_server_config(&self, run: &Run) -> Result<(), ProvisionError> {
        let executor = run.executor()?;
        let layout = &self.options.layout;

        executor
            .write_files(&[
                FileWrite::new(layout.nginx_conf(), render_nginx_conf(layout)),
                FileWrite::new(layout.fpm_conf(), render_fpm_conf(layout)),
            ])
            .await
            .map_err(|e| ProvisionError::ConfigError(e.to_string()))?;

        exec(
            executor.as_ref(),
            &CommandSpec::new("mkdir", ["-p".to_string(), layout.socket_dir()]).sudo(),
            ProvisionError::ConfigError,
        )
        .await?;
        Ok(())
    }

    async fn validate_server_config(&self, run: &Run) -> Result<(), ProvisionError> {
        let executor = run.executor()?;
        let layout = &self.options.layout;

        exec(
            executor.as_ref(),
            &CommandSpec::new("nginx", ["-t".to_string(), "-c".to_string(), layout.nginx_conf()])
                .sudo(),
            ProvisionError::ValidationError,
        )
        .await?;
        exec(
            executor.as_ref(),
            &CommandSpec::new("php-fpm", ["-t".to_string(), "-y".to_string(), layout.fpm_conf()])
                .sudo(),
            ProvisionError::ValidationError,
        )
        .await?;
        Ok(())
    }

    async fn start_services(&self, run: &Run) -> Result<(), ProvisionError> {
        let executor = run.executor()?;
        let layout = &self.options.layout;
        let readiness = &self.options.readiness;

        best_effort(
            executor.as_ref(),
            &CommandSpec::shell("pkill -x nginx || true; pkill -x php-fpm || true").sudo(),
        )
        .await;
        // A stale socket would satisfy the readiness probe before php-fpm binds
        best_effort(
            executor.as_ref(),
            &CommandSpec::new("rm", ["-f".to_string(), layout.fpm_socket.clone()]).sudo(),
        )
        .await;

        exec(
            executor.as_ref(),
            &CommandSpec::new("php-fpm", ["-y".to_string(), layout.fpm_conf()])
                .sudo()
                .detached(),
            ProvisionError::StartupError,
        )
        .await?;
        wait_until_ready(
            executor.as_ref(),
            "php-fpm",
            &CommandSpec::new("test", ["-S".to_string(), layout.fpm_socket.clone()]).sudo(),
            readiness,
            tokio::time::sleep,
        )
        .await?;

        exec(
            executor.as_ref(),
            &CommandSpec::new(
                "nginx",
                [
                    "-c".to_string(),
                    layout.nginx_conf(),
                    "-g".to_string(),
                    "daemon off;".to_string(),
                ],
            )
            .sudo()
            .detached(),
            ProvisionError::StartupError,
        )
        .await?;
        wait_until_ready(
            executor.as_ref(),
            "nginx",
            &CommandSpec::new(
                "curl",
                [
                    "-s".to_string(),
                    "-o".to_string(),
                    "/dev/null".to_string(),
                    "--max-time".to_string(),
                    "2".to_string(),
                    format!("http://127.0.0.1:{}/", layout.port),
                ],
            ),
            readiness,
            tokio::time::sleep,
        )
        .await?;
        Ok(())
    }

    fn publish(&self, run: &mut Run) -> Result<(), ProvisionError> {
        let executor = run.executor()?;
        let port = self.options.port();

        let url = executor.environment().domain(port).ok_or_else(|| {
            ProvisionError::StartupError(format!("no public route for port {}", port))
        })?;
        run.url = Some(url.to_string());
        Ok(())
    }

    async fn teardown_after_failure(&self, run: &Run) {
        if !self.options.teardown_on_failure {
            return;
        }
        let Some(executor) = &run.executor else {
            return;
        };

        let id = &executor.environment().id;
        match teardown(self.provider.as_ref(), id).await {
            Ok(outcome) => info!("Sandbox {} torn down after failure: {}", id, outcome.as_str()),
            Err(e) => warn!("Failed to tear down sandbox {} after failure: {}", id, e),
        }
    }
}

/// Run a command that must succeed, mapping any failure to `class`
async fn exec(
    executor: &dyn RemoteExecutor,
    command: &CommandSpec,
    class: fn(String) -> ProvisionError,
) -> Result<CommandOutput, ProvisionError> {
    let output = executor
        .run_command(command)
        .await
        .map_err(|e: SandboxError| class(format!("{}: {}", command.display(), e)))?;

    if !output.success() {
        let summary = output.summary();
        let message = if summary.is_empty() {
            format!("`{}` exited with {}", command.display(), output.exit_code)
        } else {
            format!(
                "`{}` exited with {}: {}",
                command.display(),
                output.exit_code,
                summary
            )
        };
        return Err(class(message));
    }
    Ok(output)
}

/// Run a command whose failure is logged and swallowed
async fn best_effort(executor: &dyn RemoteExecutor, command: &CommandSpec) {
    match executor.run_command(command).await {
        Ok(output) if output.success() => {}
        Ok(output) => warn!(
            "Ignoring failure of `{}` (exit {}): {}",
            command.display(),
            output.exit_code,
            output.summary()
        ),
        Err(e) => warn!("Ignoring failure of `{}`: {}", command.display(), e),
    }
}
