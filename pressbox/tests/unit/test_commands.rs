//! CLI command tests

mod common;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use pressbox::commands::{handle_command, CliContext, Commands};
use pressbox::filesys::file::File;
use pressbox::sandbox::EnvironmentState;
use pressbox::storage::artifact::SandboxArtifact;
use pressbox::storage::settings::Settings;

use common::{db_env, env, FakeProvider, SANDBOX_ID, SANDBOX_URL};

/// Fresh scratch directory per test
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pressbox_cli_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn settings_with_artifact(path: &Path) -> Settings {
    Settings {
        artifact_path: path.to_string_lossy().to_string(),
        ..Settings::default()
    }
}

fn context(provider: Arc<FakeProvider>, artifact: &Path) -> CliContext {
    CliContext::new(settings_with_artifact(artifact), Arc::new(db_env())).with_provider(provider)
}

async fn write_artifact(path: &Path, sandbox_id: Option<&str>) {
    SandboxArtifact {
        wordpress_url: SANDBOX_URL.to_string(),
        sandbox_id: sandbox_id.map(str::to_string),
    }
    .write(&File::new(path))
    .await
    .unwrap();
}

#[tokio::test]
async fn test_build_exits_with_downstream_code() {
    let artifact = scratch_dir("build_code").join("sandbox.config.mjs");
    let provider = Arc::new(FakeProvider::new());
    let ctx = context(provider.clone(), &artifact);

    let command = Commands::Build {
        command: vec!["sh".into(), "-c".into(), "exit 3".into()],
    };
    let code = handle_command(command, &ctx).await.unwrap();

    assert_eq!(code, ExitCode::from(3));
    assert!(!artifact.exists());
    assert_eq!(*provider.recorder.stopped.lock().unwrap(), vec![SANDBOX_ID]);
}

#[tokio::test]
async fn test_build_passes_sandbox_to_downstream_env() {
    let artifact = scratch_dir("build_env").join("sandbox.config.mjs");
    let provider = Arc::new(FakeProvider::new());
    let ctx = context(provider, &artifact);

    let script = format!(
        "test \"$WORDPRESS_URL\" = '{}' && test \"$SANDBOX_ID\" = '{}' && test -f '{}'",
        SANDBOX_URL,
        SANDBOX_ID,
        artifact.display()
    );
    let command = Commands::Build {
        command: vec!["sh".into(), "-c".into(), script],
    };

    assert_eq!(handle_command(command, &ctx).await.unwrap(), ExitCode::SUCCESS);
}

#[tokio::test]
async fn test_build_stops_sandbox_when_artifact_write_fails() {
    let dir = scratch_dir("build_write");
    // A regular file where the artifact's parent directory should be
    let blocker = dir.join("blocker");
    std::fs::write(&blocker, b"").unwrap();
    let artifact = blocker.join("sandbox.config.mjs");

    let provider = Arc::new(FakeProvider::new());
    let ctx = context(provider.clone(), &artifact);

    let command = Commands::Build {
        command: vec!["true".into()],
    };
    let result = handle_command(command, &ctx).await;

    assert!(result.is_err());
    assert_eq!(*provider.recorder.stopped.lock().unwrap(), vec![SANDBOX_ID]);
}

#[tokio::test]
async fn test_init_writes_artifact() {
    let artifact = scratch_dir("init").join("sandbox.config.mjs");
    let ctx = context(Arc::new(FakeProvider::new()), &artifact);

    let code = handle_command(Commands::Init, &ctx).await.unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    let written = SandboxArtifact::read(&File::new(&artifact))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(written.wordpress_url, SANDBOX_URL);
    assert_eq!(written.sandbox_id.as_deref(), Some(SANDBOX_ID));
}

#[tokio::test]
async fn test_teardown_stops_sandbox_and_removes_artifact() {
    let artifact = scratch_dir("teardown").join("sandbox.config.mjs");
    write_artifact(&artifact, Some(SANDBOX_ID)).await;
    let provider =
        Arc::new(FakeProvider::new().with_environment(SANDBOX_ID, EnvironmentState::Active));
    let ctx = context(provider.clone(), &artifact);

    let code = handle_command(Commands::Teardown, &ctx).await.unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    assert!(!artifact.exists());
    assert_eq!(*provider.recorder.stopped.lock().unwrap(), vec![SANDBOX_ID]);
}

#[tokio::test]
async fn test_teardown_without_artifact_is_a_no_op() {
    let artifact = scratch_dir("teardown_none").join("sandbox.config.mjs");
    let provider = Arc::new(FakeProvider::new());
    let ctx = context(provider.clone(), &artifact);

    let code = handle_command(Commands::Teardown, &ctx).await.unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    assert!(!artifact.exists());
    assert!(provider.recorder.stopped.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_teardown_removes_artifact_without_api_token() {
    let artifact = scratch_dir("teardown_no_token").join("sandbox.config.mjs");
    write_artifact(&artifact, Some(SANDBOX_ID)).await;

    // No injected provider and no SANDBOX_API_TOKEN: stopping cannot happen
    let ctx = CliContext::new(settings_with_artifact(&artifact), Arc::new(env(&[])));

    let code = handle_command(Commands::Teardown, &ctx).await.unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    assert!(!artifact.exists());
}

#[tokio::test]
async fn test_teardown_without_sandbox_id_only_removes_artifact() {
    let artifact = scratch_dir("teardown_no_id").join("sandbox.config.mjs");
    write_artifact(&artifact, None).await;
    let provider = Arc::new(FakeProvider::new());
    let ctx = context(provider.clone(), &artifact);

    let code = handle_command(Commands::Teardown, &ctx).await.unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    assert!(!artifact.exists());
    assert!(provider.recorder.stopped.lock().unwrap().is_empty());
}
