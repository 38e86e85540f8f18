//! Provisioning pipeline tests

mod common;

use std::sync::Arc;

use pressbox::errors::ProvisionError;
use pressbox::provision::Pipeline;
use pressbox::sandbox::LeaseRegistry;
use progress_stream::{action, EventKind, ProgressEvent};

use common::{db_env, env, fast_options, FakeProvider, SANDBOX_ID, SANDBOX_URL};

fn pipeline(provider: Arc<FakeProvider>) -> Pipeline {
    Pipeline::new(
        provider,
        LeaseRegistry::new(),
        Arc::new(db_env()),
        fast_options(),
    )
    .unwrap()
}

async fn run(provider: Arc<FakeProvider>) -> (Result<String, ProvisionError>, Vec<ProgressEvent>) {
    let mut events: Vec<ProgressEvent> = Vec::new();
    let result = pipeline(provider)
        .run_with_progress(&mut events)
        .await
        .map(|deployment| deployment.url);
    (result, events)
}

fn steps(events: &[ProgressEvent]) -> Vec<u32> {
    events.iter().map(|e| e.step).collect()
}

fn assert_single_terminal(events: &[ProgressEvent], kind: EventKind) {
    let terminals: Vec<_> = events.iter().filter(|e| e.is_terminal()).collect();
    assert_eq!(terminals.len(), 1);
    assert_eq!(events.last().unwrap().kind(), kind);
    assert!(!events.iter().any(|e| e.kind() == EventKind::Ready)
        || !events.iter().any(|e| e.kind() == EventKind::Error));
}

#[tokio::test]
async fn test_successful_run() {
    let provider = Arc::new(FakeProvider::new());
    let (result, events) = run(provider.clone()).await;

    assert_eq!(result.unwrap(), SANDBOX_URL);
    assert_eq!(steps(&events), (1..=8).collect::<Vec<u32>>());
    assert!(events.iter().all(|e| e.total_steps == 8));
    assert_eq!(events[0].action, action::SANDBOX_CREATE);
    assert_eq!(events[0].text, "Creating sandbox...");
    assert_eq!(events[6].text, "Starting services on :3000...");
    assert_single_terminal(&events, EventKind::Ready);
    assert_eq!(events[7].sandbox_url.as_deref(), Some(SANDBOX_URL));
    assert!(events[..7].iter().all(|e| e.sandbox_url.is_none()));
}

#[tokio::test]
async fn test_successful_run_command_order() {
    let provider = Arc::new(FakeProvider::new());
    let (result, _) = run(provider.clone()).await;
    result.unwrap();

    let commands = provider.recorder.commands();
    let position = |needle: &str| {
        commands
            .iter()
            .position(|c| c.contains(needle))
            .unwrap_or_else(|| panic!("no command containing {:?}", needle))
    };

    assert!(commands[0].starts_with("sudo dnf install -y"));
    assert!(position("tar -xzf") < position("wp-config.php"));
    assert!(position("nginx -t") < position("php-fpm -y"));
    assert!(position("php-fpm -t") < position("php-fpm -y"));
    assert!(position("test -S") < position("daemon off;"));
    assert!(position("daemon off;") < position("curl -s -o /dev/null"));

    let detached: Vec<_> = provider
        .recorder
        .commands
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c.detached)
        .map(|c| c.cmd.clone())
        .collect();
    assert_eq!(detached, vec!["php-fpm", "nginx"]);
}

#[tokio::test]
async fn test_stale_fpm_socket_removed_before_start() {
    let provider = Arc::new(FakeProvider::new());
    let (result, _) = run(provider.clone()).await;
    result.unwrap();

    let commands = provider.recorder.commands();
    let position = |needle: &str| commands.iter().position(|c| c.contains(needle)).unwrap();

    let remove = position("sudo rm -f /run/php-fpm/pressbox.sock");
    assert!(position("pkill -x php-fpm") < remove);
    assert!(remove < position("php-fpm -y"));
    assert!(remove < position("test -S"));
}

#[tokio::test]
async fn test_generated_config_files() {
    let provider = Arc::new(FakeProvider::new());
    let (result, _) = run(provider.clone()).await;
    result.unwrap();

    let recorder = &provider.recorder;
    let wp_config = recorder
        .written("/vercel/sandbox/.pressbox/wp-config.php")
        .unwrap();
    assert!(wp_config.contains("define( 'DB_NAME', 'mydb' );"));
    assert!(wp_config.contains("define( 'DB_PASSWORD', 'p@ss' );"));
    assert!(wp_config.contains("define( 'DB_HOST', 'dbhost:3306' );"));

    let nginx = recorder.written("/vercel/sandbox/.pressbox/nginx.conf").unwrap();
    assert!(nginx.contains("listen 3000;"));
    assert!(recorder.written("/vercel/sandbox/.pressbox/php-fpm.conf").is_some());

    assert!(recorder
        .commands()
        .iter()
        .any(|c| c == "sudo cp /vercel/sandbox/.pressbox/wp-config.php /vercel/sandbox/wordpress/wp-config.php"));
}

#[tokio::test]
async fn test_create_failure_stops_at_step_one() {
    let provider = Arc::new(FakeProvider::new().fail_create());
    let (result, events) = run(provider).await;

    assert!(matches!(result, Err(ProvisionError::CreateError(_))));
    assert_eq!(steps(&events), vec![1, 1]);
    assert_single_terminal(&events, EventKind::Error);
    assert!(events[1].text.starts_with("Error: sandbox creation failed"));
}

#[tokio::test]
async fn test_install_failure_stops_at_step_two() {
    let provider = Arc::new(FakeProvider::new().fail_command("dnf install", 1));
    let (result, events) = run(provider.clone()).await;

    assert!(matches!(result, Err(ProvisionError::InstallError(_))));
    assert_eq!(steps(&events), vec![1, 2, 2]);
    assert_single_terminal(&events, EventKind::Error);
    assert!(events[2].text.contains("runtime install failed"));

    // Nothing runs after the failing step
    assert_eq!(provider.recorder.commands().len(), 1);
}

#[tokio::test]
async fn test_fetch_failure() {
    let provider = Arc::new(FakeProvider::new().fail_command("curl -fsSL", 22));
    let (result, events) = run(provider).await;

    assert!(matches!(result, Err(ProvisionError::FetchError(_))));
    assert_eq!(events.last().unwrap().step, 3);
    assert_single_terminal(&events, EventKind::Error);
}

#[tokio::test]
async fn test_permission_failures_are_swallowed() {
    let provider = Arc::new(
        FakeProvider::new()
            .fail_command("chmod o+x", 1)
            .fail_command("chown -R", 1),
    );
    let (result, events) = run(provider).await;

    assert_eq!(result.unwrap(), SANDBOX_URL);
    assert_single_terminal(&events, EventKind::Ready);
}

#[tokio::test]
async fn test_config_error_before_any_write() {
    let provider = Arc::new(FakeProvider::new());
    let pipeline = Pipeline::new(
        provider.clone(),
        LeaseRegistry::new(),
        Arc::new(env(&[("MYSQLUSER", "only-user")])),
        fast_options(),
    )
    .unwrap();

    let mut events: Vec<ProgressEvent> = Vec::new();
    let result = pipeline.run_with_progress(&mut events).await;

    assert!(matches!(result, Err(ProvisionError::ConfigError(_))));
    assert_eq!(events.last().unwrap().step, 4);
    assert!(events.last().unwrap().text.contains("MYSQL_PUBLIC_URL"));
    assert!(provider.recorder.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_write_failure_is_config_class() {
    let provider = Arc::new(FakeProvider::new().fail_writes());
    let (result, events) = run(provider).await;

    assert!(matches!(result, Err(ProvisionError::ConfigError(_))));
    assert_eq!(events.last().unwrap().step, 4);
}

#[tokio::test]
async fn test_validation_failure_starts_nothing() {
    let provider = Arc::new(FakeProvider::new().fail_command("nginx -t", 1));
    let (result, events) = run(provider.clone()).await;

    assert!(matches!(result, Err(ProvisionError::ValidationError(_))));
    assert_eq!(events.last().unwrap().step, 6);
    assert!(!provider
        .recorder
        .commands
        .lock()
        .unwrap()
        .iter()
        .any(|c| c.detached));
}

#[tokio::test]
async fn test_service_never_ready() {
    let provider = Arc::new(FakeProvider::new().fail_command("curl -s -o /dev/null", 7));
    let (result, events) = run(provider.clone()).await;

    assert!(matches!(result, Err(ProvisionError::StartupError(_))));
    assert_eq!(events.last().unwrap().step, 7);
    assert_single_terminal(&events, EventKind::Error);

    let probes = provider
        .recorder
        .commands()
        .iter()
        .filter(|c| c.starts_with("curl -s -o /dev/null"))
        .count();
    assert_eq!(probes, 3);
}

#[tokio::test]
async fn test_missing_route_fails_at_startup_class() {
    let provider = Arc::new(FakeProvider::new().without_routes());
    let (result, events) = run(provider).await;

    assert!(matches!(result, Err(ProvisionError::StartupError(_))));
    assert_eq!(events.last().unwrap().step, 7);
    assert_single_terminal(&events, EventKind::Error);
}

#[tokio::test]
async fn test_failure_keeps_sandbox_by_default() {
    let provider = Arc::new(FakeProvider::new().fail_command("php-fpm -t", 1));
    let (result, _) = run(provider.clone()).await;

    assert!(result.is_err());
    assert!(provider.recorder.stopped.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_teardown_on_failure() {
    let provider = Arc::new(FakeProvider::new().fail_command("php-fpm -t", 1));
    let mut options = fast_options();
    options.teardown_on_failure = true;

    let pipeline = Pipeline::new(
        provider.clone(),
        LeaseRegistry::new(),
        Arc::new(db_env()),
        options,
    )
    .unwrap();
    let result = pipeline.run().await;

    assert!(matches!(result, Err(ProvisionError::ValidationError(_))));
    assert_eq!(*provider.recorder.stopped.lock().unwrap(), vec![SANDBOX_ID]);
}

#[tokio::test]
async fn test_lease_held_for_the_whole_run() {
    let leases = LeaseRegistry::new();
    let provider = Arc::new(FakeProvider::new().watch_leases(leases.clone()));
    let pipeline = Pipeline::new(
        provider.clone(),
        leases.clone(),
        Arc::new(db_env()),
        fast_options(),
    )
    .unwrap();

    pipeline.run().await.unwrap();

    let seen = provider.recorder.leased_during.lock().unwrap().clone();
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|leased| *leased));
    assert!(!leases.is_leased(SANDBOX_ID));
}

#[tokio::test]
async fn test_invalid_options_rejected() {
    let mut options = fast_options();
    options.archive_url = "ftp://example.org/wp.tar.gz".to_string();

    let result = Pipeline::new(
        Arc::new(FakeProvider::new()),
        LeaseRegistry::new(),
        Arc::new(db_env()),
        options,
    );
    assert!(matches!(result, Err(ProvisionError::ConfigError(_))));
}
