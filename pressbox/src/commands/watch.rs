//! Watch command handler

use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::*;
use futures::StreamExt;
use progress_stream::{ConsumerState, EventKind, ProgressEvent, StreamConsumer};

/// Stream a progress endpoint and print every record
pub async fn handle_watch_command(url: &str) -> Result<ExitCode> {
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("failed to reach {}", url))?
        .error_for_status()?;

    let mut consumer = StreamConsumer::new();
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => {
                for event in consumer.feed(&bytes) {
                    print_event(&event);
                }
            }
            Err(e) => {
                consumer.fail(format!("Stream interrupted: {}", e));
                break;
            }
        }
    }
    for event in consumer.close() {
        print_event(&event);
    }

    match consumer.state() {
        ConsumerState::Ready { sandbox_url } => {
            println!("{} {}", "WordPress is live at".green().bold(), sandbox_url);
            Ok(ExitCode::SUCCESS)
        }
        ConsumerState::Failed { message } => {
            eprintln!("{}", message.red());
            Ok(ExitCode::FAILURE)
        }
        ConsumerState::Idle | ConsumerState::Running => Ok(ExitCode::FAILURE),
    }
}

fn print_event(event: &ProgressEvent) {
    let counter = format!("[{}/{}]", event.step, event.total_steps);
    match event.kind() {
        EventKind::Progress => println!("{} {}", counter.dimmed(), event.text),
        EventKind::Ready => println!("{} {}", counter.green(), event.text.green()),
        EventKind::Error => println!("{} {}", counter.red(), event.text.red()),
    }
}
