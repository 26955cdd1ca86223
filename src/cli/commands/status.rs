use tokio::sync::mpsc;
use tracing::info;

use super::prompt::{TrackingCommand, parse_tracking_command};

use crate::domain::MediaKind;
use crate::render::console::format_message;
use crate::render::{Message, status_embed};
use crate::services::TrackingHandle;
use crate::wizard::RequestWizard;

pub async fn cmd_status(
    wizard: &RequestWizard,
    kind: MediaKind,
    query: &str,
    watch: bool,
) -> anyhow::Result<()> {
    let probe = wizard.probe();

    let item_id = match probe.locate(kind, query).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            println!("Not in {} yet.", kind.backend_name());
            return Ok(());
        }
        Err(e) => {
            println!("{}", e.user_message());
            return Ok(());
        }
    };

    if watch {
        match wizard.track(kind, item_id).await {
            Ok(handle) => follow_tracking(&handle).await,
            Err(e) => println!("{}", e.user_message()),
        }
        return Ok(());
    }

    match probe.probe(kind, item_id).await {
        Ok(report) => {
            let width = wizard.tracker().settings().bar_width;
            let message = Message::default().with_embed(status_embed(&report, width));
            print!("{}", format_message(&message));
        }
        Err(e) => println!("{}", e.user_message()),
    }
    Ok(())
}

/// Reads console commands on a detached thread so a pending read never
/// holds up runtime shutdown.
fn spawn_command_reader() -> mpsc::UnboundedReceiver<TrackingCommand> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            let Some(command) = parse_tracking_command(&line) else {
                continue;
            };
            if tx.send(command).is_err() {
                break;
            }
        }
    });
    rx
}

/// Waits for a tracking loop. `r` refreshes now; `s` or Ctrl-C stops it
/// instead of killing the process.
pub(super) async fn follow_tracking(handle: &TrackingHandle) {
    println!("(r + Enter refreshes, s + Enter or Ctrl-C stops tracking)");
    let mut commands = spawn_command_reader();
    let wait = handle.wait();
    tokio::pin!(wait);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        tokio::select! {
            outcome = &mut wait => break outcome,
            _ = &mut ctrl_c => {
                handle.stop().await;
                break (&mut wait).await;
            }
            Some(command) = commands.recv() => match command {
                TrackingCommand::Refresh => {
                    if let Err(e) = handle.refresh_now().await {
                        println!("{}", e.user_message());
                    }
                }
                TrackingCommand::Stop => {
                    handle.stop().await;
                    break (&mut wait).await;
                }
            },
        }
    };

    if let Some(outcome) = outcome {
        info!(outcome = outcome.as_str(), "Tracking ended");
        println!("Tracking ended ({}).", outcome.as_str());
    }
}
