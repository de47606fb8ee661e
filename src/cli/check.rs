use std::time::Duration;

use tokio::sync::mpsc;
use tracing::info;

use crate::check::CheckProcess;
use crate::cli::commands::CheckArgs;
use crate::cli::progress::CheckProgress;
use crate::cli::render::Terminal;
use crate::config::KycConfig;
use crate::errors::KycError;
use crate::resource::{render, AsyncResource, ContainerMessages, FetchError, FetchStatus};

pub async fn handle_check(args: CheckArgs, config: &KycConfig, quiet: bool) -> Result<(), KycError> {
    let step_delay = args
        .step_delay_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.step_delay());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let process = CheckProcess::new(step_delay).with_event_channel(event_tx);
    let cancel_token = process.cancel_token();

    let resource = AsyncResource::new(process);
    let handle = resource
        .start(true)
        .ok_or_else(|| KycError::Internal("check did not start".into()))?;

    let mut progress = CheckProgress::new(quiet || args.output.json);
    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(event) => {
                    progress.handle_event(&event);
                    if event.is_terminal() {
                        break;
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, cancelling check");
                cancel_token.cancel();
            }
        }
    }

    let status = handle
        .await
        .map_err(|e| KycError::Internal(format!("Check task failed: {}", e)))?;

    let snapshot = resource.snapshot();
    if status == FetchStatus::Error {
        let message = snapshot
            .error
            .map(|e| e.message().to_string())
            .unwrap_or_else(|| FetchError::UNKNOWN.to_string());
        return Err(KycError::Fetch(message));
    }

    if args.output.json {
        println!("{}", serde_json::to_string_pretty(&snapshot.data)?);
    } else if let Some(out) = render(&snapshot, &Terminal, &ContainerMessages::default()) {
        println!("{}", out);
    }
    Ok(())
}
