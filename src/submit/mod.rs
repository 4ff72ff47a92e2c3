//! Batch submission of availability files to the remote catalog endpoint.
//!
//! Files are submitted strictly one at a time with a fixed delay between
//! the starts of consecutive items - the spacing is a throttle against the
//! destination's rate limits, not a performance knob. A failed or
//! partially-failed item uses the shorter delay before the next one, and
//! never aborts the rest of the queue.
//!
//! The endpoint itself is an opaque boundary behind [`SubmitEndpoint`];
//! the HTTP implementation lives in [`HttpEndpoint`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};

use crate::api::logs::{log_error, log_info, log_success, log_warning};
use crate::error::{NetworkError, PipelineResult};
use crate::models::{AvailabilityUpdate, UploadItem, UploadStatus};
use crate::parser::parse_auto;
use crate::validation::convert_table;

/// Message shown to the user for any transport/server failure. The raw
/// error goes to the log stream only.
pub const SERVER_ERROR_MESSAGE: &str = "Server error, please try again later";

/// Status message when the confirmation toast never showed up.
pub const NO_CONFIRMATION_MESSAGE: &str = "no confirmation detected";

// =============================================================================
// Endpoint boundary
// =============================================================================

/// One file queued for submission.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// The structured payload the catalog endpoint accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityPayload {
    pub file_name: String,
    pub updates: Vec<AvailabilityUpdate>,
}

/// Per-record failure descriptor returned by the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFailure {
    pub sku: String,
    pub message: String,
}

/// Endpoint acknowledgment: an empty failure list means full success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAck {
    #[serde(default)]
    pub failures: Vec<RecordFailure>,
}

/// The remote submission endpoint, kept opaque so tests and the HTTP
/// implementation are interchangeable.
#[allow(async_fn_in_trait)]
pub trait SubmitEndpoint {
    async fn submit(&self, payload: &AvailabilityPayload) -> Result<SubmitAck, NetworkError>;
}

/// Source of asynchronous host notifications (toasts) correlated to a
/// submission.
#[allow(async_fn_in_trait)]
pub trait NotificationProbe {
    /// The latest toast observed since the submission started, if any.
    async fn latest_toast(&self) -> Option<String>;
}

/// Probe that never sees a toast; used when confirmation polling is off.
pub struct NoProbe;

impl NotificationProbe for NoProbe {
    async fn latest_toast(&self) -> Option<String> {
        None
    }
}

// =============================================================================
// HTTP endpoint
// =============================================================================

/// reqwest-backed endpoint implementation.
pub struct HttpEndpoint {
    client: reqwest::Client,
    url: String,
}

impl HttpEndpoint {
    pub fn new(url: impl Into<String>) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(NetworkError::from)?;
        Ok(Self { client, url: url.into() })
    }
}

impl SubmitEndpoint for HttpEndpoint {
    async fn submit(&self, payload: &AvailabilityPayload) -> Result<SubmitAck, NetworkError> {
        let response = self.client.post(&self.url).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status(status.as_u16()));
        }

        response
            .json::<SubmitAck>()
            .await
            .map_err(|e| NetworkError::InvalidResponse(e.to_string()))
    }
}

// =============================================================================
// Batch runner
// =============================================================================

/// Pacing and confirmation options for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Delay between the starts of consecutive items.
    pub delay: Duration,
    /// Shorter delay after a failed or partially-failed item.
    pub failure_delay: Duration,
    /// How long to poll for a confirmation toast after a success.
    pub toast_window: Duration,
    /// Interval between toast polls.
    pub toast_interval: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(30),
            failure_delay: Duration::from_secs(10),
            toast_window: Duration::from_secs(30),
            toast_interval: Duration::from_secs(2),
        }
    }
}

/// Run a batch without toast polling.
pub async fn run_batch<E: SubmitEndpoint>(
    files: &[SourceFile],
    endpoint: &E,
    options: &BatchOptions,
    cancel: Option<watch::Receiver<bool>>,
) -> Vec<UploadItem> {
    run_batch_with_probe(files, endpoint, None::<&NoProbe>, options, cancel).await
}

/// Run a batch, polling `probe` for a confirmation toast after each
/// successful submission.
///
/// Items are processed in order, one submission in flight at a time. Item
/// N+1 never starts before item N's delay has elapsed; when item N's
/// response outlives the delay, serialization wins and N+1 starts at
/// completion. Cancellation (the watch flag flipping to `true`) stops all
/// pending timers and leaves unstarted items in `Waiting`.
pub async fn run_batch_with_probe<E, P>(
    files: &[SourceFile],
    endpoint: &E,
    probe: Option<&P>,
    options: &BatchOptions,
    cancel: Option<watch::Receiver<bool>>,
) -> Vec<UploadItem>
where
    E: SubmitEndpoint,
    P: NotificationProbe,
{
    let mut cancel = cancel;
    let mut items: Vec<UploadItem> = files.iter().map(|f| UploadItem::new(&f.name)).collect();
    let mut next_allowed: Option<Instant> = None;

    for (i, file) in files.iter().enumerate() {
        if let Some(deadline) = next_allowed {
            if wait_until_or_cancelled(deadline, &mut cancel).await {
                log_warning("Batch cancelled; remaining items left untouched");
                break;
            }
        }
        if is_cancelled(cancel.as_ref()) {
            log_warning("Batch cancelled; remaining items left untouched");
            break;
        }

        let started = Instant::now();
        let item = &mut items[i];
        item.mark_submitting();
        log_info(format!("Submitting {} ({}/{})", file.name, i + 1, files.len()));

        let failed = submit_one(file, endpoint, item).await;

        if item.status == UploadStatus::Succeeded {
            if let Some(probe) = probe {
                if poll_for_toast(probe, item, options, &mut cancel).await {
                    log_warning("Batch cancelled; remaining items left untouched");
                    break;
                }
            }
        }

        let delay = if failed { options.failure_delay } else { options.delay };
        next_allowed = Some(started + delay);
    }

    items
}

/// Convert and submit one file, resolving its item. Returns true when the
/// item ended in a failed state (selects the shorter follow-up delay).
async fn submit_one<E: SubmitEndpoint>(
    file: &SourceFile,
    endpoint: &E,
    item: &mut UploadItem,
) -> bool {
    // Structural conversion failures skip the network entirely.
    let payload = match build_payload(file) {
        Ok(payload) => payload,
        Err(e) => {
            log_error(format!("Conversion failed for {}: {}", file.name, e));
            item.resolve(UploadStatus::Failed, Some(e.to_string()));
            return true;
        }
    };

    match endpoint.submit(&payload).await {
        Ok(ack) if ack.failures.is_empty() => {
            log_success(format!(
                "{}: {} record(s) accepted",
                file.name,
                payload.updates.len()
            ));
            item.resolve(
                UploadStatus::Succeeded,
                Some(format!("{} record(s) accepted", payload.updates.len())),
            );
            false
        }
        Ok(ack) => {
            // Surface every per-record failure, not a count.
            let details: Vec<String> =
                ack.failures.iter().map(|f| format!("{}: {}", f.sku, f.message)).collect();
            log_warning(format!(
                "{}: {} of {} record(s) rejected",
                file.name,
                ack.failures.len(),
                payload.updates.len()
            ));
            item.resolve(UploadStatus::PartiallyFailed, Some(details.join("; ")));
            true
        }
        Err(e) => {
            log_error(format!("Submission failed for {}: {}", file.name, e));
            item.resolve(UploadStatus::Failed, Some(SERVER_ERROR_MESSAGE.to_string()));
            true
        }
    }
}

/// Parse and validate a source file into the endpoint payload.
pub fn build_payload(file: &SourceFile) -> PipelineResult<AvailabilityPayload> {
    let parsed = parse_auto(&file.name, &file.bytes, None)?;
    let report = convert_table(&parsed.table)?;

    if !report.rejected.is_empty() {
        log_warning(format!(
            "{}: {} row(s) skipped during conversion",
            file.name,
            report.rejected.len()
        ));
    }

    Ok(AvailabilityPayload { file_name: file.name.clone(), updates: report.updates })
}

/// Poll the probe until a toast shows up or the window elapses. Returns
/// true when the batch was cancelled mid-poll.
async fn poll_for_toast<P: NotificationProbe>(
    probe: &P,
    item: &mut UploadItem,
    options: &BatchOptions,
    cancel: &mut Option<watch::Receiver<bool>>,
) -> bool {
    let deadline = Instant::now() + options.toast_window;

    loop {
        if let Some(text) = probe.latest_toast().await {
            log_info(format!("Confirmation for {}: {}", item.file_name, text));
            item.append_message(&text);
            return false;
        }
        if Instant::now() + options.toast_interval > deadline {
            item.append_message(NO_CONFIRMATION_MESSAGE);
            return false;
        }
        let next = Instant::now() + options.toast_interval;
        if wait_until_or_cancelled(next, cancel).await {
            return true;
        }
    }
}

fn is_cancelled(cancel: Option<&watch::Receiver<bool>>) -> bool {
    cancel.map(|rx| *rx.borrow()).unwrap_or(false)
}

/// Sleep until `deadline`, waking early only on cancellation. Returns true
/// when cancelled.
async fn wait_until_or_cancelled(
    deadline: Instant,
    cancel: &mut Option<watch::Receiver<bool>>,
) -> bool {
    let Some(rx) = cancel.as_mut() else {
        sleep_until(deadline).await;
        return false;
    };

    if *rx.borrow() {
        return true;
    }

    loop {
        tokio::select! {
            _ = sleep_until(deadline) => return false,
            changed = rx.changed() => match changed {
                Ok(()) if *rx.borrow() => return true,
                Ok(()) => continue,
                Err(_) => {
                    // Cancel handle dropped: nothing can cancel us anymore.
                    sleep_until(deadline).await;
                    return false;
                }
            },
        }
    }
}
