//! Per-request recommendation pipeline.
//!
//! One asynchronous task per caller request: generate song picks, resolve
//! them against the catalog strictly in generation order, then emit a single
//! terminal event. Authorization happens in the HTTP layer before this task
//! exists; a rejected caller never opens a stream.

use super::events::PipelineEvent;
use super::transport::EventSink;
use crate::curator::{Curator, CuratorError};
use crate::resolver::{resolve_track, TrackCatalog};
use crate::server::metrics;
use tracing::{debug, info, warn};

/// Terminal error reason when every pick failed to resolve.
pub const NO_MATCHES_MESSAGE: &str = "No tracks found";
/// Terminal error reason when the generation output violated its contract.
pub const MALFORMED_OUTPUT_MESSAGE: &str = "Recommendation service returned malformed output";
/// Terminal error reason when the generation service could not be reached.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Recommendation service unavailable";

const STATUS_GENERATING: &str = "Generating recommendations...";

/// Run one recommendation pipeline to completion.
///
/// Emits at most one status event followed by exactly one terminal event.
/// The sink is consumed and dropped on every exit path, which closes the
/// stream for the caller. If the caller disconnects, the run is abandoned at
/// the next suspension point.
pub async fn run_pipeline(
    curator: &Curator,
    catalog: &dyn TrackCatalog,
    prompt: &str,
    credential: &str,
    sink: EventSink,
) {
    let picks = match curator.generate(prompt).await {
        Ok(picks) => picks,
        Err(err) => {
            let (reason, outcome) = match &err {
                CuratorError::MalformedOutput(_) => (MALFORMED_OUTPUT_MESSAGE, "malformed_output"),
                CuratorError::Llm(_) => (UPSTREAM_FAILURE_MESSAGE, "generation_failed"),
            };
            warn!(error = %err, "Recommendation generation failed");
            metrics::record_pipeline_run(outcome);
            let _ = sink.send(PipelineEvent::error(reason)).await;
            return;
        }
    };

    if sink
        .send(PipelineEvent::status(STATUS_GENERATING))
        .await
        .is_err()
    {
        debug!("Caller disconnected before resolution started");
        metrics::record_pipeline_run("cancelled");
        return;
    }

    let mut track_ids = Vec::with_capacity(picks.len());
    for pick in &picks {
        if sink.is_closed() {
            debug!("Caller disconnected, abandoning resolution");
            metrics::record_pipeline_run("cancelled");
            return;
        }
        if let Some(track) = resolve_track(catalog, pick, credential).await {
            track_ids.push(track.id);
        }
    }

    info!(
        requested = picks.len(),
        resolved = track_ids.len(),
        "Recommendation pipeline finished"
    );

    let (event, outcome) = if track_ids.is_empty() {
        (PipelineEvent::error(NO_MATCHES_MESSAGE), "no_matches")
    } else {
        (PipelineEvent::result(track_ids), "ok")
    };
    metrics::record_pipeline_run(outcome);
    let _ = sink.send(event).await;
}
