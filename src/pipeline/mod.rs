//! Request-scoped recommendation pipeline: events, transport and orchestration.

mod events;
mod orchestrator;
mod transport;

pub use events::PipelineEvent;
pub use orchestrator::{
    run_pipeline, MALFORMED_OUTPUT_MESSAGE, NO_MATCHES_MESSAGE, UPSTREAM_FAILURE_MESSAGE,
};
pub use transport::{event_channel, EventSink, EventStream, StreamClosed};
