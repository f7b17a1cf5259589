//! Recommendation API route
//!
//! Opens a server-push event stream per request and runs the recommendation
//! pipeline behind it. Authorization and input validation happen here, before
//! the stream opens; everything after is reported in-stream.

use crate::pipeline::{event_channel, run_pipeline};

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::post,
    Router,
};
use futures::StreamExt;
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tracing::debug;

use super::session::Session;
use super::state::ServerState;

/// Buffered events between the pipeline task and the SSE writer.
const EVENT_CHANNEL_CAPACITY: usize = 16;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Deserialize, Debug)]
struct RecommendationsBody {
    pub prompt: Option<String>,
    pub spotify_token: Option<String>,
}

async fn post_recommendations(
    session: Session,
    State(state): State<ServerState>,
    axum::Json(body): axum::Json<RecommendationsBody>,
) -> Response {
    let prompt = body.prompt.filter(|p| !p.trim().is_empty());
    let credential = body.spotify_token.filter(|t| !t.trim().is_empty());

    let (prompt, credential) = match (prompt, credential) {
        (Some(prompt), Some(credential)) => (prompt, credential),
        _ => return StatusCode::BAD_REQUEST.into_response(),
    };

    debug!(user_id = session.user_id, "Starting recommendation pipeline");

    let (sink, events) = event_channel(EVENT_CHANNEL_CAPACITY);

    let curator = state.curator.clone();
    let catalog = state.catalog.clone();
    tokio::spawn(async move {
        run_pipeline(
            curator.as_ref(),
            catalog.as_ref(),
            &prompt,
            &credential,
            sink,
        )
        .await;
    });

    let stream = events.map(|event| {
        let json = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok::<_, Infallible>(Event::default().data(json))
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
        .into_response()
}

pub fn make_recommendation_routes(state: ServerState) -> Router {
    Router::new()
        .route("/recommendations", post(post_recommendations))
        .with_state(state)
}
