//! Server-Sent Events (SSE) for real-time updates.
//!
//! The ranking feed sends the full ranked list when a client connects and
//! again after every change to the approved set. Dropping the connection
//! drops the subscription; signing out ends a personalised stream.

#![allow(missing_docs)]

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Router,
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::stream::{Stream, StreamExt};
use priority_core::{ListFilter, PriorityCard, view::priority_cards};
use serde::{Deserialize, Serialize};

use crate::{extractors::MaybeAuthSession, middleware::AppState};

/// SSE event types.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SseEvent {
    /// Full ranked list.
    Ranking { items: Vec<PriorityCard> },
    /// The ranking could not be read; the stream stays open.
    Error { message: String },
}

impl SseEvent {
    const fn name(&self) -> &'static str {
        match self {
            Self::Ranking { .. } => "ranking",
            Self::Error { .. } => "error",
        }
    }

    fn into_event(self) -> Event {
        Event::default()
            .event(self.name())
            .json_data(&self)
            .unwrap_or_else(|_| Event::default().data("error"))
    }
}

/// Feed query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub filter: ListFilter,
}

/// Live ranking stream.
async fn priorities_stream(
    MaybeAuthSession(session): MaybeAuthSession,
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let filter = query.filter;

    let signed_out = {
        let session = session.clone();
        async move {
            match session {
                Some(session) => session.closed().await,
                None => futures::future::pending().await,
            }
        }
    };

    let ranking = state.ranking_service.watch().into_stream().then(move |result| {
        let session = session.clone();
        async move {
            let event = match result {
                Ok(ranked) => {
                    let voted = match &session {
                        Some(s) => Some(s.voted().await),
                        None => None,
                    };
                    SseEvent::Ranking {
                        items: filter.apply(priority_cards(&ranked, voted.as_ref())),
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to refresh ranking feed");
                    SseEvent::Error {
                        message: e.to_string(),
                    }
                }
            };
            Ok(event.into_event())
        }
    });
    let stream = ranking.take_until(signed_out);

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}

/// Create SSE router.
pub fn router() -> Router<AppState> {
    Router::new().route("/priorities", get(priorities_stream))
}
