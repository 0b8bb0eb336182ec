//! Server-sent change feed for live admin views.
//!
//! Each store write becomes an SSE event named after its collection, with
//! the [`ChangeEvent`] as JSON data. A subscriber that falls behind the
//! broadcast buffer gets a `resync` event telling it to reload.

use std::convert::Infallible;

use axum::{
    Router,
    extract::{Query, State},
    response::{
        Sse,
        sse::{Event, KeepAlive},
    },
    routing::get,
};
use bloom_store::{ChangeEvent, Collection};
use futures::Stream;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// `?collections=products,orders`; all collections when absent.
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    pub collections: Option<String>,
}

impl EventsQuery {
    fn parse(&self) -> Result<Option<Vec<Collection>>> {
        let Some(list) = self.collections.as_deref() else {
            return Ok(None);
        };
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<Collection>()
                    .map_err(|_| AppError::BadRequest(format!("unknown collection '{s}'")))
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(stream))
}

fn change_event(change: &ChangeEvent) -> Event {
    let data = serde_json::to_string(change)
        .unwrap_or_else(|_| r#"{"error":"Failed to serialize event"}"#.to_string());
    Event::default().event(change.collection.as_str()).data(data)
}

/// Subscribe to store changes.
pub async fn stream(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let only = query.parse()?;
    let mut changes = state.store().subscribe();
    tracing::debug!(collections = ?only, "Change feed subscriber connected");

    let events = async_stream::stream! {
        loop {
            match changes.recv().await {
                Ok(change) => {
                    if only.as_ref().is_none_or(|c| c.contains(&change.collection)) {
                        yield Ok(change_event(&change));
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Change feed subscriber lagged");
                    yield Ok(Event::default()
                        .event("resync")
                        .data(format!(r#"{{"missed":{missed}}}"#)));
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_filter_parsing() {
        let query = EventsQuery {
            collections: Some("products, orders".to_string()),
        };
        assert_eq!(
            query.parse().unwrap(),
            Some(vec![Collection::Products, Collection::Orders])
        );
        assert_eq!(EventsQuery::default().parse().unwrap(), None);

        let bad = EventsQuery {
            collections: Some("users".to_string()),
        };
        assert!(matches!(bad.parse(), Err(AppError::BadRequest(_))));
    }
}
