// Streaming service - repeated query rounds pushed to a subscribed channel
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::query_service::{QueryError, QueryService, latest_timestamp};
use crate::domain::frame::Frame;
use crate::domain::query::{AssetPropertyValueQuery, SitewiseQuery, TimeRange};

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("unknown stream channel ds/{instance}/{uid}")]
    UnknownChannel { instance: String, uid: String },
    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Query snapshot, continuation token and window cursor of one stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamState {
    pub query: AssetPropertyValueQuery,
    pub next_token: Option<String>,
    pub window: TimeRange,
}

impl StreamState {
    pub fn new(query: AssetPropertyValueQuery) -> Self {
        let window = query.base.time_range;
        Self {
            query,
            next_token: None,
            window,
        }
    }

    pub fn round_query(&self) -> SitewiseQuery {
        let mut query = self.query.clone();
        query.base.time_range = self.window;
        query.base.next_token = self.next_token.clone();
        SitewiseQuery::PropertyValue(query)
    }

    /// Moves the window past what was already sent:
    /// `from = max(latest + 1ns, to)`, `to = now`.
    pub fn advance(&mut self, latest: Option<DateTime<Utc>>, now: DateTime<Utc>) {
        let to = self.window.to;
        let from = latest.map_or(to, |t| (t + TimeDelta::nanoseconds(1)).max(to));
        self.window = TimeRange::new(from, now.max(from));
        self.next_token = None;
    }
}

/// Registered streams keyed by channel uid. Written at registration, taken
/// once by the subscriber.
#[derive(Default)]
pub struct StreamRegistry {
    streams: RwLock<HashMap<String, StreamState>>,
}

impl StreamRegistry {
    pub fn insert(&self, uid: &str, state: StreamState) {
        self.streams.write().insert(uid.to_string(), state);
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.streams.read().contains_key(uid)
    }

    pub fn take(&self, uid: &str) -> Option<StreamState> {
        self.streams.write().remove(uid)
    }

    pub fn len(&self) -> usize {
        self.streams.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    Frames { frames: Vec<Frame> },
    Error { error: String },
}

#[derive(Clone)]
pub struct StreamingService {
    queries: Arc<QueryService>,
    shutdown: CancellationToken,
}

impl StreamingService {
    pub fn new(queries: Arc<QueryService>, shutdown: CancellationToken) -> Self {
        Self { queries, shutdown }
    }

    /// Starts the rounds of a registered channel. The stream ends when the
    /// receiver is dropped, the query fails or the service shuts down.
    pub fn subscribe(
        &self,
        instance: &str,
        uid: &str,
    ) -> Result<mpsc::Receiver<StreamMessage>, StreamError> {
        let unknown = || StreamError::UnknownChannel {
            instance: instance.to_string(),
            uid: uid.to_string(),
        };
        if instance != self.queries.instance_id() {
            return Err(unknown());
        }
        let state = self.queries.streams().take(uid).ok_or_else(unknown)?;

        tracing::info!("Subscribed to stream ds/{}/{}", instance, uid);
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(run_stream(
            self.queries.clone(),
            state,
            tx,
            self.shutdown.child_token(),
        ));
        Ok(rx)
    }
}

pub async fn run_stream(
    queries: Arc<QueryService>,
    mut state: StreamState,
    tx: mpsc::Sender<StreamMessage>,
    cancel: CancellationToken,
) {
    let ref_id = state.query.base.ref_id.clone();
    loop {
        if cancel.is_cancelled() {
            break;
        }

        let query = state.round_query();
        let round = tokio::select! {
            _ = cancel.cancelled() => break,
            round = queries.run_round(&query) => round,
        };
        let round = match round {
            Ok(round) => round,
            Err(err) => {
                let err = StreamError::from(err);
                tracing::warn!("Stream for {} ended: {}", ref_id, err);
                let _ = tx
                    .send(StreamMessage::Error {
                        error: err.to_string(),
                    })
                    .await;
                break;
            }
        };

        let latest = latest_timestamp(&round.frames);
        if cancel.is_cancelled() {
            break;
        }
        if tx
            .send(StreamMessage::Frames {
                frames: round.frames,
            })
            .await
            .is_err()
        {
            tracing::debug!("Stream consumer for {} went away", ref_id);
            break;
        }

        if let Some(token) = round.next_token {
            state.next_token = Some(token);
            continue;
        }

        state.advance(latest, Utc::now());
        tracing::debug!(
            "Stream for {} caught up, next window starts at {}",
            ref_id,
            state.window.from
        );
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tx.closed() => break,
            _ = tokio::time::sleep(state.query.interval_streaming) => {}
        }
    }
    tracing::debug!("Stream for {} finished", ref_id);
}
