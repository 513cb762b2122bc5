mod framing;

pub use framing::{END_OF_STREAM, Fragment, split_frame};

use crate::{
    Error, Result,
    api::QueryRequest,
    config::{Credentials, StreamConfig},
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::{io::Write, time::Duration};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        Error as WsError, Message,
        error::ProtocolError,
        protocol::{CloseFrame, frame::coding::CloseCode},
    },
};
use tracing::{debug, info, warn};
use url::Url;

/// Ping cadence and how long to wait for the matching pong.
#[derive(Debug, Clone, Copy)]
pub struct Keepalive {
    pub interval: Duration,
    pub timeout: Duration,
}

impl From<&StreamConfig> for Keepalive {
    fn from(config: &StreamConfig) -> Self {
        Self {
            interval: config.ping_interval(),
            timeout: config.ping_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamSummary {
    pub fragments: usize,
    pub chars: usize,
    pub elapsed: Duration,
}

pub struct StreamClient {
    ws_url: String,
    credentials: Credentials,
    keepalive: Keepalive,
}

impl StreamClient {
    pub fn new(ws_url: impl Into<String>, config: &StreamConfig, credentials: Credentials) -> Self {
        Self {
            ws_url: ws_url.into(),
            credentials,
            keepalive: Keepalive::from(config),
        }
    }

    /// Endpoint URL with the bearer token as `access_token`.
    pub fn stream_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.ws_url)?;
        url.query_pairs_mut()
            .append_pair("access_token", self.credentials.token());
        Ok(url)
    }

    /// Sends `request` once and writes the streamed answer to `out` until the
    /// end-of-stream marker. The socket is closed on every exit path.
    pub async fn run<W: Write>(&self, request: &QueryRequest, out: &mut W) -> Result<StreamSummary> {
        let url = self.stream_url()?;
        let payload = serde_json::to_string(request)?;

        info!("Connecting to WebSocket at {}", self.ws_url);
        let (mut ws, _) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::connection(format!("WebSocket connection failed: {e}")))?;
        info!("Connected, sending query payload ({} bytes)", payload.len());

        let outcome = consume(&mut ws, &payload, out, self.keepalive).await;

        if let Err(e) = ws.close(None).await {
            debug!("Close after stream: {}", e);
        }

        match &outcome {
            Ok(summary) => info!(
                "Generation complete: {} fragments, {} chars in {:?}",
                summary.fragments, summary.chars, summary.elapsed
            ),
            Err(e) => warn!("Stream failed: {}", e),
        }
        outcome
    }
}

/// Sends `payload` and copies text frames to `out` in arrival order, flushing
/// after each, until a frame ends with the marker.
pub async fn consume<S, W>(
    ws: &mut S,
    payload: &str,
    out: &mut W,
    keepalive: Keepalive,
) -> Result<StreamSummary>
where
    S: Stream<Item = std::result::Result<Message, WsError>>
        + Sink<Message, Error = WsError>
        + Unpin,
    W: Write,
{
    let started = Instant::now();
    let mut summary = StreamSummary::default();

    ws.send(Message::Text(payload.into())).await?;
    debug!("Query payload sent");

    let mut ticker = tokio::time::interval_at(started + keepalive.interval, keepalive.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ping_sent_at: Option<Instant> = None;

    loop {
        let pong_deadline = ping_sent_at.map(|sent| sent + keepalive.timeout);

        tokio::select! {
            message = ws.next() => match message {
                Some(Ok(Message::Text(text))) => match split_frame(text.as_str()) {
                    Fragment::Content(content) => emit(out, content, &mut summary)?,
                    Fragment::Last(content) => {
                        emit(out, content, &mut summary)?;
                        summary.elapsed = started.elapsed();
                        return Ok(summary);
                    }
                },
                Some(Ok(Message::Pong(_))) => {
                    ping_sent_at = None;
                }
                // tungstenite queues the pong reply itself
                Some(Ok(Message::Ping(_))) => debug!("Ping from server"),
                Some(Ok(Message::Binary(data))) => {
                    warn!("Ignoring {} byte binary frame", data.len());
                }
                Some(Ok(Message::Close(frame))) => return Err(close_error(frame)),
                Some(Ok(Message::Frame(_))) => {}
                Some(Err(e)) => return Err(read_error(e)),
                None => return Err(Error::StreamIncomplete),
            },
            _ = ticker.tick() => {
                if ping_sent_at.is_none() {
                    debug!("Sending keepalive ping");
                    ws.send(Message::Ping(Default::default())).await?;
                    ping_sent_at = Some(Instant::now());
                }
            }
            _ = wait_until(pong_deadline) => {
                return Err(Error::KeepaliveTimeout {
                    timeout_secs: keepalive.timeout.as_secs(),
                });
            }
        }
    }
}

fn emit<W: Write>(out: &mut W, content: &str, summary: &mut StreamSummary) -> Result<()> {
    if content.is_empty() {
        return Ok(());
    }
    out.write_all(content.as_bytes())?;
    out.flush()?;
    summary.fragments += 1;
    summary.chars += content.chars().count();
    Ok(())
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Any close before the marker is a failure; only the code decides which.
fn close_error(frame: Option<CloseFrame>) -> Error {
    match frame {
        Some(frame) if frame.code != CloseCode::Normal => Error::AbnormalClose {
            code: frame.code.into(),
            reason: frame.reason.as_str().to_string(),
        },
        _ => Error::StreamIncomplete,
    }
}

fn read_error(e: WsError) -> Error {
    match e {
        WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => Error::AbnormalClose {
            code: CloseCode::Abnormal.into(),
            reason: "connection reset without closing handshake".to_string(),
        },
        WsError::ConnectionClosed | WsError::AlreadyClosed => Error::StreamIncomplete,
        other => Error::WebSocket(other),
    }
}
