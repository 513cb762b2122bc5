use async_trait::async_trait;
use createai_probe::{
    Error, Result,
    api::{ApiReply, CreateAiApi, ProjectRequest, QueryRequest, SearchRequest},
};
use futures::{Sink, Stream};
use std::{
    collections::VecDeque,
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll},
};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// Mock CreateAI API for testing
#[derive(Debug, Default)]
pub struct MockCreateAiApi {
    pub replies: Arc<Mutex<Vec<ApiReply>>>,
    pub queries: Arc<Mutex<Vec<QueryRequest>>>,
    pub searches: Arc<Mutex<Vec<SearchRequest>>>,
    pub projects: Arc<Mutex<Vec<ProjectRequest>>>,
    pub error: Option<String>,
}

impl MockCreateAiApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(self, replies: Vec<ApiReply>) -> Self {
        *self.replies.lock().unwrap() = replies;
        self
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }

    pub fn get_queries(&self) -> Vec<QueryRequest> {
        self.queries.lock().unwrap().clone()
    }

    pub fn get_searches(&self) -> Vec<SearchRequest> {
        self.searches.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Result<ApiReply> {
        if let Some(ref error) = self.error {
            return Err(Error::connection(error.clone()));
        }

        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(Error::connection("No more mock replies available"));
        }

        Ok(replies.remove(0))
    }
}

#[async_trait]
impl CreateAiApi for MockCreateAiApi {
    async fn query(&self, request: &QueryRequest) -> Result<ApiReply> {
        self.queries.lock().unwrap().push(request.clone());
        self.next_reply()
    }

    async fn search(&self, request: &SearchRequest) -> Result<ApiReply> {
        self.searches.lock().unwrap().push(request.clone());
        self.next_reply()
    }

    async fn project(&self, request: &ProjectRequest) -> Result<ApiReply> {
        self.projects.lock().unwrap().push(request.clone());
        self.next_reply()
    }
}

/// In-memory WebSocket that replays a fixed sequence of incoming messages
/// and records everything sent to it.
#[derive(Debug, Default)]
pub struct ScriptedSocket {
    incoming: VecDeque<std::result::Result<Message, WsError>>,
    pub sent: Vec<Message>,
    hold_open: bool,
}

impl ScriptedSocket {
    pub fn new(incoming: Vec<std::result::Result<Message, WsError>>) -> Self {
        Self {
            incoming: incoming.into(),
            sent: Vec::new(),
            hold_open: false,
        }
    }

    pub fn texts(fragments: &[&str]) -> Self {
        Self::new(
            fragments
                .iter()
                .map(|f| Ok(Message::Text((*f).into())))
                .collect(),
        )
    }

    /// Stay silent once the script runs out instead of ending the stream.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn pings_sent(&self) -> usize {
        self.sent
            .iter()
            .filter(|m| matches!(m, Message::Ping(_)))
            .count()
    }
}

impl Stream for ScriptedSocket {
    type Item = std::result::Result<Message, WsError>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.incoming.pop_front() {
            Some(item) => Poll::Ready(Some(item)),
            None if self.hold_open => Poll::Pending,
            None => Poll::Ready(None),
        }
    }
}

impl Sink<Message> for ScriptedSocket {
    type Error = WsError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), WsError>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(mut self: Pin<&mut Self>, item: Message) -> std::result::Result<(), WsError> {
        self.sent.push(item);
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), WsError>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), WsError>> {
        Poll::Ready(Ok(()))
    }
}
