//! In-process fake transport for unit tests
//!
//! Replies are queued up front and handed out in order; every posted body is
//! recorded. Clones share the same queue and record, so a test can keep one
//! clone while the widget owns another.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::{DomassistError, Result};
use crate::webhook::transport::{Transport, TransportResponse};

#[derive(Debug, Clone)]
enum FakeReply {
    Answer(TransportResponse),
    Unreachable(String),
}

#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    replies: Arc<Mutex<VecDeque<FakeReply>>>,
    sent: Arc<Mutex<Vec<Value>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a 200 answer with a JSON body
    pub fn reply_json(&self, body: Value) -> &Self {
        self.reply_status(200, &body.to_string())
    }

    /// Queue an answer with an arbitrary status and body
    pub fn reply_status(&self, status: u16, body: &str) -> &Self {
        self.push(FakeReply::Answer(TransportResponse {
            status,
            body: body.to_string(),
        }))
    }

    /// Queue a transport failure
    pub fn fail(&self, reason: &str) -> &Self {
        self.push(FakeReply::Unreachable(reason.to_string()))
    }

    /// Bodies posted so far
    pub fn sent(&self) -> Vec<Value> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Most recent posted body
    pub fn last_sent(&self) -> Option<Value> {
        self.sent().pop()
    }

    fn push(&self, reply: FakeReply) -> &Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
        self
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn post_json(&self, body: &Value) -> Result<TransportResponse> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(body.clone());
        }
        let next = self.replies.lock().ok().and_then(|mut r| r.pop_front());
        match next {
            Some(FakeReply::Answer(response)) => Ok(response),
            Some(FakeReply::Unreachable(reason)) => Err(DomassistError::Network(reason).into()),
            None => Err(DomassistError::Network("no fake reply queued".into()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_replies_in_order_and_records_bodies() {
        let fake = FakeTransport::new();
        fake.reply_json(json!({"response": "eins"}))
            .reply_status(500, "boom");

        let first = fake.post_json(&json!({"n": 1})).await.unwrap();
        assert_eq!(first.status, 200);
        let second = fake.post_json(&json!({"n": 2})).await.unwrap();
        assert_eq!(second.status, 500);
        assert!(fake.post_json(&json!({"n": 3})).await.is_err());

        assert_eq!(fake.sent().len(), 3);
        assert_eq!(fake.last_sent().unwrap()["n"], 3);
    }
}
