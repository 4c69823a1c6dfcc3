//! Test doubles shared by the task module tests.

use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::error::SendError;
use crate::tasks::record::TaskConfig;
use crate::tasks::sender::MessageSender;

pub(crate) fn task_config(messages: &[&str], credentials: &[&str], interval: u64) -> TaskConfig {
    TaskConfig {
        target: "convo-1".into(),
        label_prefix: "ops".into(),
        messages: messages.iter().map(|m| m.to_string()).collect(),
        credentials: credentials
            .iter()
            .map(|c| SecretString::from(c.to_string()))
            .collect(),
        interval_seconds: interval,
    }
}

/// Records every call as `(target, token, payload)`.
#[derive(Default)]
pub(crate) struct RecordingSender {
    calls: Mutex<Vec<(String, String, String)>>,
    reject: bool,
}

impl RecordingSender {
    pub(crate) fn rejecting() -> Self {
        Self {
            reject: true,
            ..Default::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn payloads(&self) -> Vec<String> {
        self.calls().into_iter().map(|(_, _, p)| p).collect()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(
        &self,
        target: &str,
        token: &SecretString,
        payload: &str,
    ) -> Result<(), SendError> {
        self.calls.lock().unwrap().push((
            target.to_string(),
            token.expose_secret().to_string(),
            payload.to_string(),
        ));
        if self.reject {
            Err(SendError::Rejected { status: 500 })
        } else {
            Ok(())
        }
    }
}

pub(crate) struct PanickingSender;

#[async_trait]
impl MessageSender for PanickingSender {
    async fn send(
        &self,
        _target: &str,
        _token: &SecretString,
        _payload: &str,
    ) -> Result<(), SendError> {
        panic!("sender blew up");
    }
}
