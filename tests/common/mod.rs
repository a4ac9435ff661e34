//! Shared harness for in-process API tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use library_api::{
    api,
    config::{AppConfig, NotificationsConfig, StorageBackend},
    repository::Repository,
    services::{email::MailSender, Services},
    AppResult, AppState,
};

/// Mail transport that records every message instead of sending it
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String, Vec<String>)>>,
}

#[async_trait]
impl MailSender for RecordingMailer {
    async fn send(&self, subject: &str, body: &str, recipients: &[String]) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string(), recipients.to_vec()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub services: Arc<Services>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        let mailer = Arc::new(RecordingMailer::default());
        let notifications = NotificationsConfig {
            recipients: vec!["librarian@library.local".to_string()],
            ..Default::default()
        };
        let services = Arc::new(Services::new(
            Repository::in_memory(),
            mailer.clone(),
            notifications,
        ));
        let mut config = AppConfig::default();
        config.database.backend = StorageBackend::Memory;
        let state = AppState {
            config: Arc::new(config),
            services: services.clone(),
        };

        Self {
            router: api::router(state),
            services,
            mailer,
        }
    }

    /// Send a request to `/api/v1{path}` and decode the JSON response, if any
    pub async fn send(&self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(format!("/api/v1{}", path));
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send_raw(request).await
    }

    pub async fn send_raw(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}
