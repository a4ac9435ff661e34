//! Liveness and storage check

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{config::StorageBackend, AppState};

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` when the book store answers, `unhealthy` otherwise
    pub status: String,
    pub version: String,
    /// Configured storage backend
    pub storage: StorageBackend,
}

/// Report whether the service can reach its store
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Store reachable", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status) = match state.services.books.ping().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            tracing::warn!("Storage check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            storage: state.config.database.backend,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::{
        config::AppConfig,
        error::AppError,
        repository::{MockBookStore, Repository},
        services::{email::MockMailSender, Services},
    };

    fn state(repository: Repository) -> AppState {
        let services = Services::new(
            repository,
            Arc::new(MockMailSender::new()),
            Default::default(),
        );
        AppState {
            config: Arc::new(AppConfig::default()),
            services: Arc::new(services),
        }
    }

    #[tokio::test]
    async fn reports_configured_backend() {
        let (code, Json(body)) = health_check(State(state(Repository::in_memory()))).await;

        assert_eq!(code, StatusCode::OK);
        assert_eq!(body.status, "healthy");
        assert_eq!(body.storage, StorageBackend::Postgres);
    }

    #[tokio::test]
    async fn unreachable_store_is_unavailable() {
        let mut books = MockBookStore::new();
        books
            .expect_exists_by_isbn()
            .returning(|_| Err(AppError::Internal("connection refused".to_string())));
        let repository = Repository {
            books: Arc::new(books),
            loans: Repository::in_memory().loans,
        };

        let (code, Json(body)) = health_check(State(state(repository))).await;

        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "unhealthy");
    }
}
