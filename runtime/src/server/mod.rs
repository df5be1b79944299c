//! HTTP API.
//!
//! Routes:
//!
//! | Method | Path | |
//! |---|---|---|
//! | POST | `/api/scrape` | scrape (or return the stored) page record |
//! | GET | `/api/pages/:page_id` | stored page record |
//! | GET, POST | `/api/pages/:page_id/reviews` | list / create reviews |
//! | GET | `/api/categories` | buckets with page counts |
//! | GET | `/api/categories/:key/pages` | pages in one bucket |
//! | PATCH, DELETE | `/api/reviews/:id` | author edits / deletes |
//! | POST | `/api/reviews/:id/like` | toggle a like |
//! | GET | `/api/users/:user_id/reviews` | a user's reviews |
//! | GET | `/health` | pool status |

pub mod error;
mod handlers;

pub use error::ApiError;

use crate::scrape::Scraper;
use crate::store::{PageStore, ReviewStore};
use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, patch, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// Shared request state.
#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<Scraper>,
    pub pages: Arc<dyn PageStore>,
    pub reviews: Arc<dyn ReviewStore>,
}

/// CORS policy admitting only the listed origins.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) if origin != "*" => Some(value),
            _ => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

/// Build the application router.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/scrape", post(handlers::scrape))
        .route("/api/pages/:page_id", get(handlers::get_page))
        .route(
            "/api/pages/:page_id/reviews",
            get(handlers::page_reviews).post(handlers::create_review),
        )
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/categories/:key/pages", get(handlers::category_pages))
        .route(
            "/api/reviews/:id",
            patch(handlers::update_review).delete(handlers::delete_review),
        )
        .route("/api/reviews/:id/like", post(handlers::like_review))
        .route("/api/users/:user_id/reviews", get(handlers::user_reviews))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Serve the API on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    state: AppState,
    cors_origins: &[String],
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, origins = ?cors_origins, "PageSure API listening");
    axum::serve(listener, router(state, cors_origins))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}
