//! Route handlers.

use super::error::ApiError;
use super::AppState;
use crate::scrape::parse_page_url;
use crate::store::{PageStore, ReviewStore, StoredPage};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pagesure::category::{self, Category, CategoryKey};
use pagesure::{NewReview, Review, ReviewStats, ReviewUpdate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Parse a JSON body, reporting malformed input as a 400.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))
}

fn require_user(user_id: Option<&str>) -> Result<&str, ApiError> {
    user_id
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing userId".to_string()))
}

fn review_not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Review {id} not found"))
}

fn page_not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Page {id} not found"))
}

/// Run a page store call on the blocking pool.
async fn pages<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    F: FnOnce(&dyn PageStore) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.pages);
    Ok(tokio::task::spawn_blocking(move || call(store.as_ref())).await??)
}

/// Run a review store call on the blocking pool.
async fn reviews<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    F: FnOnce(&dyn ReviewStore) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.reviews);
    Ok(tokio::task::spawn_blocking(move || call(store.as_ref())).await??)
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "pool": state.scraper.pool().status(),
    }))
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeRequest {
    #[serde(default)]
    url: Option<String>,
}

/// `POST /api/scrape`: stored record if the page is known, else scrape it.
pub async fn scrape(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StoredPage>, ApiError> {
    let request: ScrapeRequest = serde_json::from_slice(&body).unwrap_or_default();
    let target = parse_page_url(request.url.as_deref().unwrap_or(""))?;

    let page_id = target.page_id.clone();
    if let Some(page) = pages(&state, move |store| store.get_page(&page_id)).await? {
        debug!(page_id = %target.page_id, "serving stored page");
        return Ok(Json(page));
    }

    let record = state.scraper.scrape(&target).await?;
    let page_id = target.page_id;
    let stored = pages(&state, move |store| store.insert_page_if_absent(&page_id, &record)).await?;
    Ok(Json(stored))
}

pub async fn get_page(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
) -> Result<Json<StoredPage>, ApiError> {
    let id = page_id.clone();
    pages(&state, move |store| store.get_page(&id))
        .await?
        .map(Json)
        .ok_or_else(|| page_not_found(&page_id))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    search: Option<String>,
}

/// A bucket with the number of stored pages in it.
#[derive(Debug, Serialize)]
pub struct CategorySummary {
    #[serde(flatten)]
    category: &'static Category,
    count: usize,
}

pub async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<CategorySummary>>, ApiError> {
    let counts = pages(&state, |store| store.count_by_category()).await?;
    let summaries = category::search(params.search.as_deref().unwrap_or(""))
        .into_iter()
        .map(|c| CategorySummary {
            category: c,
            count: counts.get(&c.key).copied().unwrap_or(0),
        })
        .collect();
    Ok(Json(summaries))
}

pub async fn category_pages(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Vec<StoredPage>>, ApiError> {
    let key: CategoryKey = key.parse()?;
    Ok(Json(pages(&state, move |store| store.pages_by_category(key)).await?))
}

#[derive(Debug, Serialize)]
pub struct PageReviews {
    reviews: Vec<Review>,
    stats: ReviewStats,
}

pub async fn page_reviews(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
) -> Result<Json<PageReviews>, ApiError> {
    let listed = reviews(&state, move |store| store.reviews_for_page(&page_id)).await?;
    let stats = ReviewStats::from_reviews(&listed);
    Ok(Json(PageReviews {
        reviews: listed,
        stats,
    }))
}

pub async fn create_review(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let input: NewReview = parse_body(&body)?;
    input.validate()?;
    let id = page_id.clone();
    let page = pages(&state, move |store| store.get_page(&id))
        .await?
        .ok_or_else(|| page_not_found(&page_id))?;

    let review = input.into_review(
        &page.id,
        page.record.title.clone(),
        page.record.profile_picture_url.clone(),
    )?;
    let stored = review.clone();
    if !reviews(&state, move |store| store.insert_review(&stored)).await? {
        return Err(ApiError::Conflict(
            "You have already reviewed this page".to_string(),
        ));
    }
    info!(review_id = %review.id, page_id = %page.id, rating = review.rating, "review created");
    Ok((StatusCode::CREATED, Json(review)))
}

/// Load a review and check that `user_id` wrote it.
async fn authored_review(state: &AppState, id: &str, user_id: &str) -> Result<Review, ApiError> {
    let review_id = id.to_string();
    let review = reviews(state, move |store| store.get_review(&review_id))
        .await?
        .ok_or_else(|| review_not_found(id))?;
    if !review.is_author(user_id) {
        return Err(ApiError::Forbidden(
            "Only the author can change this review".to_string(),
        ));
    }
    Ok(review)
}

pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Review>, ApiError> {
    let update: ReviewUpdate = parse_body(&body)?;
    let user_id = require_user(Some(update.user_id.as_str()))?;
    authored_review(&state, &id, user_id).await?;
    update.validate()?;

    let review_id = id.clone();
    let updated = reviews(&state, move |store| {
        store.modify_review(&review_id, &mut |review: &mut Review| {
            review.apply(&update)?;
            Ok(())
        })
    })
    .await?;
    updated.map(Json).ok_or_else(|| review_not_found(&id))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserParams {
    #[serde(default)]
    user_id: Option<String>,
}

pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<UserParams>,
) -> Result<StatusCode, ApiError> {
    let user_id = require_user(params.user_id.as_deref())?;
    authored_review(&state, &id, user_id).await?;
    let review_id = id.clone();
    if !reviews(&state, move |store| store.delete_review(&review_id)).await? {
        return Err(review_not_found(&id));
    }
    info!(review_id = %id, "review deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn like_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Review>, ApiError> {
    let params: UserParams = parse_body(&body)?;
    let user_id = require_user(params.user_id.as_deref())?.to_string();

    let review_id = id.clone();
    let updated = reviews(&state, move |store| {
        store.modify_review(&review_id, &mut |review: &mut Review| {
            review.toggle_like(&user_id);
            Ok(())
        })
    })
    .await?;
    updated.map(Json).ok_or_else(|| review_not_found(&id))
}

pub async fn user_reviews(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(
        reviews(&state, move |store| store.reviews_by_user(&user_id)).await?,
    ))
}
