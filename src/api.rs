//! HTTP-facing handlers for the movie and review routes.
//!
//! Routing is left to the hosting layer: each handler takes an [`ApiRequest`]
//! holding the already-extracted path and query parameters, and returns a
//! complete JSON [`Response`]. Success bodies are `{"data": ...}`; every other
//! outcome carries `{"message": ...}`.

use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;
use fractic_server_error::ServerError;
use http::{header::CONTENT_TYPE, HeaderValue, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    config::ServiceConfig,
    resolver::{classify::parse_movie_id, ReviewLookup, ReviewOutcome, ReviewResolver},
    schema::{Review, ReviewKey, REVIEWER_NAME_FIELD},
    store::ReviewStore,
};

const MOVIE_ID_PARAM: &str = "movieId";
const REVIEWER_NAME_PARAM: &str = REVIEWER_NAME_FIELD;
const MIN_RATING_PARAM: &str = "minRating";

#[derive(Debug, Clone, Default)]
pub struct ApiRequest {
    pub path_parameters: HashMap<String, String>,
    pub query_parameters: HashMap<String, String>,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path_parameter(mut self, name: &str, value: impl Into<String>) -> Self {
        self.path_parameters.insert(name.to_string(), value.into());
        self
    }

    pub fn with_query_parameter(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query_parameters.insert(name.to_string(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    fn path(&self, name: &str) -> Option<&str> {
        self.path_parameters.get(name).map(String::as_str)
    }

    fn query(&self, name: &str) -> Option<&str> {
        self.query_parameters.get(name).map(String::as_str)
    }
}

#[derive(Serialize)]
struct DataBody<'a, T: Serialize> {
    data: &'a T,
}

#[derive(Serialize)]
struct MessageBody<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ContentUpdate {
    content: String,
}

pub struct MovieReviewApi {
    store: Arc<ReviewStore>,
    resolver: ReviewResolver,
    strict_status_codes: bool,
}

impl MovieReviewApi {
    pub fn new(store: Arc<ReviewStore>, config: &ServiceConfig) -> Self {
        Self {
            resolver: ReviewResolver::new(store.clone()),
            store,
            strict_status_codes: config.strict_status_codes,
        }
    }

    // Movies:
    // -----------------------------------------------------------------------

    /// `GET /movies`
    pub async fn get_all_movies(&self) -> Response<String> {
        match self.store.list_movies().await {
            Ok(movies) => data(StatusCode::OK, &movies),
            Err(e) => store_failure(e),
        }
    }

    /// `GET /movies/{movieId}`
    pub async fn get_movie_by_id(&self, request: &ApiRequest) -> Response<String> {
        let movie_id = match parse_movie_id(request.path(MOVIE_ID_PARAM)) {
            Ok(id) => id,
            Err(e) => return self.rejected(e.message()),
        };
        match self.store.get_movie(movie_id).await {
            Ok(Some(movie)) => data(StatusCode::OK, &movie),
            Ok(None) => message(StatusCode::NOT_FOUND, "Invalid movie Id"),
            Err(e) => store_failure(e),
        }
    }

    // Review reads:
    // -----------------------------------------------------------------------

    /// `GET /movies/{movieId}/reviews[/{reviewerName}][?minRating=&reviewerName=]`
    ///
    /// The optional path segment may hold either a reviewer name or a review
    /// date fragment; the resolver decides which.
    pub async fn get_movie_reviews(&self, request: &ApiRequest) -> Response<String> {
        let lookup = ReviewLookup {
            movie_id: request.path(MOVIE_ID_PARAM).map(str::to_string),
            reviewer_name: request.query(REVIEWER_NAME_PARAM).map(str::to_string),
            min_rating: request.query(MIN_RATING_PARAM).map(str::to_string),
            token: request.path(REVIEWER_NAME_PARAM).map(str::to_string),
        };
        match self.resolver.resolve(&lookup).await {
            ReviewOutcome::Found(reviews) => data(StatusCode::OK, &reviews),
            ReviewOutcome::NotFound => {
                message(StatusCode::NOT_FOUND, "Invalid movie Id or reviewer name")
            }
            ReviewOutcome::BadRequest(e) => self.rejected(e.message()),
            ReviewOutcome::StoreFailure(e) => store_failure(e),
        }
    }

    /// `GET /reviews[?minRating=]`
    pub async fn get_all_reviews(&self, request: &ApiRequest) -> Response<String> {
        let rating_prefix = request
            .query(MIN_RATING_PARAM)
            .map(str::trim)
            .filter(|r| !r.is_empty());
        match self.store.scan_reviews(rating_prefix).await {
            Ok(reviews) if reviews.is_empty() => message(StatusCode::NOT_FOUND, "No reviews found"),
            Ok(reviews) => data(StatusCode::OK, &reviews),
            Err(e) => store_failure(e),
        }
    }

    // Review writes:
    // -----------------------------------------------------------------------

    /// `POST /movies/{movieId}/reviews`
    pub async fn add_review(&self, request: &ApiRequest) -> Response<String> {
        let Some(body) = request.body.as_deref() else {
            return self.malformed("Missing request body");
        };
        let Ok(review) = serde_json::from_str::<Review>(body) else {
            return self.malformed("Incorrect type. Must match Movie review schema");
        };
        let movie_id = match parse_movie_id(request.path(MOVIE_ID_PARAM)) {
            Ok(id) => id,
            Err(e) => return self.rejected(e.message()),
        };
        if let Err(reason) = validate_new_review(&review, movie_id) {
            return self.malformed(reason);
        }

        match self.store.put_review(&review).await {
            Ok(true) => message(StatusCode::CREATED, "Review added"),
            Ok(false) => {
                info!(key = %review.key(), "Rejected duplicate review");
                message(StatusCode::CONFLICT, "Review already exists")
            }
            Err(e) => store_failure(e),
        }
    }

    /// `PUT /movies/{movieId}/reviews/{reviewerName}`, body `{"content": ...}`.
    pub async fn update_review(&self, request: &ApiRequest) -> Response<String> {
        let Some(body) = request.body.as_deref() else {
            return self.malformed("Missing request body");
        };
        let Ok(update) = serde_json::from_str::<ContentUpdate>(body) else {
            return self.malformed("Incorrect type. Must match review content schema");
        };
        let key = match self.review_key(request) {
            Ok(key) => key,
            Err(response) => return response,
        };
        if update.content.trim().is_empty() {
            return self.malformed("Missing review content to update");
        }

        match self.store.update_review_content(&key, &update.content).await {
            Ok(Some(_)) => message(StatusCode::CREATED, "Movie review updated"),
            Ok(None) => message(StatusCode::NOT_FOUND, "Invalid movie Id or reviewer name"),
            Err(e) => store_failure(e),
        }
    }

    /// `DELETE /movies/{movieId}/reviews/{reviewerName}`
    pub async fn remove_review(&self, request: &ApiRequest) -> Response<String> {
        let key = match self.review_key(request) {
            Ok(key) => key,
            Err(response) => return response,
        };
        match self.store.delete_review(&key).await {
            Ok(Some(_)) => message(StatusCode::OK, "Removal successful"),
            Ok(None) => message(StatusCode::NOT_FOUND, "Invalid movie Id or reviewer name"),
            Err(e) => store_failure(e),
        }
    }

    // Helpers:
    // -----------------------------------------------------------------------

    fn review_key(&self, request: &ApiRequest) -> Result<ReviewKey, Response<String>> {
        let movie_id =
            parse_movie_id(request.path(MOVIE_ID_PARAM)).map_err(|e| self.rejected(e.message()))?;
        let reviewer_name = request
            .path(REVIEWER_NAME_PARAM)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| self.rejected("Missing reviewer name"))?;
        Ok(ReviewKey::new(movie_id, reviewer_name))
    }

    /// Missing or invalid identifiers. Historically reported as 404.
    fn rejected(&self, reason: &str) -> Response<String> {
        let status = if self.strict_status_codes {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::NOT_FOUND
        };
        message(status, reason)
    }

    /// Missing or malformed request bodies. Historically reported as 500.
    fn malformed(&self, reason: &str) -> Response<String> {
        let status = if self.strict_status_codes {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        message(status, reason)
    }
}

fn validate_new_review(review: &Review, movie_id: i64) -> Result<(), &'static str> {
    if review.movie_id != movie_id {
        return Err("Review movieId does not match the request path");
    }
    if review.key().validate().is_err() {
        return Err("Missing reviewer name");
    }
    if NaiveDate::parse_from_str(&review.review_date, "%Y-%m-%d").is_err() {
        return Err("Review date must be formatted YYYY-MM-DD");
    }
    if review.content.trim().is_empty() {
        return Err("Missing review content");
    }
    Ok(())
}

fn json_response(status: StatusCode, body: String) -> Response<String> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn data<T: Serialize>(status: StatusCode, value: &T) -> Response<String> {
    match serde_json::to_string(&DataBody { data: value }) {
        Ok(body) => json_response(status, body),
        Err(e) => {
            warn!(error = %e, "Failed to serialize response body");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

fn message(status: StatusCode, message: &str) -> Response<String> {
    let body = serde_json::to_string(&MessageBody { message }).unwrap_or_default();
    json_response(status, body)
}

fn store_failure(error: ServerError) -> Response<String> {
    warn!(error = ?error, "Review store request failed");
    message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
