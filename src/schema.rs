use aws_sdk_dynamodb::types::AttributeValue;
use fractic_core::collection;
use fractic_server_error::ServerError;
use serde::{Deserialize, Serialize};

use crate::{errors::InvalidReviewKey, store::DynamoMap};

pub mod parsing;

// Attribute names, shared by the tables and both secondary indexes.
pub const MOVIE_ID_FIELD: &str = "movieId";
pub const REVIEWER_NAME_FIELD: &str = "reviewerName";
pub const REVIEW_DATE_FIELD: &str = "reviewDate";
pub const CONTENT_FIELD: &str = "content";

/// Catalog entry. Written at seed time, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    pub original_language: String,
    pub overview: String,
    pub popularity: f64,
    pub release_date: String,
    pub title: String,
    #[serde(default)]
    pub video: bool,
    pub vote_average: f64,
    pub vote_count: i64,
}

/// A review, keyed by `(movieId, reviewerName)`.
///
/// The leading characters of `content` carry the star rating ("4 stars -
/// ..."), which is what the rating index orders by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub movie_id: i64,
    pub reviewer_name: String,
    pub review_date: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReviewKey {
    pub movie_id: i64,
    pub reviewer_name: String,
}

impl ReviewKey {
    pub fn new(movie_id: i64, reviewer_name: impl Into<String>) -> Self {
        Self {
            movie_id,
            reviewer_name: reviewer_name.into(),
        }
    }

    #[track_caller]
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.reviewer_name.trim().is_empty() {
            return Err(InvalidReviewKey::new(&format!(
                "reviewer name must not be blank (movie {})",
                self.movie_id
            )));
        }
        Ok(())
    }

    pub fn to_dynamo_key(&self) -> DynamoMap {
        collection! {
            MOVIE_ID_FIELD.to_string() => AttributeValue::N(self.movie_id.to_string()),
            REVIEWER_NAME_FIELD.to_string() => AttributeValue::S(self.reviewer_name.clone()),
        }
    }
}

impl Review {
    pub fn key(&self) -> ReviewKey {
        ReviewKey::new(self.movie_id, self.reviewer_name.clone())
    }
}

impl std::fmt::Display for ReviewKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.movie_id, self.reviewer_name)
    }
}
