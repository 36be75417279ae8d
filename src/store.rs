//! Review Store Client: typed access to the movie and review tables, and to
//! the two secondary indexes over the review table.
//!
//! The store owns no state beyond its backend handle. Items are returned in
//! the order the backend yields them; nothing here re-sorts or re-filters.

use std::{collections::HashMap, sync::Arc, time::Duration};

use aws_sdk_dynamodb::{
    operation::{put_item::PutItemError, update_item::UpdateItemError},
    types::AttributeValue,
};
use backend::DynamoBackend;
use fractic_core::collection;
use fractic_server_error::ServerError;
use tracing::{debug, info, warn};

use crate::{
    config::ServiceConfig,
    errors::StoreCalloutError,
    schema::{
        parsing::{build_dynamo_map, parse_dynamo_map, parse_dynamo_maps},
        Movie, Review, ReviewKey, CONTENT_FIELD, MOVIE_ID_FIELD, REVIEWER_NAME_FIELD,
        REVIEW_DATE_FIELD,
    },
};

pub mod backend;

pub type DynamoMap = HashMap<String, AttributeValue>;

/// Max items per BatchWriteItem call supported by DynamoDB.
const BATCH_WRITE_LIMIT: usize = 25;
/// Calls made per chunk before unprocessed items are reported as an error.
const BATCH_WRITE_ATTEMPTS: u32 = 3;
const BATCH_WRITE_BACKOFF: Duration = Duration::from_millis(50);

/// Which key space of the review table a query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewIndex {
    /// Table's own key: `(movieId, reviewerName)`.
    Primary,
    /// Secondary index: `(movieId, content)`.
    Rating,
    /// Secondary index: `(movieId, reviewDate)`.
    Date,
}

impl ReviewIndex {
    pub fn sort_field(&self) -> &'static str {
        match self {
            ReviewIndex::Primary => REVIEWER_NAME_FIELD,
            ReviewIndex::Rating => CONTENT_FIELD,
            ReviewIndex::Date => REVIEW_DATE_FIELD,
        }
    }
}

/// Condition on the sort attribute of the queried key space. Always
/// string-valued, since `begins_with` is only defined over strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKeyCondition {
    Equals(String),
    BeginsWith(String),
}

/// Description of a single partition query against the review table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewQuery {
    pub movie_id: i64,
    pub index: ReviewIndex,
    /// `None` reads the whole movie partition.
    pub sort_key: Option<SortKeyCondition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreTables {
    pub movie_table: String,
    pub review_table: String,
    pub rating_index: String,
    pub date_index: String,
}

impl From<&ServiceConfig> for StoreTables {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            movie_table: config.movie_table.clone(),
            review_table: config.review_table.clone(),
            rating_index: config.rating_index.clone(),
            date_index: config.date_index.clone(),
        }
    }
}

impl Default for StoreTables {
    fn default() -> Self {
        Self::from(&ServiceConfig::default())
    }
}

#[derive(Clone)]
pub struct ReviewStore {
    pub backend: Arc<dyn DynamoBackend>,
    pub tables: StoreTables,
}

impl ReviewStore {
    const ITEM_EXISTS_CONDITION: &'static str = "attribute_exists(reviewerName)";
    const ITEM_DOES_NOT_EXIST_CONDITION: &'static str = "attribute_not_exists(reviewerName)";

    pub fn new(backend: Arc<dyn DynamoBackend>, tables: StoreTables) -> Self {
        Self { backend, tables }
    }

    // Movies:
    // -----------------------------------------------------------------------

    pub async fn list_movies(&self) -> Result<Vec<Movie>, ServerError> {
        let response = self
            .backend
            .scan(self.tables.movie_table.clone(), None, None, None)
            .await
            .map_err(|e| StoreCalloutError::with_debug(&e))?;
        parse_dynamo_maps(&response.items.unwrap_or_default())
    }

    pub async fn get_movie(&self, movie_id: i64) -> Result<Option<Movie>, ServerError> {
        let key: DynamoMap = collection! {
            MOVIE_ID_FIELD.to_string() => AttributeValue::N(movie_id.to_string()),
        };
        let response = self
            .backend
            .get_item(self.tables.movie_table.clone(), key)
            .await
            .map_err(|e| StoreCalloutError::with_debug(&e))?;
        response
            .item
            .map(|item| parse_dynamo_map::<Movie>(&item))
            .transpose()
    }

    // Review reads:
    // -----------------------------------------------------------------------

    /// Point read of a single review by its primary key.
    pub async fn get_review(&self, key: &ReviewKey) -> Result<Option<Review>, ServerError> {
        key.validate()?;
        let response = self
            .backend
            .get_item(self.tables.review_table.clone(), key.to_dynamo_key())
            .await
            .map_err(|e| StoreCalloutError::with_debug(&e))?;
        response
            .item
            .map(|item| parse_dynamo_map::<Review>(&item))
            .transpose()
    }

    pub async fn query_reviews(&self, query: &ReviewQuery) -> Result<Vec<Review>, ServerError> {
        let index_name = match query.index {
            ReviewIndex::Primary => None,
            ReviewIndex::Rating => Some(self.tables.rating_index.clone()),
            ReviewIndex::Date => Some(self.tables.date_index.clone()),
        };
        let sort_field = query.index.sort_field();

        let mut attribute_values: DynamoMap = collection! {
            ":pk_val".to_string() => AttributeValue::N(query.movie_id.to_string()),
        };
        let condition = match &query.sort_key {
            Some(SortKeyCondition::BeginsWith(prefix)) if prefix.is_empty() => {
                format!("{} = :pk_val", MOVIE_ID_FIELD)
            }
            Some(SortKeyCondition::BeginsWith(prefix)) => {
                attribute_values.insert(":sk_val".to_string(), AttributeValue::S(prefix.clone()));
                format!(
                    "{} = :pk_val AND begins_with({}, :sk_val)",
                    MOVIE_ID_FIELD, sort_field
                )
            }
            Some(SortKeyCondition::Equals(value)) => {
                attribute_values.insert(":sk_val".to_string(), AttributeValue::S(value.clone()));
                format!("{} = :pk_val AND {} = :sk_val", MOVIE_ID_FIELD, sort_field)
            }
            None => format!("{} = :pk_val", MOVIE_ID_FIELD),
        };
        debug!(
            table = %self.tables.review_table,
            index = ?index_name,
            condition = %condition,
            "Querying reviews"
        );

        let response = self
            .backend
            .query(
                self.tables.review_table.clone(),
                index_name,
                condition,
                attribute_values,
            )
            .await
            .map_err(|e| StoreCalloutError::with_debug(&e))?;
        parse_dynamo_maps(&response.items.unwrap_or_default())
    }

    /// Scans reviews across all movies. With a rating prefix, the scan runs
    /// over the rating index and keeps only reviews whose content starts with
    /// the prefix.
    pub async fn scan_reviews(&self, rating_prefix: Option<&str>) -> Result<Vec<Review>, ServerError> {
        let (index, filter, attribute_values) = match rating_prefix {
            Some(prefix) => (
                Some(self.tables.rating_index.clone()),
                Some(format!("begins_with({}, :r)", CONTENT_FIELD)),
                Some(collection! {
                    ":r".to_string() => AttributeValue::S(prefix.to_string()),
                }),
            ),
            None => (None, None, None),
        };
        let response = self
            .backend
            .scan(self.tables.review_table.clone(), index, filter, attribute_values)
            .await
            .map_err(|e| StoreCalloutError::with_debug(&e))?;
        parse_dynamo_maps(&response.items.unwrap_or_default())
    }

    // Review writes:
    // -----------------------------------------------------------------------

    /// Writes a new review. Returns `false` without writing if this reviewer
    /// has already reviewed the movie.
    pub async fn put_review(&self, review: &Review) -> Result<bool, ServerError> {
        review.key().validate()?;
        let item = build_dynamo_map(review)?;
        let result = self
            .backend
            .put_item(
                self.tables.review_table.clone(),
                item,
                Some(Self::ITEM_DOES_NOT_EXIST_CONDITION.to_string()),
            )
            .await;
        match result {
            Ok(_) => {
                info!(key = %review.key(), "Review created");
                Ok(true)
            }
            Err(e) => match e.into_service_error() {
                PutItemError::ConditionalCheckFailedException(_) => Ok(false),
                other => Err(StoreCalloutError::with_debug(&other)),
            },
        }
    }

    /// Rewrites the content of an existing review. Returns `None` if no review
    /// exists under `key`; nothing is created in that case.
    pub async fn update_review_content(
        &self,
        key: &ReviewKey,
        content: &str,
    ) -> Result<Option<Review>, ServerError> {
        key.validate()?;
        let result = self
            .backend
            .update_item(
                self.tables.review_table.clone(),
                key.to_dynamo_key(),
                format!("SET {} = :c", CONTENT_FIELD),
                collection! {
                    ":c".to_string() => AttributeValue::S(content.to_string()),
                },
                Some(Self::ITEM_EXISTS_CONDITION.to_string()),
            )
            .await;
        match result {
            Ok(output) => {
                info!(key = %key, "Review content updated");
                output
                    .attributes
                    .map(|item| parse_dynamo_map::<Review>(&item))
                    .transpose()
            }
            Err(e) => match e.into_service_error() {
                UpdateItemError::ConditionalCheckFailedException(_) => Ok(None),
                other => Err(StoreCalloutError::with_debug(&other)),
            },
        }
    }

    /// Deletes a review, returning it, or `None` if there was nothing to delete.
    pub async fn delete_review(&self, key: &ReviewKey) -> Result<Option<Review>, ServerError> {
        key.validate()?;
        let output = self
            .backend
            .delete_item(self.tables.review_table.clone(), key.to_dynamo_key())
            .await
            .map_err(|e| StoreCalloutError::with_debug(&e))?;
        let deleted = output
            .attributes
            .filter(|item| !item.is_empty())
            .map(|item| parse_dynamo_map::<Review>(&item))
            .transpose()?;
        if deleted.is_some() {
            info!(key = %key, "Review deleted");
        }
        Ok(deleted)
    }

    // Seeding:
    // -----------------------------------------------------------------------

    /// Writes the given catalog unconditionally, overwriting existing items.
    pub async fn seed(&self, movies: &[Movie], reviews: &[Review]) -> Result<(), ServerError> {
        let movie_items = movies
            .iter()
            .map(build_dynamo_map::<Movie>)
            .collect::<Result<Vec<_>, _>>()?;
        let review_items = reviews
            .iter()
            .map(build_dynamo_map::<Review>)
            .collect::<Result<Vec<_>, _>>()?;
        self.batch_put(&self.tables.movie_table, movie_items).await?;
        self.batch_put(&self.tables.review_table, review_items).await?;
        info!(
            movies = movies.len(),
            reviews = reviews.len(),
            "Seeded movie catalog"
        );
        Ok(())
    }

    /// Writes `items` in chunks, resubmitting whatever DynamoDB reports as
    /// unprocessed. Fails if items remain after the last attempt.
    async fn batch_put(&self, table: &str, items: Vec<DynamoMap>) -> Result<(), ServerError> {
        for chunk in items.chunks(BATCH_WRITE_LIMIT) {
            let mut pending = chunk.to_vec();
            let mut attempt = 0;
            while !pending.is_empty() {
                if attempt == BATCH_WRITE_ATTEMPTS {
                    return Err(StoreCalloutError::with_debug(&format!(
                        "{} items left unprocessed in table '{}'",
                        pending.len(),
                        table
                    )));
                }
                if attempt > 0 {
                    warn!(table, unprocessed = pending.len(), attempt, "Retrying batch write");
                    tokio::time::sleep(BATCH_WRITE_BACKOFF * 2u32.pow(attempt - 1)).await;
                }
                let output = self
                    .backend
                    .batch_put_item(table.to_string(), pending)
                    .await
                    .map_err(|e| StoreCalloutError::with_debug(&e))?;
                pending = output
                    .unprocessed_items
                    .and_then(|mut unprocessed| unprocessed.remove(table))
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|request| request.put_request.map(|put| put.item))
                    .collect();
                attempt += 1;
            }
        }
        Ok(())
    }
}
