//! Review Resolver: classification, query building and execution for review
//! lookups, with every result mapped to a single [`ReviewOutcome`].

use std::sync::Arc;

use fractic_server_error::ServerError;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{schema::Review, store::ReviewStore};

pub mod classify;
pub mod query;

pub use classify::{classify, Classification, PrefixToken, ReviewLookup, ReviewMode};
pub use query::build_query;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("missing or invalid movie id: {0:?}")]
    MissingOrInvalidMovieId(Option<String>),
    #[error("missing disambiguator: '{parameter}' was supplied blank")]
    MissingDisambiguator { parameter: &'static str },
    #[error("unsupported review lookup mode '{0}'")]
    UnsupportedMode(String),
}

impl ResolveError {
    /// Message reported to API callers.
    pub fn message(&self) -> &'static str {
        match self {
            ResolveError::MissingOrInvalidMovieId(_) => "Missing movie Id",
            ResolveError::MissingDisambiguator { .. } => "Missing reviewer name or review year",
            ResolveError::UnsupportedMode(_) => "Unsupported review lookup",
        }
    }
}

#[derive(Debug)]
pub enum ReviewOutcome {
    /// Matching reviews, in store order. Never empty.
    Found(Vec<Review>),
    NotFound,
    BadRequest(ResolveError),
    StoreFailure(ServerError),
}

impl ReviewOutcome {
    pub fn reviews(&self) -> Option<&[Review]> {
        match self {
            ReviewOutcome::Found(reviews) => Some(reviews),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct ReviewResolver {
    store: Arc<ReviewStore>,
}

impl ReviewResolver {
    pub fn new(store: Arc<ReviewStore>) -> Self {
        Self { store }
    }

    /// Resolves a lookup to its outcome. Store faults are surfaced as-is and
    /// never retried here.
    #[tracing::instrument(name = "reviews.resolve", skip_all, fields(movie_id = ?lookup.movie_id))]
    pub async fn resolve(&self, lookup: &ReviewLookup) -> ReviewOutcome {
        let classification = match classify(lookup) {
            Ok(c) => c,
            Err(e) => {
                debug!(error = %e, "Rejected review lookup");
                return ReviewOutcome::BadRequest(e);
            }
        };
        let query = match build_query(
            classification.movie_id,
            classification.mode,
            classification.token.as_ref(),
        ) {
            Ok(q) => q,
            Err(e) => {
                debug!(error = %e, mode = %classification.mode, "Could not build review query");
                return ReviewOutcome::BadRequest(e);
            }
        };
        debug!(mode = %classification.mode, query = ?query, "Resolved review lookup");

        match self.store.query_reviews(&query).await {
            Ok(reviews) if reviews.is_empty() => ReviewOutcome::NotFound,
            Ok(reviews) => ReviewOutcome::Found(reviews),
            Err(e) => {
                warn!(error = ?e, "Review store query failed");
                ReviewOutcome::StoreFailure(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use aws_sdk_dynamodb::{error::SdkError, operation::query::QueryOutput};
    use mockall::predicate::*;

    use crate::{
        seed,
        store::{backend::MockDynamoBackend, DynamoMap, StoreTables},
        schema::parsing::build_dynamo_map,
    };

    fn seeded_items(movie_id: i64, keep: impl Fn(&Review) -> bool) -> Vec<DynamoMap> {
        seed::movie_reviews()
            .iter()
            .filter(|r| r.movie_id == movie_id && keep(r))
            .map(|r| build_dynamo_map(r).unwrap())
            .collect()
    }

    fn resolver(backend: MockDynamoBackend) -> ReviewResolver {
        ReviewResolver::new(Arc::new(ReviewStore::new(
            Arc::new(backend),
            StoreTables::default(),
        )))
    }

    fn names(outcome: &ReviewOutcome) -> Vec<&str> {
        outcome
            .reviews()
            .unwrap_or_default()
            .iter()
            .map(|r| r.reviewer_name.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_all_reviews_for_movie() {
        let mut backend = MockDynamoBackend::new();
        backend
            .expect_query()
            .with(
                eq("MovieReview".to_string()),
                eq(None),
                eq("movieId = :pk_val".to_string()),
                always(),
            )
            .times(1)
            .returning(|_, _, _, _| {
                Ok(QueryOutput::builder()
                    .set_items(Some(seeded_items(1234, |_| true)))
                    .build())
            });

        let outcome = resolver(backend)
            .resolve(&ReviewLookup::for_movie("1234"))
            .await;

        assert_eq!(
            names(&outcome),
            vec!["Joe Bloggs", "Alice Broggs", "Joe Cloggs"]
        );
    }

    #[tokio::test]
    async fn test_reviewer_prefix() {
        let mut backend = MockDynamoBackend::new();
        backend
            .expect_query()
            .with(
                eq("MovieReview".to_string()),
                eq(None),
                eq("movieId = :pk_val AND begins_with(reviewerName, :sk_val)".to_string()),
                always(),
            )
            .times(1)
            .returning(|_, _, _, values| {
                let prefix = values
                    .get(":sk_val")
                    .and_then(|v| v.as_s().ok())
                    .cloned()
                    .unwrap_or_default();
                Ok(QueryOutput::builder()
                    .set_items(Some(seeded_items(1234, |r| {
                        r.reviewer_name.starts_with(&prefix)
                    })))
                    .build())
            });

        let outcome = resolver(backend)
            .resolve(&ReviewLookup::for_movie("1234").with_token("Joe"))
            .await;

        assert_eq!(names(&outcome), vec!["Joe Bloggs", "Joe Cloggs"]);
    }

    #[tokio::test]
    async fn test_unknown_movie_is_not_found() {
        let mut backend = MockDynamoBackend::new();
        backend
            .expect_query()
            .returning(|_, _, _, _| Ok(QueryOutput::builder().build()));

        let outcome = resolver(backend)
            .resolve(&ReviewLookup::for_movie("9999"))
            .await;

        assert!(matches!(outcome, ReviewOutcome::NotFound));
    }

    #[tokio::test]
    async fn test_min_rating_prefix() {
        let mut backend = MockDynamoBackend::new();
        backend
            .expect_query()
            .with(
                eq("MovieReview".to_string()),
                eq(Some("ratingIx".to_string())),
                eq("movieId = :pk_val AND begins_with(content, :sk_val)".to_string()),
                always(),
            )
            .times(1)
            .returning(|_, _, _, _| {
                Ok(QueryOutput::builder()
                    .set_items(Some(seeded_items(1234, |r| r.content.starts_with('4'))))
                    .build())
            });

        let outcome = resolver(backend)
            .resolve(&ReviewLookup::for_movie("1234").with_min_rating("4"))
            .await;

        let reviews = outcome.reviews().unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].content, "4 stars - couldn't stop watching");
    }

    #[tokio::test]
    async fn test_date_prefix() {
        let mut backend = MockDynamoBackend::new();
        backend
            .expect_query()
            .with(
                eq("MovieReview".to_string()),
                eq(Some("reviewDateIx".to_string())),
                eq("movieId = :pk_val AND begins_with(reviewDate, :sk_val)".to_string()),
                always(),
            )
            .times(1)
            .returning(|_, _, _, _| {
                Ok(QueryOutput::builder()
                    .set_items(Some(seeded_items(1234, |r| r.review_date.starts_with("2023"))))
                    .build())
            });

        let outcome = resolver(backend)
            .resolve(&ReviewLookup::for_movie("1234").with_token("2023"))
            .await;

        assert_eq!(outcome.reviews().map(<[Review]>::len), Some(3));
    }

    #[tokio::test]
    async fn test_bad_request_makes_no_store_call() {
        // No expectations: any backend call would panic.
        let resolver = resolver(MockDynamoBackend::new());

        let outcome = resolver.resolve(&ReviewLookup::default()).await;
        assert!(matches!(
            outcome,
            ReviewOutcome::BadRequest(ResolveError::MissingOrInvalidMovieId(None))
        ));

        let outcome = resolver
            .resolve(&ReviewLookup::for_movie("1234").with_token(""))
            .await;
        assert!(matches!(
            outcome,
            ReviewOutcome::BadRequest(ResolveError::MissingDisambiguator { .. })
        ));
    }

    #[tokio::test]
    async fn test_store_failure_is_not_retried() {
        let mut backend = MockDynamoBackend::new();
        backend
            .expect_query()
            .times(1)
            .returning(|_, _, _, _| Err(SdkError::timeout_error("throttled")));

        let outcome = resolver(backend)
            .resolve(&ReviewLookup::for_movie("1234"))
            .await;

        assert!(matches!(outcome, ReviewOutcome::StoreFailure(_)));
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let mut backend = MockDynamoBackend::new();
        backend
            .expect_query()
            .times(2)
            .returning(|_, _, _, _| {
                Ok(QueryOutput::builder()
                    .set_items(Some(seeded_items(1234, |_| true)))
                    .build())
            });
        let resolver = resolver(backend);
        let lookup = ReviewLookup::for_movie("1234");

        let first = resolver.resolve(&lookup).await;
        let second = resolver.resolve(&lookup).await;

        assert!(first.reviews().is_some());
        assert_eq!(first.reviews(), second.reviews());
    }
}
