//! Identifier Classifier.
//!
//! Decides, from the raw lookup parameters, which access pattern a review
//! request needs. The path segment after `/reviews/` is overloaded (a reviewer
//! name or a review date fragment), so classification follows a fixed
//! priority, first match wins:
//!
//! 1. `minRating` present       -> [`ReviewMode::FilterByRatingPrefix`]
//! 2. token is a date fragment  -> [`ReviewMode::FilterByDatePrefix`]
//! 3. reviewer name present     -> [`ReviewMode::ExactOrPrefixByReviewer`]
//! 4. otherwise                 -> [`ReviewMode::AllReviewsForMovie`]

use std::{fmt, str::FromStr};

use serde::Deserialize;

use super::ResolveError;

/// Reported for a blank path segment, which may stand for either parameter.
pub const PATH_TOKEN_PARAMETER: &str = "reviewerName/reviewDate";

/// Raw parameters of a review lookup, as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLookup {
    pub movie_id: Option<String>,
    /// Explicit reviewer name (query string).
    pub reviewer_name: Option<String>,
    pub min_rating: Option<String>,
    /// Path segment that is either a reviewer name or a date fragment.
    pub token: Option<String>,
}

impl ReviewLookup {
    pub fn for_movie(movie_id: impl Into<String>) -> Self {
        Self {
            movie_id: Some(movie_id.into()),
            ..Default::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_reviewer_name(mut self, reviewer_name: impl Into<String>) -> Self {
        self.reviewer_name = Some(reviewer_name.into());
        self
    }

    pub fn with_min_rating(mut self, min_rating: impl Into<String>) -> Self {
        self.min_rating = Some(min_rating.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewMode {
    AllReviewsForMovie,
    ExactOrPrefixByReviewer,
    FilterByDatePrefix,
    FilterByRatingPrefix,
}

impl ReviewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewMode::AllReviewsForMovie => "ALL_REVIEWS_FOR_MOVIE",
            ReviewMode::ExactOrPrefixByReviewer => "EXACT_OR_PREFIX_BY_REVIEWER",
            ReviewMode::FilterByDatePrefix => "FILTER_BY_DATE_PREFIX",
            ReviewMode::FilterByRatingPrefix => "FILTER_BY_RATING_PREFIX",
        }
    }

    /// Name of the request parameter that supplies this mode's prefix, if the
    /// mode takes one.
    pub fn token_parameter(&self) -> Option<&'static str> {
        match self {
            ReviewMode::AllReviewsForMovie => None,
            ReviewMode::ExactOrPrefixByReviewer => Some("reviewerName"),
            ReviewMode::FilterByDatePrefix => Some("reviewDate"),
            ReviewMode::FilterByRatingPrefix => Some("minRating"),
        }
    }
}

impl fmt::Display for ReviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewMode {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALL_REVIEWS_FOR_MOVIE" => Ok(ReviewMode::AllReviewsForMovie),
            "EXACT_OR_PREFIX_BY_REVIEWER" => Ok(ReviewMode::ExactOrPrefixByReviewer),
            "FILTER_BY_DATE_PREFIX" => Ok(ReviewMode::FilterByDatePrefix),
            "FILTER_BY_RATING_PREFIX" => Ok(ReviewMode::FilterByRatingPrefix),
            other => Err(ResolveError::UnsupportedMode(other.to_string())),
        }
    }
}

/// String value used in a `begins_with` condition. Numeric values are stored
/// in their decimal string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrefixToken(String);

impl PrefixToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PrefixToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrefixToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PrefixToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

macro_rules! impl_prefix_token_from_numeric {
    ($($type:ty),*) => {
        $(
            impl From<$type> for PrefixToken {
                fn from(value: $type) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

impl_prefix_token_from_numeric!(u8, u16, u32, u64, i32, i64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub movie_id: i64,
    pub mode: ReviewMode,
    pub token: Option<PrefixToken>,
}

pub fn classify(lookup: &ReviewLookup) -> Result<Classification, ResolveError> {
    let movie_id = parse_movie_id(lookup.movie_id.as_deref())?;
    let min_rating = disambiguator(&lookup.min_rating, "minRating")?;
    let token = disambiguator(&lookup.token, PATH_TOKEN_PARAMETER)?;
    let reviewer_name = disambiguator(&lookup.reviewer_name, "reviewerName")?;

    let (mode, token) = match (min_rating, token) {
        (Some(rating), _) => (ReviewMode::FilterByRatingPrefix, Some(rating)),
        (None, Some(t)) if is_date_fragment(t) => (ReviewMode::FilterByDatePrefix, Some(t)),
        (None, token) => match reviewer_name.or(token) {
            Some(name) => (ReviewMode::ExactOrPrefixByReviewer, Some(name)),
            None => (ReviewMode::AllReviewsForMovie, None),
        },
    };

    Ok(Classification {
        movie_id,
        mode,
        token: token.map(PrefixToken::from),
    })
}

pub fn parse_movie_id(raw: Option<&str>) -> Result<i64, ResolveError> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| ResolveError::MissingOrInvalidMovieId(raw.map(str::to_string)))
}

/// A supplied-but-blank token is a caller error rather than an absent one.
fn disambiguator<'a>(
    value: &'a Option<String>,
    parameter: &'static str,
) -> Result<Option<&'a str>, ResolveError> {
    match value.as_deref().map(str::trim) {
        None => Ok(None),
        Some("") => Err(ResolveError::MissingDisambiguator { parameter }),
        Some(v) => Ok(Some(v)),
    }
}

/// Year, year-month or full date: digit groups separated by '-'.
fn is_date_fragment(token: &str) -> bool {
    token
        .split('-')
        .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unqualified_lookup() {
        let c = classify(&ReviewLookup::for_movie("1234")).unwrap();
        assert_eq!(c.movie_id, 1234);
        assert_eq!(c.mode, ReviewMode::AllReviewsForMovie);
        assert_eq!(c.token, None);
    }

    #[test]
    fn test_min_rating_wins() {
        let c = classify(
            &ReviewLookup::for_movie("1234")
                .with_token("Joe")
                .with_reviewer_name("Alice")
                .with_min_rating("3"),
        )
        .unwrap();
        assert_eq!(c.mode, ReviewMode::FilterByRatingPrefix);
        assert_eq!(c.token, Some(PrefixToken::from("3")));
    }

    #[test]
    fn test_numeric_token_is_date_prefix() {
        for token in ["2023", "2023-10", "2023-10-20"] {
            let c = classify(&ReviewLookup::for_movie("1234").with_token(token)).unwrap();
            assert_eq!(c.mode, ReviewMode::FilterByDatePrefix, "token {token}");
            assert_eq!(c.token, Some(PrefixToken::from(token)));
        }
    }

    #[test]
    fn test_numeric_token_beats_reviewer_name() {
        let c = classify(
            &ReviewLookup::for_movie("1234")
                .with_token("2023")
                .with_reviewer_name("Joe"),
        )
        .unwrap();
        assert_eq!(c.mode, ReviewMode::FilterByDatePrefix);
    }

    #[test]
    fn test_non_numeric_token_is_reviewer() {
        for token in ["Joe", "Joe Bloggs", "2023x", "-2023", "2023--10"] {
            let c = classify(&ReviewLookup::for_movie("1234").with_token(token)).unwrap();
            assert_eq!(c.mode, ReviewMode::ExactOrPrefixByReviewer, "token {token}");
            assert_eq!(c.token, Some(PrefixToken::from(token)));
        }
    }

    #[test]
    fn test_explicit_reviewer_name() {
        let c = classify(&ReviewLookup::for_movie("1234").with_reviewer_name("Alice")).unwrap();
        assert_eq!(c.mode, ReviewMode::ExactOrPrefixByReviewer);
        assert_eq!(c.token, Some(PrefixToken::from("Alice")));

        // Explicit name is preferred over a non-numeric path token.
        let c = classify(
            &ReviewLookup::for_movie("1234")
                .with_token("Joe")
                .with_reviewer_name("Alice"),
        )
        .unwrap();
        assert_eq!(c.token, Some(PrefixToken::from("Alice")));
    }

    #[test]
    fn test_tokens_are_trimmed() {
        let c = classify(&ReviewLookup::for_movie(" 1234 ").with_token(" Joe ")).unwrap();
        assert_eq!(c.movie_id, 1234);
        assert_eq!(c.token, Some(PrefixToken::from("Joe")));
    }

    #[test]
    fn test_invalid_movie_id_for_every_mode() {
        let lookups = |movie_id: Option<&str>| {
            let base = ReviewLookup {
                movie_id: movie_id.map(str::to_string),
                ..Default::default()
            };
            vec![
                base.clone(),
                base.clone().with_token("Joe"),
                base.clone().with_token("2023"),
                base.clone().with_min_rating("4"),
            ]
        };
        for movie_id in [None, Some(""), Some("abc"), Some("12.5"), Some("1234x")] {
            for lookup in lookups(movie_id) {
                assert_eq!(
                    classify(&lookup),
                    Err(ResolveError::MissingOrInvalidMovieId(
                        movie_id.map(str::to_string)
                    )),
                    "lookup {lookup:?}"
                );
            }
        }
    }

    #[test]
    fn test_blank_disambiguator() {
        assert_eq!(
            classify(&ReviewLookup::for_movie("1234").with_token("  ")),
            Err(ResolveError::MissingDisambiguator {
                parameter: PATH_TOKEN_PARAMETER
            })
        );
        assert_eq!(
            classify(&ReviewLookup::for_movie("1234").with_min_rating("")),
            Err(ResolveError::MissingDisambiguator {
                parameter: "minRating"
            })
        );
    }

    #[test]
    fn test_blank_parameter_rejected_regardless_of_mode() {
        // Blank reviewer name alongside a date token or a rating.
        for lookup in [
            ReviewLookup::for_movie("1234")
                .with_token("2023")
                .with_reviewer_name(""),
            ReviewLookup::for_movie("1234")
                .with_min_rating("4")
                .with_reviewer_name(" "),
        ] {
            assert_eq!(
                classify(&lookup),
                Err(ResolveError::MissingDisambiguator {
                    parameter: "reviewerName"
                }),
                "lookup {lookup:?}"
            );
        }

        assert_eq!(
            classify(&ReviewLookup::for_movie("1234").with_min_rating("4").with_token("")),
            Err(ResolveError::MissingDisambiguator {
                parameter: PATH_TOKEN_PARAMETER
            })
        );
    }

    #[test]
    fn test_mode_round_trips_through_name() {
        for mode in [
            ReviewMode::AllReviewsForMovie,
            ReviewMode::ExactOrPrefixByReviewer,
            ReviewMode::FilterByDatePrefix,
            ReviewMode::FilterByRatingPrefix,
        ] {
            assert_eq!(mode.to_string().parse::<ReviewMode>(), Ok(mode));
        }
        assert_eq!(
            "BY_TITLE".parse::<ReviewMode>(),
            Err(ResolveError::UnsupportedMode("BY_TITLE".to_string()))
        );
    }

    #[test]
    fn test_numeric_prefix_tokens() {
        assert_eq!(PrefixToken::from(4u8).as_str(), "4");
        assert_eq!(PrefixToken::from(2023i64).as_str(), "2023");
    }

    #[test]
    fn test_classification_is_deterministic() {
        let lookup = ReviewLookup::for_movie("1234").with_token("Joe");
        assert_eq!(classify(&lookup), classify(&lookup));
    }
}
