//! Query Builder: turns a classified lookup into a [`ReviewQuery`].
//!
//! Prefix matching is always `begins_with` on the string form of the sort
//! attribute. Rating and date lookups go to their secondary index; reviewer
//! and unqualified lookups stay in the table's own key space.

use crate::store::{ReviewIndex, ReviewQuery, SortKeyCondition};

use super::{
    classify::{PrefixToken, ReviewMode},
    ResolveError,
};

pub fn build_query(
    movie_id: i64,
    mode: ReviewMode,
    token: Option<&PrefixToken>,
) -> Result<ReviewQuery, ResolveError> {
    let index = match mode {
        ReviewMode::AllReviewsForMovie => {
            return Ok(ReviewQuery {
                movie_id,
                index: ReviewIndex::Primary,
                sort_key: None,
            });
        }
        ReviewMode::ExactOrPrefixByReviewer => ReviewIndex::Primary,
        ReviewMode::FilterByDatePrefix => ReviewIndex::Date,
        ReviewMode::FilterByRatingPrefix => ReviewIndex::Rating,
    };
    let prefix = token.ok_or(ResolveError::MissingDisambiguator {
        parameter: mode.token_parameter().unwrap_or_default(),
    })?;
    Ok(ReviewQuery {
        movie_id,
        index,
        sort_key: Some(SortKeyCondition::BeginsWith(prefix.to_string())),
    })
}
