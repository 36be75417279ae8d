//! Fixed catalog loaded into a fresh deployment.

use crate::schema::{Movie, Review};

const OVERVIEW: &str = "Every six years, an ancient order of jiu-jitsu fighters joins forces \
to battle a vicious race of alien invaders. But when a celebrated war hero goes down in defeat, \
the fate of the planet and mankind hangs in the balance.";

fn movie(movie_id: i64, original_language: &str, release_date: &str, title: &str) -> Movie {
    Movie {
        movie_id,
        genre_ids: vec![28, 14, 32],
        original_language: original_language.to_string(),
        overview: OVERVIEW.to_string(),
        popularity: 2633.943,
        release_date: release_date.to_string(),
        title: title.to_string(),
        video: false,
        vote_average: 5.9,
        vote_count: 111,
    }
}

fn review(movie_id: i64, reviewer_name: &str, review_date: &str, content: &str) -> Review {
    Review {
        movie_id,
        reviewer_name: reviewer_name.to_string(),
        review_date: review_date.to_string(),
        content: content.to_string(),
    }
}

pub fn movies() -> Vec<Movie> {
    vec![
        movie(1234, "en", "2020-11-20", "Title 1234"),
        movie(4567, "fr", "2020-11-20", "Title 1234"),
        movie(2345, "en", "2020-11-21", "Title 2345"),
        movie(3456, "en", "2020-11-21", "Title 3456"),
    ]
}

pub fn movie_reviews() -> Vec<Review> {
    vec![
        review(1234, "Joe Bloggs", "2023-10-20", "5 stars - amazing"),
        review(1234, "Alice Broggs", "2023-05-03", "4 stars - couldn't stop watching"),
        review(1234, "Joe Cloggs", "2023-11-16", "3 stars - would watch again"),
        review(2345, "Joe Bloggs", "2023-10-23", "2 stars - meh"),
        review(2345, "John Doe", "2023-10-30", "1 star - waste of time and money"),
    ]
}
