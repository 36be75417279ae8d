pub mod api;
pub mod config;
pub mod errors;
pub mod logging;
pub mod resolver;
pub mod schema;
pub mod seed;
pub mod store;

pub use api::{ApiRequest, MovieReviewApi};
pub use config::ServiceConfig;
pub use resolver::{ReviewOutcome, ReviewResolver};
pub use store::ReviewStore;
