use fractic_server_error::{define_client_error, define_internal_error};

define_internal_error!(StoreCalloutError, "Generic review store error.");
define_internal_error!(
    ItemParsingError,
    "Review store item parsing error: {details}.",
    { details: &str }
);
define_client_error!(
    InvalidReviewKey,
    "Invalid review key: {details}.",
    { details: &str }
);
