//! The health check endpoint.
//!
//! `GET /` checks the etcd cluster and answers with HTTP 200 and the JSON health document, or
//! with HTTP 500 and an empty body when the check itself could not be done.
//!
mod functions;

pub use functions::*;
