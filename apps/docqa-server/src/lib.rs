//! docqa-server
//!
//! HTTP surface and process wiring for the document QA service.

pub mod app;
pub mod routes;

pub use app::{build_extractors, build_service, init_tracing, is_candidate_file};
pub use routes::router;
