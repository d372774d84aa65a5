//! docqa-vector
//!
//! Exact in-memory nearest-neighbour search over chunk embeddings. The index is
//! built once per ingestion and never mutated afterwards.

pub mod flat;

pub use flat::{squared_l2, FlatIndex};
