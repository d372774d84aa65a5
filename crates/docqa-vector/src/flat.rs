use std::cmp::Ordering;

use docqa_core::error::{Error, Result};
use docqa_core::types::SearchHit;

/// Brute-force squared-L2 index. Vectors are stored row-major in one buffer;
/// row `i` is the embedding of chunk `i`.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Build from one vector per chunk. All vectors must share a non-zero dimension.
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self> {
        let first = vectors.first().ok_or(Error::EmptyIndex)?;
        let dim = first.len();
        if dim == 0 {
            return Err(Error::InvalidConfig("embedding dimension must be non-zero".into()));
        }
        let mut data = Vec::with_capacity(dim * vectors.len());
        for v in vectors {
            if v.len() != dim {
                return Err(Error::DimensionMismatch { expected: dim, actual: v.len() });
            }
            data.extend_from_slice(v);
        }
        tracing::debug!(rows = vectors.len(), dim, "built flat index");
        Ok(Self { dim, data })
    }

    pub fn dim(&self) -> usize { self.dim }

    pub fn len(&self) -> usize { self.data.len() / self.dim }

    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    /// The `k` nearest rows in ascending distance; equal distances keep row order.
    /// `k` larger than the index returns every row.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        let mut hits: Vec<SearchHit> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(position, row)| SearchHit { distance: squared_l2(query, row), position })
            .collect();
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        hits.truncate(k);
        Ok(hits)
    }
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
