use callassist_common::{AssistError, Result};
use ndarray::{Array2, ArrayView1, Axis};

use crate::similarity::l2_normalize;
use crate::types::Neighbor;

/// Exhaustive nearest-neighbor index under squared Euclidean distance
///
/// Row `i` is the vector of record `i`. Rows are unit-normalized on the way
/// in and queries are normalized before comparison, so distances always
/// fall in [0, 4]. There is no way to mutate an index after it is built.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    vectors: Array2<f32>,
}

impl FlatIndex {
    /// Empty index of the given dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            vectors: Array2::zeros((0, dimension)),
        }
    }

    /// Build from vectors in record order
    pub fn build(vectors: Vec<Vec<f32>>, dimension: usize) -> Result<Self> {
        let count = vectors.len();
        let mut data = Vec::with_capacity(count * dimension);

        for vector in vectors {
            if vector.len() != dimension {
                return Err(AssistError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            data.extend(vector);
        }

        Self::from_raw(dimension, count, data)
    }

    /// Build from row-major data as persisted on disk
    pub fn from_raw(dimension: usize, count: usize, data: Vec<f32>) -> Result<Self> {
        if dimension == 0 {
            return Err(AssistError::index("Index dimension cannot be 0"));
        }
        if data.len() != count * dimension {
            return Err(AssistError::consistency(format!(
                "Index data holds {} values, expected {} vectors of dimension {}",
                data.len(),
                count,
                dimension
            )));
        }

        let mut vectors = Array2::from_shape_vec((count, dimension), data)
            .map_err(|e| AssistError::index(format!("Invalid index shape: {}", e)))?;

        for mut row in vectors.axis_iter_mut(Axis(0)) {
            if let Some(slice) = row.as_slice_mut() {
                l2_normalize(slice);
            }
        }

        Ok(Self { vectors })
    }

    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    /// Stored (normalized) vector at `position`
    pub fn vector(&self, position: usize) -> Option<ArrayView1<'_, f32>> {
        (position < self.len()).then(|| self.vectors.row(position))
    }

    /// Row-major copy of the stored vectors
    pub fn to_raw(&self) -> Vec<f32> {
        self.vectors.iter().copied().collect()
    }

    /// The `min(k, len)` closest vectors, closest first
    ///
    /// Equal distances are ordered by position.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension() {
            return Err(AssistError::DimensionMismatch {
                expected: self.dimension(),
                actual: query.len(),
            });
        }

        let mut query = query.to_vec();
        l2_normalize(&mut query);
        let query = ArrayView1::from(&query[..]);

        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .axis_iter(Axis(0))
            .enumerate()
            .map(|(position, row)| {
                let diff = &row - &query;
                Neighbor {
                    position,
                    distance: diff.dot(&diff),
                }
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        neighbors.truncate(k);

        Ok(neighbors)
    }

    /// The single closest vector, or `None` for an empty index
    pub fn nearest(&self, query: &[f32]) -> Result<Option<Neighbor>> {
        Ok(self.search(query, 1)?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::{cosine_similarity, distance_to_similarity, l2_norm};

    fn sample() -> FlatIndex {
        FlatIndex::build(
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 2.0, 0.0],
                vec![0.0, 0.0, 3.0],
                vec![1.0, 1.0, 0.0],
            ],
            3,
        )
        .unwrap()
    }

    #[test]
    fn test_rows_are_normalized() {
        let index = sample();
        assert_eq!(index.len(), 4);
        assert_eq!(index.dimension(), 3);
        for position in 0..index.len() {
            let row = index.vector(position).unwrap().to_vec();
            assert!((l2_norm(&row) - 1.0).abs() < 1e-6);
        }
        assert!(index.vector(4).is_none());
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = sample();
        let results = index.search(&[0.9, 0.1, 0.0], 3).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].position, 0);
        assert_eq!(results[1].position, 3);
        assert!(results[0].distance <= results[1].distance);
        assert!(results[1].distance <= results[2].distance);
    }

    #[test]
    fn test_search_k_larger_than_index() {
        let index = sample();
        assert_eq!(index.search(&[0.0, 1.0, 0.0], 10).unwrap().len(), 4);
    }

    #[test]
    fn test_exact_match_has_zero_distance() {
        let index = sample();
        // Scale does not matter once normalized
        let hit = index.nearest(&[0.0, 0.0, 7.0]).unwrap().unwrap();
        assert_eq!(hit.position, 2);
        assert!(hit.distance.abs() < 1e-6);
    }

    #[test]
    fn test_ties_prefer_lower_position() {
        let index = FlatIndex::build(vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 0.0]], 2).unwrap();
        let hit = index.nearest(&[1.0, 0.0]).unwrap().unwrap();
        assert_eq!(hit.position, 1);
    }

    #[test]
    fn test_empty_index_has_no_nearest() {
        let index = FlatIndex::new(3);
        assert!(index.is_empty());
        assert_eq!(index.nearest(&[1.0, 0.0, 0.0]).unwrap(), None);
        assert!(index.search(&[1.0, 0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = FlatIndex::build(vec![vec![1.0, 0.0], vec![1.0]], 2).unwrap_err();
        assert!(matches!(err, AssistError::DimensionMismatch { expected: 2, actual: 1 }));

        let err = sample().search(&[1.0, 0.0], 1).unwrap_err();
        assert!(err.is_consistency());
    }

    #[test]
    fn test_from_raw_rejects_bad_length() {
        let err = FlatIndex::from_raw(3, 2, vec![0.0; 5]).unwrap_err();
        assert!(err.is_consistency());
    }

    #[test]
    fn test_similarity_equals_cosine_for_unnormalized_input() {
        // Raw vectors with arbitrary norms; the index normalizes both sides
        let raw = vec![
            vec![3.0, -1.0, 0.5, 2.0],
            vec![-0.2, 4.0, 1.0, 0.0],
            vec![0.1, 0.1, 0.1, 9.0],
        ];
        let index = FlatIndex::build(raw.clone(), 4).unwrap();
        let query = vec![1.5, 0.5, -2.0, 3.0];

        for hit in index.search(&query, 3).unwrap() {
            let expected = cosine_similarity(&query, &raw[hit.position]).max(0.0);
            let actual = distance_to_similarity(hit.distance);
            assert!((expected - actual).abs() < 1e-5, "{} vs {}", expected, actual);
        }
    }
}
