//! Vector math shared by the index and the engine
//!
//! Stored and query vectors are unit-normalized before they meet, so squared
//! Euclidean distance and cosine similarity relate exactly as
//! `d = 2 * (1 - cos)`.

/// Euclidean norm
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale `v` to unit length in place; zero vectors are left untouched
pub fn l2_normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > 0.0 && norm.is_finite() {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Cosine similarity between two vectors of equal length
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm = l2_norm(a) * l2_norm(b);
    if norm == 0.0 {
        0.0
    } else {
        dot / norm
    }
}

/// Convert squared distance between unit vectors to a similarity in [0, 1]
///
/// Opposite-direction vectors (distance above 2) clamp to 0.
pub fn distance_to_similarity(distance: f32) -> f32 {
    if !distance.is_finite() {
        return 0.0;
    }
    (1.0 - distance / 2.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_similarity_endpoints() {
        assert_eq!(distance_to_similarity(0.0), 1.0);
        assert_eq!(distance_to_similarity(2.0), 0.0);
        assert_eq!(distance_to_similarity(1.0), 0.5);
        assert_eq!(distance_to_similarity(4.0), 0.0);
        assert_eq!(distance_to_similarity(-1e-7), 1.0);
        assert_eq!(distance_to_similarity(f32::NAN), 0.0);
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-6);

        let mut zero = vec![0.0; 4];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0; 4]);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_distance_identity_for_unit_vectors() {
        let mut a = vec![0.3, -1.2, 2.5, 0.7];
        let mut b = vec![-0.4, 0.9, 1.1, 2.0];
        l2_normalize(&mut a);
        l2_normalize(&mut b);

        let distance: f32 = a.iter().zip(&b).map(|(x, y)| (x - y) * (x - y)).sum();
        let cos = cosine_similarity(&a, &b);
        assert!((distance - 2.0 * (1.0 - cos)).abs() < 1e-5);
    }
}
