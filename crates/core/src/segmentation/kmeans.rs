//! Feature standardization, k-means clustering and the silhouette score.
//!
//! Everything here works on fixed-size feature vectors so the engine never
//! allocates per point beyond the input copy.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::segmentation_errors::SegmentationError;
use crate::errors::{Error, Result};

/// Recency, frequency, monetary.
pub const RFM_FEATURES: usize = 3;

pub type FeatureVector = [f64; RFM_FEATURES];

fn squared_distance(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn distance(a: &FeatureVector, b: &FeatureVector) -> f64 {
    squared_distance(a, b).sqrt()
}

/// Zero-mean / unit-variance scaling, fitted on one population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardScaler {
    pub means: FeatureVector,
    /// Population standard deviations; a constant feature gets 1.
    pub scales: FeatureVector,
}

impl StandardScaler {
    pub fn fit(points: &[FeatureVector]) -> Self {
        let n = points.len().max(1) as f64;

        let mut means = [0.0; RFM_FEATURES];
        for point in points {
            for (mean, value) in means.iter_mut().zip(point) {
                *mean += value;
            }
        }
        for mean in means.iter_mut() {
            *mean /= n;
        }

        let mut scales = [0.0; RFM_FEATURES];
        for point in points {
            for ((scale, value), mean) in scales.iter_mut().zip(point).zip(&means) {
                *scale += (value - mean) * (value - mean);
            }
        }
        for scale in scales.iter_mut() {
            let std = (*scale / n).sqrt();
            *scale = if std > f64::EPSILON { std } else { 1.0 };
        }

        Self { means, scales }
    }

    pub fn transform(&self, points: &[FeatureVector]) -> Vec<FeatureVector> {
        points
            .iter()
            .map(|point| {
                let mut scaled = [0.0; RFM_FEATURES];
                for (d, out) in scaled.iter_mut().enumerate() {
                    *out = (point[d] - self.means[d]) / self.scales[d];
                }
                scaled
            })
            .collect()
    }
}

/// Lloyd's k-means with k-means++ seeding and several seeded restarts.
#[derive(Debug, Clone)]
pub struct KMeans {
    pub n_clusters: usize,
    pub n_init: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    /// Raw cluster label per point. Labels carry no order.
    pub labels: Vec<usize>,
    pub centroids: Vec<FeatureVector>,
    pub inertia: f64,
    pub iterations: usize,
}

impl KMeans {
    /// Runs `n_init` restarts in parallel and keeps the one with the lowest
    /// inertia. Restart `i` is seeded with `seed + i`, and the earliest restart
    /// wins ties, so the result does not depend on thread scheduling.
    pub fn fit(&self, points: &[FeatureVector]) -> Result<KMeansFit> {
        if points.is_empty() {
            return Err(SegmentationError::InsufficientData.into());
        }
        if self.n_clusters == 0 || self.n_clusters > points.len() {
            return Err(SegmentationError::InvalidClusterCount(self.n_clusters).into());
        }

        let fits: Vec<KMeansFit> = (0..self.n_init.max(1))
            .into_par_iter()
            .map(|init| self.fit_once(points, init as u64))
            .collect();

        let mut best: Option<KMeansFit> = None;
        for fit in fits {
            match &best {
                Some(current) if fit.inertia >= current.inertia => {}
                _ => best = Some(fit),
            }
        }
        let best =
            best.ok_or_else(|| Error::Unexpected("k-means produced no restart".to_string()))?;
        debug!(
            "k-means k={} over {} points: inertia {:.4} after {} iterations",
            self.n_clusters,
            points.len(),
            best.inertia,
            best.iterations
        );
        Ok(best)
    }

    fn fit_once(&self, points: &[FeatureVector], init: u64) -> KMeansFit {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(init));
        let mut centroids = seed_centroids(points, self.n_clusters, &mut rng);
        let mut labels = vec![0usize; points.len()];
        let mut iterations = 0;

        for _ in 0..self.max_iterations.max(1) {
            iterations += 1;
            assign_labels(points, &centroids, &mut labels);
            let updated = update_centroids(points, &mut labels, &centroids);
            let shift = centroids
                .iter()
                .zip(&updated)
                .map(|(old, new)| squared_distance(old, new))
                .fold(0.0, f64::max);
            centroids = updated;
            if shift <= self.tolerance {
                break;
            }
        }

        assign_labels(points, &centroids, &mut labels);
        let inertia = points
            .iter()
            .zip(&labels)
            .map(|(point, &label)| squared_distance(point, &centroids[label]))
            .sum();

        KMeansFit {
            labels,
            centroids,
            inertia,
            iterations,
        }
    }
}

/// k-means++: each further centroid is drawn with probability proportional to
/// its squared distance from the nearest centroid chosen so far.
fn seed_centroids(points: &[FeatureVector], k: usize, rng: &mut StdRng) -> Vec<FeatureVector> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())]);
    let mut nearest: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = nearest.iter().sum();
        let chosen = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut acc = 0.0;
            nearest
                .iter()
                .position(|d| {
                    acc += d;
                    *d > 0.0 && acc >= target
                })
                .or_else(|| nearest.iter().rposition(|d| *d > 0.0))
                .unwrap_or(0)
        } else {
            // Every point sits on a centroid already.
            rng.gen_range(0..points.len())
        };

        let centroid = points[chosen];
        for (d, point) in nearest.iter_mut().zip(points) {
            *d = d.min(squared_distance(point, &centroid));
        }
        centroids.push(centroid);
    }
    centroids
}

/// Nearest centroid per point; ties go to the lower centroid index.
fn assign_labels(points: &[FeatureVector], centroids: &[FeatureVector], labels: &mut [usize]) {
    for (point, label) in points.iter().zip(labels.iter_mut()) {
        let mut best = 0;
        let mut best_distance = f64::INFINITY;
        for (idx, centroid) in centroids.iter().enumerate() {
            let d = squared_distance(point, centroid);
            if d < best_distance {
                best = idx;
                best_distance = d;
            }
        }
        *label = best;
    }
}

/// Moves every centroid to the mean of its points. A cluster left empty is
/// re-seeded with the point farthest from its own centroid, taken from a
/// cluster that has more than one point.
fn update_centroids(
    points: &[FeatureVector],
    labels: &mut [usize],
    previous: &[FeatureVector],
) -> Vec<FeatureVector> {
    let k = previous.len();
    let mut sums = vec![[0.0; RFM_FEATURES]; k];
    let mut counts = vec![0usize; k];
    for (point, &label) in points.iter().zip(labels.iter()) {
        counts[label] += 1;
        for (sum, value) in sums[label].iter_mut().zip(point) {
            *sum += value;
        }
    }

    let mut centroids: Vec<FeatureVector> = sums
        .iter()
        .zip(&counts)
        .zip(previous)
        .map(|((sum, &count), prev)| {
            if count == 0 {
                *prev
            } else {
                let mut mean = *sum;
                for v in mean.iter_mut() {
                    *v /= count as f64;
                }
                mean
            }
        })
        .collect();

    for empty in 0..k {
        if counts[empty] != 0 {
            continue;
        }
        let farthest = points
            .iter()
            .enumerate()
            .filter(|(idx, _)| counts[labels[*idx]] > 1)
            .map(|(idx, point)| (idx, squared_distance(point, &centroids[labels[idx]])))
            .fold(None, |best: Option<(usize, f64)>, (idx, d)| match best {
                Some((_, best_d)) if best_d >= d => best,
                _ => Some((idx, d)),
            });
        if let Some((idx, d)) = farthest {
            if d > 0.0 {
                counts[labels[idx]] -= 1;
                labels[idx] = empty;
                counts[empty] = 1;
                centroids[empty] = points[idx];
            }
        }
    }
    centroids
}

/// Mean silhouette coefficient over all points (Euclidean).
///
/// Points alone in their cluster score 0. Returns `None` unless the labels
/// form between 2 and `n - 1` distinct clusters.
pub fn silhouette_score(points: &[FeatureVector], labels: &[usize]) -> Option<f64> {
    let n = points.len();
    if n != labels.len() {
        return None;
    }
    let distinct: BTreeSet<usize> = labels.iter().copied().collect();
    if distinct.len() < 2 || distinct.len() + 1 > n {
        return None;
    }
    let clusters: Vec<usize> = distinct.into_iter().collect();

    let total: f64 = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut sums = vec![0.0; clusters.len()];
            let mut counts = vec![0usize; clusters.len()];
            for j in 0..n {
                if i == j {
                    continue;
                }
                // `clusters` is sorted, so binary search maps label -> slot.
                if let Ok(slot) = clusters.binary_search(&labels[j]) {
                    sums[slot] += distance(&points[i], &points[j]);
                    counts[slot] += 1;
                }
            }
            let own = match clusters.binary_search(&labels[i]) {
                Ok(slot) => slot,
                Err(_) => return 0.0,
            };
            if counts[own] == 0 {
                return 0.0;
            }
            let a = sums[own] / counts[own] as f64;
            let mut b = f64::INFINITY;
            for slot in 0..clusters.len() {
                if slot != own && counts[slot] > 0 {
                    b = b.min(sums[slot] / counts[slot] as f64);
                }
            }
            let denom = a.max(b);
            if denom > 0.0 && denom.is_finite() {
                (b - a) / denom
            } else {
                0.0
            }
        })
        .sum();

    Some(total / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> Vec<FeatureVector> {
        vec![
            [0.0, 0.0, 0.0],
            [0.1, 0.0, 0.1],
            [0.0, 0.2, 0.0],
            [10.0, 10.0, 10.0],
            [10.1, 9.9, 10.0],
            [9.8, 10.0, 10.2],
        ]
    }

    fn kmeans(k: usize) -> KMeans {
        KMeans {
            n_clusters: k,
            n_init: 10,
            max_iterations: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }

    #[test]
    fn test_scaler_standardizes_each_feature() {
        let points = vec![[1.0, 10.0, 5.0], [3.0, 30.0, 5.0]];
        let scaler = StandardScaler::fit(&points);
        assert_eq!(scaler.means, [2.0, 20.0, 5.0]);
        assert_eq!(scaler.scales, [1.0, 10.0, 1.0]);

        let scaled = scaler.transform(&points);
        assert_eq!(scaled[0], [-1.0, -1.0, 0.0]);
        assert_eq!(scaled[1], [1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_separates_obvious_blobs() {
        let fit = kmeans(2).fit(&two_blobs()).unwrap();
        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_eq!(fit.labels[1], fit.labels[2]);
        assert_eq!(fit.labels[3], fit.labels[4]);
        assert_eq!(fit.labels[4], fit.labels[5]);
        assert_ne!(fit.labels[0], fit.labels[3]);
    }

    #[test]
    fn test_same_seed_same_labels() {
        let points: Vec<FeatureVector> = (0..40)
            .map(|i| {
                let x = i as f64;
                [x % 7.0, (x * 1.3) % 5.0, (x * 0.7) % 11.0]
            })
            .collect();
        let first = kmeans(3).fit(&points).unwrap();
        let second = kmeans(3).fit(&points).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_bad_cluster_counts() {
        assert!(kmeans(0).fit(&two_blobs()).is_err());
        assert!(kmeans(7).fit(&two_blobs()).is_err());
        assert!(kmeans(2).fit(&[]).is_err());
    }

    #[test]
    fn test_identical_points_do_not_panic() {
        let points = vec![[1.0, 1.0, 1.0]; 5];
        let fit = kmeans(3).fit(&points).unwrap();
        assert_eq!(fit.labels.len(), 5);
        assert_eq!(fit.inertia, 0.0);
    }

    #[test]
    fn test_silhouette_well_separated_is_near_one() {
        let points = two_blobs();
        let score = silhouette_score(&points, &[0, 0, 0, 1, 1, 1]).unwrap();
        assert!(score > 0.9, "score was {}", score);
    }

    #[test]
    fn test_silhouette_undefined_outside_two_to_n_minus_one() {
        let points = two_blobs();
        assert!(silhouette_score(&points, &[0; 6]).is_none());
        assert!(silhouette_score(&points, &[0, 1, 2, 3, 4, 5]).is_none());
        assert!(silhouette_score(&points[..2], &[0, 1]).is_none());
    }

    #[test]
    fn test_silhouette_singleton_scores_zero() {
        let points = vec![[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [5.0, 5.0, 5.0]];
        // Point 2 is alone and contributes 0.
        let score = silhouette_score(&points, &[0, 0, 1]).unwrap();
        let a = 1.0;
        let b0 = distance(&points[0], &points[2]);
        let b1 = distance(&points[1], &points[2]);
        let expected = ((b0 - a) / b0 + (b1 - a) / b1) / 3.0;
        assert!((score - expected).abs() < 1e-12);
    }
}
