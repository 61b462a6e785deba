//! Dominant color extraction by k-means clustering in RGB space.

use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::color::Rgb;
use crate::config::ClusterConfig;

/// One cluster centroid with its share of the sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterShare {
    #[serde(flatten)]
    pub color: Rgb,
    /// Number of samples assigned to this centroid.
    pub size: usize,
    /// Rounded percentage of all samples.
    pub percentage: u8,
}

/// Representative color of a sample set plus every cluster it was chosen from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DominantColor {
    pub color: Rgb,
    pub clusters: Vec<ClusterShare>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    #[error("cannot cluster {samples} samples into {k} clusters")]
    TooFewSamples { samples: usize, k: usize },

    #[error("centroid {index} diverged to a non-finite value")]
    NonFinite { index: usize },
}

/// Raw k-means output: centroids and the number of samples assigned to each.
#[derive(Debug, Clone)]
pub struct Clustering {
    pub centroids: Vec<[f32; 3]>,
    pub sizes: Vec<usize>,
}

/// Reduce `samples` to one representative color.
///
/// Fewer than `k` samples are averaged instead of clustered. A clustering
/// failure also falls back to the mean and is logged, never returned.
/// Returns `None` only for an empty sample.
pub fn dominant_color<R: Rng + ?Sized>(
    samples: &[Rgb],
    k: usize,
    config: &ClusterConfig,
    rng: &mut R,
) -> Option<DominantColor> {
    if samples.is_empty() {
        return None;
    }
    if samples.len() < k || k == 0 {
        return Some(mean_color(samples));
    }

    match kmeans(samples, k, config, rng) {
        Ok(clustering) => Some(summarize(&clustering, samples.len())),
        Err(e) => {
            warn!(error = %e, samples = samples.len(), k, "k-means failed, using mean color");
            Some(mean_color(samples))
        }
    }
}

/// Arithmetic mean as a single cluster holding every sample.
pub fn mean_color(samples: &[Rgb]) -> DominantColor {
    let mut sum = [0f64; 3];
    for s in samples {
        sum[0] += s.r as f64;
        sum[1] += s.g as f64;
        sum[2] += s.b as f64;
    }
    let n = samples.len().max(1) as f64;
    let color = Rgb::from_f32([
        (sum[0] / n) as f32,
        (sum[1] / n) as f32,
        (sum[2] / n) as f32,
    ]);
    DominantColor {
        color,
        clusters: vec![ClusterShare {
            color,
            size: samples.len(),
            percentage: 100,
        }],
    }
}

fn summarize(clustering: &Clustering, total: usize) -> DominantColor {
    // First largest cluster wins ties.
    let mut dominant = 0;
    for (i, size) in clustering.sizes.iter().enumerate() {
        if *size > clustering.sizes[dominant] {
            dominant = i;
        }
    }

    let clusters = clustering
        .centroids
        .iter()
        .zip(&clustering.sizes)
        .map(|(c, &size)| ClusterShare {
            color: Rgb::from_f32(*c),
            size,
            percentage: (size as f32 / total as f32 * 100.0).round() as u8,
        })
        .collect();

    DominantColor {
        color: Rgb::from_f32(clustering.centroids[dominant]),
        clusters,
    }
}

#[inline]
fn squared_distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

fn nearest(point: &[f32; 3], centroids: &[[f32; 3]]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_distance(point, c);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// k-means++ seeding: each new centroid is drawn with probability
/// proportional to its squared distance from the nearest chosen one.
fn seed_centroids<R: Rng + ?Sized>(points: &[[f32; 3]], k: usize, rng: &mut R) -> Vec<[f32; 3]> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())]);

    let mut dist: Vec<f32> = points
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f32 = dist.iter().sum();
        let next = if total > 0.0 && total.is_finite() {
            let mut target = rng.gen_range(0.0..total);
            let mut chosen = points.len() - 1;
            for (i, d) in dist.iter().enumerate() {
                if target < *d {
                    chosen = i;
                    break;
                }
                target -= d;
            }
            chosen
        } else {
            // Every point coincides with a centroid already.
            rng.gen_range(0..points.len())
        };

        let centroid = points[next];
        for (d, p) in dist.iter_mut().zip(points) {
            *d = d.min(squared_distance(p, &centroid));
        }
        centroids.push(centroid);
    }

    centroids
}

/// Lloyd's algorithm with k-means++ initialization.
///
/// Empty clusters keep their previous centroid. Iteration stops once no
/// centroid moves further than `config.tolerance`.
pub fn kmeans<R: Rng + ?Sized>(
    samples: &[Rgb],
    k: usize,
    config: &ClusterConfig,
    rng: &mut R,
) -> Result<Clustering, ClusterError> {
    if k == 0 || samples.len() < k {
        return Err(ClusterError::TooFewSamples {
            samples: samples.len(),
            k,
        });
    }

    let points: Vec<[f32; 3]> = samples.iter().map(|s| s.to_f32()).collect();
    let mut centroids = seed_centroids(&points, k, rng);
    let mut assignments = vec![0usize; points.len()];

    for _ in 0..config.max_iterations.max(1) {
        for (a, p) in assignments.iter_mut().zip(&points) {
            *a = nearest(p, &centroids);
        }

        let mut sums = vec![[0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (a, p) in assignments.iter().zip(&points) {
            sums[*a][0] += p[0] as f64;
            sums[*a][1] += p[1] as f64;
            sums[*a][2] += p[2] as f64;
            counts[*a] += 1;
        }

        let mut shift = 0f32;
        for (i, centroid) in centroids.iter_mut().enumerate() {
            if counts[i] == 0 {
                continue;
            }
            let n = counts[i] as f64;
            let updated = [
                (sums[i][0] / n) as f32,
                (sums[i][1] / n) as f32,
                (sums[i][2] / n) as f32,
            ];
            if updated.iter().any(|v| !v.is_finite()) {
                return Err(ClusterError::NonFinite { index: i });
            }
            shift = shift.max(squared_distance(centroid, &updated).sqrt());
            *centroid = updated;
        }

        if shift <= config.tolerance {
            break;
        }
    }

    let mut sizes = vec![0usize; k];
    for p in &points {
        sizes[nearest(p, &centroids)] += 1;
    }

    Ok(Clustering { centroids, sizes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn small_sample_is_exact_mean() {
        let pixels = [Rgb::new(10, 10, 10), Rgb::new(20, 20, 20)];
        let dominant = dominant_color(&pixels, 3, &ClusterConfig::default(), &mut rng()).unwrap();
        assert_eq!(dominant.color, Rgb::new(15, 15, 15));
        assert_eq!(dominant.clusters.len(), 1);
        assert_eq!(dominant.clusters[0].size, 2);
        assert_eq!(dominant.clusters[0].percentage, 100);
    }

    #[test]
    fn empty_sample_has_no_color() {
        assert!(dominant_color(&[], 3, &ClusterConfig::default(), &mut rng()).is_none());
    }

    #[test]
    fn largest_cluster_wins() {
        let mut pixels = vec![Rgb::new(200, 30, 30); 70];
        pixels.extend(vec![Rgb::new(20, 20, 220); 20]);
        pixels.extend(vec![Rgb::new(240, 240, 240); 10]);

        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let dominant = dominant_color(&pixels, 3, &ClusterConfig::default(), &mut rng).unwrap();
            assert!(dominant.color.distance(&Rgb::new(200, 30, 30)) < 3.0, "seed {seed}");

            let mut shares: Vec<u8> = dominant.clusters.iter().map(|c| c.percentage).collect();
            shares.sort_unstable();
            assert_eq!(shares, vec![10, 20, 70]);
        }
    }

    #[test]
    fn identical_samples_do_not_fail() {
        let pixels = vec![Rgb::new(90, 60, 30); 50];
        let dominant = dominant_color(&pixels, 4, &ClusterConfig::default(), &mut rng()).unwrap();
        assert_eq!(dominant.color, Rgb::new(90, 60, 30));
        let total: usize = dominant.clusters.iter().map(|c| c.size).sum();
        assert_eq!(total, 50);
    }

    #[test]
    fn kmeans_rejects_too_few_samples() {
        let err = kmeans(&[Rgb::new(1, 2, 3)], 2, &ClusterConfig::default(), &mut rng());
        assert!(matches!(err, Err(ClusterError::TooFewSamples { samples: 1, k: 2 })));
    }
}
