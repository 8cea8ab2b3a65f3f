//! Piecewise-linear negative-sampling distribution over vocabulary indices,
//! weighted by `frequency^0.75`.
//!
//! This mirrors `std::piecewise_linear_distribution`: knots mark x-positions
//! (vocabulary indices) with an associated density, and sampling first picks
//! an interval between two knots (weighted by trapezoidal area) and then
//! interpolates a continuous position within that interval by inverting its
//! linear density. The result is truncated to the containing index, so any
//! vocabulary index between two knots -- not just the knots themselves -- is
//! reachable.

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::Rng;

use crate::error::{Error, Result};

/// Knot positions (vocabulary indices) and their densities, used to draw a
/// continuous point via piecewise-linear interpolation and truncate it to an
/// index.
pub struct NegSampleDist {
    knots: Vec<usize>,
    densities: Vec<f64>,
    interval_dist: Option<WeightedIndex<f64>>,
}

impl NegSampleDist {
    /// `frequencies[0]` (the end-of-sentence entry) is excluded from sampling,
    /// matching the reference distribution's construction starting at index 1.
    pub fn build(frequencies: &[u64]) -> Result<Self> {
        let mut knots = Vec::new();
        let mut densities = Vec::new();
        let mut prev_freq: u64 = 0;

        for (i, &freq) in frequencies.iter().enumerate().skip(1) {
            let rms = (((prev_freq * prev_freq + freq * freq) as f64) / 2.0).sqrt();
            if (freq as f64) < rms / 1.3 || (freq as f64) > rms * 1.3 {
                knots.push(i);
                densities.push((freq as f64).powf(0.75));
                prev_freq = freq;
            }
        }

        if knots.is_empty() {
            return Err(Error::uninitialized(
                "negative-sampling distribution requires at least one non-EOS word",
            ));
        }

        let interval_dist = if knots.len() > 1 {
            let areas: Vec<f64> = (0..knots.len() - 1)
                .map(|i| (densities[i] + densities[i + 1]) / 2.0 * (knots[i + 1] - knots[i]) as f64)
                .collect();
            Some(
                WeightedIndex::new(&areas)
                    .map_err(|e| Error::UnknownFailure(format!("bad negative-sampling weights: {e}")))?,
            )
        } else {
            None
        };

        Ok(NegSampleDist {
            knots,
            densities,
            interval_dist,
        })
    }

    /// Draws a vocabulary index, continuous across the full `[knots[0],
    /// knots[last]]` range rather than restricted to the knots themselves.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let Some(interval_dist) = &self.interval_dist else {
            return self.knots[0];
        };

        let i = interval_dist.sample(rng);
        let x0 = self.knots[i] as f64;
        let x1 = self.knots[i + 1] as f64;
        let d0 = self.densities[i];
        let d1 = self.densities[i + 1];

        let u: f64 = rng.gen();
        let s = if (d1 - d0).abs() < 1e-12 {
            u
        } else {
            let a = (d1 - d0) / 2.0;
            let b = d0;
            let c = -u * (d0 + d1) / 2.0;
            let discriminant = (b * b - 4.0 * a * c).max(0.0);
            (-b + discriminant.sqrt()) / (2.0 * a)
        };
        let s = s.clamp(0.0, 1.0);

        let x = x0 + s * (x1 - x0);
        (x.floor() as usize).clamp(self.knots[0], self.knots[self.knots.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn samples_cover_non_knot_indices() {
        let freqs: Vec<u64> = (0..50).map(|i| 1000 - i * 10).collect();
        let dist = NegSampleDist::build(&freqs).unwrap();
        let mut rng = thread_rng();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2000 {
            let idx = dist.sample(&mut rng);
            assert!(idx >= 1 && idx < freqs.len());
            seen.insert(idx);
        }
        // a purely knot-restricted distribution could never produce every
        // index in range; interpolation should reach indices between knots.
        assert!(seen.len() > dist.knots.len());
    }

    #[test]
    fn rejects_empty_non_eos_vocabulary() {
        let freqs = vec![1000];
        assert!(NegSampleDist::build(&freqs).is_err());
    }
}
