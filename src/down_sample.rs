//! Randomized down-sampling of high-frequency words during sentence assembly.

use rand::Rng;

pub struct DownSampler {
    sample_threshold: f32,
    train_words: u64,
    unfrequent_since: u64,
}

impl DownSampler {
    pub fn new(sample_threshold: f32, train_words: u64) -> Self {
        let unfrequent_since = if sample_threshold > 0.0 {
            ((sample_threshold / (1.5 - 0.5 * 5f32.sqrt())) * train_words as f32) as u64
        } else {
            u64::MAX
        };
        DownSampler {
            sample_threshold,
            train_words,
            unfrequent_since,
        }
    }

    /// Returns `true` if a word with the given corpus frequency should be skipped.
    pub fn should_skip<R: Rng + ?Sized>(&self, word_freq: u64, rng: &mut R) -> bool {
        if self.sample_threshold <= 0.0 || word_freq <= self.unfrequent_since {
            return false;
        }
        let z = word_freq as f32 / self.train_words as f32;
        let keep_prob = ((z / self.sample_threshold).sqrt() + 1.0) * self.sample_threshold / z;
        keep_prob < rng.gen::<f32>()
    }
}
