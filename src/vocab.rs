//! Frequency-ordered vocabulary construction.

use std::collections::{HashMap, HashSet};

use log::{debug, info};

use crate::word_reader::WordReader;

pub const EOS: &str = "</s>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordEntry {
    pub index: usize,
    pub frequency: u64,
}

pub struct Vocabulary {
    words: HashMap<String, WordEntry>,
    by_index: Vec<String>,
    frequencies: Vec<u64>,
    train_words: u64,
    total_words: u64,
}

/// Invoked with a `0.0..=100.0` percentage while the corpus is scanned.
pub type ProgressCallback<'a> = dyn Fn(f32) + Sync + 'a;
/// Invoked once with `(vocab_size, train_words, total_words)` after construction.
pub type StatsCallback<'a> = dyn Fn(usize, u64, u64) + Sync + 'a;

impl Vocabulary {
    /// Builds a vocabulary from a training corpus, excluding `stop_words` and any
    /// word seen fewer than `min_word_freq` times. The end-of-sentence marker
    /// `</s>` always occupies index 0 with a frequency one greater than the most
    /// frequent surviving word.
    pub fn build(
        train_data: &[u8],
        stop_words_data: Option<&[u8]>,
        word_delimiters: &str,
        end_of_sentence_chars: &str,
        min_word_freq: u64,
        progress: Option<&ProgressCallback>,
        stats: Option<&StatsCallback>,
    ) -> Self {
        let mut stop_words: HashSet<String> = HashSet::new();
        if let Some(data) = stop_words_data {
            let mut reader = WordReader::with_defaults(data, word_delimiters, end_of_sentence_chars, 0, 0);
            while let Some(word) = reader.next_word() {
                if !word.is_empty() {
                    stop_words.insert(word);
                }
            }
        }

        let mut tmp_words: HashMap<String, u64> = HashMap::new();
        let mut total_words: u64 = 0;

        {
            let mut reader = WordReader::with_defaults(train_data, word_delimiters, end_of_sentence_chars, 0, 0);
            let mut progress_offset: usize = 0;
            let report_every = (train_data.len() / 10_000).max(1);
            while let Some(mut word) = reader.next_word() {
                if word.is_empty() {
                    word = EOS.to_string();
                }
                *tmp_words.entry(word).or_insert(0) += 1;
                total_words += 1;

                if let Some(cb) = progress {
                    if reader.offset().saturating_sub(progress_offset) >= report_every {
                        cb(reader.offset() as f32 / train_data.len() as f32 * 100.0);
                        progress_offset = reader.offset();
                    }
                }
            }
        }

        for w in &stop_words {
            tmp_words.remove(w);
        }

        if let Some(freq) = tmp_words.remove(EOS) {
            total_words -= freq;
        }

        let mut words_freq: Vec<(String, u64)> = Vec::new();
        words_freq.push((EOS.to_string(), 0));
        let mut train_words: u64 = 0;
        for (word, freq) in tmp_words.into_iter() {
            if freq >= min_word_freq {
                train_words += freq;
                words_freq.push((word, freq));
            }
        }

        if words_freq.len() > 1 {
            words_freq[1..].sort_by(|a, b| b.1.cmp(&a.1));
            words_freq[0].1 = words_freq[1].1 + 1;
        }

        let mut words = HashMap::with_capacity(words_freq.len());
        let mut by_index = Vec::with_capacity(words_freq.len());
        let mut frequencies = Vec::with_capacity(words_freq.len());
        for (index, (word, freq)) in words_freq.into_iter().enumerate() {
            words.insert(
                word.clone(),
                WordEntry {
                    index,
                    frequency: freq,
                },
            );
            by_index.push(word);
            frequencies.push(freq);
        }

        debug!(
            "vocabulary built: {} words, {} train words, {} total words",
            words.len(),
            train_words,
            total_words
        );
        if let Some(cb) = stats {
            cb(words.len(), train_words, total_words);
        } else {
            info!(
                "vocabulary: {} words, {} train words, {} total words",
                words.len(),
                train_words,
                total_words
            );
        }

        Vocabulary {
            words,
            by_index,
            frequencies,
            train_words,
            total_words,
        }
    }

    pub fn lookup(&self, word: &str) -> Option<WordEntry> {
        self.words.get(word).copied()
    }

    pub fn size(&self) -> usize {
        self.words.len()
    }

    pub fn frequencies(&self) -> &[u64] {
        &self.frequencies
    }

    pub fn words(&self) -> &[String] {
        &self.by_index
    }

    pub fn train_words(&self) -> u64 {
        self.train_words
    }

    pub fn total_words(&self) -> u64 {
        self.total_words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eos_has_index_zero_and_highest_frequency() {
        let corpus = b"a b a b a b a b\n";
        let vocab = Vocabulary::build(corpus, None, " \n", "\n", 1, None, None);
        let eos = vocab.lookup(EOS).unwrap();
        assert_eq!(eos.index, 0);
        assert!(vocab.frequencies()[0] > vocab.frequencies()[1]);
    }

    #[test]
    fn stop_words_are_excluded() {
        let corpus = b"the cat the dog the\n";
        let stop = b"the\n";
        let vocab = Vocabulary::build(corpus, Some(stop), " \n", "\n", 1, None, None);
        assert!(vocab.lookup("the").is_none());
        assert!(vocab.lookup("cat").is_some());
        assert!(vocab.lookup("dog").is_some());
    }

    #[test]
    fn min_freq_filters_rare_words() {
        let corpus = b"a a a a a b\n";
        let vocab = Vocabulary::build(corpus, None, " \n", "\n", 2, None, None);
        assert!(vocab.lookup("a").is_some());
        assert!(vocab.lookup("b").is_none());
    }

    #[test]
    fn indices_are_dense() {
        let corpus = b"a b c a b c\n";
        let vocab = Vocabulary::build(corpus, None, " \n", "\n", 1, None, None);
        let mut expected: Vec<usize> = (0..vocab.size()).collect();
        let mut actual: Vec<usize> = vocab.words().iter().map(|w| vocab.lookup(w).unwrap().index).collect();
        actual.sort_unstable();
        expected.sort_unstable();
        assert_eq!(actual, expected);
    }
}
