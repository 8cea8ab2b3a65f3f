//! Document vector composition and nearest-document search.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::error::{Error, Result};
use crate::word_reader::WordReader;

/// Composes a document vector by summing the vectors of its in-vocabulary
/// words and RMS-normalizing the result. Fails with `NoWords` if no token in
/// `doc` resolves to a vector in `word_model`.
pub fn compose(doc: &str, word_model: &HashMap<String, Vec<f32>>, dim: u16, word_delimiters: &str) -> Result<Vec<f32>> {
    let mut accumulator = vec![0f32; dim as usize];
    let mut reader = WordReader::with_defaults(doc.as_bytes(), word_delimiters, "", 0, 0);
    let mut found_any = false;

    while let Some(word) = reader.next_word() {
        if word.is_empty() {
            continue;
        }
        if let Some(vector) = word_model.get(&word) {
            found_any = true;
            for (a, v) in accumulator.iter_mut().zip(vector) {
                *a += v;
            }
        }
    }

    if !found_any {
        return Err(Error::NoWords);
    }

    let sum_sq: f32 = accumulator.iter().map(|x| x * x).sum();
    if sum_sq <= 0.0 {
        return Err(Error::NoWords);
    }
    let rms = (sum_sq / dim as f32).sqrt();
    for x in accumulator.iter_mut() {
        *x /= rms;
    }

    Ok(accumulator)
}

/// Similarity between two unit-normalized vectors, matching the RMS-dot
/// convention used throughout this system's model comparisons.
pub fn similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    if dot > 0.0 {
        (dot / a.len() as f32).sqrt()
    } else {
        0.0
    }
}

struct ScoredId {
    id: u64,
    score: f32,
}
impl PartialEq for ScoredId {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score
    }
}
impl Eq for ScoredId {}
impl PartialOrd for ScoredId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ScoredId {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap by score: we pop the weakest match when over capacity
        other.score.partial_cmp(&self.score).unwrap_or(Ordering::Equal)
    }
}

/// A store of document id -> unit-normalized vector, with nearest-neighbor
/// search and an optional dedup-on-insert check.
#[derive(Default)]
pub struct DocumentStore {
    map: HashMap<u64, Vec<f32>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        DocumentStore { map: HashMap::new() }
    }

    pub fn from_map(map: HashMap<u64, Vec<f32>>) -> Self {
        DocumentStore { map }
    }

    pub fn into_map(self) -> HashMap<u64, Vec<f32>> {
        self.map
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Inserts or replaces `vector` under `id`. When `check_unique` is set,
    /// skips the insert if an existing entry already matches above the
    /// self-match threshold (0.9999).
    pub fn set(&mut self, id: u64, vector: Vec<f32>, check_unique: bool) {
        if check_unique {
            for existing in self.map.values() {
                if similarity(&vector, existing) > 0.9999 {
                    return;
                }
            }
        }
        self.map.insert(id, vector);
    }

    pub fn erase(&mut self, id: u64) {
        self.map.remove(&id);
    }

    /// Returns up to `amount` nearest documents to `vector`, descending by
    /// similarity, excluding self-matches (similarity > 0.9999) and anything
    /// below `min_similarity`.
    pub fn nearest(&self, vector: &[f32], amount: usize, min_similarity: f32) -> Vec<(u64, f32)> {
        let mut heap: BinaryHeap<ScoredId> = BinaryHeap::with_capacity(amount + 1);
        let mut entry_level = 0.0f32;

        for (&id, candidate) in &self.map {
            let score = similarity(vector, candidate);
            if score > 0.9999 || score < min_similarity {
                continue;
            }
            if score > entry_level {
                heap.push(ScoredId { id, score });
                if heap.len() > amount {
                    heap.pop();
                    entry_level = heap.peek().map(|s| s.score).unwrap_or(0.0);
                }
            }
        }

        let mut result: Vec<(u64, f32)> = heap.into_iter().map(|s| (s.id, s.score)).collect();
        result.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> HashMap<String, Vec<f32>> {
        let mut m = HashMap::new();
        m.insert("a".to_string(), vec![1.0, 0.0]);
        m.insert("b".to_string(), vec![0.0, 1.0]);
        m
    }

    #[test]
    fn compose_is_unit_rms_normalized() {
        let v = compose("a b", &model(), 2, " ").unwrap();
        let rms = (v.iter().map(|x| x * x).sum::<f32>() / 2.0).sqrt();
        assert!((rms - 1.0).abs() < 1e-4);
    }

    #[test]
    fn compose_fails_with_no_in_vocabulary_words() {
        let err = compose("z z z", &model(), 2, " ").unwrap_err();
        assert!(matches!(err, Error::NoWords));
    }

    // RMS-normalized axis vectors for dim=2: sum of squares must equal the
    // dimension, not 1, matching the convention shared with model_store/compose.
    fn rms_unit(dim: usize, axis: usize) -> Vec<f32> {
        let mut v = vec![0f32; dim];
        v[axis] = (dim as f32).sqrt();
        v
    }

    #[test]
    fn nearest_excludes_self_match_and_respects_threshold() {
        let mut store = DocumentStore::new();
        store.set(1, rms_unit(2, 0), false);
        store.set(2, rms_unit(2, 1), false);
        let results = store.nearest(&rms_unit(2, 0), 5, 0.0);
        assert!(results.iter().all(|(id, _)| *id != 1));
    }

    #[test]
    fn set_with_check_unique_skips_near_duplicate() {
        let mut store = DocumentStore::new();
        store.set(1, rms_unit(2, 0), true);
        store.set(2, rms_unit(2, 0), true);
        assert_eq!(store.len(), 1);
    }
}
