//! Huffman coding tree over vocabulary frequencies.
//!
//! Built as a tagged-variant arena rather than a shared-pointer class hierarchy:
//! a leaf stores the vocabulary index it encodes, a branch stores the arena
//! indices of its two children plus its own inner-node id.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone)]
pub struct HuffmanData {
    /// Bit path from the root; `false` = left, `true` = right.
    pub code: Vec<bool>,
    /// Inner-node ids visited along the path, same length as `code`.
    pub points: Vec<usize>,
}

enum Node {
    Leaf { index: usize },
    Branch { left: usize, right: usize, id: usize },
}

struct HeapEntry {
    frequency: u64,
    node: usize,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap: reverse the natural order of frequency
        other.frequency.cmp(&self.frequency)
    }
}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.frequency == other.frequency
    }
}
impl Eq for HeapEntry {}

pub struct HuffmanTree {
    tree: Vec<HuffmanData>,
}

impl HuffmanTree {
    pub fn build(frequencies: &[u64]) -> Self {
        let mut arena: Vec<Node> = Vec::with_capacity(frequencies.len() * 2);
        let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::with_capacity(frequencies.len());

        for (index, &freq) in frequencies.iter().enumerate() {
            let node_id = arena.len();
            arena.push(Node::Leaf { index });
            heap.push(HeapEntry {
                frequency: freq,
                node: node_id,
            });
        }

        let mut branch_id: usize = 0;

        while heap.len() > 1 {
            let left = heap.pop().unwrap();
            let right = heap.pop().unwrap();
            let combined = left.frequency + right.frequency;
            let node_id = arena.len();
            arena.push(Node::Branch {
                left: left.node,
                right: right.node,
                id: branch_id,
            });
            branch_id += 1;
            heap.push(HeapEntry {
                frequency: combined,
                node: node_id,
            });
        }

        let root = heap.pop().map(|e| e.node);

        let mut tree = vec![
            HuffmanData {
                code: Vec::new(),
                points: Vec::new(),
            };
            frequencies.len()
        ];

        if let Some(root) = root {
            Self::generate_codes(&arena, root, Vec::new(), Vec::new(), &mut tree);
        }

        HuffmanTree { tree }
    }

    fn generate_codes(
        arena: &[Node],
        node: usize,
        code: Vec<bool>,
        points: Vec<usize>,
        out: &mut [HuffmanData],
    ) {
        match &arena[node] {
            Node::Leaf { index } => {
                out[*index] = HuffmanData { code, points };
            }
            Node::Branch { left, right, id } => {
                let mut left_code = code.clone();
                left_code.push(false);
                let mut left_points = points.clone();
                left_points.push(*id);
                Self::generate_codes(arena, *left, left_code, left_points, out);

                let mut right_code = code;
                right_code.push(true);
                let mut right_points = points;
                right_points.push(*id);
                Self::generate_codes(arena, *right, right_code, right_points, out);
            }
        }
    }

    pub fn huffman_data(&self, index: usize) -> Option<&HuffmanData> {
        self.tree.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_frequent_gets_shortest_code() {
        let freqs = vec![5, 4, 3, 2, 1];
        let tree = HuffmanTree::build(&freqs);
        let lens: Vec<usize> = (0..freqs.len())
            .map(|i| tree.huffman_data(i).unwrap().code.len())
            .collect();
        assert!(lens[0] <= lens[4]);
    }

    #[test]
    fn points_and_code_same_length() {
        let freqs = vec![5, 4, 3, 2, 1];
        let tree = HuffmanTree::build(&freqs);
        for i in 0..freqs.len() {
            let d = tree.huffman_data(i).unwrap();
            assert_eq!(d.code.len(), d.points.len());
            for &p in &d.points {
                assert!(p < freqs.len() - 1 || freqs.len() == 1);
            }
        }
    }

    #[test]
    fn single_entry_tree() {
        let freqs = vec![42];
        let tree = HuffmanTree::build(&freqs);
        let d = tree.huffman_data(0).unwrap();
        assert!(d.code.is_empty());
    }
}
