//! A prefix tree over complete words of a single length, answering wildcard
//! queries (C5, `spec.md` §4.4.3).
//!
//! Nodes live in an arena (`Vec<TrieNode>`) and children are referenced by index,
//! not raw pointer, so there's no cyclic ownership to reason about. This is the
//! "(b) key trie nodes by arena index" option named in `spec.md` §9's design notes
//! on the cyclic-parent-link defect. Each leaf also stores its own word directly
//! (option "(a)" from the same note), which means queries never need to walk parent
//! links at all; the arena-index approach is kept anyway because it's what makes
//! insertion itself allocation-cheap and keeps the node count bounded by the
//! dictionary.

use crate::atom::{Atom, Word};

type NodeIdx = u32;

#[derive(Debug, Clone)]
struct TrieNode {
    children: [Option<NodeIdx>; 26],
    /// Populated only at leaves (depth == word length); all terminals in a given
    /// trie are at the same depth since every word indexed here has the same
    /// length.
    word: Option<Word>,
}

impl TrieNode {
    fn new() -> TrieNode {
        TrieNode {
            children: [None; 26],
            word: None,
        }
    }
}

/// A prefix tree over words of a fixed length.
#[derive(Debug, Clone)]
pub struct Trie {
    nodes: Vec<TrieNode>,
    word_length: usize,
}

const ROOT: NodeIdx = 0;

impl Trie {
    #[must_use]
    pub fn new(word_length: usize) -> Trie {
        Trie {
            nodes: vec![TrieNode::new()],
            word_length,
        }
    }

    /// Insert a complete word of this trie's length.
    ///
    /// # Panics
    /// Panics if `word.len() != self.word_length` or `word` is partial.
    pub fn insert(&mut self, word: &Word) {
        assert_eq!(word.len(), self.word_length, "word length mismatch");
        assert!(word.is_complete(), "trie only stores complete words");

        let mut cur = ROOT;
        for atom in word.atoms() {
            let child_slot = atom_slot(*atom);
            cur = match self.nodes[cur as usize].children[child_slot] {
                Some(next) => next,
                None => {
                    let new_idx = self.nodes.len() as NodeIdx;
                    self.nodes.push(TrieNode::new());
                    self.nodes[cur as usize].children[child_slot] = Some(new_idx);
                    new_idx
                }
            };
        }
        self.nodes[cur as usize].word = Some(word.clone());
    }

    /// All complete words matching `partial` (non-empty positions must match
    /// exactly, empty positions are wildcards). Order is deterministic but
    /// unspecified (insertion-derived); callers that need a ranking should sort.
    ///
    /// # Panics
    /// Panics if `partial.len() != self.word_length`.
    #[must_use]
    pub fn find(&self, partial: &Word) -> Vec<Word> {
        assert_eq!(partial.len(), self.word_length, "partial length mismatch");
        let mut out = Vec::new();
        self.collect(ROOT, partial, 0, &mut out);
        out
    }

    /// Does any complete word match `partial`? Short-circuits on the first hit.
    ///
    /// # Panics
    /// Panics if `partial.len() != self.word_length`.
    #[must_use]
    pub fn contains(&self, partial: &Word) -> bool {
        assert_eq!(partial.len(), self.word_length, "partial length mismatch");
        self.probe(ROOT, partial, 0)
    }

    fn collect(&self, node_idx: NodeIdx, partial: &Word, pos: usize, out: &mut Vec<Word>) {
        let node = &self.nodes[node_idx as usize];
        if pos == self.word_length {
            if let Some(word) = &node.word {
                out.push(word.clone());
            }
            return;
        }

        let constraint = partial.get(pos);
        if constraint.is_empty() {
            for child in node.children.iter().flatten() {
                self.collect(*child, partial, pos + 1, out);
            }
        } else if let Some(child) = node.children[atom_slot(constraint)] {
            self.collect(child, partial, pos + 1, out);
        }
    }

    fn probe(&self, node_idx: NodeIdx, partial: &Word, pos: usize) -> bool {
        let node = &self.nodes[node_idx as usize];
        if pos == self.word_length {
            return node.word.is_some();
        }

        let constraint = partial.get(pos);
        if constraint.is_empty() {
            node.children
                .iter()
                .flatten()
                .any(|&child| self.probe(child, partial, pos + 1))
        } else {
            node.children[atom_slot(constraint)].is_some_and(|child| self.probe(child, partial, pos + 1))
        }
    }
}

fn atom_slot(atom: Atom) -> usize {
    assert!(!atom.is_empty(), "cannot index a trie child by the empty atom");
    (atom.code() - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(s: &str) -> Word {
        Word::from_str_strict(s)
    }

    fn wildcard(pattern: &str) -> Word {
        let mut word = Word::blank(pattern.len());
        for (i, c) in pattern.chars().enumerate() {
            if c != '_' {
                word.set(i, Atom::from_letter(c).unwrap());
            }
        }
        word
    }

    fn build() -> Trie {
        let mut trie = Trie::new(3);
        for word in ["CAT", "CAR", "BAT"] {
            trie.insert(&w(word));
        }
        trie
    }

    fn sorted(mut words: Vec<Word>) -> Vec<String> {
        words.sort();
        words.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn find_exact_position_constraints() {
        let trie = build();
        assert_eq!(sorted(trie.find(&wildcard("C_T"))), vec!["CAT"]);
        assert_eq!(sorted(trie.find(&wildcard("_A_"))), vec!["BAT", "CAR", "CAT"]);
        assert_eq!(sorted(trie.find(&wildcard("C__"))), vec!["CAR", "CAT"]);
        assert_eq!(sorted(trie.find(&wildcard("___"))), vec!["BAT", "CAR", "CAT"]);
    }

    #[test]
    fn find_returns_empty_for_no_match() {
        let trie = build();
        assert!(trie.find(&wildcard("Z__")).is_empty());
    }

    #[test]
    fn contains_matches_find() {
        let trie = build();
        assert!(trie.contains(&wildcard("C_T")));
        assert!(!trie.contains(&wildcard("Z__")));
    }

    #[test]
    fn trie_correctness_against_brute_force() {
        let words = ["APPLE", "AMPLE", "AXIOM", "BLAME", "APPLY"];
        let mut trie = Trie::new(5);
        for word in words {
            trie.insert(&w(word));
        }

        for pattern in ["A____", "__I__", "_____", "APP__", "ZZZZZ"] {
            let partial = wildcard(pattern);
            let expected: Vec<String> = words
                .iter()
                .filter(|word| partial.matches(&w(word)))
                .map(|s| (*s).to_string())
                .collect();
            let mut actual: Vec<String> = trie.find(&partial).iter().map(ToString::to_string).collect();
            actual.sort();
            let mut expected_sorted = expected;
            expected_sorted.sort();
            assert_eq!(actual, expected_sorted, "mismatch for pattern {pattern}");
        }
    }
}
