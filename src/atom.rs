//! The 27-symbol alphabet (empty + A..Z) and the `Word` type built on top of it.
//!
//! Every other module in this crate treats cell contents, dictionary entries, and
//! slot constraints as `Word`s, so the ordering and hashing behavior defined here is
//! load-bearing: trie descent, entry sorting, and dedup all rely on it.

use std::cmp::Ordering;
use std::fmt;

/// One symbol from the fixed 27-symbol alphabet: empty (code 0) or a letter A..Z
/// (codes 1..=26).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Atom(u8);

impl Atom {
    /// The wildcard / "no letter yet" symbol.
    pub const EMPTY: Atom = Atom(0);

    /// Build an atom from its stable integer code (0 = empty, 1..=26 = A..Z).
    ///
    /// # Panics
    /// Panics if `code` is out of range; this is a precondition violation, not a
    /// recoverable error (see `spec.md` §7).
    #[must_use]
    pub fn from_code(code: u8) -> Atom {
        assert!(code <= 26, "atom code out of range: {code}");
        Atom(code)
    }

    /// Build a letter atom from an uppercase ASCII letter.
    #[must_use]
    pub fn from_letter(c: char) -> Option<Atom> {
        if c.is_ascii_uppercase() {
            Some(Atom((c as u8) - b'A' + 1))
        } else {
            None
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The uppercase ASCII letter this atom represents, or `None` for the empty atom.
    #[must_use]
    pub fn to_letter(self) -> Option<char> {
        if self.0 == 0 {
            None
        } else {
            Some((b'A' + self.0 - 1) as char)
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_letter() {
            Some(c) => write!(f, "{c}"),
            None => write!(f, "_"),
        }
    }
}

/// An ordered sequence of atoms. Equality and ordering are both length-first: two
/// words of different lengths are never equal, and a shorter word sorts before a
/// longer one regardless of contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Word(Vec<Atom>);

impl Word {
    #[must_use]
    pub fn new(atoms: Vec<Atom>) -> Word {
        Word(atoms)
    }

    /// A word of the given length, entirely empty atoms.
    #[must_use]
    pub fn blank(length: usize) -> Word {
        Word(vec![Atom::EMPTY; length])
    }

    /// Parse a complete word from an uppercase ASCII string.
    ///
    /// # Panics
    /// Panics if any character isn't an uppercase ASCII letter; callers at the
    /// dictionary/puzzle I/O boundary should validate before calling this.
    #[must_use]
    pub fn from_str_strict(s: &str) -> Word {
        Word(
            s.chars()
                .map(|c| Atom::from_letter(c).unwrap_or_else(|| panic!("invalid atom: {c}")))
                .collect(),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn atoms(&self) -> &[Atom] {
        &self.0
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Atom {
        self.0[index]
    }

    pub fn set(&mut self, index: usize, atom: Atom) {
        self.0[index] = atom;
    }

    /// A word is complete iff it contains no empty (wildcard) atoms.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.0.iter().all(|a| !a.is_empty())
    }

    /// A word is partial iff it contains at least one empty (wildcard) atom.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.is_complete()
    }

    /// Does `candidate` (a complete word) satisfy this word's constraints? Both
    /// words must be the same length; non-empty positions in `self` must match
    /// exactly, empty positions match anything.
    #[must_use]
    pub fn matches(&self, candidate: &Word) -> bool {
        self.0.len() == candidate.0.len()
            && self
                .0
                .iter()
                .zip(candidate.0.iter())
                .all(|(constraint, actual)| constraint.is_empty() || constraint == actual)
    }

    /// Number of distinct non-empty atoms in this word.
    #[must_use]
    pub fn distinct_letter_count(&self) -> usize {
        let mut seen = 0u32;
        let mut count = 0usize;
        for atom in &self.0 {
            if atom.is_empty() {
                continue;
            }
            let bit = 1u32 << (atom.code() - 1);
            if seen & bit == 0 {
                seen |= bit;
                count += 1;
            }
        }
        count
    }
}

impl PartialOrd for Word {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Word {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for atom in &self.0 {
            write!(f, "{atom}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_round_trips_through_letter() {
        for c in 'A'..='Z' {
            let atom = Atom::from_letter(c).unwrap();
            assert_eq!(atom.to_letter(), Some(c));
        }
        assert_eq!(Atom::EMPTY.to_letter(), None);
    }

    #[test]
    fn word_ordering_is_length_first() {
        let short = Word::from_str_strict("ZZ");
        let long = Word::from_str_strict("AAA");
        assert!(short < long, "shorter word sorts before longer regardless of contents");
    }

    #[test]
    fn word_equality_requires_same_length_and_atoms() {
        assert_eq!(Word::from_str_strict("CAT"), Word::from_str_strict("CAT"));
        assert_ne!(Word::from_str_strict("CAT"), Word::from_str_strict("CATS"));
        assert_ne!(Word::from_str_strict("CAT"), Word::from_str_strict("DOG"));
    }

    #[test]
    fn matches_treats_empty_atoms_as_wildcards() {
        let mut constraint = Word::blank(3);
        constraint.set(0, Atom::from_letter('C').unwrap());
        constraint.set(2, Atom::from_letter('T').unwrap());
        assert!(constraint.matches(&Word::from_str_strict("CAT")));
        assert!(constraint.matches(&Word::from_str_strict("COT")));
        assert!(!constraint.matches(&Word::from_str_strict("DOT")));
    }

    #[test]
    fn distinct_letter_count() {
        assert_eq!(Word::from_str_strict("PIZZAZZ").distinct_letter_count(), 4);
        assert_eq!(Word::from_str_strict("CAT").distinct_letter_count(), 3);
    }

    #[test]
    fn complete_vs_partial() {
        let complete = Word::from_str_strict("CAT");
        assert!(complete.is_complete());
        assert!(!complete.is_partial());

        let mut partial = Word::blank(3);
        partial.set(0, Atom::from_letter('C').unwrap());
        assert!(!partial.is_complete());
        assert!(partial.is_partial());
    }
}
