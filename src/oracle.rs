//! The solvability oracle (C6): classifies a partial grid against the word index
//! (`spec.md` §4.5).

use std::collections::HashMap;

use crate::clue::Slot;
use crate::grid::Grid;
use crate::word_index::{FreqScore, WordIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solvability {
    Solvable,
    Overdetermined,
    Invalid,
    Duplicate,
    Weak,
}

/// Classify the current state of `slots` against `index` at `score_min`
/// (`spec.md` §4.5). Monotonic in `score_min`: if this returns `Solvable` at `s`,
/// it also returns `Solvable` at every `s' <= s` (see tests).
#[must_use]
pub fn classify(slots: &[Slot], grid: &Grid, index: &WordIndex, score_min: FreqScore) -> Solvability {
    for slot in slots {
        if slot.is_filled() {
            if slot.is_locked(grid) {
                continue;
            }
            let word = slot.to_word();
            match index.freq_score(&word) {
                None => return Solvability::Invalid,
                Some(score) if score < score_min => return Solvability::Weak,
                Some(_) => {}
            }
        } else if !index.quick_feasible(slot) || !index.has_solution(slot, score_min) {
            return Solvability::Overdetermined;
        }
    }

    let mut seen = HashMap::new();
    for slot in slots {
        if !slot.is_filled() {
            continue;
        }
        let word = slot.to_word();
        if seen.insert(word, slot.id).is_some() {
            return Solvability::Duplicate;
        }
    }

    Solvability::Solvable
}

/// True iff every slot is filled and every filled slot's word is present in the
/// index.
#[must_use]
pub fn is_solved(slots: &[Slot], index: &WordIndex) -> bool {
    slots.iter().all(|slot| slot.is_filled() && index.contains(&slot.to_word()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Word;
    use crate::clue::ClueStructure;
    use crate::grid::Coord;
    use crate::word_index::WordIndex;

    fn dict(words: &[&str]) -> WordIndex {
        let index = WordIndex::new();
        let contents: String = words.iter().map(|w| format!("{w} 50\n")).collect();
        index.load_from_str(&contents);
        index
    }

    fn set_row(grid: &mut Grid, row: usize, word: &str) {
        for (c, ch) in word.chars().enumerate() {
            grid.set_cell_raw(Coord::new(row, c), crate::atom::Atom::from_letter(ch).unwrap());
        }
    }

    #[test]
    fn classify_s4_invalid_then_overdetermined() {
        let mut grid = Grid::new(3, 3);
        let mut clues = ClueStructure::new();
        let index = dict(&["CAT"]);

        set_row(&mut grid, 0, "XYZ");
        for coord in [Coord::new(0, 0), Coord::new(0, 1), Coord::new(0, 2)] {
            clues.sync_constraint(&grid, coord);
        }
        let slots = clues.slots(&grid).to_vec();
        assert_eq!(classify(&slots, &grid, &index, 1), Solvability::Invalid);

        let mut grid2 = Grid::new(3, 3);
        let mut clues2 = ClueStructure::new();
        set_row(&mut grid2, 0, "CAT");
        for coord in [Coord::new(0, 0), Coord::new(0, 1), Coord::new(0, 2)] {
            clues2.sync_constraint(&grid2, coord);
        }
        let slots2 = clues2.slots(&grid2).to_vec();
        // No 3-letter down word starting with C/A/T in the dictionary.
        assert_eq!(classify(&slots2, &grid2, &index, 1), Solvability::Overdetermined);
    }

    #[test]
    fn solvability_monotonicity() {
        // Barrier off rows 1-2 entirely so the only slot is the row-0 across run;
        // this isolates the scoring behavior from down-word coincidences.
        let mut grid = Grid::new(3, 5);
        for row in 1..3 {
            for col in 0..5 {
                grid.set_barrier(Coord::new(row, col), true, false);
            }
        }
        let mut clues = ClueStructure::new();
        let index = dict(&["CRANE"]);
        set_row(&mut grid, 0, "CRANE");
        for c in 0..5 {
            clues.sync_constraint(&grid, Coord::new(0, c));
        }
        let slots = clues.slots(&grid).to_vec();
        assert_eq!(slots.len(), 1, "only the row-0 across slot should survive the barriers");

        let high = classify(&slots, &grid, &index, 50);
        if high == Solvability::Solvable {
            assert_eq!(classify(&slots, &grid, &index, 1), Solvability::Solvable);
        }
    }

    #[test]
    fn is_solved_requires_all_slots_filled_and_in_dictionary() {
        let mut grid = Grid::new(3, 3);
        let mut clues = ClueStructure::new();
        let index = dict(&["CAT", "ART", "TEA"]);
        set_row(&mut grid, 0, "CAT");
        for coord in [Coord::new(0, 0), Coord::new(0, 1), Coord::new(0, 2)] {
            clues.sync_constraint(&grid, coord);
        }
        let slots = clues.slots(&grid).to_vec();
        assert!(!is_solved(&slots, &index));
    }
}
