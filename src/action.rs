//! The reversible action log (C3): invertible atomic and grouped cell edits with a
//! linear history and a redo tail.

use crate::atom::Atom;
use crate::grid::{Coord, Grid};

/// One invertible grid edit.
#[derive(Debug, Clone)]
pub enum Action {
    /// Set `coord`'s contents to `new`; `old` is the value to restore on invert.
    SetCell { coord: Coord, new: Atom, old: Atom },
    /// An ordered list of actions, applied forward and inverted in reverse.
    Group(Vec<Action>),
}

impl Action {
    /// Build a `SetCell` action, snapshotting the cell's *current* contents as the
    /// value to restore on invert (`spec.md` §4.2).
    ///
    /// # Panics
    /// Panics if `coord` is out of bounds or a barrier (via `Grid::get`).
    #[must_use]
    pub fn set_cell(grid: &Grid, coord: Coord, new: Atom) -> Action {
        let old = grid.get(coord).contents();
        Action::SetCell { coord, new, old }
    }

    /// Build a group that fills `coords` with the atoms of `word`, skipping any
    /// position whose current constraint (i.e. current cell contents) is already
    /// non-empty, so the group only fills blanks (`spec.md` §4.2 clue-fill helper).
    ///
    /// # Panics
    /// Panics if `coords.len() != word.len()`.
    #[must_use]
    pub fn fill_blanks(grid: &Grid, coords: &[Coord], word: &crate::atom::Word) -> Action {
        assert_eq!(coords.len(), word.len(), "coords/word length mismatch");
        let mut actions = Vec::with_capacity(coords.len());
        for (i, &coord) in coords.iter().enumerate() {
            let current = grid.get(coord).contents();
            if current.is_empty() {
                actions.push(Action::set_cell(grid, coord, word.get(i)));
            }
        }
        Action::Group(actions)
    }

    /// Build a group that clears every currently-filled cell in `coords` to empty.
    #[must_use]
    pub fn clear_cells(grid: &Grid, coords: &[Coord]) -> Action {
        let actions = coords
            .iter()
            .filter(|&&coord| !grid.get(coord).contents().is_empty())
            .map(|&coord| Action::set_cell(grid, coord, Atom::EMPTY))
            .collect();
        Action::Group(actions)
    }

    /// Every coordinate this action (directly or transitively) writes to.
    #[must_use]
    pub fn affected_coords(&self) -> Vec<Coord> {
        let mut out = Vec::new();
        self.collect_affected_coords(&mut out);
        out
    }

    fn collect_affected_coords(&self, out: &mut Vec<Coord>) {
        match self {
            Action::SetCell { coord, .. } => out.push(*coord),
            Action::Group(actions) => {
                for action in actions {
                    action.collect_affected_coords(out);
                }
            }
        }
    }

    /// Apply this action's forward direction to `grid`.
    pub fn apply(&self, grid: &mut Grid) {
        match self {
            Action::SetCell { coord, new, .. } => grid.set_cell_raw(*coord, *new),
            Action::Group(actions) => {
                for action in actions {
                    action.apply(grid);
                }
            }
        }
    }

    /// Apply this action's inverse to `grid`. Groups invert their inner actions in
    /// reverse order.
    pub fn invert(&self, grid: &mut Grid) {
        match self {
            Action::SetCell { coord, old, .. } => grid.set_cell_raw(*coord, *old),
            Action::Group(actions) => {
                for action in actions.iter().rev() {
                    action.invert(grid);
                }
            }
        }
    }
}

/// Ordered sequence of applied actions plus an index `i` one past the last applied
/// action. `i == len()` means nothing to redo; `i == 0` means nothing to undo.
#[derive(Debug, Default)]
pub struct ActionLog {
    stack: Vec<Action>,
    index: usize,
}

impl ActionLog {
    #[must_use]
    pub fn new() -> ActionLog {
        ActionLog {
            stack: Vec::new(),
            index: 0,
        }
    }

    /// Number of actions currently applied (the position of the redo/undo boundary).
    #[must_use]
    pub fn size(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.index < self.stack.len()
    }

    /// Apply `action` to `grid`, truncating any redo tail, and push it onto the log.
    /// Returns the action's affected coordinates so the caller can sync derived
    /// state (e.g. slot constraints).
    pub fn apply(&mut self, grid: &mut Grid, action: Action) -> Vec<Coord> {
        action.apply(grid);
        let affected = action.affected_coords();
        self.stack.truncate(self.index);
        self.stack.push(action);
        self.index += 1;
        affected
    }

    /// Undo the most recently applied action, if any. Returns its affected
    /// coordinates on success.
    pub fn undo(&mut self, grid: &mut Grid) -> Option<Vec<Coord>> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        let action = &self.stack[self.index];
        action.invert(grid);
        Some(action.affected_coords())
    }

    /// Redo the next undone action, if any. Returns its affected coordinates on
    /// success.
    pub fn redo(&mut self, grid: &mut Grid) -> Option<Vec<Coord>> {
        if self.index == self.stack.len() {
            return None;
        }
        let action = &self.stack[self.index];
        action.apply(grid);
        self.index += 1;
        Some(self.stack[self.index - 1].affected_coords())
    }

    /// Roll `grid` back until `self.size() == target_size`, undoing repeatedly.
    /// Used by the fill search to unwind a DFS branch (`spec.md` §4.6).
    ///
    /// # Panics
    /// Panics if `target_size > self.size()` (rolling *forward* via this method is
    /// not supported; it is strictly an undo-to helper).
    pub fn roll_back_to(&mut self, grid: &mut Grid, target_size: usize) {
        assert!(target_size <= self.size(), "roll_back_to target exceeds current size");
        while self.size() > target_size {
            self.undo(grid);
        }
    }

    /// Truncate the log down to `target_size` entries without touching the grid;
    /// used after a search iteration decides to keep its forward progress but
    /// discard the ability to redo past this point.
    pub fn truncate(&mut self, target_size: usize) {
        assert!(target_size <= self.index, "truncate target exceeds current size");
        self.stack.truncate(target_size);
        self.index = target_size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;

    fn letter(c: char) -> Atom {
        Atom::from_letter(c).unwrap()
    }

    #[test]
    fn undo_redo_chain_matches_s1() {
        let mut grid = Grid::new(5, 5);
        let mut log = ActionLog::new();

        let act = Action::set_cell(&grid, Coord::new(0, 0), letter('C'));
        log.apply(&mut grid, act);
        let act = Action::set_cell(&grid, Coord::new(0, 1), letter('A'));
        log.apply(&mut grid, act);

        log.undo(&mut grid);
        assert!(grid.get(Coord::new(0, 1)).contents().is_empty());
        assert_eq!(grid.get(Coord::new(0, 0)).contents(), letter('C'));

        log.redo(&mut grid);
        assert_eq!(grid.get(Coord::new(0, 1)).contents(), letter('A'));

        // truncates the redo tail
        let act = Action::set_cell(&grid, Coord::new(0, 2), letter('T'));
        log.apply(&mut grid, act);
        assert!(!log.can_redo());

        log.undo(&mut grid);
        log.undo(&mut grid);
        assert_eq!(grid.get(Coord::new(0, 0)).contents(), letter('C'));
        assert!(grid.get(Coord::new(0, 1)).contents().is_empty());
        assert!(grid.get(Coord::new(0, 2)).contents().is_empty());
    }

    #[test]
    fn inversion_restores_original_state_for_any_reachable_grid() {
        let mut grid = Grid::new(4, 4);
        grid.set_cell_raw(Coord::new(1, 1), letter('X'));
        let before = grid.clone();

        let action = Action::set_cell(&grid, Coord::new(1, 1), letter('Y'));
        action.apply(&mut grid);
        action.invert(&mut grid);

        assert_eq!(before.get(Coord::new(1, 1)), grid.get(Coord::new(1, 1)));
    }

    #[test]
    fn group_inverts_in_reverse_order() {
        let mut grid = Grid::new(4, 4);
        let a = Action::set_cell(&grid, Coord::new(0, 0), letter('A'));
        a.apply(&mut grid);
        let b = Action::set_cell(&grid, Coord::new(0, 0), letter('B'));
        b.apply(&mut grid);

        let group = Action::Group(vec![a, b]);
        // group was already applied piecewise above; invert should walk back to empty
        group.invert(&mut grid);
        assert!(grid.get(Coord::new(0, 0)).contents().is_empty());
    }

    #[test]
    fn fill_blanks_skips_prefilled_positions() {
        let mut grid = Grid::new(4, 4);
        grid.set_cell_raw(Coord::new(0, 1), letter('A'));
        let coords = vec![Coord::new(0, 0), Coord::new(0, 1), Coord::new(0, 2)];
        let word = crate::atom::Word::from_str_strict("CAT");

        let action = Action::fill_blanks(&grid, &coords, &word);
        action.apply(&mut grid);

        assert_eq!(grid.get(Coord::new(0, 0)).contents(), letter('C'));
        assert_eq!(grid.get(Coord::new(0, 1)).contents(), letter('A'));
        assert_eq!(grid.get(Coord::new(0, 2)).contents(), letter('T'));

        action.invert(&mut grid);
        // position 1 was never touched by the action, so it must remain filled
        assert_eq!(grid.get(Coord::new(0, 1)).contents(), letter('A'));
        assert!(grid.get(Coord::new(0, 0)).contents().is_empty());
    }

    #[test]
    fn log_correctness_for_arbitrary_sequence() {
        let mut grid = Grid::new(5, 5);
        let mut log = ActionLog::new();
        let coords = [Coord::new(0, 0), Coord::new(1, 1), Coord::new(2, 2)];
        let letters = ['A', 'B', 'C'];

        for (coord, &c) in coords.iter().zip(letters.iter()) {
            let act = Action::set_cell(&grid, *coord, letter(c));
            log.apply(&mut grid, act);
        }
        log.undo(&mut grid);

        // Replaying stack[0..size) from a fresh grid should match current state.
        let mut replay = Grid::new(5, 5);
        for i in 0..log.size() {
            log.stack[i].apply(&mut replay);
        }
        for coord in coords {
            assert_eq!(grid.get(coord), replay.get(coord));
        }
    }
}
