//! The engine façade (C8): aggregates the grid, action log, clue structure, and
//! word index behind the single boundary external collaborators (a GUI, a CLI)
//! are expected to call through (`spec.md` §6).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::action::{Action, ActionLog};
use crate::atom::{Atom, Word};
use crate::clue::{ClueStructure, Slot, SlotId};
use crate::error::EngineError;
use crate::grid::{Cell, Coord, Grid};
use crate::oracle::Solvability;
use crate::search::{self, AutofillParams, FillOutcome};
use crate::word_index::{FreqScore, WordIndex};

/// The single façade object external collaborators drive (`spec.md` §6). Owns
/// every in-scope component and is single-writer: the caller is responsible for
/// not issuing edits concurrently with an in-flight [`Engine::autofill`] call.
pub struct Engine {
    grid: Grid,
    log: ActionLog,
    clues: ClueStructure,
    index: Arc<WordIndex>,
    hints: HashMap<SlotId, String>,
    stop: Arc<AtomicBool>,
    searching: Arc<AtomicBool>,
}

impl Engine {
    #[must_use]
    pub fn new(height: usize, width: usize) -> Engine {
        Engine {
            grid: Grid::new(height, width),
            log: ActionLog::new(),
            clues: ClueStructure::new(),
            index: Arc::new(WordIndex::new()),
            hints: HashMap::new(),
            stop: Arc::new(AtomicBool::new(false)),
            searching: Arc::new(AtomicBool::new(false)),
        }
    }

    // ---- Edits (push to log) ----

    /// Set a single cell's contents, recording the edit in the action log.
    pub fn set(&mut self, coord: Coord, atom: Atom) {
        let action = Action::set_cell(&self.grid, coord, atom);
        self.apply_logged(action);
    }

    /// Overwrite every cell of `slot_id` with `word`'s letters, recording the edit
    /// as a single undoable group.
    ///
    /// # Panics
    /// Panics if `word.len()` doesn't match the slot's length.
    pub fn set_slot(&mut self, slot_id: SlotId, word: &Word) {
        let coords: Vec<Coord> = self.clues.slot(&self.grid, slot_id).coords.iter().copied().collect();
        assert_eq!(coords.len(), word.len(), "word/slot length mismatch");
        let actions = coords
            .iter()
            .enumerate()
            .map(|(i, &coord)| Action::set_cell(&self.grid, coord, word.get(i)))
            .collect();
        self.apply_logged(Action::Group(actions));
    }

    pub fn clear_slot(&mut self, slot_id: SlotId) {
        let coords: Vec<Coord> = self.clues.slot(&self.grid, slot_id).coords.iter().copied().collect();
        let action = Action::clear_cells(&self.grid, &coords);
        self.apply_logged(action);
    }

    pub fn clear_all_atoms(&mut self) {
        let coords: Vec<Coord> = (0..self.grid.height())
            .flat_map(|row| (0..self.grid.width()).map(move |col| Coord::new(row, col)))
            .filter(|&coord| !self.grid.get(coord).is_barrier())
            .collect();
        let action = Action::clear_cells(&self.grid, &coords);
        self.apply_logged(action);
    }

    #[must_use]
    pub fn undo(&mut self) -> bool {
        match self.log.undo(&mut self.grid) {
            Some(affected) => {
                self.sync_all(&affected);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn redo(&mut self) -> bool {
        match self.log.redo(&mut self.grid) {
            Some(affected) => {
                self.sync_all(&affected);
                true
            }
            None => false,
        }
    }

    fn apply_logged(&mut self, action: Action) {
        let affected = self.log.apply(&mut self.grid, action);
        self.sync_all(&affected);
    }

    fn sync_all(&mut self, coords: &[Coord]) {
        for &coord in coords {
            self.clues.sync_constraint(&self.grid, coord);
        }
    }

    // ---- Non-log edits ----

    pub fn set_barrier(&mut self, coord: Coord, value: bool, enforce_symmetry: bool) {
        self.grid.set_barrier(coord, value, enforce_symmetry);
        self.clues.mark_dirty();
    }

    pub fn toggle_barrier(&mut self, coord: Coord, enforce_symmetry: bool) {
        self.grid.toggle_barrier(coord, enforce_symmetry);
        self.clues.mark_dirty();
    }

    /// # Panics
    /// Panics if the new dimensions are out of range (`Grid::set_dimensions`).
    pub fn set_dimensions(&mut self, height: usize, width: usize) {
        self.grid.set_dimensions(height, width);
        self.clues.mark_dirty();
    }

    pub fn lock_cell(&mut self, coord: Coord, locked: bool) {
        self.grid.lock_cell(coord, locked);
    }

    pub fn toggle_lock(&mut self, coord: Coord) {
        self.grid.toggle_lock(coord);
    }

    // ---- Queries ----

    #[must_use]
    pub fn get(&self, coord: Coord) -> Cell {
        self.grid.get(coord)
    }

    #[must_use]
    pub fn is_in_bounds(&self, coord: Coord) -> bool {
        self.grid.is_in_bounds(coord)
    }

    #[must_use]
    pub fn is_filled(&self, coord: Coord) -> bool {
        self.grid.is_filled(coord)
    }

    #[must_use]
    pub fn is_locked(&self, coord: Coord) -> bool {
        self.grid.is_locked(coord)
    }

    #[must_use]
    pub fn is_valid_pattern(&self) -> bool {
        ClueStructure::is_valid_pattern(&self.grid)
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn slots(&mut self) -> &[Slot] {
        self.clues.slots(&self.grid)
    }

    pub fn slots_starting_at(&mut self, coord: Coord) -> &[SlotId] {
        self.clues.slots_starting_at(&self.grid, coord)
    }

    pub fn clue_number(&mut self, coord: Coord) -> Option<u32> {
        self.clues.clue_number(&self.grid, coord)
    }

    #[must_use]
    pub fn hint(&self, slot_id: SlotId) -> Option<&str> {
        self.hints.get(&slot_id).map(String::as_str)
    }

    pub fn set_hint(&mut self, slot_id: SlotId, text: String) {
        self.hints.insert(slot_id, text);
    }

    /// Classify the current grid state against the index at `score_min`.
    pub fn classify(&mut self, score_min: FreqScore) -> Solvability {
        let slots = self.clues.slots(&self.grid).to_vec();
        crate::oracle::classify(&slots, &self.grid, &self.index, score_min)
    }

    #[must_use]
    pub fn is_solved(&mut self) -> bool {
        let slots = self.clues.slots(&self.grid).to_vec();
        crate::oracle::is_solved(&slots, &self.index)
    }

    // ---- Search ----

    /// Run autofill synchronously on the calling thread (`spec.md` §4.6, §5). The
    /// caller can cancel it from another thread via [`Engine::stop_autofill`].
    pub fn autofill(&mut self, params: AutofillParams) -> FillOutcome {
        self.stop.store(false, Ordering::SeqCst);
        self.searching.store(true, Ordering::SeqCst);
        let outcome = search::autofill(
            &mut self.grid,
            &mut self.log,
            &mut self.clues,
            &self.index,
            params,
            Arc::clone(&self.stop),
        );
        self.searching.store(false, Ordering::SeqCst);
        outcome
    }

    pub fn stop_autofill(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.searching.load(Ordering::SeqCst)
    }

    // ---- Index ----

    pub fn add_entry(&self, word: &Word, freq_score: FreqScore, letter_score_hint: u64) {
        self.index.add_entry(word, freq_score, letter_score_hint);
    }

    #[must_use]
    pub fn contains(&self, word: &Word) -> bool {
        self.index.contains(word)
    }

    #[must_use]
    pub fn freq_score(&self, word: &Word) -> Option<FreqScore> {
        self.index.freq_score(word)
    }

    pub fn get_solutions(&mut self, slot_id: SlotId, score_min: FreqScore) -> Vec<Word> {
        let slot = self.clues.slot(&self.grid, slot_id).clone();
        self.index.get_solutions(&slot, score_min)
    }

    pub fn has_solution(&mut self, slot_id: SlotId, score_min: FreqScore) -> bool {
        let slot = self.clues.slot(&self.grid, slot_id).clone();
        self.index.has_solution(&slot, score_min)
    }

    pub fn load_from_file(&self, path: &Path) -> Result<(), EngineError> {
        self.index.load_from_file(path)
    }

    pub fn load_deferred(&self, path: PathBuf) {
        self.index.load_deferred(path);
    }

    pub fn wait_for_load(&self) {
        self.index.wait_for_load();
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.index.is_loaded()
    }

    pub fn flush_caches(&self) {
        self.index.flush_caches();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_dict(height: usize, width: usize, dict: &str) -> Engine {
        let engine = Engine::new(height, width);
        engine.index.load_from_str(dict);
        engine
    }

    #[test]
    fn set_and_undo_round_trip_through_the_facade() {
        let mut engine = engine_with_dict(5, 5, "CAT 50\n");
        engine.set(Coord::new(0, 0), Atom::from_letter('C').unwrap());
        assert!(engine.is_filled(Coord::new(0, 0)));
        assert!(engine.undo());
        assert!(!engine.is_filled(Coord::new(0, 0)));
        assert!(engine.redo());
        assert!(engine.is_filled(Coord::new(0, 0)));
    }

    #[test]
    fn set_slot_fills_every_cell_and_clear_slot_empties_them() {
        let mut engine = engine_with_dict(5, 5, "CAT 50\n");
        let slot_id = engine.slots()[0].id;
        let word = Word::from_str_strict("CAT");
        engine.set_slot(slot_id, &word);
        assert_eq!(engine.slots()[slot_id].to_word(), word);

        engine.clear_slot(slot_id);
        assert!(engine.slots()[slot_id].to_word().is_partial());
    }

    #[test]
    fn barrier_edit_is_not_logged_and_dirties_slots() {
        let mut engine = engine_with_dict(5, 5, "");
        let before = engine.slots().len();
        engine.set_barrier(Coord::new(0, 0), true, false);
        assert!(!engine.undo(), "barrier edits must not be undoable through the log");
        assert_ne!(engine.slots().len(), before);
    }

    #[test]
    fn autofill_through_the_facade_reaches_solved() {
        let mut engine = engine_with_dict(3, 3, "ABC 80\nDEF 80\nGHI 80\nADG 80\nBEH 80\nCFI 80\n");
        let params = AutofillParams {
            seed: Some(11),
            ..AutofillParams::default()
        };
        assert_eq!(engine.autofill(params), FillOutcome::Solved);
        assert!(engine.is_solved());
        assert!(!engine.is_searching());
    }

    #[test]
    fn hints_are_keyed_by_slot_and_absent_by_default() {
        let mut engine = engine_with_dict(5, 5, "");
        let slot_id = engine.slots()[0].id;
        assert_eq!(engine.hint(slot_id), None);
        engine.set_hint(slot_id, "capital of France".to_string());
        assert_eq!(engine.hint(slot_id), Some("capital of France"));
    }
}
