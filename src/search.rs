//! The depth-first fill search (C7): an explicit-stack backtracking search with
//! iterative relaxation of score/entropy thresholds, randomized branching, and
//! cooperative cancellation (`spec.md` §4.6).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::{OsRng, SmallRng};
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};

use crate::action::{Action, ActionLog};
use crate::atom::Word;
use crate::clue::{ClueStructure, Direction, Slot, SlotId};
use crate::grid::{Coord, Grid};
use crate::oracle::{classify, is_solved, Solvability};
use crate::word_index::{FreqScore, WordIndex};

/// Autofill tuning parameters (`spec.md` §4.6).
#[derive(Debug, Clone)]
pub struct AutofillParams {
    pub seconds_limit: u64,
    pub branching_factor_limit: Option<usize>,
    pub entropy: u8,
    pub entropy_decay: f64,
    pub score_min: FreqScore,
    pub score_min_decay: f64,
    pub rollback: bool,
    /// Injectable PRNG seed, resolving the "Global PRNG" open question from
    /// `spec.md` §9 so tests can get deterministic candidate shuffling. `None`
    /// seeds from `OsRng`.
    pub seed: Option<u64>,
}

impl Default for AutofillParams {
    fn default() -> Self {
        AutofillParams {
            seconds_limit: 10,
            branching_factor_limit: None,
            entropy: 0,
            entropy_decay: 1.0,
            score_min: 1,
            score_min_decay: 1.0,
            rollback: true,
            seed: None,
        }
    }
}

/// Outcome of an `autofill` call. All four are normal results, not errors
/// (`spec.md` §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    Solved,
    ExhaustedWithoutSolution,
    Cancelled,
    DeadlineReached,
}

struct StackNode {
    action: Action,
    target_depth: usize,
}

enum DfsIterResult {
    Solved,
    Exhausted,
    Cancelled,
}

/// Sort key for candidate-slot selection: `(row + col, row, across-before-down)`
/// (`spec.md` §4.6 `get_word_fills` step 1).
fn slot_sort_key(slot: &Slot) -> (usize, usize, u8) {
    let direction_rank = match slot.direction {
        Direction::Across => 0,
        Direction::Down => 1,
    };
    (slot.start.row + slot.start.col, slot.start.row, direction_rank)
}

fn pick_unfilled_slot(slots: &[Slot]) -> Option<SlotId> {
    slots
        .iter()
        .filter(|slot| !slot.is_filled())
        .min_by_key(|slot| slot_sort_key(slot))
        .map(|slot| slot.id)
}

/// Candidate generation for the DFS: pick the first unfilled slot (by the sort key
/// above), query the index, shuffle an entropy-proportional prefix, and cap the
/// result at `branching_factor_limit` (`spec.md` §4.6).
fn get_word_fills(
    slots: &[Slot],
    grid: &Grid,
    index: &WordIndex,
    score_min: FreqScore,
    entropy: u8,
    branching_factor_limit: Option<usize>,
    rng: &mut SmallRng,
) -> Vec<Action> {
    let Some(slot_id) = pick_unfilled_slot(slots) else {
        return Vec::new();
    };
    let slot = &slots[slot_id];

    // Cheap pre-check before the full trie descent: if a crossing fill just made
    // one of this slot's letters impossible, skip straight to "no candidates"
    // instead of walking the trie to find that out (`spec.md` §10).
    if !index.quick_feasible(slot) {
        return Vec::new();
    }

    let mut candidates: Vec<Word> = index.get_solutions(slot, score_min);

    let k = ((f64::from(entropy) / 100.0).min(1.0) * candidates.len() as f64).floor() as usize;
    if k > 1 {
        candidates[..k].shuffle(rng);
    }

    let capped: Box<dyn Iterator<Item = &Word>> = match branching_factor_limit {
        Some(limit) => Box::new(candidates.iter().take(limit)),
        None => Box::new(candidates.iter()),
    };

    capped
        .map(|word| Action::fill_blanks(grid, slot.coords.as_slice(), word))
        .collect()
}

fn run_dfs_iteration(
    grid: &mut Grid,
    log: &mut ActionLog,
    clues: &mut ClueStructure,
    index: &WordIndex,
    score_min: FreqScore,
    entropy: u8,
    branching_factor_limit: Option<usize>,
    rng: &mut SmallRng,
    stop: &AtomicBool,
    base_depth: usize,
) -> DfsIterResult {
    let mut stack = vec![StackNode {
        action: Action::Group(Vec::new()),
        target_depth: base_depth + 1,
    }];

    while let Some(node) = stack.pop() {
        if stop.load(Ordering::SeqCst) {
            return DfsIterResult::Cancelled;
        }

        let rollback_target = node.target_depth - 1;
        if log.size() > rollback_target {
            while log.size() > rollback_target {
                if let Some(affected) = log.undo(grid) {
                    for coord in affected {
                        clues.sync_constraint(grid, coord);
                    }
                }
            }
        }

        let affected = log.apply(grid, node.action);
        for coord in &affected {
            clues.sync_constraint(grid, *coord);
        }

        let slots = clues.slots(grid).to_vec();
        if classify(&slots, grid, index, score_min) != Solvability::Solvable {
            continue;
        }

        if is_solved(&slots, index) {
            return DfsIterResult::Solved;
        }

        let current_depth = log.size();
        let candidates = get_word_fills(&slots, grid, index, score_min, entropy, branching_factor_limit, rng);
        for action in candidates.into_iter().rev() {
            stack.push(StackNode {
                action,
                target_depth: current_depth + 1,
            });
        }
    }

    DfsIterResult::Exhausted
}

/// Run autofill synchronously on the calling thread. `stop` is checked
/// cooperatively at the top of every DFS pop; a caller wanting asynchronous
/// behavior should call this from its own spawned thread and retain a clone of
/// `stop` to cancel it.
///
/// # Panics
/// Panics if the preconditions from `spec.md` §4.6 aren't met: the index must be
/// loaded, the grid's barrier pattern must be valid, and the grid must be
/// `Solvable` at `score_min = 1` before the search starts. These are precondition
/// violations per `spec.md` §7, not normal outcomes.
pub fn autofill(
    grid: &mut Grid,
    log: &mut ActionLog,
    clues: &mut ClueStructure,
    index: &WordIndex,
    params: AutofillParams,
    stop: Arc<AtomicBool>,
) -> FillOutcome {
    index.wait_for_load();
    assert!(index.is_loaded(), "autofill precondition violated: index not loaded");
    assert!(
        ClueStructure::is_valid_pattern(grid),
        "autofill precondition violated: invalid barrier pattern"
    );
    {
        let slots = clues.slots(grid).to_vec();
        assert_eq!(
            classify(&slots, grid, index, 1),
            Solvability::Solvable,
            "autofill precondition violated: grid not solvable at score_min=1"
        );
    }

    // Locking preamble: lock every currently filled cell, remembering which ones
    // weren't already locked so they can be released afterward.
    let mut newly_locked = Vec::new();
    for row in 0..grid.height() {
        for col in 0..grid.width() {
            let coord = Coord::new(row, col);
            let cell = grid.get(coord);
            if !cell.is_barrier() && cell.is_filled() && !cell.is_locked() {
                grid.lock_cell(coord, true);
                newly_locked.push(coord);
            }
        }
    }

    let deadline_hit = Arc::new(AtomicBool::new(false));
    let watchdog_done = Arc::new(AtomicBool::new(false));
    let watchdog = {
        let stop = Arc::clone(&stop);
        let deadline_hit = Arc::clone(&deadline_hit);
        let watchdog_done = Arc::clone(&watchdog_done);
        let limit = Duration::from_secs(params.seconds_limit);
        std::thread::spawn(move || {
            let start = Instant::now();
            loop {
                if watchdog_done.load(Ordering::SeqCst) {
                    return;
                }
                if start.elapsed() >= limit {
                    deadline_hit.store(true, Ordering::SeqCst);
                    stop.store(true, Ordering::SeqCst);
                    return;
                }
                std::thread::sleep(Duration::from_millis(20).min(limit.saturating_sub(start.elapsed())));
            }
        })
    };

    let mut rng = SmallRng::seed_from_u64(params.seed.unwrap_or_else(|| OsRng.next_u64()));

    let search_start_depth = log.size();
    let mut score_min = params.score_min;
    let mut entropy = params.entropy;
    let mut outcome = FillOutcome::ExhaustedWithoutSolution;

    while score_min > 0 {
        if stop.load(Ordering::SeqCst) {
            outcome = if deadline_hit.load(Ordering::SeqCst) {
                FillOutcome::DeadlineReached
            } else {
                FillOutcome::Cancelled
            };
            break;
        }

        index.flush_caches();

        let base_depth = log.size();
        match run_dfs_iteration(grid, log, clues, index, score_min, entropy, params.branching_factor_limit, &mut rng, &stop, base_depth) {
            DfsIterResult::Solved => {
                outcome = FillOutcome::Solved;
                break;
            }
            DfsIterResult::Cancelled => {
                outcome = if deadline_hit.load(Ordering::SeqCst) {
                    FillOutcome::DeadlineReached
                } else {
                    FillOutcome::Cancelled
                };
                break;
            }
            DfsIterResult::Exhausted => {
                if params.rollback {
                    log.roll_back_to(grid, search_start_depth);
                }
            }
        }

        score_min = ((f64::from(score_min) * params.score_min_decay).floor() as i64).max(0) as FreqScore;
        entropy = ((f64::from(entropy) * params.entropy_decay).floor() as i64).clamp(0, 100) as u8;

        log::debug!("autofill iteration complete: score_min={score_min} entropy={entropy}");
    }

    watchdog_done.store(true, Ordering::SeqCst);
    let _ = watchdog.join();

    if outcome != FillOutcome::Solved && params.rollback {
        log.roll_back_to(grid, search_start_depth);
        // sync mirrored constraints for every cell the rollback may have touched;
        // cheapest correct approach is to resync the whole grid once.
        for row in 0..grid.height() {
            for col in 0..grid.width() {
                clues.sync_constraint(grid, Coord::new(row, col));
            }
        }
    }

    for coord in newly_locked {
        grid.lock_cell(coord, false);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_dict() -> WordIndex {
        let index = WordIndex::new();
        index.load_from_str(
            "CAT 80\nCAR 80\nBAT 80\nARE 80\nTEA 80\nCAB 80\nACE 80\nABA 80\nTAB 80\nRAT 80\n",
        );
        index
    }

    /// A 3x3 grid has 3 across slots (the rows) and 3 down slots (the columns).
    /// Picking rows "ABC"/"DEF"/"GHI" forces the columns to read "ADG"/"BEH"/"CFI";
    /// seeding exactly those six words (and nothing else of length 3) gives the
    /// search exactly one consistent, duplicate-free solution to find.
    fn word_square_dict() -> WordIndex {
        let index = WordIndex::new();
        index.load_from_str("ABC 80\nDEF 80\nGHI 80\nADG 80\nBEH 80\nCFI 80\n");
        index
    }

    #[test]
    fn s5_autofill_happy_path_on_open_3x3() {
        let mut grid = Grid::new(3, 3);
        let mut log = ActionLog::new();
        let mut clues = ClueStructure::new();
        let index = word_square_dict();

        let params = AutofillParams {
            seconds_limit: 5,
            branching_factor_limit: None,
            entropy: 0,
            entropy_decay: 1.0,
            score_min: 1,
            score_min_decay: 1.0,
            rollback: true,
            seed: Some(42),
        };

        let stop = Arc::new(AtomicBool::new(false));
        let outcome = autofill(&mut grid, &mut log, &mut clues, &index, params, stop);

        assert_eq!(outcome, FillOutcome::Solved);
        let slots = clues.slots(&grid).to_vec();
        assert!(is_solved(&slots, &index));

        let mut seen = std::collections::HashSet::new();
        for slot in &slots {
            assert!(index.contains(&slot.to_word()));
            assert!(seen.insert(slot.to_word()), "no word should repeat across slots");
        }
    }

    #[test]
    fn s6_cancellation_restores_grid_when_rollback_is_set() {
        let mut grid = Grid::new(3, 3);
        let mut log = ActionLog::new();
        let mut clues = ClueStructure::new();
        let index = small_dict();

        let stop = Arc::new(AtomicBool::new(false));
        // Cancel immediately: the DFS should exit on its very first cancellation
        // check and rollback should restore the original (empty) grid.
        stop.store(true, Ordering::SeqCst);

        let params = AutofillParams {
            seconds_limit: 5,
            rollback: true,
            seed: Some(7),
            ..AutofillParams::default()
        };

        let before = grid.clone();
        let outcome = autofill(&mut grid, &mut log, &mut clues, &index, params, stop);

        assert_eq!(outcome, FillOutcome::Cancelled);
        for row in 0..3 {
            for col in 0..3 {
                assert_eq!(grid.get(Coord::new(row, col)), before.get(Coord::new(row, col)));
            }
        }
    }

    #[test]
    fn pick_unfilled_slot_prefers_top_left_across_before_down() {
        let grid = Grid::new(3, 3);
        let mut clues = ClueStructure::new();
        let slots = clues.slots(&grid).to_vec();
        let picked = pick_unfilled_slot(&slots).unwrap();
        assert_eq!(slots[picked].direction, Direction::Across);
        assert_eq!(slots[picked].start, Coord::new(0, 0));
    }

    #[test]
    #[should_panic]
    fn autofill_panics_on_invalid_pattern_precondition() {
        // A single barrier at (0,0) on a 3x3 grid leaves a length-2 run across the
        // rest of row 0, which is never a valid barrier pattern.
        let mut grid = Grid::new(3, 3);
        grid.set_barrier(Coord::new(0, 0), true, false);
        let mut log = ActionLog::new();
        let mut clues = ClueStructure::new();
        let index = small_dict();
        let stop = Arc::new(AtomicBool::new(false));
        let _ = autofill(&mut grid, &mut log, &mut clues, &index, AutofillParams::default(), stop);
    }
}
