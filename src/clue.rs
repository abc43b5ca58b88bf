//! The derived clue structure (C4): slot enumeration, numbering, and the
//! coord-to-slot lookup that lets cell edits update mirrored constraints in O(1)
//! without any raw cell<->slot aliasing (see `DESIGN.md` for why this replaces the
//! source's cyclic back-pointers, per `spec.md` §9).

use smallvec::SmallVec;

use crate::atom::Word;
use crate::grid::{Coord, Grid};

pub type SlotId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Across,
    Down,
}

/// A maximal run of >= 3 consecutive open cells in one direction.
#[derive(Debug, Clone)]
pub struct Slot {
    pub id: SlotId,
    pub direction: Direction,
    pub start: Coord,
    pub length: usize,
    pub coords: SmallVec<[Coord; 8]>,
    pub number: u32,
    constraint: Word,
}

impl Slot {
    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.constraint.is_complete()
    }

    #[must_use]
    pub fn constraint(&self) -> &Word {
        &self.constraint
    }

    /// True iff every cell in the slot is locked and non-empty.
    #[must_use]
    pub fn is_locked(&self, grid: &Grid) -> bool {
        self.coords
            .iter()
            .all(|&coord| grid.is_locked(coord) && grid.is_filled(coord))
    }

    /// The slot's current contents as a (possibly partial) word.
    #[must_use]
    pub fn to_word(&self) -> Word {
        self.constraint.clone()
    }
}

#[derive(Debug, Clone, Copy)]
struct CoordSlotRef {
    slot_id: SlotId,
    position: usize,
}

/// Sentinel meaning "this cell starts no slot".
const NO_NUMBER: u32 = 0;

/// Derived slot structure: owned by the engine facade, rebuilt lazily whenever a
/// barrier or dimension edit has set `dirty`.
#[derive(Debug, Default)]
pub struct ClueStructure {
    slots: Vec<Slot>,
    number: Vec<Vec<u32>>,
    starts_at: Vec<Vec<SmallVec<[SlotId; 2]>>>,
    coord_to_slots: Vec<Vec<SmallVec<[CoordSlotRef; 2]>>>,
    dirty: bool,
}

/// One maximal run of `true` values along a 1-D line, as `(start_index, length)`.
fn scan_runs<F: Fn(usize) -> bool>(open: F, n: usize) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut i = 0;
    while i < n {
        if !open(i) {
            i += 1;
            continue;
        }
        let start = i;
        while i < n && open(i) {
            i += 1;
        }
        runs.push((start, i - start));
    }
    runs
}

impl ClueStructure {
    #[must_use]
    pub fn new() -> ClueStructure {
        ClueStructure {
            slots: Vec::new(),
            number: Vec::new(),
            starts_at: Vec::new(),
            coord_to_slots: Vec::new(),
            dirty: true,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn ensure_fresh(&mut self, grid: &Grid) {
        if self.dirty {
            self.rebuild(grid);
            self.dirty = false;
        }
    }

    /// All slots, across slots first (in row-major scan order), then down slots (in
    /// column-major scan order). Refreshes first if dirty.
    pub fn slots(&mut self, grid: &Grid) -> &[Slot] {
        self.ensure_fresh(grid);
        &self.slots
    }

    pub fn slot(&mut self, grid: &Grid, id: SlotId) -> &Slot {
        self.ensure_fresh(grid);
        &self.slots[id]
    }

    pub fn clue_number(&mut self, grid: &Grid, coord: Coord) -> Option<u32> {
        self.ensure_fresh(grid);
        match self.number[coord.row][coord.col] {
            NO_NUMBER => None,
            n => Some(n),
        }
    }

    pub fn slots_starting_at(&mut self, grid: &Grid, coord: Coord) -> &[SlotId] {
        self.ensure_fresh(grid);
        &self.starts_at[coord.row][coord.col]
    }

    /// Every run of exactly length 2 makes the barrier pattern invalid
    /// (`spec.md` §4.3). Computed directly from the grid; does not require or
    /// affect the slot cache.
    #[must_use]
    pub fn is_valid_pattern(grid: &Grid) -> bool {
        for row in 0..grid.height() {
            let runs = scan_runs(|c| !grid.get(Coord::new(row, c)).is_barrier(), grid.width());
            if runs.iter().any(|&(_, len)| len == 2) {
                return false;
            }
        }
        for col in 0..grid.width() {
            let runs = scan_runs(|r| !grid.get(Coord::new(r, col)).is_barrier(), grid.height());
            if runs.iter().any(|&(_, len)| len == 2) {
                return false;
            }
        }
        true
    }

    /// Update the mirrored constraint atom at `coord` in every slot containing it.
    /// Cell-content edits call this instead of dirtying the whole structure
    /// (`spec.md` §4.3 refresh discipline).
    pub fn sync_constraint(&mut self, grid: &Grid, coord: Coord) {
        self.ensure_fresh(grid);
        if grid.get(coord).is_barrier() {
            return;
        }
        let atom = grid.get(coord).contents();
        for ry in self.coord_to_slots[coord.row][coord.col].clone() {
            self.slots[ry.slot_id].constraint.set(ry.position, atom);
        }
    }

    fn rebuild(&mut self, grid: &Grid) {
        let height = grid.height();
        let width = grid.width();

        let mut slots = Vec::new();

        // Across, row-major.
        for row in 0..height {
            let runs = scan_runs(|c| !grid.get(Coord::new(row, c)).is_barrier(), width);
            for (start_col, len) in runs {
                if len < 3 {
                    continue;
                }
                let coords: SmallVec<[Coord; 8]> =
                    (start_col..start_col + len).map(|c| Coord::new(row, c)).collect();
                let constraint = Word::new(
                    coords
                        .iter()
                        .map(|&c| grid.get(c).contents())
                        .collect(),
                );
                slots.push(Slot {
                    id: 0, // assigned below
                    direction: Direction::Across,
                    start: Coord::new(row, start_col),
                    length: len,
                    coords,
                    number: NO_NUMBER,
                    constraint,
                });
            }
        }

        // Down, column-major.
        for col in 0..width {
            let runs = scan_runs(|r| !grid.get(Coord::new(r, col)).is_barrier(), height);
            for (start_row, len) in runs {
                if len < 3 {
                    continue;
                }
                let coords: SmallVec<[Coord; 8]> =
                    (start_row..start_row + len).map(|r| Coord::new(r, col)).collect();
                let constraint = Word::new(
                    coords
                        .iter()
                        .map(|&c| grid.get(c).contents())
                        .collect(),
                );
                slots.push(Slot {
                    id: 0,
                    direction: Direction::Down,
                    start: Coord::new(start_row, col),
                    length: len,
                    coords,
                    number: NO_NUMBER,
                    constraint,
                });
            }
        }

        for (i, slot) in slots.iter_mut().enumerate() {
            slot.id = i;
        }

        let mut starts_at: Vec<Vec<SmallVec<[SlotId; 2]>>> = vec![vec![SmallVec::new(); width]; height];
        for slot in &slots {
            starts_at[slot.start.row][slot.start.col].push(slot.id);
        }

        // Number cells in row-major scan order; a cell that starts at least one slot
        // gets the next number, shared by both directions if both start there.
        let mut number = vec![vec![NO_NUMBER; width]; height];
        let mut next_number = 1u32;
        for row in 0..height {
            for col in 0..width {
                if starts_at[row][col].is_empty() {
                    continue;
                }
                number[row][col] = next_number;
                for &slot_id in &starts_at[row][col] {
                    slots[slot_id].number = next_number;
                }
                next_number += 1;
            }
        }

        let mut coord_to_slots: Vec<Vec<SmallVec<[CoordSlotRef; 2]>>> = vec![vec![SmallVec::new(); width]; height];
        for slot in &slots {
            for (position, &coord) in slot.coords.iter().enumerate() {
                coord_to_slots[coord.row][coord.col].push(CoordSlotRef {
                    slot_id: slot.id,
                    position,
                });
            }
        }

        #[cfg(feature = "check_invariants")]
        for slot in &slots {
            assert_eq!(slot.coords.len(), slot.length, "slot length mismatch for slot {}", slot.id);
            assert_eq!(slot.constraint.len(), slot.length, "constraint length mismatch for slot {}", slot.id);
            for (position, &coord) in slot.coords.iter().enumerate() {
                let back_ref = coord_to_slots[coord.row][coord.col]
                    .iter()
                    .find(|r| r.slot_id == slot.id)
                    .expect("slot must be back-referenced from each of its coords");
                assert_eq!(back_ref.position, position, "coord-to-slot back-reference position mismatch");
            }
        }

        self.slots = slots;
        self.number = number;
        self.starts_at = starts_at;
        self.coord_to_slots = coord_to_slots;
    }
}
