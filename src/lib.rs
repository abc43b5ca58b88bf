#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::comparison_chain)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::match_on_vec_items)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

//! A crossword construction engine: a cell grid with an undoable edit log, a
//! derived clue structure, a length-partitioned word index, a solvability oracle,
//! and a depth-first fill search, aggregated behind [`engine::Engine`].

pub mod action;
pub mod atom;
pub mod clue;
pub mod engine;
pub mod error;
pub mod grid;
pub mod io;
pub mod oracle;
pub mod search;
pub mod trie;
pub mod word_index;

pub use action::{Action, ActionLog};
pub use atom::{Atom, Word};
pub use clue::{ClueStructure, Direction, Slot, SlotId};
pub use engine::Engine;
pub use error::EngineError;
pub use grid::{Coord, Grid};
pub use oracle::Solvability;
pub use search::{AutofillParams, FillOutcome};
pub use word_index::{FreqScore, WordIndex};

/// Largest supported slot length, matching [`grid::MAX_DIM`] since no slot can
/// exceed a single grid dimension.
pub const MAX_SLOT_LENGTH: usize = grid::MAX_DIM;
