//! Dictionary & puzzle I/O (C10): the persisted puzzle text format from
//! `spec.md` §6. Dictionary parsing lives in `word_index::WordIndex::load_from_str`;
//! this module covers only the puzzle side.

use std::path::Path;

use crate::atom::Atom;
use crate::error::EngineError;
use crate::grid::{Coord, Grid, MAX_DIM, MIN_DIM};

/// Render `grid` in the persisted puzzle format: width line, height line, then one
/// comma-terminated row per line (`-` barrier, ` ` empty, `A`-`Z` letter). Locks and
/// hints are not persisted (documented gap, `spec.md` §6).
#[must_use]
pub fn save_puzzle(grid: &Grid) -> String {
    let mut out = String::new();
    out.push_str(&grid.width().to_string());
    out.push('\n');
    out.push_str(&grid.height().to_string());
    out.push('\n');
    for row in 0..grid.height() {
        for col in 0..grid.width() {
            let cell = grid.get(Coord::new(row, col));
            let token = if cell.is_barrier() {
                '-'
            } else {
                cell.contents().to_letter().unwrap_or(' ')
            };
            out.push(token);
            out.push(',');
        }
        out.push('\n');
    }
    out
}

/// Write `grid` to `path` in the persisted puzzle format.
pub fn save_puzzle_to_file(grid: &Grid, path: &Path) -> Result<(), EngineError> {
    std::fs::write(path, save_puzzle(grid))?;
    Ok(())
}

/// Parse the persisted puzzle format into a fresh `Grid`, restoring barrier and
/// content state. Cell locks and hints are not part of this format and are left
/// at their defaults (unlocked).
pub fn load_puzzle(text: &str) -> Result<Grid, EngineError> {
    let mut lines = text.lines();
    let width = parse_dimension(lines.next(), "width")?;
    let height = parse_dimension(lines.next(), "height")?;

    // A malformed puzzle file's declared dimensions are an I/O-boundary failure,
    // not a programmer precondition violation, so this checks before handing off
    // to `Grid::new` (which panics out of range per `spec.md` §7).
    if !(MIN_DIM..=MAX_DIM).contains(&height) || !(MIN_DIM..=MAX_DIM).contains(&width) {
        return Err(EngineError::InvalidDimensions { height, width });
    }

    let mut grid = Grid::new(height, width);
    for row in 0..height {
        let line = lines.next().ok_or_else(|| EngineError::PuzzleParse {
            reason: format!("missing row {row}: expected {height} rows"),
        })?;
        let tokens: Vec<&str> = line.split(',').collect();
        // Trailing comma after every cell produces one empty trailing element.
        let tokens = match tokens.as_slice() {
            [rest @ .., ""] => rest,
            rest => rest,
        };
        if tokens.len() != width {
            return Err(EngineError::PuzzleParse {
                reason: format!("row {row} has {} cells, expected {width}", tokens.len()),
            });
        }
        for (col, token) in tokens.iter().enumerate() {
            let coord = Coord::new(row, col);
            match *token {
                "-" => {
                    grid.set_barrier(coord, true, false);
                }
                " " | "" => {}
                letter if letter.len() == 1 && letter.chars().next().unwrap().is_ascii_uppercase() => {
                    let atom = Atom::from_letter(letter.chars().next().unwrap()).unwrap();
                    grid.set_cell_raw(coord, atom);
                }
                other => {
                    return Err(EngineError::PuzzleParse {
                        reason: format!("invalid cell token at row {row}, col {col}: {other:?}"),
                    });
                }
            }
        }
    }

    Ok(grid)
}

pub fn load_puzzle_from_file(path: &Path) -> Result<Grid, EngineError> {
    let contents = std::fs::read_to_string(path)?;
    load_puzzle(&contents)
}

fn parse_dimension(line: Option<&str>, name: &str) -> Result<usize, EngineError> {
    let line = line.ok_or_else(|| EngineError::PuzzleParse {
        reason: format!("missing {name} line"),
    })?;
    line.trim().parse().map_err(|_| EngineError::PuzzleParse {
        reason: format!("invalid {name} line: {line:?}"),
    })
}
