//! Core data model: positions, rectangular grids, palette colors, and the
//! plain-text mask format.

use crate::error::{PsldError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// A palette index. Palettes are capped at 256 entries, so a `u8` is always
/// wide enough.
pub type ColorIndex = u8;

/// A single grid cell: a palette index, or empty.
pub type Cell = Option<ColorIndex>;

/// An immutable (x, y) pair, 0-indexed, x across and y down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }
}

/// A rectangular, row-major (y-major) grid of cells.
///
/// Backed by `ndarray::Array2` with shape `(h, w)`, so `cells[[y, x]]` is the
/// natural indexing order; `get`/`set` take `(x, y)` to match the rest of the
/// spec's (x, y) convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    cells: Array2<T>,
}

impl<T: Clone> Grid<T> {
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Grid<T>> {
        let h = rows.len();
        if h == 0 {
            return Err(PsldError::validation("grid must have at least one row"));
        }
        let w = rows[0].len();
        if w == 0 {
            return Err(PsldError::validation("grid rows must have at least one cell"));
        }
        if rows.iter().any(|r| r.len() != w) {
            return Err(PsldError::validation("grid must be rectangular"));
        }
        let mut flat = Vec::with_capacity(w * h);
        for row in rows {
            flat.extend(row);
        }
        let cells = Array2::from_shape_vec((h, w), flat)
            .map_err(|e| PsldError::internal(format!("grid shape error: {e}")))?;
        Ok(Grid { cells })
    }

    pub fn fill(w: usize, h: usize, value: T) -> Result<Grid<T>> {
        if w == 0 || h == 0 {
            return Err(PsldError::validation("grid dimensions must be positive"));
        }
        Ok(Grid {
            cells: Array2::from_elem((h, w), value),
        })
    }

    pub fn w(&self) -> usize {
        self.cells.ncols()
    }

    pub fn h(&self) -> usize {
        self.cells.nrows()
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.w() && y < self.h()
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.cells[[y, x]]
    }

    pub fn try_get(&self, x: usize, y: usize) -> Option<&T> {
        if self.in_bounds(x, y) {
            Some(self.get(x, y))
        } else {
            None
        }
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.cells[[y, x]] = value;
    }

    /// Iterate cells in scan order: y-major, then x-major.
    pub fn iter_positions(&self) -> impl Iterator<Item = Position> + '_ {
        let w = self.w();
        let h = self.h();
        (0..h).flat_map(move |y| (0..w).map(move |x| Position::new(x, y)))
    }

    pub fn rows(&self) -> Vec<Vec<T>> {
        (0..self.h())
            .map(|y| (0..self.w()).map(|x| self.get(x, y).clone()).collect())
            .collect()
    }
}

impl<T: Serialize + Clone> Serialize for Grid<T> {
    /// Serializes as nested rows, matching the Level JSON schema's
    /// `[[int|null, …], …]` shape directly.
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.rows().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de> + Clone> Deserialize<'de> for Grid<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let rows = Vec::<Vec<T>>::deserialize(deserializer)?;
        Grid::from_rows(rows).map_err(serde::de::Error::custom)
    }
}

/// A rectangular color grid: a palette index or empty per cell.
pub type ColorGrid = Grid<Cell>;

/// A rectangular boolean grid distinguishing foreground from background.
pub type Mask = Grid<bool>;

impl ColorGrid {
    /// The occupancy mask of this color grid (non-empty cells are foreground).
    pub fn mask(&self) -> Mask {
        let rows = self
            .rows()
            .into_iter()
            .map(|row| row.into_iter().map(|c| c.is_some()).collect())
            .collect();
        Grid::from_rows(rows).expect("mask derived from a valid grid is always valid")
    }
}

/// Parses the plain-text mask format: rows of equal length using `#` for
/// foreground and `.` for background. Any other character is a validation
/// error, as is a ragged (non-rectangular) set of rows.
pub fn mask_from_text(text: &str) -> Result<Mask> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return Err(PsldError::validation("mask text must have at least one row"));
    }
    let w = lines[0].chars().count();
    let mut rows = Vec::with_capacity(lines.len());
    for line in &lines {
        if line.chars().count() != w {
            return Err(PsldError::validation("mask rows must all be the same width"));
        }
        let mut row = Vec::with_capacity(w);
        for ch in line.chars() {
            match ch {
                '#' => row.push(true),
                '.' => row.push(false),
                other => {
                    return Err(PsldError::validation(format!(
                        "invalid mask character: {other:?}"
                    )))
                }
            }
        }
        rows.push(row);
    }
    Grid::from_rows(rows)
}

/// Renders a mask back to the plain-text format.
pub fn mask_to_text(mask: &Mask) -> String {
    let mut out = String::with_capacity((mask.w() + 1) * mask.h());
    for row in mask.rows() {
        for occ in row {
            out.push(if occ { '#' } else { '.' });
        }
        out.push('\n');
    }
    out
}

/// A `#RRGGBB` color, canonicalized to uppercase on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    pub fn parse(input: &str) -> Result<HexColor> {
        let s = input.trim();
        let s = if let Some(rest) = s.strip_prefix('#') {
            rest
        } else {
            s
        };
        if s.len() != 6 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PsldError::validation(format!(
                "invalid hex color: {input:?} (expected '#RRGGBB')"
            )));
        }
        Ok(HexColor(format!("#{}", s.to_ascii_uppercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        let s = &self.0[1..];
        let r = u8::from_str_radix(&s[0..2], 16).unwrap();
        let g = u8::from_str_radix(&s[2..4], 16).unwrap();
        let b = u8::from_str_radix(&s[4..6], 16).unwrap();
        (r, g, b)
    }
}

impl TryFrom<String> for HexColor {
    type Error = PsldError;
    fn try_from(value: String) -> Result<HexColor> {
        HexColor::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> String {
        value.0
    }
}

/// An ordered palette of colors; length must be in `[1, 256]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<HexColor>", into = "Vec<HexColor>")]
pub struct Palette(Vec<HexColor>);

impl Palette {
    pub fn new(colors: Vec<HexColor>) -> Result<Palette> {
        if colors.is_empty() {
            return Err(PsldError::validation("palette must contain at least one color"));
        }
        if colors.len() > 256 {
            return Err(PsldError::validation("palette must contain at most 256 colors"));
        }
        Ok(Palette(colors))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: ColorIndex) -> Option<&HexColor> {
        self.0.get(index as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HexColor> {
        self.0.iter()
    }
}

impl TryFrom<Vec<HexColor>> for Palette {
    type Error = PsldError;
    fn try_from(value: Vec<HexColor>) -> Result<Palette> {
        Palette::new(value)
    }
}

impl From<Palette> for Vec<HexColor> {
    fn from(value: Palette) -> Vec<HexColor> {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_color_canonicalizes_case_and_prefix() {
        assert_eq!(HexColor::parse("e63946").unwrap().as_str(), "#E63946");
        assert_eq!(HexColor::parse("#e63946").unwrap().as_str(), "#E63946");
        assert_eq!(HexColor::parse("#E63946").unwrap().as_str(), "#E63946");
    }

    #[test]
    fn hex_color_rejects_bad_input() {
        assert!(HexColor::parse("#12345").is_err());
        assert!(HexColor::parse("#GGGGGG").is_err());
        assert!(HexColor::parse("not a color").is_err());
    }

    #[test]
    fn mask_from_text_round_trips() {
        let text = "##.\n.#.\n...\n";
        let mask = mask_from_text(text).unwrap();
        assert_eq!(mask.w(), 3);
        assert_eq!(mask.h(), 3);
        assert_eq!(*mask.get(0, 0), true);
        assert_eq!(*mask.get(2, 0), false);
        assert_eq!(mask_to_text(&mask), text);
    }

    #[test]
    fn mask_from_text_rejects_ragged_rows() {
        assert!(mask_from_text("##\n#\n").is_err());
    }

    #[test]
    fn mask_from_text_rejects_bad_char() {
        assert!(mask_from_text("#x\n..\n").is_err());
    }

    #[test]
    fn grid_rejects_ragged_rows() {
        let rows = vec![vec![Some(0u8), None], vec![Some(1u8)]];
        assert!(ColorGrid::from_rows(rows).is_err());
    }
}
