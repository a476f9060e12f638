//! Module matrices and the encoder seam.
//!
//! A [`ModuleMatrix`] is the immutable grid of dark/light modules that both
//! renderers consume. It is produced by a [`MatrixEncoder`]; the default
//! [`QrEncoder`] delegates to the `qrcode` crate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EncodeError;
use crate::finder::{is_finder_zone, FinderCorner};

/// Smallest symbol edge (version 1).
pub const MIN_SYMBOL_SIZE: usize = 21;

/// Error correction level for a QR code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
pub enum EcLevel {
    /// Tolerates ~7% erroneous codewords.
    #[serde(rename = "L")]
    Low,
    /// Tolerates ~15% erroneous codewords.
    #[default]
    #[serde(rename = "M")]
    Medium,
    /// Tolerates ~25% erroneous codewords.
    #[serde(rename = "Q")]
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    #[serde(rename = "H")]
    High,
}

impl EcLevel {
    /// Single-letter name as used in QR literature.
    pub fn letter(self) -> char {
        match self {
            EcLevel::Low => 'L',
            EcLevel::Medium => 'M',
            EcLevel::Quartile => 'Q',
            EcLevel::High => 'H',
        }
    }
}

impl fmt::Display for EcLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl From<EcLevel> for qrcode::EcLevel {
    fn from(level: EcLevel) -> Self {
        match level {
            EcLevel::Low => qrcode::EcLevel::L,
            EcLevel::Medium => qrcode::EcLevel::M,
            EcLevel::Quartile => qrcode::EcLevel::Q,
            EcLevel::High => qrcode::EcLevel::H,
        }
    }
}

/// A square grid of dark and light modules, quiet zone included.
///
/// Instances are immutable after creation. Row 0 is the top edge, column 0 the
/// left edge.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ModuleMatrix {
    /// Edge length of the encoded symbol, without margin. Odd and >= 21.
    symbol_size: usize,
    /// Quiet zone width on each side, in modules.
    margin: usize,
    /// Row-major symbol modules, `symbol_size²` entries.
    modules: Vec<bool>,
}

impl ModuleMatrix {
    /// Wraps a row-major symbol grid and surrounds it with `margin` light
    /// modules on every side.
    pub fn from_symbol(symbol_size: usize, margin: usize, modules: Vec<bool>) -> Result<Self, EncodeError> {
        if symbol_size < MIN_SYMBOL_SIZE || symbol_size % 2 == 0 {
            return Err(EncodeError::MalformedMatrix(format!(
                "symbol size {} must be odd and at least {}",
                symbol_size, MIN_SYMBOL_SIZE
            )));
        }
        if modules.len() != symbol_size * symbol_size {
            return Err(EncodeError::MalformedMatrix(format!(
                "expected {} modules, got {}",
                symbol_size * symbol_size,
                modules.len()
            )));
        }
        Ok(Self {
            symbol_size,
            margin,
            modules,
        })
    }

    /// Builds a matrix from explicit rows; handy for tests and custom encoders.
    pub fn from_rows(rows: &[Vec<bool>], margin: usize) -> Result<Self, EncodeError> {
        let size = rows.len();
        if rows.iter().any(|row| row.len() != size) {
            return Err(EncodeError::MalformedMatrix("rows are not square".to_string()));
        }
        Self::from_symbol(size, margin, rows.concat())
    }

    /// Edge length of the whole grid, margin included.
    pub fn size(&self) -> usize {
        self.symbol_size + 2 * self.margin
    }

    /// Edge length of the encoded symbol, without margin.
    pub fn symbol_size(&self) -> usize {
        self.symbol_size
    }

    pub fn margin(&self) -> usize {
        self.margin
    }

    /// Returns `true` for dark modules. Coordinates in the quiet zone or
    /// outside the grid are light.
    pub fn is_dark(&self, row: usize, col: usize) -> bool {
        match self.symbol_coords(row, col) {
            Some((r, c)) => self.modules[r * self.symbol_size + c],
            None => false,
        }
    }

    /// Returns `true` if the grid coordinate falls inside one of the three
    /// finder zones of the symbol.
    pub fn is_finder_module(&self, row: usize, col: usize) -> bool {
        match self.symbol_coords(row, col) {
            Some((r, c)) => is_finder_zone(r, c, self.symbol_size),
            None => false,
        }
    }

    /// Grid `(row, col)` of the top-left module of a finder zone.
    pub fn finder_origin(&self, corner: FinderCorner) -> (usize, usize) {
        let (row, col) = corner.origin(self.symbol_size);
        (row + self.margin, col + self.margin)
    }

    /// Grid coordinates of dark modules that are not part of a finder zone.
    pub fn data_modules(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let size = self.size();
        (0..size)
            .flat_map(move |row| (0..size).map(move |col| (row, col)))
            .filter(|&(row, col)| self.is_dark(row, col) && !self.is_finder_module(row, col))
    }

    fn symbol_coords(&self, row: usize, col: usize) -> Option<(usize, usize)> {
        let r = row.checked_sub(self.margin)?;
        let c = col.checked_sub(self.margin)?;
        (r < self.symbol_size && c < self.symbol_size).then_some((r, c))
    }
}

/// Turns payload text into a module matrix.
///
/// Failures propagate unchanged; implementations must not retry at a lower
/// error correction level.
pub trait MatrixEncoder {
    fn encode(&self, payload: &str, level: EcLevel, margin: usize) -> Result<ModuleMatrix, EncodeError>;
}

/// Default encoder backed by the `qrcode` crate.
///
/// Picks the smallest version that holds the payload at the requested level.
#[derive(Clone, Copy, Debug, Default)]
pub struct QrEncoder;

impl MatrixEncoder for QrEncoder {
    fn encode(&self, payload: &str, level: EcLevel, margin: usize) -> Result<ModuleMatrix, EncodeError> {
        let code = qrcode::QrCode::with_error_correction_level(payload.as_bytes(), level.into())
            .map_err(|err| match err {
                qrcode::types::QrError::DataTooLong => EncodeError::DataTooLong { level },
                other => EncodeError::Rejected(other.to_string()),
            })?;
        let modules = code
            .to_colors()
            .into_iter()
            .map(|color| color == qrcode::Color::Dark)
            .collect();
        log::debug!(
            "encoded {} bytes at level {} into a {}x{} symbol",
            payload.len(),
            level,
            code.width(),
            code.width()
        );
        ModuleMatrix::from_symbol(code.width(), margin, modules)
    }
}
