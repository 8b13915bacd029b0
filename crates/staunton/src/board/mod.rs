//! # Board — The Rules Collaborator
//!
//! The viewer doesn't know chess. It knows there are 64 [`Cell`]s, that a cell
//! may hold a [`Piece`], and that something implementing [`Board`] can answer
//! "where can this piece go?" and "apply this move". Everything the renderer
//! and controller need from the rules goes through that trait:
//!
//! | Call            | Used by                                   |
//! |-----------------|-------------------------------------------|
//! | `tile`          | picking + opaque passes (what to draw)    |
//! | `moves`         | controller, when a piece is selected      |
//! | `apply_move`    | animation, when a move lands              |
//! | `undo`          | animation, when an undo lands             |
//! | `records`       | undo key, opponent turn detection         |
//! | `is_game_over`  | opponent (stop moving when it's over)     |
//! | `load_fen`      | reset key                                 |
//!
//! None of these fail from the viewer's point of view: an illegal move is a
//! no-op, an empty history makes `undo` a no-op.
//!
//! [`ChessBoard`] is the real implementation, backed by `shakmaty`.

mod chess;

pub use chess::ChessBoard;

use std::fmt;

/// Number of cells on the board.
pub const CELL_COUNT: usize = 64;

/// One of the 64 board positions. Index 0 is a1, 7 is h1, 63 is h8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell(u8);

impl Cell {
    /// Returns `None` for indices outside `0..64`.
    pub fn new(index: u32) -> Option<Self> {
        (index < CELL_COUNT as u32).then_some(Self(index as u8))
    }

    pub fn from_row_column(row: u8, column: u8) -> Option<Self> {
        (row < 8 && column < 8).then_some(Self(row * 8 + column))
    }

    pub fn index(self) -> u32 {
        u32::from(self.0)
    }

    /// Rank, 0 (white's back rank) to 7.
    pub fn row(self) -> u8 {
        self.0 / 8
    }

    /// File, 0 (a) to 7 (h).
    pub fn column(self) -> u8 {
        self.0 % 8
    }

    /// Whether a pawn arriving here promotes.
    pub fn is_terminal_rank(self) -> bool {
        self.row() == 0 || self.row() == 7
    }

    /// Every cell, a1 first.
    pub fn all() -> impl Iterator<Item = Cell> {
        (0..CELL_COUNT as u8).map(Cell)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", char::from(b'a' + self.column()), self.row() + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceColor {
    White,
    Black,
}

impl PieceColor {
    pub fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

/// Closed set of piece types. Doubles as the index into per-kind tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    King,
    Queen,
    Bishop,
    Knight,
    Rook,
    Pawn,
}

impl PieceKind {
    pub const COUNT: usize = 6;

    pub const ALL: [PieceKind; Self::COUNT] = [
        Self::King,
        Self::Queen,
        Self::Bishop,
        Self::Knight,
        Self::Rook,
        Self::Pawn,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: PieceColor,
}

/// A move request. `promotion` is only meaningful for a pawn reaching the
/// terminal rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardMove {
    pub source: Cell,
    pub target: Cell,
    pub promotion: Option<PieceKind>,
}

/// A move that has been applied, as kept in the board's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRecord {
    pub source: Cell,
    pub target: Cell,
}

/// Upper bound on distinct targets for one piece (a queen in the open has 27).
pub const MAX_TARGETS: usize = 32;

/// The legal destinations of the currently selected piece.
///
/// Fixed capacity, no allocation. Pushing a duplicate is ignored so the rules
/// engine can report one entry per promotion choice without the viewer
/// drawing four overlapping tiles.
#[derive(Debug, Clone, Copy)]
pub struct SelectableSet {
    targets: [Cell; MAX_TARGETS],
    len: usize,
}

impl SelectableSet {
    pub const fn new() -> Self {
        Self {
            targets: [Cell(0); MAX_TARGETS],
            len: 0,
        }
    }

    pub fn push(&mut self, target: Cell) {
        if self.contains(target) {
            return;
        }
        if self.len == MAX_TARGETS {
            log::warn!("Selectable set full, dropping target {target}");
            return;
        }
        self.targets[self.len] = target;
        self.len += 1;
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.as_slice().contains(&cell)
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[Cell] {
        &self.targets[..self.len]
    }

    pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        self.as_slice().iter().copied()
    }
}

impl Default for SelectableSet {
    fn default() -> Self {
        Self::new()
    }
}

/// The rules engine as seen by the viewer.
pub trait Board {
    /// The piece on `cell`, if any.
    fn tile(&self, cell: Cell) -> Option<Piece>;

    fn color(&self, cell: Cell) -> Option<PieceColor> {
        self.tile(cell).map(|piece| piece.color)
    }

    fn kind(&self, cell: Cell) -> Option<PieceKind> {
        self.tile(cell).map(|piece| piece.kind)
    }

    /// Fill `out` with the legal targets of the piece on `cell`. `out` is not
    /// cleared first.
    fn moves(&self, out: &mut SelectableSet, cell: Cell);

    /// Apply a move. Illegal moves are ignored.
    fn apply_move(&mut self, mv: BoardMove);

    /// Revert the most recent move. No-op on an empty history.
    fn undo(&mut self);

    /// Applied moves, oldest first.
    fn records(&self) -> &[MoveRecord];

    fn is_game_over(&self) -> bool;

    /// Return to the configured starting position and clear the history.
    fn load_fen(&mut self);
}
