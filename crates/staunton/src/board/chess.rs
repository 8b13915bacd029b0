//! [`Board`] implementation over `shakmaty`.
//!
//! `shakmaty` positions are immutable values: playing a move produces a new
//! position. Undo is therefore just a stack of previous positions, kept in
//! lockstep with the move records.

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color, File, Move, Position, Role, Square};

use super::{Board, BoardMove, Cell, MoveRecord, Piece, PieceColor, PieceKind, SelectableSet};
use crate::error::ConfigError;

/// Standard chess rules with move history.
pub struct ChessBoard {
    start: Chess,
    position: Chess,
    history: Vec<Chess>,
    records: Vec<MoveRecord>,
}

impl ChessBoard {
    /// A board at the standard starting position.
    pub fn new() -> Self {
        Self::from_position(Chess::default())
    }

    /// A board whose starting (and reset) position is the given FEN.
    pub fn from_fen(fen: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::Fen {
            fen: fen.to_owned(),
            reason,
        };
        let setup: Fen = fen.parse().map_err(|e| invalid(format!("{e}")))?;
        let position: Chess = setup
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(format!("{e}")))?;
        Ok(Self::from_position(position))
    }

    fn from_position(position: Chess) -> Self {
        Self {
            start: position.clone(),
            position,
            history: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Side to move.
    pub fn turn(&self) -> PieceColor {
        to_piece_color(self.position.turn())
    }

    /// Find the legal move matching a request. A promotion with no explicit
    /// piece resolves to the queen.
    fn find_legal(&self, mv: BoardMove) -> Option<Move> {
        let from = to_square(mv.source);
        let to = to_square(mv.target);
        let promotion = mv.promotion.map_or(Role::Queen, to_role);
        self.position
            .legal_moves()
            .iter()
            .find(|m| {
                m.from() == Some(from)
                    && destination(m) == to
                    && m.promotion().is_none_or(|role| role == promotion)
            })
            .cloned()
    }
}

impl Default for ChessBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl Board for ChessBoard {
    fn tile(&self, cell: Cell) -> Option<Piece> {
        self.position
            .board()
            .piece_at(to_square(cell))
            .map(|piece| Piece {
                kind: to_piece_kind(piece.role),
                color: to_piece_color(piece.color),
            })
    }

    fn moves(&self, out: &mut SelectableSet, cell: Cell) {
        let from = to_square(cell);
        for m in self.position.legal_moves().iter() {
            if m.from() == Some(from) {
                out.push(to_cell(destination(m)));
            }
        }
    }

    fn apply_move(&mut self, mv: BoardMove) {
        let Some(legal) = self.find_legal(mv) else {
            log::warn!("Ignoring illegal move {} -> {}", mv.source, mv.target);
            return;
        };

        match self.position.clone().play(&legal) {
            Ok(next) => {
                let previous = std::mem::replace(&mut self.position, next);
                self.history.push(previous);
                self.records.push(MoveRecord {
                    source: mv.source,
                    target: mv.target,
                });
                log::debug!("Move {} -> {}", mv.source, mv.target);
            }
            Err(e) => log::warn!("Rejected move {} -> {}: {e}", mv.source, mv.target),
        }
    }

    fn undo(&mut self) {
        if let Some(previous) = self.history.pop() {
            self.position = previous;
            self.records.pop();
        }
    }

    fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    fn is_game_over(&self) -> bool {
        self.position.is_game_over()
    }

    fn load_fen(&mut self) {
        self.position = self.start.clone();
        self.history.clear();
        self.records.clear();
    }
}

// ── Conversions ──────────────────────────────────────────────────────────

fn to_square(cell: Cell) -> Square {
    Square::new(cell.index())
}

fn to_cell(square: Square) -> Cell {
    Cell(u8::from(square))
}

/// Where the moving piece ends up. For castling that's the king's square,
/// not the rook's, which is what shakmaty stores.
fn destination(m: &Move) -> Square {
    match *m {
        Move::Castle { king, rook } => {
            let file = if u32::from(rook) > u32::from(king) {
                File::G
            } else {
                File::C
            };
            Square::from_coords(file, king.rank())
        }
        _ => m.to(),
    }
}

fn to_piece_kind(role: Role) -> PieceKind {
    match role {
        Role::King => PieceKind::King,
        Role::Queen => PieceKind::Queen,
        Role::Bishop => PieceKind::Bishop,
        Role::Knight => PieceKind::Knight,
        Role::Rook => PieceKind::Rook,
        Role::Pawn => PieceKind::Pawn,
    }
}

fn to_role(kind: PieceKind) -> Role {
    match kind {
        PieceKind::King => Role::King,
        PieceKind::Queen => Role::Queen,
        PieceKind::Bishop => Role::Bishop,
        PieceKind::Knight => Role::Knight,
        PieceKind::Rook => Role::Rook,
        PieceKind::Pawn => Role::Pawn,
    }
}

fn to_piece_color(color: Color) -> PieceColor {
    match color {
        Color::White => PieceColor::White,
        Color::Black => PieceColor::Black,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(name: &str) -> Cell {
        let bytes = name.as_bytes();
        Cell::from_row_column(bytes[1] - b'1', bytes[0] - b'a').unwrap()
    }

    fn targets(board: &ChessBoard, from: &str) -> Vec<Cell> {
        let mut set = SelectableSet::new();
        board.moves(&mut set, cell(from));
        let mut v = set.as_slice().to_vec();
        v.sort();
        v
    }

    fn play(board: &mut ChessBoard, from: &str, to: &str) {
        board.apply_move(BoardMove {
            source: cell(from),
            target: cell(to),
            promotion: None,
        });
    }

    #[test]
    fn start_position_pieces() {
        let board = ChessBoard::new();
        assert_eq!(
            board.tile(cell("e1")),
            Some(Piece {
                kind: PieceKind::King,
                color: PieceColor::White
            })
        );
        assert_eq!(board.kind(cell("d8")), Some(PieceKind::Queen));
        assert_eq!(board.color(cell("a7")), Some(PieceColor::Black));
        assert_eq!(board.tile(cell("e4")), None);
        assert_eq!(board.turn(), PieceColor::White);
    }

    #[test]
    fn knight_targets_from_start() {
        let board = ChessBoard::new();
        assert_eq!(targets(&board, "b1"), vec![cell("a3"), cell("c3")]);
    }

    #[test]
    fn empty_cell_has_no_targets() {
        let board = ChessBoard::new();
        assert!(targets(&board, "e4").is_empty());
    }

    #[test]
    fn applying_a_move_records_it() {
        let mut board = ChessBoard::new();
        play(&mut board, "e2", "e4");
        assert_eq!(board.kind(cell("e4")), Some(PieceKind::Pawn));
        assert_eq!(board.tile(cell("e2")), None);
        assert_eq!(
            board.records(),
            &[MoveRecord {
                source: cell("e2"),
                target: cell("e4")
            }]
        );
        assert_eq!(board.turn(), PieceColor::Black);
    }

    #[test]
    fn illegal_move_is_a_no_op() {
        let mut board = ChessBoard::new();
        play(&mut board, "e2", "e5");
        assert!(board.records().is_empty());
        assert_eq!(board.kind(cell("e2")), Some(PieceKind::Pawn));
    }

    #[test]
    fn undo_restores_previous_position() {
        let mut board = ChessBoard::new();
        play(&mut board, "g1", "f3");
        board.undo();
        assert!(board.records().is_empty());
        assert_eq!(board.kind(cell("g1")), Some(PieceKind::Knight));
        assert_eq!(board.tile(cell("f3")), None);

        board.undo();
        assert!(board.records().is_empty(), "undo on empty history is a no-op");
    }

    #[test]
    fn castling_targets_and_records_king_square() {
        let mut board = ChessBoard::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let king_targets = targets(&board, "e1");
        assert!(king_targets.contains(&cell("g1")), "short castle offered as g1");
        assert!(king_targets.contains(&cell("c1")), "long castle offered as c1");

        play(&mut board, "e1", "g1");
        assert_eq!(board.kind(cell("g1")), Some(PieceKind::King));
        assert_eq!(board.kind(cell("f1")), Some(PieceKind::Rook));
        assert_eq!(board.records()[0].target, cell("g1"));
    }

    #[test]
    fn promotion_defaults_to_queen() {
        let mut board = ChessBoard::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
        assert_eq!(targets(&board, "a7"), vec![cell("a8")], "promotions collapse to one target");

        play(&mut board, "a7", "a8");
        assert_eq!(board.kind(cell("a8")), Some(PieceKind::Queen));
    }

    #[test]
    fn explicit_underpromotion_is_honoured() {
        let mut board = ChessBoard::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
        board.apply_move(BoardMove {
            source: cell("a7"),
            target: cell("a8"),
            promotion: Some(PieceKind::Knight),
        });
        assert_eq!(board.kind(cell("a8")), Some(PieceKind::Knight));
    }

    #[test]
    fn load_fen_resets_to_start() {
        let mut board = ChessBoard::new();
        play(&mut board, "e2", "e4");
        play(&mut board, "e7", "e5");
        board.load_fen();
        assert!(board.records().is_empty());
        assert_eq!(board.kind(cell("e2")), Some(PieceKind::Pawn));
        assert_eq!(board.tile(cell("e5")), None);
    }

    #[test]
    fn checkmate_is_game_over() {
        let board = ChessBoard::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap();
        assert!(board.is_game_over());
        assert!(!ChessBoard::new().is_game_over());
    }

    #[test]
    fn invalid_fen_is_rejected() {
        assert!(matches!(
            ChessBoard::from_fen("not a position"),
            Err(ConfigError::Fen { .. })
        ));
    }
}
