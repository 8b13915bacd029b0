//! The automated opponent: a uniformly random legal move.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::board::{Board, BoardMove, Cell, PieceColor, SelectableSet};

pub struct Opponent {
    rng: StdRng,
}

impl Opponent {
    /// A fixed `seed` makes the opponent's play reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Pick a piece of `color` that can move, then one of its targets.
    /// `None` when `color` has no legal move.
    pub fn choose(&mut self, board: &impl Board, color: PieceColor) -> Option<BoardMove> {
        let mut targets = SelectableSet::new();
        let movable: Vec<Cell> = Cell::all()
            .filter(|&cell| board.color(cell) == Some(color))
            .filter(|&cell| {
                targets.clear();
                board.moves(&mut targets, cell);
                !targets.is_empty()
            })
            .collect();

        let &source = movable.choose(&mut self.rng)?;
        targets.clear();
        board.moves(&mut targets, source);
        let &target = targets.as_slice().choose(&mut self.rng)?;

        log::debug!("Opponent plays {source} -> {target}");
        Some(BoardMove {
            source,
            target,
            promotion: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ChessBoard;

    #[test]
    fn chooses_a_legal_move_for_its_color() {
        let board = ChessBoard::new();
        let mut opponent = Opponent::new(Some(7));
        for _ in 0..20 {
            let mv = opponent.choose(&board, PieceColor::White).unwrap();
            assert_eq!(board.color(mv.source), Some(PieceColor::White));
            let mut legal = SelectableSet::new();
            board.moves(&mut legal, mv.source);
            assert!(legal.contains(mv.target), "{} -> {} is not legal", mv.source, mv.target);
        }
    }

    #[test]
    fn same_seed_same_choice() {
        let board = ChessBoard::new();
        let a = Opponent::new(Some(42)).choose(&board, PieceColor::White);
        let b = Opponent::new(Some(42)).choose(&board, PieceColor::White);
        assert_eq!(a, b);
    }

    #[test]
    fn side_not_to_move_has_no_choice() {
        let board = ChessBoard::new();
        let mut opponent = Opponent::new(Some(1));
        assert_eq!(opponent.choose(&board, PieceColor::Black), None);
    }

    #[test]
    fn mated_side_has_no_choice() {
        let board = ChessBoard::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap();
        assert_eq!(Opponent::new(Some(3)).choose(&board, PieceColor::White), None);
    }
}
