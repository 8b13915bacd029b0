//! # Animation — The Move State Machine
//!
//! ```text
//!            begin(source, target)
//!   ┌──────┐ ────────────────────► ┌──────────┐
//!   │ Idle │                       │ InFlight │ ◄─┐ update: angle -= rate·dt
//!   └──────┘ ◄──────────────────── └──────────┘ ──┘
//!             angle reaches 0:
//!             apply move (or undo) on the board
//! ```
//!
//! The piece travels along the vertical semicircle between the two cell
//! centers, driven by an angle that sweeps from 180° down to 0°. The angle is
//! clamped, so however the frame time is sliced, the total time in flight is
//! `180 / rate` seconds and the final update lands exactly on 0.
//!
//! The board only changes when the animation lands. Until then the piece is
//! still logically on its source cell, which is why input that could select
//! or move something is refused while a move is in flight.

use glam::Vec3;

use crate::board::{Board, BoardMove, Cell, PieceKind};
use crate::math::{arc_point, cell_center};

/// Arc angle at the start of every move.
pub const START_ANGLE: f32 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveMove {
    pub source: Cell,
    pub target: Cell,
    /// Current world-space position of the moving piece.
    pub position: Vec3,
    /// Degrees, 180 at the source and 0 at the target.
    pub angle: f32,
    pub is_completed: bool,
    pub is_undo: bool,
}

/// What just landed, returned by the update that completed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Landed {
    pub source: Cell,
    pub target: Cell,
    pub is_undo: bool,
}

/// Owns the single in-flight move.
#[derive(Debug)]
pub struct MoveAnimator {
    rate: f32,
    current: Option<ActiveMove>,
}

impl MoveAnimator {
    /// `rate` is in degrees per second.
    pub fn new(rate: f32) -> Self {
        Self {
            rate,
            current: None,
        }
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none_or(|m| m.is_completed)
    }

    /// The move in flight, or the last one to land.
    pub fn current(&self) -> Option<&ActiveMove> {
        self.current.as_ref()
    }

    /// The move in flight, if any.
    pub fn in_flight(&self) -> Option<&ActiveMove> {
        self.current.as_ref().filter(|m| !m.is_completed)
    }

    /// Start a move. For an undo, `source` is where the piece is now and
    /// `target` where it goes back to.
    ///
    /// Returns `false` and changes nothing while another move is in flight.
    pub fn begin(&mut self, source: Cell, target: Cell, is_undo: bool) -> bool {
        if !self.is_idle() {
            log::debug!("Refusing move {source} -> {target}: another move is in flight");
            return false;
        }
        self.current = Some(ActiveMove {
            source,
            target,
            position: cell_center(source),
            angle: START_ANGLE,
            is_completed: false,
            is_undo,
        });
        true
    }

    /// Advance the in-flight move by `dt` seconds. When the angle reaches 0
    /// the board is updated in this same call and the landing is returned.
    pub fn update(&mut self, dt: f32, board: &mut impl Board) -> Option<Landed> {
        let active = self.current.as_mut().filter(|m| !m.is_completed)?;

        active.angle = (active.angle - self.rate * dt).clamp(0.0, START_ANGLE);
        active.position = arc_point(
            cell_center(active.source),
            cell_center(active.target),
            active.angle,
        );
        if active.angle > 0.0 {
            return None;
        }

        active.is_completed = true;
        if active.is_undo {
            board.undo();
        } else {
            let promotion = (board.kind(active.source) == Some(PieceKind::Pawn)
                && active.target.is_terminal_rank())
            .then_some(PieceKind::Queen);
            board.apply_move(BoardMove {
                source: active.source,
                target: active.target,
                promotion,
            });
        }

        Some(Landed {
            source: active.source,
            target: active.target,
            is_undo: active.is_undo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{ChessBoard, PieceColor};

    fn cell(name: &str) -> Cell {
        let b = name.as_bytes();
        Cell::from_row_column(b[1] - b'1', b[0] - b'a').unwrap()
    }

    #[test]
    fn begin_starts_at_source_with_full_angle() {
        let mut anim = MoveAnimator::new(180.0);
        assert!(anim.is_idle());
        assert!(anim.begin(cell("e2"), cell("e4"), false));
        let m = anim.in_flight().unwrap();
        assert_eq!(m.angle, START_ANGLE);
        assert_eq!(m.position, cell_center(cell("e2")));
        assert!(!anim.is_idle());
    }

    #[test]
    fn only_one_move_in_flight() {
        let mut anim = MoveAnimator::new(180.0);
        assert!(anim.begin(cell("e2"), cell("e4"), false));
        assert!(!anim.begin(cell("d2"), cell("d4"), false));
        assert_eq!(anim.in_flight().unwrap().source, cell("e2"));
    }

    #[test]
    fn lands_after_180_over_rate_seconds_regardless_of_slicing() {
        for (dt, steps) in [(1.0, 1), (0.5, 2), (0.25, 4), (0.125, 8)] {
            let mut board = ChessBoard::new();
            let mut anim = MoveAnimator::new(180.0);
            anim.begin(cell("e2"), cell("e4"), false);
            for step in 1..=steps {
                let landed = anim.update(dt, &mut board);
                if step < steps {
                    assert!(landed.is_none(), "dt {dt}: landed early at step {step}");
                } else {
                    assert!(landed.is_some(), "dt {dt}: should land on step {steps}");
                }
            }
            assert!(anim.is_idle());
            assert_eq!(anim.current().unwrap().angle, 0.0);
            assert_eq!(board.kind(cell("e4")), Some(PieceKind::Pawn));
        }
    }

    #[test]
    fn angle_is_monotone_and_bounded() {
        let mut board = ChessBoard::new();
        let mut anim = MoveAnimator::new(270.0);
        anim.begin(cell("g1"), cell("f3"), false);
        let mut last = START_ANGLE;
        for dt in [0.016, 0.2, 0.0, 0.033, 0.1, 0.05, 0.3, 0.3] {
            anim.update(dt, &mut board);
            let angle = anim.current().unwrap().angle;
            assert!((0.0..=START_ANGLE).contains(&angle));
            assert!(angle <= last, "angle went up: {last} -> {angle}");
            last = angle;
        }
        assert!(anim.is_idle());
    }

    #[test]
    fn oversized_step_clamps_and_lands_once() {
        let mut board = ChessBoard::new();
        let mut anim = MoveAnimator::new(180.0);
        anim.begin(cell("e2"), cell("e4"), false);
        assert!(anim.update(10.0, &mut board).is_some());
        assert_eq!(anim.current().unwrap().angle, 0.0);
        assert!(anim.update(1.0, &mut board).is_none(), "idle updates do nothing");
        assert_eq!(board.records().len(), 1);
    }

    #[test]
    fn position_follows_the_arc() {
        let mut board = ChessBoard::new();
        let mut anim = MoveAnimator::new(180.0);
        anim.begin(cell("a2"), cell("a4"), false);
        anim.update(0.5, &mut board);
        let from = cell_center(cell("a2"));
        let to = cell_center(cell("a4"));
        let apex = anim.in_flight().unwrap().position;
        let radius = from.distance(to) / 2.0;
        assert!(apex.distance((from + to) / 2.0 + Vec3::Y * radius) < 1e-4);
    }

    #[test]
    fn board_is_untouched_until_landing() {
        let mut board = ChessBoard::new();
        let mut anim = MoveAnimator::new(180.0);
        anim.begin(cell("e2"), cell("e4"), false);
        anim.update(0.9, &mut board);
        assert!(board.records().is_empty());
        assert_eq!(board.kind(cell("e2")), Some(PieceKind::Pawn));
    }

    #[test]
    fn undo_landing_reverts_the_board() {
        let mut board = ChessBoard::new();
        let mut anim = MoveAnimator::new(180.0);
        anim.begin(cell("e2"), cell("e4"), false);
        anim.update(1.0, &mut board);

        let last = board.records()[0];
        anim.begin(last.target, last.source, true);
        let landed = anim.update(1.0, &mut board).unwrap();
        assert!(landed.is_undo);
        assert!(board.records().is_empty());
        assert_eq!(board.kind(cell("e2")), Some(PieceKind::Pawn));
    }

    #[test]
    fn pawn_on_last_rank_becomes_queen() {
        let mut board = ChessBoard::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
        let mut anim = MoveAnimator::new(180.0);
        anim.begin(cell("a7"), cell("a8"), false);
        anim.update(1.0, &mut board);
        assert_eq!(board.kind(cell("a8")), Some(PieceKind::Queen));
        assert_eq!(board.color(cell("a8")), Some(PieceColor::White));
    }
}
