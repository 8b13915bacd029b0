//! Game-side state shared by the controller and the frame loop: the board,
//! the move animation, the picking buffer's dirty flag, and the opponent.

use crate::animation::{Landed, MoveAnimator};
use crate::board::{Board, PieceColor};
use crate::opponent::Opponent;
use crate::picking::PickingBuffer;

pub struct Session<B: Board> {
    pub board: B,
    pub animator: MoveAnimator,
    pub picking: PickingBuffer,
    /// `None` when the opponent is disabled.
    pub opponent: Option<Opponent>,
    /// The side the opponent plays, fixed by the human's first move.
    pub opponent_color: Option<PieceColor>,
    /// Set by an undo request so the opponent's reply and the human's move
    /// are reverted as a pair.
    pub pending_undo: bool,
}

impl<B: Board> Session<B> {
    pub fn new(
        board: B,
        animator: MoveAnimator,
        picking: PickingBuffer,
        opponent: Option<Opponent>,
    ) -> Self {
        Self {
            board,
            animator,
            picking,
            opponent,
            opponent_color: None,
            pending_undo: false,
        }
    }

    /// Animate the most recent record backwards. `false` if there is nothing
    /// to undo or a move is already in flight.
    pub fn start_undo(&mut self) -> bool {
        let Some(&last) = self.board.records().last() else {
            return false;
        };
        self.animator.begin(last.target, last.source, true)
    }

    /// Color of the side that made the most recent move.
    fn last_mover(&self) -> Option<PieceColor> {
        let last = self.board.records().last()?;
        self.board.color(last.target)
    }

    /// Advance the animation and, once idle, continue an undo chain or let
    /// the opponent reply. Returns what landed this frame, if anything.
    pub fn update(&mut self, dt: f32) -> Option<Landed> {
        let landed = self.animator.update(dt, &mut self.board);
        if landed.is_some() {
            self.picking.mark_dirty();
        }
        if !self.animator.is_idle() {
            return landed;
        }

        if self.pending_undo {
            self.pending_undo = false;
            let human_moved_last = self
                .opponent_color
                .is_some_and(|color| self.last_mover() == Some(color.opposite()));
            if human_moved_last && self.start_undo() {
                self.picking.mark_dirty();
            }
            return landed;
        }

        self.play_opponent();
        landed
    }

    fn play_opponent(&mut self) {
        let Some(color) = self.opponent_color else {
            return;
        };
        if self.last_mover() != Some(color.opposite()) || self.board.is_game_over() {
            return;
        }
        let Some(opponent) = self.opponent.as_mut() else {
            return;
        };
        if let Some(mv) = opponent.choose(&self.board, color) {
            self.animator.begin(mv.source, mv.target, false);
            self.picking.mark_dirty();
        }
    }
}
