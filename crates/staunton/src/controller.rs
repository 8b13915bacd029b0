//! # Controller — Input Events to Game Actions
//!
//! | Input                         | Action                                    |
//! |-------------------------------|-------------------------------------------|
//! | left click on a target cell   | move the selected piece there             |
//! | left click on a piece         | select it, collect its legal targets      |
//! | left click on nothing         | clear the selection                       |
//! | right/middle drag             | orbit the camera (cursor hidden)          |
//! | scroll                        | zoom                                      |
//! | `U`                           | undo (the opponent's reply too)           |
//! | `R`                           | reset to the starting position            |
//!
//! Clicks and keys that change the game are refused while a move is in
//! flight. Camera input is always accepted.
//!
//! "Clicked cell" means whatever the picking buffer reported under the cursor
//! this frame, stored as [`hovered`](Controller::hovered) by the frame loop
//! before events are handled.

use glam::Vec2;

use crate::board::{Board, Cell, SelectableSet};
use crate::camera::OrbitCamera;
use crate::input::{Input, InputEvent, KeyCode, MouseButton};
use crate::session::Session;

/// Buttons that orbit the camera while held.
pub const CAMERA_BUTTONS: [MouseButton; 2] = [MouseButton::Right, MouseButton::Middle];

pub const UNDO_KEY: KeyCode = KeyCode::KeyU;
pub const RESET_KEY: KeyCode = KeyCode::KeyR;

/// Whether the pointer is the normal visible cursor or captured for
/// free-look. Picking queries only run in [`CursorMode::Normal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    Normal,
    Disabled,
}

pub struct Controller {
    selected: Option<Cell>,
    hovered: Option<Cell>,
    selectable: SelectableSet,
    cursor_mode: CursorMode,
    cursor: Vec2,
    first_motion: bool,
    buttons: Input<MouseButton>,
    camera: OrbitCamera,
}

impl Controller {
    pub fn new(camera: OrbitCamera) -> Self {
        Self {
            selected: None,
            hovered: None,
            selectable: SelectableSet::new(),
            cursor_mode: CursorMode::Normal,
            cursor: Vec2::ZERO,
            first_motion: true,
            buttons: Input::new(),
            camera,
        }
    }

    pub fn selected(&self) -> Option<Cell> {
        self.selected
    }

    pub fn hovered(&self) -> Option<Cell> {
        self.hovered
    }

    pub fn set_hovered(&mut self, cell: Option<Cell>) {
        self.hovered = cell;
    }

    pub fn selectable(&self) -> &SelectableSet {
        &self.selectable
    }

    pub fn cursor_mode(&self) -> CursorMode {
        self.cursor_mode
    }

    /// Last known pointer position in window pixels.
    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    /// Whether a camera-drag button is held.
    pub fn camera_held(&self) -> bool {
        self.buttons.any_pressed(&CAMERA_BUTTONS)
    }

    pub fn enable_cursor(&mut self) {
        self.cursor_mode = CursorMode::Normal;
    }

    pub fn disable_cursor(&mut self) {
        self.cursor_mode = CursorMode::Disabled;
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.selectable.clear();
    }

    pub fn handle<B: Board>(&mut self, event: InputEvent, session: &mut Session<B>) {
        match event {
            InputEvent::MouseButton { button, pressed } => {
                if pressed {
                    self.buttons.press(button);
                    if button == MouseButton::Left {
                        self.primary_click(session);
                    }
                } else {
                    self.buttons.release(button);
                    if CAMERA_BUTTONS.contains(&button) && !self.camera_held() {
                        self.enable_cursor();
                    }
                }
            }
            InputEvent::CursorMoved { x, y } => self.cursor_moved(Vec2::new(x, y), session),
            InputEvent::MouseMotion { dx, dy } => self.drag(Vec2::new(dx, dy), session),
            InputEvent::Scroll { delta } => {
                self.camera.zoom(delta);
                session.picking.mark_dirty();
            }
            InputEvent::Key {
                code,
                pressed: true,
            } => self.key_pressed(code, session),
            InputEvent::Key { .. } => {}
        }
    }

    fn primary_click<B: Board>(&mut self, session: &mut Session<B>) {
        if !session.animator.is_idle() {
            return;
        }

        match (self.hovered, self.selected) {
            (Some(target), Some(_)) if self.selectable.contains(target) => {
                self.move_selected_to(target, session);
            }
            (Some(cell), _) if session.board.tile(cell).is_some() => {
                self.selectable.clear();
                session.board.moves(&mut self.selectable, cell);
                self.selected = Some(cell);
                log::debug!("Selected {cell} ({} targets)", self.selectable.len());
            }
            (None, _) => self.clear_selection(),
            (Some(_), _) => {}
        }

        session.picking.mark_dirty();
    }

    fn move_selected_to<B: Board>(&mut self, target: Cell, session: &mut Session<B>) {
        let Some(source) = self.selected else {
            return;
        };
        if session.board.records().is_empty() && session.opponent.is_some() {
            session.opponent_color = session.board.color(source).map(|c| c.opposite());
        }
        if session.animator.begin(source, target, false) {
            log::debug!("Moving {source} -> {target}");
            session.pending_undo = false;
            self.clear_selection();
            self.disable_cursor();
        }
    }

    fn cursor_moved<B: Board>(&mut self, position: Vec2, session: &mut Session<B>) {
        if self.first_motion {
            self.cursor = position;
            self.first_motion = false;
        }
        let delta = position - self.cursor;
        self.cursor = position;
        self.drag(delta, session);
    }

    fn drag<B: Board>(&mut self, delta: Vec2, session: &mut Session<B>) {
        if self.camera_held() {
            self.camera.orbit(delta.x, delta.y);
            self.disable_cursor();
            session.picking.mark_dirty();
        }
    }

    fn key_pressed<B: Board>(&mut self, code: KeyCode, session: &mut Session<B>) {
        if !session.animator.is_idle() {
            return;
        }
        match code {
            UNDO_KEY => {
                if session.start_undo() {
                    log::debug!("Undo");
                    session.pending_undo = true;
                    self.clear_selection();
                    self.disable_cursor();
                    session.picking.mark_dirty();
                }
            }
            RESET_KEY => {
                log::info!("Board reset");
                session.board.load_fen();
                session.pending_undo = false;
                self.clear_selection();
                session.picking.mark_dirty();
            }
            _ => {}
        }
    }
}
