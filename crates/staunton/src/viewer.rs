//! # Viewer — The Frame Scheduler
//!
//! One call to [`Viewer::run_frame`] is one frame, always in this order:
//!
//! ```text
//!  1. clamp dt
//!  2. drain input ──► Controller        (hover re-resolved before a click)
//!  3. Session::update                   (animation, undo chain, opponent)
//!  4. PickingBuffer::rebuild_if_dirty
//!  5. PickingBuffer::query ──► hovered cell
//!  6. opaque ─► outlines ─► transparent into the RenderContext
//!  7. RenderBackend::present
//! ```
//!
//! The viewer owns the backend and the resource cache, so it is also where
//! GPU resources are torn down: dropping it releases everything the cache
//! created, newest first.

use glam::{UVec2, Vec3};

use crate::animation::{ActiveMove, MoveAnimator};
use crate::asset::{AssetDecoder, ResourceCache};
use crate::board::{Board, Cell, SelectableSet};
use crate::camera::OrbitCamera;
use crate::config::ViewerConfig;
use crate::controller::{Controller, CursorMode};
use crate::error::AssetError;
use crate::input::{EventQueue, InputEvent, MouseButton};
use crate::opponent::Opponent;
use crate::outline::OutlineStyle;
use crate::picking::PickingBuffer;
use crate::render::{FrameUniforms, RenderBackend, RenderContext};
use crate::scene::{SceneAssets, SceneView};
use crate::session::Session;

pub struct Viewer<B: RenderBackend, Bd: Board> {
    config: ViewerConfig,
    backend: B,
    cache: ResourceCache<B>,
    decoder: Box<dyn AssetDecoder>,
    /// `None` until [`initialize`](Self::initialize) succeeds.
    scene: Option<SceneAssets>,
    session: Session<Bd>,
    controller: Controller,
    events: EventQueue,
    context: RenderContext,
    outline: OutlineStyle,
    viewport: UVec2,
}

impl<B: RenderBackend, Bd: Board> Viewer<B, Bd> {
    pub fn new(
        config: ViewerConfig,
        mut backend: B,
        board: Bd,
        decoder: Box<dyn AssetDecoder>,
        viewport: UVec2,
    ) -> Self {
        let picking = PickingBuffer::new(&mut backend, viewport);
        let opponent = config
            .opponent
            .enabled
            .then(|| Opponent::new(config.opponent.seed));
        let session = Session::new(
            board,
            MoveAnimator::new(config.animation.rate),
            picking,
            opponent,
        );
        let controller = Controller::new(OrbitCamera::new(&config.camera));
        let outline = OutlineStyle::from(&config.outline);

        Self {
            config,
            backend,
            cache: ResourceCache::new(),
            decoder,
            scene: None,
            session,
            controller,
            events: EventQueue::new(),
            context: RenderContext::new(),
            outline,
            viewport,
        }
    }

    /// Load every shader, model, and texture. Any failure is fatal: the
    /// error names the offending path and the viewer must not be run.
    pub fn initialize(&mut self) -> Result<(), AssetError> {
        let scene = SceneAssets::load(
            &mut self.cache,
            &mut self.backend,
            self.decoder.as_ref(),
            &self.config,
        )?;
        self.scene = Some(scene);
        self.session.picking.mark_dirty();
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.scene.is_some()
    }

    /// Queue an input event for the next frame.
    pub fn push_event(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    pub fn run_frame(&mut self, dt: f32) -> Result<(), wgpu::SurfaceError> {
        let dt = dt.clamp(0.0, self.config.animation.max_frame_delta);

        let events: Vec<InputEvent> = self.events.drain().collect();
        for event in events {
            if let InputEvent::MouseButton {
                button: MouseButton::Left,
                pressed: true,
            } = event
            {
                self.refresh_hover();
            }
            self.controller.handle(event, &mut self.session);
        }

        if let Some(landed) = self.session.update(dt) {
            log::debug!("Landed {} -> {}", landed.source, landed.target);
            if !self.controller.camera_held() {
                self.controller.enable_cursor();
            }
        }

        self.refresh_hover();

        let Some(scene) = self.scene else {
            return Ok(());
        };
        let frame = self.frame_uniforms();
        self.context.reset();
        let view = SceneView {
            board: &self.session.board,
            moving: self.session.animator.in_flight(),
            selected: self.controller.selected(),
            hovered: self.controller.hovered(),
            selectable: self.controller.selectable(),
        };
        scene.draw_scene(&mut self.context, &view, self.outline);

        self.backend.present(
            &self.cache,
            &frame,
            self.context.commands(),
            self.config.clear_color,
        )
    }

    /// Rebuild the ID pass if needed and resolve the cell under the cursor.
    fn refresh_hover(&mut self) {
        let Some(scene) = self.scene else {
            return;
        };
        let frame = self.frame_uniforms();
        let view = SceneView {
            board: &self.session.board,
            moving: self.session.animator.in_flight(),
            selected: self.controller.selected(),
            hovered: self.controller.hovered(),
            selectable: self.controller.selectable(),
        };
        self.session
            .picking
            .rebuild_if_dirty(&mut self.backend, &self.cache, &frame, |ctx| {
                scene.draw_picking(ctx, &view)
            });

        let cursor_active = self.controller.cursor_mode() == CursorMode::Normal;
        let id = self
            .session
            .picking
            .query(&mut self.backend, self.controller.cursor(), cursor_active);
        self.controller.set_hovered(id.and_then(Cell::new));
    }

    fn frame_uniforms(&self) -> FrameUniforms {
        let camera = self.controller.camera();
        let aspect = self.viewport.x.max(1) as f32 / self.viewport.y.max(1) as f32;
        FrameUniforms {
            view_proj: camera.view_projection(aspect),
            camera_position: camera.position(),
            light_position: self.light_position(),
        }
    }

    fn light_position(&self) -> Vec3 {
        self.config.light_position
    }

    /// Track a new window size. A zero-sized (minimized) window is ignored.
    pub fn on_resize(&mut self, size: UVec2) {
        if size.x == 0 || size.y == 0 {
            return;
        }
        self.viewport = size;
        self.session.picking.resize(&mut self.backend, size);
        self.backend.resize(size);
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn selected(&self) -> Option<Cell> {
        self.controller.selected()
    }

    pub fn hovered(&self) -> Option<Cell> {
        self.controller.hovered()
    }

    pub fn selectable(&self) -> &SelectableSet {
        self.controller.selectable()
    }

    pub fn active_move(&self) -> Option<&ActiveMove> {
        self.session.animator.in_flight()
    }

    pub fn cursor_mode(&self) -> CursorMode {
        self.controller.cursor_mode()
    }

    pub fn board(&self) -> &Bd {
        &self.session.board
    }

    pub fn picking(&self) -> &PickingBuffer {
        &self.session.picking
    }

    pub fn camera(&self) -> &OrbitCamera {
        self.controller.camera()
    }

    pub fn viewport(&self) -> UVec2 {
        self.viewport
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: RenderBackend, Bd: Board> Drop for Viewer<B, Bd> {
    fn drop(&mut self) {
        self.cache.teardown(&mut self.backend);
    }
}
