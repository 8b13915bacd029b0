//! # Picking — Which Object Is Under the Cursor?
//!
//! Instead of ray-casting against meshes on the CPU, every selectable object
//! is rendered a second time into an offscreen target with its ID as a flat
//! color. Reading back the single pixel under the cursor answers the
//! question exactly, for any mesh shape, at the cost of one extra pass.
//!
//! ## ID Encoding
//!
//! ```text
//!   id (24 bits)        pixel
//!   0x BB GG RR   ──►   R = id & 0xFF
//!                       G = (id >> 8) & 0xFF
//!                       B = (id >> 16) & 0xFF
//!                       A = 255   (0 = nothing drawn here)
//! ```
//!
//! The target is cleared to all zeros, so alpha 0 means "no object".
//!
//! ## Dirty Flag
//!
//! The pass only reruns when something could have changed what a pixel
//! means: selection, board occupancy, camera, viewport size. Callers
//! [`mark_dirty`](PickingBuffer::mark_dirty); the frame calls
//! [`rebuild_if_dirty`](PickingBuffer::rebuild_if_dirty) once before any
//! query.
//!
//! ## Padding
//!
//! The target is one pixel larger than the viewport in each direction. A
//! Y flip of `height - y` then always lands inside the target, even for the
//! cursor's top row.

use glam::{UVec2, Vec2, Vec4};

use crate::asset::ResourceCache;
use crate::render::{DrawCommand, FrameUniforms, PixelOrigin, RenderBackend, RenderContext};

/// Extra pixels added to each dimension of the picking target.
pub const PICKING_PADDING: u32 = 1;

/// Largest ID that fits in the RGB channels.
pub const MAX_PICKING_ID: u32 = 0x00FF_FFFF;

/// Split an ID into RGBA bytes with full alpha.
///
/// # Panics
///
/// If `id` does not fit in 24 bits.
pub fn encode_id(id: u32) -> [u8; 4] {
    assert!(id <= MAX_PICKING_ID, "picking id {id} exceeds 24 bits");
    [
        (id & 0xFF) as u8,
        ((id >> 8) & 0xFF) as u8,
        ((id >> 16) & 0xFF) as u8,
        255,
    ]
}

/// [`encode_id`] as a normalized color for the solid shading mode.
pub fn encode_id_color(id: u32) -> Vec4 {
    let [r, g, b, a] = encode_id(id);
    Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0
}

/// Decode a picking pixel. Alpha 0 means nothing was drawn there.
pub fn decode_pixel(pixel: [u8; 4]) -> Option<u32> {
    let [r, g, b, a] = pixel;
    if a == 0 {
        return None;
    }
    Some(u32::from(r) | (u32::from(g) << 8) | (u32::from(b) << 16))
}

/// Bookkeeping for the offscreen ID target. The target itself lives in the
/// backend.
#[derive(Debug)]
pub struct PickingBuffer {
    size: UVec2,
    dirty: bool,
    rebuilds: u64,
    context: RenderContext,
}

impl PickingBuffer {
    /// Create the backend target for `viewport` and start dirty.
    pub fn new<B: RenderBackend>(backend: &mut B, viewport: UVec2) -> Self {
        let size = padded(viewport);
        backend.recreate_picking_target(size);
        Self {
            size,
            dirty: true,
            rebuilds: 0,
            context: RenderContext::new(),
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Current target size (viewport plus padding).
    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// How many times the ID pass has actually run.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Draws recorded by the most recent rebuild.
    pub fn last_commands(&self) -> &[DrawCommand] {
        self.context.commands()
    }

    /// Recreate the target for a new viewport size and mark it dirty.
    pub fn resize<B: RenderBackend>(&mut self, backend: &mut B, viewport: UVec2) {
        self.size = padded(viewport);
        backend.recreate_picking_target(self.size);
        self.dirty = true;
        log::info!("Picking target recreated at {}x{}", self.size.x, self.size.y);
    }

    /// Rerun the ID pass if anything marked it dirty. `build` records the
    /// selectable objects, each with its ID set via
    /// [`RenderContext::set_picking_id`].
    ///
    /// Returns whether a rebuild happened.
    pub fn rebuild_if_dirty<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        cache: &ResourceCache<B>,
        frame: &FrameUniforms,
        build: impl FnOnce(&mut RenderContext),
    ) -> bool {
        if !self.dirty {
            return false;
        }
        self.context.reset();
        build(&mut self.context);
        backend.draw_picking(cache, frame, self.context.commands());
        self.dirty = false;
        self.rebuilds += 1;
        log::debug!(
            "Picking rebuilt ({} objects)",
            self.context.commands().len()
        );
        true
    }

    /// The ID under `cursor` (window pixels, origin top-left).
    ///
    /// Returns `None` without touching the GPU when the cursor isn't in its
    /// normal visible mode.
    pub fn query<B: RenderBackend>(
        &self,
        backend: &mut B,
        cursor: Vec2,
        cursor_active: bool,
    ) -> Option<u32> {
        if !cursor_active || cursor.x < 0.0 || cursor.y < 0.0 {
            return None;
        }
        let x = cursor.x as u32;
        let y = cursor.y as u32;
        let y = match backend.pixel_origin() {
            PixelOrigin::TopLeft => y,
            PixelOrigin::BottomLeft => (self.size.y - PICKING_PADDING).checked_sub(y)?,
        };
        if x >= self.size.x || y >= self.size.y {
            return None;
        }
        backend.read_picking_pixel(x, y).and_then(decode_pixel)
    }
}

fn padded(viewport: UVec2) -> UVec2 {
    viewport + UVec2::splat(PICKING_PADDING)
}
