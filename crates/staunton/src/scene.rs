//! # Scene — What Gets Drawn, and How
//!
//! The scene is fixed: one board, up to 32 pieces, and one translucent tile
//! per legal target of the selected piece. [`SceneAssets`] resolves every
//! handle once at startup; the pass builders below turn the current game
//! state into [`DrawCommand`](crate::render::DrawCommand)s.
//!
//! ## Pass Order
//!
//! ```text
//!  picking      solid ID color   pieces (id = cell), then tiles (id = target)
//!  ──────────── offscreen ──────────────────────────────────────────────────
//!  opaque       lit              board, pieces; hovered/selected write stencil
//!  outline      outline          one ring per stencil-written piece
//!  transparent  unlit + blend    selectable tiles (hovered one highlighted)
//! ```
//!
//! The piece in flight is drawn at its arc position and is never outlined or
//! pickable.

use std::path::Path;

use glam::Vec3;

use crate::animation::ActiveMove;
use crate::asset::{
    AssetDecoder, MaterialHandle, MeshHandle, ResourceCache, ResourceDevice, ShaderHandle,
};
use crate::board::{Board, Cell, Piece, PieceColor, PieceKind, SelectableSet};
use crate::config::ViewerConfig;
use crate::error::AssetError;
use crate::math::{BOARD_SCALE, Transform, cell_center};
use crate::outline::{self, OutlineStyle, Outlined};
use crate::render::RenderContext;

/// Vertex/fragment pairs: unlit, lit, picking, outline.
pub const SHADER_PAIRS: [(&str, &str); 4] = [
    ("mesh.vert.wgsl", "unlit.frag.wgsl"),
    ("mesh.vert.wgsl", "lighting.frag.wgsl"),
    ("mesh.vert.wgsl", "solid.frag.wgsl"),
    ("outline.vert.wgsl", "solid.frag.wgsl"),
];

const BOARD_MODEL: &str = "board.gltf";
const TILE_MODEL: &str = "selectable_tile.gltf";

/// Piece models in [`PieceKind::ALL`] order.
const PIECE_MODELS: [&str; PieceKind::COUNT] = [
    "king.gltf",
    "queen.gltf",
    "bishop.gltf",
    "knight.gltf",
    "rook.gltf",
    "pawn.gltf",
];

/// Every model file the scene loads.
pub const MODEL_FILES: [&str; PieceKind::COUNT + 2] = [
    BOARD_MODEL,
    PIECE_MODELS[0],
    PIECE_MODELS[1],
    PIECE_MODELS[2],
    PIECE_MODELS[3],
    PIECE_MODELS[4],
    PIECE_MODELS[5],
    TILE_MODEL,
];

const TILE_TEXTURE: &str = "selectable_tile.png";
const TILE_HOVER_TEXTURE: &str = "selectable_tile_hover.png";

pub const TEXTURE_FILES: [&str; 2] = [TILE_TEXTURE, TILE_HOVER_TEXTURE];

const BOARD_YAW: f32 = -90.0;
const WHITE_YAW: f32 = -180.0;
const BLACK_YAW: f32 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shaders {
    pub unlit: ShaderHandle,
    pub lit: ShaderHandle,
    pub picking: ShaderHandle,
    pub outline: ShaderHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceModel {
    pub mesh: MeshHandle,
    pub white: MaterialHandle,
    pub black: MaterialHandle,
}

impl PieceModel {
    pub fn material(&self, color: PieceColor) -> MaterialHandle {
        match color {
            PieceColor::White => self.white,
            PieceColor::Black => self.black,
        }
    }
}

/// Every handle the scene draws with.
#[derive(Debug, Clone, Copy)]
pub struct SceneAssets {
    pub shaders: Shaders,
    pub board: MeshHandle,
    pub board_material: MaterialHandle,
    /// Indexed by [`PieceKind::index`].
    pub pieces: [PieceModel; PieceKind::COUNT],
    pub tile: MeshHandle,
    pub tile_material: MaterialHandle,
    pub tile_hover_material: MaterialHandle,
}

/// The game state one frame of drawing needs.
pub struct SceneView<'a, B: Board> {
    pub board: &'a B,
    /// The move in flight, if any.
    pub moving: Option<&'a ActiveMove>,
    pub selected: Option<Cell>,
    pub hovered: Option<Cell>,
    pub selectable: &'a SelectableSet,
}

impl<B: Board> SceneView<'_, B> {
    /// Occupied cells whose piece is resting there (not the one in flight).
    fn resting_pieces(&self) -> impl Iterator<Item = (Cell, Piece)> + '_ {
        let moving = self.moving.map(|m| m.source);
        Cell::all()
            .filter(move |&cell| Some(cell) != moving)
            .filter_map(move |cell| self.board.tile(cell).map(|piece| (cell, piece)))
    }

    fn is_highlighted(&self, cell: Cell) -> bool {
        Some(cell) == self.hovered || Some(cell) == self.selected
    }
}

impl SceneAssets {
    /// Load every shader, model, and texture. Any failure aborts.
    pub fn load<D: ResourceDevice>(
        cache: &mut ResourceCache<D>,
        device: &mut D,
        decoder: &dyn AssetDecoder,
        config: &ViewerConfig,
    ) -> Result<Self, AssetError> {
        let mut shader = |index: usize| {
            let (vertex, fragment) = SHADER_PAIRS[index];
            cache.load_shader(
                device,
                decoder,
                &config.shader_path(vertex),
                &config.shader_path(fragment),
            )
        };
        let shaders = Shaders {
            unlit: shader(0)?,
            lit: shader(1)?,
            picking: shader(2)?,
            outline: shader(3)?,
        };

        let board = cache.load_mesh(device, decoder, &config.model_path(BOARD_MODEL))?;
        let board_material = cache
            .mesh(board)
            .map(|entry| entry.default_material)
            .ok_or_else(|| AssetError::malformed(config.model_path(BOARD_MODEL), "not cached"))?;

        let mut pieces = Vec::with_capacity(PieceKind::COUNT);
        for file in PIECE_MODELS {
            let path = config.model_path(file);
            let mesh = cache.load_mesh(device, decoder, &path)?;
            let entry = cache
                .mesh(mesh)
                .ok_or_else(|| AssetError::malformed(&path, "not cached"))?;
            pieces.push(PieceModel {
                mesh,
                white: entry.white_material(),
                black: entry.black_material(),
            });
        }
        let pieces: [PieceModel; PieceKind::COUNT] = pieces
            .try_into()
            .map_err(|_| AssetError::malformed(config.model_path(PIECE_MODELS[0]), "piece table"))?;

        let tile = cache.load_mesh(device, decoder, &config.model_path(TILE_MODEL))?;
        let tile_material = load_named_material(cache, device, decoder, config, TILE_TEXTURE)?;
        let tile_hover_material =
            load_named_material(cache, device, decoder, config, TILE_HOVER_TEXTURE)?;

        log::info!(
            "Scene loaded: {} shaders, {} meshes, {} textures, {} materials",
            cache.shader_count(),
            cache.mesh_count(),
            cache.texture_count(),
            cache.material_count()
        );

        Ok(Self {
            shaders,
            board,
            board_material,
            pieces,
            tile,
            tile_material,
            tile_hover_material,
        })
    }

    pub fn piece(&self, kind: PieceKind) -> &PieceModel {
        &self.pieces[kind.index()]
    }

    // ── Passes ───────────────────────────────────────────────────────────

    /// Every pickable object with its ID: resting pieces, then tiles.
    pub fn draw_picking<B: Board>(&self, ctx: &mut RenderContext, view: &SceneView<'_, B>) {
        ctx.bind_shader(self.shaders.picking);
        ctx.unbind_material();

        for (cell, piece) in view.resting_pieces() {
            ctx.set_picking_id(cell.index());
            ctx.draw_model(piece_transform(cell_center(cell), piece.color), self.piece(piece.kind).mesh);
        }
        for target in view.selectable.iter() {
            ctx.set_picking_id(target.index());
            ctx.draw_model(tile_transform(target), self.tile);
        }
    }

    /// Opaque geometry, then outlines, then translucent tiles.
    pub fn draw_scene<B: Board>(
        &self,
        ctx: &mut RenderContext,
        view: &SceneView<'_, B>,
        style: OutlineStyle,
    ) {
        let outlined = self.draw_opaque(ctx, view);
        outline::draw_outlines(ctx, self.shaders.outline, style, &outlined);
        self.draw_transparent(ctx, view);
    }

    fn draw_opaque<B: Board>(&self, ctx: &mut RenderContext, view: &SceneView<'_, B>) -> Vec<Outlined> {
        ctx.bind_shader(self.shaders.lit);
        ctx.bind_material(self.board_material);
        ctx.draw_model(
            Transform::IDENTITY
                .with_yaw_degrees(BOARD_YAW)
                .with_scale(BOARD_SCALE)
                .matrix(),
            self.board,
        );

        let mut outlined = Vec::new();
        for (cell, piece) in view.resting_pieces() {
            let model = self.piece(piece.kind);
            ctx.bind_material(model.material(piece.color));
            let transform = piece_transform(cell_center(cell), piece.color);
            if view.is_highlighted(cell) {
                outlined.push(outline::draw_silhouette(ctx, transform, model.mesh));
            } else {
                ctx.draw_model(transform, model.mesh);
            }
        }

        if let Some(moving) = view.moving {
            if let Some(piece) = view.board.tile(moving.source) {
                let model = self.piece(piece.kind);
                ctx.bind_material(model.material(piece.color));
                ctx.draw_model(piece_transform(moving.position, piece.color), model.mesh);
            }
        }

        outlined
    }

    fn draw_transparent<B: Board>(&self, ctx: &mut RenderContext, view: &SceneView<'_, B>) {
        if view.selectable.is_empty() {
            return;
        }
        ctx.bind_shader(self.shaders.unlit);
        ctx.enable_blending();
        for target in view.selectable.iter() {
            let material = if Some(target) == view.hovered {
                self.tile_hover_material
            } else {
                self.tile_material
            };
            ctx.bind_material(material);
            ctx.draw_model(tile_transform(target), self.tile);
        }
        ctx.disable_blending();
    }
}

fn load_named_material<D: ResourceDevice>(
    cache: &mut ResourceCache<D>,
    device: &mut D,
    decoder: &dyn AssetDecoder,
    config: &ViewerConfig,
    file: &str,
) -> Result<MaterialHandle, AssetError> {
    let texture = cache.load_texture(device, decoder, &config.texture_path(file))?;
    let name = Path::new(file)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file);
    Ok(cache.create_material(name, texture))
}

fn piece_transform(position: Vec3, color: PieceColor) -> glam::Mat4 {
    let yaw = match color {
        PieceColor::White => WHITE_YAW,
        PieceColor::Black => BLACK_YAW,
    };
    Transform::from_translation(position)
        .with_yaw_degrees(yaw)
        .with_scale(BOARD_SCALE)
        .matrix()
}

fn tile_transform(cell: Cell) -> glam::Mat4 {
    Transform::from_translation(cell_center(cell))
        .with_scale(BOARD_SCALE)
        .matrix()
}
