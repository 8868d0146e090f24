//! Recording mock backends for unit tests. Everything the engine would send
//! to the GPU/audio/host is captured in shared logs the tests can inspect.

use crate::backend::{
    AssetSource, AudioBackend, AudioHandle, BlendMode, GfxHandle, GraphicsBackend, InputSource,
    MouseButton,
};
use crate::structs2d::{Color, Rect, Vector2};
use faro_ids::{AssetId, SoundId, TextureId};
use glam::Mat3;
use image::RgbaImage;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Default)]
pub struct GfxLog {
    pub created: Vec<(TextureId, u32, u32)>,
    pub uploaded: Vec<(TextureId, u32, u32)>,
    pub deleted: Vec<TextureId>,
    pub blits: Vec<(TextureId, TextureId, Option<Rect>, i32, i32)>,
    pub fills: Vec<(TextureId, Rect, Color)>,
    pub texts: Vec<(TextureId, i32, i32, String)>,
    pub draws: Vec<(TextureId, Mat3, BlendMode)>,
}

impl GfxLog {
    /// Live texture count: everything issued minus everything deleted
    pub fn live_textures(&self) -> usize {
        self.created.len() + self.uploaded.len() - self.deleted.len()
    }
}

pub struct MockGfx {
    next_id: u32,
    log: Rc<RefCell<GfxLog>>,
}

impl MockGfx {
    pub fn new_handle() -> (GfxHandle, Rc<RefCell<GfxLog>>) {
        let log = Rc::new(RefCell::new(GfxLog::default()));
        let gfx: GfxHandle = Rc::new(RefCell::new(MockGfx {
            next_id: 1,
            log: log.clone(),
        }));
        (gfx, log)
    }

    fn issue(&mut self) -> TextureId {
        let id = TextureId::new(self.next_id);
        self.next_id += 1;
        id
    }
}

impl GraphicsBackend for MockGfx {
    fn create(&mut self, width: u32, height: u32) -> TextureId {
        let id = self.issue();
        self.log.borrow_mut().created.push((id, width, height));
        id
    }

    fn upload(&mut self, image: &RgbaImage) -> TextureId {
        let id = self.issue();
        self.log
            .borrow_mut()
            .uploaded
            .push((id, image.width(), image.height()));
        id
    }

    fn delete(&mut self, id: TextureId) {
        self.log.borrow_mut().deleted.push(id);
    }

    fn blit(&mut self, dst: TextureId, src: TextureId, src_rect: Option<Rect>, x: i32, y: i32) {
        self.log.borrow_mut().blits.push((dst, src, src_rect, x, y));
    }

    fn fill(&mut self, dst: TextureId, rect: Rect, color: Color) {
        self.log.borrow_mut().fills.push((dst, rect, color));
    }

    fn render_text(&mut self, dst: TextureId, x: i32, y: i32, text: &str, _color: Color) -> Vector2 {
        self.log
            .borrow_mut()
            .texts
            .push((dst, x, y, text.to_string()));
        let w: u32 = text.chars().map(|c| self.glyph_size(c).0).sum();
        Vector2::new(w as f32, 16.0)
    }

    fn glyph_size(&self, ch: char) -> (u32, u32) {
        // Fixed-cell fake font: wide glyphs for CJK, 8x16 otherwise
        if (ch as u32) > 0x7F { (16, 16) } else { (8, 16) }
    }

    fn render_generic(&mut self, id: TextureId, transform: Mat3, blend: BlendMode) {
        self.log.borrow_mut().draws.push((id, transform, blend));
    }
}

/// Asset store backed by in-memory images, addressable by index and name.
#[derive(Default)]
pub struct MockAssets {
    by_index: HashMap<u32, RgbaImage>,
    names: HashMap<String, u32>,
}

impl MockAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, index: u32, name: &str, width: u32, height: u32) {
        self.by_index.insert(index, RgbaImage::new(width, height));
        self.names.insert(name.to_string(), index);
    }

    pub fn put_indexed(&mut self, index: u32, width: u32, height: u32) {
        self.by_index.insert(index, RgbaImage::new(width, height));
    }
}

impl AssetSource for MockAssets {
    fn image_by_index(&mut self, index: AssetId) -> Option<RgbaImage> {
        self.by_index.get(&index.as_u32()).cloned()
    }

    fn image_by_name(&mut self, name: &str) -> Option<RgbaImage> {
        let index = *self.names.get(name)?;
        self.by_index.get(&index).cloned()
    }

    fn index_of(&mut self, name: &str) -> Option<AssetId> {
        self.names.get(name).copied().map(AssetId::new)
    }
}

#[derive(Default)]
pub struct AudioLog {
    pub effects: Vec<SoundId>,
    pub pcm: Vec<Vec<u8>>,
}

pub struct MockAudio {
    log: Rc<RefCell<AudioLog>>,
}

impl MockAudio {
    pub fn new_handle() -> (AudioHandle, Rc<RefCell<AudioLog>>) {
        let log = Rc::new(RefCell::new(AudioLog::default()));
        let audio: AudioHandle = Rc::new(RefCell::new(MockAudio { log: log.clone() }));
        (audio, log)
    }
}

impl AudioBackend for MockAudio {
    fn play_se(&mut self, sound: SoundId) {
        self.log.borrow_mut().effects.push(sound);
    }

    fn play_pcm(&mut self, container: Vec<u8>) {
        self.log.borrow_mut().pcm.push(container);
    }
}

/// Scriptable pointer state shared with the test body.
#[derive(Default)]
pub struct PointerState {
    pub position: Vector2,
    pub left_down: bool,
}

pub struct MockInput {
    state: Rc<RefCell<PointerState>>,
}

impl MockInput {
    pub fn new() -> (Box<Self>, Rc<RefCell<PointerState>>) {
        let state = Rc::new(RefCell::new(PointerState::default()));
        (
            Box::new(MockInput {
                state: state.clone(),
            }),
            state,
        )
    }
}

impl InputSource for MockInput {
    fn mouse_position(&self) -> Vector2 {
        self.state.borrow().position
    }

    fn button_down(&self, button: MouseButton) -> bool {
        match button {
            MouseButton::Left => self.state.borrow().left_down,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Clip stream builder: hand-assembles vector-animation byte streams so the
// player tests don't carry binary fixtures.
// ---------------------------------------------------------------------------

use crate::flash::stream::{Action, ColorTransform, Matrix2D};

pub struct StreamBuilder {
    width: u16,
    height: u16,
    frame_rate: u16,
    frame_count: u16,
    body: Vec<u8>,
}

impl StreamBuilder {
    pub fn new(width: u16, height: u16, frame_rate: u16, frame_count: u16) -> Self {
        Self {
            width,
            height,
            frame_rate,
            frame_count,
            body: Vec::new(),
        }
    }

    fn nested() -> Self {
        Self::new(0, 0, 0, 0)
    }

    fn tag(&mut self, code: u16, payload: &[u8]) -> &mut Self {
        if payload.len() < 0x3F {
            let header = (code << 6) | payload.len() as u16;
            self.body.extend_from_slice(&header.to_le_bytes());
        } else {
            let header = (code << 6) | 0x3F;
            self.body.extend_from_slice(&header.to_le_bytes());
            self.body
                .extend_from_slice(&(payload.len() as u32).to_le_bytes());
        }
        self.body.extend_from_slice(payload);
        self
    }

    pub fn show_frame(&mut self) -> &mut Self {
        self.tag(1, &[])
    }

    pub fn end(&mut self) -> &mut Self {
        self.tag(0, &[])
    }

    pub fn define_bitmap(&mut self, id: u16, w: u16, h: u16) -> &mut Self {
        let mut payload = Vec::new();
        payload.extend_from_slice(&id.to_le_bytes());
        payload.extend_from_slice(&w.to_le_bytes());
        payload.extend_from_slice(&h.to_le_bytes());
        payload.extend(std::iter::repeat(id as u8).take(w as usize * h as usize * 4));
        self.tag(20, &payload)
    }

    pub fn define_shape(&mut self, id: u16, fill: Color, bounds: Rect) -> &mut Self {
        let mut payload = Vec::new();
        payload.extend_from_slice(&id.to_le_bytes());
        payload.extend_from_slice(&[fill.r, fill.g, fill.b, fill.a]);
        for v in [bounds.x, bounds.y, bounds.w, bounds.h] {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        self.tag(32, &payload)
    }

    pub fn define_sound(
        &mut self,
        id: u16,
        rate_code: u8,
        bits: u8,
        channels: u8,
        samples: &[u8],
    ) -> &mut Self {
        let mut payload = Vec::new();
        payload.extend_from_slice(&id.to_le_bytes());
        payload.push(rate_code);
        payload.push(bits);
        payload.push(channels);
        let count = samples.len() as u32 / (bits as u32 / 8) / channels as u32;
        payload.extend_from_slice(&count.to_le_bytes());
        payload.extend_from_slice(samples);
        self.tag(14, &payload)
    }

    pub fn start_sound(&mut self, id: u16) -> &mut Self {
        self.tag(15, &id.to_le_bytes())
    }

    pub fn define_sprite(
        &mut self,
        id: u16,
        frame_count: u16,
        build: impl FnOnce(&mut StreamBuilder),
    ) -> &mut Self {
        let mut inner = StreamBuilder::nested();
        build(&mut inner);
        let mut payload = Vec::new();
        payload.extend_from_slice(&id.to_le_bytes());
        payload.extend_from_slice(&frame_count.to_le_bytes());
        payload.extend_from_slice(&inner.body);
        self.tag(39, &payload)
    }

    fn place(
        &mut self,
        is_move: bool,
        depth: u16,
        character: Option<u16>,
        matrix: Option<Matrix2D>,
        cxform: Option<ColorTransform>,
        blend: Option<u8>,
    ) -> &mut Self {
        let mut flags = 0u8;
        if is_move {
            flags |= 0x01;
        }
        if character.is_some() {
            flags |= 0x02;
        }
        if matrix.is_some() {
            flags |= 0x04;
        }
        if cxform.is_some() {
            flags |= 0x08;
        }
        if blend.is_some() {
            flags |= 0x10;
        }
        let mut payload = vec![flags];
        payload.extend_from_slice(&depth.to_le_bytes());
        if let Some(id) = character {
            payload.extend_from_slice(&id.to_le_bytes());
        }
        if let Some(m) = matrix {
            for v in [m.a, m.b, m.c, m.d, m.tx, m.ty] {
                payload.extend_from_slice(&v.to_le_bytes());
            }
        }
        if let Some(cx) = cxform {
            payload.extend_from_slice(&cx.mul);
            for v in cx.add {
                payload.extend_from_slice(&v.to_le_bytes());
            }
        }
        if let Some(b) = blend {
            payload.push(b);
        }
        self.tag(26, &payload)
    }

    pub fn place_character(
        &mut self,
        id: u16,
        depth: u16,
        matrix: Option<Matrix2D>,
    ) -> &mut Self {
        self.place(false, depth, Some(id), matrix, None, None)
    }

    pub fn place_move_matrix(&mut self, depth: u16, matrix: Matrix2D) -> &mut Self {
        self.place(true, depth, None, Some(matrix), None, None)
    }

    pub fn place_tinted(&mut self, id: u16, depth: u16, cxform: ColorTransform) -> &mut Self {
        self.place(false, depth, Some(id), None, Some(cxform), None)
    }

    pub fn remove(&mut self, depth: u16) -> &mut Self {
        self.tag(28, &depth.to_le_bytes())
    }

    pub fn do_action(&mut self, actions: &[Action]) -> &mut Self {
        let mut payload = Vec::new();
        for action in actions {
            match action {
                Action::Play => payload.push(0x06),
                Action::Stop => payload.push(0x07),
                Action::GotoFrame(frame) => {
                    payload.push(0x81);
                    payload.extend_from_slice(&2u16.to_le_bytes());
                    payload.extend_from_slice(&frame.to_le_bytes());
                }
            }
        }
        payload.push(0x00);
        self.tag(12, &payload)
    }

    pub fn build(&mut self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12 + self.body.len());
        out.extend_from_slice(b"FVA1");
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.frame_rate.to_le_bytes());
        out.extend_from_slice(&self.frame_count.to_le_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}
