//! Collaborator seams: graphics, assets, audio and input live behind traits
//! so the engine can be driven headless in tests and plugged into whichever
//! render/audio stack the host uses.

use crate::structs2d::{Color, Rect, Vector2};
use faro_ids::{AssetId, SoundId, TextureId};
use glam::Mat3;
use image::RgbaImage;
use std::cell::RefCell;
use std::rc::Rc;

/// Blend mode for composited draws
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Additive,
    Multiply,
}

impl BlendMode {
    /// Wire code used by the vector-animation stream
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(BlendMode::Normal),
            1 => Some(BlendMode::Additive),
            2 => Some(BlendMode::Multiply),
            _ => None,
        }
    }
}

/// Low-level 2D texture backend.
///
/// All calls are synchronous; the engine is frame-stepped and single-threaded
/// (a slow upload blocks the frame, which the host accepts).
pub trait GraphicsBackend {
    /// Allocate a blank (transparent) texture
    fn create(&mut self, width: u32, height: u32) -> TextureId;
    /// Upload decoded RGBA pixels as a new texture
    fn upload(&mut self, image: &RgbaImage) -> TextureId;
    /// Release a texture. Ids are never reused within a frame.
    fn delete(&mut self, id: TextureId);
    /// Copy `src` (or a sub-rect of it) into `dst` at (x, y). `src` and
    /// `dst` may be the same texture (same-canvas region copy).
    fn blit(&mut self, dst: TextureId, src: TextureId, src_rect: Option<Rect>, x: i32, y: i32);
    /// Fill a region of `dst`, alpha included
    fn fill(&mut self, dst: TextureId, rect: Rect, color: Color);
    /// Rasterize text into `dst` with the UI font; returns the drawn size
    fn render_text(&mut self, dst: TextureId, x: i32, y: i32, text: &str, color: Color) -> Vector2;
    /// Advance/height of one glyph in the UI font, for layout
    fn glyph_size(&self, ch: char) -> (u32, u32);
    /// Draw a texture through an arbitrary affine transform (vector clips)
    fn render_generic(&mut self, id: TextureId, transform: Mat3, blend: BlendMode);
}

/// Shared handle to the graphics backend. Texture handles keep a clone so
/// their destructor can release the backend resource.
pub type GfxHandle = Rc<RefCell<dyn GraphicsBackend>>;

/// Asset resolver: names/indices to decoded images. Lookups are fallible;
/// a missing asset is a recoverable condition for the caller.
pub trait AssetSource {
    fn image_by_index(&mut self, index: AssetId) -> Option<RgbaImage>;
    fn image_by_name(&mut self, name: &str) -> Option<RgbaImage>;
    /// Resolve a name to its archive index (cached by callers)
    fn index_of(&mut self, name: &str) -> Option<AssetId>;
}

/// Fire-and-forget audio submission. No channel management here — the engine
/// only ever triggers playback.
pub trait AudioBackend {
    /// Play an archived sound effect by index
    fn play_se(&mut self, sound: SoundId);
    /// Play a synthesized PCM container (RIFF/WAV bytes)
    fn play_pcm(&mut self, container: Vec<u8>);
}

pub type AudioHandle = Rc<RefCell<dyn AudioBackend>>;

/// Mouse button codes, as polled from the host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Host input polling
pub trait InputSource {
    fn mouse_position(&self) -> Vector2;
    fn button_down(&self, button: MouseButton) -> bool;
}
