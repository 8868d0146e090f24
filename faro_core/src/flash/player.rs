use crate::backend::{AudioBackend, BlendMode, GfxHandle};
use crate::flash::display_list::DisplayList;
use crate::flash::sound::synthesize_wav;
use crate::flash::stream::{Action, ColorTransform, FlashStream, Matrix2D, SoundDef, Tag};
use crate::structs2d::{Color, Rect};
use crate::texture::Texture;
use faro_ids::CharacterId;
use image::RgbaImage;
use rustc_hash::FxHashMap;
use std::rc::Rc;

struct BitmapDef {
    image: RgbaImage,
    texture: Option<Texture>,
}

struct ShapeDef {
    fill: Color,
    bounds: Rect,
    texture: Option<Texture>,
}

/// Cached single-object sprite: placing the sprite id places its inner
/// character through the template transform.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteTemplate {
    pub character: CharacterId,
    pub matrix: Matrix2D,
    pub cxform: ColorTransform,
    pub blend: BlendMode,
}

/// Tag-stream interpreter for one clip instance.
///
/// Seeking is strictly forward: the cursor only advances, and a backward
/// seek resets to frame 0 (clearing every cache and the display list) and
/// replays. Definitions encountered again during a replay are not redecoded.
pub struct FlashPlayer {
    stream: Rc<FlashStream>,
    cursor: usize,
    current_frame: u32,
    stopped: bool,
    elapsed_ms: f32,
    bitmaps: FxHashMap<CharacterId, BitmapDef>,
    shapes: FxHashMap<CharacterId, ShapeDef>,
    sounds: FxHashMap<CharacterId, SoundDef>,
    sprites: FxHashMap<CharacterId, SpriteTemplate>,
    display: DisplayList,
    /// Per-depth tinted texture cache for non-identity color transforms
    tinted: FxHashMap<u16, (ColorTransform, CharacterId, Texture)>,
}

impl FlashPlayer {
    /// Parse a clip and start at frame 0 with everything cleared
    pub fn load(bytes: &[u8]) -> Self {
        Self {
            stream: Rc::new(FlashStream::parse(bytes)),
            cursor: 0,
            current_frame: 0,
            stopped: false,
            elapsed_ms: 0.0,
            bitmaps: FxHashMap::default(),
            shapes: FxHashMap::default(),
            sounds: FxHashMap::default(),
            sprites: FxHashMap::default(),
            display: DisplayList::default(),
            tinted: FxHashMap::default(),
        }
    }

    pub fn stream(&self) -> &FlashStream {
        &self.stream
    }

    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn display(&self) -> &DisplayList {
        &self.display
    }

    pub fn size(&self) -> (u32, u32) {
        (self.stream.width as u32, self.stream.height as u32)
    }

    /// Seek to a frame. No-op when already there; backward seeks reset and
    /// replay from frame 0 (silently — the sounds on the way were already
    /// heard the first time through).
    pub fn seek(&mut self, frame: u32, audio: &mut dyn AudioBackend) {
        if frame == self.current_frame {
            return;
        }
        if frame < self.current_frame {
            self.reset();
            self.advance_to(frame, audio, true, false);
        } else {
            self.advance_to(frame, audio, false, false);
        }
    }

    /// Advance the clip clock: whole elapsed frames seek forward, the
    /// remainder carries to the next call. Does nothing while stopped.
    pub fn update(&mut self, dt_ms: f32, audio: &mut dyn AudioBackend) {
        if self.stopped {
            return;
        }
        self.elapsed_ms += dt_ms;
        let frame_ms = 1000.0 / self.stream.frame_rate.max(1) as f32;
        let steps = (self.elapsed_ms / frame_ms) as u32;
        if steps > 0 {
            self.elapsed_ms -= steps as f32 * frame_ms;
            let target = self.current_frame + steps;
            self.advance_to(target, audio, false, true);
        }
    }

    /// Back to the load state: frame 0, caches and display list cleared.
    /// The update-time remainder is pacing state, not tag-machine state, and
    /// survives.
    fn reset(&mut self) {
        self.cursor = 0;
        self.current_frame = 0;
        self.stopped = false;
        self.bitmaps.clear();
        self.shapes.clear();
        self.sounds.clear();
        self.sprites.clear();
        self.display.clear();
        self.tinted.clear();
    }

    /// Consume tags until the frame counter reaches `target` or the stream
    /// ends. Returns early when a GotoFrame action re-seeks — the jump
    /// supersedes the original target. `respect_stop` makes a Stop action
    /// halt the advance (clock-driven updates); explicit seeks push through.
    fn advance_to(
        &mut self,
        target: u32,
        audio: &mut dyn AudioBackend,
        silent: bool,
        respect_stop: bool,
    ) {
        let stream = self.stream.clone();
        while self.current_frame < target {
            let Some(tag) = stream.tags.get(self.cursor) else {
                self.stopped = true;
                return;
            };
            self.cursor += 1;
            match tag {
                Tag::ShowFrame => self.current_frame += 1,
                Tag::End => {
                    self.stopped = true;
                    return;
                }
                Tag::DefineBitmap { id, pixels } => {
                    self.bitmaps.entry(*id).or_insert_with(|| BitmapDef {
                        image: pixels.clone(),
                        texture: None,
                    });
                }
                Tag::DefineShape { id, fill, bounds } => {
                    self.shapes.entry(*id).or_insert_with(|| ShapeDef {
                        fill: *fill,
                        bounds: *bounds,
                        texture: None,
                    });
                }
                Tag::DefineSound { id, def } => {
                    self.sounds.entry(*id).or_insert_with(|| def.clone());
                }
                Tag::DefineSprite {
                    id,
                    frame_count,
                    tags,
                } => {
                    if !self.sprites.contains_key(id) {
                        let template = validate_sprite(*id, *frame_count, tags);
                        self.sprites.insert(*id, template);
                    }
                }
                Tag::Place(po) => {
                    self.display.place(po);
                    self.tinted.remove(&po.depth);
                }
                Tag::Remove { depth } => {
                    self.display.remove(*depth);
                    self.tinted.remove(depth);
                }
                Tag::StartSound { id } => {
                    if !silent {
                        let Some(def) = self.sounds.get(id) else {
                            panic!("vector animation: start of undefined sound {id}");
                        };
                        audio.play_pcm(synthesize_wav(def));
                    }
                }
                Tag::DoAction(actions) => {
                    for action in actions {
                        match action {
                            Action::Play => self.stopped = false,
                            Action::Stop => self.stopped = true,
                            Action::GotoFrame(frame) => {
                                // the jump takes over; remaining actions and
                                // the original target are abandoned
                                self.seek(*frame as u32, audio);
                                return;
                            }
                        }
                    }
                    if respect_stop && self.stopped {
                        return;
                    }
                }
            }
        }
    }

    /// Draw the display list in depth order. Bitmap/shape textures upload
    /// lazily; non-identity color transforms go through a per-depth tinted
    /// texture cache.
    pub fn draw(&mut self, gfx: &GfxHandle) {
        let entries: Vec<_> = self.display.iter().map(|(d, o)| (d, o.clone())).collect();
        for (depth, obj) in entries {
            let (character, matrix, cxform, blend) = match self.sprites.get(&obj.character) {
                Some(template) => (
                    template.character,
                    obj.matrix.concat(&template.matrix),
                    if obj.cxform.is_identity() {
                        template.cxform
                    } else {
                        obj.cxform
                    },
                    if obj.blend == BlendMode::Normal {
                        template.blend
                    } else {
                        obj.blend
                    },
                ),
                None => (obj.character, obj.matrix, obj.cxform, obj.blend),
            };

            // shapes draw at their bounds offset
            let matrix = match self.shapes.get(&character) {
                Some(shape) => matrix.concat(&Matrix2D {
                    tx: shape.bounds.x,
                    ty: shape.bounds.y,
                    ..Matrix2D::IDENTITY
                }),
                None => matrix,
            };

            let texture = self.resolve_texture(gfx, depth, character, &cxform);
            gfx.borrow_mut()
                .render_generic(texture, matrix.to_mat3(), blend);
        }
    }

    fn resolve_texture(
        &mut self,
        gfx: &GfxHandle,
        depth: u16,
        character: CharacterId,
        cxform: &ColorTransform,
    ) -> faro_ids::TextureId {
        if cxform.is_identity() {
            if let Some(bitmap) = self.bitmaps.get_mut(&character) {
                if bitmap.texture.is_none() {
                    bitmap.texture = Some(Texture::upload(gfx, &bitmap.image));
                }
                return bitmap.texture.as_ref().unwrap().id();
            }
            if let Some(shape) = self.shapes.get_mut(&character) {
                if shape.texture.is_none() {
                    shape.texture = Some(Texture::upload(gfx, &solid_image(shape.fill, &shape.bounds)));
                }
                return shape.texture.as_ref().unwrap().id();
            }
        } else {
            if let Some((cached_cx, cached_char, texture)) = self.tinted.get(&depth) {
                if cached_cx == cxform && *cached_char == character {
                    return texture.id();
                }
            }
            let base = if let Some(bitmap) = self.bitmaps.get(&character) {
                bitmap.image.clone()
            } else if let Some(shape) = self.shapes.get(&character) {
                solid_image(shape.fill, &shape.bounds)
            } else {
                panic!("vector animation: display list references undefined character {character}");
            };
            let mut tinted = base;
            for pixel in tinted.pixels_mut() {
                for channel in 0..4 {
                    pixel.0[channel] = cxform.apply(channel, pixel.0[channel]);
                }
            }
            let texture = Texture::upload(gfx, &tinted);
            let id = texture.id();
            self.tinted.insert(depth, (*cxform, character, texture));
            return id;
        }
        panic!("vector animation: display list references undefined character {character}");
    }

    /// Cache-state fingerprint used by tests to compare seek paths
    #[cfg(test)]
    pub(crate) fn cache_keys(&self) -> (Vec<u16>, Vec<u16>, Vec<u16>, Vec<u16>) {
        let mut b: Vec<u16> = self.bitmaps.keys().map(|k| k.as_u16()).collect();
        let mut s: Vec<u16> = self.shapes.keys().map(|k| k.as_u16()).collect();
        let mut n: Vec<u16> = self.sounds.keys().map(|k| k.as_u16()).collect();
        let mut p: Vec<u16> = self.sprites.keys().map(|k| k.as_u16()).collect();
        b.sort_unstable();
        s.sort_unstable();
        n.sort_unstable();
        p.sort_unstable();
        (b, s, n, p)
    }
}

impl std::fmt::Debug for FlashPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlashPlayer")
            .field("frame", &self.current_frame)
            .field("stopped", &self.stopped)
            .field("placed", &self.display.len())
            .finish()
    }
}

fn solid_image(fill: Color, bounds: &Rect) -> RgbaImage {
    let w = bounds.w.max(1.0) as u32;
    let h = bounds.h.max(1.0) as u32;
    RgbaImage::from_pixel(w, h, image::Rgba([fill.r, fill.g, fill.b, fill.a]))
}

/// A sprite definition must describe exactly one placed object shown for
/// exactly one frame; anything richer is a content/engine mismatch.
fn validate_sprite(id: CharacterId, frame_count: u16, tags: &[Tag]) -> SpriteTemplate {
    if frame_count != 1 {
        panic!("vector animation: sprite {id} declares {frame_count} frames, expected 1");
    }
    let mut place = None;
    let mut frames_shown = 0u32;
    for tag in tags {
        match tag {
            Tag::Place(po) => {
                if place.is_some() {
                    panic!("vector animation: sprite {id} places more than one object");
                }
                place = Some(po);
            }
            Tag::ShowFrame => frames_shown += 1,
            Tag::End => break,
            other => panic!("vector animation: sprite {id} holds unsupported tag {other:?}"),
        }
    }
    if frames_shown != 1 {
        panic!("vector animation: sprite {id} shows {frames_shown} frames, expected 1");
    }
    let Some(po) = place else {
        panic!("vector animation: sprite {id} places no object");
    };
    let Some(character) = po.character else {
        panic!("vector animation: sprite {id} place names no character");
    };
    SpriteTemplate {
        character,
        matrix: po.matrix.unwrap_or_default(),
        cxform: po.cxform.unwrap_or_default(),
        blend: po.blend.unwrap_or_default(),
    }
}
