//! Clip container format, little-endian throughout.
//!
//! Header: magic `FVA1`, `u16` stage width (px), `u16` stage height,
//! `u16` frame rate (fps), `u16` frame count. Then tags until the stream
//! ends: `u16` header packing `code << 6 | length`, with length 0x3F
//! followed by a `u32` extended length (the usual SWF envelope).
//!
//! Supported tag codes (SWF numbering):
//!
//! | code | tag                | payload |
//! |------|--------------------|---------|
//! | 0    | End                | — |
//! | 1    | ShowFrame          | — |
//! | 12   | DoAction           | action bytes until 0x00 |
//! | 14   | DefineSound        | id, rate code, bits, channels, count, pcm |
//! | 15   | StartSound         | id |
//! | 20   | DefineBitsLossless | id, w, h, raw RGBA |
//! | 26   | PlaceObject2       | flags, depth, optional fields |
//! | 28   | RemoveObject2      | depth |
//! | 32   | DefineShape        | id, fill RGBA, bounds |
//! | 39   | DefineSprite       | id, frame count, nested tags |
//!
//! Clips are curated content: anything outside this subset is a loader or
//! content mismatch and parsing aborts.

use crate::backend::BlendMode;
use crate::structs2d::{Color, Rect};
use faro_ids::CharacterId;
use glam::Mat3;
use image::RgbaImage;

/// Row-major 2x3 affine: `[a c tx; b d ty]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix2D {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Matrix2D {
    pub const IDENTITY: Matrix2D = Matrix2D {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// `self * rhs` (rhs applied first)
    pub fn concat(&self, rhs: &Matrix2D) -> Matrix2D {
        Matrix2D {
            a: self.a * rhs.a + self.c * rhs.b,
            b: self.b * rhs.a + self.d * rhs.b,
            c: self.a * rhs.c + self.c * rhs.d,
            d: self.b * rhs.c + self.d * rhs.d,
            tx: self.a * rhs.tx + self.c * rhs.ty + self.tx,
            ty: self.b * rhs.tx + self.d * rhs.ty + self.ty,
        }
    }

    pub fn to_mat3(&self) -> Mat3 {
        Mat3::from_cols(
            glam::Vec3::new(self.a, self.b, 0.0),
            glam::Vec3::new(self.c, self.d, 0.0),
            glam::Vec3::new(self.tx, self.ty, 1.0),
        )
    }
}

impl Default for Matrix2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Per-channel color transform: value * mul / 255 + add, clamped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorTransform {
    pub mul: [u8; 4],
    pub add: [i16; 4],
}

impl ColorTransform {
    pub const IDENTITY: ColorTransform = ColorTransform {
        mul: [255; 4],
        add: [0; 4],
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn apply(&self, channel: usize, value: u8) -> u8 {
        let v = value as i32 * self.mul[channel] as i32 / 255 + self.add[channel] as i32;
        v.clamp(0, 255) as u8
    }
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Play,
    Stop,
    GotoFrame(u16),
}

/// Raw PCM sound definition
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoundDef {
    pub sample_rate: u32,
    pub bits: u8,
    pub channels: u8,
    pub sample_count: u32,
    pub samples: Vec<u8>,
}

/// Flag-gated display-list edit. Absent fields keep whatever the entry at
/// that depth already has.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaceObject {
    pub depth: u16,
    pub is_move: bool,
    pub character: Option<CharacterId>,
    pub matrix: Option<Matrix2D>,
    pub cxform: Option<ColorTransform>,
    pub blend: Option<BlendMode>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Tag {
    End,
    ShowFrame,
    DoAction(Vec<Action>),
    DefineSound { id: CharacterId, def: SoundDef },
    StartSound { id: CharacterId },
    DefineBitmap { id: CharacterId, pixels: RgbaImage },
    Place(PlaceObject),
    Remove { depth: u16 },
    DefineShape { id: CharacterId, fill: Color, bounds: Rect },
    DefineSprite { id: CharacterId, frame_count: u16, tags: Vec<Tag> },
}

/// Parsed clip: header plus the full tag list the player walks with its
/// cursor.
#[derive(Clone, Debug)]
pub struct FlashStream {
    pub width: u16,
    pub height: u16,
    pub frame_rate: u16,
    pub frame_count: u16,
    pub tags: Vec<Tag>,
}

impl FlashStream {
    /// Parse a clip. Malformed or unsupported content aborts: clips are
    /// authored against exactly this subset, so a mismatch means the wrong
    /// asset reached the engine.
    pub fn parse(bytes: &[u8]) -> FlashStream {
        let mut r = Reader::new(bytes);
        let magic = r.take(4);
        if magic != b"FVA1" {
            panic!("vector animation stream: bad magic {magic:02x?}");
        }
        let width = r.read_u16();
        let height = r.read_u16();
        let frame_rate = r.read_u16();
        let frame_count = r.read_u16();

        let mut tags = Vec::new();
        while !r.at_end() {
            let tag = parse_tag(&mut r);
            let end = matches!(tag, Tag::End);
            tags.push(tag);
            if end {
                break;
            }
        }

        FlashStream {
            width,
            height,
            frame_rate,
            frame_count,
            tags,
        }
    }
}

fn parse_tag(r: &mut Reader) -> Tag {
    let header = r.read_u16();
    let code = header >> 6;
    let mut len = (header & 0x3F) as u32;
    if len == 0x3F {
        len = r.read_u32();
    }
    let payload = r.take(len as usize);
    let mut p = Reader::new(payload);

    match code {
        0 => Tag::End,
        1 => Tag::ShowFrame,
        12 => Tag::DoAction(parse_actions(&mut p)),
        14 => {
            let id = CharacterId::new(p.read_u16());
            let rate_code = p.read_u8();
            let bits = p.read_u8();
            let channels = p.read_u8();
            let sample_count = p.read_u32();
            let samples = p.rest().to_vec();
            let sample_rate = match rate_code {
                0 => 5512,
                1 => 11025,
                2 => 22050,
                3 => 44100,
                other => panic!("vector animation stream: bad sample rate code {other}"),
            };
            Tag::DefineSound {
                id,
                def: SoundDef {
                    sample_rate,
                    bits,
                    channels,
                    sample_count,
                    samples,
                },
            }
        }
        15 => Tag::StartSound {
            id: CharacterId::new(p.read_u16()),
        },
        20 => {
            let id = CharacterId::new(p.read_u16());
            let w = p.read_u16() as u32;
            let h = p.read_u16() as u32;
            let data = p.take((w * h * 4) as usize).to_vec();
            let pixels = RgbaImage::from_raw(w, h, data)
                .unwrap_or_else(|| panic!("vector animation stream: bitmap {id} size mismatch"));
            Tag::DefineBitmap { id, pixels }
        }
        26 => {
            let flags = p.read_u8();
            let depth = p.read_u16();
            let is_move = flags & 0x01 != 0;
            let character = (flags & 0x02 != 0).then(|| CharacterId::new(p.read_u16()));
            let matrix = (flags & 0x04 != 0).then(|| Matrix2D {
                a: p.read_f32(),
                b: p.read_f32(),
                c: p.read_f32(),
                d: p.read_f32(),
                tx: p.read_f32(),
                ty: p.read_f32(),
            });
            let cxform = (flags & 0x08 != 0).then(|| {
                let mul = [p.read_u8(), p.read_u8(), p.read_u8(), p.read_u8()];
                let add = [p.read_i16(), p.read_i16(), p.read_i16(), p.read_i16()];
                ColorTransform { mul, add }
            });
            let blend = (flags & 0x10 != 0).then(|| {
                let code = p.read_u8();
                BlendMode::from_code(code)
                    .unwrap_or_else(|| panic!("vector animation stream: bad blend code {code}"))
            });
            Tag::Place(PlaceObject {
                depth,
                is_move,
                character,
                matrix,
                cxform,
                blend,
            })
        }
        28 => Tag::Remove { depth: p.read_u16() },
        32 => {
            let id = CharacterId::new(p.read_u16());
            let fill = Color::new(p.read_u8(), p.read_u8(), p.read_u8(), p.read_u8());
            let bounds = Rect::new(p.read_f32(), p.read_f32(), p.read_f32(), p.read_f32());
            Tag::DefineShape { id, fill, bounds }
        }
        39 => {
            let id = CharacterId::new(p.read_u16());
            let frame_count = p.read_u16();
            let mut tags = Vec::new();
            while !p.at_end() {
                let tag = parse_tag(&mut p);
                let end = matches!(tag, Tag::End);
                tags.push(tag);
                if end {
                    break;
                }
            }
            Tag::DefineSprite {
                id,
                frame_count,
                tags,
            }
        }
        other => panic!("vector animation stream: unsupported tag code {other}"),
    }
}

fn parse_actions(p: &mut Reader) -> Vec<Action> {
    let mut actions = Vec::new();
    loop {
        if p.at_end() {
            break;
        }
        match p.read_u8() {
            0x00 => break,
            0x06 => actions.push(Action::Play),
            0x07 => actions.push(Action::Stop),
            0x81 => {
                let len = p.read_u16();
                if len != 2 {
                    panic!("vector animation stream: GotoFrame length {len}");
                }
                actions.push(Action::GotoFrame(p.read_u16()));
            }
            other => panic!("vector animation stream: unsupported action {other:#04x}"),
        }
    }
    actions
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, n: usize) -> &'a [u8] {
        if self.pos + n > self.data.len() {
            panic!(
                "vector animation stream truncated at byte {} (wanted {n} more)",
                self.pos
            );
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        out
    }

    fn rest(&mut self) -> &'a [u8] {
        let out = &self.data[self.pos..];
        self.pos = self.data.len();
        out
    }

    fn read_u8(&mut self) -> u8 {
        self.take(1)[0]
    }

    fn read_u16(&mut self) -> u16 {
        let b = self.take(2);
        u16::from_le_bytes([b[0], b[1]])
    }

    fn read_i16(&mut self) -> i16 {
        let b = self.take(2);
        i16::from_le_bytes([b[0], b[1]])
    }

    fn read_u32(&mut self) -> u32 {
        let b = self.take(4);
        u32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }

    fn read_f32(&mut self) -> f32 {
        let b = self.take(4);
        f32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StreamBuilder;

    #[test]
    fn header_roundtrip() {
        let bytes = StreamBuilder::new(320, 240, 30, 2).show_frame().show_frame().end().build();
        let stream = FlashStream::parse(&bytes);
        assert_eq!((stream.width, stream.height), (320, 240));
        assert_eq!(stream.frame_rate, 30);
        assert_eq!(stream.frame_count, 2);
        assert_eq!(stream.tags.len(), 3);
    }

    #[test]
    #[should_panic(expected = "bad magic")]
    fn bad_magic_is_fatal() {
        FlashStream::parse(b"NOPE\x00\x00\x00\x00\x00\x00\x00\x00");
    }

    #[test]
    #[should_panic(expected = "unsupported tag code")]
    fn unknown_tag_is_fatal() {
        let mut bytes = StreamBuilder::new(8, 8, 10, 1).build();
        // tag code 63 << 6, zero length
        bytes.extend_from_slice(&((63u16 << 6) | 0).to_le_bytes());
        FlashStream::parse(&bytes);
    }

    #[test]
    fn place_object_flags_gate_fields() {
        let bytes = StreamBuilder::new(8, 8, 10, 1)
            .place_character(1, 5, Some(Matrix2D { tx: 3.0, ..Matrix2D::IDENTITY }))
            .show_frame()
            .end()
            .build();
        let stream = FlashStream::parse(&bytes);
        let Tag::Place(po) = &stream.tags[0] else {
            panic!("expected place tag")
        };
        assert_eq!(po.depth, 5);
        assert_eq!(po.character, Some(CharacterId::new(1)));
        assert_eq!(po.matrix.unwrap().tx, 3.0);
        assert!(po.cxform.is_none());
        assert!(po.blend.is_none());
    }
}
