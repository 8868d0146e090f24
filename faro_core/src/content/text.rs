use crate::backend::GfxHandle;
use crate::structs2d::Color;
use crate::texture::Texture;
use smallvec::SmallVec;

/// One laid-out glyph: character plus its top-left position in the slot
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedGlyph {
    pub ch: char,
    pub x: u32,
    pub y: u32,
}

/// Incrementally laid-out text.
///
/// Layout is append-only: each `append` extends the running cursor and grows
/// the bounding box; there is no re-layout from scratch. Resetting the slot
/// is the only way to start over. Character iteration goes through `char`s,
/// so multi-byte input segments correctly.
#[derive(Debug, Default)]
pub struct TextContent {
    texture: Option<Texture>,
    glyphs: SmallVec<[PlacedGlyph; 32]>,
    cursor_x: u32,
    cursor_y: u32,
    /// Tallest glyph seen on the current line
    line_height: u32,
    width: u32,
    height: u32,
    pub color: Color,
}

impl TextContent {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// Append text at the running cursor. A newline starts a new line; the
    /// line height grows to the tallest glyph seen on that line.
    pub fn append(&mut self, gfx: &GfxHandle, text: &str) {
        let mut appended: SmallVec<[PlacedGlyph; 32]> = SmallVec::new();
        {
            let backend = gfx.borrow();
            for ch in text.chars() {
                if ch == '\n' {
                    self.cursor_y += self.line_height;
                    self.cursor_x = 0;
                    self.line_height = 0;
                    continue;
                }
                let (gw, gh) = backend.glyph_size(ch);
                appended.push(PlacedGlyph {
                    ch,
                    x: self.cursor_x,
                    y: self.cursor_y,
                });
                self.cursor_x += gw;
                self.line_height = self.line_height.max(gh);
                self.width = self.width.max(self.cursor_x);
                self.height = self.height.max(self.cursor_y + self.line_height);
            }
        }

        if self.width == 0 || self.height == 0 {
            self.glyphs.extend(appended);
            return;
        }

        // Regrow the slot texture: carry the old pixels over, then draw only
        // the appended glyphs.
        let grown = Texture::create(gfx, self.width, self.height);
        if let Some(old) = self.texture.take() {
            gfx.borrow_mut().blit(grown.id(), old.id(), None, 0, 0);
        }
        {
            let mut backend = gfx.borrow_mut();
            let mut buf = [0u8; 4];
            for glyph in &appended {
                backend.render_text(
                    grown.id(),
                    glyph.x as i32,
                    glyph.y as i32,
                    glyph.ch.encode_utf8(&mut buf),
                    self.color,
                );
            }
        }
        self.texture = Some(grown);
        self.glyphs.extend(appended);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    pub fn glyphs(&self) -> &[PlacedGlyph] {
        &self.glyphs
    }
}
