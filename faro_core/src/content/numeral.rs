use crate::backend::{AssetSource, GfxHandle};
use crate::error::EngineError;
use crate::texture::Texture;
use faro_ids::AssetId;
use image::RgbaImage;
use log::warn;
use smallvec::SmallVec;

/// Glyph slots: digits 0-9, then minus, then comma
const GLYPH_COUNT: usize = 12;
const GLYPH_MINUS: usize = 10;
const GLYPH_COMMA: usize = 11;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumeralGlyph {
    Digit(u8),
    Minus,
    Comma,
}

impl NumeralGlyph {
    fn slot(self) -> usize {
        match self {
            NumeralGlyph::Digit(d) => d as usize,
            NumeralGlyph::Minus => GLYPH_MINUS,
            NumeralGlyph::Comma => GLYPH_COMMA,
        }
    }
}

/// Integer display composed from digit glyph textures.
///
/// Glyph assets live at `glyph_base + slot` (slot 10 = minus, 11 = comma)
/// and are loaded lazily the first time a value needs them.
pub struct NumeralContent {
    glyph_base: AssetId,
    glyphs: [Option<Texture>; GLYPH_COUNT],
    /// Pixel gap between adjacent glyphs
    pub gap: i32,
    pub show_comma: bool,
    /// Left-pad with zeros up to this many digits; 0 disables padding
    pub min_digits: usize,
    value: i64,
    run: SmallVec<[NumeralGlyph; 16]>,
    texture: Option<Texture>,
}

impl NumeralContent {
    pub fn new(glyph_base: AssetId, gap: i32, show_comma: bool, min_digits: usize) -> Self {
        Self {
            glyph_base,
            glyphs: Default::default(),
            gap,
            show_comma,
            min_digits,
            value: 0,
            run: SmallVec::new(),
            texture: None,
        }
    }

    /// Format `value` and compose the matching glyph textures left-to-right
    /// into one freshly sized texture.
    pub fn set_value(
        &mut self,
        gfx: &GfxHandle,
        assets: &mut dyn AssetSource,
        value: i64,
    ) -> Result<(), EngineError> {
        let run = format_glyphs(value, self.show_comma, self.min_digits);

        // Make sure every glyph the run needs is resident before composing,
        // so a missing asset leaves the previous texture in place.
        for glyph in &run {
            let slot = glyph.slot();
            if self.glyphs[slot].is_none() {
                let index = AssetId::new(self.glyph_base.as_u32() + slot as u32);
                let Some(image) = assets.image_by_index(index) else {
                    warn!("numeral glyph asset {index} not found");
                    return Err(EngineError::AssetNotFound(index.to_string()));
                };
                self.glyphs[slot] = Some(Texture::upload(gfx, &image));
            }
        }

        let mut width = 0i32;
        let mut height = 0u32;
        for (i, glyph) in run.iter().enumerate() {
            let tex = self.glyphs[glyph.slot()].as_ref().unwrap();
            if i > 0 {
                width += self.gap;
            }
            width += tex.width() as i32;
            height = height.max(tex.height());
        }

        let composed = Texture::upload(gfx, &RgbaImage::new(width.max(0) as u32, height));
        {
            let mut backend = gfx.borrow_mut();
            let mut x = 0i32;
            for glyph in &run {
                let tex = self.glyphs[glyph.slot()].as_ref().unwrap();
                backend.blit(composed.id(), tex.id(), None, x, 0);
                x += tex.width() as i32 + self.gap;
            }
        }

        self.value = value;
        self.run = run;
        self.texture = Some(composed);
        Ok(())
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn glyph_run(&self) -> &[NumeralGlyph] {
        &self.run
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    pub fn size(&self) -> (u32, u32) {
        self.texture.as_ref().map(Texture::size).unwrap_or((0, 0))
    }
}

impl std::fmt::Debug for NumeralContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NumeralContent")
            .field("value", &self.value)
            .field("run", &self.run)
            .finish()
    }
}

/// Glyph sequence for one integer: optional minus first, then decimal
/// digits most-significant-first, a comma before every remaining group of
/// three when enabled, zero-padded up to `min_digits`.
pub fn format_glyphs(
    value: i64,
    show_comma: bool,
    min_digits: usize,
) -> SmallVec<[NumeralGlyph; 16]> {
    let mut digits: SmallVec<[u8; 20]> = SmallVec::new();
    let mut rest = value.unsigned_abs();
    loop {
        digits.push((rest % 10) as u8);
        rest /= 10;
        if rest == 0 {
            break;
        }
    }
    while digits.len() < min_digits {
        digits.push(0);
    }
    digits.reverse();

    let mut run = SmallVec::new();
    if value < 0 {
        run.push(NumeralGlyph::Minus);
    }
    let n = digits.len();
    for (i, &d) in digits.iter().enumerate() {
        if show_comma && i > 0 && (n - i) % 3 == 0 {
            run.push(NumeralGlyph::Comma);
        }
        run.push(NumeralGlyph::Digit(d));
    }
    run
}
