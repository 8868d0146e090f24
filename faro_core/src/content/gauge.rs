use crate::backend::{AssetSource, GfxHandle};
use crate::error::EngineError;
use crate::texture::Texture;
use faro_ids::AssetId;
use image::RgbaImage;
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GaugeOrientation {
    Horizontal,
    Vertical,
}

/// Partial reveal of a "full" gauge texture.
///
/// Given a fill rate, `floor(rate * extent)` pixels of the full image stay
/// visible along the gauge axis (left-to-right / top-to-bottom); the rest
/// has its alpha zeroed. The rate is clamped to [0, 1] — out-of-range
/// fractions would otherwise index outside the image.
pub struct GaugeContent {
    orientation: GaugeOrientation,
    full: RgbaImage,
    texture: Texture,
    rate: f32,
}

impl GaugeContent {
    pub fn load(
        gfx: &GfxHandle,
        assets: &mut dyn AssetSource,
        asset: AssetId,
        orientation: GaugeOrientation,
    ) -> Result<Self, EngineError> {
        let Some(full) = assets.image_by_index(asset) else {
            warn!("gauge asset {asset} not found");
            return Err(EngineError::AssetNotFound(asset.to_string()));
        };
        let texture = Texture::upload(gfx, &full);
        Ok(Self {
            orientation,
            full,
            texture,
            rate: 1.0,
        })
    }

    /// Set the fill rate as a fraction
    pub fn set_rate(&mut self, gfx: &GfxHandle, numer: i32, denom: i32) {
        let rate = if denom == 0 {
            0.0
        } else {
            numer as f32 / denom as f32
        };
        self.set_rate_f(gfx, rate);
    }

    pub fn set_rate_f(&mut self, gfx: &GfxHandle, rate: f32) {
        self.rate = rate.clamp(0.0, 1.0);

        let extent = match self.orientation {
            GaugeOrientation::Horizontal => self.full.width(),
            GaugeOrientation::Vertical => self.full.height(),
        };
        let revealed = (extent as f32 * self.rate) as u32;

        let mut masked = self.full.clone();
        for (x, y, pixel) in masked.enumerate_pixels_mut() {
            let along = match self.orientation {
                GaugeOrientation::Horizontal => x,
                GaugeOrientation::Vertical => y,
            };
            if along >= revealed {
                pixel.0[3] = 0;
            }
        }
        self.texture = Texture::upload(gfx, &masked);
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Pixels of the full texture currently revealed along the gauge axis
    pub fn revealed(&self) -> u32 {
        let extent = match self.orientation {
            GaugeOrientation::Horizontal => self.full.width(),
            GaugeOrientation::Vertical => self.full.height(),
        };
        (extent as f32 * self.rate) as u32
    }

    pub fn orientation(&self) -> GaugeOrientation {
        self.orientation
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn size(&self) -> (u32, u32) {
        (self.full.width(), self.full.height())
    }
}

impl std::fmt::Debug for GaugeContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaugeContent")
            .field("orientation", &self.orientation)
            .field("rate", &self.rate)
            .finish()
    }
}
