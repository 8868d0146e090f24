use crate::backend::{AssetSource, GfxHandle};
use crate::error::EngineError;
use crate::texture::Texture;
use faro_ids::AssetId;
use log::warn;

/// Frame-by-frame raster animation over N pre-loaded textures.
#[derive(Debug)]
pub struct FrameAnimContent {
    frames: Vec<Texture>,
    /// Milliseconds per frame; 0 disables time-driven stepping
    frame_time_ms: f32,
    elapsed_ms: f32,
    current: usize,
}

impl FrameAnimContent {
    /// Load `count` frames from a contiguous asset-index range. Loading is
    /// atomic: a missing frame drops everything loaded so far and reports
    /// the failure.
    pub fn load_range(
        gfx: &GfxHandle,
        assets: &mut dyn AssetSource,
        base: AssetId,
        count: u32,
        frame_time_ms: f32,
    ) -> Result<Self, EngineError> {
        let mut frames = Vec::with_capacity(count as usize);
        for i in 0..count {
            let index = AssetId::new(base.as_u32() + i);
            let Some(image) = assets.image_by_index(index) else {
                warn!("frame animation asset {index} not found, rolling back");
                return Err(EngineError::AssetNotFound(index.to_string()));
            };
            frames.push(Texture::upload(gfx, &image));
        }
        Ok(Self {
            frames,
            frame_time_ms,
            elapsed_ms: 0.0,
            current: 0,
        })
    }

    /// Load `count` frames from a name template; every `{}` in the template
    /// is replaced with the frame index.
    pub fn load_template(
        gfx: &GfxHandle,
        assets: &mut dyn AssetSource,
        template: &str,
        count: u32,
        frame_time_ms: f32,
    ) -> Result<Self, EngineError> {
        let mut frames = Vec::with_capacity(count as usize);
        for i in 0..count {
            let name = template.replace("{}", &i.to_string());
            let Some(image) = assets.image_by_name(&name) else {
                warn!("frame animation asset '{name}' not found, rolling back");
                return Err(EngineError::AssetNotFound(name));
            };
            frames.push(Texture::upload(gfx, &image));
        }
        Ok(Self {
            frames,
            frame_time_ms,
            elapsed_ms: 0.0,
            current: 0,
        })
    }

    /// Advance the elapsed-time accumulator and step to
    /// `floor(elapsed / frame_time) mod N`
    pub fn update(&mut self, dt_ms: f32) {
        if self.frames.is_empty() || self.frame_time_ms <= 0.0 {
            return;
        }
        self.elapsed_ms += dt_ms;
        self.current = (self.elapsed_ms / self.frame_time_ms) as usize % self.frames.len();
    }

    /// Jump to an explicit frame (motion-driven stepping). The accumulator
    /// is re-synced so a later `update` continues from here.
    pub fn set_frame(&mut self, frame: u32) {
        if self.frames.is_empty() {
            return;
        }
        self.current = frame as usize % self.frames.len();
        self.elapsed_ms = self.current as f32 * self.frame_time_ms;
    }

    pub fn current_frame(&self) -> usize {
        self.current
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.frames.get(self.current)
    }

    pub fn size(&self) -> (u32, u32) {
        self.frames.first().map(Texture::size).unwrap_or((0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockAssets, MockGfx};

    fn anim(frame_time: f32) -> (FrameAnimContent, crate::backend::GfxHandle) {
        let (gfx, _log) = MockGfx::new_handle();
        let mut assets = MockAssets::new();
        for i in 0..4 {
            assets.put_indexed(10 + i, 8, 8);
        }
        let content =
            FrameAnimContent::load_range(&gfx, &mut assets, AssetId::new(10), 4, frame_time)
                .unwrap();
        (content, gfx)
    }

    #[test]
    fn steps_and_wraps() {
        let (mut a, _gfx) = anim(100.0);
        a.update(250.0);
        assert_eq!(a.current_frame(), 2);
        a.update(250.0); // elapsed 500 -> frame 5 mod 4
        assert_eq!(a.current_frame(), 1);
    }

    #[test]
    fn sub_frame_time_accumulates() {
        let (mut a, _gfx) = anim(100.0);
        a.update(60.0);
        assert_eq!(a.current_frame(), 0);
        a.update(60.0);
        assert_eq!(a.current_frame(), 1);
    }

    #[test]
    fn missing_frame_rolls_back_uploads() {
        let (gfx, log) = MockGfx::new_handle();
        let mut assets = MockAssets::new();
        assets.put_indexed(10, 8, 8);
        assets.put_indexed(11, 8, 8);
        // index 12 missing
        let result = FrameAnimContent::load_range(&gfx, &mut assets, AssetId::new(10), 4, 50.0);
        assert!(result.is_err());
        let log = log.borrow();
        assert_eq!(log.uploaded.len(), 2);
        // both partial uploads were released again
        assert_eq!(log.live_textures(), 0);
    }

    #[test]
    fn template_names_inject_index() {
        let (gfx, _log) = MockGfx::new_handle();
        let mut assets = MockAssets::new();
        assets.put(1, "walk_0", 8, 8);
        assets.put(2, "walk_1", 8, 8);
        let a = FrameAnimContent::load_template(&gfx, &mut assets, "walk_{}", 2, 50.0).unwrap();
        assert_eq!(a.frame_count(), 2);
    }
}
