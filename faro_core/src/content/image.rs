use crate::backend::{AssetSource, GfxHandle};
use crate::error::EngineError;
use crate::texture::Texture;
use faro_ids::AssetId;
use log::warn;

/// A single raster asset, loaded by archive index or by name.
#[derive(Debug)]
pub struct ImageContent {
    texture: Texture,
    /// Index the asset resolved to. Name lookups are resolved once and the
    /// index is kept so reloads skip the name table.
    asset: AssetId,
}

impl ImageContent {
    /// Load by archive index. On a miss the caller's slot is left alone.
    pub fn load(
        gfx: &GfxHandle,
        assets: &mut dyn AssetSource,
        index: AssetId,
    ) -> Result<Self, EngineError> {
        let Some(image) = assets.image_by_index(index) else {
            warn!("image asset {index} not found");
            return Err(EngineError::AssetNotFound(index.to_string()));
        };
        Ok(Self {
            texture: Texture::upload(gfx, &image),
            asset: index,
        })
    }

    /// Load by name; the resolved index is cached on the content.
    pub fn load_named(
        gfx: &GfxHandle,
        assets: &mut dyn AssetSource,
        name: &str,
    ) -> Result<Self, EngineError> {
        let Some(index) = assets.index_of(name) else {
            warn!("image asset '{name}' not found");
            return Err(EngineError::AssetNotFound(name.to_string()));
        };
        Self::load(gfx, assets, index)
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn asset(&self) -> AssetId {
        self.asset
    }

    pub fn size(&self) -> (u32, u32) {
        self.texture.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockAssets, MockGfx};

    #[test]
    fn load_by_index() {
        let (gfx, log) = MockGfx::new_handle();
        let mut assets = MockAssets::new();
        assets.put_indexed(3, 32, 16);

        let content = ImageContent::load(&gfx, &mut assets, AssetId::new(3)).unwrap();
        assert_eq!(content.size(), (32, 16));
        assert_eq!(log.borrow().uploaded.len(), 1);
    }

    #[test]
    fn load_named_caches_index() {
        let (gfx, _log) = MockGfx::new_handle();
        let mut assets = MockAssets::new();
        assets.put(7, "button_idle", 10, 10);

        let content = ImageContent::load_named(&gfx, &mut assets, "button_idle").unwrap();
        assert_eq!(content.asset(), AssetId::new(7));
    }

    #[test]
    fn missing_asset_reports_failure_without_upload() {
        let (gfx, log) = MockGfx::new_handle();
        let mut assets = MockAssets::new();
        assert!(ImageContent::load(&gfx, &mut assets, AssetId::new(9)).is_err());
        assert_eq!(log.borrow().uploaded.len(), 0);
    }
}
