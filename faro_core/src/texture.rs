use crate::backend::GfxHandle;
use faro_ids::TextureId;
use image::RgbaImage;
use std::fmt;

/// Owning handle to one backend texture.
///
/// The handle is the only owner of the backend resource: dropping it deletes
/// the texture exactly once. Content variants hold these, so resetting a
/// state slot to a different kind releases everything the old payload had
/// uploaded without any manual bookkeeping.
pub struct Texture {
    id: TextureId,
    width: u32,
    height: u32,
    gfx: GfxHandle,
}

impl Texture {
    /// Upload decoded pixels and take ownership of the resulting texture
    pub fn upload(gfx: &GfxHandle, image: &RgbaImage) -> Self {
        let id = gfx.borrow_mut().upload(image);
        Self {
            id,
            width: image.width(),
            height: image.height(),
            gfx: gfx.clone(),
        }
    }

    /// Allocate a blank texture of the given size
    pub fn create(gfx: &GfxHandle, width: u32, height: u32) -> Self {
        let id = gfx.borrow_mut().create(width, height);
        Self {
            id,
            width,
            height,
            gfx: gfx.clone(),
        }
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.id
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.gfx.borrow_mut().delete(self.id);
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Texture({}, {}x{})", self.id, self.width, self.height)
    }
}
