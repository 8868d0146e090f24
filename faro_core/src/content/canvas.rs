use crate::backend::{AssetSource, GfxHandle};
use crate::error::EngineError;
use crate::structs2d::{Color, Rect};
use crate::texture::Texture;
use image::RgbaImage;
use log::warn;
use serde::{Deserialize, Serialize};

/// One recorded drawing op of a construction process.
///
/// The op list is a fixed, non-branching program: append-only while
/// recording, replayed in full and in order on every build.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum CanvasOp {
    /// Allocate the canvas, transparent
    CreateCanvas { width: u32, height: u32 },
    /// Allocate the canvas opaque (no usable alpha channel)
    CreatePixelCanvas { width: u32, height: u32 },
    /// Compose a named raster asset at (x, y)
    LoadImage { name: String, x: i32, y: i32 },
    /// Fill a region, alpha included
    FillRect { rect: Rect, color: Color },
    /// Rasterize text at (x, y)
    DrawText { x: i32, y: i32, text: String, color: Color },
    /// Re-blit an already-drawn region of the canvas onto itself
    CopyRect { src: Rect, dst_x: i32, dst_y: i32 },
}

/// Procedurally constructed image: a recorded op list plus the texture the
/// last build produced.
#[derive(Debug, Default)]
pub struct CanvasContent {
    ops: Vec<CanvasOp>,
    texture: Option<Texture>,
}

impl CanvasContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: CanvasOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[CanvasOp] {
        &self.ops
    }

    /// Replay every recorded op, in insertion order, into one freshly
    /// allocated texture. The previous texture is only replaced when the
    /// whole replay succeeds.
    pub fn build(
        &mut self,
        gfx: &GfxHandle,
        assets: &mut dyn AssetSource,
    ) -> Result<(), EngineError> {
        let mut canvas: Option<Texture> = None;

        for op in &self.ops {
            match op {
                CanvasOp::CreateCanvas { width, height } => {
                    canvas = Some(Texture::create(gfx, *width, *height));
                }
                CanvasOp::CreatePixelCanvas { width, height } => {
                    let tex = Texture::create(gfx, *width, *height);
                    gfx.borrow_mut().fill(
                        tex.id(),
                        Rect::new(0.0, 0.0, *width as f32, *height as f32),
                        Color::black(),
                    );
                    canvas = Some(tex);
                }
                CanvasOp::LoadImage { name, x, y } => {
                    let Some(dst) = canvas.as_ref() else { continue };
                    let Some(image) = assets.image_by_name(name) else {
                        warn!("construction process: asset '{name}' not found");
                        return Err(EngineError::AssetNotFound(name.clone()));
                    };
                    let src = Texture::upload(gfx, &image);
                    gfx.borrow_mut().blit(dst.id(), src.id(), None, *x, *y);
                }
                CanvasOp::FillRect { rect, color } => {
                    if let Some(dst) = canvas.as_ref() {
                        gfx.borrow_mut().fill(dst.id(), *rect, *color);
                    }
                }
                CanvasOp::DrawText { x, y, text, color } => {
                    if let Some(dst) = canvas.as_ref() {
                        gfx.borrow_mut().render_text(dst.id(), *x, *y, text, *color);
                    }
                }
                CanvasOp::CopyRect { src, dst_x, dst_y } => {
                    if let Some(dst) = canvas.as_ref() {
                        gfx.borrow_mut()
                            .blit(dst.id(), dst.id(), Some(*src), *dst_x, *dst_y);
                    }
                }
            }
        }

        match canvas {
            Some(tex) => {
                self.texture = Some(tex);
                Ok(())
            }
            None => {
                warn!("construction process built without a create-canvas op");
                Ok(())
            }
        }
    }

    /// CPU-side replay used when the result feeds another compositor rather
    /// than the screen (no backend round-trip).
    pub fn build_pixels(&self, assets: &mut dyn AssetSource) -> Result<Option<RgbaImage>, EngineError> {
        let mut canvas: Option<RgbaImage> = None;
        for op in &self.ops {
            match op {
                CanvasOp::CreateCanvas { width, height }
                | CanvasOp::CreatePixelCanvas { width, height } => {
                    canvas = Some(RgbaImage::new(*width, *height));
                }
                CanvasOp::LoadImage { name, x, y } => {
                    let Some(dst) = canvas.as_mut() else { continue };
                    let Some(src) = assets.image_by_name(name) else {
                        warn!("construction process: asset '{name}' not found");
                        return Err(EngineError::AssetNotFound(name.clone()));
                    };
                    image::imageops::overlay(dst, &src, *x as i64, *y as i64);
                }
                CanvasOp::FillRect { rect, color } => {
                    let Some(dst) = canvas.as_mut() else { continue };
                    let (w, h) = (dst.width() as i32, dst.height() as i32);
                    let x0 = (rect.x as i32).clamp(0, w);
                    let y0 = (rect.y as i32).clamp(0, h);
                    let x1 = ((rect.x + rect.w) as i32).clamp(0, w);
                    let y1 = ((rect.y + rect.h) as i32).clamp(0, h);
                    for y in y0..y1 {
                        for x in x0..x1 {
                            dst.put_pixel(
                                x as u32,
                                y as u32,
                                image::Rgba([color.r, color.g, color.b, color.a]),
                            );
                        }
                    }
                }
                // Text and self-copies need the backend rasterizer
                CanvasOp::DrawText { .. } | CanvasOp::CopyRect { .. } => {}
            }
        }
        Ok(canvas)
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    pub fn size(&self) -> (u32, u32) {
        self.texture.as_ref().map(Texture::size).unwrap_or((0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockAssets, MockGfx};

    #[test]
    fn replay_runs_in_insertion_order() {
        let (gfx, log) = MockGfx::new_handle();
        let mut assets = MockAssets::new();
        assets.put(1, "badge", 8, 8);

        let mut canvas = CanvasContent::new();
        canvas.push(CanvasOp::CreateCanvas { width: 64, height: 32 });
        canvas.push(CanvasOp::FillRect {
            rect: Rect::new(0.0, 0.0, 64.0, 32.0),
            color: Color::new(0, 0, 0, 128),
        });
        canvas.push(CanvasOp::LoadImage { name: "badge".into(), x: 4, y: 4 });
        canvas.push(CanvasOp::DrawText {
            x: 16,
            y: 4,
            text: "hp".into(),
            color: Color::white(),
        });
        canvas.build(&gfx, &mut assets).unwrap();

        let log = log.borrow();
        assert_eq!(log.created.len(), 1);
        assert_eq!(log.fills.len(), 1);
        assert_eq!(log.blits.len(), 1);
        assert_eq!(log.texts.len(), 1);
        // fill lands before the blit, blit before the text
        assert!(log.fills[0].0 == log.blits[0].0 && log.blits[0].0 == log.texts[0].0);
    }

    #[test]
    fn rebuild_replays_everything() {
        let (gfx, log) = MockGfx::new_handle();
        let mut assets = MockAssets::new();

        let mut canvas = CanvasContent::new();
        canvas.push(CanvasOp::CreateCanvas { width: 16, height: 16 });
        canvas.push(CanvasOp::FillRect {
            rect: Rect::new(0.0, 0.0, 8.0, 8.0),
            color: Color::white(),
        });
        canvas.build(&gfx, &mut assets).unwrap();
        canvas.build(&gfx, &mut assets).unwrap();

        let log = log.borrow();
        assert_eq!(log.created.len(), 2);
        assert_eq!(log.fills.len(), 2);
    }

    #[test]
    fn missing_asset_keeps_previous_build() {
        let (gfx, _log) = MockGfx::new_handle();
        let mut assets = MockAssets::new();
        assets.put(1, "badge", 8, 8);

        let mut canvas = CanvasContent::new();
        canvas.push(CanvasOp::CreateCanvas { width: 16, height: 16 });
        canvas.build(&gfx, &mut assets).unwrap();
        let built = canvas.texture().unwrap().id();

        canvas.push(CanvasOp::LoadImage { name: "missing".into(), x: 0, y: 0 });
        assert!(canvas.build(&gfx, &mut assets).is_err());
        assert_eq!(canvas.texture().unwrap().id(), built);
    }

    #[test]
    fn copy_rect_blits_canvas_onto_itself() {
        let (gfx, log) = MockGfx::new_handle();
        let mut assets = MockAssets::new();

        let mut canvas = CanvasContent::new();
        canvas.push(CanvasOp::CreateCanvas { width: 32, height: 32 });
        canvas.push(CanvasOp::CopyRect {
            src: Rect::new(0.0, 0.0, 16.0, 16.0),
            dst_x: 16,
            dst_y: 16,
        });
        canvas.build(&gfx, &mut assets).unwrap();

        let log = log.borrow();
        let (dst, src, rect, x, y) = log.blits[0];
        assert_eq!(dst, src);
        assert_eq!(rect, Some(Rect::new(0.0, 0.0, 16.0, 16.0)));
        assert_eq!((x, y), (16, 16));
    }

    #[test]
    fn cpu_replay_composites_pixels() {
        let mut assets = MockAssets::new();
        let mut canvas = CanvasContent::new();
        canvas.push(CanvasOp::CreateCanvas { width: 4, height: 4 });
        canvas.push(CanvasOp::FillRect {
            rect: Rect::new(0.0, 0.0, 2.0, 2.0),
            color: Color::new(10, 20, 30, 255),
        });
        let pixels = canvas.build_pixels(&mut assets).unwrap().unwrap();
        assert_eq!(pixels.get_pixel(0, 0).0, [10, 20, 30, 255]);
        assert_eq!(pixels.get_pixel(3, 3).0, [0, 0, 0, 0]);
    }
}
