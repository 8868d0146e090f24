//! Renderable content payloads. One of these lives inside each state slot
//! of a part; each kind owns its textures and knows how to lay itself out.

pub mod canvas;
pub mod frame_anim;
pub mod gauge;
pub mod image;
pub mod numeral;
pub mod text;

pub use canvas::{CanvasContent, CanvasOp};
pub use frame_anim::FrameAnimContent;
pub use gauge::{GaugeContent, GaugeOrientation};
pub use image::ImageContent;
pub use numeral::{NumeralContent, NumeralGlyph};
pub use text::TextContent;
