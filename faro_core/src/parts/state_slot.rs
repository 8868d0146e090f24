use crate::content::{
    CanvasContent, FrameAnimContent, GaugeContent, ImageContent, NumeralContent, TextContent,
};
use crate::flash::FlashPlayer;
use crate::structs2d::Rect;

/// The renderable payload of one interaction state. Exactly one kind is
/// active at a time; installing a new kind drops the previous payload and
/// with it every texture it owned.
#[derive(Debug, Default)]
pub enum SlotContent {
    #[default]
    None,
    Image(ImageContent),
    Text(TextContent),
    FrameAnim(FrameAnimContent),
    Numeral(NumeralContent),
    Gauge(GaugeContent),
    Canvas(CanvasContent),
    Flash(FlashPlayer),
}

impl SlotContent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            SlotContent::None => "none",
            SlotContent::Image(_) => "image",
            SlotContent::Text(_) => "text",
            SlotContent::FrameAnim(_) => "frame animation",
            SlotContent::Numeral(_) => "numeral",
            SlotContent::Gauge(_) => "gauge",
            SlotContent::Canvas(_) => "canvas",
            SlotContent::Flash(_) => "vector animation",
        }
    }

    /// Intrinsic size, used for the hit box unless a crop narrows it
    pub fn size(&self) -> (u32, u32) {
        match self {
            SlotContent::None => (0, 0),
            SlotContent::Image(c) => c.size(),
            SlotContent::Text(c) => c.size(),
            SlotContent::FrameAnim(c) => c.size(),
            SlotContent::Numeral(c) => c.size(),
            SlotContent::Gauge(c) => c.size(),
            SlotContent::Canvas(c) => c.size(),
            SlotContent::Flash(c) => c.size(),
        }
    }
}

/// One of the three interaction-state content containers of a part
#[derive(Debug, Default)]
pub struct StateSlot {
    pub content: SlotContent,
    /// Optional sub-rect of the content ("surface area") that narrows the
    /// hit box
    pub crop: Option<Rect>,
}

impl StateSlot {
    /// Discard the current payload (releasing its textures) and install a
    /// new one
    pub fn reset(&mut self, content: SlotContent) {
        self.content = content;
    }

    pub fn size(&self) -> (u32, u32) {
        self.content.size()
    }

    // Kind-checked accessors. A mismatch is a content/engine desync and is
    // fatal by design: partial recovery would leave the composed scene
    // disagreeing with its description.

    pub fn text_mut(&mut self) -> &mut TextContent {
        match &mut self.content {
            SlotContent::Text(c) => c,
            other => panic!("state slot holds {}, accessor expects text", other.kind_name()),
        }
    }

    pub fn frame_anim_mut(&mut self) -> &mut FrameAnimContent {
        match &mut self.content {
            SlotContent::FrameAnim(c) => c,
            other => panic!(
                "state slot holds {}, accessor expects frame animation",
                other.kind_name()
            ),
        }
    }

    pub fn numeral_mut(&mut self) -> &mut NumeralContent {
        match &mut self.content {
            SlotContent::Numeral(c) => c,
            other => panic!(
                "state slot holds {}, accessor expects numeral",
                other.kind_name()
            ),
        }
    }

    pub fn gauge_mut(&mut self) -> &mut GaugeContent {
        match &mut self.content {
            SlotContent::Gauge(c) => c,
            other => panic!("state slot holds {}, accessor expects gauge", other.kind_name()),
        }
    }

    pub fn canvas_mut(&mut self) -> &mut CanvasContent {
        match &mut self.content {
            SlotContent::Canvas(c) => c,
            other => panic!("state slot holds {}, accessor expects canvas", other.kind_name()),
        }
    }

    pub fn flash_mut(&mut self) -> &mut FlashPlayer {
        match &mut self.content {
            SlotContent::Flash(c) => c,
            other => panic!(
                "state slot holds {}, accessor expects vector animation",
                other.kind_name()
            ),
        }
    }
}
