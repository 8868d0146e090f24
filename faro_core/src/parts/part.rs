use crate::parts::origin::Origin;
use crate::parts::params::PartParams;
use crate::parts::state_slot::StateSlot;
use crate::motion::Motion;
use crate::structs2d::Rect;
use faro_ids::{PartId, SoundId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Which state slot a part presents, driven by the hit tester
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Default,
    Hovered,
    Clicked,
}

impl InteractionState {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(InteractionState::Default),
            1 => Some(InteractionState::Hovered),
            2 => Some(InteractionState::Clicked),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            InteractionState::Default => 0,
            InteractionState::Hovered => 1,
            InteractionState::Clicked => 2,
        }
    }
}

/// One node of the compositing tree.
///
/// `local` is what the author set; `global` is the parent-composed block the
/// render scene reads. The two agree (global = compose(parent.global, local))
/// exactly when this part and every ancestor are clean.
#[derive(Serialize, Deserialize, Debug)]
pub struct Part {
    pub id: PartId,
    pub local: PartParams,
    pub global: PartParams,
    pub origin: Origin,

    /// Content per interaction state; runtime payloads are rebuilt by the
    /// host after a restore
    #[serde(skip)]
    pub slots: [StateSlot; 3],
    pub state: InteractionState,

    /// Time-ordered by begin time
    pub motions: Vec<Motion>,

    pub parent: Option<PartId>,
    /// Ordered ascending by child `global.z`
    pub children: SmallVec<[PartId; 8]>,
    /// Two-phase re-parent: requests park here until the next batched pass
    #[serde(skip)]
    pub pending_parent: Option<Option<PartId>>,
    #[serde(skip)]
    pub dirty: bool,

    pub clickable: bool,
    pub cursor_sound: Option<SoundId>,
    pub click_sound: Option<SoundId>,
    /// Companion part redrawn alongside this one (paired highlights)
    pub link: Option<PartId>,

    /// Pivot-adjusted, crop-intersected rect in local space
    pub hit_box: Rect,
    /// Jitter amplitude in pixels, motion-driven
    pub vibration: f32,
    /// Hover membership last frame, for enter/leave edges
    #[serde(skip)]
    pub hovered: bool,
}

impl Part {
    pub fn new(id: PartId) -> Self {
        Self {
            id,
            local: PartParams::default(),
            global: PartParams::default(),
            origin: Origin::default(),
            slots: Default::default(),
            state: InteractionState::default(),
            motions: Vec::new(),
            parent: None,
            children: SmallVec::new(),
            pending_parent: None,
            dirty: false,
            clickable: false,
            cursor_sound: None,
            click_sound: None,
            link: None,
            hit_box: Rect::default(),
            vibration: 0.0,
            hovered: false,
        }
    }

    pub fn slot(&self, state: InteractionState) -> &StateSlot {
        &self.slots[state.index()]
    }

    pub fn slot_mut(&mut self, state: InteractionState) -> &mut StateSlot {
        &mut self.slots[state.index()]
    }

    /// The slot the part currently presents
    pub fn active_slot(&self) -> &StateSlot {
        self.slot(self.state)
    }

    /// Insert keeping the motion list ordered by begin time (stable for
    /// ties, so later-added same-time motions apply after and win)
    pub fn add_motion(&mut self, motion: Motion) {
        let pos = self.motions.partition_point(|m| m.t0 <= motion.t0);
        self.motions.insert(pos, motion);
    }

    /// Re-derive the local hit box from the default slot: content rect,
    /// narrowed by the crop, shifted by the pivot offset
    pub fn recompute_hit_box(&mut self) {
        let slot = &self.slots[0];
        let (w, h) = slot.size();
        let mut rect = Rect::new(0.0, 0.0, w as f32, h as f32);
        if let Some(crop) = slot.crop {
            rect = rect.intersect(&crop);
        }
        let pivot = self.origin.offset(w as f32, h as f32);
        self.hit_box = Rect::new(rect.x - pivot.x, rect.y - pivot.y, rect.w, rect.h);
    }
}
