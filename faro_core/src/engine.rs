use crate::backend::{AssetSource, AudioHandle, GfxHandle, InputSource, MouseButton};
use crate::content::{
    CanvasOp, FrameAnimContent, GaugeContent, GaugeOrientation, ImageContent, NumeralContent,
    TextContent,
};
use crate::error::EngineError;
use crate::flash::FlashPlayer;
use crate::input::HitTester;
use crate::motion::{Motion, MotionChannel, MotionKind, MotionPlayer, MotionValue};
use crate::part_arena::PartArena;
use crate::parts::{InteractionState, Origin, Part, PartParams, SlotContent, StateSlot};
use crate::structs2d::{Color, Rect, Vector2};
use faro_ids::{AssetId, PartId, SoundId};
use log::warn;
use rand::Rng;
use smallvec::SmallVec;
use std::collections::VecDeque;

/// The parts engine: one value owning the registry, the dirty list, the
/// motion clock, the input session and the backend seams. Hosts create one
/// per screen stack; tests create as many as they like.
///
/// Drive it with [`update`](Self::update) once per frame. The order inside
/// one tick is fixed: pending re-parents and dirty recomposition first, then
/// motions, then time-driven content, then the pointer.
pub struct PartsEngine {
    arena: PartArena,
    /// Top-level parts, ascending by `global.z`
    root: Vec<PartId>,
    dirty: VecDeque<PartId>,
    scene_dirty: bool,
    motion: MotionPlayer,
    hit: HitTester,
    gfx: GfxHandle,
    audio: AudioHandle,
    assets: Box<dyn AssetSource>,
    input: Box<dyn InputSource>,
}

impl PartsEngine {
    pub fn new(
        gfx: GfxHandle,
        audio: AudioHandle,
        assets: Box<dyn AssetSource>,
        input: Box<dyn InputSource>,
    ) -> Self {
        Self {
            arena: PartArena::new(),
            root: Vec::new(),
            dirty: VecDeque::new(),
            scene_dirty: false,
            motion: MotionPlayer::new(),
            hit: HitTester::default(),
            gfx,
            audio,
            assets,
            input,
        }
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Return the part, allocating it at the top level when absent.
    /// Always marks the scene dirty.
    pub fn get_or_create(&mut self, id: PartId) -> PartId {
        if !self.arena.contains_key(id) {
            self.arena.insert(id, Part::new(id));
            self.insert_sorted(id, None);
        }
        self.scene_dirty = true;
        id
    }

    /// Lookup-only accessor: never allocates
    pub fn try_get(&self, id: PartId) -> Option<&Part> {
        self.arena.get(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn contains(&self, id: PartId) -> bool {
        self.arena.contains_key(id)
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Free a part: its slot resources and motions die with it, and its
    /// children are detached by clearing their parent reference WITHOUT
    /// being re-attached to any sibling list. They stay registry-resident
    /// but unreachable from the tree until released themselves — screens
    /// rely on this exact teardown order, so it is preserved as-is.
    pub fn release(&mut self, id: PartId) -> Result<(), EngineError> {
        let Some(part) = self.arena.remove(id) else {
            warn!("release of unknown part {id}");
            return Err(EngineError::UnknownPart(id));
        };
        self.remove_from_sibling_list(id, part.parent);
        for &child in &part.children {
            if let Some(c) = self.arena.get_mut(child) {
                c.parent = None;
            }
        }
        self.scene_dirty = true;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Local parameter setters
    //
    // Every setter updates the local block, immediately recomposes this
    // part's global block from the parent's current global (pushing through
    // all descendants), and queues the part for the next batched pass.
    // ------------------------------------------------------------------

    pub fn set_pos(&mut self, id: PartId, x: f32, y: f32) -> Result<(), EngineError> {
        self.part_mut(id)?.local.pos = Vector2::new(x, y);
        self.touch(id);
        Ok(())
    }

    pub fn set_z(&mut self, id: PartId, z: i32) -> Result<(), EngineError> {
        self.part_mut(id)?.local.z = z;
        self.touch(id);
        Ok(())
    }

    pub fn set_visible(&mut self, id: PartId, visible: bool) -> Result<(), EngineError> {
        self.part_mut(id)?.local.visible = visible;
        self.touch(id);
        Ok(())
    }

    pub fn set_alpha(&mut self, id: PartId, alpha: u8) -> Result<(), EngineError> {
        self.part_mut(id)?.local.alpha = alpha;
        self.touch(id);
        Ok(())
    }

    pub fn set_scale(&mut self, id: PartId, sx: f32, sy: f32) -> Result<(), EngineError> {
        self.part_mut(id)?.local.scale = Vector2::new(sx, sy);
        self.touch(id);
        Ok(())
    }

    /// Full 3-axis rotation; rendering uses only Z
    pub fn set_rotate(&mut self, id: PartId, x: f32, y: f32, z: f32) -> Result<(), EngineError> {
        self.part_mut(id)?.local.rotate = glam::Vec3::new(x, y, z);
        self.touch(id);
        Ok(())
    }

    pub fn set_rotate_z(&mut self, id: PartId, z: f32) -> Result<(), EngineError> {
        self.part_mut(id)?.local.rotate.z = z;
        self.touch(id);
        Ok(())
    }

    pub fn set_color_add(&mut self, id: PartId, color: Color) -> Result<(), EngineError> {
        self.part_mut(id)?.local.color_add = color;
        self.touch(id);
        Ok(())
    }

    pub fn set_color_mul(&mut self, id: PartId, color: Color) -> Result<(), EngineError> {
        self.part_mut(id)?.local.color_mul = color;
        self.touch(id);
        Ok(())
    }

    /// Origin mode from its raw integer encoding (keypad presets, with the
    /// legacy numeric fallback)
    pub fn set_origin(&mut self, id: PartId, mode: i32) -> Result<(), EngineError> {
        let part = self.part_mut(id)?;
        part.origin = Origin::from_raw(mode);
        part.recompute_hit_box();
        self.mark_dirty(id);
        Ok(())
    }

    /// Record the desired parent; the actual detach/attach happens in the
    /// next batched pass so a re-parent never takes effect mid-frame.
    ///
    /// A request that would put the part under its own descendant is
    /// rejected here; the batched pass re-checks against the tree as it
    /// stands at resolution time, since other pending requests may land
    /// first.
    pub fn set_parent(&mut self, id: PartId, parent: Option<PartId>) -> Result<(), EngineError> {
        if let Some(np) = parent {
            if np == id || self.is_descendant_of(np, id) {
                warn!("re-parenting part {id} under {np} would create a cycle, rejected");
                return Err(EngineError::ParentCycle {
                    part: id,
                    new_parent: np,
                });
            }
        }
        self.part_mut(id)?.pending_parent = Some(parent);
        self.mark_dirty(id);
        Ok(())
    }

    pub fn set_clickable(&mut self, id: PartId, clickable: bool) -> Result<(), EngineError> {
        self.part_mut(id)?.clickable = clickable;
        Ok(())
    }

    pub fn set_sounds(
        &mut self,
        id: PartId,
        cursor: Option<SoundId>,
        click: Option<SoundId>,
    ) -> Result<(), EngineError> {
        let part = self.part_mut(id)?;
        part.cursor_sound = cursor;
        part.click_sound = click;
        Ok(())
    }

    /// Companion part marked dirty whenever this part's hover state flips
    pub fn set_link(&mut self, id: PartId, link: Option<PartId>) -> Result<(), EngineError> {
        self.part_mut(id)?.link = link;
        Ok(())
    }

    // ------------------------------------------------------------------
    // State-slot content
    // ------------------------------------------------------------------

    pub fn set_image(
        &mut self,
        id: PartId,
        state: usize,
        index: AssetId,
    ) -> Result<(), EngineError> {
        Self::check_state(state)?;
        self.part_mut(id)?;
        let gfx = self.gfx.clone();
        let content = ImageContent::load(&gfx, self.assets.as_mut(), index)?;
        self.install_content(id, state, SlotContent::Image(content));
        Ok(())
    }

    pub fn set_image_named(
        &mut self,
        id: PartId,
        state: usize,
        name: &str,
    ) -> Result<(), EngineError> {
        Self::check_state(state)?;
        self.part_mut(id)?;
        let gfx = self.gfx.clone();
        let content = ImageContent::load_named(&gfx, self.assets.as_mut(), name)?;
        self.install_content(id, state, SlotContent::Image(content));
        Ok(())
    }

    /// Append text to the slot, installing an empty text payload first if
    /// the slot holds a different kind. Layout is append-only; use
    /// [`clear_text`](Self::clear_text) to start over.
    pub fn append_text(&mut self, id: PartId, state: usize, text: &str) -> Result<(), EngineError> {
        Self::check_state(state)?;
        let gfx = self.gfx.clone();
        let part = self.part_mut(id)?;
        let slot = &mut part.slots[state];
        if !matches!(slot.content, SlotContent::Text(_)) {
            slot.reset(SlotContent::Text(TextContent::new(Color::white())));
        }
        slot.text_mut().append(&gfx, text);
        if state == 0 {
            part.recompute_hit_box();
        }
        self.mark_dirty(id);
        Ok(())
    }

    pub fn clear_text(&mut self, id: PartId, state: usize) -> Result<(), EngineError> {
        Self::check_state(state)?;
        let part = self.part_mut(id)?;
        let color = match &part.slots[state].content {
            SlotContent::Text(text) => text.color,
            _ => Color::white(),
        };
        part.slots[state].reset(SlotContent::Text(TextContent::new(color)));
        if state == 0 {
            part.recompute_hit_box();
        }
        self.mark_dirty(id);
        Ok(())
    }

    pub fn set_text_color(
        &mut self,
        id: PartId,
        state: usize,
        color: Color,
    ) -> Result<(), EngineError> {
        Self::check_state(state)?;
        self.part_mut(id)?.slots[state].text_mut().color = color;
        Ok(())
    }

    pub fn set_frame_anim(
        &mut self,
        id: PartId,
        state: usize,
        base: AssetId,
        count: u32,
        frame_time_ms: f32,
    ) -> Result<(), EngineError> {
        Self::check_state(state)?;
        self.part_mut(id)?;
        let gfx = self.gfx.clone();
        let content =
            FrameAnimContent::load_range(&gfx, self.assets.as_mut(), base, count, frame_time_ms)?;
        self.install_content(id, state, SlotContent::FrameAnim(content));
        Ok(())
    }

    pub fn set_frame_anim_named(
        &mut self,
        id: PartId,
        state: usize,
        template: &str,
        count: u32,
        frame_time_ms: f32,
    ) -> Result<(), EngineError> {
        Self::check_state(state)?;
        self.part_mut(id)?;
        let gfx = self.gfx.clone();
        let content = FrameAnimContent::load_template(
            &gfx,
            self.assets.as_mut(),
            template,
            count,
            frame_time_ms,
        )?;
        self.install_content(id, state, SlotContent::FrameAnim(content));
        Ok(())
    }

    /// Jump the slot's animation (frame animation or vector clip) to a frame
    pub fn set_frame(&mut self, id: PartId, state: usize, frame: u32) -> Result<(), EngineError> {
        Self::check_state(state)?;
        let audio = self.audio.clone();
        let slot = &mut self.part_mut(id)?.slots[state];
        match &mut slot.content {
            SlotContent::FrameAnim(anim) => anim.set_frame(frame),
            SlotContent::Flash(player) => player.seek(frame, &mut *audio.borrow_mut()),
            other => panic!(
                "state slot holds {}, accessor expects an animation",
                other.kind_name()
            ),
        }
        self.mark_dirty(id);
        Ok(())
    }

    pub fn set_numeral(
        &mut self,
        id: PartId,
        state: usize,
        glyph_base: AssetId,
        gap: i32,
        show_comma: bool,
        min_digits: usize,
    ) -> Result<(), EngineError> {
        Self::check_state(state)?;
        self.part_mut(id)?;
        let content = NumeralContent::new(glyph_base, gap, show_comma, min_digits);
        self.install_content(id, state, SlotContent::Numeral(content));
        Ok(())
    }

    pub fn set_numeral_value(
        &mut self,
        id: PartId,
        state: usize,
        value: i64,
    ) -> Result<(), EngineError> {
        Self::check_state(state)?;
        let gfx = self.gfx.clone();
        // arena and assets are disjoint fields; going through part_mut would
        // pin all of self and block the asset borrow
        let Some(part) = self.arena.get_mut(id) else {
            warn!("access to unknown part {id}");
            return Err(EngineError::UnknownPart(id));
        };
        part.slots[state]
            .numeral_mut()
            .set_value(&gfx, self.assets.as_mut(), value)?;
        if state == 0 {
            part.recompute_hit_box();
        }
        self.mark_dirty(id);
        Ok(())
    }

    pub fn set_gauge(
        &mut self,
        id: PartId,
        state: usize,
        asset: AssetId,
        orientation: GaugeOrientation,
    ) -> Result<(), EngineError> {
        Self::check_state(state)?;
        self.part_mut(id)?;
        let gfx = self.gfx.clone();
        let content = GaugeContent::load(&gfx, self.assets.as_mut(), asset, orientation)?;
        self.install_content(id, state, SlotContent::Gauge(content));
        Ok(())
    }

    pub fn set_gauge_rate(
        &mut self,
        id: PartId,
        state: usize,
        numer: i32,
        denom: i32,
    ) -> Result<(), EngineError> {
        Self::check_state(state)?;
        let gfx = self.gfx.clone();
        self.part_mut(id)?.slots[state]
            .gauge_mut()
            .set_rate(&gfx, numer, denom);
        self.mark_dirty(id);
        Ok(())
    }

    /// Start (or continue) recording a construction process in the slot
    pub fn canvas_push(&mut self, id: PartId, state: usize, op: CanvasOp) -> Result<(), EngineError> {
        Self::check_state(state)?;
        let part = self.part_mut(id)?;
        let slot = &mut part.slots[state];
        if !matches!(slot.content, SlotContent::Canvas(_)) {
            slot.reset(SlotContent::Canvas(Default::default()));
        }
        slot.canvas_mut().push(op);
        Ok(())
    }

    /// Replay the recorded ops into a fresh texture
    pub fn canvas_build(&mut self, id: PartId, state: usize) -> Result<(), EngineError> {
        Self::check_state(state)?;
        let gfx = self.gfx.clone();
        let Some(part) = self.arena.get_mut(id) else {
            warn!("access to unknown part {id}");
            return Err(EngineError::UnknownPart(id));
        };
        part.slots[state]
            .canvas_mut()
            .build(&gfx, self.assets.as_mut())?;
        if state == 0 {
            part.recompute_hit_box();
        }
        self.mark_dirty(id);
        Ok(())
    }

    /// Install a vector-animation clip. Malformed or unsupported clip data
    /// aborts — see the flash module's failure contract.
    pub fn set_flash(&mut self, id: PartId, state: usize, bytes: &[u8]) -> Result<(), EngineError> {
        Self::check_state(state)?;
        self.part_mut(id)?;
        let player = FlashPlayer::load(bytes);
        self.install_content(id, state, SlotContent::Flash(player));
        Ok(())
    }

    pub fn flash_seek(&mut self, id: PartId, state: usize, frame: u32) -> Result<(), EngineError> {
        Self::check_state(state)?;
        let audio = self.audio.clone();
        self.part_mut(id)?.slots[state]
            .flash_mut()
            .seek(frame, &mut *audio.borrow_mut());
        self.mark_dirty(id);
        Ok(())
    }

    /// Narrow the slot's hit surface ("surface area")
    pub fn set_crop(
        &mut self,
        id: PartId,
        state: usize,
        crop: Option<Rect>,
    ) -> Result<(), EngineError> {
        Self::check_state(state)?;
        let part = self.part_mut(id)?;
        part.slots[state].crop = crop;
        if state == 0 {
            part.recompute_hit_box();
        }
        self.mark_dirty(id);
        Ok(())
    }

    pub fn slot(&self, id: PartId, state: usize) -> Option<&StateSlot> {
        InteractionState::from_index(state)?;
        Some(&self.arena.get(id)?.slots[state])
    }

    // ------------------------------------------------------------------
    // Motions
    // ------------------------------------------------------------------

    pub fn add_motion(
        &mut self,
        id: PartId,
        channel: MotionChannel,
        t0: f32,
        t1: f32,
    ) -> Result<(), EngineError> {
        self.part_mut(id)?.add_motion(Motion { channel, t0, t1 });
        Ok(())
    }

    pub fn add_motion_pos(
        &mut self,
        id: PartId,
        from: Vector2,
        to: Vector2,
        t0: f32,
        t1: f32,
    ) -> Result<(), EngineError> {
        self.add_motion(id, MotionChannel::Pos { from, to }, t0, t1)
    }

    pub fn add_motion_alpha(
        &mut self,
        id: PartId,
        from: u8,
        to: u8,
        t0: f32,
        t1: f32,
    ) -> Result<(), EngineError> {
        self.add_motion(id, MotionChannel::Alpha { from, to }, t0, t1)
    }

    pub fn add_motion_frame(
        &mut self,
        id: PartId,
        from: u32,
        to: u32,
        t0: f32,
        t1: f32,
    ) -> Result<(), EngineError> {
        self.add_motion(id, MotionChannel::ContentFrame { from, to }, t0, t1)
    }

    pub fn add_motion_gauge_h(
        &mut self,
        id: PartId,
        from: f32,
        to: f32,
        t0: f32,
        t1: f32,
    ) -> Result<(), EngineError> {
        self.add_motion(id, MotionChannel::GaugeRateH { from, to }, t0, t1)
    }

    pub fn add_motion_gauge_v(
        &mut self,
        id: PartId,
        from: f32,
        to: f32,
        t0: f32,
        t1: f32,
    ) -> Result<(), EngineError> {
        self.add_motion(id, MotionChannel::GaugeRateV { from, to }, t0, t1)
    }

    pub fn add_motion_numeral(
        &mut self,
        id: PartId,
        from: i64,
        to: i64,
        t0: f32,
        t1: f32,
    ) -> Result<(), EngineError> {
        self.add_motion(id, MotionChannel::NumeralValue { from, to }, t0, t1)
    }

    pub fn add_motion_scale_x(
        &mut self,
        id: PartId,
        from: f32,
        to: f32,
        t0: f32,
        t1: f32,
    ) -> Result<(), EngineError> {
        self.add_motion(id, MotionChannel::ScaleX { from, to }, t0, t1)
    }

    pub fn add_motion_scale_y(
        &mut self,
        id: PartId,
        from: f32,
        to: f32,
        t0: f32,
        t1: f32,
    ) -> Result<(), EngineError> {
        self.add_motion(id, MotionChannel::ScaleY { from, to }, t0, t1)
    }

    pub fn add_motion_rotate_x(
        &mut self,
        id: PartId,
        from: f32,
        to: f32,
        t0: f32,
        t1: f32,
    ) -> Result<(), EngineError> {
        self.add_motion(id, MotionChannel::RotateX { from, to }, t0, t1)
    }

    pub fn add_motion_rotate_y(
        &mut self,
        id: PartId,
        from: f32,
        to: f32,
        t0: f32,
        t1: f32,
    ) -> Result<(), EngineError> {
        self.add_motion(id, MotionChannel::RotateY { from, to }, t0, t1)
    }

    pub fn add_motion_rotate_z(
        &mut self,
        id: PartId,
        from: f32,
        to: f32,
        t0: f32,
        t1: f32,
    ) -> Result<(), EngineError> {
        self.add_motion(id, MotionChannel::RotateZ { from, to }, t0, t1)
    }

    pub fn add_motion_vibration(
        &mut self,
        id: PartId,
        from: f32,
        to: f32,
        t0: f32,
        t1: f32,
    ) -> Result<(), EngineError> {
        self.add_motion(id, MotionChannel::Vibration { from, to }, t0, t1)
    }

    /// Schedule a one-shot sound on the motion clock
    pub fn add_sound_motion(&mut self, t0: f32, sound: SoundId) {
        self.motion.add_sound(t0, sound);
    }

    /// Reset the virtual clock and pin every channel to its first motion's
    /// begin value, so values before a motion's start time don't linger at
    /// whatever was set statically
    pub fn motion_begin(&mut self) {
        self.motion.start();
        let mut jobs: Vec<(PartId, MotionValue)> = Vec::new();
        for (id, part) in self.arena.iter() {
            let mut seen: SmallVec<[MotionKind; 12]> = SmallVec::new();
            for motion in &part.motions {
                let kind = motion.channel.kind();
                if seen.contains(&kind) {
                    continue;
                }
                seen.push(kind);
                jobs.push((id, motion.channel.begin_value()));
            }
        }
        for (id, value) in jobs {
            self.apply_motion_value(id, value);
        }
    }

    /// Jump the virtual clock to `t`: every motion whose begin time has been
    /// reached applies in list order, so a later-starting motion on the same
    /// channel applies after — and wins. Transitions to Idle (clearing all
    /// queues) once `t` reaches the last end time.
    pub fn motion_set_time(&mut self, t: f32) {
        self.motion.clock = t;

        let mut jobs: Vec<(PartId, MotionValue)> = Vec::new();
        for (id, part) in self.arena.iter() {
            for motion in &part.motions {
                if motion.t0 <= t {
                    jobs.push((id, motion.sample(t)));
                }
            }
        }
        for (id, value) in jobs {
            self.apply_motion_value(id, value);
        }

        for sound in self.motion.due_sounds(t) {
            self.audio.borrow_mut().play_se(sound);
        }

        if t >= self.motion_end_time() {
            self.motion_end();
        }
    }

    /// Stop playback and drop every queue, including the sound schedule
    pub fn motion_end(&mut self) {
        self.motion.finish();
        for (_, part) in self.arena.iter_mut() {
            part.motions.clear();
        }
    }

    pub fn motion_is_playing(&self) -> bool {
        self.motion.is_playing()
    }

    fn motion_end_time(&self) -> f32 {
        let mut end: f32 = 0.0;
        for (_, part) in self.arena.iter() {
            for motion in &part.motions {
                end = end.max(motion.t1);
            }
        }
        for sound in &self.motion.sounds {
            end = end.max(sound.t0);
        }
        end
    }

    fn apply_motion_value(&mut self, id: PartId, value: MotionValue) {
        match value {
            MotionValue::Pos(v) => {
                if let Some(part) = self.arena.get_mut(id) {
                    part.local.pos = v;
                }
                self.touch(id);
            }
            MotionValue::Alpha(a) => {
                if let Some(part) = self.arena.get_mut(id) {
                    part.local.alpha = a;
                }
                self.touch(id);
            }
            MotionValue::ScaleX(s) => {
                if let Some(part) = self.arena.get_mut(id) {
                    part.local.scale.x = s;
                }
                self.touch(id);
            }
            MotionValue::ScaleY(s) => {
                if let Some(part) = self.arena.get_mut(id) {
                    part.local.scale.y = s;
                }
                self.touch(id);
            }
            MotionValue::RotateX(r) => {
                if let Some(part) = self.arena.get_mut(id) {
                    part.local.rotate.x = r;
                }
                self.touch(id);
            }
            MotionValue::RotateY(r) => {
                if let Some(part) = self.arena.get_mut(id) {
                    part.local.rotate.y = r;
                }
                self.touch(id);
            }
            MotionValue::RotateZ(r) => {
                if let Some(part) = self.arena.get_mut(id) {
                    part.local.rotate.z = r;
                }
                self.touch(id);
            }
            MotionValue::Vibration(v) => {
                if let Some(part) = self.arena.get_mut(id) {
                    part.vibration = v;
                }
                self.mark_dirty(id);
            }
            MotionValue::ContentFrame(frame) => {
                let audio = self.audio.clone();
                if let Some(part) = self.arena.get_mut(id) {
                    match &mut part.slots[0].content {
                        SlotContent::FrameAnim(anim) => anim.set_frame(frame),
                        SlotContent::Flash(player) => {
                            player.seek(frame, &mut *audio.borrow_mut())
                        }
                        other => panic!(
                            "content-frame motion on a slot holding {}",
                            other.kind_name()
                        ),
                    }
                }
                self.mark_dirty(id);
            }
            MotionValue::GaugeRateH(rate) | MotionValue::GaugeRateV(rate) => {
                let gfx = self.gfx.clone();
                if let Some(part) = self.arena.get_mut(id) {
                    part.slots[0].gauge_mut().set_rate_f(&gfx, rate);
                }
                self.mark_dirty(id);
            }
            MotionValue::NumeralValue(value) => {
                let gfx = self.gfx.clone();
                if let Some(part) = self.arena.get_mut(id) {
                    // a missing glyph already warned; the tween keeps going
                    let _ = part.slots[0]
                        .numeral_mut()
                        .set_value(&gfx, self.assets.as_mut(), value);
                }
                self.mark_dirty(id);
            }
        }
    }

    // ------------------------------------------------------------------
    // Frame drive
    // ------------------------------------------------------------------

    /// One host frame: drain pending re-parents and dirty parts, advance
    /// motions on the virtual clock, advance time-driven content, then
    /// resolve the pointer.
    pub fn update(&mut self, elapsed_ms: f32) {
        self.drain_dirty();
        self.apply_vibration();

        if self.motion.is_playing() {
            let t = self.motion.clock + elapsed_ms;
            self.motion_set_time(t);
        }

        self.update_content(elapsed_ms);
        self.run_hit_test();
    }

    fn update_content(&mut self, dt_ms: f32) {
        let audio = self.audio.clone();
        for (_, part) in self.arena.iter_mut() {
            for slot in &mut part.slots {
                match &mut slot.content {
                    SlotContent::FrameAnim(anim) => anim.update(dt_ms),
                    SlotContent::Flash(player) => player.update(dt_ms, &mut *audio.borrow_mut()),
                    _ => {}
                }
            }
        }
    }

    /// Jitter vibrating parts around their freshly composed position. The
    /// part is re-queued so the next drain restores the composed base
    /// before the next offset.
    fn apply_vibration(&mut self) {
        let mut rng = rand::thread_rng();
        let mut vibrated: Vec<PartId> = Vec::new();
        for (id, part) in self.arena.iter_mut() {
            if part.vibration > 0.0 {
                let amplitude = part.vibration;
                part.global.pos.x += rng.gen_range(-amplitude..=amplitude);
                part.global.pos.y += rng.gen_range(-amplitude..=amplitude);
                vibrated.push(id);
            }
        }
        for id in vibrated {
            self.mark_dirty(id);
            self.scene_dirty = true;
        }
    }

    // ------------------------------------------------------------------
    // Input session
    // ------------------------------------------------------------------

    pub fn begin_input(&mut self) {
        self.hit.session_open = true;
    }

    pub fn end_input(&mut self) {
        self.hit.session_open = false;
        self.hit.pressed = None;
    }

    pub fn last_clicked(&self) -> Option<PartId> {
        self.hit.last_clicked
    }

    fn run_hit_test(&mut self) {
        if !self.hit.session_open {
            return;
        }
        let order = self.tree_order();
        let mouse = self.input.mouse_position();
        let down = self.input.button_down(MouseButton::Left);
        let outcome = self.hit.run_frame(&mut self.arena, &order, mouse, down);
        for sound in outcome.sounds {
            self.audio.borrow_mut().play_se(sound);
        }
        for link in outcome.dirty_links {
            self.mark_dirty(link);
        }
        if outcome.clicked.is_some() {
            self.scene_dirty = true;
        }
    }

    // ------------------------------------------------------------------
    // Render-scene hooks
    // ------------------------------------------------------------------

    /// Whether anything changed since the render scene last asked
    pub fn take_scene_dirty(&mut self) -> bool {
        std::mem::take(&mut self.scene_dirty)
    }

    /// Tree order: every part, parents before children, siblings ascending
    /// by `global.z`
    pub fn tree_order(&self) -> Vec<PartId> {
        let mut order = Vec::with_capacity(self.arena.len());
        let mut stack: Vec<PartId> = self.root.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(part) = self.arena.get(id) else { continue };
            order.push(id);
            for &child in part.children.iter().rev() {
                stack.push(child);
            }
        }
        order
    }

    /// Visit every currently visible part in draw order
    pub fn for_each_visible<F: FnMut(&Part)>(&self, mut f: F) {
        for id in self.tree_order() {
            if let Some(part) = self.arena.get(id) {
                if part.global.visible {
                    f(part);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Composition internals
    // ------------------------------------------------------------------

    fn part_mut(&mut self, id: PartId) -> Result<&mut Part, EngineError> {
        match self.arena.get_mut(id) {
            Some(part) => Ok(part),
            None => {
                warn!("access to unknown part {id}");
                Err(EngineError::UnknownPart(id))
            }
        }
    }

    fn check_state(state: usize) -> Result<InteractionState, EngineError> {
        InteractionState::from_index(state).ok_or_else(|| {
            warn!("state index {state} out of range");
            EngineError::InvalidState(state)
        })
    }

    fn install_content(&mut self, id: PartId, state: usize, content: SlotContent) {
        if let Some(part) = self.arena.get_mut(id) {
            part.slots[state].reset(content);
            if state == 0 {
                part.recompute_hit_box();
            }
        }
        self.mark_dirty(id);
    }

    fn touch(&mut self, id: PartId) {
        self.recompose_subtree(id);
        self.mark_dirty(id);
    }

    fn mark_dirty(&mut self, id: PartId) {
        if let Some(part) = self.arena.get_mut(id) {
            if !part.dirty {
                part.dirty = true;
                self.dirty.push_back(id);
            }
        }
    }

    fn parent_global(&self, parent: Option<PartId>) -> PartParams {
        parent
            .and_then(|p| self.arena.get(p))
            .map(|p| p.global)
            .unwrap_or_else(PartParams::root)
    }

    /// Synchronous push: recompose this part from the parent's current
    /// global block and recurse through every descendant
    fn recompose_subtree(&mut self, id: PartId) {
        let Some(parent) = self.arena.get(id).map(|p| p.parent) else {
            return;
        };
        let parent_global = self.parent_global(parent);
        let mut stack = vec![(id, parent_global)];
        while let Some((id, pg)) = stack.pop() {
            let Some(part) = self.arena.get_mut(id) else { continue };
            let old_z = part.global.z;
            part.global = PartParams::compose(&pg, &part.local);
            let global = part.global;
            let children: SmallVec<[PartId; 8]> = part.children.clone();
            if global.z != old_z {
                self.resort_sibling(id);
            }
            for &child in &children {
                stack.push((child, global));
            }
        }
        self.scene_dirty = true;
    }

    /// Batched pass, once per update: resolve pending re-parents, then
    /// recompose each popped part unless an ancestor is still queued (the
    /// ancestor's own recomposition will cover this subtree)
    fn drain_dirty(&mut self) {
        let queue: Vec<PartId> = self.dirty.drain(..).collect();
        for id in queue {
            let Some(part) = self.arena.get_mut(id) else { continue };
            part.dirty = false;
            if let Some(new_parent) = part.pending_parent.take() {
                self.apply_reparent(id, new_parent);
            }
            if self.has_dirty_ancestor(id) {
                continue;
            }
            self.recompose_subtree(id);
        }
    }

    fn has_dirty_ancestor(&self, id: PartId) -> bool {
        let mut cursor = self.arena.get(id).and_then(|p| p.parent);
        while let Some(pid) = cursor {
            match self.arena.get(pid) {
                Some(part) => {
                    if part.dirty {
                        return true;
                    }
                    cursor = part.parent;
                }
                None => return false,
            }
        }
        false
    }

    fn apply_reparent(&mut self, id: PartId, new_parent: Option<PartId>) {
        if let Some(np) = new_parent {
            if !self.arena.contains_key(np) {
                warn!("re-parent of part {id} to unknown parent {np} ignored");
                return;
            }
            // The tree must stay acyclic. The pre-rewrite engine never
            // checked this and would walk forever; reject instead.
            if np == id || self.is_descendant_of(np, id) {
                warn!("re-parenting part {id} under {np} would create a cycle, rejected");
                return;
            }
        }
        let Some(old_parent) = self.arena.get(id).map(|p| p.parent) else {
            return;
        };
        self.remove_from_sibling_list(id, old_parent);
        if let Some(part) = self.arena.get_mut(id) {
            part.parent = new_parent;
        }
        self.insert_sorted(id, new_parent);
    }

    /// Is `candidate` inside the subtree rooted at `ancestor`?
    fn is_descendant_of(&self, candidate: PartId, ancestor: PartId) -> bool {
        let mut cursor = self.arena.get(candidate).and_then(|p| p.parent);
        while let Some(pid) = cursor {
            if pid == ancestor {
                return true;
            }
            cursor = self.arena.get(pid).and_then(|p| p.parent);
        }
        false
    }

    fn remove_from_sibling_list(&mut self, id: PartId, parent: Option<PartId>) {
        match parent {
            None => self.root.retain(|&x| x != id),
            Some(pid) => {
                if let Some(parent) = self.arena.get_mut(pid) {
                    parent.children.retain(|x| *x != id);
                }
            }
        }
    }

    /// Insert into the sibling list ascending by `global.z`, after any
    /// existing siblings with the same z
    fn insert_sorted(&mut self, id: PartId, parent: Option<PartId>) {
        let Some(z) = self.arena.get(id).map(|p| p.global.z) else {
            return;
        };
        match parent {
            None => {
                let pos = self
                    .root
                    .iter()
                    .position(|&x| self.arena.get(x).is_some_and(|p| p.global.z > z))
                    .unwrap_or(self.root.len());
                self.root.insert(pos, id);
            }
            Some(pid) => {
                let Some(siblings) = self.arena.get(pid).map(|p| p.children.clone()) else {
                    return;
                };
                let pos = siblings
                    .iter()
                    .position(|&x| self.arena.get(x).is_some_and(|p| p.global.z > z))
                    .unwrap_or(siblings.len());
                if let Some(parent) = self.arena.get_mut(pid) {
                    parent.children.insert(pos, id);
                }
            }
        }
    }

    /// Re-sort one part inside its current sibling list after a z change
    fn resort_sibling(&mut self, id: PartId) {
        let Some(parent) = self.arena.get(id).map(|p| p.parent) else {
            return;
        };
        self.remove_from_sibling_list(id, parent);
        self.insert_sorted(id, parent);
    }
}
