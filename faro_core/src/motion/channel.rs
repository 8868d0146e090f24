use crate::structs2d::Vector2;
use serde::{Deserialize, Serialize};

/// One tweened parameter channel with its begin/end values
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum MotionChannel {
    Pos { from: Vector2, to: Vector2 },
    Alpha { from: u8, to: u8 },
    /// Content frame index (frame animations and vector clips)
    ContentFrame { from: u32, to: u32 },
    GaugeRateH { from: f32, to: f32 },
    GaugeRateV { from: f32, to: f32 },
    NumeralValue { from: i64, to: i64 },
    ScaleX { from: f32, to: f32 },
    ScaleY { from: f32, to: f32 },
    RotateX { from: f32, to: f32 },
    RotateY { from: f32, to: f32 },
    RotateZ { from: f32, to: f32 },
    /// Positional jitter amplitude in pixels
    Vibration { from: f32, to: f32 },
}

/// Channel discriminant, used to find "the first motion of each channel"
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MotionKind {
    Pos,
    Alpha,
    ContentFrame,
    GaugeRateH,
    GaugeRateV,
    NumeralValue,
    ScaleX,
    ScaleY,
    RotateX,
    RotateY,
    RotateZ,
    Vibration,
}

/// A concrete value to write into a part, produced by sampling a channel
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MotionValue {
    Pos(Vector2),
    Alpha(u8),
    ContentFrame(u32),
    GaugeRateH(f32),
    GaugeRateV(f32),
    NumeralValue(i64),
    ScaleX(f32),
    ScaleY(f32),
    RotateX(f32),
    RotateY(f32),
    RotateZ(f32),
    Vibration(f32),
}

impl MotionChannel {
    pub fn kind(&self) -> MotionKind {
        match self {
            MotionChannel::Pos { .. } => MotionKind::Pos,
            MotionChannel::Alpha { .. } => MotionKind::Alpha,
            MotionChannel::ContentFrame { .. } => MotionKind::ContentFrame,
            MotionChannel::GaugeRateH { .. } => MotionKind::GaugeRateH,
            MotionChannel::GaugeRateV { .. } => MotionKind::GaugeRateV,
            MotionChannel::NumeralValue { .. } => MotionKind::NumeralValue,
            MotionChannel::ScaleX { .. } => MotionKind::ScaleX,
            MotionChannel::ScaleY { .. } => MotionKind::ScaleY,
            MotionChannel::RotateX { .. } => MotionKind::RotateX,
            MotionChannel::RotateY { .. } => MotionKind::RotateY,
            MotionChannel::RotateZ { .. } => MotionKind::RotateZ,
            MotionChannel::Vibration { .. } => MotionKind::Vibration,
        }
    }

    /// Linear interpolation at progress `k` in [0, 1]. Integer channels
    /// truncate, matching the engine's integer parameter math.
    pub fn sample(&self, k: f32) -> MotionValue {
        match *self {
            MotionChannel::Pos { from, to } => MotionValue::Pos(Vector2::lerp(from, to, k)),
            MotionChannel::Alpha { from, to } => {
                MotionValue::Alpha((from as f32 + (to as f32 - from as f32) * k) as u8)
            }
            MotionChannel::ContentFrame { from, to } => {
                MotionValue::ContentFrame((from as f32 + (to as f32 - from as f32) * k) as u32)
            }
            MotionChannel::GaugeRateH { from, to } => {
                MotionValue::GaugeRateH(from + (to - from) * k)
            }
            MotionChannel::GaugeRateV { from, to } => {
                MotionValue::GaugeRateV(from + (to - from) * k)
            }
            MotionChannel::NumeralValue { from, to } => {
                MotionValue::NumeralValue(from + ((to - from) as f64 * k as f64) as i64)
            }
            MotionChannel::ScaleX { from, to } => MotionValue::ScaleX(from + (to - from) * k),
            MotionChannel::ScaleY { from, to } => MotionValue::ScaleY(from + (to - from) * k),
            MotionChannel::RotateX { from, to } => MotionValue::RotateX(from + (to - from) * k),
            MotionChannel::RotateY { from, to } => MotionValue::RotateY(from + (to - from) * k),
            MotionChannel::RotateZ { from, to } => MotionValue::RotateZ(from + (to - from) * k),
            MotionChannel::Vibration { from, to } => {
                MotionValue::Vibration(from + (to - from) * k)
            }
        }
    }

    /// The pinned begin value, force-applied when playback starts
    pub fn begin_value(&self) -> MotionValue {
        self.sample(0.0)
    }
}

/// One scheduled tween on one part, in virtual milliseconds
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    pub channel: MotionChannel,
    pub t0: f32,
    pub t1: f32,
}

impl Motion {
    /// Progress at virtual time `t`, clamped to [0, 1]. A zero-length
    /// motion snaps to its end value as soon as `t` reaches it.
    pub fn progress(&self, t: f32) -> f32 {
        if self.t1 <= self.t0 {
            return if t >= self.t1 { 1.0 } else { 0.0 };
        }
        ((t - self.t0) / (self.t1 - self.t0)).clamp(0.0, 1.0)
    }

    pub fn sample(&self, t: f32) -> MotionValue {
        self.channel.sample(self.progress(t))
    }
}
