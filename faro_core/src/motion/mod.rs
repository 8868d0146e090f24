//! Keyframe motions: per-part parameter tweens scheduled on the engine's
//! virtual clock, plus the global one-shot sound schedule.

pub mod channel;
pub mod player;

pub use channel::{Motion, MotionChannel, MotionKind, MotionValue};
pub use player::{MotionPlayer, MotionState, SoundMotion};
