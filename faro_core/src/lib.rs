//! Faro parts engine: a retained-mode 2D compositing layer for in-game UI.
//!
//! Screens are trees of addressable "parts". Each part composes its local
//! transform/visibility/color parameters with its ancestors', carries up to
//! three interaction-state content slots (image, text, frame animation,
//! numeral, gauge, constructed canvas or an embedded vector-animation clip),
//! and can be tweened through keyframe motions on a virtual clock. One
//! [`PartsEngine`] value owns everything; the host drives it with one
//! [`PartsEngine::update`] call per frame and renders the composed tree
//! through [`PartsEngine::for_each_visible`].

pub mod backend;
pub mod content;
pub mod engine;
pub mod error;
pub mod flash;
pub mod input;
pub mod motion;
pub mod part_arena;
pub mod parts;
pub mod structs2d;
pub mod texture;

#[cfg(test)]
pub(crate) mod test_support;

pub use backend::{
    AssetSource, AudioBackend, AudioHandle, BlendMode, GfxHandle, GraphicsBackend, InputSource,
    MouseButton,
};
pub use engine::PartsEngine;
pub use error::EngineError;
pub use parts::{InteractionState, Origin, Part, PartParams, SlotContent, StateSlot};
pub use structs2d::{Color, Rect, Vector2};
pub use texture::Texture;

pub use faro_ids::{AssetId, CharacterId, PartId, SoundId, TextureId};
