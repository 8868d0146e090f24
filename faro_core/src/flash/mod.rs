//! Embedded interpreter for the constrained vector-animation clip format.
//! A clip is a tag stream (definitions, display-list edits, control actions)
//! replayed strictly forward; one player instance backs one Flash-kind
//! state slot.

pub mod display_list;
pub mod player;
pub mod sound;
pub mod stream;

pub use display_list::{DisplayList, DisplayObject};
pub use player::FlashPlayer;
pub use stream::{Action, ColorTransform, FlashStream, Matrix2D, PlaceObject, SoundDef, Tag};
