use crate::structs2d::Vector2;
use serde::{Deserialize, Serialize};

/// Pivot/origin of a part: where the local (0,0) sits inside the content
/// rect. Screen layouts address these by a small integer mode, keypad
/// style (1 = top-left reading across to 9 = bottom-right); mode 0 is the
/// default and duplicates top-left.
///
/// Any other mode falls through to the legacy numeric branch, which
/// reinterprets the raw mode as an x offset with a fixed 3h/4 y offset.
/// That branch is preserved exactly as shipped content expects it.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Origin {
    #[default]
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    Center,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
    /// Legacy fallback: raw mode as x offset, 3h/4 as y offset
    Numeric(i32),
}

impl Origin {
    pub fn from_raw(mode: i32) -> Self {
        match mode {
            0 | 1 => Origin::TopLeft,
            2 => Origin::TopCenter,
            3 => Origin::TopRight,
            4 => Origin::MiddleLeft,
            5 => Origin::Center,
            6 => Origin::MiddleRight,
            7 => Origin::BottomLeft,
            8 => Origin::BottomCenter,
            9 => Origin::BottomRight,
            other => Origin::Numeric(other),
        }
    }

    /// Pivot offset from the content's top-left corner, for a content rect
    /// of the given size
    pub fn offset(&self, w: f32, h: f32) -> Vector2 {
        match *self {
            Origin::TopLeft => Vector2::zero(),
            Origin::TopCenter => Vector2::new(w / 2.0, 0.0),
            Origin::TopRight => Vector2::new(w, 0.0),
            Origin::MiddleLeft => Vector2::new(0.0, h / 2.0),
            Origin::Center => Vector2::new(w / 2.0, h / 2.0),
            Origin::MiddleRight => Vector2::new(w, h / 2.0),
            Origin::BottomLeft => Vector2::new(0.0, h),
            Origin::BottomCenter => Vector2::new(w / 2.0, h),
            Origin::BottomRight => Vector2::new(w, h),
            Origin::Numeric(mode) => Vector2::new(mode as f32, h * 3.0 / 4.0),
        }
    }
}
