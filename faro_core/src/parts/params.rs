use crate::structs2d::{Color, Vector2, color::mul_u8};
use glam::Vec3;
use serde::{Deserialize, Serialize};

fn default_visible() -> bool {
    true
}
fn default_alpha() -> u8 {
    255
}
fn default_scale() -> Vector2 {
    Vector2::one()
}

/// One parameter block. Every part carries two: the author-set `local` block
/// and the parent-composed `global` block the render scene consumes.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PartParams {
    pub z: i32,
    pub pos: Vector2,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default = "default_alpha")]
    pub alpha: u8,
    #[serde(default = "default_scale")]
    pub scale: Vector2,
    /// 3-axis rotation; only `z` is used when rendering
    pub rotate: Vec3,
    pub color_add: Color,
    pub color_mul: Color,
}

impl PartParams {
    /// Identity block: composing with it returns the local block unchanged.
    /// Also the implicit "parent" of every root-level part.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parent-child composition, one channel at a time: addition for
    /// position/z/rotation, multiplication (255 = identity) for alpha,
    /// scale and the multiplicative color, saturating addition for the
    /// additive color, AND for visibility.
    pub fn compose(parent: &PartParams, local: &PartParams) -> PartParams {
        PartParams {
            z: parent.z + local.z,
            pos: parent.pos + local.pos,
            visible: parent.visible && local.visible,
            alpha: mul_u8(parent.alpha, local.alpha),
            scale: parent.scale * local.scale,
            rotate: parent.rotate + local.rotate,
            color_add: parent.color_add.saturating_add(local.color_add),
            color_mul: parent.color_mul.modulate(local.color_mul),
        }
    }
}

impl Default for PartParams {
    fn default() -> Self {
        Self {
            z: 0,
            pos: Vector2::zero(),
            visible: default_visible(),
            alpha: default_alpha(),
            scale: default_scale(),
            rotate: Vec3::ZERO,
            color_add: Color::none(),
            color_mul: Color::white(),
        }
    }
}
