use garment_utils::numerical::ROTATION_EPS;
use serde::{Deserialize, Serialize};

/// Options specifically for the forward pass of the body model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmplOptions {
    /// Add the pose blendshape before skinning. When disabled the pose
    /// feature is still computed but contributes no vertex offsets.
    pub enable_pose_corrective: bool,
    /// Epsilon added to axis-angle vectors before normalising them.
    pub rotation_eps: f32,
}
impl Default for SmplOptions {
    fn default() -> Self {
        Self {
            enable_pose_corrective: true,
            rotation_eps: ROTATION_EPS,
        }
    }
}
impl SmplOptions {
    pub fn new(enable_pose_corrective: bool) -> Self {
        Self {
            enable_pose_corrective,
            ..Default::default()
        }
    }
}
