pub mod kinematic_tree;
pub mod smpl_model;

/// Joints of the SMPL body including the root.
pub const NUM_JOINTS: usize = 24;
/// Axis-angle pose values per frame, root first.
pub const POSE_DIM: usize = NUM_JOINTS * 3;
/// Shape coefficients consumed from a motion file.
pub const NUM_BETAS: usize = 10;
/// First pose value belonging to the hands.
pub const HAND_POSE_START: usize = 66;
pub const LEFT_ARM_IDX: usize = 17;
pub const RIGHT_ARM_IDX: usize = 16;
