use crate::error::{GarmentError, Result};
use garment_utils::numerical::{batch_rotvec_to_euler_zxy, finite_diff};
use log::debug;
use ndarray as nd;
use ndarray::prelude::*;

/// Names of the regressor inputs in the order they are handed over.
pub const FEATURE_ORDER: [&str; 8] = [
    "shape",
    "pose_encoded",
    "pose_encoded_vel",
    "pose_encoded_acc",
    "translation_vel",
    "translation_acc",
    "euler_angles_vel",
    "euler_angles_acc",
];

/// Per frame inputs of the sequence regressor. Every field has one row per
/// frame. Velocities and accelerations are backward differences, so their
/// first row is zero.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionFeatures {
    /// [N, S]
    pub shape: nd::Array2<f32>,
    /// [N, D]
    pub pose_encoded: nd::Array2<f32>,
    pub pose_encoded_vel: nd::Array2<f32>,
    pub pose_encoded_acc: nd::Array2<f32>,
    /// [N, 3]
    pub translation_vel: nd::Array2<f32>,
    pub translation_acc: nd::Array2<f32>,
    /// Root rotation as extrinsic "zxy" Euler angles. Not fed to the
    /// regressor, only its derivatives are. [N, 3]
    pub euler_angles: nd::Array2<f32>,
    pub euler_angles_vel: nd::Array2<f32>,
    pub euler_angles_acc: nd::Array2<f32>,
}

impl MotionFeatures {
    /// Derives the features of a sequence sampled every `h` seconds.
    ///
    /// `shape` is [N, S], `pose_encoded` [N, D], `translation` [N, 3] and
    /// `root_rotation` [N, 3] axis-angle.
    pub fn compute(
        shape: nd::Array2<f32>,
        pose_encoded: nd::Array2<f32>,
        translation: nd::ArrayView2<f32>,
        root_rotation: nd::ArrayView2<f32>,
        h: f32,
    ) -> Result<Self> {
        let nr_frames = pose_encoded.nrows();
        for (what, rows) in [("shape", shape.nrows()), ("translation", translation.nrows()), ("root rotation", root_rotation.nrows())] {
            if rows != nr_frames {
                return Err(GarmentError::shape_mismatch(format!("{what} frames"), nr_frames, rows));
            }
        }
        if translation.ncols() != 3 || root_rotation.ncols() != 3 {
            return Err(GarmentError::shape_mismatch(
                "translation and root rotation columns",
                (3, 3),
                (translation.ncols(), root_rotation.ncols()),
            ));
        }

        let translation_vel = finite_diff(translation, h);
        let translation_acc = finite_diff(translation_vel.view(), h);

        let euler_angles = batch_rotvec_to_euler_zxy(root_rotation);
        let euler_angles_vel = finite_diff(euler_angles.view(), h);
        let euler_angles_acc = finite_diff(euler_angles_vel.view(), h);

        let pose_encoded_vel = finite_diff(pose_encoded.view(), h);
        let pose_encoded_acc = finite_diff(pose_encoded_vel.view(), h);
        debug!("Computed motion features for {nr_frames} frames with h={h}");

        Ok(Self {
            shape,
            pose_encoded,
            pose_encoded_vel,
            pose_encoded_acc,
            translation_vel,
            translation_acc,
            euler_angles,
            euler_angles_vel,
            euler_angles_acc,
        })
    }

    pub fn num_frames(&self) -> usize {
        self.pose_encoded.nrows()
    }

    /// The regressor inputs paired with their names, in [`FEATURE_ORDER`].
    pub fn ordered(&self) -> [(&'static str, nd::ArrayView2<'_, f32>); 8] {
        let views = [
            self.shape.view(),
            self.pose_encoded.view(),
            self.pose_encoded_vel.view(),
            self.pose_encoded_acc.view(),
            self.translation_vel.view(),
            self.translation_acc.view(),
            self.euler_angles_vel.view(),
            self.euler_angles_acc.view(),
        ];
        std::array::from_fn(|i| (FEATURE_ORDER[i], views[i]))
    }

    /// All regressor inputs stacked along the feature axis. [N, sum of widths]
    pub fn concatenated(&self) -> Result<nd::Array2<f32>> {
        let views = self.ordered().map(|(_, view)| view);
        Ok(nd::concatenate(Axis(1), &views)?)
    }
}
