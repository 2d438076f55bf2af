use super::{config::MotionConfig, npz::read_f32};
use crate::error::{GarmentError, Result};
use log::{debug, info};
use nalgebra as na;
use ndarray as nd;
use ndarray::prelude::*;
use ndarray_npy::NpzReader;
use std::io::{Read, Seek};
use std::path::Path;

/// A motion sequence ready for the garment pipeline: per frame axis-angle
/// pose (root first) and translation, and one shape shared by every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Motion {
    /// [N, 3 * K]
    pub pose: nd::Array2<f32>,
    /// [S]
    pub shape: nd::Array1<f32>,
    /// [N, 3]
    pub translation: nd::Array2<f32>,
}

impl Motion {
    /// Wraps already normalised arrays.
    pub fn new(pose: nd::Array2<f32>, shape: nd::Array1<f32>, translation: nd::Array2<f32>) -> Result<Self> {
        let nr_frames = pose.nrows();
        if nr_frames == 0 {
            return Err(GarmentError::shape_mismatch("motion frames", "at least 1", 0));
        }
        if pose.ncols() < 3 || pose.ncols() % 3 != 0 {
            return Err(GarmentError::shape_mismatch("pose values per frame", "a positive multiple of 3", pose.ncols()));
        }
        if translation.dim() != (nr_frames, 3) {
            return Err(GarmentError::shape_mismatch("translation", (nr_frames, 3), translation.dim()));
        }
        Ok(Self { pose, shape, translation })
    }

    pub fn num_frames(&self) -> usize {
        self.pose.nrows()
    }

    /// Number of joints in the pose, root included
    pub fn num_joints(&self) -> usize {
        self.pose.ncols() / 3
    }

    /// Root rotation of every frame. [N, 3]
    pub fn root_rotation(&self) -> nd::ArrayView2<'_, f32> {
        self.pose.slice(s![.., 0..3])
    }

    /// Pose without the root rotation. [N, 3 * (K - 1)]
    pub fn body_pose(&self) -> nd::ArrayView2<'_, f32> {
        self.pose.slice(s![.., 3..])
    }

    /// The shape repeated for every frame. [N, S]
    pub fn shape_per_frame(&self) -> nd::Array2<f32> {
        let shape = self.shape.view().insert_axis(Axis(0));
        let mut tiled = nd::Array2::<f32>::zeros((self.num_frames(), self.shape.len()));
        tiled.assign(&shape);
        tiled
    }

    /// Loads a motion capture archive with `poses`, `trans`, `betas` and
    /// `mocap_framerate` and normalises it according to `config`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new_from_npz(path: impl AsRef<Path>, config: &MotionConfig) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading motion from {}", path.display());
        let mut npz = NpzReader::new(std::fs::File::open(path)?)?;
        Self::new_from_npz_reader(&mut npz, config)
    }

    pub fn new_from_reader<R: Read + Seek>(reader: R, config: &MotionConfig) -> Result<Self> {
        let mut npz = NpzReader::new(reader)?;
        Self::new_from_npz_reader(&mut npz, config)
    }

    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    #[allow(clippy::cast_possible_wrap)]
    fn new_from_npz_reader<R: Read + Seek>(npz: &mut NpzReader<R>, config: &MotionConfig) -> Result<Self> {
        config.validate()?;
        debug!("npz names is {:?}", npz.names()?);
        let poses: nd::Array2<f32> = read_f32(npz, "poses")?;
        let trans: nd::Array2<f32> = read_f32(npz, "trans")?;
        let betas: nd::Array1<f32> = read_f32(npz, "betas")?;
        let framerate: nd::Array0<f32> = read_f32(npz, "mocap_framerate")?;
        let framerate = framerate[()];

        if poses.nrows() != trans.nrows() {
            return Err(GarmentError::shape_mismatch("translation frames", poses.nrows(), trans.nrows()));
        }
        if trans.ncols() != 3 {
            return Err(GarmentError::shape_mismatch("translation", (trans.nrows(), 3), trans.dim()));
        }
        if poses.ncols() < config.num_pose_params {
            return Err(GarmentError::shape_mismatch(
                "pose values per frame",
                format!("at least {}", config.num_pose_params),
                poses.ncols(),
            ));
        }
        if betas.len() < config.num_betas {
            return Err(GarmentError::shape_mismatch("shape coefficients", format!("at least {}", config.num_betas), betas.len()));
        }

        // the regressor is trained on sequences at the target rate, so keep
        // every n-th frame
        let drop_factor = (framerate / config.target_fps).floor();
        if drop_factor.is_nan() || drop_factor < 1.0 {
            return Err(GarmentError::invalid_config(format!(
                "mocap framerate {framerate} is below the target rate {}",
                config.target_fps
            )));
        }
        let step = drop_factor as isize;
        info!("Motion at {framerate} fps, keeping every {step} frame(s) of {}", poses.nrows());
        let mut pose = poses.slice(s![..;step, 0..config.num_pose_params]).to_owned();
        let mut translation = trans.slice(s![..;step, ..]).to_owned();
        let shape = betas.slice(s![0..config.num_betas]).to_owned();

        if config.separate_arms {
            let angle = config.arm_angle_deg.to_radians();
            rotate_joint(&mut pose, config.left_arm_joint, &rot_z(-angle));
            rotate_joint(&mut pose, config.right_arm_joint, &rot_z(angle));
        }

        if config.swap_axes {
            let world = capture_to_model_frame();
            rotate_joint(&mut pose, 0, &world);
            for mut t in translation.outer_iter_mut() {
                let rotated = world * na::Vector3::new(t[0], t[1], t[2]);
                t.assign(&array![rotated.x, rotated.y, rotated.z]);
            }
        }

        pose.slice_mut(s![.., config.hand_pose_start..]).fill(0.0);

        if config.recenter && translation.nrows() > 0 {
            let first = translation.row(0).to_owned();
            translation -= &first;
        }

        Self::new(pose, shape, translation)
    }
}

fn rot_z(angle: f32) -> na::Rotation3<f32> {
    na::Rotation3::from_axis_angle(&na::Vector3::z_axis(), angle)
}

/// Extrinsic z then x rotation by (-90, 270) degrees. Maps the z-up capture
/// frame onto the y-up body model frame: (x, y, z) -> (y, z, x).
fn capture_to_model_frame() -> na::Rotation3<f32> {
    let rz = rot_z(-90.0_f32.to_radians());
    let rx = na::Rotation3::from_axis_angle(&na::Vector3::x_axis(), 270.0_f32.to_radians());
    rx * rz
}

/// Pre-multiplies the axis-angle rotation of `joint` in every frame by `rot`.
fn rotate_joint(pose: &mut nd::Array2<f32>, joint: usize, rot: &na::Rotation3<f32>) {
    let cols = 3 * joint..3 * joint + 3;
    for mut frame in pose.outer_iter_mut() {
        let mut v = frame.slice_mut(s![cols.clone()]);
        let local = na::Rotation3::new(na::Vector3::new(v[0], v[1], v[2]));
        let rotated = (rot * local).scaled_axis();
        v.assign(&array![rotated.x, rotated.y, rotated.z]);
    }
}
