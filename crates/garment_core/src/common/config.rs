use super::smpl_options::SmplOptions;
use crate::error::{GarmentError, Result};
use crate::smpl::{HAND_POSE_START, LEFT_ARM_IDX, NUM_BETAS, POSE_DIM, RIGHT_ARM_IDX};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;

/// Config of the garment deformation pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Frame rate the sequence regressor was trained on. Velocities and
    /// accelerations use a timestep of `1 / fps`.
    pub fps: f32,
    /// Options for the body model evaluation.
    pub smpl: SmplOptions,
}
impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            smpl: SmplOptions::default(),
        }
    }
}
impl PipelineConfig {
    pub fn timestep(&self) -> f32 {
        1.0 / self.fps
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(GarmentError::invalid_config(format!("fps must be positive, got {}", self.fps)));
        }
        if !(self.smpl.rotation_eps.is_finite() && self.smpl.rotation_eps >= 0.0) {
            return Err(GarmentError::invalid_config(format!(
                "rotation_eps must be a non-negative number, got {}",
                self.smpl.rotation_eps
            )));
        }
        Ok(())
    }

    /// Reads and validates a json config. Missing keys take their defaults,
    /// unknown keys are rejected.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = read_json(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }
}

/// How a raw motion capture sequence is normalised before it reaches the
/// pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MotionConfig {
    /// Frames are dropped so the sequence plays at roughly this rate.
    pub target_fps: f32,
    /// Pose values kept per frame, extra columns are cut off.
    pub num_pose_params: usize,
    /// Shape coefficients kept, extra coefficients are cut off.
    pub num_betas: usize,
    /// Rotate the upper arms away from the torso.
    pub separate_arms: bool,
    /// Rotation about z applied to each upper arm, in degrees.
    pub arm_angle_deg: f32,
    pub left_arm_joint: usize,
    pub right_arm_joint: usize,
    /// Convert from the z-up capture frame to the y-up model frame.
    pub swap_axes: bool,
    /// Pose values from this index on are zeroed.
    pub hand_pose_start: usize,
    /// Translate the sequence so the first frame sits at the origin.
    pub recenter: bool,
}
impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            target_fps: 30.0,
            num_pose_params: POSE_DIM,
            num_betas: NUM_BETAS,
            separate_arms: true,
            arm_angle_deg: 15.0,
            left_arm_joint: LEFT_ARM_IDX,
            right_arm_joint: RIGHT_ARM_IDX,
            swap_axes: true,
            hand_pose_start: HAND_POSE_START,
            recenter: true,
        }
    }
}
impl MotionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.target_fps.is_finite() && self.target_fps > 0.0) {
            return Err(GarmentError::invalid_config(format!("target_fps must be positive, got {}", self.target_fps)));
        }
        if self.num_pose_params < 3 || self.num_pose_params % 3 != 0 {
            return Err(GarmentError::invalid_config(format!(
                "num_pose_params must be a positive multiple of 3, got {}",
                self.num_pose_params
            )));
        }
        if self.hand_pose_start > self.num_pose_params {
            return Err(GarmentError::invalid_config(format!(
                "hand_pose_start {} is past the end of the pose ({})",
                self.hand_pose_start, self.num_pose_params
            )));
        }
        let num_joints = self.num_pose_params / 3;
        if self.separate_arms && (self.left_arm_joint >= num_joints || self.right_arm_joint >= num_joints) {
            return Err(GarmentError::invalid_config(format!(
                "arm joints {} and {} must be below {num_joints}",
                self.left_arm_joint, self.right_arm_joint
            )));
        }
        Ok(())
    }

    /// Reads and validates a json config. Missing keys take their defaults,
    /// unknown keys are rejected.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = read_json(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    info!("Reading config from {}", path.display());
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
        assert!(MotionConfig::default().validate().is_ok());
        assert!((PipelineConfig::default().timestep() - 1.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn missing_keys_take_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{ "fps": 60.0 }"#).unwrap();
        assert_eq!(config.fps, 60.0);
        assert_eq!(config.smpl, SmplOptions::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res: std::result::Result<PipelineConfig, _> = serde_json::from_str(r#"{ "fsp": 60.0 }"#);
        assert!(res.is_err());
        let res: std::result::Result<MotionConfig, _> = serde_json::from_str(r#"{ "separate_legs": true }"#);
        assert!(res.is_err());
    }

    #[test]
    fn rejects_bad_values() {
        let config = PipelineConfig { fps: 0.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(GarmentError::InvalidConfig(_))));
        let config = MotionConfig {
            num_pose_params: 70,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = MotionConfig {
            hand_pose_start: 80,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = MotionConfig {
            num_pose_params: 30,
            hand_pose_start: 30,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
