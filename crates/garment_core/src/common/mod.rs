pub mod config;
pub mod motion;
pub mod npz;
pub mod obj;
pub mod outputs;
pub mod smpl_options;
