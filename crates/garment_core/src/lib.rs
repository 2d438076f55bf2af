// #![warn(
//     clippy::all,
//     clippy::pedantic,
// )]
// #![allow(clippy::must_use_candidate)]
// #![allow(clippy::module_name_repetitions)]

pub mod common;
pub mod error;
pub mod garment;
pub mod skinning;
pub mod smpl;

pub use error::{GarmentError, Result};
