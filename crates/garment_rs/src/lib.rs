#![deny(missing_docs)]
//! ## Crate Items Overview
//!
//! Quick links to the main items of garment-rs.
//!
//! ### Modules
//! - [`garment_core`](crate::garment_core) - Body model, skinning, motion loading and the garment pipeline.
//! - [`garment_utils`](crate::garment_utils) - Rotation and finite difference helpers.
//!
//! ## Demos
//! `demos/drape_sequence` loads a motion, a body model and a garment mesh and
//! writes one obj pair per frame.
pub use garment_core;
pub use garment_utils;
