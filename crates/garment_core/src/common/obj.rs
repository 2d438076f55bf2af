//! Minimal Wavefront obj support: vertex positions and triangle faces only.
//! Texture and normal indices in faces are skipped, polygons are split into
//! triangle fans.

use crate::error::{GarmentError, Result};
use log::info;
use ndarray as nd;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Triangle mesh with 0-based face indices
#[derive(Clone, Debug, PartialEq)]
pub struct ObjMesh {
    /// [V, 3]
    pub verts: nd::Array2<f32>,
    /// [F, 3]
    pub faces: nd::Array2<u32>,
}

impl ObjMesh {
    pub fn num_verts(&self) -> usize {
        self.verts.nrows()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.nrows()
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading mesh from {}", path.display());
        Self::read_from(BufReader::new(File::open(path)?))
    }

    pub fn read_from<R: BufRead>(reader: R) -> Result<Self> {
        let mut verts: Vec<f32> = Vec::new();
        let mut faces: Vec<u32> = Vec::new();
        for (idx_line, line) in reader.lines().enumerate() {
            let line = line?;
            let parse_err = |reason: String| GarmentError::ObjParse { line: idx_line + 1, reason };
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("v") => {
                    let coords: Vec<&str> = tokens.take(3).collect();
                    if coords.len() != 3 {
                        return Err(parse_err(format!("vertex needs 3 coordinates, got {}", coords.len())));
                    }
                    for c in coords {
                        verts.push(c.parse().map_err(|_| parse_err(format!("invalid coordinate '{c}'")))?);
                    }
                }
                Some("f") => {
                    let corners = tokens
                        .map(|token| {
                            let idx = token.split('/').next().unwrap_or_default();
                            match idx.parse::<u32>() {
                                Ok(i) if i > 0 => Ok(i - 1),
                                _ => Err(parse_err(format!("invalid vertex index '{token}'"))),
                            }
                        })
                        .collect::<Result<Vec<u32>>>()?;
                    if corners.len() < 3 {
                        return Err(parse_err(format!("face needs at least 3 corners, got {}", corners.len())));
                    }
                    for i in 1..corners.len() - 1 {
                        faces.extend_from_slice(&[corners[0], corners[i], corners[i + 1]]);
                    }
                }
                _ => {}
            }
        }

        let nr_verts = verts.len() / 3;
        if let Some(&idx) = faces.iter().find(|&&idx| idx as usize >= nr_verts) {
            return Err(GarmentError::shape_mismatch("obj face vertex index", format!("< {nr_verts}"), idx + 1));
        }
        Ok(Self {
            verts: nd::Array2::from_shape_vec((nr_verts, 3), verts)?,
            faces: nd::Array2::from_shape_vec((faces.len() / 3, 3), faces)?,
        })
    }
}

/// Writes vertices [V, 3] and 0-based triangles [F, 3] as an obj file,
/// creating the parent directory if needed.
pub fn write_obj(path: impl AsRef<Path>, verts: nd::ArrayView2<f32>, faces: nd::ArrayView2<u32>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    write_obj_to(&mut writer, verts, faces)?;
    writer.flush()?;
    info!("Saved {}", path.display());
    Ok(())
}

pub fn write_obj_to<W: Write>(writer: &mut W, verts: nd::ArrayView2<f32>, faces: nd::ArrayView2<u32>) -> Result<()> {
    if verts.ncols() != 3 || faces.ncols() != 3 {
        return Err(GarmentError::shape_mismatch("obj columns", (3, 3), (verts.ncols(), faces.ncols())));
    }
    for v in verts.rows() {
        writeln!(writer, "v {:.6} {:.6} {:.6}", v[0], v[1], v[2])?;
    }
    //obj faces are 1-based
    for f in faces.rows() {
        writeln!(writer, "f {} {} {}", f[0] + 1, f[1] + 1, f[2] + 1)?;
    }
    Ok(())
}
