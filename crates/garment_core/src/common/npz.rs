//! Dtype tolerant readers for npz archives. Body models and motion captures
//! come as float32 or float64 and with signed or unsigned index tables
//! depending on the tool that exported them.
use crate::error::Result;
use ndarray as nd;
use ndarray_npy::NpzReader;
use std::io::{Read, Seek};

/// Reads `name` as f32, converting from f64 if needed.
#[allow(clippy::cast_possible_truncation)]
pub fn read_f32<R: Read + Seek, D: nd::Dimension>(npz: &mut NpzReader<R>, name: &str) -> Result<nd::Array<f32, D>> {
    let err = match npz.by_name::<nd::OwnedRepr<f32>, D>(name) {
        Ok(arr) => return Ok(arr),
        Err(err) => err,
    };
    match npz.by_name::<nd::OwnedRepr<f64>, D>(name) {
        Ok(arr) => Ok(arr.mapv(|x| x as f32)),
        Err(_) => Err(err.into()),
    }
}

/// Reads `name` as i64 from any of i64, i32, u32 or u64. `u64` values wrap,
/// which turns the `u64::MAX` root marker of some kinematic trees into -1.
#[allow(clippy::cast_possible_wrap)]
pub fn read_i64<R: Read + Seek, D: nd::Dimension>(npz: &mut NpzReader<R>, name: &str) -> Result<nd::Array<i64, D>> {
    let err = match npz.by_name::<nd::OwnedRepr<i64>, D>(name) {
        Ok(arr) => return Ok(arr),
        Err(err) => err,
    };
    if let Ok(arr) = npz.by_name::<nd::OwnedRepr<i32>, D>(name) {
        return Ok(arr.mapv(i64::from));
    }
    if let Ok(arr) = npz.by_name::<nd::OwnedRepr<u32>, D>(name) {
        return Ok(arr.mapv(i64::from));
    }
    if let Ok(arr) = npz.by_name::<nd::OwnedRepr<u64>, D>(name) {
        return Ok(arr.mapv(|x| x as i64));
    }
    Err(err.into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_npy::NpzWriter;
    use std::io::Cursor;

    #[test]
    fn reads_f64_as_f32_and_u32_as_i64() {
        let mut writer = NpzWriter::new(Cursor::new(Vec::new()));
        writer.add_array("verts", &array![[1.0_f64, 2.0], [3.0, 4.5]]).unwrap();
        writer.add_array("parents", &array![u32::MAX, 0, 1]).unwrap();
        let buf = writer.finish().unwrap().into_inner();

        let mut npz = NpzReader::new(Cursor::new(buf)).unwrap();
        let verts: nd::Array2<f32> = read_f32(&mut npz, "verts").unwrap();
        assert_eq!(verts, array![[1.0_f32, 2.0], [3.0, 4.5]]);
        let parents: nd::Array1<i64> = read_i64(&mut npz, "parents").unwrap();
        assert_eq!(parents.to_vec(), vec![i64::from(u32::MAX), 0, 1]);
    }

    #[test]
    fn missing_key_is_an_error() {
        let mut writer = NpzWriter::new(Cursor::new(Vec::new()));
        writer.add_array("a", &array![1.0_f32]).unwrap();
        let buf = writer.finish().unwrap().into_inner();
        let mut npz = NpzReader::new(Cursor::new(buf)).unwrap();
        assert!(read_f32::<_, nd::Ix1>(&mut npz, "b").is_err());
    }
}
