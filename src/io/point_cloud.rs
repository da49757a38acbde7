//! A lossless binary point cloud encoding (`.bpc`) used for the pipeline's
//! checkpoint artifacts. The layout is deliberately simple:
//!
//! - bytes 0-3: magic number b"BPC1" identifying the file type
//! - byte 4: flags
//!   - bit 0: normal data present
//!   - bit 1: color data present
//! - bytes 5-8: point count (uint32, little endian)
//!
//! Followed by one record per point, all little endian:
//!
//! - x, y, z coordinates (f64)
//! - normal x, y, z (f64, only when the normal flag is set)
//! - r, g, b (uint8, only when the color flag is set)
//!
//! Coordinates and normals round-trip exactly; this is the property the
//! audit trail depends on.

use crate::{Point3, PointCloud, PointCloudFeatures, Result, UnitVec3, Vector3};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 4] = b"BPC1";

/// Write a point cloud to a `.bpc` file, creating or truncating it.
///
/// # Arguments
///
/// * `path`: the file to write
/// * `cloud`: the cloud to encode
///
/// returns: Result<(), ReconError>
pub fn write_bpc(path: &Path, cloud: &PointCloud) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let mut flags = 0u8;
    if cloud.normals().is_some() {
        flags |= 1;
    }
    if cloud.colors().is_some() {
        flags |= 2;
    }

    writer.write_all(MAGIC)?;
    writer.write_all(&[flags])?;
    writer.write_all(&(cloud.len() as u32).to_le_bytes())?;

    for (i, point) in cloud.points().iter().enumerate() {
        writer.write_all(&point.x.to_le_bytes())?;
        writer.write_all(&point.y.to_le_bytes())?;
        writer.write_all(&point.z.to_le_bytes())?;

        if let Some(normals) = cloud.normals() {
            let n = &normals[i];
            writer.write_all(&n.x.to_le_bytes())?;
            writer.write_all(&n.y.to_le_bytes())?;
            writer.write_all(&n.z.to_le_bytes())?;
        }

        if let Some(colors) = cloud.colors() {
            writer.write_all(&colors[i])?;
        }
    }

    Ok(())
}

/// Read a point cloud from a `.bpc` file written by [`write_bpc`].
///
/// # Arguments
///
/// * `path`: the file to read
///
/// returns: Result<PointCloud, ReconError>
pub fn load_bpc(path: &Path) -> Result<PointCloud> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(format!("not a bpc file: {}", path.display()).into());
    }

    let mut flags = [0u8; 1];
    reader.read_exact(&mut flags)?;
    let has_normals = flags[0] & 1 != 0;
    let has_colors = flags[0] & 2 != 0;

    let mut count_bytes = [0u8; 4];
    reader.read_exact(&mut count_bytes)?;
    let count = u32::from_le_bytes(count_bytes) as usize;

    let mut points = Vec::with_capacity(count);
    let mut normals = has_normals.then(|| Vec::with_capacity(count));
    let mut colors = has_colors.then(|| Vec::with_capacity(count));

    for _ in 0..count {
        let mut coords = [0u8; 24];
        reader.read_exact(&mut coords)?;
        let x = f64::from_le_bytes(coords[0..8].try_into().unwrap());
        let y = f64::from_le_bytes(coords[8..16].try_into().unwrap());
        let z = f64::from_le_bytes(coords[16..24].try_into().unwrap());
        points.push(Point3::new(x, y, z));

        if let Some(normals) = &mut normals {
            let mut n = [0u8; 24];
            reader.read_exact(&mut n)?;
            let nx = f64::from_le_bytes(n[0..8].try_into().unwrap());
            let ny = f64::from_le_bytes(n[8..16].try_into().unwrap());
            let nz = f64::from_le_bytes(n[16..24].try_into().unwrap());
            normals.push(UnitVec3::new_unchecked(Vector3::new(nx, ny, nz)));
        }

        if let Some(colors) = &mut colors {
            let mut rgb = [0u8; 3];
            reader.read_exact(&mut rgb)?;
            colors.push(rgb);
        }
    }

    PointCloud::try_new(points, normals, colors)
}
