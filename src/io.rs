// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use log::debug;
use ndarray::{Array2, ShapeBuilder};
use serde::{Deserialize, Serialize};

use crate::catalog::{fingerprint, Arrival, RaypathCatalog};
use crate::error::{AnisoError, Result};
use crate::mesh::ComputationalMesh;
use crate::raypath::{PartIntegrals, Raypath};
use crate::structure::VelocityStructure;

/// Name of the MAT variable holding a travel-time table.
pub const TABLE_VARIABLE: &str = "traveltime";

/// Number of columns of a travel-time table: p \[s/rad\], Δ \[deg\], T \[s\].
pub const TABLE_COLUMNS: usize = 3;

#[derive(Serialize, Deserialize)]
struct CatalogFile {
    fingerprint: u64,
    rays: Vec<RayRecord>,
}

#[derive(Serialize, Deserialize)]
struct RayRecord {
    ray_parameter: f64,
    parts: Vec<Option<PartIntegrals>>,
}

/// Write a catalog and its part integrals as JSON.
pub fn save_catalog(catalog: &RaypathCatalog, path: &Path) -> Result<()> {
    let file = CatalogFile {
        fingerprint: catalog.fingerprint(),
        rays: catalog
            .raypaths()
            .iter()
            .map(|r| RayRecord {
                ray_parameter: r.ray_parameter(),
                parts: r.computed_parts().to_vec(),
            })
            .collect(),
    };
    let mut w = std::io::BufWriter::new(std::fs::File::create(path)?);
    serde_json::to_writer(&mut w, &file)?;
    w.flush()?;
    debug!("saved {} rays to {}", catalog.len(), path.display());
    Ok(())
}

/// Read a catalog written by [`save_catalog`] for the given structure and mesh.
///
/// # Errors
/// Returns [`AnisoError::CatalogMismatch`] if the file was built for a
/// different structure or mesh.
pub fn load_catalog(
    path: &Path,
    structure: Arc<dyn VelocityStructure>,
    mesh: Arc<ComputationalMesh>,
) -> Result<RaypathCatalog> {
    let reader = std::io::BufReader::new(std::fs::File::open(path)?);
    let file: CatalogFile = serde_json::from_reader(reader)?;

    let expected = fingerprint(structure.as_ref(), &mesh);
    if file.fingerprint != expected {
        return Err(AnisoError::CatalogMismatch {
            expected,
            found: file.fingerprint,
        });
    }

    let rays = file
        .rays
        .into_iter()
        .map(|record| {
            let got = record.parts.len();
            let parts: [Option<PartIntegrals>; 7] =
                record.parts.try_into().map_err(|_| AnisoError::ShapeMismatch {
                    expected: vec![7],
                    got: vec![got],
                })?;
            Raypath::with_parts(record.ray_parameter, structure.clone(), mesh.clone(), parts)
        })
        .collect::<Result<Vec<_>>>()?;
    debug!("loaded {} rays from {}", rays.len(), path.display());
    RaypathCatalog::from_raypaths(structure, mesh, rays)
}

/// Arrivals as an N×3 table of ray parameter \[s/rad\], distance \[deg\] and time \[s\].
pub fn arrivals_table(arrivals: &[Arrival]) -> Array2<f64> {
    let mut table = Array2::zeros((arrivals.len(), TABLE_COLUMNS));
    for (mut row, a) in table.rows_mut().into_iter().zip(arrivals) {
        row[0] = a.ray_parameter;
        row[1] = a.delta_degrees();
        row[2] = a.time;
    }
    table
}

/// Save an arrival table, inferring the format from the extension.
pub fn save_table(arrivals: &[Arrival], path: &Path) -> Result<()> {
    let table = arrivals_table(arrivals);
    match infer_format(path)? {
        FileFormat::Npy => ndarray_npy::write_npy(path, &table)
            .map_err(|e| AnisoError::Other(format!("npy write error: {}", e))),
        FileFormat::Mat => {
            // Column-major data with MATLAB's [rows, cols] dimensions.
            let col_major: Vec<f64> = table.t().iter().copied().collect();
            write_mat_level5(path, TABLE_VARIABLE, &[table.nrows(), TABLE_COLUMNS], &col_major)
        }
    }
}

/// Load an N×3 arrival table, inferring the format from the extension.
pub fn load_table(path: &Path) -> Result<Array2<f64>> {
    let table = match infer_format(path)? {
        FileFormat::Npy => load_npy_table(path)?,
        FileFormat::Mat => load_mat_table(path, TABLE_VARIABLE)?,
    };
    if table.ncols() != TABLE_COLUMNS {
        return Err(AnisoError::ShapeMismatch {
            expected: vec![table.nrows(), TABLE_COLUMNS],
            got: table.shape().to_vec(),
        });
    }
    Ok(table)
}

fn load_npy_table(path: &Path) -> Result<Array2<f64>> {
    match ndarray_npy::read_npy::<_, Array2<f64>>(path) {
        Ok(a) => Ok(a),
        Err(_) => {
            let arr32: Array2<f32> = ndarray_npy::read_npy(path)
                .map_err(|e| AnisoError::Other(format!("npy read error: {}", e)))?;
            Ok(arr32.mapv(|v| v as f64))
        }
    }
}

fn load_mat_table(path: &Path, variable_name: &str) -> Result<Array2<f64>> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    let mat = matfile::MatFile::parse(&mut reader)
        .map_err(|e| AnisoError::Other(format!("MAT parse error: {}", e)))?;

    let array = mat.find_by_name(variable_name).ok_or_else(|| {
        let available: Vec<&str> = mat.arrays().iter().map(|a| a.name()).collect();
        AnisoError::Other(format!(
            "MAT variable '{}' not found (available: {:?})",
            variable_name, available
        ))
    })?;

    let data: Vec<f64> = match array.data() {
        matfile::NumericData::Double { real, imag: _ } => real.clone(),
        matfile::NumericData::Single { real, imag: _ } => real.iter().map(|&v| v as f64).collect(),
        _ => {
            return Err(AnisoError::Other(
                "MAT array is not f64 or f32".to_string(),
            ))
        }
    };

    let dims = array.size().to_vec();
    if dims.len() != 2 {
        return Err(AnisoError::ShapeMismatch {
            expected: vec![0, TABLE_COLUMNS],
            got: dims,
        });
    }
    Array2::from_shape_vec((dims[0], dims[1]).f(), data)
        .map(|a| a.as_standard_layout().to_owned())
        .map_err(|e| AnisoError::Other(format!("shape error: {}", e)))
}

/// Minimal MAT-file Level 5 writer for a single real f64 matrix.
///
/// `matfile` only reads, so the file is written by hand: a 128-byte header
/// followed by one uncompressed miMATRIX element. `data` is column-major.
fn write_mat_level5(path: &Path, var_name: &str, dimensions: &[usize], data: &[f64]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut w = std::io::BufWriter::new(file);

    // Header: 116 bytes of text, 8-byte subsystem offset, version, endian "IM".
    let desc = b"MATLAB 5.0 MAT-file, created by anisotime";
    let mut header_text = [b' '; 116];
    header_text[..desc.len()].copy_from_slice(desc);
    w.write_all(&header_text)?;
    w.write_all(&[0u8; 8])?;
    w.write_all(&0x0100u16.to_le_bytes())?;
    w.write_all(b"IM")?;

    // Sub-elements are tag (type, size) + data, each padded to 8 bytes.
    let pad8 = |n: u32| n.div_ceil(8) * 8;
    let dims_size = (dimensions.len() * 4) as u32;
    let name_size = var_name.len() as u32;
    let real_size = (data.len() * 8) as u32;
    let matrix_size = 16 + (8 + pad8(dims_size)) + (8 + pad8(name_size)) + (8 + real_size);

    w.write_all(&14u32.to_le_bytes())?; // miMATRIX
    w.write_all(&matrix_size.to_le_bytes())?;

    // Array flags: miUINT32, mxDOUBLE_CLASS, no flags
    w.write_all(&6u32.to_le_bytes())?;
    w.write_all(&8u32.to_le_bytes())?;
    w.write_all(&6u32.to_le_bytes())?;
    w.write_all(&0u32.to_le_bytes())?;

    // Dimensions: miINT32
    w.write_all(&5u32.to_le_bytes())?;
    w.write_all(&dims_size.to_le_bytes())?;
    for &d in dimensions {
        w.write_all(&(d as i32).to_le_bytes())?;
    }
    w.write_all(&vec![0u8; (pad8(dims_size) - dims_size) as usize])?;

    // Name: miINT8
    w.write_all(&1u32.to_le_bytes())?;
    w.write_all(&name_size.to_le_bytes())?;
    w.write_all(var_name.as_bytes())?;
    w.write_all(&vec![0u8; (pad8(name_size) - name_size) as usize])?;

    // Real part: miDOUBLE, already 8-byte aligned
    w.write_all(&9u32.to_le_bytes())?;
    w.write_all(&real_size.to_le_bytes())?;
    for &val in data {
        w.write_all(&val.to_le_bytes())?;
    }

    w.flush()?;
    Ok(())
}

/// Infer file format from extension.
pub fn infer_format(path: &Path) -> Result<FileFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("npy") => Ok(FileFormat::Npy),
        Some("mat") => Ok(FileFormat::Mat),
        Some(ext) => Err(AnisoError::UnsupportedFileFormat(ext.to_string())),
        None => Err(AnisoError::UnsupportedFileFormat(
            "(no extension)".to_string(),
        )),
    }
}

/// Supported file formats for travel-time tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    /// NumPy .npy format.
    Npy,
    /// MATLAB .mat format (Level 5).
    Mat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogBuilder;
    use crate::phase::Phase;
    use crate::structure::PolynomialStructure;
    use std::path::PathBuf;

    fn sample_arrivals() -> Vec<Arrival> {
        vec![
            Arrival {
                phase: Phase::p(),
                ray_parameter: 500.0,
                delta: 0.5,
                time: 400.0,
            },
            Arrival {
                phase: Phase::pcp(),
                ray_parameter: 250.5,
                delta: 0.75,
                time: 620.25,
            },
        ]
    }

    fn homogeneous() -> (Arc<dyn VelocityStructure>, Arc<ComputationalMesh>) {
        let s = PolynomialStructure::homogeneous(6371.0, 3480.0, 1221.5, 3.0, 8.0, 8.0, 4.5, 4.5, 1.0)
            .unwrap();
        let mesh = ComputationalMesh::uniform(&s, 100.0).unwrap();
        (Arc::new(s), Arc::new(mesh))
    }

    #[test]
    fn test_infer_format() {
        assert_eq!(infer_format(Path::new("a.npy")).unwrap(), FileFormat::Npy);
        assert_eq!(infer_format(Path::new("a.mat")).unwrap(), FileFormat::Mat);
        assert!(matches!(
            infer_format(Path::new("a.csv")),
            Err(AnisoError::UnsupportedFileFormat(_))
        ));
        assert!(infer_format(Path::new("table")).is_err());
    }

    #[test]
    fn npy_table_roundtrip() {
        let path = std::env::temp_dir().join("anisotime_test_table.npy");
        save_table(&sample_arrivals(), &path).unwrap();
        let table = load_table(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(table.shape(), &[2, 3]);
        assert_eq!(table[[1, 0]], 250.5);
        assert!((table[[0, 1]] - 0.5f64.to_degrees()).abs() < 1e-12);
        assert_eq!(table[[1, 2]], 620.25);
    }

    #[test]
    fn mat_table_roundtrip() {
        let path = std::env::temp_dir().join("anisotime_test_table.mat");
        save_table(&sample_arrivals(), &path).unwrap();
        let table = load_table(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(table.shape(), &[2, 3]);
        assert_eq!(table[[0, 0]], 500.0);
        assert_eq!(table[[0, 2]], 400.0);
        assert_eq!(table[[1, 0]], 250.5);
        assert!((table[[1, 1]] - 0.75f64.to_degrees()).abs() < 1e-12);
    }

    #[test]
    fn npy_with_wrong_columns_is_rejected() {
        let path = std::env::temp_dir().join("anisotime_test_bad_table.npy");
        ndarray_npy::write_npy(&path, &Array2::<f64>::zeros((4, 2))).unwrap();
        let result = load_table(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(AnisoError::ShapeMismatch { .. })));
    }

    #[test]
    fn catalog_roundtrip_keeps_integrals() {
        let (s, m) = homogeneous();
        let catalog = CatalogBuilder::new(s.clone(), m.clone())
            .with_samples(12)
            .unwrap()
            .build()
            .unwrap();
        let path: PathBuf = std::env::temp_dir().join("anisotime_test_catalog.json");
        save_catalog(&catalog, &path).unwrap();
        let loaded = load_catalog(&path, s, m).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), catalog.len());
        assert_eq!(loaded.fingerprint(), catalog.fingerprint());
        let target = 40f64.to_radians();
        let a = catalog.arrivals(&Phase::p(), 6371.0, target);
        let b = loaded.arrivals(&Phase::p(), 6371.0, target);
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert!((a[0].time - b[0].time).abs() < 1e-9);
        for (x, y) in catalog.raypaths().iter().zip(loaded.raypaths()) {
            assert_eq!(x.ray_parameter(), y.ray_parameter());
            assert_eq!(x.turning(crate::phase::PhasePart::P), y.turning(crate::phase::PhasePart::P));
        }
    }

    #[test]
    fn catalog_for_other_mesh_is_rejected() {
        let (s, m) = homogeneous();
        let catalog = CatalogBuilder::new(s.clone(), m)
            .with_samples(4)
            .unwrap()
            .build()
            .unwrap();
        let path = std::env::temp_dir().join("anisotime_test_catalog_mismatch.json");
        save_catalog(&catalog, &path).unwrap();
        let other = Arc::new(ComputationalMesh::uniform(s.as_ref(), 150.0).unwrap());
        let result = load_catalog(&path, s, other);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(AnisoError::CatalogMismatch { .. })));
    }
}
