//! Export of replayed models
//!
//! Bodies are written as one binary STL; the feature history is written
//! as RON so it can be rebuilt later against any kernel.

use std::path::Path;

use cadmium_cad::{CadKernel, FeatureHistory, TessellatedMesh};
use glam::Vec3;

use crate::units::LengthUnit;

/// Export-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Write error: {0}")]
    Write(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Nothing to export: no body could be tessellated")]
    Empty,
}

/// What an STL export wrote
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StlStats {
    pub bodies: usize,
    pub triangles: usize,
    /// Bodies without a mesh (no geometry or failed tessellation)
    pub skipped: Vec<String>,
}

/// Tessellate every body and collect one mesh in kernel units
pub fn collect_mesh(
    kernel: &dyn CadKernel,
    history: &mut FeatureHistory,
    tolerance: f32,
) -> (TessellatedMesh, StlStats) {
    let mut combined = TessellatedMesh::new();
    let mut stats = StlStats::default();

    let ids = history.body_ids().to_vec();
    for id in ids {
        let Some(body) = history.get_body_mut(id) else {
            continue;
        };
        let name = body.name.clone();
        match body.get_mesh(kernel, tolerance) {
            Some(mesh) if !mesh.is_empty() => {
                combined.append(mesh);
                stats.bodies += 1;
            }
            _ => stats.skipped.push(name),
        }
    }

    stats.triangles = combined.triangle_count();
    (combined, stats)
}

/// Write all bodies of the history to a binary STL file.
///
/// Kernel coordinates are centimeters; `unit` selects the unit written
/// to the file.
pub fn write_stl(
    kernel: &dyn CadKernel,
    history: &mut FeatureHistory,
    path: impl AsRef<Path>,
    tolerance: f32,
    unit: LengthUnit,
) -> Result<StlStats, ExportError> {
    let (mesh, stats) = collect_mesh(kernel, history, tolerance);
    if stats.triangles == 0 {
        return Err(ExportError::Empty);
    }

    let scale = (1.0 / unit.scale_to_kernel()) as f32;
    let triangles = stl_triangles(&mesh, scale);

    let mut file = std::fs::File::create(path.as_ref()).map_err(|e| ExportError::Io(e.to_string()))?;
    stl_io::write_stl(&mut file, triangles.iter()).map_err(|e| ExportError::Write(e.to_string()))?;

    tracing::info!(
        "Wrote {} triangles from {} bodies to {}",
        stats.triangles,
        stats.bodies,
        path.as_ref().display()
    );
    Ok(stats)
}

fn stl_triangles(mesh: &TessellatedMesh, scale: f32) -> Vec<stl_io::Triangle> {
    let mut triangles = Vec::with_capacity(mesh.triangle_count());

    for tri in mesh.indices.chunks_exact(3) {
        let corner = |i: u32| mesh.vertices.get(i as usize).map(|v| Vec3::from(*v) * scale);
        let (Some(v0), Some(v1), Some(v2)) = (corner(tri[0]), corner(tri[1]), corner(tri[2]))
        else {
            continue;
        };

        // Facet normal from the winding, falling back to the vertex normal
        let normal = (v1 - v0)
            .cross(v2 - v0)
            .try_normalize()
            .or_else(|| mesh.normals.get(tri[0] as usize).map(|n| Vec3::from(*n)))
            .unwrap_or(Vec3::Z);

        triangles.push(stl_io::Triangle {
            normal: stl_io::Normal::new(normal.to_array()),
            vertices: [
                stl_io::Vertex::new(v0.to_array()),
                stl_io::Vertex::new(v1.to_array()),
                stl_io::Vertex::new(v2.to_array()),
            ],
        });
    }

    triangles
}

/// Save the feature history (without geometry) as RON
pub fn save_history(history: &FeatureHistory, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let content = ron::ser::to_string_pretty(history, ron::ser::PrettyConfig::default())
        .map_err(|e| ExportError::Serialize(e.to_string()))?;
    std::fs::write(path.as_ref(), content).map_err(|e| ExportError::Io(e.to_string()))
}

/// Load a feature history saved with [`save_history`]. Call
/// [`FeatureHistory::rebuild`] to regenerate its geometry.
pub fn load_history(path: impl AsRef<Path>) -> Result<FeatureHistory, ExportError> {
    let content =
        std::fs::read_to_string(path.as_ref()).map_err(|e| ExportError::Io(e.to_string()))?;
    ron::from_str(&content).map_err(|e| ExportError::Deserialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReplayConfig;
    use crate::replay::Replayer;
    use crate::schema::CadmiumDocument;
    use cadmium_cad::{ExtrudeFeature, MockKernel, Sketch, SketchPlane};
    use glam::Vec2;

    fn replayed(kernel: &MockKernel) -> FeatureHistory {
        let doc = CadmiumDocument::from_json(
            r#"{"parts": {
                "part_1": {
                    "sketch": {"f": {"l": {"c": {"Center": [0, 0], "Radius": 0.1}}}},
                    "extrusion": {"extrude_depth_towards_normal": 0.1}
                },
                "part_2": {
                    "sketch": {"f": {"l": {"c": {"Center": [1, 0], "Radius": 0.1}}}},
                    "extrusion": {"extrude_depth_towards_normal": 0.1}
                }
            }}"#,
        )
        .unwrap();
        let mut replayer = Replayer::new(kernel, ReplayConfig::default());
        replayer.replay(&doc).unwrap();
        replayer.into_history()
    }

    #[test]
    fn test_write_stl() {
        let kernel = MockKernel::new();
        let mut history = replayed(&kernel);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.stl");

        let stats = write_stl(&kernel, &mut history, &path, 0.01, LengthUnit::Centimeters).unwrap();
        assert_eq!(stats.bodies, 2);
        assert!(stats.skipped.is_empty());

        let mut file = std::fs::File::open(&path).unwrap();
        let mesh = stl_io::read_stl(&mut file).unwrap();
        assert_eq!(mesh.faces.len(), stats.triangles);
    }

    #[test]
    fn test_write_stl_scales_to_unit() {
        let kernel = MockKernel::new();
        let mut history = replayed(&kernel);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_m.stl");

        write_stl(&kernel, &mut history, &path, 0.01, LengthUnit::Meters).unwrap();

        let mut file = std::fs::File::open(&path).unwrap();
        let mesh = stl_io::read_stl(&mut file).unwrap();
        let max_x = mesh
            .vertices
            .iter()
            .map(|v| v[0])
            .fold(f32::MIN, f32::max);
        // part_2 reaches x = 1.1 m
        assert!((max_x - 1.1).abs() < 1e-3, "max x was {max_x}");
    }

    #[test]
    fn test_empty_history_is_an_error() {
        let kernel = MockKernel::new();
        let mut history = FeatureHistory::new();
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            write_stl(
                &kernel,
                &mut history,
                dir.path().join("empty.stl"),
                0.01,
                LengthUnit::Centimeters
            ),
            Err(ExportError::Empty)
        ));
    }

    #[test]
    fn test_history_roundtrip_and_rebuild() {
        let kernel = MockKernel::new();
        let history = replayed(&kernel);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.ron");

        save_history(&history, &path).unwrap();
        let mut loaded = load_history(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.body_ids(), history.body_ids());

        let fresh = MockKernel::new();
        loaded.rebuild(&fresh).unwrap();
        let (_, stats) = collect_mesh(&fresh, &mut loaded, 0.01);
        assert_eq!(stats.bodies, 2);
    }

    #[test]
    fn test_body_without_geometry_is_skipped() {
        let kernel = MockKernel::new();
        let mut history = FeatureHistory::new();
        let mut sketch = Sketch::new("s", SketchPlane::xy());
        sketch.add_circle(Vec2::ZERO, 1.0).unwrap();
        let sketch_id = history.add_sketch(sketch);
        history
            .extrude(&kernel, ExtrudeFeature::new("only", sketch_id, 0, 1.0))
            .unwrap();

        // A loaded history has bodies but no solids until rebuilt
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.ron");
        save_history(&history, &path).unwrap();
        let mut loaded = load_history(&path).unwrap();

        let (mesh, stats) = collect_mesh(&kernel, &mut loaded, 0.01);
        assert!(mesh.is_empty());
        assert_eq!(stats.skipped, vec!["only".to_string()]);
    }

    #[test]
    fn test_load_missing_history() {
        assert!(matches!(
            load_history("/nonexistent/history.ron"),
            Err(ExportError::Io(_))
        ));
    }
}
