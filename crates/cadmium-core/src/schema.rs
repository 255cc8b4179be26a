//! CADmium / Fusion360-ds JSON schema
//!
//! The document is a map of named parts. Each part carries a coordinate
//! system, a nested sketch map (face → loop → curve) and an extrusion.
//! Only the keys replay needs are typed; the sketch map is walked
//! leniently because real files mix circles with lines and arcs.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Operation name used when a part does not give one
pub const DEFAULT_OPERATION: &str = "NewBodyFeatureOperation";

/// Schema errors
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid part '{part}': {message}")]
    InvalidPart { part: String, message: String },

    #[error("Invalid circle {face}/{loop_name}/{curve}: {message}")]
    InvalidCircle {
        face: String,
        loop_name: String,
        curve: String,
        message: String,
    },
}

/// A whole CADmium JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CadmiumDocument {
    /// Parts by name, in file order
    #[serde(default)]
    pub parts: Option<Map<String, Value>>,
}

impl CadmiumDocument {
    /// Parse a document from JSON text
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a document from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Number of parts in the document
    pub fn part_count(&self) -> usize {
        self.parts.as_ref().map_or(0, |p| p.len())
    }

    /// Parts in file order. Each part is decoded on its own so one
    /// malformed part does not hide the others.
    pub fn parts(&self) -> impl Iterator<Item = (&str, Result<PartDescription, SchemaError>)> {
        self.parts.iter().flatten().map(|(name, value)| {
            let part = PartDescription::deserialize(value).map_err(|e| SchemaError::InvalidPart {
                part: name.clone(),
                message: e.to_string(),
            });
            (name.as_str(), part)
        })
    }
}

/// One part of the document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartDescription {
    #[serde(default)]
    pub coordinate_system: CoordinateSystem,
    /// Raw sketch map, walked with [`PartDescription::circles`]
    #[serde(default)]
    pub sketch: Map<String, Value>,
    #[serde(default)]
    pub extrusion: Extrusion,
    /// Free-form description block; only its `name` is read, for logging
    #[serde(default)]
    pub description: Option<Value>,
}

/// Placement of the part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSystem {
    /// Euler angles in degrees
    #[serde(rename = "Euler Angles", default = "zero3_vec")]
    pub euler_angles: Vec<f64>,
    #[serde(rename = "Translation Vector", default)]
    pub translation: [f64; 3],
}

fn zero3_vec() -> Vec<f64> {
    vec![0.0; 3]
}

impl Default for CoordinateSystem {
    fn default() -> Self {
        Self {
            euler_angles: zero3_vec(),
            translation: [0.0; 3],
        }
    }
}

/// Extrusion parameters in source units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extrusion {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub extrude_depth_towards_normal: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub extrude_depth_opposite_normal: f64,
    #[serde(default = "unit_scale", deserialize_with = "lenient_f64")]
    pub sketch_scale: f64,
    #[serde(default = "default_operation")]
    pub operation: String,
}

fn unit_scale() -> f64 {
    1.0
}

fn default_operation() -> String {
    DEFAULT_OPERATION.to_string()
}

impl Default for Extrusion {
    fn default() -> Self {
        Self {
            extrude_depth_towards_normal: 0.0,
            extrude_depth_opposite_normal: 0.0,
            sketch_scale: unit_scale(),
            operation: default_operation(),
        }
    }
}

/// A circle as written in the sketch map, in source units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SketchCircle {
    pub center: [f64; 2],
    pub radius: f64,
}

#[derive(Deserialize)]
struct RawCircle {
    #[serde(rename = "Center")]
    center: [f64; 2],
    #[serde(rename = "Radius", deserialize_with = "lenient_f64")]
    radius: f64,
}

impl PartDescription {
    /// Collect every circle in the sketch map, in file order.
    ///
    /// Faces, loops and curves that are not objects are skipped, as are
    /// curves without both `Center` and `Radius` (lines, arcs). A curve
    /// that has both keys but cannot be read is an error.
    pub fn circles(&self) -> Result<Vec<SketchCircle>, SchemaError> {
        let mut circles = Vec::new();

        for (face_name, face) in &self.sketch {
            let Some(face) = face.as_object() else {
                continue;
            };
            for (loop_name, loop_value) in face {
                let Some(curves) = loop_value.as_object() else {
                    continue;
                };
                for (curve_name, curve) in curves {
                    let Some(curve) = curve.as_object() else {
                        continue;
                    };
                    if !(curve.contains_key("Center") && curve.contains_key("Radius")) {
                        tracing::debug!(
                            "Skipping non-circle curve {}/{}/{}",
                            face_name,
                            loop_name,
                            curve_name
                        );
                        continue;
                    }

                    let raw = RawCircle::deserialize(Value::Object(curve.clone())).map_err(
                        |e| SchemaError::InvalidCircle {
                            face: face_name.clone(),
                            loop_name: loop_name.clone(),
                            curve: curve_name.clone(),
                            message: e.to_string(),
                        },
                    )?;
                    circles.push(SketchCircle {
                        center: raw.center,
                        radius: raw.radius,
                    });
                }
            }
        }

        Ok(circles)
    }

    /// Display name from the description block, if any
    pub fn display_name(&self) -> Option<&str> {
        self.description.as_ref()?.get("name")?.as_str()
    }
}

/// Accept numbers and numeric strings, as the dataset contains both
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RING: &str = r#"{
        "parts": {
            "part_1": {
                "coordinate_system": {
                    "Euler Angles": [180.0, 0.0, -90.0],
                    "Translation Vector": [0.1, 0.2, 0.05]
                },
                "sketch": {
                    "face_1": {
                        "loop_1": { "circle_1": { "Center": [0.5, 0.5], "Radius": 0.5 } },
                        "loop_2": { "circle_1": { "Center": [0.5, 0.5], "Radius": 0.25 } }
                    }
                },
                "extrusion": {
                    "extrude_depth_towards_normal": 0.1,
                    "extrude_depth_opposite_normal": 0.0,
                    "sketch_scale": 0.75,
                    "operation": "JoinFeatureOperation"
                },
                "description": { "name": "Ring", "shape": "A flat ring" }
            }
        }
    }"#;

    #[test]
    fn test_parse_ring_part() {
        let doc = CadmiumDocument::from_json(RING).unwrap();
        assert_eq!(doc.part_count(), 1);

        let (name, part) = doc.parts().next().unwrap();
        let part = part.unwrap();
        assert_eq!(name, "part_1");
        assert_eq!(part.coordinate_system.euler_angles, vec![180.0, 0.0, -90.0]);
        assert_eq!(part.coordinate_system.translation, [0.1, 0.2, 0.05]);
        assert_eq!(part.extrusion.sketch_scale, 0.75);
        assert_eq!(part.extrusion.operation, "JoinFeatureOperation");
        assert_eq!(part.display_name(), Some("Ring"));

        let circles = part.circles().unwrap();
        assert_eq!(circles.len(), 2);
        assert_eq!(circles[1].radius, 0.25);
    }

    #[test]
    fn test_defaults_for_missing_keys() {
        let doc = CadmiumDocument::from_json(r#"{"parts": {"p": {}}}"#).unwrap();
        let (_, part) = doc.parts().next().unwrap();
        let part = part.unwrap();

        assert_eq!(part.coordinate_system, CoordinateSystem::default());
        assert_eq!(part.extrusion, Extrusion::default());
        assert_eq!(part.extrusion.operation, DEFAULT_OPERATION);
        assert!(part.circles().unwrap().is_empty());
    }

    #[test]
    fn test_missing_parts() {
        let doc = CadmiumDocument::from_json(r#"{"final_shape": "x"}"#).unwrap();
        assert_eq!(doc.part_count(), 0);
        assert_eq!(doc.parts().count(), 0);
    }

    #[test]
    fn test_parts_keep_file_order() {
        let doc =
            CadmiumDocument::from_json(r#"{"parts": {"part_2": {}, "part_1": {}, "part_3": {}}}"#)
                .unwrap();
        let names: Vec<_> = doc.parts().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["part_2", "part_1", "part_3"]);
    }

    #[test]
    fn test_bad_translation_fails_only_that_part() {
        let doc = CadmiumDocument::from_json(
            r#"{"parts": {
                "bad": {"coordinate_system": {"Translation Vector": [1.0, 2.0]}},
                "good": {}
            }}"#,
        )
        .unwrap();
        let results: Vec<_> = doc.parts().collect();
        assert!(matches!(
            &results[0].1,
            Err(SchemaError::InvalidPart { part, .. }) if part == "bad"
        ));
        assert!(results[1].1.is_ok());
    }

    #[test]
    fn test_lines_and_junk_are_skipped() {
        let doc = CadmiumDocument::from_json(
            r#"{"parts": {"p": {"sketch": {
                "face_1": {
                    "loop_1": {
                        "line_1": { "Start Point": [0, 0], "End Point": [1, 0] },
                        "circle_1": { "Center": [0, 0], "Radius": 1 },
                        "note": 3
                    },
                    "loop_2": "not a loop"
                },
                "face_2": [1, 2, 3]
            }}}}"#,
        )
        .unwrap();
        let (_, part) = doc.parts().next().unwrap();
        let circles = part.unwrap().circles().unwrap();
        assert_eq!(
            circles,
            vec![SketchCircle {
                center: [0.0, 0.0],
                radius: 1.0
            }]
        );
    }

    #[test]
    fn test_malformed_circle_is_an_error() {
        let doc = CadmiumDocument::from_json(
            r#"{"parts": {"p": {"sketch": {"face_1": {"loop_1": {
                "circle_1": { "Center": [0, 0, 0], "Radius": 1 }
            }}}}}}"#,
        )
        .unwrap();
        let (_, part) = doc.parts().next().unwrap();
        assert!(matches!(
            part.unwrap().circles(),
            Err(SchemaError::InvalidCircle { curve, .. }) if curve == "circle_1"
        ));
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let doc = CadmiumDocument::from_json(
            r#"{"parts": {"p": {"extrusion": {
                "extrude_depth_towards_normal": "0.25",
                "sketch_scale": " 2 "
            }}}}"#,
        )
        .unwrap();
        let (_, part) = doc.parts().next().unwrap();
        let extrusion = part.unwrap().extrusion;
        assert_eq!(extrusion.extrude_depth_towards_normal, 0.25);
        assert_eq!(extrusion.sketch_scale, 2.0);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            CadmiumDocument::from_json("{ nope"),
            Err(SchemaError::Json(_))
        ));
    }
}
