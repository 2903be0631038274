use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::value::{MapAccessDeserializer, SeqAccessDeserializer};
use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::features::domain::face_box::{FaceBox, FrameFaceSet};
use crate::features::domain::feature_source::{FeatureError, FeatureSource, VideoFeatures};

/// One frame record. Validation sets carry `{faces, x_crop}` objects;
/// plain feature dumps are bare arrays of faces.
///
/// The shape is picked from the first JSON token, so field errors inside a
/// record surface as they are instead of a generic variant mismatch.
enum FrameRecord {
    Labeled(LabeledRecord),
    Bare(Vec<FaceRecord>),
}

#[derive(Deserialize)]
struct LabeledRecord {
    faces: Vec<FaceRecord>,
    #[serde(default)]
    x_crop: Option<i32>,
}

impl<'de> Deserialize<'de> for FrameRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FrameRecordVisitor)
    }
}

struct FrameRecordVisitor;

impl<'de> Visitor<'de> for FrameRecordVisitor {
    type Value = FrameRecord;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a {faces, x_crop} object or an array of faces")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<FrameRecord, A::Error> {
        Vec::deserialize(SeqAccessDeserializer::new(seq)).map(FrameRecord::Bare)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<FrameRecord, A::Error> {
        LabeledRecord::deserialize(MapAccessDeserializer::new(map)).map(FrameRecord::Labeled)
    }
}

#[derive(Deserialize)]
struct FaceRecord {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    #[serde(default, alias = "score")]
    confidence: Option<f64>,
}

/// Reads per-video feature files in the detector's JSON format.
pub struct JsonFeatureReader;

impl JsonFeatureReader {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, source: &Path, bytes: &[u8]) -> Result<VideoFeatures, FeatureError> {
        let records: Vec<FrameRecord> =
            serde_json::from_slice(bytes).map_err(|e| FeatureError::Parse {
                path: source.to_path_buf(),
                source: e,
            })?;

        let mut face_sets = Vec::with_capacity(records.len());
        let mut ground_truth = Vec::with_capacity(records.len());

        for (frame, record) in records.into_iter().enumerate() {
            let (faces, x_crop) = match record {
                FrameRecord::Labeled(LabeledRecord { faces, x_crop }) => (faces, x_crop),
                FrameRecord::Bare(faces) => (faces, None),
            };
            let boxes = faces
                .into_iter()
                .map(|f| to_face_box(f, source, frame))
                .collect::<Result<Vec<_>, _>>()?;
            face_sets.push(FrameFaceSet::new(boxes));
            ground_truth.push(x_crop);
        }

        Ok(VideoFeatures::new(source, face_sets, ground_truth))
    }
}

impl Default for JsonFeatureReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureSource for JsonFeatureReader {
    fn read(&self, path: &Path) -> Result<VideoFeatures, FeatureError> {
        let bytes = fs::read(path).map_err(|e| FeatureError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.parse(path, &bytes)
    }
}

fn to_face_box(record: FaceRecord, source: &Path, frame: usize) -> Result<FaceBox, FeatureError> {
    let invalid = |reason: String| FeatureError::InvalidBox {
        path: source.to_path_buf(),
        frame,
        reason,
    };

    if record.width < 0.0 || record.height < 0.0 {
        return Err(invalid(format!(
            "negative size {}x{}",
            record.width, record.height
        )));
    }
    if let Some(c) = record.confidence {
        if !(0.0..=1.0).contains(&c) {
            return Err(invalid(format!("confidence {c} outside [0, 1]")));
        }
    }

    Ok(FaceBox {
        x: record.x,
        y: record.y,
        width: record.width,
        height: record.height,
        confidence: record.confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    fn parse(json: &str) -> Result<VideoFeatures, FeatureError> {
        JsonFeatureReader::new().parse(Path::new("clip.json"), json.as_bytes())
    }

    #[test]
    fn test_labeled_frames() {
        let features = parse(
            r#"[
                {"faces": [{"x": 10, "y": 20, "width": 30, "height": 40}], "x_crop": 656},
                {"faces": [], "x_crop": 650}
            ]"#,
        )
        .unwrap();

        assert_eq!(features.len(), 2);
        assert_eq!(features.face_sets()[0].len(), 1);
        assert!(features.face_sets()[1].is_empty());
        assert_eq!(features.ground_truth().unwrap(), vec![656, 650]);

        let face = &features.face_sets()[0].faces()[0];
        assert_eq!(face.x, 10.0);
        assert_eq!(face.height, 40.0);
        assert_eq!(face.confidence, None);
    }

    #[test]
    fn test_bare_face_arrays() {
        let features = parse(r#"[[{"x": 0, "y": 0, "width": 100, "height": 100}], []]"#).unwrap();
        assert_eq!(features.len(), 2);
        assert!(features.ground_truth().is_err());
    }

    #[test]
    fn test_confidence_and_score_alias() {
        let features = parse(
            r#"[
                {"faces": [{"x": 0, "y": 0, "width": 1, "height": 1, "confidence": 0.7}]},
                {"faces": [{"x": 0, "y": 0, "width": 1, "height": 1, "score": 0.4}]}
            ]"#,
        )
        .unwrap();
        assert_eq!(features.face_sets()[0].faces()[0].confidence, Some(0.7));
        assert_eq!(features.face_sets()[1].faces()[0].confidence, Some(0.4));
    }

    #[test]
    fn test_unknown_face_fields_are_ignored() {
        let features = parse(
            r#"[{"faces": [{"x": 1, "y": 2, "width": 3, "height": 4, "landmarks": [[1, 2]], "track": 7}], "x_crop": 0}]"#,
        )
        .unwrap();
        assert_eq!(features.face_sets()[0].len(), 1);
    }

    #[rstest]
    #[case::labeled(r#"[{"faces": [{"x": 1, "width": 3, "height": 4}], "x_crop": 0}]"#)]
    #[case::bare(r#"[[{"x": 1, "width": 3, "height": 4}]]"#)]
    fn test_missing_coordinate_names_the_field(#[case] json: &str) {
        let err = parse(json).unwrap_err();
        assert!(matches!(err, FeatureError::Parse { .. }));
        assert!(err.to_string().contains("missing field `y`"), "{err}");
    }

    #[test]
    fn test_wrong_x_crop_type_names_the_problem() {
        let err = parse(r#"[{"faces": [], "x_crop": "656"}]"#).unwrap_err();
        assert!(err.to_string().contains("invalid type: string"), "{err}");
    }

    #[test]
    fn test_frame_of_wrong_shape_is_parse_error() {
        let err = parse("[42]").unwrap_err();
        assert!(err.to_string().contains("array of faces"), "{err}");
    }

    #[test]
    fn test_negative_size_rejected() {
        let err = parse(r#"[{"faces": [], "x_crop": 0}, {"faces": [{"x": 1, "y": 2, "width": -3, "height": 4}], "x_crop": 0}]"#)
            .unwrap_err();
        match err {
            FeatureError::InvalidBox { frame, .. } => assert_eq!(frame, 1),
            other => panic!("expected InvalidBox, got {other:?}"),
        }
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let err = parse(r#"[[{"x": 0, "y": 0, "width": 1, "height": 1, "confidence": 1.5}]]"#)
            .unwrap_err();
        assert!(matches!(err, FeatureError::InvalidBox { .. }));
    }

    #[test]
    fn test_not_an_array_is_parse_error() {
        let err = parse(r#"{"faces": []}"#).unwrap_err();
        assert!(matches!(err, FeatureError::Parse { .. }));
    }

    #[test]
    fn test_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"faces": [], "x_crop": 12}}]"#).unwrap();

        let features = JsonFeatureReader::new().read(file.path()).unwrap();
        assert_eq!(features.ground_truth().unwrap(), vec![12]);
        assert_eq!(features.source(), file.path());
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let err = JsonFeatureReader::new()
            .read(Path::new("/nonexistent/clip.json"))
            .unwrap_err();
        assert!(matches!(err, FeatureError::Io { .. }));
    }
}
