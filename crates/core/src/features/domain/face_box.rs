/// A detected face in pixel space, as supplied by the upstream detector.
///
/// Boxes may extend past the frame edges; consumers clamp as needed.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub confidence: Option<f64>,
}

impl FaceBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// All faces detected in a single frame. Empty when nothing was detected.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameFaceSet {
    faces: Vec<FaceBox>,
}

impl FrameFaceSet {
    pub fn new(faces: Vec<FaceBox>) -> Self {
        Self { faces }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn faces(&self) -> &[FaceBox] {
        &self.faces
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Horizontal extent `(left, right)` of the union of all boxes.
    pub fn horizontal_span(&self) -> Option<(f64, f64)> {
        let first = self.faces.first()?;
        let init = (first.x, first.right());
        Some(
            self.faces
                .iter()
                .skip(1)
                .fold(init, |(l, r), f| (l.min(f.x), r.max(f.right()))),
        )
    }
}

impl From<Vec<FaceBox>> for FrameFaceSet {
    fn from(faces: Vec<FaceBox>) -> Self {
        Self::new(faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_center_x() {
        let f = FaceBox::new(0.0, 10.0, 100.0, 80.0);
        assert_relative_eq!(f.center_x(), 50.0);
    }

    #[test]
    fn test_area() {
        let f = FaceBox::new(5.0, 5.0, 10.0, 20.0);
        assert_relative_eq!(f.area(), 200.0);
    }

    #[test]
    fn test_with_confidence() {
        let f = FaceBox::new(0.0, 0.0, 1.0, 1.0).with_confidence(0.9);
        assert_eq!(f.confidence, Some(0.9));
    }

    #[test]
    fn test_empty_set_has_no_span() {
        assert!(FrameFaceSet::empty().horizontal_span().is_none());
        assert!(FrameFaceSet::empty().is_empty());
    }

    #[test]
    fn test_span_covers_all_faces() {
        let set = FrameFaceSet::new(vec![
            FaceBox::new(300.0, 0.0, 50.0, 50.0),
            FaceBox::new(100.0, 0.0, 20.0, 20.0),
            FaceBox::new(900.0, 0.0, 60.0, 60.0),
        ]);
        let (l, r) = set.horizontal_span().unwrap();
        assert_relative_eq!(l, 100.0);
        assert_relative_eq!(r, 960.0);
        assert_eq!(set.len(), 3);
    }
}
