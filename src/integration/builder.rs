//! Builder for creating Detection objects from various input formats.

use ndarray::{Array1, Array2};

use crate::tracker::{Detection, Rect};

/// Builder for creating `Detection` objects from various input formats.
///
/// Supplementary data defaults to `()`; call [`DetectionBuilder::others`] to
/// attach a payload of any type.
#[derive(Debug, Clone)]
pub struct DetectionBuilder<X = ()> {
    ltwh: Rect,
    confidence: Option<f32>,
    class_name: Option<String>,
    feature: Option<Array1<f32>>,
    instance_mask: Option<Array2<bool>>,
    others: Option<X>,
}

impl Default for DetectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self {
            ltwh: Rect::default(),
            confidence: None,
            class_name: None,
            feature: None,
            instance_mask: None,
            others: None,
        }
    }
}

impl<X> DetectionBuilder<X> {
    /// Set bounding box in LTWH format (left, top, width, height).
    pub fn ltwh(mut self, left: f32, top: f32, w: f32, h: f32) -> Self {
        self.ltwh = Rect::new(left, top, w, h);
        self
    }

    /// Set bounding box in LTRB format (x1, y1, x2, y2).
    pub fn ltrb(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.ltwh = Rect::from_ltrb(x1, y1, x2, y2);
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.ltwh = Rect::new(cx - w / 2.0, cy - h / 2.0, w, h);
        self
    }

    /// Set the confidence score.
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Set the appearance feature vector.
    pub fn feature(mut self, feature: Array1<f32>) -> Self {
        self.feature = Some(feature);
        self
    }

    pub fn instance_mask(mut self, mask: Array2<bool>) -> Self {
        self.instance_mask = Some(mask);
        self
    }

    /// Attach supplementary detector output, changing the payload type.
    pub fn others<Y>(self, others: Y) -> DetectionBuilder<Y> {
        DetectionBuilder {
            ltwh: self.ltwh,
            confidence: self.confidence,
            class_name: self.class_name,
            feature: self.feature,
            instance_mask: self.instance_mask,
            others: Some(others),
        }
    }

    /// Build the final `Detection`.
    pub fn build(self) -> Detection<X> {
        Detection {
            ltwh: self.ltwh,
            confidence: self.confidence,
            class_name: self.class_name,
            feature: self.feature,
            instance_mask: self.instance_mask,
            others: self.others,
        }
    }
}
