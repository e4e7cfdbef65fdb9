//! Detection consumed by [`Track`](crate::tracker::Track) updates.

use ndarray::{Array1, Array2};

use crate::tracker::rect::Rect;

/// A single detector output matched to a track.
///
/// `X` carries free-form supplementary data from the detector and is handed
/// through to the track untouched.
#[derive(Debug, Clone)]
pub struct Detection<X = ()> {
    /// Raw bounding box in LTWH format, in the detector's coordinate frame
    pub ltwh: Rect,
    /// Detection confidence score
    pub confidence: Option<f32>,
    /// Class label reported by the detector
    pub class_name: Option<String>,
    /// Appearance feature vector
    pub feature: Option<Array1<f32>>,
    /// Instance segmentation mask
    pub instance_mask: Option<Array2<bool>>,
    /// Supplementary detector output
    pub others: Option<X>,
}

impl<X> Detection<X> {
    pub fn new(ltwh: Rect, confidence: f32) -> Self {
        Self {
            ltwh,
            confidence: Some(confidence),
            class_name: None,
            feature: None,
            instance_mask: None,
            others: None,
        }
    }

    #[inline]
    pub fn get_ltwh(&self) -> Rect {
        self.ltwh
    }

    #[inline]
    pub fn to_ltrb(&self) -> [f32; 4] {
        self.ltwh.to_ltrb()
    }

    /// Box in the measurement space of the motion filter.
    #[inline]
    pub fn to_xyah(&self) -> [f64; 4] {
        self.ltwh.to_xyah().map(f64::from)
    }
}
