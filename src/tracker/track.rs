//! Single target track with state space `(x, y, a, h)` and associated velocities.

use log::{debug, trace, warn};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::tracker::config::TrackConfig;
use crate::tracker::detection::Detection;
use crate::tracker::error::{Result, TrackError};
use crate::tracker::kalman_filter::MotionFilter;
use crate::tracker::kinematics::{self, Velocity};
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackState;

/// A single tracked object.
///
/// `(x, y)` is the center of the bounding box, `a` the aspect ratio and `h`
/// the height. Newly created tracks are `Tentative` until `n_init` hits have
/// been collected, then `Confirmed`. Tracks that are no longer alive are
/// `Deleted` and should be dropped by the owning tracker.
///
/// Per-detection metadata (`original_ltwh`, `det_conf`, `instance_mask`,
/// `others`) only describes the current cycle's match and is cleared by
/// [`Track::predict`]. `det_class` persists across misses.
#[derive(Debug, Clone)]
pub struct Track<X = ()> {
    track_id: u64,
    /// Filter state mean, `(x, y, a, h)` followed by velocities
    mean: Array1<f64>,
    covariance: Array2<f64>,
    /// Total number of measurement updates, construction included
    hits: u32,
    /// Total number of frames since first occurrence
    age: u32,
    /// Total number of frames since last measurement update
    time_since_update: u32,
    state: TrackState,
    features: Vec<Array1<f32>>,
    latest_feature: Option<Array1<f32>>,
    n_init: u32,
    max_age: u32,
    original_ltwh: Option<Rect>,
    det_class: Option<String>,
    det_conf: Option<f32>,
    instance_mask: Option<Array2<bool>>,
    others: Option<X>,
    trajectory: Vec<[f32; 2]>,
}

impl<X> Track<X> {
    /// Create a tentative track from an initial filter belief.
    ///
    /// The mean must hold at least the four box components and the
    /// covariance must be square with the mean's dimension.
    pub fn new(
        mean: Array1<f64>,
        covariance: Array2<f64>,
        track_id: u64,
        config: &TrackConfig,
    ) -> Result<Self> {
        config.validate()?;
        if mean.len() < 4 {
            return Err(TrackError::DimensionMismatch {
                what: "mean",
                expected: 4,
                got: mean.len(),
            });
        }
        let (rows, cols) = covariance.dim();
        if rows != mean.len() || cols != mean.len() {
            return Err(TrackError::DimensionMismatch {
                what: "covariance",
                expected: mean.len(),
                got: if rows != mean.len() { rows } else { cols },
            });
        }

        Ok(Self {
            track_id,
            mean,
            covariance,
            hits: 1,
            age: 1,
            time_since_update: 0,
            state: TrackState::Tentative,
            features: Vec::new(),
            latest_feature: None,
            n_init: config.n_init,
            max_age: config.max_age,
            original_ltwh: None,
            det_class: None,
            det_conf: None,
            instance_mask: None,
            others: None,
            trajectory: Vec::new(),
        })
    }

    /// Seed the feature cache with the originating detection's feature.
    pub fn with_feature(mut self, feature: Array1<f32>) -> Self {
        self.features = vec![feature.clone()];
        self.latest_feature = Some(feature);
        self
    }

    /// Record the originating detection box and start the trajectory at its center.
    pub fn with_original_ltwh(mut self, ltwh: Rect) -> Self {
        self.original_ltwh = Some(ltwh);
        self.trajectory = vec![ltwh.floor_center()];
        self
    }

    pub fn with_det_class(mut self, det_class: impl Into<String>) -> Self {
        self.det_class = Some(det_class.into());
        self
    }

    pub fn with_det_conf(mut self, det_conf: f32) -> Self {
        self.det_conf = Some(det_conf);
        self
    }

    pub fn with_instance_mask(mut self, instance_mask: Array2<bool>) -> Self {
        self.instance_mask = Some(instance_mask);
        self
    }

    pub fn with_others(mut self, others: X) -> Self {
        self.others = Some(others);
        self
    }

    pub fn track_id(&self) -> u64 {
        self.track_id
    }

    pub fn mean(&self) -> ArrayView1<'_, f64> {
        self.mean.view()
    }

    pub fn covariance(&self) -> ArrayView2<'_, f64> {
        self.covariance.view()
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn time_since_update(&self) -> u32 {
        self.time_since_update
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn n_init(&self) -> u32 {
        self.n_init
    }

    pub fn max_age(&self) -> u32 {
        self.max_age
    }

    /// Every feature received so far, oldest first.
    pub fn features(&self) -> &[Array1<f32>] {
        &self.features
    }

    /// Get current position in bounding box format `(left, top, width, height)`.
    ///
    /// By default the box is derived from the filter mean. With `orig` the
    /// box of the detection matched this cycle is returned instead; if there
    /// was no match, the filter box is used unless `orig_strict` is set, in
    /// which case `None` is returned.
    pub fn to_ltwh(&self, orig: bool, orig_strict: bool) -> Option<Rect> {
        if orig {
            match self.original_ltwh {
                Some(ltwh) => return Some(ltwh),
                None if orig_strict => return None,
                None => {}
            }
        }

        let (cx, cy, aspect, h) = (self.mean[0], self.mean[1], self.mean[2], self.mean[3]);
        let w = aspect * h;
        Some(Rect::new(
            (cx - w / 2.0) as f32,
            (cy - h / 2.0) as f32,
            w as f32,
            h as f32,
        ))
    }

    /// Get current position in bounding box format `(left, top, right, bottom)`.
    ///
    /// Same `orig`/`orig_strict` semantics as [`Track::to_ltwh`].
    pub fn to_ltrb(&self, orig: bool, orig_strict: bool) -> Option<[f32; 4]> {
        self.to_ltwh(orig, orig_strict).map(|ltwh| ltwh.to_ltrb())
    }

    /// Floor-division center of this cycle's matched detection box.
    pub fn to_center(&self) -> Option<[f32; 2]> {
        self.original_ltwh.map(|ltwh| ltwh.floor_center())
    }

    /// `None` if no detection was associated this cycle.
    pub fn get_det_conf(&self) -> Option<f32> {
        self.det_conf
    }

    /// Class of the last matched detection; kept across unmatched cycles.
    pub fn get_det_class(&self) -> Option<&str> {
        self.det_class.as_deref()
    }

    /// `None` if no detection was associated this cycle.
    pub fn get_instance_mask(&self) -> Option<&Array2<bool>> {
        self.instance_mask.as_ref()
    }

    /// Supplementary detector output; `None` if no detection was associated this cycle.
    pub fn get_det_supplementary(&self) -> Option<&X> {
        self.others.as_ref()
    }

    /// Latest appearance feature.
    pub fn get_feature(&self) -> Option<&Array1<f32>> {
        self.latest_feature.as_ref()
    }

    pub fn get_trajectory(&self) -> &[[f32; 2]] {
        &self.trajectory
    }

    /// Velocity of the trajectory, see [`velocity`](crate::tracker::velocity).
    pub fn velocity(&self, sampling_rate: f64) -> Option<Velocity> {
        kinematics::velocity(&self.trajectory, sampling_rate)
    }

    /// Slope between the first and last trajectory points.
    pub fn trajectory_slope(&self) -> Option<f64> {
        kinematics::trajectory_slope(&self.trajectory)
    }

    /// Propagate the state distribution to the current time step using the
    /// filter's prediction step.
    ///
    /// Must be called once per cycle before `update` or `mark_missed`.
    pub fn predict<F: MotionFilter + ?Sized>(&mut self, filter: &F) {
        let (mean, covariance) = filter.predict(&self.mean, &self.covariance);
        self.mean = mean;
        self.covariance = covariance;
        self.age += 1;
        self.time_since_update += 1;
        self.original_ltwh = None;
        self.det_conf = None;
        self.instance_mask = None;
        self.others = None;
        trace!(
            "track {} predicted: age={} time_since_update={}",
            self.track_id, self.age, self.time_since_update
        );
    }

    /// Mark this track as missed (no association at the current time step).
    pub fn mark_missed(&mut self) {
        if self.state == TrackState::Tentative || self.time_since_update > self.max_age {
            self.transition_to(TrackState::Deleted);
        }
    }

    pub fn is_tentative(&self) -> bool {
        self.state == TrackState::Tentative
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == TrackState::Confirmed
    }

    /// Whether this track is dead and should be removed by its tracker.
    pub fn is_deleted(&self) -> bool {
        self.state == TrackState::Deleted
    }

    fn transition_to(&mut self, next: TrackState) {
        if !self.state.can_transition_to(next) {
            return;
        }
        debug!(
            "track {} {:?} -> {:?}: hits={} age={} time_since_update={}",
            self.track_id, self.state, next, self.hits, self.age, self.time_since_update
        );
        self.state = next;
    }
}

impl<X: Clone> Track<X> {
    /// Create a tentative track from an unassociated detection.
    pub fn from_detection<F: MotionFilter + ?Sized>(
        filter: &F,
        track_id: u64,
        config: &TrackConfig,
        detection: &Detection<X>,
    ) -> Result<Self> {
        let (mean, covariance) = filter.initiate(detection.to_xyah());
        let mut track = Self::new(mean, covariance, track_id, config)?
            .with_original_ltwh(detection.get_ltwh());
        if let Some(feature) = &detection.feature {
            track = track.with_feature(feature.clone());
        }
        track.det_class = detection.class_name.clone();
        track.det_conf = detection.confidence;
        track.instance_mask = detection.instance_mask.clone();
        track.others = detection.others.clone();
        Ok(track)
    }

    /// Perform the filter measurement update and record the matched detection.
    ///
    /// A detection without a feature leaves the feature cache untouched while
    /// still counting as a hit. On error the track is left unchanged.
    pub fn update<F: MotionFilter + ?Sized>(
        &mut self,
        filter: &F,
        detection: &Detection<X>,
    ) -> Result<()> {
        if let (Some(latest), Some(feature)) = (&self.latest_feature, &detection.feature) {
            if latest.len() != feature.len() {
                return Err(TrackError::DimensionMismatch {
                    what: "feature",
                    expected: latest.len(),
                    got: feature.len(),
                });
            }
        }

        let (mean, covariance) =
            match filter.update(&self.mean, &self.covariance, detection.to_xyah()) {
                Ok(belief) => belief,
                Err(err) => {
                    warn!("track {} measurement update failed: {}", self.track_id, err);
                    return Err(err);
                }
            };

        let ltwh = detection.get_ltwh();
        self.original_ltwh = Some(ltwh);
        self.mean = mean;
        self.covariance = covariance;
        if let Some(feature) = &detection.feature {
            self.features.push(feature.clone());
            self.latest_feature = Some(feature.clone());
        }
        self.det_conf = detection.confidence;
        self.det_class = detection.class_name.clone();
        self.instance_mask = detection.instance_mask.clone();
        self.others = detection.others.clone();
        self.trajectory.push(ltwh.floor_center());

        self.hits += 1;
        self.time_since_update = 0;
        trace!(
            "track {} updated: hits={} age={}",
            self.track_id, self.hits, self.age
        );

        if self.state == TrackState::Tentative && self.hits >= self.n_init {
            self.transition_to(TrackState::Confirmed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::kalman_filter::KalmanFilter;
    use ndarray::array;

    /// Filter that snaps the mean onto each measurement.
    struct SnapFilter;

    impl MotionFilter for SnapFilter {
        fn initiate(&self, measurement: [f64; 4]) -> (Array1<f64>, Array2<f64>) {
            let mut mean = Array1::zeros(8);
            for i in 0..4 {
                mean[i] = measurement[i];
            }
            (mean, Array2::eye(8))
        }

        fn predict(
            &self,
            mean: &Array1<f64>,
            covariance: &Array2<f64>,
        ) -> (Array1<f64>, Array2<f64>) {
            (mean.clone(), covariance.clone())
        }

        fn update(
            &self,
            mean: &Array1<f64>,
            covariance: &Array2<f64>,
            measurement: [f64; 4],
        ) -> Result<(Array1<f64>, Array2<f64>)> {
            let mut mean = mean.clone();
            for i in 0..4 {
                mean[i] = measurement[i];
            }
            Ok((mean, covariance.clone()))
        }
    }

    struct FailingFilter;

    impl MotionFilter for FailingFilter {
        fn initiate(&self, measurement: [f64; 4]) -> (Array1<f64>, Array2<f64>) {
            SnapFilter.initiate(measurement)
        }

        fn predict(
            &self,
            mean: &Array1<f64>,
            covariance: &Array2<f64>,
        ) -> (Array1<f64>, Array2<f64>) {
            SnapFilter.predict(mean, covariance)
        }

        fn update(
            &self,
            _mean: &Array1<f64>,
            _covariance: &Array2<f64>,
            _measurement: [f64; 4],
        ) -> Result<(Array1<f64>, Array2<f64>)> {
            Err(TrackError::SingularCovariance)
        }
    }

    fn bare_track(config: &TrackConfig) -> Track {
        let (mean, cov) = SnapFilter.initiate([50.0, 40.0, 0.5, 20.0]);
        Track::new(mean, cov, 7, config).unwrap()
    }

    fn detection(x: f32, y: f32) -> Detection {
        let mut det = Detection::new(Rect::new(x, y, 10.0, 20.0), 0.9);
        det.class_name = Some("person".to_string());
        det.feature = Some(array![1.0, 0.0, 0.0]);
        det
    }

    #[test]
    fn test_new_track_defaults() {
        let track = bare_track(&TrackConfig::default());
        assert_eq!(track.track_id(), 7);
        assert_eq!(track.state(), TrackState::Tentative);
        assert_eq!(track.hits(), 1);
        assert_eq!(track.age(), 1);
        assert_eq!(track.time_since_update(), 0);
        assert!(track.features().is_empty());
        assert!(track.get_feature().is_none());
        assert!(track.get_trajectory().is_empty());
        assert!(track.to_center().is_none());
    }

    #[test]
    fn test_new_rejects_bad_shapes() {
        let config = TrackConfig::default();
        let short = Track::<()>::new(Array1::zeros(3), Array2::eye(3), 1, &config);
        assert!(matches!(
            short,
            Err(TrackError::DimensionMismatch { what: "mean", .. })
        ));

        let mismatched = Track::<()>::new(Array1::zeros(8), Array2::eye(4), 1, &config);
        assert!(matches!(
            mismatched,
            Err(TrackError::DimensionMismatch {
                what: "covariance",
                expected: 8,
                got: 4
            })
        ));

        let zero_n_init = TrackConfig::new(0, 1);
        let bad_config = Track::<()>::new(Array1::zeros(8), Array2::eye(8), 1, &zero_n_init);
        assert!(matches!(bad_config, Err(TrackError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_detection_seeds_everything() {
        let det = Detection {
            ltwh: Rect::new(45.0, 30.0, 10.0, 20.0),
            confidence: Some(0.9),
            class_name: Some("person".to_string()),
            feature: Some(array![1.0, 0.0, 0.0]),
            instance_mask: Some(Array2::from_elem((2, 2), true)),
            others: Some("extra"),
        };

        let track = Track::from_detection(&KalmanFilter::new(), 3, &TrackConfig::default(), &det)
            .unwrap();
        assert_eq!(track.features().len(), 1);
        assert_eq!(track.get_feature(), Some(&array![1.0, 0.0, 0.0]));
        assert_eq!(track.get_det_class(), Some("person"));
        assert_eq!(track.get_det_conf(), Some(0.9));
        assert!(track.get_instance_mask().is_some());
        assert_eq!(track.get_det_supplementary(), Some(&"extra"));
        assert_eq!(track.get_trajectory(), &[[50.0, 40.0]]);
        assert_eq!(track.to_ltwh(true, true), Some(Rect::new(45.0, 30.0, 10.0, 20.0)));
        assert_eq!(track.to_ltwh(false, false), Some(Rect::new(45.0, 30.0, 10.0, 20.0)));
    }

    #[test]
    fn test_with_original_ltwh_seeds_trajectory() {
        let track = bare_track(&TrackConfig::default())
            .with_original_ltwh(Rect::new(0.0, 0.0, 5.0, 5.0))
            .with_det_class("car")
            .with_det_conf(0.5);
        assert_eq!(track.get_trajectory(), &[[2.0, 2.0]]);
        assert_eq!(track.to_center(), Some([2.0, 2.0]));
        assert_eq!(track.get_det_class(), Some("car"));
        assert_eq!(track.get_det_conf(), Some(0.5));
    }

    #[test]
    fn test_ltwh_from_mean() {
        let track = bare_track(&TrackConfig::default());
        // w = a * h = 10, top-left = center - half size
        assert_eq!(track.to_ltwh(false, false), Some(Rect::new(45.0, 30.0, 10.0, 20.0)));
        assert_eq!(track.to_ltrb(false, false), Some([45.0, 30.0, 55.0, 50.0]));
    }

    #[test]
    fn test_orig_falls_back_unless_strict() {
        let track = bare_track(&TrackConfig::default());
        assert_eq!(track.to_ltwh(true, false), track.to_ltwh(false, false));
        assert_eq!(track.to_ltwh(true, true), None);
        assert_eq!(track.to_ltrb(true, true), None);
    }

    #[test]
    fn test_orig_returns_matched_box() {
        let mut track = bare_track(&TrackConfig::default());
        let filter = KalmanFilter::new();
        track.predict(&filter);
        track.update(&filter, &detection(60.0, 30.0)).unwrap();

        assert_eq!(track.to_ltwh(true, true), Some(Rect::new(60.0, 30.0, 10.0, 20.0)));
        assert_eq!(track.to_ltrb(true, false), Some([60.0, 30.0, 70.0, 50.0]));
        // The smoothed estimate lies between prior and measurement.
        let smoothed = track.to_ltwh(false, false).unwrap();
        assert!(smoothed.x > 45.0 && smoothed.x < 60.0);
    }

    #[test]
    fn test_ltrb_round_trip() {
        let mut track = bare_track(&TrackConfig::default());
        for orig in [false, true] {
            let ltwh = track.to_ltwh(orig, false).unwrap();
            let [l, t, r, b] = track.to_ltrb(orig, false).unwrap();
            assert_eq!(Rect::from_ltrb(l, t, r, b), ltwh);
            track.update(&SnapFilter, &detection(12.0, 8.0)).unwrap();
        }
    }

    #[test]
    fn test_predict_clears_cycle_metadata() {
        let mut track = bare_track(&TrackConfig::default());
        let mut det = detection(45.0, 30.0);
        det.confidence = Some(0.7);
        det.instance_mask = Some(Array2::from_elem((4, 4), false));
        track.update(&SnapFilter, &det).unwrap();
        assert_eq!(track.get_det_conf(), Some(0.7));
        assert!(track.get_instance_mask().is_some());

        track.predict(&SnapFilter);
        assert_eq!(track.age(), 2);
        assert_eq!(track.time_since_update(), 1);
        assert!(track.get_det_conf().is_none());
        assert!(track.get_instance_mask().is_none());
        assert!(track.get_det_supplementary().is_none());
        assert!(track.to_ltwh(true, true).is_none());
        assert!(track.to_center().is_none());
        // Sticky and historical fields survive.
        assert_eq!(track.get_det_class(), Some("person"));
        assert_eq!(track.hits(), 2);
        assert_eq!(track.features().len(), 1);
        assert_eq!(track.get_trajectory().len(), 1);
    }

    #[test]
    fn test_update_without_feature_keeps_cache() {
        let mut track = bare_track(&TrackConfig::default());
        track.update(&SnapFilter, &detection(0.0, 0.0)).unwrap();

        let mut det = detection(2.0, 0.0);
        det.feature = None;
        track.update(&SnapFilter, &det).unwrap();

        assert_eq!(track.hits(), 3);
        assert_eq!(track.features().len(), 1);
        assert_eq!(track.get_feature(), Some(&array![1.0, 0.0, 0.0]));
        assert_eq!(track.get_trajectory().len(), 2);
    }

    #[test]
    fn test_update_rejects_feature_dimension_change() {
        let mut track = bare_track(&TrackConfig::default());
        track.update(&SnapFilter, &detection(0.0, 0.0)).unwrap();

        let mut det = detection(2.0, 0.0);
        det.feature = Some(array![1.0, 0.0]);
        let err = track.update(&SnapFilter, &det).unwrap_err();
        assert_eq!(
            err,
            TrackError::DimensionMismatch {
                what: "feature",
                expected: 3,
                got: 2
            }
        );
        assert_eq!(track.hits(), 2);
        assert_eq!(track.get_trajectory().len(), 1);
    }

    #[test]
    fn test_failed_filter_update_leaves_track_unchanged() {
        let mut track = bare_track(&TrackConfig::new(2, 3));
        track.predict(&FailingFilter);
        let mean_before = track.mean().to_owned();

        let result = track.update(&FailingFilter, &detection(0.0, 0.0));
        assert_eq!(result, Err(TrackError::SingularCovariance));
        assert_eq!(track.mean(), mean_before);
        assert_eq!(track.hits(), 1);
        assert_eq!(track.time_since_update(), 1);
        assert!(track.is_tentative());
        assert!(track.features().is_empty());
        assert!(track.get_trajectory().is_empty());
        assert!(track.to_ltwh(true, true).is_none());
    }

    #[test]
    fn test_confirmation_exactly_at_n_init() {
        let mut track = bare_track(&TrackConfig::new(3, 5));
        track.predict(&SnapFilter);
        track.update(&SnapFilter, &detection(0.0, 0.0)).unwrap();
        assert_eq!(track.hits(), 2);
        assert!(track.is_tentative());

        track.predict(&SnapFilter);
        track.update(&SnapFilter, &detection(1.0, 0.0)).unwrap();
        assert_eq!(track.hits(), 3);
        assert!(track.is_confirmed());
    }

    #[test]
    fn test_n_init_one_confirms_on_first_update() {
        let mut track = bare_track(&TrackConfig::new(1, 5));
        assert!(track.is_tentative());
        track.update(&SnapFilter, &detection(0.0, 0.0)).unwrap();
        assert!(track.is_confirmed());
    }

    #[test]
    fn test_tentative_miss_deletes() {
        let mut track = bare_track(&TrackConfig::new(3, 100));
        track.predict(&SnapFilter);
        track.mark_missed();
        assert!(track.is_deleted());
    }

    #[test]
    fn test_confirmed_survives_until_max_age() {
        let mut track = bare_track(&TrackConfig::new(2, 2));
        track.update(&SnapFilter, &detection(0.0, 0.0)).unwrap();
        assert!(track.is_confirmed());

        for expected_tsu in 1..=2 {
            track.predict(&SnapFilter);
            track.mark_missed();
            assert_eq!(track.time_since_update(), expected_tsu);
            assert!(track.is_confirmed());
        }
        track.predict(&SnapFilter);
        track.mark_missed();
        assert!(track.is_deleted());
    }

    #[test]
    fn test_deleted_is_absorbing() {
        let mut track = bare_track(&TrackConfig::new(2, 2));
        track.mark_missed();
        assert!(track.is_deleted());

        for _ in 0..3 {
            track.predict(&SnapFilter);
            track.update(&SnapFilter, &detection(0.0, 0.0)).unwrap();
            track.mark_missed();
            assert!(track.is_deleted());
        }
    }

    #[test]
    fn test_velocity_and_slope_follow_trajectory() {
        let mut track = bare_track(&TrackConfig::default());
        assert!(track.velocity(kinematics::DEFAULT_SAMPLING_RATE).is_none());
        assert!(track.trajectory_slope().is_none());

        track.update(&SnapFilter, &detection(0.0, 0.0)).unwrap();
        assert!(track.velocity(kinematics::DEFAULT_SAMPLING_RATE).is_none());

        track.update(&SnapFilter, &detection(3.0, 6.0)).unwrap();
        let v = track.velocity(1.0).unwrap();
        assert_eq!(v.magnitudes.dim(), (1, 1));
        assert!((v.average - 45f64.sqrt()).abs() < 1e-9);
        assert!((track.trajectory_slope().unwrap() - 2.0).abs() < 1e-6);
    }
}
