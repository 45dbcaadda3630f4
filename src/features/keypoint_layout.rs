use crate::features::feature_vector::FeatureVector;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Pose landmarks kept in the feature vector, in order. Wrists (15, 16) and the pose model's
/// finger points (17-22) are left out since the hands are captured separately.
pub const POSE_LANDMARKS_TO_KEEP: [usize; 25] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32,
];

pub const HAND_LANDMARK_COUNT: usize = 21;

/// x, y, z, visibility for each kept pose landmark.
pub const POSE_FEATURES: usize = POSE_LANDMARKS_TO_KEEP.len() * 4;

/// x, y, z for each hand landmark.
pub const HAND_FEATURES: usize = HAND_LANDMARK_COUNT * 3;

/// Width of a keypoint feature vector: 100 pose + 63 left hand + 63 right hand.
pub const KEYPOINT_FEATURES: usize = POSE_FEATURES + 2 * HAND_FEATURES;

/// A single detected landmark in normalized image coordinates.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    /// Only pose landmarks carry visibility; hands leave it unset.
    #[serde(default)]
    pub visibility: Option<f32>,
}

/// The landmarks detected in one frame. Any part may be missing.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct LandmarkFrame {
    #[serde(default)]
    pub pose: Option<Vec<Landmark>>,
    #[serde(default)]
    pub left_hand: Option<Vec<Landmark>>,
    #[serde(default)]
    pub right_hand: Option<Vec<Landmark>>,
}

/// What to produce for a frame where detection failed entirely.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackFeatures {
    #[default]
    Zeros,
    /// Random values in plausible landmark ranges around the center of the frame.
    Synthetic,
}

/// Packs a landmark frame into the 226-wide keypoint layout.
///
/// Missing pose or hands become zeros; hands with fewer than 21 points are zero-padded.
pub fn pack_keypoints(frame: &LandmarkFrame) -> FeatureVector {
    let mut features: Vec<f32> = Vec::with_capacity(KEYPOINT_FEATURES);

    match &frame.pose {
        Some(pose) => {
            for &idx in POSE_LANDMARKS_TO_KEEP.iter() {
                match pose.get(idx) {
                    Some(lm) => features.extend_from_slice(&[
                        lm.x,
                        lm.y,
                        lm.z,
                        lm.visibility.unwrap_or(1.0),
                    ]),
                    None => features.extend_from_slice(&[0.0; 4]),
                }
            }
        }
        None => {
            debug!("no pose landmarks, using zeros");
            features.resize(POSE_FEATURES, 0.0);
        }
    }

    push_hand(&mut features, frame.left_hand.as_deref());
    push_hand(&mut features, frame.right_hand.as_deref());

    debug_assert_eq!(features.len(), KEYPOINT_FEATURES);
    FeatureVector::new(features)
}

fn push_hand(features: &mut Vec<f32>, hand: Option<&[Landmark]>) {
    let start = features.len();
    if let Some(hand) = hand {
        for lm in hand.iter().take(HAND_LANDMARK_COUNT) {
            features.extend_from_slice(&[lm.x, lm.y, lm.z]);
        }
    }
    features.resize(start + HAND_FEATURES, 0.0);
}

/// Builds the vector used when detection failed. The layout is the keypoint layout fitted to
/// `width`, so a 1662-wide model still receives a vector of its own width.
pub fn fallback_features<R: Rng>(
    mode: FallbackFeatures,
    width: usize,
    rng: &mut R,
) -> FeatureVector {
    match mode {
        FallbackFeatures::Zeros => FeatureVector::zeros(width),
        FallbackFeatures::Synthetic => {
            let mut features: Vec<f32> = Vec::with_capacity(KEYPOINT_FEATURES);
            for _ in 0..POSE_LANDMARKS_TO_KEEP.len() {
                features.push(rng.gen_range(0.4..0.6));
                features.push(rng.gen_range(0.3..0.7));
                features.push(rng.gen_range(-0.05..0.05));
                features.push(rng.gen_range(0.8..1.0));
            }
            for center_x in [0.4_f32, 0.6_f32] {
                for _ in 0..HAND_LANDMARK_COUNT {
                    features.push(rng.gen_range(center_x - 0.1..center_x + 0.1));
                    features.push(rng.gen_range(0.4..0.6));
                    features.push(rng.gen_range(-0.05..0.05));
                }
            }
            FeatureVector::new(features).fitted(width)
        }
    }
}

/// Summary statistics over a feature vector, logged when checking extraction quality.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureStats {
    pub len: usize,
    pub min: f32,
    pub max: f32,
    pub non_zero: usize,
}

impl FeatureStats {
    pub fn of(vector: &FeatureVector) -> Self {
        let values = vector.as_slice();
        let (min, max) = values
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        FeatureStats {
            len: vector.len(),
            min: if values.is_empty() { 0.0 } else { min },
            max: if values.is_empty() { 0.0 } else { max },
            non_zero: values.iter().filter(|v| **v != 0.0).count(),
        }
    }

    pub fn non_zero_fraction(&self) -> f32 {
        if self.len == 0 {
            return 0.0;
        }
        self.non_zero as f32 / self.len as f32
    }

    /// Fewer than a tenth of the values set usually means detection found almost nothing.
    pub fn is_sparse(&self) -> bool {
        self.non_zero_fraction() < 0.1
    }
}

/// Logs the extraction quality of a vector against the width the model expects.
pub fn verify_features(vector: &FeatureVector, expected_width: usize) -> FeatureStats {
    let stats = FeatureStats::of(vector);
    if stats.len != expected_width {
        warn!(got = stats.len, expected = expected_width, "feature count mismatch");
    }
    debug!(
        min = stats.min,
        max = stats.max,
        non_zero = stats.non_zero,
        len = stats.len,
        "feature range"
    );
    if stats.is_sparse() {
        warn!(
            non_zero = stats.non_zero,
            len = stats.len,
            "very few non-zero features, check landmark detection quality"
        );
    }
    stats
}
