use crate::features::feature_vector::FeatureVector;
use crate::features::keypoint_layout::{
    FallbackFeatures, LandmarkFrame, fallback_features, pack_keypoints, verify_features,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Mutex;
use tracing::warn;

/// Defines a trait that all per-frame feature extractors must follow.
///
/// The extractor never fails: when detection fails it returns its fallback vector, and the rest
/// of the pipeline treats that vector like any other.
pub trait FeatureExtractor<F> {
    fn extract(&self, frame: &F) -> FeatureVector;
}

/// Turns already-detected landmark frames into keypoint feature vectors.
///
/// Frames are `Option<LandmarkFrame>`; `None` marks a frame where the landmark detector found
/// nothing, and produces the configured fallback vector.
pub struct KeypointFeatureExtractor {
    feature_width: usize,
    fallback: FallbackFeatures,
    rng: Mutex<StdRng>,
}

impl KeypointFeatureExtractor {
    pub fn new(feature_width: usize, fallback: FallbackFeatures) -> Self {
        KeypointFeatureExtractor {
            feature_width,
            fallback,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Same as `new`, with a fixed seed for the synthetic fallback.
    #[cfg(test)]
    pub fn with_seed(feature_width: usize, fallback: FallbackFeatures, seed: u64) -> Self {
        KeypointFeatureExtractor {
            feature_width,
            fallback,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn feature_width(&self) -> usize {
        self.feature_width
    }
}

impl FeatureExtractor<Option<LandmarkFrame>> for KeypointFeatureExtractor {
    fn extract(&self, frame: &Option<LandmarkFrame>) -> FeatureVector {
        match frame {
            Some(frame) => {
                let packed = pack_keypoints(frame).fitted(self.feature_width);
                verify_features(&packed, self.feature_width);
                packed
            }
            None => {
                warn!(mode = ?self.fallback, "no landmarks detected, using fallback features");
                let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
                fallback_features(self.fallback, self.feature_width, &mut *rng)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::keypoint_layout::{KEYPOINT_FEATURES, Landmark};

    #[test]
    fn detected_frame_is_fitted_to_model_width() {
        let extractor = KeypointFeatureExtractor::with_seed(1662, FallbackFeatures::Zeros, 1);
        let frame = LandmarkFrame {
            right_hand: Some(vec![Landmark {
                x: 0.5,
                y: 0.5,
                z: 0.0,
                visibility: None,
            }]),
            ..Default::default()
        };
        let v = extractor.extract(&Some(frame));
        assert_eq!(v.len(), 1662);
    }

    #[test]
    fn missing_frame_uses_zero_fallback() {
        let extractor =
            KeypointFeatureExtractor::with_seed(KEYPOINT_FEATURES, FallbackFeatures::Zeros, 1);
        assert_eq!(extractor.extract(&None), FeatureVector::zeros(KEYPOINT_FEATURES));
    }

    #[test]
    fn seeded_synthetic_fallback_is_reproducible() {
        let a = KeypointFeatureExtractor::with_seed(226, FallbackFeatures::Synthetic, 42);
        let b = KeypointFeatureExtractor::with_seed(226, FallbackFeatures::Synthetic, 42);
        assert_eq!(a.extract(&None), b.extract(&None));
    }
}
