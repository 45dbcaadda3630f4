pub mod feature_extractor;
pub mod feature_vector;
pub mod keypoint_layout;
