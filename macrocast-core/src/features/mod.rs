//! Feature preprocessing

pub mod scale;

pub use scale::{FeatureScaler, FittedScaler, ScaledMatrix, ScalingMode};
