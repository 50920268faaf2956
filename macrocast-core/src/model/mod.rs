//! Temporal split, least-squares fit and coefficient attribution

pub mod attribution;
pub mod ols;
pub mod split;

pub use attribution::{rank_coefficients, FeatureWeight, RankingOrder};
pub use ols::{fit_ols, LinearModel, SingularPolicy};
pub use split::{temporal_split, SplitResult};
