pub mod limiters;
pub mod token_estimator;
