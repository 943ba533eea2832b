//! Sampling with repair: raw sampling, structural fixes and resampling.

pub mod fix;
pub mod sampler;

pub use fix::apply_fix;
pub use sampler::{ResampleOptions, Resampled, resample_invalid, sample_with_fix};
