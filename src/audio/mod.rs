//! Audio clips: sample arrays as a function of time.

pub(crate) mod clip;
pub(crate) mod composite;
pub(crate) mod file;
