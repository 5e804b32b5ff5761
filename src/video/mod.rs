//! Video clips, positioning and compositing.

pub(crate) mod blit;
pub(crate) mod clip;
pub(crate) mod composite;
pub(crate) mod concatenate;
pub(crate) mod file;
pub(crate) mod position;
