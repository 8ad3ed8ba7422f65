//! The generator tools layered on the mining core. Each one renders its
//! output from the mined field model as a pure function of that model, then
//! writes through `emit::write_if_changed` so an unchanged result never
//! touches the destination file.

pub mod config;
pub mod descriptors;
pub mod ondestroy;
pub mod pipelines;
pub mod scene_json;
