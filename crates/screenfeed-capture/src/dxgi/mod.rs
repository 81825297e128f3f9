//! DXGI Desktop Duplication backend.

pub mod device;
pub mod display;
pub mod duplication;
pub mod producer;
