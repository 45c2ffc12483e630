//! Typed operations, one module per service

pub mod av_transport;
pub mod rendering_control;
