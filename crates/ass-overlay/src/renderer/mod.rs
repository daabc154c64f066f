//! Renderer ownership: background warm-up, blocking access and host waits

pub mod host;
pub mod lifecycle;
pub mod worker;

pub use host::{HeadlessHost, ProgressSink, WaitHost};
pub use lifecycle::{LifecycleState, RendererLifecycle};
pub use worker::WarmupQueue;
