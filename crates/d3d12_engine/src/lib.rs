pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod renderer;
pub mod rhi;
pub mod timer;

#[cfg(windows)]
pub mod app;
#[cfg(windows)]
pub mod window;
