#[cfg(not(target_os = "linux"))]
compile_error!("hostpoll bridges Linux epoll/poll and only builds on Linux");

pub mod application;
pub mod common;
pub mod core;
