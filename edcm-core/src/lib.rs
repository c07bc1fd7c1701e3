#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod detector;
pub mod entities;
pub mod events;
pub mod handlers;
pub mod optimizer;
pub mod processors;
pub mod stores;
