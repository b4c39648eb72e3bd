//! Sunrise and sunset tables, plus a weather and river-level dashboard for
//! Hattem, served over HTTP with time-boxed caches in front of each
//! upstream provider.

pub mod cache;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod http;
pub mod location;
pub mod metrics;
pub mod server;
pub mod snapshot;
pub mod solar;
pub mod sun_times;
pub mod water;
pub mod weather;
