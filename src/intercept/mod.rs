//! Intercept Module
//!
//! Cache-first and network-first request handling with typed offline fallbacks.

pub mod fallback;
mod interceptor;

pub use interceptor::{Interceptor, PrecacheReport};
