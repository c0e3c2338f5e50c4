//! Fetch Module
//!
//! Request/response values, the network boundary and connectivity tracking.

mod connectivity;
mod message;
mod network;

pub use connectivity::{Connectivity, LinkState, LinkStatus};
pub use message::{normalize_url, parse_url, FetchRequest, FetchResponse, ResponseSource};
pub use network::{HttpNetwork, Network, NetworkError};
