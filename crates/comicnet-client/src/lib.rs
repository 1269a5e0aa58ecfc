//! Client side of the classification service.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{ClassifierClient, ClientError};
