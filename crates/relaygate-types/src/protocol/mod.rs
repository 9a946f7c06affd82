//! Upstream v1internal wire shapes.
//!
//! Downstream dialect models live with their mappers in `relaygate-core`;
//! this module only holds what every dialect converges on.

pub mod gemini;

pub use gemini::{GenerateRequest, UpstreamEnvelope, UpstreamUsageMetadata};
