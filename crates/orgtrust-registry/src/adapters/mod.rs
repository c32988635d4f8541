//! Per-jurisdiction registry adapters.
//!
//! Each module owns one official registry's response shape and a `normalize`
//! function into the canonical [`orgtrust_core::RegistryRecord`]. Responses
//! are modelled as closed serde structs, so a schema change in a registry
//! surfaces as a deserialization error at the boundary rather than a silent
//! missing field downstream. Dispatch by country code lives in
//! [`crate::client::RegistryClient`].

pub mod dk;
pub mod gb;
pub mod no;
