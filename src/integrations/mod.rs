// src/integrations/mod.rs
//
// External Integrations Module

pub mod metadata_api;

pub use metadata_api::MetadataApiClient;
