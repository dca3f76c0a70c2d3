//! Business logic services

pub mod gateway;
pub mod importer;
pub mod prompts;
