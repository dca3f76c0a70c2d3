//! HTTP route handlers

pub mod analyze;
pub mod entries;
pub mod exam;
pub mod import;
