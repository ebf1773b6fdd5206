//! Batch SNP lookup client for the Ensembl REST API.
//!
//! Flattens a cohort file (or a plain identifier list) into SNP ids, posts
//! one batched variation query, extracts a configurable subset of fields
//! from each decoded record, and writes tabular and overlap reports.

pub mod app;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod features;
pub mod input;
pub mod output;
pub mod report;
