#![doc = "shorts-uploader-core: core logic library for shorts-uploader."]

//! This crate contains everything an upload run does that does not need a
//! network client: the clip filename format, sidecar loading, enumeration,
//! the upload-and-upsert loop and its report.
//!
//! # Usage
//! The CLI crate supplies concrete [`contract::ObjectStore`] and
//! [`contract::VideoRepository`] implementations and calls
//! [`pipeline::run_upload`].

pub mod clip;
pub mod config;
pub mod contract;
pub mod enumerate;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod sidecar;
