//! Core library for file-harmony: rename audio files to their tagged title.
pub mod config;
pub mod engine;
pub mod models;
pub mod report;
pub mod sanitize;
pub mod tags;
pub mod tree;
pub mod util;
