#![forbid(unsafe_code)]

pub mod app;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod formats;
pub mod genres;
pub mod logging;
pub mod metadata;
pub mod remote_store;
