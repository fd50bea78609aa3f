//! Shelf Labeler - product labeling client for shelf photos
//!
//! A terminal client for a detection/clustering backend. A shelf photo is
//! uploaded, the backend groups the detected products into visual clusters, and
//! the user names each cluster. The client then shows the share of facings per
//! label and an outlined overlay of the shelf.

pub mod api;
pub mod app;
pub mod color_utils;
pub mod commands;
pub mod config;
pub mod constants;
pub mod logger;
pub mod model;
pub mod overlay;
pub mod runtime;
pub mod share;
pub mod views;
pub mod wizard;

pub use app::{AppError, LabelerApp};
pub use config::AppConfig;
