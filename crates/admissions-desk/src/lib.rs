pub mod admissions;
pub mod api;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod theme;
