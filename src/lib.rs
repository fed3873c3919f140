pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod submission;
pub mod types;

// Observability: metric names and recording helpers
pub mod observability;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;
