pub mod chart;
pub mod config;
pub mod error;
pub mod favorites;
pub mod fetch;
pub mod insights;
pub mod logging;
pub mod model;
pub mod providers;
pub mod report;
pub mod state;
pub mod weather_code;
