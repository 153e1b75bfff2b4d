//! Application service layer - orchestration, config, image acquisition, reporting

pub mod acquire;
pub mod app;
pub mod config;
pub mod report;
