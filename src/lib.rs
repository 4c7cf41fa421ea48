pub mod api;
pub mod app;
pub mod capture;
pub mod config;
pub mod errors;
pub mod state;
pub mod ui;
