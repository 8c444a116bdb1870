pub mod api;
pub mod config;
pub mod controllers;
pub mod error;
pub mod models;
pub mod session;
pub mod state;
