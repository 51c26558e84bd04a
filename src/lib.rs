pub mod api;
pub mod cli;
pub mod config;
pub mod csrf;
pub mod database;
pub mod error;
pub mod logger;
pub mod maintenance;
pub mod model;
pub mod observer;
pub mod store;
