pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod endpoints;
pub mod errors;
pub mod logger;
pub mod models;
pub mod printful;
pub mod store;
pub mod warmer;
