pub mod config;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod render;
pub mod repository;
pub mod routes;
pub mod schema;
pub mod services;
pub mod session;
pub mod utils;
