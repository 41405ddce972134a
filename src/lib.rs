pub mod config;
pub mod db;
pub mod departure;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
