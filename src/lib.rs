pub mod config;
pub mod db;
pub mod error;
pub mod flash;
pub mod journal;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
