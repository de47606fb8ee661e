pub mod api;
pub mod check;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod repository;
pub mod resource;
pub mod seed;
pub mod stats;
pub mod store;
