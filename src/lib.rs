pub mod ai;
pub mod collector;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod youtube;
