//! Core client module

pub mod client;
pub mod config;
pub mod document;
pub mod errors;
pub mod languages;
pub mod models;
pub mod request;
