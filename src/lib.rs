//! A server-rendered app for collecting points of interest: geo-tagged entries with
//! images and categories, owned by the users who add them.

mod actions;
pub mod auth;
pub mod config;
mod constants;
pub mod error;
mod handlers;
pub mod images;
pub mod models;
pub mod server;
pub mod store;
pub mod utils;
mod views;
