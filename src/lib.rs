pub mod app;
pub mod auth;
pub mod blueprints;
pub mod chat;
pub mod config;
pub mod gateway;
pub mod handler;
pub mod language;
pub mod roadmap;
pub mod setup;
pub mod store;
pub mod tui;
pub mod ui;
