pub mod auth;
pub mod comms;
pub mod config;
pub mod security;
pub mod storage;
pub mod utils;
