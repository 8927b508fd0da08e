pub mod config;
pub mod constants;
pub mod controller;
pub mod ids;
pub mod message;
pub mod poller;
pub mod store;
