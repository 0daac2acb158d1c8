pub mod background;
pub mod config;
pub mod files;
pub mod health;
pub mod ip;
pub mod status;
pub mod weather;
