pub mod admin;
pub mod auth;
pub mod health;
pub mod lessons;
pub mod me;
pub mod progress;
pub mod sessions;
