pub mod config;
pub mod controller;
pub mod fetcher;
pub mod http;
pub mod render;
pub mod retry;
