pub mod app;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod keybindings;
pub mod logging;
pub mod messaging;
pub mod repository;
pub mod snippet;
pub mod storage;
pub mod ui;
pub mod utils;
