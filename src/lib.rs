pub mod command;
pub mod config;
pub mod dispatch;
pub mod pipe;
pub mod registry;
pub mod tray;
