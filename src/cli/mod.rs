//! CLI modules for key management and user interaction

pub mod commands;
pub mod key_manager;

pub use commands::*;
pub use key_manager::KeyManager;
