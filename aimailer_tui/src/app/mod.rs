pub mod actions;
pub mod clipboard;
pub mod editor;
pub mod runtime;
pub mod session_log;
pub mod state;
