pub mod config;
pub mod error;
pub mod frame;
pub mod recording;
pub mod state;
