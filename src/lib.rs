pub mod config;
pub mod error;
pub mod mcp;
pub mod music;
pub mod player;
pub mod stt;
pub mod tools;
