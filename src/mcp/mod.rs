pub mod server;

pub use server::DjServer;
