pub mod client;
pub mod serializer;

pub use client::ws_handler;
