// Use cases layer: reconciliation, input translation and the client state machine.

pub mod client_session;
pub mod input_translator;
pub mod message_handler;
#[cfg(test)]
pub(crate) mod test_support;

pub use client_session::{ClientPhase, ClientSession, SessionConfig};
pub use input_translator::InputTranslator;
pub use message_handler::MessageHandler;
