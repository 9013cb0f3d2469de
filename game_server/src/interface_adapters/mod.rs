// Interface adapters: HTTP bootstrap, websocket handling and shared state.

pub mod http;
pub mod net;
pub mod routes;
pub mod state;
