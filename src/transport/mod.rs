pub mod http_server;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod websocket_server;

pub use http_server::router;
