pub mod common;
pub mod configs;
pub mod engine;
pub mod pins;
pub mod player;
pub mod presenter;
pub mod protocol;
pub mod render;
pub mod server;
pub mod sources;
pub mod transport;
pub mod voice;
