pub mod base;
pub mod catalog;
pub mod logging;
pub mod pins;
pub mod player;
pub mod server;
pub mod voice;

pub use base::*;
pub use catalog::*;
pub use logging::*;
pub use pins::*;
pub use player::*;
pub use server::*;
pub use voice::*;
