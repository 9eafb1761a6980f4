pub mod context;
pub mod manager;
pub mod progress;
pub mod window;

pub use context::{GuildPlayer, NowPlaying, NowPlayingView, PlayerSnapshot, SessionState};
pub use manager::{
    ControlAction, Enqueued, Interaction, ManagerDeps, PinMode, PinOutcome, PlayerError,
    PlayerManager,
};
pub use progress::Progress;
pub use window::ControlWindow;
