use std::sync::Arc;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::common::types::WindowId;

/// Handle to the live control surface of the current track.
///
/// The surface task runs until the handle is closed, dropped or expires.
#[derive(Debug)]
pub struct ControlWindow {
    pub id: WindowId,
    cancel: CancellationToken,
    refresh: Arc<Notify>,
}

impl ControlWindow {
    pub fn new(id: WindowId, cancel: CancellationToken, refresh: Arc<Notify>) -> Self {
        Self { id, cancel, refresh }
    }

    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Redraw the card now instead of waiting for the next tick.
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }
}

impl Drop for ControlWindow {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_cancels_surface() {
        let cancel = CancellationToken::new();
        let window = ControlWindow::new(WindowId::generate(), cancel.clone(), Arc::new(Notify::new()));
        assert!(!window.is_closed());
        drop(window);
        assert!(cancel.is_cancelled());
    }
}
