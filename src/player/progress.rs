use tokio::time::{Duration, Instant};

/// Wall-clock accounting of how far into the current track playback is.
///
/// Elapsed time excludes every paused interval and never runs past the
/// track duration when that duration is known.
#[derive(Debug, Clone)]
pub struct Progress {
    started_at: Instant,
    paused_at: Option<Instant>,
    paused_total: Duration,
    duration: Option<Duration>,
}

impl Progress {
    pub fn start(duration_secs: u64) -> Self {
        Self::start_at(Instant::now(), duration_secs)
    }

    pub fn start_at(now: Instant, duration_secs: u64) -> Self {
        Self {
            started_at: now,
            paused_at: None,
            paused_total: Duration::ZERO,
            duration: (duration_secs > 0).then(|| Duration::from_secs(duration_secs)),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Returns false when already paused.
    pub fn pause(&mut self) -> bool {
        self.pause_at(Instant::now())
    }

    pub fn pause_at(&mut self, now: Instant) -> bool {
        if self.paused_at.is_some() {
            return false;
        }
        self.paused_at = Some(now);
        true
    }

    /// Returns false when not paused.
    pub fn resume(&mut self) -> bool {
        self.resume_at(Instant::now())
    }

    pub fn resume_at(&mut self, now: Instant) -> bool {
        match self.paused_at.take() {
            Some(since) => {
                self.paused_total += now.saturating_duration_since(since);
                true
            }
            None => false,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        let reference = self.paused_at.unwrap_or(now);
        let played = reference
            .saturating_duration_since(self.started_at)
            .saturating_sub(self.paused_total);
        match self.duration {
            Some(limit) => played.min(limit),
            None => played,
        }
    }

    /// Whole seconds, rounded down.
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_freezes_elapsed() {
        let t0 = Instant::now();
        let mut progress = Progress::start_at(t0, 200);

        assert!(progress.pause_at(t0 + Duration::from_secs(30)));
        assert_eq!(
            progress.elapsed_at(t0 + Duration::from_secs(40)),
            Duration::from_secs(30)
        );

        assert!(progress.resume_at(t0 + Duration::from_secs(40)));
        assert_eq!(
            progress.elapsed_at(t0 + Duration::from_secs(45)),
            Duration::from_secs(35)
        );
    }

    #[test]
    fn test_double_pause_and_resume_are_noops() {
        let t0 = Instant::now();
        let mut progress = Progress::start_at(t0, 0);

        assert!(!progress.resume_at(t0 + Duration::from_secs(1)));
        assert!(progress.pause_at(t0 + Duration::from_secs(2)));
        assert!(!progress.pause_at(t0 + Duration::from_secs(5)));
        assert!(progress.is_paused());
        assert_eq!(
            progress.elapsed_at(t0 + Duration::from_secs(9)),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_elapsed_is_clamped_to_duration() {
        let t0 = Instant::now();
        let progress = Progress::start_at(t0, 10);
        assert_eq!(
            progress.elapsed_at(t0 + Duration::from_secs(25)),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_unknown_duration_is_unbounded() {
        let t0 = Instant::now();
        let progress = Progress::start_at(t0, 0);
        assert_eq!(
            progress.elapsed_at(t0 + Duration::from_secs(600)),
            Duration::from_secs(600)
        );
    }

    #[test]
    fn test_clock_before_start_reads_zero() {
        let t0 = Instant::now() + Duration::from_secs(5);
        let progress = Progress::start_at(t0, 100);
        assert_eq!(progress.elapsed_at(Instant::now()), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tracks_tokio_clock() {
        let mut progress = Progress::start(200);
        tokio::time::advance(Duration::from_secs(30)).await;
        progress.pause();
        tokio::time::advance(Duration::from_secs(10)).await;
        progress.resume();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(progress.elapsed_secs(), 35);
    }
}
