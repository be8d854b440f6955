//! Debounced loading bar
//!
//! Turns the noisy "anything in flight" boolean into a stable indicator:
//! short operations never show the bar, and once shown it stays up long
//! enough to be seen.
//!
//! The state machine is a plain value. The host feeds it the boolean through
//! [`LoadingBar::set_loading`], fires due timers through [`LoadingBar::poll`]
//! and arms a single timer for [`LoadingBar::next_deadline`].

use std::time::Duration;
use web_time::Instant;

/// Delay before a pending bar becomes visible
pub const SHOW_DELAY: Duration = Duration::from_millis(150);

/// Minimum time a visible bar stays on screen
pub const MIN_VISIBLE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadingBarTiming {
    pub show_delay: Duration,
    pub min_visible: Duration,
}

impl Default for LoadingBarTiming {
    fn default() -> Self {
        Self {
            show_delay: SHOW_DELAY,
            min_visible: MIN_VISIBLE,
        }
    }
}

/// Where the bar is in its show/hide cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarPhase {
    Hidden,
    /// Show timer armed, not yet visible
    PendingShow { show_at: Instant },
    /// On screen; `hide_at` is set once loading has finished
    Visible {
        shown_at: Instant,
        hide_at: Option<Instant>,
    },
}

#[derive(Debug, Clone)]
pub struct LoadingBar {
    timing: LoadingBarTiming,
    phase: BarPhase,
}

impl Default for LoadingBar {
    fn default() -> Self {
        Self::new(LoadingBarTiming::default())
    }
}

impl LoadingBar {
    pub fn new(timing: LoadingBarTiming) -> Self {
        Self {
            timing,
            phase: BarPhase::Hidden,
        }
    }

    pub fn phase(&self) -> BarPhase {
        self.phase
    }

    pub fn timing(&self) -> LoadingBarTiming {
        self.timing
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.phase, BarPhase::Visible { .. })
    }

    /// Feed the current loading state observed at `now`
    pub fn set_loading(&mut self, loading: bool, now: Instant) {
        self.phase = match (self.phase, loading) {
            (BarPhase::Hidden, true) => BarPhase::PendingShow {
                show_at: now + self.timing.show_delay,
            },
            (BarPhase::PendingShow { .. }, false) => BarPhase::Hidden,
            (BarPhase::Visible { shown_at, .. }, true) => BarPhase::Visible {
                shown_at,
                hide_at: None,
            },
            (BarPhase::Visible { shown_at, hide_at: None }, false) => {
                let hide_at = shown_at + self.timing.min_visible;
                if hide_at <= now {
                    BarPhase::Hidden
                } else {
                    BarPhase::Visible {
                        shown_at,
                        hide_at: Some(hide_at),
                    }
                }
            }
            (phase, _) => phase,
        };
    }

    /// Fire any timer that is due at `now`
    pub fn poll(&mut self, now: Instant) {
        self.phase = match self.phase {
            BarPhase::PendingShow { show_at } if show_at <= now => BarPhase::Visible {
                shown_at: now,
                hide_at: None,
            },
            BarPhase::Visible {
                hide_at: Some(hide_at),
                ..
            } if hide_at <= now => BarPhase::Hidden,
            phase => phase,
        };
    }

    /// When the host should next call [`LoadingBar::poll`], if at all
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.phase {
            BarPhase::Hidden => None,
            BarPhase::PendingShow { show_at } => Some(show_at),
            BarPhase::Visible { hide_at, .. } => hide_at,
        }
    }

    /// Teardown: drop pending timers and hide
    pub fn cancel_timers(&mut self) {
        self.phase = BarPhase::Hidden;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_short_request_never_shows() {
        let t0 = Instant::now();
        let mut bar = LoadingBar::default();

        bar.set_loading(true, t0);
        assert_eq!(bar.next_deadline(), Some(t0 + ms(150)));

        bar.poll(t0 + ms(100));
        assert!(!bar.is_visible());

        bar.set_loading(false, t0 + ms(120));
        assert_eq!(bar.phase(), BarPhase::Hidden);
        assert_eq!(bar.next_deadline(), None);

        bar.poll(t0 + ms(500));
        assert!(!bar.is_visible());
    }

    #[test]
    fn test_long_request_shows_after_delay() {
        let t0 = Instant::now();
        let mut bar = LoadingBar::default();

        bar.set_loading(true, t0);
        bar.poll(t0 + ms(150));
        assert!(bar.is_visible());
        assert_eq!(bar.next_deadline(), None);
    }

    #[test]
    fn test_visible_bar_stays_for_min_visible() {
        let t0 = Instant::now();
        let shown = t0 + ms(150);
        let mut bar = LoadingBar::default();

        bar.set_loading(true, t0);
        bar.poll(shown);
        bar.set_loading(false, shown + ms(1));

        assert!(bar.is_visible());
        assert_eq!(bar.next_deadline(), Some(shown + ms(250)));

        bar.poll(shown + ms(249));
        assert!(bar.is_visible());

        bar.poll(shown + ms(250));
        assert!(!bar.is_visible());
    }

    #[test]
    fn test_hide_is_immediate_after_min_visible_elapsed() {
        let t0 = Instant::now();
        let shown = t0 + ms(150);
        let mut bar = LoadingBar::default();

        bar.set_loading(true, t0);
        bar.poll(shown);
        bar.set_loading(false, shown + ms(400));
        assert_eq!(bar.phase(), BarPhase::Hidden);
    }

    #[test]
    fn test_reloading_cancels_pending_hide() {
        let t0 = Instant::now();
        let shown = t0 + ms(150);
        let mut bar = LoadingBar::default();

        bar.set_loading(true, t0);
        bar.poll(shown);
        bar.set_loading(false, shown + ms(10));
        bar.set_loading(true, shown + ms(20));

        assert_eq!(
            bar.phase(),
            BarPhase::Visible {
                shown_at: shown,
                hide_at: None
            }
        );
        bar.poll(shown + ms(1000));
        assert!(bar.is_visible());

        // the minimum is measured from the original show
        bar.set_loading(false, shown + ms(1000));
        assert!(!bar.is_visible());
    }

    #[test]
    fn test_cancel_timers_on_teardown() {
        let t0 = Instant::now();
        let mut bar = LoadingBar::default();

        bar.set_loading(true, t0);
        bar.cancel_timers();
        assert_eq!(bar.next_deadline(), None);
        bar.poll(t0 + ms(1000));
        assert!(!bar.is_visible());
    }

    #[test]
    fn test_custom_timing() {
        let t0 = Instant::now();
        let mut bar = LoadingBar::new(LoadingBarTiming {
            show_delay: ms(10),
            min_visible: ms(20),
        });

        bar.set_loading(true, t0);
        bar.poll(t0 + ms(10));
        assert!(bar.is_visible());
        bar.set_loading(false, t0 + ms(11));
        assert_eq!(bar.next_deadline(), Some(t0 + ms(30)));
    }
}
