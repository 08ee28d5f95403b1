use std::time::{Duration, Instant};

use indicatif::{HumanDuration, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Replay progress on stderr. A disabled instance is a no-op.
pub struct Progress {
    enabled: bool,
    start: Instant,
    events: ProgressBar,
}

impl Progress {
    pub fn new(enabled: bool, total_events: usize) -> Self {
        let start = Instant::now();
        if !enabled {
            return Self {
                enabled: false,
                start,
                events: ProgressBar::hidden(),
            };
        }

        let events = ProgressBar::with_draw_target(
            Some(total_events as u64),
            ProgressDrawTarget::stderr(),
        );
        events.set_style(
            ProgressStyle::with_template("{spinner} {bar:40.cyan/blue} {pos}/{len} {msg}")
                .expect("progress template")
                .progress_chars("##-"),
        );
        events.enable_steady_tick(Duration::from_millis(120));
        events.set_message("installing");

        Self {
            enabled: true,
            start,
            events,
        }
    }

    pub fn set_stage(&self, msg: impl Into<String>) {
        if !self.enabled {
            return;
        }
        self.events.set_message(msg.into());
    }

    pub fn event_done(&self, label: &str) {
        if !self.enabled {
            return;
        }
        self.events.inc(1);
        self.events.set_message(label.to_string());
    }

    pub fn finish(&self) {
        if !self.enabled {
            return;
        }
        self.events.println(format!(
            "Replayed {} events in {}",
            self.events.position(),
            HumanDuration(self.start.elapsed())
        ));
        self.events.finish_and_clear();
    }
}
