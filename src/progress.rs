//! Text progress bar for long hotsheet scans.

use std::io::Write;

const BAR_WIDTH: usize = 50;

/// A redrawn-in-place progress bar: `[#####     ] 42%       21/50`.
#[derive(Debug, Clone)]
pub struct ProgressBar {
    current: u64,
    total: u64,
    fill: char,
    enabled: bool,
}

impl ProgressBar {
    pub fn new(start: u64, total: u64) -> Self {
        Self {
            current: start,
            total,
            fill: '#',
            enabled: true,
        }
    }

    /// A bar that tracks progress but never draws.
    pub fn hidden(total: u64) -> Self {
        Self {
            enabled: false,
            ..Self::new(0, total)
        }
    }

    pub fn with_fill(mut self, fill: char) -> Self {
        self.fill = fill;
        self
    }

    /// Reset to zero for a new pass over `total` items.
    pub fn restart(&mut self, total: u64) {
        self.current = 0;
        self.total = total;
    }

    pub fn percent(&self) -> u64 {
        if self.total == 0 {
            return 100;
        }
        (self.current.saturating_mul(100) / self.total).min(100)
    }

    pub fn render(&self) -> String {
        let filled = (self.percent() as usize * BAR_WIDTH) / 100;
        let bar: String = std::iter::repeat(self.fill)
            .take(filled)
            .chain(std::iter::repeat(' ').take(BAR_WIDTH - filled))
            .collect();
        format!(
            "\r[{}]{:>3}% {:>8}/{}",
            bar,
            self.percent(),
            self.current,
            self.total
        )
    }

    /// Move to `current` and redraw on stderr.
    pub fn play(&mut self, current: u64) {
        self.current = current;
        if self.enabled {
            let mut err = std::io::stderr().lock();
            let _ = write!(err, "{}", self.render());
            let _ = err.flush();
        }
    }

    /// End the progress line.
    pub fn finish(&mut self) {
        if self.enabled {
            eprintln!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        let mut bar = ProgressBar::hidden(200);
        assert_eq!(bar.percent(), 0);
        bar.play(50);
        assert_eq!(bar.percent(), 25);
        bar.play(400);
        assert_eq!(bar.percent(), 100, "clamped");
    }

    #[test]
    fn test_zero_total_is_complete() {
        assert_eq!(ProgressBar::hidden(0).percent(), 100);
    }

    #[test]
    fn test_render_layout() {
        let mut bar = ProgressBar::hidden(10).with_fill('=');
        bar.play(5);
        let line = bar.render();
        assert!(line.starts_with('\r'));
        assert_eq!(line.matches('=').count(), 25);
        assert!(line.ends_with(" 50%        5/10"));
        assert_eq!(line.find(']'), Some(BAR_WIDTH + 2));
    }
}
