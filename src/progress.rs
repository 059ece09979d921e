use atomic_counter::{AtomicCounter, RelaxedCounter};
use indicatif::{ProgressDrawTarget, ProgressStyle};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Milliseconds between redraws of a visible bar.
pub const REFRESH_RATE: u64 = 100;

/// Something that can be ticked from any worker thread.
pub trait ProgressBar: Sync {
    /// Advance the bar by one.
    fn tick(&self);
}

/// Creates a visible [`Bar`] or a [`HiddenBar`].
pub fn bar(len: usize, prefix: &str, visible: bool) -> Box<dyn ProgressBar> {
    if visible {
        Box::new(Bar::new(len as u64, String::from(prefix), true))
    } else {
        Box::new(HiddenBar {})
    }
}

/// An indicatif bar fed by a RelaxedCounter. Workers only bump the counter,
/// a helper thread copies it to the bar until the Bar is dropped.
pub struct Bar {
    counter: Arc<RelaxedCounter>,
    pub pbar: Arc<indicatif::ProgressBar>,
}

impl Bar {
    /// A bar of `len` steps drawn to stderr when `visible`.
    pub fn new(len: u64, prefix: String, visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let pbar = Arc::new(indicatif::ProgressBar::with_draw_target(len, target));
        pbar.set_prefix(prefix);
        pbar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix}[{bar:40}] [{elapsed_precise}] {percent:>3}%")
                .progress_chars("=>-"),
        );
        let counter = Arc::new(RelaxedCounter::new(0));
        let (c, pb) = (counter.clone(), pbar.clone());
        thread::spawn(move || {
            // the Bar holds the other reference to the counter
            while Arc::strong_count(&c) > 1 && !pb.is_finished() {
                pb.set_position(c.get() as u64);
                thread::sleep(Duration::from_millis(REFRESH_RATE));
            }
        });
        Self { counter, pbar }
    }
}

impl ProgressBar for Bar {
    fn tick(&self) {
        self.counter.inc();
    }
}

impl Drop for Bar {
    fn drop(&mut self) {
        if !self.pbar.is_finished() {
            self.pbar.set_position(self.counter.get() as u64);
            self.pbar.finish_and_clear();
        }
    }
}

/// A bar that does nothing, for library calls and tests.
pub struct HiddenBar {}

impl ProgressBar for HiddenBar {
    fn tick(&self) {}
}
