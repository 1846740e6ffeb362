//! Progress reporting that becomes no-op when the `progress` feature is disabled

#[cfg(feature = "progress")]
pub use indicatif::{ProgressBar, ProgressStyle};

#[cfg(not(feature = "progress"))]
pub use self::noop::*;

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counter with an optional progress bar attached.
///
/// The count is tracked independently of the bar so callers can read it back
/// even when the bar is hidden.
pub struct Progress {
    bar: Option<ProgressBar>,
    done_message: Cow<'static, str>,
    count: AtomicU64,
}

impl Progress {
    /// Visible bar of `total` steps, labelled `message`
    pub fn new(
        total: u64,
        message: impl Into<Cow<'static, str>>,
        done_message: impl Into<Cow<'static, str>>,
    ) -> Self {
        let bar = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("█▓▒░  "));
        }
        bar.set_message(message);

        Self {
            bar: Some(bar),
            done_message: done_message.into(),
            count: AtomicU64::new(0),
        }
    }

    /// Counter without any terminal output
    pub fn hidden() -> Self {
        Self {
            bar: None,
            done_message: Cow::Borrowed(""),
            count: AtomicU64::new(0),
        }
    }

    /// `new` unless `silent`, in which case `hidden`
    pub fn maybe(
        silent: bool,
        total: u64,
        message: impl Into<Cow<'static, str>>,
        done_message: impl Into<Cow<'static, str>>,
    ) -> Self {
        if silent {
            Self::hidden()
        } else {
            Self::new(total, message, done_message)
        }
    }

    pub fn tick(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(self.done_message.clone());
        }
    }
}

#[cfg(not(feature = "progress"))]
mod noop {
    /// No-op progress bar when `progress` feature is disabled
    #[derive(Clone)]
    pub struct ProgressBar;

    impl ProgressBar {
        pub fn new(_len: u64) -> Self {
            ProgressBar
        }

        pub fn set_style(&self, _style: ProgressStyle) {}
        pub fn set_message(&self, _msg: impl Into<std::borrow::Cow<'static, str>>) {}
        pub fn inc(&self, _delta: u64) {}
        pub fn finish_with_message(&self, _msg: impl Into<std::borrow::Cow<'static, str>>) {}
    }

    /// No-op progress style
    pub struct ProgressStyle;

    impl ProgressStyle {
        pub fn default_bar() -> Self {
            ProgressStyle
        }

        pub fn template(self, _template: &str) -> Result<Self, std::convert::Infallible> {
            Ok(self)
        }

        pub fn progress_chars(self, _chars: &str) -> Self {
            self
        }
    }
}
