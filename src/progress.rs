//! Progress reporting for the long-running estimation loops

/// Callbacks fired by the model aggregation and grid evaluation loops.
///
/// All methods default to no-ops, so implementors override the subset they
/// need. The unit type is the silent sink, and `&mut T` forwards to `T` so a
/// sink can be inspected after the call returns.
pub trait ProgressSink {
    /// Called once before the loop with the total number of items
    fn start(&mut self, total: usize) {
        let _ = total;
    }

    /// Called once per processed item
    fn inc(&mut self) {}

    /// Called once after the loop
    fn finish(&mut self) {}
}

/// Silent sink
impl ProgressSink for () {}

impl<T: ProgressSink + ?Sized> ProgressSink for &mut T {
    #[inline]
    fn start(&mut self, total: usize) {
        (**self).start(total)
    }

    #[inline]
    fn inc(&mut self) {
        (**self).inc()
    }

    #[inline]
    fn finish(&mut self) {
        (**self).finish()
    }
}

#[cfg(feature = "progress")]
mod indicatif_impl {
    use super::ProgressSink;

    use indicatif::{ProgressBar, ProgressStyle};

    /// [ProgressSink] drawing an [indicatif](https://docs.rs/indicatif)
    /// terminal bar
    pub struct IndicatifProgress {
        bar: ProgressBar,
    }

    impl Default for IndicatifProgress {
        fn default() -> Self {
            // The actual length is set in start()
            Self {
                bar: ProgressBar::new(1),
            }
        }
    }

    impl ProgressSink for IndicatifProgress {
        fn start(&mut self, total: usize) {
            self.bar.set_length(total.max(1) as u64);
            self.bar.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} ({percent:>3}%) ETA {eta_precise}")
                    .expect("static template is valid"),
            );
        }

        fn inc(&mut self) {
            self.bar.inc(1);
        }

        fn finish(&mut self) {
            self.bar.finish_and_clear();
        }
    }
}

#[cfg(feature = "progress")]
pub use indicatif_impl::IndicatifProgress;
