//! Terminal progress rendering with indicatif.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use patreon_dl::progress::{ProgressSink, TransferObserver};

/// Progress sink that renders one bar per in-flight transfer.
pub struct IndicatifSink {
    multi: MultiProgress,
}

impl IndicatifSink {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
        }
    }
}

impl ProgressSink for IndicatifSink {
    fn transfer(&self, filename: &str, total: u64, offset: u64) -> Box<dyn TransferObserver> {
        let bar = if total > 0 {
            let bar = self.multi.add(ProgressBar::new(total));
            bar.set_style(
                ProgressStyle::with_template(
                    "{msg:30!} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
            );
            bar
        } else {
            // Unknown size: spinner with a byte counter
            let bar = self.multi.add(ProgressBar::new_spinner());
            bar.set_style(
                ProgressStyle::with_template("{spinner:.green} {msg:30!} {bytes}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar
        };
        bar.set_message(filename.to_string());
        bar.set_position(offset);
        Box::new(BarObserver { bar })
    }
}

struct BarObserver {
    bar: ProgressBar,
}

impl TransferObserver for BarObserver {
    fn advance(&self, bytes: u64) {
        self.bar.inc(bytes);
    }

    fn finish(&self) {
        self.bar.finish();
    }

    fn abandon(&self) {
        self.bar.abandon();
    }
}
