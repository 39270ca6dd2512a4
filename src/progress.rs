use log::{debug, info};

/// Receives the single status label and the 0-100 progress value.
pub trait LoadStatus {
    fn set_label(&mut self, label: &str);

    /// `None` means the progress cannot be computed and an indeterminate
    /// indicator should be shown.
    fn set_progress(&mut self, percent: Option<u8>);
}

/// Writes status changes to the log.
#[derive(Debug, Default)]
pub struct LogStatus {
    label: String,
    progress: Option<u8>,
}

impl LogStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn progress(&self) -> Option<u8> {
        self.progress
    }
}

impl LoadStatus for LogStatus {
    fn set_label(&mut self, label: &str) {
        if self.label != label {
            info!("{}", label);
            self.label = label.to_string();
        }
    }

    fn set_progress(&mut self, percent: Option<u8>) {
        if self.progress != percent {
            match percent {
                Some(percent) => debug!("Progress: {}%", percent),
                None => debug!("Progress: indeterminate"),
            }
            self.progress = percent;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DownloadProgress {
    pub received_bytes: u64,
    pub total_bytes: Option<u64>,
}

impl DownloadProgress {
    /// A zero content length is treated as unknown.
    pub fn new(total_bytes: Option<u64>) -> Self {
        Self {
            received_bytes: 0,
            total_bytes: total_bytes.filter(|total| *total > 0),
        }
    }

    pub fn add_chunk(&mut self, len: usize) {
        self.received_bytes += len as u64;
    }

    pub fn fraction(&self) -> Option<f64> {
        self.total_bytes
            .map(|total| (self.received_bytes as f64 / total as f64).min(1.0))
    }

    /// Download share of the combined progress value, never above `ceiling`.
    pub fn percent(&self, ceiling: u8) -> Option<u8> {
        self.fraction()
            .map(|fraction| (fraction * ceiling as f64).round().min(ceiling as f64) as u8)
    }
}

/// Combined progress value while loading `loaded` of `total` resources after
/// the download phase.
pub fn resource_percent(loaded: usize, total: usize, ceiling: u8) -> u8 {
    let remaining = 100 - ceiling.min(100) as u32;
    let share = if total == 0 {
        remaining
    } else {
        ((loaded.min(total) as f64 / total as f64) * remaining as f64).round() as u32
    };

    (ceiling as u32 + share).min(100) as u8
}
