use std::ops::RangeInclusive;

pub const EDGE_THRESHOLD_RANGE: RangeInclusive<i32> = 0..=255;
pub const KERNEL_SIZE_RANGE: RangeInclusive<i32> = 1..=21;

/// Runtime-tunable pipeline parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameters {
    /// Low hysteresis threshold; the high threshold is twice this value
    pub edge_threshold: u8,
    /// Side of the square structuring element used for closing
    pub kernel_size: u32,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            edge_threshold: 100,
            kernel_size: 5,
        }
    }
}

impl Parameters {
    /// Build parameters from raw values, clamping into the valid ranges
    pub fn clamped(edge_threshold: i32, kernel_size: i32) -> Self {
        Self {
            edge_threshold: clamp_edge_threshold(edge_threshold),
            kernel_size: clamp_kernel_size(kernel_size),
        }
    }
}

pub fn clamp_edge_threshold(value: i32) -> u8 {
    let clamped = value.clamp(*EDGE_THRESHOLD_RANGE.start(), *EDGE_THRESHOLD_RANGE.end());
    if clamped != value {
        tracing::debug!("edge threshold {} clamped to {}", value, clamped);
    }
    clamped as u8
}

pub fn clamp_kernel_size(value: i32) -> u32 {
    let clamped = value.clamp(*KERNEL_SIZE_RANGE.start(), *KERNEL_SIZE_RANGE.end());
    if clamped != value {
        tracing::debug!("kernel size {} clamped to {}", value, clamped);
    }
    clamped as u32
}

/// Committed parameters plus changes staged for the next frame boundary
///
/// Control input only ever stages values; `commit` is called by the frame
/// loop between frames so a frame is never processed with mixed settings.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    current: Parameters,
    pending: Option<Parameters>,
}

impl ParameterStore {
    pub fn new(initial: Parameters) -> Self {
        Self {
            current: initial,
            pending: None,
        }
    }

    pub fn current(&self) -> Parameters {
        self.current
    }

    fn staged(&mut self) -> &mut Parameters {
        let current = self.current;
        self.pending.get_or_insert(current)
    }

    pub fn request_edge_threshold(&mut self, value: i32) {
        self.staged().edge_threshold = clamp_edge_threshold(value);
    }

    pub fn request_kernel_size(&mut self, value: i32) {
        self.staged().kernel_size = clamp_kernel_size(value);
    }

    /// Apply staged changes, returning true if the parameters changed
    pub fn commit(&mut self) -> bool {
        match self.pending.take() {
            Some(next) if next != self.current => {
                tracing::info!(
                    "Parameters changed: edge_threshold={} kernel_size={}",
                    next.edge_threshold,
                    next.kernel_size
                );
                self.current = next;
                true
            }
            _ => false,
        }
    }
}
