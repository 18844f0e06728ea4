//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{GatingError, GatingResult};

pub use crate::config::GatingConfig;
pub use crate::consts::defaults;

pub use crate::signal::{build_signals, describe_frame_ranges, Signal, SignalSource};
pub use crate::signal::{blurring_score, combine_signals, crop_frames, frame_correlation, smooth};

pub use crate::filter::{bandpass, ButterworthBandpass, FilterSpec, FilteredSignal};

pub use crate::extrema::{detect_extrema, ExtremaSpec, ExtremumCandidate, ExtremumKind};

pub use crate::gating::{run_gating, run_gating_or_manual, GatingInput};
pub use crate::gating::{
    FrameGate, GatingAssignment, GatingReport, GatingSlot, ManualOverrides, Phase, Ticket,
};
