// libs/appointment-cell/src/services/interval.rs
//
// Half-open time intervals and the slot arithmetic built on them. The same
// overlap rule serves minute-of-day block windows and absolute appointment
// timestamps.

/// Minutes in one bookable slot.
pub const SLOT_MINUTES: u32 = 30;

/// A half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval<T> {
    pub start: T,
    pub end: T,
}

impl<T: PartialOrd + Copy> Interval<T> {
    pub fn new(start: T, end: T) -> Self {
        Self { start, end }
    }

    /// True iff the two intervals share at least one instant. Back-to-back
    /// intervals (`self.end == other.start`) do not overlap; this is what
    /// makes consecutive 30-minute slots independently bookable.
    pub fn overlaps(&self, other: &Interval<T>) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Parse a zero-padded `"HH:MM"` label into minute-of-day.
pub fn minutes_from_hhmm(value: &str) -> Option<u32> {
    let (hours, minutes) = value.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Format minute-of-day back into the fixed-width `"HH:MM"` label.
pub fn hhmm_from_minutes(total: u32) -> String {
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Enumerate 30-minute slot start labels within a block window. The loop
/// bound only guarantees a slot *starts* before the window ends; a window of
/// odd length therefore offers a final slot whose nominal end overruns the
/// window. Known quirk, kept as-is.
pub fn slot_starts(window: Interval<u32>) -> Vec<String> {
    let mut slots = Vec::new();
    let mut current = window.start;
    while current < window.end {
        slots.push(hhmm_from_minutes(current));
        current += SLOT_MINUTES;
    }
    slots
}
