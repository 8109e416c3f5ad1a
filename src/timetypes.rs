// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// Sentinel value for an unset start or end time.
///
/// Every negative millisecond value means "unset"; the list normalizes them to this value.
pub const UNSYNCED: i64 = -1;

/// Represents a time point (e.g. the start of a subtitle) in milliseconds.
///
/// Subtitle times are plain `i64` milliseconds throughout the crate; `TimePoint` is used where
/// the components (hours, minutes, ...) of a time are needed, for example by document formats.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimePoint(i64 /* number of milliseconds */);

impl TimePoint {
    /// Create a time point from all time components.
    ///
    /// The components can exceed their natural limits without error.
    /// For example `from_components(0, 0, 3, -2000)` is the same as `from_components(0, 0, 1, 0)`.
    pub fn from_components(hours: i64, mins: i64, secs: i64, ms: i64) -> TimePoint {
        TimePoint(ms + 1000 * (secs + 60 * (mins + 60 * hours)))
    }

    /// Like `from_components()`, but `None` if the result does not fit into an `i64`.
    pub fn checked_from_components(hours: i64, mins: i64, secs: i64, ms: i64) -> Option<TimePoint> {
        let mins = hours.checked_mul(60)?.checked_add(mins)?;
        let secs = mins.checked_mul(60)?.checked_add(secs)?;
        let ms = secs.checked_mul(1000)?.checked_add(ms)?;
        Some(TimePoint(ms))
    }

    /// Create a time point from a given number of milliseconds.
    pub fn from_msecs(ms: i64) -> TimePoint {
        TimePoint(ms)
    }

    /// Converts a subtitle time to a time point, `None` for unset (negative) times.
    pub fn from_subtitle_time(ms: i64) -> Option<TimePoint> {
        if ms >= 0 {
            Some(TimePoint(ms))
        } else {
            None
        }
    }

    /// Converts an optional time point back to a subtitle time.
    pub fn to_subtitle_time(t: Option<TimePoint>) -> i64 {
        t.map_or(UNSYNCED, |t| t.msecs())
    }

    /// Get the total number of milliseconds.
    pub fn msecs(&self) -> i64 {
        self.0
    }

    fn secs(&self) -> i64 {
        self.0 / 1000
    }

    /// Get the total number of seconds as float.
    pub fn secs_f64(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    fn mins(&self) -> i64 {
        self.0 / (60 * 1000)
    }

    /// Get the total number of hours.
    pub fn hours(&self) -> i64 {
        self.0 / (60 * 60 * 1000)
    }

    /// Get the milliseconds component in a range of [0, 999].
    pub fn msecs_comp(&self) -> i64 {
        self.msecs() % 1000
    }

    /// Get the seconds component in a range of [0, 59].
    pub fn secs_comp(&self) -> i64 {
        self.secs() % 60
    }

    /// Get the minute component in a range of [0, 59].
    pub fn mins_comp(&self) -> i64 {
        self.mins() % 60
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timepoint_components() {
        let t = TimePoint::from_components(1, 2, 3, 4);
        assert_eq!((t.hours(), t.mins_comp(), t.secs_comp(), t.msecs_comp()), (1, 2, 3, 4));
        assert_eq!(TimePoint::from_components(0, 0, 3, -2000), TimePoint::from_msecs(1000));
    }

    #[test]
    fn test_checked_components() {
        assert_eq!(TimePoint::checked_from_components(1, 2, 3, 4), Some(TimePoint::from_components(1, 2, 3, 4)));
        assert_eq!(TimePoint::checked_from_components(9_999_999_999_999, 0, 0, 0), None);
        assert_eq!(TimePoint::checked_from_components(0, 0, i64::MAX / 1000, 1000), None);
    }

    #[test]
    fn test_subtitle_time_conversion() {
        assert_eq!(TimePoint::from_subtitle_time(-1), None);
        assert_eq!(TimePoint::from_subtitle_time(-250), None);
        assert_eq!(TimePoint::from_subtitle_time(0), Some(TimePoint::from_msecs(0)));
        assert_eq!(TimePoint::to_subtitle_time(None), UNSYNCED);
        assert_eq!(TimePoint::to_subtitle_time(Some(TimePoint::from_components(0, 1, 2, 3))), 62003);
    }
}
