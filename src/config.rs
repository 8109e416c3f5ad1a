// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// Number of undoable changes a list remembers unless configured otherwise.
pub const DEFAULT_HISTORY_LENGTH: usize = 10;

/// Settings of a `SubtitleList`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtitleListConfig {
    /// Capacity of the undo/redo history (at least 1).
    pub history_length: usize,
}

impl SubtitleListConfig {
    /// Set the history capacity; values below 1 are raised to 1.
    pub fn history_length(mut self, history_length: usize) -> Self {
        self.history_length = history_length.max(1);
        self
    }
}

impl Default for SubtitleListConfig {
    fn default() -> Self {
        SubtitleListConfig {
            history_length: DEFAULT_HISTORY_LENGTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_length_is_clamped() {
        assert_eq!(SubtitleListConfig::default().history_length, 10);
        assert_eq!(SubtitleListConfig::default().history_length(3).history_length, 3);
        assert_eq!(SubtitleListConfig::default().history_length(0).history_length, 1);
    }
}
