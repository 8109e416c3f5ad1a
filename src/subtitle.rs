// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::markup;
use crate::store::NodeId;
use crate::timetypes::{TimePoint, UNSYNCED};

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Identifier of a subtitle, unique within the `SubtitleList` that created it.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubtitleId(pub u64);

impl Display for SubtitleId {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{:x}", self.0)
    }
}

/// Start time, end time and content of a subtitle, plus everything derived from them.
///
/// Times are milliseconds; a negative time is unset. Content is written in the inline markup
/// described in `markup`.
pub trait Subtitle {
    /// Start time in milliseconds, negative if unset.
    fn start_time(&self) -> i64;

    /// End time in milliseconds, negative if unset.
    fn end_time(&self) -> i64;

    /// Content in the inline markup format.
    fn content(&self) -> &str;

    /// `true` for a `DraftSubtitle`.
    fn is_draft(&self) -> bool;

    /// A subtitle is synced if both of its times are set.
    fn is_synced(&self) -> bool {
        self.start_time() >= 0 && self.end_time() >= 0
    }

    /// `true` if the subtitle is shown at `time` (start inclusive, end exclusive).
    fn is_at(&self, time: i64) -> bool {
        self.is_synced() && self.start_time() <= time && self.end_time() > time
    }

    /// Length of the subtitle in milliseconds, `-1` if unsynced.
    fn duration(&self) -> i64 {
        if self.is_synced() {
            self.end_time() - self.start_time()
        } else {
            UNSYNCED
        }
    }

    /// `true` if there is no content.
    fn is_empty(&self) -> bool {
        self.content().is_empty()
    }

    /// Number of characters a viewer reads, formatting markers excluded.
    fn character_count(&self) -> usize {
        markup::to_plaintext(self.content()).chars().count()
    }

    /// Characters per second with one decimal, `"0.0"` if there is no positive duration.
    fn character_rate(&self) -> String {
        let duration = self.duration();
        if duration > 0 {
            format!("{:.1}", self.character_count() as f64 * 1000.0 / duration as f64)
        } else {
            "0.0".to_string()
        }
    }

    /// Number of lines of the content.
    fn line_count(&self) -> usize {
        markup::lines(self.content()).count()
    }

    /// `character_count()` of every line.
    fn character_count_per_line(&self) -> Vec<usize> {
        markup::lines(self.content())
            .map(|line| markup::to_plaintext(line).chars().count())
            .collect()
    }

    /// Start time in seconds, `-1.0` if unset.
    fn start_time_seconds(&self) -> f64 {
        TimePoint::from_subtitle_time(self.start_time()).map_or(-1.0, |t| t.secs_f64())
    }

    /// End time in seconds, `-1.0` if unset.
    fn end_time_seconds(&self) -> f64 {
        TimePoint::from_subtitle_time(self.end_time()).map_or(-1.0, |t| t.secs_f64())
    }
}

/// A subtitle that is part of a `SubtitleList` and persisted in its document.
///
/// Only the list changes stored subtitles, through `update_subtitle_time()` and
/// `update_subtitle_content()`. Use `draft_subtitle()` for a copy that can be changed freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSubtitle {
    pub(crate) id: SubtitleId,
    pub(crate) node: NodeId,
    pub(crate) start_time: i64,
    pub(crate) end_time: i64,
    pub(crate) content: String,
}

impl StoredSubtitle {
    pub(crate) fn new(id: SubtitleId, node: NodeId, start_time: i64, end_time: i64, content: String) -> StoredSubtitle {
        StoredSubtitle {
            id,
            node,
            start_time,
            end_time,
            content,
        }
    }

    /// The list-wide identifier of this subtitle.
    pub fn id(&self) -> SubtitleId {
        self.id
    }

    /// Handle of the document node backing this subtitle.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Snapshot of the current values that can be changed without touching the list.
    pub fn draft_subtitle(&self) -> DraftSubtitle {
        DraftSubtitle {
            stored_subtitle: self.id,
            start_time: self.start_time,
            end_time: self.end_time,
            content: self.content.clone(),
        }
    }
}

impl Subtitle for StoredSubtitle {
    fn start_time(&self) -> i64 {
        self.start_time
    }

    fn end_time(&self) -> i64 {
        self.end_time
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn is_draft(&self) -> bool {
        false
    }
}

/// A detached copy of a `StoredSubtitle` used to stage an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftSubtitle {
    /// The subtitle this draft was taken from.
    pub stored_subtitle: SubtitleId,

    /// Start time in milliseconds, negative if unset.
    pub start_time: i64,

    /// End time in milliseconds, negative if unset.
    pub end_time: i64,

    /// Content in the inline markup format.
    pub content: String,
}

impl Subtitle for DraftSubtitle {
    fn start_time(&self) -> i64 {
        self.start_time
    }

    fn end_time(&self) -> i64 {
        self.end_time
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn is_draft(&self) -> bool {
        true
    }
}
