// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::config::SubtitleListConfig;
use crate::errors::*;
use crate::formats::decode_bytes_to_string;
use crate::formats::srt::SrtDocument;
use crate::history::History;
use crate::store::{NodeId, SubtitleStore};
use crate::subtitle::{StoredSubtitle, Subtitle, SubtitleId};
use crate::timetypes::UNSYNCED;

use encoding_rs::Encoding;
use log::{debug, trace, warn};
use std::fmt;

/// What kind of change a `ChangeEvent` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The whole list was replaced.
    Reload,

    /// A subtitle was inserted.
    Insert,

    /// Times or content of a subtitle changed.
    Update,

    /// A subtitle was removed.
    Remove,
}

/// Passed to every change callback after the list changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// The whole list was replaced; the history is empty.
    Reload,

    /// `subtitle` was inserted directly before `before` (at the end for `None`).
    Insert {
        /// The new subtitle.
        subtitle: SubtitleId,

        /// The subtitle that now follows the new one.
        before: Option<SubtitleId>,
    },

    /// Times or content of `subtitle` changed.
    Update {
        /// The changed subtitle.
        subtitle: SubtitleId,
    },

    /// `subtitle` is no longer part of the list.
    Remove {
        /// The removed subtitle.
        subtitle: SubtitleId,
    },
}

impl ChangeEvent {
    /// The kind of this event.
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Reload => ChangeKind::Reload,
            ChangeEvent::Insert { .. } => ChangeKind::Insert,
            ChangeEvent::Update { .. } => ChangeKind::Update,
            ChangeEvent::Remove { .. } => ChangeKind::Remove,
        }
    }

    /// The subtitle the event is about, `None` for `Reload`.
    pub fn subtitle(&self) -> Option<SubtitleId> {
        match *self {
            ChangeEvent::Reload => None,
            ChangeEvent::Insert { subtitle, .. } | ChangeEvent::Update { subtitle } | ChangeEvent::Remove { subtitle } => {
                Some(subtitle)
            }
        }
    }
}

/// A time that was changed as a side effect of an insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingAdjustment {
    /// Value before the insertion.
    pub from: i64,

    /// Value after the insertion.
    pub to: i64,
}

/// Neighbour times that an insertion changed to make room for the new subtitle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreviousTiming {
    /// End time of the subtitle before the inserted one.
    pub prev_end: Option<TimingAdjustment>,

    /// Start time of the subtitle after the inserted one.
    pub next_start: Option<TimingAdjustment>,
}

/// A history record: one change and everything needed to apply its inverse.
///
/// Positions are indices into the list at the time of the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Times and/or content of a subtitle changed.
    Update {
        /// Position before the change.
        pos: usize,

        /// Position after the change; differs from `pos` if the new times moved the subtitle.
        new_pos: usize,

        /// Content before the change, `None` if the content was not changed.
        from_content: Option<String>,

        /// Content after the change.
        to_content: Option<String>,

        /// Times before the change, `None` if the times were not changed.
        from_start_time: Option<i64>,
        /// See `from_start_time`.
        from_end_time: Option<i64>,

        /// Times after the change.
        to_start_time: Option<i64>,
        /// See `to_start_time`.
        to_end_time: Option<i64>,
    },

    /// A subtitle was inserted at `pos`.
    Insert {
        /// Position of the new subtitle.
        pos: usize,

        /// Content of the new subtitle, `None` for an empty one.
        content: Option<String>,

        /// Times of the new subtitle, `None` if it was created unsynced.
        start_time: Option<i64>,
        /// See `start_time`.
        end_time: Option<i64>,

        /// Neighbour times changed by the insertion.
        previous_timing: PreviousTiming,
    },

    /// The subtitle at `pos` was removed.
    Remove {
        /// Position the subtitle had.
        pos: usize,

        /// Values of the removed subtitle, used to recreate it.
        content: String,
        /// See `content`.
        start_time: i64,
        /// See `content`.
        end_time: i64,
    },
}

/// Handle returned by `add_change_callback()`, used to remove the callback again.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct CallbackId(u64);

type ChangeCallback = Box<dyn FnMut(&ChangeEvent)>;

/// An ordered list of subtitles backed by a document, with undo/redo.
///
/// The list is partitioned: the first `synced_count()` subtitles are synced and sorted by start
/// time, all following subtitles are unsynced and kept in insertion order. Every mutation keeps
/// the list, its document, the history and the change callbacks consistent.
///
/// Change callbacks are called synchronously, in registration order, after the mutation is
/// complete. A panicking callback is not caught and the remaining callbacks are skipped.
pub struct SubtitleList<S = SrtDocument> {
    store: S,
    subtitles: Vec<StoredSubtitle>,
    synced_count: usize,
    id_counter: u64,
    history: History<Change>,
    change_callbacks: Vec<(CallbackId, ChangeCallback)>,
    callback_counter: u64,
}

impl SubtitleList<SrtDocument> {
    /// An empty list backed by a `.srt` document.
    pub fn new() -> SubtitleList<SrtDocument> {
        Self::with_config(SubtitleListConfig::default())
    }

    /// An empty list backed by a `.srt` document, with the given settings.
    pub fn with_config(config: SubtitleListConfig) -> SubtitleList<SrtDocument> {
        Self::with_store(SrtDocument::new(), config)
    }
}

impl Default for SubtitleList<SrtDocument> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: fmt::Debug> fmt::Debug for SubtitleList<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SubtitleList")
            .field("store", &self.store)
            .field("subtitles", &self.subtitles)
            .field("synced_count", &self.synced_count)
            .field("history", &self.history)
            .field("change_callbacks", &self.change_callbacks.len())
            .finish()
    }
}

impl<S: SubtitleStore> SubtitleList<S> {
    /// A list backed by `store`.
    ///
    /// The list starts out empty; call `load_xml()` to read the store's document.
    pub fn with_store(store: S, config: SubtitleListConfig) -> SubtitleList<S> {
        SubtitleList {
            store,
            subtitles: Vec::new(),
            synced_count: 0,
            id_counter: 0,
            history: History::new(config.history_length),
            change_callbacks: Vec::new(),
            callback_counter: 0,
        }
    }

    /// The backing document.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The undo/redo history.
    pub fn history(&self) -> &History<Change> {
        &self.history
    }

    /// Replace all subtitles by the ones in `source` (an empty document for `None`).
    ///
    /// This is not undoable: the history is cleared and callbacks receive `ChangeEvent::Reload`.
    pub fn load_xml(&mut self, source: Option<&str>) -> Result<()> {
        self.store.init(source)?;

        let mut synced = Vec::new();
        let mut unsynced = Vec::new();
        for node in self.store.subtitle_nodes() {
            let subtitle = self.make_item(node)?;
            if (subtitle.start_time < 0) != (subtitle.end_time < 0) {
                warn!("subtitle {} has only one of its times set, treating it as unsynced", subtitle.id);
            }
            if subtitle.is_synced() {
                synced.push(subtitle);
            } else {
                unsynced.push(subtitle);
            }
        }
        synced.sort_by_key(|subtitle| subtitle.start_time);

        self.synced_count = synced.len();
        synced.extend(unsynced);
        self.subtitles = synced;
        self.sync_document_order()?;

        debug!("loaded {} subtitles ({} synced)", self.subtitles.len(), self.synced_count);
        self.history.reset();
        self.emit_change(ChangeEvent::Reload, None);
        Ok(())
    }

    /// Decode `content` with `encoding` and load it like `load_xml()`.
    pub fn load_bytes(&mut self, content: &[u8], encoding: &'static Encoding) -> Result<()> {
        let source = decode_bytes_to_string(content, encoding)?;
        self.load_xml(Some(&source))
    }

    /// Add a blank synced subtitle for every synced subtitle in `source`.
    ///
    /// Used when translating: the timings of the base language are reused. This is not undoable:
    /// the history is cleared (recorded positions would be stale) and no callbacks are called.
    pub fn add_subtitles_from_base_language(&mut self, source: &str) -> Result<()>
    where
        S: Default,
    {
        let mut base = S::default();
        base.init(Some(source))?;

        let mut timings = Vec::new();
        for node in base.subtitle_nodes() {
            let (start_time, end_time) = (base.start_time(node)?, base.end_time(node)?);
            if start_time >= 0 && end_time >= 0 {
                timings.push((start_time, end_time));
            }
        }
        timings.sort_by_key(|&(start_time, _)| start_time);

        for &(start_time, end_time) in &timings {
            let pos = self.subtitles[..self.synced_count].partition_point(|s| s.start_time <= start_time);
            self.insert_at(pos, Some(start_time), Some(end_time), None)?;
        }
        debug!("added {} timings from the base language", timings.len());
        self.history.reset();
        Ok(())
    }

    /// Serialize the backing document.
    pub fn to_markup(&self) -> Result<String> {
        self.store.to_markup()
    }

    /// Register a callback that is called after every change.
    pub fn add_change_callback<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&ChangeEvent) + 'static,
    {
        let id = CallbackId(self.callback_counter);
        self.callback_counter += 1;
        self.change_callbacks.push((id, Box::new(callback)));
        id
    }

    /// Unregister a callback. Returns `false` if it was not registered.
    pub fn remove_change_callback(&mut self, id: CallbackId) -> bool {
        match self.change_callbacks.iter().position(|(cb_id, _)| *cb_id == id) {
            Some(pos) => {
                self.change_callbacks.remove(pos);
                true
            }
            None => false,
        }
    }

    fn emit_change(&mut self, event: ChangeEvent, change: Option<Change>) {
        if let Some(change) = change {
            self.history.append(change);
        }
        trace!("notifying {} callback(s) of {:?}", self.change_callbacks.len(), event);
        for (_, callback) in self.change_callbacks.iter_mut() {
            callback(&event);
        }
    }

    fn next_id(&mut self) -> SubtitleId {
        let id = SubtitleId(self.id_counter);
        self.id_counter += 1;
        id
    }

    fn make_item(&mut self, node: NodeId) -> Result<StoredSubtitle> {
        let start_time = normalize_time(self.store.start_time(node)?);
        let end_time = normalize_time(self.store.end_time(node)?);
        let content = self.store.content(node)?;
        Ok(StoredSubtitle::new(self.next_id(), node, start_time, end_time, content))
    }

    /// Number of subtitles.
    pub fn len(&self) -> usize {
        self.subtitles.len()
    }

    /// `true` if there are no subtitles.
    pub fn is_empty(&self) -> bool {
        self.subtitles.is_empty()
    }

    /// Number of synced subtitles; they occupy the indices `0..synced_count()`.
    pub fn synced_count(&self) -> usize {
        self.synced_count
    }

    /// All subtitles in list order.
    pub fn subtitles(&self) -> &[StoredSubtitle] {
        &self.subtitles
    }

    /// Iterate over all subtitles in list order.
    pub fn iter(&self) -> std::slice::Iter<StoredSubtitle> {
        self.subtitles.iter()
    }

    /// The subtitle at `index`.
    pub fn subtitle(&self, index: usize) -> Result<&StoredSubtitle> {
        self.subtitles
            .get(index)
            .ok_or_else(|| ErrorKind::InvalidIndex(index, self.subtitles.len()).into())
    }

    /// The subtitle with the identifier `id`.
    pub fn get(&self, id: SubtitleId) -> Option<&StoredSubtitle> {
        self.subtitles.iter().find(|subtitle| subtitle.id == id)
    }

    /// Position of the subtitle `id` in the list.
    pub fn get_index(&self, id: SubtitleId) -> Option<usize> {
        self.subtitles.iter().position(|subtitle| subtitle.id == id)
    }

    fn index_of(&self, id: SubtitleId) -> Result<usize> {
        self.get_index(id).ok_or_else(|| ErrorKind::UnknownSubtitle(id).into())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.subtitles.len() {
            Ok(())
        } else {
            Err(ErrorKind::InvalidIndex(index, self.subtitles.len()).into())
        }
    }

    /// The subtitle following `id`, `None` for the last one.
    pub fn next_subtitle(&self, id: SubtitleId) -> Option<&StoredSubtitle> {
        self.get_index(id).and_then(|index| self.subtitles.get(index + 1))
    }

    /// The subtitle preceding `id`, `None` for the first one.
    pub fn prev_subtitle(&self, id: SubtitleId) -> Option<&StoredSubtitle> {
        match self.get_index(id) {
            Some(index) if index > 0 => self.subtitles.get(index - 1),
            _ => None,
        }
    }

    /// The synced subtitle with the latest start time.
    pub fn last_synced_subtitle(&self) -> Option<&StoredSubtitle> {
        if self.synced_count > 0 {
            self.subtitles.get(self.synced_count - 1)
        } else {
            None
        }
    }

    /// The first subtitle that still needs syncing.
    pub fn first_unsynced_subtitle(&self) -> Option<&StoredSubtitle> {
        self.subtitles.get(self.synced_count)
    }

    /// The second subtitle that still needs syncing.
    pub fn second_unsynced_subtitle(&self) -> Option<&StoredSubtitle> {
        self.subtitles.get(self.synced_count + 1)
    }

    /// `true` if any subtitle has no content.
    pub fn needs_any_transcribed(&self) -> bool {
        self.subtitles.iter().any(|subtitle| subtitle.is_empty())
    }

    /// `true` if any subtitle is unsynced.
    pub fn needs_any_synced(&self) -> bool {
        self.synced_count < self.subtitles.len()
    }

    /// Index of the first synced subtitle whose end time is after `time`.
    ///
    /// Binary search over the synced subtitles; `None` if no subtitle ends after `time`.
    pub fn index_of_first_subtitle_after(&self, time: i64) -> Option<usize> {
        let synced = &self.subtitles[..self.synced_count];
        match synced.last() {
            Some(last) if last.end_time > time => Some(synced.partition_point(|subtitle| subtitle.end_time <= time)),
            _ => None,
        }
    }

    /// The subtitle shown at `time`.
    pub fn subtitle_at(&self, time: i64) -> Option<&StoredSubtitle> {
        self.index_of_first_subtitle_after(time)
            .map(|index| &self.subtitles[index])
            .filter(|subtitle| subtitle.is_at(time))
    }

    /// All synced subtitles shown at some point in `start_time..end_time`.
    pub fn get_subtitles_for_time(&self, start_time: i64, end_time: i64) -> Vec<&StoredSubtitle> {
        match self.index_of_first_subtitle_after(start_time) {
            Some(first) => self.subtitles[first..self.synced_count]
                .iter()
                .take_while(|subtitle| subtitle.start_time < end_time)
                .collect(),
            None => Vec::new(),
        }
    }

    /// `true` if `undo()` would change something.
    pub fn can_undo(&self) -> bool {
        self.history.has_undo()
    }

    /// `true` if `redo()` would change something.
    pub fn can_redo(&self) -> bool {
        self.history.has_redo()
    }

    /// Revert the most recent change. Returns `false` if there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        let change = match self.history.get_undo() {
            Some(change) => change,
            None => return Ok(false),
        };
        debug!("undo {:?}", change);

        match change {
            Change::Update {
                pos,
                new_pos,
                from_content,
                from_start_time,
                from_end_time,
                ..
            } => self.update_subtitle_by_pos(new_pos, pos, from_content, from_start_time.zip(from_end_time))?,
            Change::Insert { pos, previous_timing, .. } => self.remove_subtitle_by_pos(pos, Some(previous_timing))?,
            Change::Remove {
                pos,
                content,
                start_time,
                end_time,
            } => self.insert_subtitle_by_pos(pos, Some(content), Some(start_time), Some(end_time), None)?,
        }
        Ok(true)
    }

    /// Reapply the most recently undone change. Returns `false` if there was nothing to redo.
    pub fn redo(&mut self) -> Result<bool> {
        let change = match self.history.get_redo() {
            Some(change) => change,
            None => return Ok(false),
        };
        debug!("redo {:?}", change);

        match change {
            Change::Update {
                pos,
                new_pos,
                to_content,
                to_start_time,
                to_end_time,
                ..
            } => self.update_subtitle_by_pos(pos, new_pos, to_content, to_start_time.zip(to_end_time))?,
            Change::Insert {
                pos,
                content,
                start_time,
                end_time,
                previous_timing,
            } => self.insert_subtitle_by_pos(pos, content, start_time, end_time, Some(previous_timing))?,
            Change::Remove { pos, .. } => self.remove_subtitle_by_pos(pos, None)?,
        }
        Ok(true)
    }

    /// Insert an empty subtitle directly before `anchor` (at the end for `None`).
    ///
    /// The new subtitle is unsynced unless the anchor is synced:
    ///  - between two synced subtitles, the time from the start of the previous subtitle to the end
    ///    of the anchor is split in three and the new subtitle takes the middle third
    ///  - before the first subtitle, the new subtitle takes the first half of the anchor's time
    ///    span, starting at 0
    ///
    /// The neighbours are shortened accordingly. If the anchor overlaps the subtitle after it, the
    /// split ends at the start of that subtitle instead of the anchor's end.
    pub fn insert_subtitle_before(&mut self, anchor: Option<SubtitleId>) -> Result<SubtitleId> {
        let pos = match anchor {
            Some(id) => self.index_of(id)?,
            None => self.subtitles.len(),
        };

        let mut previous_timing = PreviousTiming::default();
        let mut times = None;
        if anchor.is_some() && self.subtitles[pos].is_synced() {
            let other = &self.subtitles[pos];
            // the anchor's new start must not pass the start of the subtitle after it
            let span_end = match self.subtitles.get(pos + 1) {
                Some(next) if pos + 1 < self.synced_count => other.end_time.min(next.start_time),
                _ => other.end_time,
            };
            if pos > 0 {
                // synced because it precedes a synced subtitle
                let first = &self.subtitles[pos - 1];
                // an anchor ending before `first` starts leaves no room: all three parts collapse
                let total_time = (span_end - first.start_time).max(0);
                let duration_split = total_time / 3;
                let start_time = first.start_time + duration_split;
                let end_time = start_time + duration_split;
                previous_timing.prev_end = Some(TimingAdjustment {
                    from: first.end_time,
                    to: start_time,
                });
                previous_timing.next_start = Some(TimingAdjustment {
                    from: other.start_time,
                    to: end_time,
                });
                times = Some((start_time, end_time));
            } else {
                let end_time = span_end / 2;
                previous_timing.next_start = Some(TimingAdjustment {
                    from: other.start_time,
                    to: end_time,
                });
                times = Some((0, end_time));
            }
        }

        self.apply_neighbour_timing(pos, &previous_timing, |adjustment| adjustment.to)?;
        let start_time = times.map(|(start_time, _)| start_time);
        let end_time = times.map(|(_, end_time)| end_time);
        let id = self.insert_at(pos, start_time, end_time, None)?;

        debug!("inserted subtitle {} at {}", id, pos);
        let change = Change::Insert {
            pos,
            content: None,
            start_time,
            end_time,
            previous_timing,
        };
        self.emit_change(ChangeEvent::Insert { subtitle: id, before: anchor }, Some(change));
        Ok(id)
    }

    /// Remove a subtitle.
    ///
    /// Undoing this recreates the subtitle at the same position with the same times and content.
    /// Neighbour times that were adjusted when it was inserted are left as they are.
    pub fn remove_subtitle(&mut self, id: SubtitleId) -> Result<()> {
        let pos = self.index_of(id)?;
        let subtitle = &self.subtitles[pos];
        let change = Change::Remove {
            pos,
            content: subtitle.content.clone(),
            start_time: subtitle.start_time,
            end_time: subtitle.end_time,
        };

        self.remove_at(pos)?;
        debug!("removed subtitle {} at {}", id, pos);
        self.emit_change(ChangeEvent::Remove { subtitle: id }, Some(change));
        Ok(())
    }

    /// Set both times of a subtitle.
    ///
    /// Negative times unset the time. The subtitle is moved if needed so that synced subtitles
    /// stay sorted in front of the unsynced ones.
    pub fn update_subtitle_time(&mut self, id: SubtitleId, start_time: i64, end_time: i64) -> Result<()> {
        let (start_time, end_time) = (normalize_time(start_time), normalize_time(end_time));
        let pos = self.index_of(id)?;
        let (from_start_time, from_end_time) = (self.subtitles[pos].start_time, self.subtitles[pos].end_time);

        self.set_times(pos, start_time, end_time)?;
        let new_pos = self.sorted_position(pos);
        self.relocate(pos, new_pos)?;

        debug!("subtitle {}: time {}..{} -> {}..{}", id, from_start_time, from_end_time, start_time, end_time);
        let change = Change::Update {
            pos,
            new_pos,
            from_content: None,
            to_content: None,
            from_start_time: Some(from_start_time),
            from_end_time: Some(from_end_time),
            to_start_time: Some(start_time),
            to_end_time: Some(end_time),
        };
        self.emit_change(ChangeEvent::Update { subtitle: id }, Some(change));
        Ok(())
    }

    /// Replace the content of a subtitle.
    ///
    /// The content is stored the way the document holds it; for `.srt` lines are trimmed and blank
    /// lines dropped.
    pub fn update_subtitle_content(&mut self, id: SubtitleId, content: &str) -> Result<()> {
        let pos = self.index_of(id)?;
        let from_content = self.subtitles[pos].content.clone();
        let to_content = self.set_content(pos, content)?;

        debug!("subtitle {}: content updated", id);
        let change = Change::Update {
            pos,
            new_pos: pos,
            from_content: Some(from_content),
            to_content: Some(to_content),
            from_start_time: None,
            from_end_time: None,
            to_start_time: None,
            to_end_time: None,
        };
        self.emit_change(ChangeEvent::Update { subtitle: id }, Some(change));
        Ok(())
    }

    // The `*_by_pos` functions replay history records. They are not recorded themselves.

    fn update_subtitle_by_pos(&mut self, pos: usize, new_pos: usize, content: Option<String>, times: Option<(i64, i64)>) -> Result<()> {
        self.check_index(pos)?;
        self.check_index(new_pos)?;
        if let Some((start_time, end_time)) = times {
            self.set_times(pos, start_time, end_time)?;
        }
        if let Some(content) = content {
            self.set_content(pos, &content)?;
        }
        self.relocate(pos, new_pos)?;

        let id = self.subtitles[new_pos].id;
        self.emit_change(ChangeEvent::Update { subtitle: id }, None);
        Ok(())
    }

    fn insert_subtitle_by_pos(
        &mut self,
        pos: usize,
        content: Option<String>,
        start_time: Option<i64>,
        end_time: Option<i64>,
        previous_timing: Option<PreviousTiming>,
    ) -> Result<()> {
        if pos > self.subtitles.len() {
            bail!(ErrorKind::InvalidIndex(pos, self.subtitles.len()));
        }
        if let Some(previous_timing) = previous_timing {
            self.apply_neighbour_timing(pos, &previous_timing, |adjustment| adjustment.to)?;
        }
        let id = self.insert_at(pos, start_time, end_time, content.as_deref())?;

        let before = self.subtitles.get(pos + 1).map(|subtitle| subtitle.id);
        self.emit_change(ChangeEvent::Insert { subtitle: id, before }, None);
        Ok(())
    }

    fn remove_subtitle_by_pos(&mut self, pos: usize, previous_timing: Option<PreviousTiming>) -> Result<()> {
        self.check_index(pos)?;
        let id = self.subtitles[pos].id;
        self.remove_at(pos)?;
        if let Some(previous_timing) = previous_timing {
            // the former neighbours are now at `pos - 1` and `pos`
            self.apply_neighbour_timing(pos, &previous_timing, |adjustment| adjustment.from)?;
        }

        self.emit_change(ChangeEvent::Remove { subtitle: id }, None);
        Ok(())
    }

    /// Set the neighbour times of the gap at `pos`: the end of `pos - 1` and the start of `pos`.
    fn apply_neighbour_timing<F>(&mut self, pos: usize, previous_timing: &PreviousTiming, value: F) -> Result<()>
    where
        F: Fn(&TimingAdjustment) -> i64,
    {
        if let Some(adjustment) = &previous_timing.prev_end {
            if pos == 0 {
                bail!(ErrorKind::InvalidIndex(0, self.subtitles.len()));
            }
            let prev = pos - 1;
            self.check_index(prev)?;
            let start_time = self.subtitles[prev].start_time;
            self.set_times(prev, start_time, value(adjustment))?;
        }
        if let Some(adjustment) = &previous_timing.next_start {
            self.check_index(pos)?;
            let end_time = self.subtitles[pos].end_time;
            self.set_times(pos, value(adjustment), end_time)?;
        }
        Ok(())
    }

    /// Write both times to the document and the list and keep `synced_count` up to date.
    fn set_times(&mut self, index: usize, start_time: i64, end_time: i64) -> Result<()> {
        let node = self.subtitles[index].node;
        let was_synced = self.subtitles[index].is_synced();
        self.store.set_start_time(node, start_time)?;
        self.store.set_end_time(node, end_time)?;

        let subtitle = &mut self.subtitles[index];
        subtitle.start_time = start_time;
        subtitle.end_time = end_time;
        match (was_synced, subtitle.is_synced()) {
            (false, true) => self.synced_count += 1,
            (true, false) => self.synced_count -= 1,
            _ => {}
        }
        Ok(())
    }

    /// Write content to the document and keep what the document made of it.
    fn set_content(&mut self, index: usize, content: &str) -> Result<String> {
        let node = self.subtitles[index].node;
        self.store.set_content(node, content)?;
        let stored = self.store.content(node)?;
        self.subtitles[index].content = stored.clone();
        Ok(stored)
    }

    fn node_before(&self, pos: usize) -> Option<NodeId> {
        if pos == 0 {
            None
        } else {
            Some(self.subtitles[pos - 1].node)
        }
    }

    /// Create a subtitle at `pos` in the document and the list.
    fn insert_at(&mut self, pos: usize, start_time: Option<i64>, end_time: Option<i64>, content: Option<&str>) -> Result<SubtitleId> {
        let after = self.node_before(pos);
        let node = self.store.add_subtitle(after, start_time, end_time)?;
        let content = match content {
            Some(content) if !content.is_empty() => {
                self.store.set_content(node, content)?;
                self.store.content(node)?
            }
            _ => String::new(),
        };

        let id = self.next_id();
        let subtitle = StoredSubtitle::new(
            id,
            node,
            start_time.map_or(UNSYNCED, normalize_time),
            end_time.map_or(UNSYNCED, normalize_time),
            content,
        );
        if subtitle.is_synced() {
            self.synced_count += 1;
        }
        self.subtitles.insert(pos, subtitle);
        Ok(id)
    }

    /// Delete the subtitle at `pos` from the document and the list.
    fn remove_at(&mut self, pos: usize) -> Result<()> {
        self.store.remove_subtitle(self.subtitles[pos].node)?;
        let subtitle = self.subtitles.remove(pos);
        if subtitle.is_synced() {
            self.synced_count -= 1;
        }
        Ok(())
    }

    /// Where the subtitle at `index` belongs after its times changed.
    ///
    /// Expects `synced_count` to be up to date already. Synced subtitles stay put if they are still
    /// in order, otherwise they go behind all synced subtitles with the same or an earlier start.
    /// Subtitles that just lost their times become the first unsynced one.
    fn sorted_position(&self, index: usize) -> usize {
        let subtitle = &self.subtitles[index];
        if !subtitle.is_synced() {
            return index.max(self.synced_count);
        }

        let start_time = subtitle.start_time;
        let in_order = index < self.synced_count
            && (index == 0 || self.subtitles[index - 1].start_time <= start_time)
            && (index + 1 >= self.synced_count || start_time <= self.subtitles[index + 1].start_time);
        if in_order {
            return index;
        }

        self.subtitles
            .iter()
            .enumerate()
            .filter(|&(i, other)| i != index && other.is_synced() && other.start_time <= start_time)
            .count()
    }

    /// Move a subtitle inside the list and its document.
    fn relocate(&mut self, from: usize, to: usize) -> Result<()> {
        if from == to {
            return Ok(());
        }
        let subtitle = self.subtitles.remove(from);
        let node = subtitle.node;
        self.subtitles.insert(to, subtitle);
        let after = self.node_before(to);
        self.store.move_subtitle(node, after)?;
        trace!("moved subtitle from {} to {}", from, to);
        Ok(())
    }

    /// Reorder the document so that it matches the list.
    fn sync_document_order(&mut self) -> Result<()> {
        let list_order: Vec<NodeId> = self.subtitles.iter().map(|subtitle| subtitle.node).collect();
        if self.store.subtitle_nodes() == list_order {
            return Ok(());
        }
        for (index, &node) in list_order.iter().enumerate() {
            let after = if index == 0 { None } else { Some(list_order[index - 1]) };
            self.store.move_subtitle(node, after)?;
        }
        Ok(())
    }
}

fn normalize_time(time: i64) -> i64 {
    if time < 0 {
        UNSYNCED
    } else {
        time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synced_list(times: &[(i64, i64)]) -> (SubtitleList, Vec<SubtitleId>) {
        let mut list = SubtitleList::new();
        list.load_xml(None).unwrap();
        let mut ids = Vec::new();
        for &(start_time, end_time) in times {
            let id = list.insert_subtitle_before(None).unwrap();
            list.update_subtitle_time(id, start_time, end_time).unwrap();
            ids.push(id);
        }
        (list, ids)
    }

    fn times(list: &SubtitleList) -> Vec<(i64, i64)> {
        list.iter().map(|s| (s.start_time(), s.end_time())).collect()
    }

    #[test]
    fn binary_search_on_synced_prefix() {
        let (mut list, _) = synced_list(&[(0, 1000), (1000, 2000), (2500, 3000)]);
        list.insert_subtitle_before(None).unwrap();

        assert_eq!(list.index_of_first_subtitle_after(-5), Some(0));
        assert_eq!(list.index_of_first_subtitle_after(999), Some(0));
        assert_eq!(list.index_of_first_subtitle_after(1000), Some(1));
        assert_eq!(list.index_of_first_subtitle_after(2200), Some(2));
        assert_eq!(list.index_of_first_subtitle_after(3000), None);

        assert_eq!(list.subtitle_at(1500).map(|s| s.start_time()), Some(1000));
        assert!(list.subtitle_at(2200).is_none());
        assert!(list.subtitle_at(5000).is_none());

        let found: Vec<i64> = list.get_subtitles_for_time(500, 2600).iter().map(|s| s.start_time()).collect();
        assert_eq!(found, vec![0, 1000, 2500]);
        assert!(list.get_subtitles_for_time(3000, 4000).is_empty());
    }

    #[test]
    fn binary_search_without_synced_subtitles() {
        let mut list = SubtitleList::new();
        list.load_xml(None).unwrap();
        assert_eq!(list.index_of_first_subtitle_after(0), None);
        list.insert_subtitle_before(None).unwrap();
        assert_eq!(list.index_of_first_subtitle_after(0), None);
        assert!(list.subtitle_at(0).is_none());
    }

    #[test]
    fn time_update_keeps_partition() {
        let mut list = SubtitleList::new();
        list.load_xml(None).unwrap();
        let a = list.insert_subtitle_before(None).unwrap();
        let b = list.insert_subtitle_before(None).unwrap();
        let c = list.insert_subtitle_before(None).unwrap();

        list.update_subtitle_time(c, 2000, 3000).unwrap();
        assert_eq!(list.get_index(c), Some(0));
        list.update_subtitle_time(a, 500, 1000).unwrap();
        assert_eq!(list.subtitles().iter().map(|s| s.id()).collect::<Vec<_>>(), vec![a, c, b]);
        assert_eq!(list.synced_count(), 2);

        // moving a synced subtitle behind another one
        list.update_subtitle_time(a, 4000, 5000).unwrap();
        assert_eq!(list.subtitles().iter().map(|s| s.id()).collect::<Vec<_>>(), vec![c, a, b]);

        // unsetting times makes it the first unsynced subtitle
        list.update_subtitle_time(c, -1, -1).unwrap();
        assert_eq!(list.subtitles().iter().map(|s| s.id()).collect::<Vec<_>>(), vec![a, c, b]);
        assert_eq!(list.synced_count(), 1);
        assert_eq!(list.first_unsynced_subtitle().map(|s| s.id()), Some(c));
        assert_eq!(list.second_unsynced_subtitle().map(|s| s.id()), Some(b));
        assert_eq!(list.last_synced_subtitle().map(|s| s.id()), Some(a));

        // the document follows the list order
        let nodes: Vec<NodeId> = list.iter().map(|s| s.node()).collect();
        assert_eq!(list.store().subtitle_nodes(), nodes);

        list.undo().unwrap();
        assert_eq!(list.subtitles().iter().map(|s| s.id()).collect::<Vec<_>>(), vec![c, a, b]);
        assert_eq!(times(&list), vec![(2000, 3000), (4000, 5000), (-1, -1)]);
        list.undo().unwrap();
        assert_eq!(times(&list), vec![(500, 1000), (2000, 3000), (-1, -1)]);
        list.redo().unwrap();
        list.redo().unwrap();
        assert_eq!(times(&list), vec![(4000, 5000), (-1, -1), (-1, -1)]);
    }

    #[test]
    fn front_insert_splits_first_subtitle() {
        let (mut list, ids) = synced_list(&[(1000, 3000)]);
        let new = list.insert_subtitle_before(Some(ids[0])).unwrap();
        assert_eq!(list.get_index(new), Some(0));
        assert_eq!(times(&list), vec![(0, 1500), (1500, 3000)]);
        assert_eq!(list.synced_count(), 2);

        list.undo().unwrap();
        assert_eq!(times(&list), vec![(1000, 3000)]);
        list.redo().unwrap();
        assert_eq!(times(&list), vec![(0, 1500), (1500, 3000)]);
    }

    #[test]
    fn insert_before_unsynced_anchor_is_unsynced() {
        let mut list = SubtitleList::new();
        list.load_xml(None).unwrap();
        let anchor = list.insert_subtitle_before(None).unwrap();
        let new = list.insert_subtitle_before(Some(anchor)).unwrap();
        assert!(!list.get(new).unwrap().is_synced());
        assert_eq!(list.get_index(new), Some(0));
        assert_eq!(list.synced_count(), 0);
    }

    #[test]
    fn unknown_references_are_errors() {
        let mut list = SubtitleList::new();
        list.load_xml(None).unwrap();
        let id = list.insert_subtitle_before(None).unwrap();
        list.remove_subtitle(id).unwrap();

        assert!(list.remove_subtitle(id).is_err());
        assert!(list.update_subtitle_content(id, "x").is_err());
        assert!(list.update_subtitle_time(id, 0, 1).is_err());
        assert!(list.insert_subtitle_before(Some(id)).is_err());
        assert!(list.subtitle(0).is_err());
        assert!(list.next_subtitle(id).is_none());
        assert!(list.prev_subtitle(id).is_none());
        // failed calls are not recorded
        assert_eq!(list.history().num_undo(), 2);
    }

    #[test]
    fn base_language_timings() {
        let mut list = SubtitleList::new();
        list.load_xml(None).unwrap();
        list.insert_subtitle_before(None).unwrap();

        let base = "1\n00:00:05,000 --> 00:00:06,000\nlater\n\n2\n00:00:01,000 --> 00:00:02,000\nearlier\n\n3\n99:59:59,999 --> 99:59:59,999\nunsynced\n\n";
        list.add_subtitles_from_base_language(base).unwrap();

        assert_eq!(times(&list), vec![(1000, 2000), (5000, 6000), (-1, -1)]);
        assert_eq!(list.synced_count(), 2);
        assert!(list.iter().all(|s| s.is_empty()));
        assert!(!list.can_undo());
    }

    #[test]
    fn undo_after_base_language_is_noop() {
        let mut list = SubtitleList::new();
        list.load_xml(None).unwrap();
        let inserted = list.insert_subtitle_before(None).unwrap();
        list.add_subtitles_from_base_language("1\n00:00:01,000 --> 00:00:02,000\nbase\n\n")
            .unwrap();

        assert!(!list.undo().unwrap());
        assert_eq!(times(&list), vec![(1000, 2000), (-1, -1)]);
        assert_eq!(list.get_index(inserted), Some(1));

        // later changes are undoable again
        list.update_subtitle_content(inserted, "text").unwrap();
        assert!(list.undo().unwrap());
        assert_eq!(list.len(), 2);
        assert!(list.get(inserted).unwrap().is_empty());
    }

    #[test]
    fn content_is_kept_as_stored() {
        let mut list = SubtitleList::new();
        list.load_xml(None).unwrap();
        let blank = list.insert_subtitle_before(None).unwrap();
        let padded = list.insert_subtitle_before(None).unwrap();
        list.update_subtitle_content(blank, "  \n").unwrap();
        list.update_subtitle_content(padded, "  first  \n\n second").unwrap();

        assert!(list.get(blank).unwrap().is_empty());
        assert!(list.needs_any_transcribed());
        assert_eq!(list.get(padded).unwrap().content(), "first\nsecond");
        assert_eq!(
            list.history().clone().get_undo(),
            Some(Change::Update {
                pos: 1,
                new_pos: 1,
                from_content: Some(String::new()),
                to_content: Some("first\nsecond".to_string()),
                from_start_time: None,
                from_end_time: None,
                to_start_time: None,
                to_end_time: None,
            })
        );

        let mut reloaded = SubtitleList::new();
        reloaded.load_xml(Some(&list.to_markup().unwrap())).unwrap();
        let contents = |list: &SubtitleList| list.iter().map(|s| s.content().to_string()).collect::<Vec<_>>();
        assert_eq!(contents(&reloaded), contents(&list));
    }
}
