// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::errors::*;
use crate::list::SubtitleList;
use crate::store::SubtitleStore;
use crate::subtitle::{DraftSubtitle, StoredSubtitle, Subtitle, SubtitleId};

use log::{debug, warn};

/// Tracks the one subtitle whose text is currently being edited.
///
/// Edits go to a `DraftSubtitle`; the list is only changed by `finish(true, ..)`, which makes
/// the whole edit a single undoable change. `A` is whatever the UI needs to find the editor again.
#[derive(Debug)]
pub struct CurrentEditManager<A> {
    draft: Option<DraftSubtitle>,
    source_content: String,
    anchor: Option<A>,
}

impl<A> Default for CurrentEditManager<A> {
    fn default() -> Self {
        CurrentEditManager {
            draft: None,
            source_content: String::new(),
            anchor: None,
        }
    }
}

impl<A> CurrentEditManager<A> {
    /// Creates an idle manager.
    pub fn new() -> CurrentEditManager<A> {
        Self::default()
    }

    /// Start editing `subtitle`. An edit that is still in progress is dropped.
    pub fn start(&mut self, subtitle: &StoredSubtitle, anchor: A) {
        if let Some(draft) = &self.draft {
            warn!("edit of subtitle {} dropped without finishing", draft.stored_subtitle);
        }
        debug!("start editing subtitle {}", subtitle.id());
        self.draft = Some(subtitle.draft_subtitle());
        self.source_content = subtitle.content().to_string();
        self.anchor = Some(anchor);
    }

    /// Replace the draft content. Returns `false` (and does nothing) if no edit is in progress.
    pub fn update(&mut self, content: &str) -> bool {
        match &mut self.draft {
            Some(draft) => {
                draft.content = content.to_string();
                true
            }
            None => false,
        }
    }

    /// `true` if the draft content differs from the content the edit started with.
    ///
    /// The baseline is captured by `start()`. Changes the list makes to the subtitle afterwards
    /// (an undo, for example) do not move it, so committing writes the draft over them.
    pub fn changed(&self) -> bool {
        self.draft.as_ref().map_or(false, |draft| draft.content != self.source_content)
    }

    /// End the edit. With `commit` set, a changed draft is written to `list`.
    ///
    /// The manager is idle afterwards in every case, even if writing fails. Returns `true` if the
    /// list was updated.
    pub fn finish<S: SubtitleStore>(&mut self, commit: bool, list: &mut SubtitleList<S>) -> Result<bool> {
        let changed = self.changed();
        let draft = self.draft.take();
        self.anchor = None;
        self.source_content.clear();

        match draft {
            Some(draft) if commit && changed => {
                debug!("committing edit of subtitle {}", draft.stored_subtitle);
                list.update_subtitle_content(draft.stored_subtitle, &draft.content)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Characters per line of the draft, only if it has more than one line.
    pub fn line_counts(&self) -> Option<Vec<usize>> {
        self.draft
            .as_ref()
            .filter(|draft| draft.line_count() > 1)
            .map(|draft| draft.character_count_per_line())
    }

    /// `true` while an edit is in progress.
    pub fn in_progress(&self) -> bool {
        self.draft.is_some()
    }

    /// `true` if the edit in progress belongs to `id`.
    pub fn is_for_subtitle(&self, id: SubtitleId) -> bool {
        self.stored_subtitle() == Some(id)
    }

    /// The subtitle being edited.
    pub fn stored_subtitle(&self) -> Option<SubtitleId> {
        self.draft.as_ref().map(|draft| draft.stored_subtitle)
    }

    /// Content of the subtitle when the edit started.
    pub fn source_content(&self) -> Option<&str> {
        self.draft.as_ref().map(|_| self.source_content.as_str())
    }

    /// Current draft content.
    pub fn current_content(&self) -> Option<&str> {
        self.draft.as_ref().map(|draft| draft.content.as_str())
    }

    /// The anchor passed to `start()`.
    pub fn anchor(&self) -> Option<&A> {
        self.anchor.as_ref()
    }

    /// The draft of the edit in progress.
    pub fn draft(&self) -> Option<&DraftSubtitle> {
        self.draft.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_with_subtitle(content: &str) -> (SubtitleList, SubtitleId) {
        let mut list = SubtitleList::new();
        list.load_xml(None).unwrap();
        let id = list.insert_subtitle_before(None).unwrap();
        list.update_subtitle_content(id, content).unwrap();
        (list, id)
    }

    #[test]
    fn idle_manager() {
        let mut edit: CurrentEditManager<u32> = CurrentEditManager::new();
        assert!(!edit.in_progress());
        assert!(!edit.changed());
        assert!(!edit.update("text"));
        assert_eq!(edit.line_counts(), None);
        assert_eq!(edit.current_content(), None);
        assert_eq!(edit.source_content(), None);
        assert_eq!(edit.anchor(), None);
    }

    #[test]
    fn commit_changed_edit() {
        let (mut list, id) = list_with_subtitle("old");
        let mut edit = CurrentEditManager::new();
        edit.start(list.get(id).unwrap(), "editor-1");

        assert!(edit.in_progress());
        assert!(edit.is_for_subtitle(id));
        assert_eq!(edit.anchor(), Some(&"editor-1"));
        assert!(!edit.changed());

        edit.update("new");
        assert!(edit.changed());
        assert_eq!(edit.source_content(), Some("old"));
        assert_eq!(edit.current_content(), Some("new"));
        // the list is untouched until the edit is committed
        assert_eq!(list.get(id).unwrap().content(), "old");

        assert!(edit.finish(true, &mut list).unwrap());
        assert!(!edit.in_progress());
        assert_eq!(list.get(id).unwrap().content(), "new");

        list.undo().unwrap();
        assert_eq!(list.get(id).unwrap().content(), "old");
    }

    #[test]
    fn unchanged_or_cancelled_edit_is_not_written() {
        let (mut list, id) = list_with_subtitle("same");
        let undos = list.history().num_undo();
        let mut edit = CurrentEditManager::new();

        edit.start(list.get(id).unwrap(), ());
        edit.update("same");
        assert!(!edit.finish(true, &mut list).unwrap());

        edit.start(list.get(id).unwrap(), ());
        edit.update("different");
        assert!(!edit.finish(false, &mut list).unwrap());
        assert!(!edit.in_progress());

        assert_eq!(list.get(id).unwrap().content(), "same");
        assert_eq!(list.history().num_undo(), undos);
    }

    #[test]
    fn failed_commit_still_clears() {
        let (mut list, id) = list_with_subtitle("text");
        let mut edit = CurrentEditManager::new();
        edit.start(list.get(id).unwrap(), 0u8);
        edit.update("changed");
        list.remove_subtitle(id).unwrap();

        assert!(edit.finish(true, &mut list).is_err());
        assert!(!edit.in_progress());
    }

    #[test]
    fn baseline_is_taken_at_start() {
        let (mut list, id) = list_with_subtitle("first");
        list.update_subtitle_content(id, "second").unwrap();
        let mut edit = CurrentEditManager::new();
        edit.start(list.get(id).unwrap(), ());
        edit.update("first");

        // the list goes back to "first" while the draft still compares against "second"
        list.undo().unwrap();
        assert_eq!(list.get(id).unwrap().content(), "first");
        assert!(edit.changed());
        assert_eq!(edit.source_content(), Some("second"));

        assert!(edit.finish(true, &mut list).unwrap());
        assert_eq!(list.get(id).unwrap().content(), "first");
        assert_eq!(list.history().num_undo(), 3);
    }

    #[test]
    fn line_counts_only_for_multiple_lines() {
        let (list, id) = list_with_subtitle("one line");
        let mut edit = CurrentEditManager::new();
        edit.start(list.get(id).unwrap(), ());
        assert_eq!(edit.line_counts(), None);

        edit.update("**two**\nlines");
        assert_eq!(edit.line_counts(), Some(vec![3, 5]));
    }
}
