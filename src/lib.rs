// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#![deny(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

//! This crate provides the model behind a subtitle editor: an ordered list of subtitles persisted
//! in a document, with undo/redo and bookkeeping of which subtitles are already synced.
//!
//! Synced subtitles (both times set) are kept sorted by start time in front of the unsynced ones.
//! Every change goes through `SubtitleList`, which updates the document, records the inverse in
//! its `History` and notifies registered callbacks.
//!
//! ```
//! use subedit::{Subtitle, SubtitleList};
//!
//! let mut list = SubtitleList::new();
//! list.load_xml(None).unwrap();
//! let id = list.insert_subtitle_before(None).unwrap();
//! list.update_subtitle_time(id, 1000, 2500).unwrap();
//! list.update_subtitle_content(id, "Hello *world*").unwrap();
//!
//! assert_eq!(list.synced_count(), 1);
//! assert_eq!(list.get(id).unwrap().character_count(), 11);
//!
//! list.undo().unwrap();
//! assert_eq!(list.get(id).unwrap().content(), "");
//! ```

#[macro_use]
extern crate error_chain;

/// Document formats a subtitle list can be stored in.
pub mod formats;

/// Types that represent a time point.
pub mod timetypes;

/// Error-chain generated error types.
pub mod errors;

/// The contract between a subtitle list and its backing document.
pub mod store;

/// Subtitle values and the views on them.
pub mod subtitle;

pub mod markup;

/// Circular undo/redo log.
pub mod history;

/// The subtitle list.
pub mod list;

/// Editing the text of one subtitle.
pub mod edit;

/// Settings.
pub mod config;

pub use config::SubtitleListConfig;
pub use edit::CurrentEditManager;
pub use formats::srt::SrtDocument;
pub use history::History;
pub use list::{CallbackId, Change, ChangeEvent, ChangeKind, SubtitleList};
pub use store::{NodeId, SubtitleStore};
pub use subtitle::{DraftSubtitle, StoredSubtitle, Subtitle, SubtitleId};
