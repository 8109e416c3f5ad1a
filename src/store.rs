// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::errors::Result;

/// Handle to one subtitle node inside a backing document.
///
/// Handles are only meaningful for the document that created them and stay valid until the node
/// is removed or the document is re-initialized.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// The document a `SubtitleList` persists its subtitles in.
///
/// The document keeps subtitle nodes in an order of its own; `SubtitleList` moves nodes so that
/// this order mirrors the list. Times are milliseconds, negative values mean "unset".
pub trait SubtitleStore {
    /// Replace the whole document by the parsed `source`, or by an empty document for `None`.
    fn init(&mut self, source: Option<&str>) -> Result<()>;

    /// All subtitle nodes in document order.
    fn subtitle_nodes(&self) -> Vec<NodeId>;

    /// Create an empty subtitle node directly after `after` (at the front of the document for
    /// `None`) with the given times.
    fn add_subtitle(&mut self, after: Option<NodeId>, begin: Option<i64>, end: Option<i64>) -> Result<NodeId>;

    /// Remove a subtitle node from the document.
    fn remove_subtitle(&mut self, node: NodeId) -> Result<()>;

    /// Move an existing node directly after `after` (to the front for `None`).
    fn move_subtitle(&mut self, node: NodeId, after: Option<NodeId>) -> Result<()>;

    /// Start time of a node.
    fn start_time(&self, node: NodeId) -> Result<i64>;

    /// Set the start time of a node.
    fn set_start_time(&mut self, node: NodeId, ms: i64) -> Result<()>;

    /// End time of a node.
    fn end_time(&self, node: NodeId) -> Result<i64>;

    /// Set the end time of a node.
    fn set_end_time(&mut self, node: NodeId, ms: i64) -> Result<()>;

    /// Text content of a node in the inline markup format.
    fn content(&self, node: NodeId) -> Result<String>;

    /// Replace the text content of a node.
    fn set_content(&mut self, node: NodeId, content: &str) -> Result<()>;

    /// Serialize the whole document.
    fn to_markup(&self) -> Result<String>;
}
