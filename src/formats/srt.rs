// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use self::errors::ErrorKind::*;
use self::errors::*;
use crate::errors::{ErrorKind as SubtitleErrorKind, Result as SubtitleResult};
use crate::formats::common::*;
use crate::store::{NodeId, SubtitleStore};
use crate::timetypes::TimePoint;

use std::iter::once;

use itertools::Itertools;

use combine::parser::char::{char, string};
use combine::{eof, skip_many, Parser};

/// `.srt`-parser-specific errors
#[allow(missing_docs)]
pub mod errors {
    // see https://docs.rs/error-chain/0.12.4/error_chain/
    // this error type might be overkill, but that way it stays consistent with
    // the crate wide error type
    error_chain! {
        errors {
            ExpectedIndexLine(line: String) {
                display("expected SubRip index line, found '{}'", line)
            }
            ExpectedTimestampLine(line: String) {
                display("expected SubRip timespan line, found '{}'", line)
            }
            ErrorAtLine(line_num: usize) {
                display("parse error at line `{}`", line_num)
            }
        }
    }
}

/// Timestamp written for an unset start or end time.
///
/// SubRip has no notion of unsynced lines, so they are stored with this placeholder and read
/// back as unset.
pub const UNSYNCED_TIMESTAMP: &str = "99:59:59,999";

fn unsynced_timepoint() -> TimePoint {
    TimePoint::from_components(99, 59, 59, 999)
}

/// The parsing works as a finite state machine. These are the states in it.
enum SrtParserState {
    // emptyline or index follows
    Emptyline,

    /// timing line follows
    Index,

    /// dialog or emptyline follows
    Timing(Option<TimePoint>, Option<TimePoint>),

    /// emptyline follows
    Dialog(Option<TimePoint>, Option<TimePoint>, Vec<String>),
}

#[derive(Debug, Clone, Default)]
/// A `.srt` document used as backing store of a subtitle list.
pub struct SrtDocument {
    v: Vec<SrtLine>,

    /// next free node handle, never reset so stale handles can not alias new nodes
    next_node: u64,
}

#[derive(Debug, Clone)]
/// A complete description of one SubRip subtitle line.
struct SrtLine {
    node: NodeId,

    /// start and end time of subtitle, `None` if unsynced
    start: Option<TimePoint>,
    end: Option<TimePoint>,

    /// the dialog/text lines of the `SrtLine`
    texts: Vec<String>,
}

impl SrtDocument {
    /// Creates an empty document.
    pub fn new() -> SrtDocument {
        SrtDocument::default()
    }

    /// Parse a `.srt` subtitle string to `SrtDocument`.
    pub fn parse(s: &str) -> SubtitleResult<SrtDocument> {
        let mut doc = SrtDocument::new();
        doc.init(Some(s))?;
        Ok(doc)
    }

    /// Number of subtitle lines in the document.
    pub fn len(&self) -> usize {
        self.v.len()
    }

    /// Returns `true` if the document has no subtitle lines.
    pub fn is_empty(&self) -> bool {
        self.v.is_empty()
    }

    fn alloc_node(&mut self) -> NodeId {
        let node = NodeId(self.next_node);
        self.next_node += 1;
        node
    }

    fn position(&self, node: NodeId) -> SubtitleResult<usize> {
        self.v
            .iter()
            .position(|line| line.node == node)
            .ok_or_else(|| SubtitleErrorKind::UnknownNode(node).into())
    }

    fn line(&self, node: NodeId) -> SubtitleResult<&SrtLine> {
        let idx = self.position(node)?;
        Ok(&self.v[idx])
    }

    fn line_mut(&mut self, node: NodeId) -> SubtitleResult<&mut SrtLine> {
        let idx = self.position(node)?;
        Ok(&mut self.v[idx])
    }

    /// Index at which a node placed after `after` lands.
    fn insert_position(&self, after: Option<NodeId>) -> SubtitleResult<usize> {
        match after {
            Some(after) => Ok(self.position(after)? + 1),
            None => Ok(0),
        }
    }
}

/// Implements parse functions.
impl SrtDocument {
    fn parse_lines(&mut self, i: &str) -> Result<Vec<SrtLine>> {
        use self::SrtParserState::*;

        let mut result: Vec<SrtLine> = Vec::new();

        // remove utf-8 bom
        let (_, s) = split_bom(i);

        let mut state: SrtParserState = Emptyline; // expect emptyline or index

        // the `once("")` is there so no last entry gets ignored
        for (line_num, line) in s.lines().chain(once("")).enumerate() {
            state = match state {
                Emptyline => {
                    if line.trim().is_empty() {
                        Emptyline
                    } else {
                        Self::parse_index_line(line_num, line)?;
                        Index
                    }
                }
                Index => {
                    let (start, end) = Self::parse_timestamp_line(line_num, line)?;
                    Timing(start, end)
                }
                Timing(start, end) => self.state_expect_dialog(line, &mut result, start, end, Vec::new()),
                Dialog(start, end, texts) => self.state_expect_dialog(line, &mut result, start, end, texts),
            };
        }

        Ok(result)
    }

    fn state_expect_dialog(
        &mut self,
        line: &str,
        result: &mut Vec<SrtLine>,
        start: Option<TimePoint>,
        end: Option<TimePoint>,
        mut texts: Vec<String>,
    ) -> SrtParserState {
        if line.trim().is_empty() {
            result.push(SrtLine {
                node: self.alloc_node(),
                start,
                end,
                texts,
            });
            SrtParserState::Emptyline
        } else {
            texts.push(line.trim().to_string());
            SrtParserState::Dialog(start, end, texts)
        }
    }

    /// Matches a line with a single index.
    fn parse_index_line(line_num: usize, s: &str) -> Result<i64> {
        s.trim()
            .parse::<i64>()
            .chain_err(|| ExpectedIndexLine(s.to_string()))
            .chain_err(|| ErrorAtLine(line_num))
    }

    /// Matches a `SubRip` timestamp like "00:24:45,670" and returns its components.
    fn parse_timestamp<'a>() -> impl Parser<&'a str, Output = (i64, i64, i64, i64)> {
        (number_i64(), char(':'), number_i64(), char(':'), number_i64(), char(','), number_i64())
            .map(|t: (i64, char, i64, char, i64, char, i64)| (t.0, t.2, t.4, t.6))
    }

    /// Matches a `SubRip` timespan line like "00:24:45,670 --> 00:24:45,680".
    ///
    /// The placeholder timestamp stands for an unset time. Timestamps that do not fit into the
    /// millisecond range are rejected like malformed ones.
    fn parse_timestamp_line(line_num: usize, s: &str) -> Result<(Option<TimePoint>, Option<TimePoint>)> {
        let to_timepoint = |(h, m, sec, ms): (i64, i64, i64, i64)| TimePoint::checked_from_components(h, m, sec, ms);
        let synced = |t: TimePoint| if t == unsynced_timepoint() { None } else { Some(t) };

        (
            skip_many(ws()),
            Self::parse_timestamp(),
            skip_many(ws()),
            string("-->"),
            skip_many(ws()),
            Self::parse_timestamp(),
            skip_many(ws()),
            eof(),
        )
            .map(|t: ((), (i64, i64, i64, i64), (), &str, (), (i64, i64, i64, i64), (), ())| (t.1, t.5))
            .parse(s)
            .ok()
            .and_then(|((start, end), _)| Some((to_timepoint(start)?, to_timepoint(end)?)))
            .map(|(start, end)| (synced(start), synced(end)))
            .ok_or_else(|| Error::from(ExpectedTimestampLine(s.to_string())))
            .chain_err(|| ErrorAtLine(line_num))
    }
}

impl SubtitleStore for SrtDocument {
    fn init(&mut self, source: Option<&str>) -> SubtitleResult<()> {
        self.v = match source {
            Some(s) => self.parse_lines(s)?,
            None => Vec::new(),
        };
        Ok(())
    }

    fn subtitle_nodes(&self) -> Vec<NodeId> {
        self.v.iter().map(|line| line.node).collect()
    }

    fn add_subtitle(&mut self, after: Option<NodeId>, begin: Option<i64>, end: Option<i64>) -> SubtitleResult<NodeId> {
        let idx = self.insert_position(after)?;
        let node = self.alloc_node();
        self.v.insert(
            idx,
            SrtLine {
                node,
                start: begin.and_then(TimePoint::from_subtitle_time),
                end: end.and_then(TimePoint::from_subtitle_time),
                texts: Vec::new(),
            },
        );
        Ok(node)
    }

    fn remove_subtitle(&mut self, node: NodeId) -> SubtitleResult<()> {
        let idx = self.position(node)?;
        self.v.remove(idx);
        Ok(())
    }

    fn move_subtitle(&mut self, node: NodeId, after: Option<NodeId>) -> SubtitleResult<()> {
        if after == Some(node) {
            return Ok(());
        }
        let from = self.position(node)?;
        // validate `after` before touching the document
        self.insert_position(after)?;
        let line = self.v.remove(from);
        let to = match self.insert_position(after) {
            Ok(to) => to,
            Err(e) => {
                self.v.insert(from, line);
                return Err(e);
            }
        };
        self.v.insert(to, line);
        Ok(())
    }

    fn start_time(&self, node: NodeId) -> SubtitleResult<i64> {
        Ok(TimePoint::to_subtitle_time(self.line(node)?.start))
    }

    fn set_start_time(&mut self, node: NodeId, ms: i64) -> SubtitleResult<()> {
        self.line_mut(node)?.start = TimePoint::from_subtitle_time(ms);
        Ok(())
    }

    fn end_time(&self, node: NodeId) -> SubtitleResult<i64> {
        Ok(TimePoint::to_subtitle_time(self.line(node)?.end))
    }

    fn set_end_time(&mut self, node: NodeId, ms: i64) -> SubtitleResult<()> {
        self.line_mut(node)?.end = TimePoint::from_subtitle_time(ms);
        Ok(())
    }

    fn content(&self, node: NodeId) -> SubtitleResult<String> {
        Ok(self.line(node)?.texts.iter().join("\n"))
    }

    fn set_content(&mut self, node: NodeId, content: &str) -> SubtitleResult<()> {
        self.line_mut(node)?.texts = content.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect();
        Ok(())
    }

    fn to_markup(&self) -> SubtitleResult<String> {
        let timepoint_to_str = |t: Option<TimePoint>| -> String {
            match t {
                Some(t) => format!("{:02}:{:02}:{:02},{:03}", t.hours(), t.mins_comp(), t.secs_comp(), t.msecs_comp()),
                None => UNSYNCED_TIMESTAMP.to_string(),
            }
        };
        let line_to_str = |(index, line): (usize, &SrtLine)| -> String {
            format!(
                "{}\n{} --> {}\n{}\n\n",
                index + 1,
                timepoint_to_str(line.start),
                timepoint_to_str(line.end),
                line.texts.join("\n")
            )
        };

        Ok(self.v.iter().enumerate().map(line_to_str).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\u{feff}1\n00:00:01,500 --> 00:00:03,700\nline1\n\n2\n00:00:04,500 --> 00:00:08,700\nline2a\nline2b\n\n3\n99:59:59,999 --> 99:59:59,999\n\n";

    #[test]
    fn parse_srt_test() {
        let doc = SrtDocument::parse(SAMPLE).unwrap();
        let nodes = doc.subtitle_nodes();
        assert_eq!(nodes.len(), 3);

        assert_eq!(doc.start_time(nodes[0]).unwrap(), 1500);
        assert_eq!(doc.end_time(nodes[0]).unwrap(), 3700);
        assert_eq!(doc.content(nodes[1]).unwrap(), "line2a\nline2b");
        assert_eq!(doc.start_time(nodes[2]).unwrap(), -1);
        assert_eq!(doc.end_time(nodes[2]).unwrap(), -1);
        assert_eq!(doc.content(nodes[2]).unwrap(), "");
    }

    #[test]
    fn write_srt_test() {
        let mut doc = SrtDocument::new();
        let first = doc.add_subtitle(None, Some(1500), Some(3700)).unwrap();
        let second = doc.add_subtitle(Some(first), None, None).unwrap();
        doc.set_content(first, "line1").unwrap();
        doc.set_content(second, "line2").unwrap();

        let expected = "1\n00:00:01,500 --> 00:00:03,700\nline1\n\n2\n99:59:59,999 --> 99:59:59,999\nline2\n\n";
        assert_eq!(doc.to_markup().unwrap(), expected);
    }

    #[test]
    fn move_and_remove_nodes() {
        let mut doc = SrtDocument::new();
        let a = doc.add_subtitle(None, None, None).unwrap();
        let b = doc.add_subtitle(Some(a), None, None).unwrap();
        let c = doc.add_subtitle(Some(b), None, None).unwrap();
        assert_eq!(doc.subtitle_nodes(), vec![a, b, c]);

        doc.move_subtitle(c, None).unwrap();
        assert_eq!(doc.subtitle_nodes(), vec![c, a, b]);
        doc.move_subtitle(c, Some(b)).unwrap();
        assert_eq!(doc.subtitle_nodes(), vec![a, b, c]);

        doc.remove_subtitle(b).unwrap();
        assert_eq!(doc.subtitle_nodes(), vec![a, c]);
        assert!(doc.remove_subtitle(b).is_err());
        assert!(doc.move_subtitle(a, Some(b)).is_err());
        assert_eq!(doc.subtitle_nodes(), vec![a, c]);
    }

    #[test]
    fn parse_errors() {
        assert!(SrtDocument::parse("x\n00:00:01,000 --> 00:00:02,000\n").is_err());
        assert!(SrtDocument::parse("1\n00:00:01 --> 00:00:02,000\n").is_err());
        assert!(SrtDocument::parse("").unwrap().is_empty());
    }

    #[test]
    fn out_of_range_timestamp_is_parse_error() {
        let err = SrtDocument::parse("1\n9999999999999:00:00,000 --> 00:00:01,000\nx\n\n").unwrap_err();
        match err.kind() {
            SubtitleErrorKind::SrtError(ErrorAtLine(line_num)) => assert_eq!(*line_num, 1),
            kind => panic!("unexpected error kind {:?}", kind),
        }
        assert!(SrtDocument::parse("1\n00:00:01,000 --> 00:00:01,9223372036854775807\nx\n\n").is_err());
    }
}
