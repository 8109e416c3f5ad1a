// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The inline markup subtitles are written in: `**bold**`, `*italic*`, `_underline_`, with lines
//! separated by `\n`.

/// Characters that only switch formatting on or off.
const FORMAT_MARKERS: [char; 2] = ['*', '_'];

/// Reduce markup to the text a viewer actually reads.
pub fn to_plaintext(markup: &str) -> String {
    markup.chars().filter(|c| !FORMAT_MARKERS.contains(c)).collect()
}

/// Split markup into its lines.
pub fn lines(markup: &str) -> impl Iterator<Item = &str> {
    markup.split('\n')
}
