// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use combine::error::StreamError;
use combine::parser::char::{char, digit};
use combine::stream::StreamErrorFor;
use combine::{many1, optional, satisfy, Parser, Stream};

/// Returns the string without a UTF-8 BOM. Unchanged if string does not start with one.
pub fn split_bom(s: &str) -> (&str, &str) {
    if s.starts_with('\u{feff}') {
        s.split_at('\u{feff}'.len_utf8())
    } else {
        ("", s)
    }
}

/// Parses whitespaces and tabs.
pub fn ws<Input>() -> impl Parser<Input, Output = char>
where
    Input: Stream<Token = char>,
{
    satisfy(|c: char| c == ' ' || c == '\t').expected("tab or space")
}

/// Matches a positive or negative integer number.
pub fn number_i64<Input>() -> impl Parser<Input, Output = i64>
where
    Input: Stream<Token = char>,
{
    (optional(char('-')), many1(digit()))
        .and_then(|(sign, digits): (Option<char>, String)| {
            digits
                .parse::<i64>()
                .map(|n| if sign.is_some() { -n } else { n })
                .map_err(StreamErrorFor::<Input>::other)
        })
        .expected("positive or negative number")
}

#[cfg(test)]
mod tests {
    use super::*;
    use combine::eof;

    #[test]
    fn test_split_bom() {
        assert_eq!(split_bom("\u{feff}abc"), ("\u{feff}", "abc"));
        assert_eq!(split_bom("bla"), ("", "bla"));
        assert_eq!(split_bom(""), ("", ""));
    }

    #[test]
    fn test_number_i64() {
        assert_eq!(number_i64().parse("42").ok(), Some((42, "")));
        assert_eq!(number_i64().parse("-7,5").ok(), Some((-7, ",5")));
        assert!((number_i64(), eof()).parse("12a").is_err());
        assert!(number_i64::<&str>().parse("abc").is_err());
    }
}
