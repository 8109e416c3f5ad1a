// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// Parser helpers shared by the document formats.
pub mod common;

/// SubRip (`.srt`) documents.
pub mod srt;

use crate::errors::*;
use encoding_rs::Encoding;

/// Helper function for text documents for byte-to-text decoding.
pub fn decode_bytes_to_string(content: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (decoded, _, replaced) = encoding.decode(content);
    if replaced {
        Err(Error::from(ErrorKind::DecodingError))
    } else {
        Ok(decoded.into_owned())
    }
}
