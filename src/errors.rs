// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::store::NodeId;
use crate::subtitle::SubtitleId;

pub use crate::formats::srt::errors as srt_errors;

// see https://docs.rs/error-chain/0.12.4/error_chain/
#[cfg_attr(rustfmt, rustfmt_skip)]
error_chain! {
    links {
        SrtError(srt_errors::Error, srt_errors::ErrorKind)
        /// Parsing a `.srt` document failed.
        ;
    }

    errors {
        /// An index does not point into the subtitle list.
        InvalidIndex(index: usize, len: usize) {
            description("subtitle index out of range")
            display("subtitle index {} is out of range for a list of {} subtitles", index, len)
        }

        /// The subtitle is not (or no longer) part of the list.
        UnknownSubtitle(id: SubtitleId) {
            description("unknown subtitle")
            display("subtitle '{}' is not part of this list", id)
        }

        /// The backing document has no node with this handle.
        UnknownNode(node: NodeId) {
            description("unknown document node")
            display("no subtitle node {:?} exists in the document", node)
        }

        /// The byte stream could not be decoded with the given character encoding.
        DecodingError {
            description("decoding the byte stream failed")
        }
    }
}
