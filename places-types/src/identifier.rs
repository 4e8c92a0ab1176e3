// SPDX-License-Identifier: GPL-3.0-only

//! Canonical entry identifiers.
//!
//! Every listable entry is addressed as
//! `devices:///<percent-encoded component>.<suffix>`. Listeners correlate
//! created, attribute-changed and removed events purely by this string, so
//! the encoding must stay byte-for-byte stable between listing passes and
//! live events.

use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};

/// Root of the aggregated listing.
pub const AGGREGATION_ROOT: &str = "devices:///";

/// Everything except unreserved URI characters is escaped, including `/`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuffixTag {
    BlockDevice,
    VirtualMount,
    UserDir,
    StashedRemote,
}

impl SuffixTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BlockDevice => "localdisk",
            Self::VirtualMount => "gvfsmp",
            Self::UserDir => "userdir",
            Self::StashedRemote => "remote",
        }
    }

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "localdisk" => Some(Self::BlockDevice),
            "gvfsmp" => Some(Self::VirtualMount),
            "userdir" => Some(Self::UserDir),
            "remote" => Some(Self::StashedRemote),
            _ => None,
        }
    }
}

impl fmt::Display for SuffixTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

pub fn decode_component(encoded: &str) -> String {
    percent_decode_str(encoded).decode_utf8_lossy().into_owned()
}

pub fn make_identifier(component: &str, tag: SuffixTag) -> String {
    format!("{AGGREGATION_ROOT}{}.{}", encode_component(component), tag)
}

/// Identifier for a block device, built from the last path segment of either
/// the device node (`/dev/sda1`) or the backend object path.
pub fn block_identifier(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    make_identifier(name, SuffixTag::BlockDevice)
}

/// Split an identifier back into its decoded component and suffix tag.
pub fn parse_identifier(identifier: &str) -> Option<(String, SuffixTag)> {
    let rest = identifier.strip_prefix(AGGREGATION_ROOT)?;
    let (encoded, suffix) = rest.rsplit_once('.')?;
    let tag = SuffixTag::from_suffix(suffix)?;
    if encoded.is_empty() {
        return None;
    }
    Some((decode_component(encoded), tag))
}

pub fn is_aggregation_root(path: &str) -> bool {
    path.trim_end_matches('/') == AGGREGATION_ROOT.trim_end_matches('/')
}
