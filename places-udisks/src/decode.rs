// SPDX-License-Identifier: GPL-3.0-only

//! Conversions from UDisks2 wire values to engine models.

use places_types::PropertyField;

pub const BLOCK_INTERFACE: &str = "org.freedesktop.UDisks2.Block";
pub const FILESYSTEM_INTERFACE: &str = "org.freedesktop.UDisks2.Filesystem";
pub const ENCRYPTED_INTERFACE: &str = "org.freedesktop.UDisks2.Encrypted";

/// UDisks2 byte strings are NUL terminated and may carry trailing garbage.
pub fn byte_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

pub fn mount_points(raw: Vec<Vec<u8>>) -> Vec<String> {
    raw.iter()
        .map(|mp| byte_string(mp))
        .filter(|mp| !mp.is_empty())
        .collect()
}

/// Watched property for a `PropertiesChanged` member, if it is one.
pub fn property_field(interface: &str, property: &str) -> Option<PropertyField> {
    match (interface, property) {
        (BLOCK_INTERFACE, "IdLabel") => Some(PropertyField::IdLabel),
        (BLOCK_INTERFACE, "Size") => Some(PropertyField::Size),
        (BLOCK_INTERFACE, "IdType") => Some(PropertyField::IdType),
        (FILESYSTEM_INTERFACE, "MountPoints") => Some(PropertyField::MountPoints),
        (ENCRYPTED_INTERFACE, "CleartextDevice") => Some(PropertyField::CleartextDevice),
        _ => None,
    }
}

pub fn is_loop_device(device: &str) -> bool {
    device
        .strip_prefix("/dev/loop")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit() || b == b'p'))
}
