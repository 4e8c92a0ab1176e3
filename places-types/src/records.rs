//! Persisted records: disk aliases, sidecar disk info and remembered remote mounts

use serde::{Deserialize, Serialize};

/// User-chosen display name for a block device, keyed by volume UUID
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliasRecord {
    pub uuid: String,

    /// Name the device had when the alias was set
    pub name: String,

    /// Never empty in a stored record
    pub alias: String,
}

/// One element of the sidecar `DISKINFO` array
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiskInfoEntry {
    pub uuid: String,
    #[serde(rename = "drive")]
    pub driver: String,
    pub label: String,
}

/// Sidecar document; elements that are not objects are kept raw and skipped
/// when merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiskInfoDocument {
    #[serde(rename = "DISKINFO", default)]
    pub disk_info: Vec<serde_json::Value>,
}

impl DiskInfoEntry {
    /// Read one sidecar element. Fields that are missing or not strings
    /// read as empty.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;
        let field = |name: &str| {
            object
                .get(name)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Some(Self {
            uuid: field("uuid"),
            driver: field("drive"),
            label: field("label"),
        })
    }
}

impl DiskInfoDocument {
    pub fn entries(&self) -> impl Iterator<Item = DiskInfoEntry> + '_ {
        self.disk_info.iter().filter_map(DiskInfoEntry::from_value)
    }
}

/// A remote connection that was mounted at some point
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StashedMount {
    /// Mount root path the connection had while mounted
    pub key: String,
    pub protocol: String,
    pub host: String,
    /// Empty for protocols without shares (e.g. ftp)
    pub share: String,
    pub name: String,
}

impl StashedMount {
    pub fn is_valid(&self) -> bool {
        !self.protocol.is_empty() && !self.host.is_empty()
    }

    /// `protocol://host/share`
    pub fn remote_url(&self) -> String {
        format!("{}://{}/{}", self.protocol, self.host, self.share)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_info_document_skips_non_objects() {
        let doc: DiskInfoDocument = serde_json::from_str(
            r#"{"DISKINFO": [{"uuid": "A", "drive": "sda", "label": "Data", "extra": 1}, 7, {"label": "NoUuid"}]}"#,
        )
        .expect("parse sidecar");
        let entries: Vec<_> = doc.entries().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].driver, "sda");
        assert_eq!(entries[1].uuid, "");
        assert_eq!(entries[1].label, "NoUuid");
    }

    #[test]
    fn disk_info_fields_of_the_wrong_type_read_as_empty() {
        let doc: DiskInfoDocument = serde_json::from_str(
            r#"{"DISKINFO": [{"uuid": 5, "drive": null, "label": "Recovery"}]}"#,
        )
        .expect("parse sidecar");
        let entries: Vec<_> = doc.entries().collect();
        assert_eq!(
            entries,
            vec![DiskInfoEntry {
                uuid: String::new(),
                driver: String::new(),
                label: "Recovery".to_string(),
            }]
        );
    }

    #[test]
    fn stashed_mount_validity() {
        let record: StashedMount =
            serde_json::from_str(r#"{"protocol": "ftp", "host": "files.example"}"#)
                .expect("parse record");
        assert!(record.is_valid());
        assert_eq!(record.remote_url(), "ftp://files.example/");
        assert!(!StashedMount::default().is_valid());
    }
}
