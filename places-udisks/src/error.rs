//! Error types for places-udisks operations

use places_contracts::{ProviderError, ProviderErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UdisksError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Block device not found: {0}")]
    DeviceNotFound(String),

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("Zbus Error: {0}")]
    ZbusError(#[from] zbus::Error),
}

/// Kind of a failed UDisks2 call, derived from the D-Bus error name.
fn kind_for_dbus_name(name: &str) -> ProviderErrorKind {
    match name.rsplit('.').next().unwrap_or(name) {
        "DeviceBusy" => ProviderErrorKind::Busy,
        "NotAuthorized" | "NotAuthorizedCanObtain" | "NotAuthorizedDismissed" => {
            ProviderErrorKind::PermissionDenied
        }
        "NotSupported" => ProviderErrorKind::Unsupported,
        "NotMounted" | "UnknownObject" | "UnknownMethod" | "UnknownInterface" => {
            ProviderErrorKind::NotFound
        }
        "ServiceUnknown" | "NoReply" | "Timeout" => ProviderErrorKind::Unavailable,
        "InvalidArgs" => ProviderErrorKind::InvalidInput,
        _ => ProviderErrorKind::Internal,
    }
}

impl From<UdisksError> for ProviderError {
    fn from(error: UdisksError) -> Self {
        let kind = match &error {
            UdisksError::ConnectionFailed(_) => ProviderErrorKind::Unavailable,
            UdisksError::DeviceNotFound(_) => ProviderErrorKind::NotFound,
            UdisksError::InvalidPath(_) => ProviderErrorKind::InvalidInput,
            UdisksError::ZbusError(zbus::Error::MethodError(name, _, _)) => {
                kind_for_dbus_name(name.as_str())
            }
            UdisksError::ZbusError(_) => ProviderErrorKind::Internal,
        };
        ProviderError::new(kind, error.to_string())
    }
}
