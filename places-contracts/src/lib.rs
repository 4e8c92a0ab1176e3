// SPDX-License-Identifier: GPL-3.0-only

pub mod error;
pub mod traits;

pub use error::{ProviderError, ProviderErrorKind};
pub use traits::{
    BlockDeviceProvider, EventSink, PolicySource, SettingsStore, SubscriptionId,
    VirtualMountProvider,
};
