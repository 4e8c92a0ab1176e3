// SPDX-License-Identifier: GPL-3.0-only

//! UDisks2 block device provider for the places engine
//!
//! Reads block objects and drives over the system bus and forwards object
//! manager and property signals as engine events.

mod decode;
pub mod error;
mod manager;
pub mod provider;

pub use error::UdisksError;
pub use provider::UdisksProvider;
