// SPDX-License-Identifier: GPL-3.0-only

//! GVfs virtual mount provider for the places engine

pub mod error;
pub mod fuse;
pub mod gio;
pub mod parse;
pub mod provider;

pub use error::GvfsError;
pub use gio::GioCli;
pub use provider::{DEFAULT_POLL_INTERVAL, GvfsProvider, diff_listings};
