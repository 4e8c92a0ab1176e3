// SPDX-License-Identifier: GPL-3.0-only

use places_contracts::ProviderError;
use places_types::GhostSignal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlacesError {
    #[error("backend call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("{0} is not the aggregation root")]
    NotAggregationRoot(String),

    #[error("entry {0} cannot be renamed")]
    NotRenamable(String),

    #[error("entry {0} has no volume UUID")]
    MissingUuid(String),

    #[error("unknown entry: {0}")]
    UnknownEntry(String),

    #[error("watcher is already started")]
    AlreadyStarted,

    #[error("watcher is not started")]
    NotStarted,

    #[error("unhandled ghost signal {signal:?} for {path}")]
    UnhandledGhostSignal { signal: GhostSignal, path: String },

    #[error("settings file {path}: {message}")]
    Settings { path: String, message: String },
}
