// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Metadata store.
//!
//! Holds the annotation dataset for the current video session. Loading runs
//! on a background thread and is applied on the UI thread by [`MetadataStore::poll`].
//! A failed load is logged and leaves the previous set in place.

use crate::models::metadata::{MetadataEntry, MetadataSet};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use thiserror::Error;

/// Recoverable metadata load failures.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read metadata file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse metadata: {0}")]
    Parse(#[from] serde_json::Error),
}

type LoadResult = Result<IndexMap<String, MetadataEntry>, MetadataError>;

/// Result of a background load, tagged with the generation that requested it.
struct LoadMessage {
    generation: u64,
    result: LoadResult,
}

/// Owner of the current [`MetadataSet`].
pub struct MetadataStore {
    set: MetadataSet,
    /// Incremented by every load request and by teardown.
    generation: u64,
    loaded_versions: u64,
    pending: Option<Receiver<LoadMessage>>,
}

impl Default for MetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            set: MetadataSet::default(),
            generation: 0,
            loaded_versions: 0,
            pending: None,
        }
    }

    /// The current dataset, empty until a load succeeds.
    pub fn set(&self) -> &MetadataSet {
        &self.set
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Start loading metadata from a JSON file on a background thread.
    pub fn load(&mut self, source: &Path) {
        log::info!("Loading metadata from {}", source.display());
        let path = source.to_path_buf();
        self.load_with(move || crate::io::serialization::import_metadata_json(&path));
    }

    /// Start a background load using an arbitrary loader.
    ///
    /// Any load still in flight is superseded and its result will be ignored.
    pub fn load_with<F>(&mut self, loader: F)
    where
        F: FnOnce() -> LoadResult + Send + 'static,
    {
        self.generation += 1;
        let generation = self.generation;
        let (sender, receiver) = channel();
        self.pending = Some(receiver);

        std::thread::spawn(move || {
            let result = loader();
            // The receiver is gone if the load was superseded or torn down.
            let _ = sender.send(LoadMessage { generation, result });
        });
    }

    /// Apply a finished background load, if any.
    ///
    /// Returns `true` when the set was replaced.
    pub fn poll(&mut self) -> bool {
        let message = match self.pending.as_ref().map(|rx| rx.try_recv()) {
            Some(Ok(message)) => message,
            Some(Err(TryRecvError::Empty)) | None => return false,
            Some(Err(TryRecvError::Disconnected)) => {
                log::error!("Metadata loader exited without a result");
                self.pending = None;
                return false;
            }
        };
        self.pending = None;
        self.apply(message.generation, message.result)
    }

    /// Drop any in-flight load so its result can never be applied.
    pub fn teardown(&mut self) {
        self.generation += 1;
        self.pending = None;
    }

    fn apply(&mut self, generation: u64, result: LoadResult) -> bool {
        if generation != self.generation {
            log::warn!("Discarding stale metadata result (generation {})", generation);
            return false;
        }

        match result {
            Ok(map) => {
                self.loaded_versions += 1;
                self.set = MetadataSet::from_ordered(map, self.loaded_versions);
                log::info!(
                    "Loaded {} metadata entries with {} annotations",
                    self.set.len(),
                    self.set.annotation_count()
                );
                true
            }
            Err(e) => {
                log::error!("Error fetching metadata: {}", e);
                false
            }
        }
    }
}
