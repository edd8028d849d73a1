// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation resolver.
//!
//! Maps a frame index to the metadata entry covering it. Metadata is sampled
//! once every `samples_per_entry` frames and addressed by position in the
//! set's canonical order, never by key value.

use super::clock::FrameIndex;
use crate::models::annotation::Annotation;
use crate::models::metadata::{KeyedEntry, MetadataSet};
use std::num::NonZeroU32;

/// Position of the metadata entry covering `frame`.
pub fn entry_index(frame: FrameIndex, samples_per_entry: NonZeroU32) -> u64 {
    frame / u64::from(samples_per_entry.get())
}

/// The entry covering `frame`, or `None` when it lies outside the set.
pub fn resolve_entry(
    set: &MetadataSet,
    frame: FrameIndex,
    samples_per_entry: NonZeroU32,
) -> Option<&KeyedEntry> {
    let index = usize::try_from(entry_index(frame, samples_per_entry)).ok()?;
    set.get(index)
}

/// Annotations for `frame`.
///
/// Out-of-range frames yield an empty slice rather than the last entry's
/// annotations, so an overlay never outlives its annotated segment.
pub fn resolve(set: &MetadataSet, frame: FrameIndex, samples_per_entry: NonZeroU32) -> &[Annotation] {
    resolve_entry(set, frame, samples_per_entry)
        .map(|keyed| keyed.entry.annotations.as_slice())
        .unwrap_or(&[])
}
