//! Absolute offset lookup across `include` boundaries.
//!
//! When a file includes another, the included text is spliced in at the
//! directive and every later offset of the including file is shifted by the
//! included length. Nodes only ever see the resulting absolute offsets; this
//! table maps them back to the file they came from.

use crate::position::{LineMap, SourceLocation};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A contiguous run of absolute offsets taken from one physical file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetRegion {
    pub abs_start: u32,
    pub abs_end: u32,
    pub file: Arc<str>,
    /// Offset within `file` that `abs_start` maps to.
    pub local_start: u32,
}

#[derive(Debug, Clone)]
struct FileText {
    text: Arc<str>,
    line_map: LineMap,
}

/// Maps absolute offsets to (file, local offset, line, column).
#[derive(Debug, Clone, Default)]
pub struct OffsetLookup {
    /// Sorted by `abs_start`, non-overlapping.
    regions: Vec<OffsetRegion>,
    files: FxHashMap<Arc<str>, FileText>,
}

impl OffsetLookup {
    /// Lookup for a file with no includes: absolute offsets equal local ones.
    pub fn single(file: Arc<str>, text: Arc<str>) -> Self {
        let mut lookup = OffsetLookup::default();
        let len = text.len() as u32;
        lookup.add_file(file.clone(), text);
        lookup.push_region(file, 0, len, 0);
        lookup
    }

    /// Register the text of a physical file so locations can carry lines.
    pub fn add_file(&mut self, file: Arc<str>, text: Arc<str>) {
        self.files.entry(file).or_insert_with(|| FileText {
            line_map: LineMap::build(&text),
            text,
        });
    }

    /// Append a region. Regions must be pushed in absolute order; empty
    /// regions are dropped.
    pub fn push_region(&mut self, file: Arc<str>, abs_start: u32, abs_end: u32, local_start: u32) {
        if abs_end <= abs_start {
            return;
        }
        debug_assert!(
            self.regions
                .last()
                .is_none_or(|last| last.abs_end <= abs_start),
            "offset regions must be pushed in order"
        );
        self.regions.push(OffsetRegion {
            abs_start,
            abs_end,
            file,
            local_start,
        });
    }

    pub fn regions(&self) -> &[OffsetRegion] {
        &self.regions
    }

    fn region_at(&self, abs: u32) -> Option<&OffsetRegion> {
        let idx = match self.regions.binary_search_by(|r| r.abs_start.cmp(&abs)) {
            Ok(i) => i,
            Err(0) => return None,
            Err(i) => i - 1,
        };
        let region = self.regions.get(idx)?;
        // The end of the last region is a valid (EOF) position.
        if abs < region.abs_end || (abs == region.abs_end && idx + 1 == self.regions.len()) {
            Some(region)
        } else {
            self.regions.get(idx + 1).filter(|r| r.abs_start == abs)
        }
    }

    /// Physical file and local offset for an absolute offset.
    pub fn local_offset(&self, abs: u32) -> Option<(&str, u32)> {
        let region = self.region_at(abs)?;
        Some((&region.file, region.local_start + (abs - region.abs_start)))
    }

    /// Full location (file, local offset, line, column).
    pub fn location(&self, abs: u32) -> Option<SourceLocation> {
        let (file, local) = self.local_offset(abs)?;
        let (line, character) = match self.files.get(file) {
            Some(ft) => {
                let pos = ft.line_map.offset_to_position(local, &ft.text);
                (pos.line, pos.character)
            }
            None => (0, local),
        };
        Some(SourceLocation::new(file, local, line, character))
    }

    /// Reverse mapping: absolute offset for a position in a physical file.
    pub fn absolute(&self, file: &str, local: u32) -> Option<u32> {
        self.regions
            .iter()
            .find(|r| {
                &*r.file == file
                    && local >= r.local_start
                    && local < r.local_start + (r.abs_end - r.abs_start)
            })
            .map(|r| r.abs_start + (local - r.local_start))
    }

    /// Whether the absolute offset falls in text that came from `file`.
    pub fn is_from_file(&self, abs: u32, file: &str) -> bool {
        self.local_offset(abs).is_some_and(|(f, _)| f == file)
    }

    /// Every distinct physical file contributing text, in first-seen order.
    pub fn files(&self) -> Vec<Arc<str>> {
        let mut seen: Vec<Arc<str>> = Vec::new();
        for region in &self.regions {
            if !seen.iter().any(|f| f == &region.file) {
                seen.push(region.file.clone());
            }
        }
        seen
    }
}

#[cfg(test)]
#[path = "../tests/offset_lookup_tests.rs"]
mod offset_lookup_tests;
