//! State carried across records of one render.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;

use sch2svg_core::geometry::Point;
use sch2svg_parser::records::{Placement, Symbol};

/// Everything a render learns while walking the schematic that later
/// records, the library pass or the field pass depend on.
#[derive(Debug, Default)]
pub(crate) struct RenderState {
    wire_endpoints: HashSet<Point>,
    no_connects: HashSet<Point>,
    multi_unit: HashSet<String>,
    placements: Vec<Placement>,
    /// Symbol name to indices into `placements`, in first-use order.
    by_symbol: IndexMap<String, Vec<usize>>,
    resolved: Vec<bool>,
    cache_library: Option<String>,
}

impl RenderState {
    pub(crate) fn add_wire_endpoints(&mut self, start: Point, end: Point) {
        self.wire_endpoints.insert(start);
        self.wire_endpoints.insert(end);
    }

    pub(crate) fn add_no_connect(&mut self, at: Point) {
        self.no_connects.insert(at);
    }

    /// Whether a wire or bus ends on `at`, or a no-connect flag sits on it.
    pub(crate) fn is_connected(&self, at: Point) -> bool {
        self.wire_endpoints.contains(&at) || self.no_connects.contains(&at)
    }

    /// Records the libraries of a `LIBS:` line. The last `-cache` entry seen
    /// becomes the library for the symbol pass.
    pub(crate) fn add_libraries(&mut self, names: &[String]) {
        if let Some(cache) = names.iter().rev().find(|name| name.ends_with("-cache")) {
            debug!(library = cache.as_str(); "Found cache library");
            self.cache_library = Some(cache.clone());
        }
    }

    pub(crate) fn cache_library(&self) -> Option<&str> {
        self.cache_library.as_deref()
    }

    pub(crate) fn add_placement(&mut self, placement: Placement) {
        let index = self.placements.len();
        self.by_symbol.entry(placement.symbol.clone()).or_default().push(index);
        self.placements.push(placement);
        self.resolved.push(false);
    }

    pub(crate) fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub(crate) fn has_placements(&self) -> bool {
        !self.placements.is_empty()
    }

    /// Marks every name of a multi-unit symbol.
    pub(crate) fn learn_symbol(&mut self, symbol: &Symbol) {
        if symbol.is_multi_unit() {
            self.multi_unit.extend(symbol.names().map(str::to_string));
        }
    }

    pub(crate) fn is_multi_unit(&self, name: &str) -> bool {
        self.multi_unit.contains(name)
    }

    /// Returns the placements of any of the symbol's names and marks them
    /// resolved. A placement is returned at most once per render.
    pub(crate) fn take_matches(&mut self, symbol: &Symbol) -> Vec<usize> {
        let mut matches: Vec<usize> = symbol
            .names()
            .filter_map(|name| self.by_symbol.get(name))
            .flatten()
            .copied()
            .filter(|&index| !self.resolved[index])
            .collect();
        matches.sort_unstable();
        matches.dedup();
        for &index in &matches {
            self.resolved[index] = true;
        }
        matches
    }

    /// Symbol names that no library symbol matched, in first-use order.
    pub(crate) fn unresolved(&self) -> Vec<String> {
        self.by_symbol
            .iter()
            .filter(|(_, indices)| indices.iter().any(|&index| !self.resolved[index]))
            .map(|(name, _)| name.clone())
            .collect()
    }
}
