//! Filter Set Management
//!
//! Domain types for tracking the desired filter state of the streaming
//! connection. Each filter category (keywords, bounding boxes, followed
//! IDs) is an independent refcounted multiset.
//!
//! # Design
//!
//! The filter set tracks:
//! - A reference count per term, so overlapping subscribe/unsubscribe
//!   calls compose correctly
//! - First-insertion order per category, so the request parameters a
//!   connection is opened with stay stable under churn
//!
//! A term whose count drops to zero leaves the active set but keeps its
//! original position if it is later re-added.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;

// =============================================================================
// Types
// =============================================================================

/// Filter category for the streaming feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterCategory {
    /// Free-text keyword filters.
    Track,
    /// Geographic bounding-box filters.
    Location,
    /// Followed entity ID filters.
    Follow,
}

impl FilterCategory {
    /// Get all filter categories.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Track, Self::Location, Self::Follow]
    }

    /// Get the category name as used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Location => "location",
            Self::Follow => "follow",
        }
    }
}

// =============================================================================
// Parameter Snapshot
// =============================================================================

/// Snapshot of the filter state used to open a connection.
///
/// Serializes to exactly the three request body fields the feed accepts.
/// Each value is a comma-joined, deduplicated, insertion-ordered list; an
/// empty category yields an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterParams {
    /// Comma-joined keyword filters.
    pub track: String,
    /// Comma-joined bounding-box filters.
    pub locations: String,
    /// Comma-joined followed entity IDs.
    pub follow: String,
}

impl FilterParams {
    /// Check if every field is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.track.is_empty() && self.locations.is_empty() && self.follow.is_empty()
    }
}

// =============================================================================
// Category State
// =============================================================================

/// Refcounted term state for a single category.
#[derive(Debug, Default)]
struct CategoryState {
    /// Every term ever added, in first-insertion order. Terms whose count
    /// has dropped to zero stay here so a re-add restores their position.
    order: Vec<String>,
    /// Map from term to reference count. Never stores a zero count.
    counts: HashMap<String, u32>,
}

impl CategoryState {
    /// Increment the refcount for a term, returning the new count.
    fn add(&mut self, term: &str) -> u32 {
        if !self.order.iter().any(|t| t == term) {
            self.order.push(term.to_owned());
        }

        let count = self.counts.entry(term.to_owned()).or_insert(0);
        *count += 1;
        *count
    }

    /// Decrement the refcount for a term, returning the new count.
    ///
    /// Removing an absent term is a no-op returning 0. The entry is deleted
    /// when its count reaches zero.
    fn remove(&mut self, term: &str) -> u32 {
        let Some(count) = self.counts.get_mut(term) else {
            return 0;
        };

        *count = count.saturating_sub(1);
        if *count == 0 {
            self.counts.remove(term);
            return 0;
        }

        *count
    }

    /// Terms with a positive count, in first-insertion order.
    fn active(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|t| self.counts.contains_key(*t))
            .cloned()
            .collect()
    }

    fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    fn joined(&self) -> String {
        self.active().join(",")
    }
}

// =============================================================================
// Filter Set
// =============================================================================

/// Refcounted filter state across all three categories.
///
/// Thread-safe: mutations take a write lock per category, so callers can
/// share the set behind an `Arc`.
///
/// # Example
///
/// ```rust
/// use firehose_client::domain::filter::{FilterCategory, FilterSet};
///
/// let filters = FilterSet::new();
///
/// filters.add(FilterCategory::Track, "tacos");
/// filters.add(FilterCategory::Track, "tacos");
/// filters.add(FilterCategory::Track, "tortas");
///
/// // One unsubscribe leaves the term active (count 2 -> 1)
/// filters.remove(FilterCategory::Track, "tacos");
/// assert_eq!(filters.active_members(FilterCategory::Track), ["tacos", "tortas"]);
/// ```
#[derive(Debug, Default)]
pub struct FilterSet {
    track: RwLock<CategoryState>,
    location: RwLock<CategoryState>,
    follow: RwLock<CategoryState>,
}

impl FilterSet {
    /// Create an empty filter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the refcount for a term, returning the new count.
    ///
    /// The first add of a term appends it to the category's insertion
    /// order; re-adding a term that previously dropped to zero restores
    /// its original position instead.
    pub fn add(&self, category: FilterCategory, term: &str) -> u32 {
        self.state(category).write().add(term)
    }

    /// Decrement the refcount for a term, returning the new count.
    ///
    /// Removing a term that is not present is a recoverable no-op
    /// returning 0, never an error.
    pub fn remove(&self, category: FilterCategory, term: &str) -> u32 {
        self.state(category).write().remove(term)
    }

    /// Get the unique active terms for a category, in first-insertion order.
    #[must_use]
    pub fn active_members(&self, category: FilterCategory) -> Vec<String> {
        self.state(category).read().active()
    }

    /// Check if all three categories have zero active members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        FilterCategory::all()
            .iter()
            .all(|c| self.state(*c).read().is_empty())
    }

    /// Take a parameter snapshot of the current filter state.
    #[must_use]
    pub fn params(&self) -> FilterParams {
        FilterParams {
            track: self.track.read().joined(),
            locations: self.location.read().joined(),
            follow: self.follow.read().joined(),
        }
    }

    /// Get the state for a category.
    const fn state(&self, category: FilterCategory) -> &RwLock<CategoryState> {
        match category {
            FilterCategory::Track => &self.track,
            FilterCategory::Location => &self.location,
            FilterCategory::Follow => &self.follow,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
