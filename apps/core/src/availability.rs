//! Live availability board fed by the snapshot poller.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDateTime};

use crate::domain::{format_category_label, AvailabilityEntry};
use crate::ports::CategoryOption;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Issued when a poll starts; a response is only applied if its ticket is
/// newer than the last one applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PollTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityRow {
    pub location: String,
    pub slots_label: String,
    pub has_slots: bool,
    pub last_checked: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityListing {
    /// No snapshot has arrived yet.
    Loading,
    NoCategories,
    ChooseCategory,
    Empty,
    Rows(Vec<AvailabilityRow>),
}

impl AvailabilityListing {
    /// Placeholder text for the non-row states.
    pub const fn message(&self) -> Option<&'static str> {
        match self {
            Self::Loading => Some("Loading availability data…"),
            Self::NoCategories => Some("No categories found."),
            Self::ChooseCategory => Some("Please choose a category."),
            Self::Empty => Some("No locations for this category."),
            Self::Rows(_) => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct AvailabilityBoard {
    entries: Vec<AvailabilityEntry>,
    loaded: bool,
    issued: u64,
    applied: Option<PollTicket>,
    open: bool,
    selected: Option<String>,
}

impl AvailabilityBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue_ticket(&mut self) -> PollTicket {
        self.issued += 1;
        PollTicket(self.issued)
    }

    /// Replaces the snapshot wholesale. Returns `false` and keeps the current
    /// data when a newer poll has already been applied.
    pub fn apply(&mut self, ticket: PollTicket, entries: Vec<AvailabilityEntry>) -> bool {
        if self.applied.is_some_and(|applied| applied >= ticket) {
            log::debug!("Discarding out-of-order snapshot {ticket:?}");
            return false;
        }

        self.applied = Some(ticket);
        self.entries = entries;
        self.loaded = true;
        true
    }

    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub const fn is_open(&self) -> bool {
        self.open
    }

    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, category: &str) {
        self.selected = Some(category.to_string()).filter(|key| !key.is_empty());
    }

    /// Distinct category keys present in the snapshot, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn category_options(&self) -> Vec<CategoryOption> {
        self.categories()
            .into_iter()
            .map(|key| CategoryOption {
                label: format_category_label(&key),
                key,
            })
            .collect()
    }

    /// Keeps the current selection if the snapshot still has it, otherwise
    /// falls back to the first category.
    pub fn reconcile_selection(&mut self) -> Option<&str> {
        let categories = self.categories();
        let keep = self
            .selected
            .as_ref()
            .is_some_and(|current| categories.contains(current));

        if !keep {
            self.selected = categories.into_iter().next();
        }
        self.selected.as_deref()
    }

    /// Rows for the selected category, sorted by location name.
    pub fn listing(&self) -> AvailabilityListing {
        if !self.loaded {
            return AvailabilityListing::Loading;
        }
        let Some(category) = self.selected.as_deref() else {
            return AvailabilityListing::ChooseCategory;
        };

        let mut entries: Vec<&AvailabilityEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.category == category)
            .collect();

        if entries.is_empty() {
            return AvailabilityListing::Empty;
        }

        entries.sort_by(|a, b| compare_locations(&a.location_name, &b.location_name));
        AvailabilityListing::Rows(entries.into_iter().map(row_for).collect())
    }
}

fn compare_locations(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn row_for(entry: &AvailabilityEntry) -> AvailabilityRow {
    let has_slots = entry.slots_count > 0;
    AvailabilityRow {
        location: entry.location_name.clone(),
        slots_label: if has_slots {
            format!("{} slots", entry.slots_count)
        } else {
            "No slots".to_string()
        },
        has_slots,
        last_checked: format_last_checked(entry.last_checked.as_deref()),
    }
}

/// Human-readable check time; unparseable values are shown as-is.
pub fn format_last_checked(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
        return "Unknown".to_string();
    };
    let trimmed = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return parsed.format(DISPLAY_FORMAT).to_string();
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map_or_else(|| raw.to_string(), |parsed| parsed.format(DISPLAY_FORMAT).to_string())
}
