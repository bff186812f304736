//! # Result Publisher
//!
//! Selects the terminal payload of a completed run from a static dataset.
//!
//! ## Selection Rule
//!
//! | Selection            | Payload                                         |
//! |----------------------|-------------------------------------------------|
//! | no selector          | full dataset, `unfiltered = true`               |
//! | any selector present | matching records only, possibly empty           |
//!
//! An empty filtered result is a valid outcome and is never replaced by the
//! unfiltered dataset.
//!
//! Delivery is at most once per generation: the publisher refuses to publish
//! for a generation at or below the last one it published.

use crate::primitives::MAX_SELECTOR_LENGTH;
use crate::{AgentId, Generation, SimError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// RECORD
// =============================================================================

/// One row of a static domain dataset.
///
/// `entity` is the domain key a user can select on (vehicle unit, SKU, cost
/// center, bank account). Domain-specific columns live in `attributes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub entity: String,
    pub category: String,
    pub date: NaiveDate,
    pub amount_cents: i64,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

// =============================================================================
// SELECTION
// =============================================================================

/// Inclusive date range. Either end may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Build a range, rejecting `from > to`.
    ///
    /// Returns `Ok(None)` when both ends are open.
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Option<Self>, SimError> {
        match (from, to) {
            (None, None) => Ok(None),
            (Some(f), Some(t)) if f > t => Err(SimError::InvalidSelection(format!(
                "date range starts {} after it ends {}",
                f, t
            ))),
            _ => Ok(Some(Self { from, to })),
        }
    }

    /// Check if `date` falls inside the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|f| date >= f) && self.to.is_none_or(|t| date <= t)
    }
}

/// Wire form of a [`Selection`], validated on conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionParts {
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

/// User selection parameters, fixed for the duration of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SelectionParts", into = "SelectionParts")]
pub struct Selection {
    entity: Option<String>,
    category: Option<String>,
    date_range: Option<DateRange>,
}

impl Selection {
    /// Selection with no selector: the full dataset.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a selection. Blank strings count as absent.
    pub fn new(
        entity: Option<String>,
        category: Option<String>,
        date_range: Option<DateRange>,
    ) -> Result<Self, SimError> {
        Ok(Self {
            entity: normalize_selector("entity", entity)?,
            category: normalize_selector("category", category)?,
            date_range,
        })
    }

    /// Entity selector.
    #[must_use]
    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    /// Category selector.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Date range selector.
    #[must_use]
    pub fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }

    /// Check whether no selector is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entity.is_none() && self.category.is_none() && self.date_range.is_none()
    }

    /// Check whether `record` satisfies every present selector.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.entity
            .as_deref()
            .is_none_or(|e| record.entity.eq_ignore_ascii_case(e))
            && self
                .category
                .as_deref()
                .is_none_or(|c| record.category.eq_ignore_ascii_case(c))
            && self.date_range.is_none_or(|r| r.contains(record.date))
    }
}

fn normalize_selector(name: &str, value: Option<String>) -> Result<Option<String>, SimError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.len() > MAX_SELECTOR_LENGTH {
        return Err(SimError::InvalidSelection(format!(
            "{} selector length {} exceeds maximum {} bytes",
            name,
            trimmed.len(),
            MAX_SELECTOR_LENGTH
        )));
    }
    Ok(Some(trimmed.to_string()))
}

impl TryFrom<SelectionParts> for Selection {
    type Error = SimError;

    fn try_from(parts: SelectionParts) -> Result<Self, Self::Error> {
        let range = DateRange::new(parts.from, parts.to)?;
        Self::new(parts.entity, parts.category, range)
    }
}

impl From<Selection> for SelectionParts {
    fn from(selection: Selection) -> Self {
        Self {
            entity: selection.entity,
            category: selection.category,
            from: selection.date_range.and_then(|r| r.from),
            to: selection.date_range.and_then(|r| r.to),
        }
    }
}

// =============================================================================
// DATASET PROVIDER
// =============================================================================

/// Source of immutable, pre-loaded domain records.
pub trait DatasetProvider {
    /// Records of the agent's domain.
    ///
    /// Returns `SimError::UnknownAgent` if the agent has no dataset.
    fn records(&self, agent: &AgentId) -> Result<&[Record], SimError>;
}

impl<T: DatasetProvider + ?Sized> DatasetProvider for Arc<T> {
    fn records(&self, agent: &AgentId) -> Result<&[Record], SimError> {
        (**self).records(agent)
    }
}

/// In-memory datasets keyed by agent.
#[derive(Debug, Clone, Default)]
pub struct StaticDatasets {
    datasets: BTreeMap<AgentId, Vec<Record>>,
}

impl StaticDatasets {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the dataset of an agent.
    pub fn insert(&mut self, agent: AgentId, records: Vec<Record>) {
        self.datasets.insert(agent, records);
    }

    /// Registered agents, in order.
    pub fn agents(&self) -> impl Iterator<Item = &AgentId> {
        self.datasets.keys()
    }
}

impl DatasetProvider for StaticDatasets {
    fn records(&self, agent: &AgentId) -> Result<&[Record], SimError> {
        self.datasets
            .get(agent)
            .map(Vec::as_slice)
            .ok_or_else(|| SimError::UnknownAgent(agent.to_string()))
    }
}

// =============================================================================
// RESULT PAYLOAD
// =============================================================================

/// Terminal payload of a completed run. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPayload {
    pub generation: Generation,
    pub agent: AgentId,
    pub selection: Selection,
    /// True when no selector was present and the full dataset was returned.
    pub unfiltered: bool,
    pub records: Vec<Record>,
}

impl ResultPayload {
    /// Number of records delivered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no records were delivered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all record amounts, in cents.
    #[must_use]
    pub fn total_amount_cents(&self) -> i64 {
        self.records
            .iter()
            .fold(0i64, |acc, r| acc.saturating_add(r.amount_cents))
    }
}

/// Apply a selection to a dataset.
///
/// Returns the selected records and whether the dataset was returned
/// unfiltered.
#[must_use]
pub fn select_records(records: &[Record], selection: &Selection) -> (Vec<Record>, bool) {
    if selection.is_empty() {
        return (records.to_vec(), true);
    }
    let selected = records
        .iter()
        .filter(|r| selection.matches(r))
        .cloned()
        .collect();
    (selected, false)
}

// =============================================================================
// RESULT PUBLISHER
// =============================================================================

/// Builds payloads, at most once per generation.
#[derive(Debug, Clone, Default)]
pub struct ResultPublisher {
    last_published: Option<Generation>,
}

impl ResultPublisher {
    /// Create a publisher that has published nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the last published payload.
    #[must_use]
    pub fn last_published(&self) -> Option<Generation> {
        self.last_published
    }

    /// Build the payload for `generation`.
    ///
    /// Returns `Ok(None)` if a payload for this (or a newer) generation was
    /// already published.
    pub fn publish<D: DatasetProvider + ?Sized>(
        &mut self,
        generation: Generation,
        agent: &AgentId,
        selection: &Selection,
        datasets: &D,
    ) -> Result<Option<ResultPayload>, SimError> {
        if self.last_published.is_some_and(|last| generation <= last) {
            return Ok(None);
        }

        let records = datasets.records(agent)?;
        let (records, unfiltered) = select_records(records, selection);
        self.last_published = Some(generation);

        Ok(Some(ResultPayload {
            generation,
            agent: agent.clone(),
            selection: selection.clone(),
            unfiltered,
            records,
        }))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
    }

    fn record(id: &str, entity: &str, category: &str, day: &str) -> Record {
        Record {
            id: id.to_string(),
            entity: entity.to_string(),
            category: category.to_string(),
            date: date(day),
            amount_cents: 1_000,
            attributes: BTreeMap::new(),
        }
    }

    fn datasets() -> StaticDatasets {
        let mut datasets = StaticDatasets::new();
        datasets.insert(
            AgentId::new("logistics"),
            vec![
                record("t1", "TRK-01", "delivery", "2024-03-01"),
                record("t2", "TRK-02", "delivery", "2024-03-05"),
                record("t3", "TRK-01", "pickup", "2024-03-09"),
            ],
        );
        datasets
    }

    #[test]
    fn no_selector_returns_full_dataset() {
        let mut publisher = ResultPublisher::new();
        let payload = publisher
            .publish(Generation(1), &AgentId::new("logistics"), &Selection::all(), &datasets())
            .expect("publish")
            .expect("first publication");
        assert!(payload.unfiltered);
        assert_eq!(payload.len(), 3);
    }

    #[test]
    fn explicit_selector_with_no_match_is_empty() {
        let selection = Selection::new(Some("TRK-99".into()), None, None).expect("valid");
        let mut publisher = ResultPublisher::new();
        let payload = publisher
            .publish(Generation(1), &AgentId::new("logistics"), &selection, &datasets())
            .expect("publish")
            .expect("first publication");
        assert!(!payload.unfiltered);
        assert!(payload.is_empty());
    }

    #[test]
    fn entity_match_is_case_insensitive() {
        let selection = Selection::new(Some("trk-01".into()), None, None).expect("valid");
        let (records, unfiltered) = select_records(
            datasets().records(&AgentId::new("logistics")).expect("dataset"),
            &selection,
        );
        assert!(!unfiltered);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t3"]);
    }

    #[test]
    fn selectors_combine() {
        let range = DateRange::new(Some(date("2024-03-02")), None).expect("valid");
        let selection =
            Selection::new(Some("TRK-01".into()), Some("pickup".into()), range).expect("valid");
        let (records, _) = select_records(
            datasets().records(&AgentId::new("logistics")).expect("dataset"),
            &selection,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "t3");
    }

    #[test]
    fn date_range_is_inclusive() {
        let range = DateRange::new(Some(date("2024-03-01")), Some(date("2024-03-05")))
            .expect("valid")
            .expect("bounded");
        assert!(range.contains(date("2024-03-01")));
        assert!(range.contains(date("2024-03-05")));
        assert!(!range.contains(date("2024-03-06")));
    }

    #[test]
    fn inverted_date_range_rejected() {
        let result = DateRange::new(Some(date("2024-03-05")), Some(date("2024-03-01")));
        assert!(matches!(result, Err(SimError::InvalidSelection(_))));
    }

    #[test]
    fn blank_selectors_count_as_absent() {
        let selection = Selection::new(Some("   ".into()), Some(String::new()), None).expect("valid");
        assert!(selection.is_empty());
    }

    #[test]
    fn oversized_selector_rejected() {
        let long = "x".repeat(MAX_SELECTOR_LENGTH + 1);
        assert!(matches!(
            Selection::new(Some(long), None, None),
            Err(SimError::InvalidSelection(_))
        ));
    }

    #[test]
    fn publishes_at_most_once_per_generation() {
        let mut publisher = ResultPublisher::new();
        let agent = AgentId::new("logistics");
        let data = datasets();

        let first = publisher.publish(Generation(2), &agent, &Selection::all(), &data);
        let again = publisher.publish(Generation(2), &agent, &Selection::all(), &data);
        let older = publisher.publish(Generation(1), &agent, &Selection::all(), &data);

        assert!(matches!(first, Ok(Some(_))));
        assert!(matches!(again, Ok(None)));
        assert!(matches!(older, Ok(None)));
        assert_eq!(publisher.last_published(), Some(Generation(2)));
    }

    #[test]
    fn unknown_agent_is_an_error() {
        let mut publisher = ResultPublisher::new();
        let result = publisher.publish(
            Generation(1),
            &AgentId::new("payroll"),
            &Selection::all(),
            &datasets(),
        );
        assert!(matches!(result, Err(SimError::UnknownAgent(_))));
        assert_eq!(publisher.last_published(), None);
    }
}
