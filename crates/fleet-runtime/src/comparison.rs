//! Side-by-side comparison of scenario results.

use std::collections::BTreeSet;

use fleet_core::ForecastScenario;
use serde::Serialize;
use thiserror::Error;

/// Most scenarios shown side by side.
pub const MAX_COMPARED: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("at most {MAX_COMPARED} scenarios can be compared")]
    LimitReached,
}

/// Ordered set of scenario ids picked for comparison.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComparisonSelection {
    ids: Vec<String>,
}

impl ComparisonSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select each id in turn; duplicates are ignored.
    pub fn from_ids<I, T>(ids: I) -> Result<Self, SelectionError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut selection = Self::new();
        for id in ids {
            let id = id.into();
            if !selection.contains(&id) {
                selection.toggle(&id)?;
            }
        }
        Ok(selection)
    }

    /// Deselect `id` if selected, else select it. Returns whether it is
    /// selected afterwards. Adding past the limit leaves the set unchanged.
    pub fn toggle(&mut self, id: &str) -> Result<bool, SelectionError> {
        if let Some(pos) = self.ids.iter().position(|s| s == id) {
            self.ids.remove(pos);
            return Ok(false);
        }
        if self.ids.len() >= MAX_COMPARED {
            return Err(SelectionError::LimitReached);
        }
        self.ids.push(id.to_string());
        Ok(true)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// The selected scenarios, in selection order. Unknown ids are skipped.
    pub fn resolve(&self, scenarios: &[ForecastScenario]) -> Vec<ForecastScenario> {
        self.ids
            .iter()
            .filter_map(|id| scenarios.iter().find(|s| &s.id == id).cloned())
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub year: i32,
    /// `total_spending` per scenario column; `None` where a scenario has no
    /// entry for the year.
    pub values: Vec<Option<f64>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonTable {
    /// Column headers: scenario names.
    pub scenarios: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

/// One row per year appearing in any scenario's breakdown, ascending.
/// Scenarios without results still get a column.
pub fn build_comparison(scenarios: &[ForecastScenario]) -> ComparisonTable {
    let years: BTreeSet<i32> = scenarios
        .iter()
        .filter_map(|s| s.results.as_ref())
        .flat_map(|r| r.yearly_breakdown.iter().map(|y| y.year))
        .collect();
    let rows = years
        .into_iter()
        .map(|year| ComparisonRow {
            year,
            values: scenarios
                .iter()
                .map(|s| {
                    s.results.as_ref().and_then(|r| {
                        r.yearly_breakdown
                            .iter()
                            .find(|y| y.year == year)
                            .map(|y| y.total_spending)
                    })
                })
                .collect(),
        })
        .collect();
    ComparisonTable {
        scenarios: scenarios.iter().map(|s| s.name.clone()).collect(),
        rows,
    }
}
