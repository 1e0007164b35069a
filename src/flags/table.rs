//! Rule identifiers and the per-timestamp flag table.

use crate::error::{Result, SolarQcError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Quality control rules, in their canonical evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rule {
    Offset,
    U1,
    U2,
    L1,
    L2,
    Difference,
    Consistency,
    MissingValues,
}

impl Rule {
    pub const ALL: [Rule; 8] = [
        Rule::Offset,
        Rule::U1,
        Rule::U2,
        Rule::L1,
        Rule::L2,
        Rule::Difference,
        Rule::Consistency,
        Rule::MissingValues,
    ];

    /// Column name used in tables and reports
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Offset => "Offset",
            Rule::U1 => "U1",
            Rule::U2 => "U2",
            Rule::L1 => "L1",
            Rule::L2 => "L2",
            Rule::Difference => "Difference",
            Rule::Consistency => "Consistency",
            Rule::MissingValues => "Missing values",
        }
    }

    /// Rules whose hits are left for manual review rather than
    /// excluded automatically
    pub fn needs_visual_review(&self) -> bool {
        matches!(self, Rule::Offset | Rule::Consistency)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Boolean flags per rule, aligned to an hourly index
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlagTable {
    index: Vec<NaiveDateTime>,
    columns: BTreeMap<Rule, Vec<bool>>,
}

impl FlagTable {
    /// Empty table over the given index
    pub fn new(index: Vec<NaiveDateTime>) -> Self {
        Self {
            index,
            columns: BTreeMap::new(),
        }
    }

    /// Store one rule's column. A rule can only be recorded once per table.
    pub fn record(&mut self, rule: Rule, column: Vec<bool>) -> Result<()> {
        if column.len() != self.index.len() {
            return Err(SolarQcError::data_integrity(format!(
                "flag column {} has {} values for an index of {}",
                rule,
                column.len(),
                self.index.len()
            )));
        }
        if self.columns.contains_key(&rule) {
            return Err(SolarQcError::data_integrity(format!(
                "flag column {} already recorded",
                rule
            )));
        }
        self.columns.insert(rule, column);
        Ok(())
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column(&self, rule: Rule) -> Option<&[bool]> {
        self.columns.get(&rule).map(Vec::as_slice)
    }

    /// Recorded rules in canonical order
    pub fn rules(&self) -> impl Iterator<Item = Rule> + '_ {
        self.columns.keys().copied()
    }

    pub fn columns(&self) -> impl Iterator<Item = (Rule, &[bool])> {
        self.columns.iter().map(|(rule, col)| (*rule, col.as_slice()))
    }

    /// Whether the row is flagged by any recorded rule accepted by `filter`
    pub fn any_where(&self, row: usize, filter: impl Fn(Rule) -> bool) -> bool {
        self.columns
            .iter()
            .any(|(rule, col)| filter(*rule) && col.get(row).copied().unwrap_or(false))
    }

    /// Flagged by a rule that excludes data automatically
    pub fn is_erroneous(&self, row: usize) -> bool {
        self.any_where(row, |rule| !rule.needs_visual_review())
    }

    /// Flagged by a rule that asks for visual review
    pub fn needs_review(&self, row: usize) -> bool {
        self.any_where(row, |rule| rule.needs_visual_review())
    }

    /// Number of flagged rows per recorded rule
    pub fn counts(&self) -> BTreeMap<Rule, usize> {
        self.columns
            .iter()
            .map(|(rule, col)| (*rule, col.iter().filter(|f| **f).count()))
            .collect()
    }
}
