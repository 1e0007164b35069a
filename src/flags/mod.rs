//! Flag engine for hourly irradiance series.
//!
//! Applies the configured quality control rules to an aligned
//! [`ObservationSeries`] and collects the results in a [`FlagTable`].
//!
//! # Rules
//!
//! | Rule | Suspect when |
//! |---|---|
//! | Offset | night reading above 6 W/m² or any reading below -12 W/m² |
//! | U1 | measured above TOA |
//! | U2 | measured above 1.1x clear-sky (2x near the horizon) |
//! | L1 | the day's mean clearness index is below 0.03 |
//! | L2 | near-zero reading while the sun is high |
//! | Difference | clearness index jumps by 0.75 or more in one hour |
//! | Consistency | the day's clearness index is too flat or too noisy |
//! | Missing values | no measurement |
//!
//! Rules are independent: each writes its own column and the evaluation
//! order does not change the result. The only mutation is the zero-out
//! pre-processing step, controlled by [`ZeroOutStage`].
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use solar_qc::config::QcConfig;
//! use solar_qc::flags::{FlagEngine, Rule};
//! # fn example(mut series: solar_qc::models::ObservationSeries) -> solar_qc::Result<()> {
//! let engine = FlagEngine::new(QcConfig::default())?;
//! let flags = engine.run(&mut series)?;
//! println!("U1 hits: {}", flags.counts()[&Rule::U1]);
//! # Ok(())
//! # }
//! ```

pub mod daily;
pub mod rules;
pub mod table;

#[cfg(test)]
pub mod tests;

pub use table::{FlagTable, Rule};

use crate::config::{QcConfig, ZeroOutStage};
use crate::error::Result;
use crate::models::ObservationSeries;
use tracing::{debug, info};

/// Runs the configured rules over a series
#[derive(Debug, Clone)]
pub struct FlagEngine {
    config: QcConfig,
}

impl FlagEngine {
    pub fn new(config: QcConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &QcConfig {
        &self.config
    }

    /// Set measured irradiance to 0 at night (TOA = 0) and wherever it is
    /// negative. Returns the number of values changed.
    pub fn zero_out(series: &mut ObservationSeries) -> usize {
        // Read TOA first; measured_mut borrows the series mutably
        let night: Vec<bool> = series
            .records()
            .iter()
            .map(|r| r.toa == Some(0.0))
            .collect();

        let mut changed = 0;
        for (value, is_night) in series.measured_mut().zip(night) {
            let negative = matches!(value, Some(v) if *v < 0.0);
            if (is_night || negative) && *value != Some(0.0) {
                *value = Some(0.0);
                changed += 1;
            }
        }
        changed
    }

    /// Evaluate every configured rule without touching the series
    pub fn evaluate(&self, series: &ObservationSeries) -> Result<FlagTable> {
        let mut table = FlagTable::new(series.index());
        for rule in &self.config.rules {
            self.record(&mut table, *rule, series)?;
        }
        Ok(table)
    }

    /// Apply the configured zero-out stage, then evaluate every rule
    ///
    /// Repeated runs give the same table except under
    /// [`ZeroOutStage::AfterOffset`], whose Offset column depends on the
    /// values before zero-out.
    pub fn run(&self, series: &mut ObservationSeries) -> Result<FlagTable> {
        let table = match self.config.zero_out {
            ZeroOutStage::BeforeRules => {
                let changed = Self::zero_out(series);
                debug!("Zero-out changed {} values", changed);
                self.evaluate(series)?
            }
            ZeroOutStage::Disabled => self.evaluate(series)?,
            ZeroOutStage::AfterOffset => {
                let mut table = FlagTable::new(series.index());
                let (offset, rest): (Vec<Rule>, Vec<Rule>) = self
                    .config
                    .rules
                    .iter()
                    .copied()
                    .partition(|rule| *rule == Rule::Offset);

                for rule in offset {
                    self.record(&mut table, rule, series)?;
                }
                let changed = Self::zero_out(series);
                debug!("Zero-out changed {} values", changed);
                for rule in rest {
                    self.record(&mut table, rule, series)?;
                }
                table
            }
        };

        info!(
            "Flagged {} hours with {} rules",
            table.len(),
            self.config.rules.len()
        );
        Ok(table)
    }

    fn record(&self, table: &mut FlagTable, rule: Rule, series: &ObservationSeries) -> Result<()> {
        let column = rule.evaluate(series, &self.config);
        debug!(
            "{}: {} of {} hours flagged",
            rule,
            column.iter().filter(|f| **f).count(),
            column.len()
        );
        table.record(rule, column)
    }
}
