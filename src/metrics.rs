//! Relative error statistics for comparing a modelled profile with
//! measurements.
//!
//! Both inputs are aligned by position. A pair where either side is null is
//! skipped. Results are percentages of the measured mean and are null when
//! no pair remains or the measured mean is zero.

/// Pairs where both values are present
fn pairs<'a>(
    model: &'a [Option<f64>],
    measured: &'a [Option<f64>],
) -> impl Iterator<Item = (f64, f64)> + 'a {
    model
        .iter()
        .zip(measured)
        .filter_map(|(m, o)| Some(((*m)?, (*o)?)))
}

/// Mean of `f(model, measured)` over valid pairs, relative to the measured
/// mean
fn relative_mean(
    model: &[Option<f64>],
    measured: &[Option<f64>],
    f: impl Fn(f64, f64) -> f64,
) -> Option<(f64, f64)> {
    let (count, total, measured_total) = pairs(model, measured).fold(
        (0usize, 0.0, 0.0),
        |(count, total, measured_total), (m, o)| (count + 1, total + f(m, o), measured_total + o),
    );
    if count == 0 {
        return None;
    }
    let measured_mean = measured_total / count as f64;
    if measured_mean == 0.0 {
        return None;
    }
    Some((total / count as f64, measured_mean))
}

/// Relative mean bias deviation (%)
pub fn mbd(model: &[Option<f64>], measured: &[Option<f64>]) -> Option<f64> {
    relative_mean(model, measured, |m, o| m - o).map(|(mean, reference)| mean / reference * 100.0)
}

/// Relative mean absolute error (%)
pub fn mae(model: &[Option<f64>], measured: &[Option<f64>]) -> Option<f64> {
    relative_mean(model, measured, |m, o| (m - o).abs())
        .map(|(mean, reference)| mean / reference * 100.0)
}

/// Relative root mean square deviation (%)
pub fn rmsd(model: &[Option<f64>], measured: &[Option<f64>]) -> Option<f64> {
    relative_mean(model, measured, |m, o| (m - o).powi(2))
        .map(|(mean, reference)| mean.sqrt() / reference * 100.0)
}

/// Change from `reference` to `value` in percent
pub fn relative_change(value: f64, reference: f64) -> Option<f64> {
    (reference != 0.0).then(|| (value - reference) / reference * 100.0)
}

/// All three deviation statistics for one comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub mbd: Option<f64>,
    pub mae: Option<f64>,
    pub rmsd: Option<f64>,
    /// Valid pairs used
    pub pairs: usize,
}

impl Comparison {
    pub fn compute(model: &[Option<f64>], measured: &[Option<f64>]) -> Self {
        Self {
            mbd: mbd(model, measured),
            mae: mae(model, measured),
            rmsd: rmsd(model, measured),
            pairs: pairs(model, measured).count(),
        }
    }
}
