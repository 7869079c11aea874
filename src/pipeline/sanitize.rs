//! Series sanitation before rendering.

use crate::backend::SeriesMatrix;

/// Value substituted for not-a-number samples.
pub const DEFAULT_VALUE: f64 = 0.0;

/// Replace every NaN sample with [`DEFAULT_VALUE`], in place.
///
/// Returns the number of samples replaced. Idempotent.
pub fn sanitize(matrix: &mut SeriesMatrix) -> usize {
    let mut replaced = 0;
    for sample in matrix.series.iter_mut().flat_map(|s| s.samples.iter_mut()) {
        if sample.value.is_nan() {
            sample.value = DEFAULT_VALUE;
            replaced += 1;
        }
    }
    replaced
}
