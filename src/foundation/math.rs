/// Boundaries that split `total` items into `total / chunk_size + 1` nearly equal chunks.
///
/// The returned vector starts at 0, ends at `total`, and no chunk is larger than `chunk_size`.
/// `chunk_size` must be non-zero.
pub(crate) fn chunk_bounds(total: usize, chunk_size: usize) -> Vec<usize> {
    let nchunks = total / chunk_size + 1;
    (0..=nchunks).map(|i| i * total / nchunks).collect()
}

/// Sample times `index / rate` for every index in `[from, to)`.
pub(crate) fn sample_times(from: usize, to: usize, rate: f64) -> Vec<f64> {
    (from..to).map(|i| i as f64 / rate).collect()
}

/// `t` shifted by `-offset` element-wise.
pub(crate) fn shift_times(tt: &[f64], offset: f64) -> Vec<f64> {
    tt.iter().map(|t| t - offset).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
