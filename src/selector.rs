use ndarray::ArrayView1;

use crate::Error;

/// Picks the sample indices at which a single transient is decomposed.
///
/// Sample `i` corresponds to the frequency `1/time[i]`, so the selection runs
/// from the sample closest to `1/f_max` up to the last sample, which sits at
/// `1/f_min` by construction of the time grid. `f_steps` sets the number of
/// points per decade; the time grid is subsampled to roughly match it.
///
/// When several samples lie within the relative tolerance `2/f_steps` of
/// `1/f_max`, the latest one is used.
pub fn select_frequency_indices(
    time: ArrayView1<f64>,
    f_min: f64,
    f_max: f64,
    f_steps: usize,
) -> Result<Vec<usize>, Error> {
    if !(f_min > 0.0 && f_min < f_max) {
        return Err(Error::InvalidConfig(format!(
            "frequency range must satisfy 0 < f_min < f_max ( f_min: {f_min}, f_max: {f_max} )"
        )));
    }
    if f_steps == 0 {
        return Err(Error::InvalidConfig("f_steps must be at least 1".to_string()));
    }
    if time.len() < 2 {
        return Err(Error::InvalidConfig(format!(
            "transient needs at least 2 samples ( samples: {} )",
            time.len()
        )));
    }

    let target = f_max.recip();
    let rel_tol = 2.0 / (f_steps as f64);
    let i_start = time
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, &t)| is_close(t, target, rel_tol))
        .map(|(i, _)| i)
        .last()
        .ok_or(Error::IndexNotFound)?;
    let i_final = time.len() - 1;

    let decades = (f_max / f_min).log10();
    let ratio = ((i_final - i_start) as f64 / (decades * f_steps as f64))
        .round_ties_even()
        .max(1.0);
    if !(ratio >= 1.0) {
        return Err(Error::InvalidPlotRatio(ratio));
    }
    let ratio = ratio as usize;

    let mut indices = vec![i_start];
    indices.extend(
        ((i_start + 1)..i_final.saturating_sub(1)).filter(|i| (i - i_start) % ratio == 0),
    );
    if i_final != i_start {
        indices.push(i_final);
    }
    log::debug!(
        "selected {} of {} samples ( start: {}, ratio: {} )",
        indices.len(),
        time.len(),
        i_start,
        ratio,
    );

    Ok(indices)
}

/// Symmetric relative closeness test.
#[inline]
fn is_close(a: f64, b: f64, rel_tol: f64) -> bool {
    (a - b).abs() <= rel_tol * f64::max(a.abs(), b.abs())
}
