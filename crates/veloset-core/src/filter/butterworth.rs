use std::f64::consts::PI;

use crate::errors::PrepError;

/// One normalized second-order section of the cascade (a0 = 1).
///
/// First-order sections from odd design orders are stored with
/// `b2 = a2 = 0` so the whole cascade runs through the same update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Biquad {
    /// Advances the section by one sample, transposed direct-form II.
    pub(crate) fn step(&self, x: f64, state: &mut [f64; 2]) -> f64 {
        let y = self.b0 * x + state[0];
        state[0] = self.b1 * x - self.a1 * y + state[1];
        state[1] = self.b2 * x - self.a2 * y;
        y
    }

    /// Internal state that holds the output at `x0` indefinitely.
    ///
    /// Exact because every section produced by [`design`] has unit DC gain.
    pub(crate) fn steady_state(&self, x0: f64) -> [f64; 2] {
        [x0 * (1.0 - self.b0), x0 * (self.b2 - self.a2)]
    }
}

/// Cascaded-biquad realization of one low-pass Butterworth design.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCoefficients {
    sections: Vec<Biquad>,
    order: usize,
}

impl FilterCoefficients {
    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    pub fn order(&self) -> usize {
        self.order
    }
}

/// Designs a low-pass Butterworth filter as second-order sections.
///
/// The cutoff is normalized against the Nyquist frequency
/// (`sample_rate_hz / 2`) and must land strictly inside (0, 1). Analog
/// prototype poles are paired into sections with `1/Q = 2 sin(theta)` at the
/// Butterworth pole angles, then discretized with the bilinear transform.
/// Pre-warping the cutoff keeps the -3 dB point where the caller asked for
/// it despite the transform's frequency compression.
pub fn design(
    order: usize,
    cutoff_hz: f64,
    sample_rate_hz: f64,
) -> Result<FilterCoefficients, PrepError> {
    if order == 0 {
        return Err(PrepError::Config(
            "filter order must be at least 1".to_string(),
        ));
    }
    if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 {
        return Err(PrepError::Config(format!(
            "sample rate must be positive, got {sample_rate_hz}"
        )));
    }
    let normalized = cutoff_hz / (sample_rate_hz / 2.0);
    if !(normalized > 0.0 && normalized < 1.0) {
        return Err(PrepError::Config(format!(
            "normalized cutoff must lie strictly inside (0, 1), got {normalized:.6} \
             ({cutoff_hz} Hz at {sample_rate_hz} Hz sampling)"
        )));
    }

    let warped = (PI * normalized / 2.0).tan();
    let mut sections = Vec::with_capacity(order / 2 + order % 2);
    for pair in 0..order / 2 {
        let theta = PI * (2 * pair + 1) as f64 / (2 * order) as f64;
        let inv_q = 2.0 * theta.sin();
        let a0 = 1.0 + inv_q * warped + warped * warped;
        sections.push(Biquad {
            b0: warped * warped / a0,
            b1: 2.0 * warped * warped / a0,
            b2: warped * warped / a0,
            a1: 2.0 * (warped * warped - 1.0) / a0,
            a2: (1.0 - inv_q * warped + warped * warped) / a0,
        });
    }
    if order % 2 == 1 {
        // The real pole at s = -1 becomes a first-order tail section.
        let a0 = 1.0 + warped;
        sections.push(Biquad {
            b0: warped / a0,
            b1: warped / a0,
            b2: 0.0,
            a1: (warped - 1.0) / a0,
            a2: 0.0,
        });
    }
    Ok(FilterCoefficients { sections, order })
}
