mod butterworth;

pub use butterworth::{design, Biquad, FilterCoefficients};

use log::debug;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::errors::PrepError;
use crate::samples::{ImuSample, ImuSeries};

/// How a designed filter runs over a signal.
///
/// The two modes trade phase behavior against causality, which changes how
/// filtered samples line up with their ground-truth targets. The choice is
/// part of the dataset configuration, never an implementation default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Single forward pass from zero initial state. Introduces phase lag
    /// but uses only past samples, so it reproduces what a deployed model
    /// would see in real time.
    Causal,
    /// Forward pass followed by a time-reversed pass. No phase distortion,
    /// but each output depends on future samples, so it is only valid for
    /// offline preparation.
    ZeroPhase,
}

/// A designed low-pass filter bound to an application mode.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalFilter {
    coefficients: FilterCoefficients,
    mode: FilterMode,
}

impl SignalFilter {
    pub fn new(coefficients: FilterCoefficients, mode: FilterMode) -> Self {
        Self { coefficients, mode }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn coefficients(&self) -> &FilterCoefficients {
        &self.coefficients
    }

    /// Filters one channel. The output always has the input's length.
    pub fn apply_channel(&self, channel: &[f64]) -> Vec<f64> {
        match self.mode {
            FilterMode::Causal => run_cascade(self.coefficients.sections(), channel, None),
            FilterMode::ZeroPhase => {
                zero_phase(self.coefficients.sections(), self.coefficients.order(), channel)
            }
        }
    }

    /// Filters a set of channels that must share one length.
    pub fn apply_channels(&self, channels: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, PrepError> {
        if let Some(first) = channels.first() {
            for (index, channel) in channels.iter().enumerate() {
                if channel.len() != first.len() {
                    return Err(PrepError::Shape(format!(
                        "channel {index} has {} samples but channel 0 has {}",
                        channel.len(),
                        first.len()
                    )));
                }
            }
        }
        Ok(channels
            .iter()
            .map(|channel| self.apply_channel(channel))
            .collect())
    }

    /// Filters all six IMU channels, leaving timestamps untouched.
    pub fn apply_series(&self, series: &ImuSeries) -> Result<ImuSeries, PrepError> {
        let channels: Vec<Vec<f64>> = (0..6)
            .map(|axis| {
                series
                    .samples()
                    .iter()
                    .map(|s| match axis {
                        0 => s.gyro.x,
                        1 => s.gyro.y,
                        2 => s.gyro.z,
                        3 => s.acc.x,
                        4 => s.acc.y,
                        _ => s.acc.z,
                    })
                    .collect()
            })
            .collect();
        let filtered = self.apply_channels(&channels)?;
        debug!(
            target: "veloset_core::filter",
            "Filtered {} samples per channel (order {}, {:?})",
            series.len(),
            self.coefficients.order(),
            self.mode
        );

        let samples = series
            .samples()
            .iter()
            .enumerate()
            .map(|(i, s)| ImuSample {
                timestamp: s.timestamp,
                gyro: Vector3::new(filtered[0][i], filtered[1][i], filtered[2][i]),
                acc: Vector3::new(filtered[3][i], filtered[4][i], filtered[5][i]),
            })
            .collect();
        Ok(ImuSeries::from_samples(samples, series.unit()))
    }
}

/// Runs the cascade once over `input`. With `steady_at` the per-section
/// state starts at the value that would hold that output forever, which is
/// what the zero-phase passes need to avoid start-up transients.
fn run_cascade(sections: &[Biquad], input: &[f64], steady_at: Option<f64>) -> Vec<f64> {
    let mut states: Vec<[f64; 2]> = match steady_at {
        Some(x0) => sections.iter().map(|s| s.steady_state(x0)).collect(),
        None => vec![[0.0; 2]; sections.len()],
    };
    input
        .iter()
        .map(|&x| {
            let mut value = x;
            for (section, state) in sections.iter().zip(states.iter_mut()) {
                value = section.step(value, state);
            }
            value
        })
        .collect()
}

/// Forward-backward filtering with odd reflection at both ends.
///
/// The signal is extended by point-reflecting it around each endpoint, run
/// through the cascade forward and backward with steady-state initial
/// conditions, and trimmed back to the original span. Inputs shorter than
/// two samples pass through unchanged.
fn zero_phase(sections: &[Biquad], order: usize, input: &[f64]) -> Vec<f64> {
    if input.len() < 2 {
        return input.to_vec();
    }
    let pad = (3 * (order + 1)).min(input.len() - 1);
    let first = input[0];
    let last = input[input.len() - 1];

    let mut extended = Vec::with_capacity(input.len() + 2 * pad);
    for i in (1..=pad).rev() {
        extended.push(2.0 * first - input[i]);
    }
    extended.extend_from_slice(input);
    for i in 1..=pad {
        extended.push(2.0 * last - input[input.len() - 1 - i]);
    }

    let forward = run_cascade(sections, &extended, Some(extended[0]));
    let reversed: Vec<f64> = forward.into_iter().rev().collect();
    let backward = run_cascade(sections, &reversed, Some(reversed[0]));
    let restored: Vec<f64> = backward.into_iter().rev().collect();

    restored[pad..pad + input.len()].to_vec()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use std::f64::consts::PI;

    use super::*;
    use crate::samples::TimeUnit;

    fn sine(frequency_hz: f64, sample_rate_hz: f64, count: usize) -> Vec<f64> {
        (0..count)
            .map(|i| (2.0 * PI * frequency_hz * i as f64 / sample_rate_hz).sin())
            .collect()
    }

    #[test]
    fn causal_filter_settles_on_constant_input() {
        let filter = SignalFilter::new(design(4, 10.0, 200.0).unwrap(), FilterMode::Causal);
        let output = filter.apply_channel(&vec![1.0; 400]);
        assert_eq!(output.len(), 400);
        // Starts from rest, so the first output is far from the plateau.
        assert!(output[0].abs() < 0.1);
        assert_relative_eq!(output[399], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_phase_preserves_constant_input_exactly() {
        let filter = SignalFilter::new(design(10, 5.0, 100.0).unwrap(), FilterMode::ZeroPhase);
        let output = filter.apply_channel(&vec![2.5; 300]);
        for value in output {
            assert_relative_eq!(value, 2.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn zero_phase_passes_slow_sine_without_lag() {
        let input = sine(0.5, 100.0, 600);
        let filter = SignalFilter::new(design(6, 10.0, 100.0).unwrap(), FilterMode::ZeroPhase);
        let output = filter.apply_channel(&input);
        for i in 100..500 {
            assert_relative_eq!(output[i], input[i], epsilon = 1e-3);
        }
    }

    #[test]
    fn causal_filter_lags_slow_sine() {
        let input = sine(1.0, 200.0, 800);
        let filter = SignalFilter::new(design(6, 5.0, 200.0).unwrap(), FilterMode::Causal);
        let output = filter.apply_channel(&input);
        let worst = input
            .iter()
            .zip(&output)
            .skip(400)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f64, f64::max);
        assert!(worst > 0.3, "expected visible phase lag, worst delta {worst}");
    }

    #[test]
    fn causal_filter_suppresses_high_frequency_component() {
        let sample_rate = 200.0;
        let slow = sine(1.0, sample_rate, 800);
        let mixed: Vec<f64> = slow
            .iter()
            .zip(sine(40.0, sample_rate, 800))
            .map(|(a, b)| a + b)
            .collect();
        let filter = SignalFilter::new(design(6, 5.0, sample_rate).unwrap(), FilterMode::Causal);
        let filtered_mixed = filter.apply_channel(&mixed);
        let filtered_slow = filter.apply_channel(&slow);
        // Linearity: the residual is exactly the filtered 40 Hz component.
        let residual = filtered_mixed
            .iter()
            .zip(&filtered_slow)
            .skip(200)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f64, f64::max);
        assert!(residual < 1e-3, "high-frequency residual {residual}");
    }

    #[test]
    fn short_inputs_pass_through_zero_phase() {
        let filter = SignalFilter::new(design(10, 5.0, 100.0).unwrap(), FilterMode::ZeroPhase);
        assert_eq!(filter.apply_channel(&[]), Vec::<f64>::new());
        assert_eq!(filter.apply_channel(&[3.0]), vec![3.0]);
    }

    #[test]
    fn mismatched_channel_lengths_are_rejected() {
        let filter = SignalFilter::new(design(2, 5.0, 100.0).unwrap(), FilterMode::Causal);
        let result = filter.apply_channels(&[vec![0.0; 10], vec![0.0; 9]]);
        assert!(matches!(result, Err(PrepError::Shape(_))));
    }

    #[test]
    fn series_filtering_keeps_timestamps_and_length() {
        let samples: Vec<ImuSample> = (0..50)
            .map(|i| ImuSample {
                timestamp: i as f64,
                gyro: Vector3::new((i as f64 * 0.7).sin(), 0.0, 1.0),
                acc: Vector3::new(0.0, (i as f64 * 0.3).cos(), 9.81),
            })
            .collect();
        let series = ImuSeries::from_samples(samples, TimeUnit::Seconds);
        let filter = SignalFilter::new(design(4, 10.0, 100.0).unwrap(), FilterMode::ZeroPhase);

        let filtered = filter.apply_series(&series).unwrap();
        assert_eq!(filtered.len(), series.len());
        for (a, b) in series.samples().iter().zip(filtered.samples()) {
            assert_eq!(a.timestamp, b.timestamp);
        }
    }
}
