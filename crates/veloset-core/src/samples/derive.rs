use log::debug;

use super::{GtSample, GtSeries};
use crate::errors::PrepError;

/// Rebuilds linear velocity from consecutive positions.
///
/// Uses a backward difference over the timestamp delta, converted to seconds
/// through the series' declared [`super::TimeUnit`]. The first sample has no
/// backward neighbor and copies the second sample's derived value. Sources
/// that ship pose-only ground truth go through here before alignment.
pub fn velocity_from_positions(series: &GtSeries) -> Result<GtSeries, PrepError> {
    if series.len() < 2 {
        return Err(PrepError::Range(format!(
            "velocity derivation needs at least two ground-truth samples, got {}",
            series.len()
        )));
    }
    let seconds_per_tick = series.unit().seconds_per_tick();
    let samples = series.samples();
    let mut derived = Vec::with_capacity(samples.len());
    for (index, sample) in samples.iter().enumerate() {
        let (prev, cur) = backward_pair(samples, index);
        // Strict timestamp ordering guarantees dt > 0.
        let dt = (cur.timestamp - prev.timestamp) * seconds_per_tick;
        let velocity = (cur.position - prev.position) / dt;
        derived.push(GtSample { velocity, ..*sample });
    }
    debug!(
        target: "veloset_core::samples",
        "Derived linear velocity for {} ground-truth samples",
        derived.len()
    );
    Ok(GtSeries::from_samples(derived, series.unit()))
}

/// Rebuilds body-frame angular velocity from consecutive orientations.
///
/// The relative rotation between neighbors is mapped to its rotation vector
/// and divided by the timestep in seconds. First-sample handling matches
/// [`velocity_from_positions`].
pub fn angular_velocity_from_orientations(series: &GtSeries) -> Result<GtSeries, PrepError> {
    if series.len() < 2 {
        return Err(PrepError::Range(format!(
            "angular velocity derivation needs at least two ground-truth samples, got {}",
            series.len()
        )));
    }
    let seconds_per_tick = series.unit().seconds_per_tick();
    let samples = series.samples();
    let mut derived = Vec::with_capacity(samples.len());
    for (index, sample) in samples.iter().enumerate() {
        let (prev, cur) = backward_pair(samples, index);
        let dt = (cur.timestamp - prev.timestamp) * seconds_per_tick;
        let delta = prev.orientation.inverse() * cur.orientation;
        let angular_velocity = delta.scaled_axis() / dt;
        derived.push(GtSample {
            angular_velocity,
            ..*sample
        });
    }
    debug!(
        target: "veloset_core::samples",
        "Derived angular velocity for {} ground-truth samples",
        derived.len()
    );
    Ok(GtSeries::from_samples(derived, series.unit()))
}

fn backward_pair(samples: &[GtSample], index: usize) -> (&GtSample, &GtSample) {
    if index == 0 {
        (&samples[0], &samples[1])
    } else {
        (&samples[index - 1], &samples[index])
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{UnitQuaternion, Vector3};

    use super::*;
    use crate::samples::TimeUnit;

    fn pose_sample(timestamp: f64, position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> GtSample {
        GtSample {
            timestamp,
            position,
            orientation,
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            acceleration: Vector3::zeros(),
        }
    }

    #[test]
    fn constant_linear_motion_recovers_velocity() {
        let step = Vector3::new(1.0, 2.0, 3.0);
        let samples = (0..4)
            .map(|i| {
                pose_sample(
                    i as f64 * 1e9,
                    step * i as f64,
                    UnitQuaternion::identity(),
                )
            })
            .collect();
        let series = GtSeries::from_samples(samples, TimeUnit::Nanoseconds);

        let derived = velocity_from_positions(&series).unwrap();
        for sample in derived.samples() {
            assert_relative_eq!(sample.velocity, step, epsilon = 1e-9);
        }
    }

    #[test]
    fn first_sample_copies_second_derived_velocity() {
        let samples = vec![
            pose_sample(0.0, Vector3::zeros(), UnitQuaternion::identity()),
            pose_sample(2.0, Vector3::new(4.0, 0.0, 0.0), UnitQuaternion::identity()),
            pose_sample(3.0, Vector3::new(4.0, 1.0, 0.0), UnitQuaternion::identity()),
        ];
        let series = GtSeries::from_samples(samples, TimeUnit::Seconds);

        let derived = velocity_from_positions(&series).unwrap();
        assert_relative_eq!(
            derived.samples()[0].velocity,
            Vector3::new(2.0, 0.0, 0.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            derived.samples()[2].velocity,
            Vector3::new(0.0, 1.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn constant_spin_recovers_angular_rate() {
        let rate = 0.5;
        let samples = (0..5)
            .map(|i| {
                let t = i as f64 * 0.1;
                pose_sample(
                    t,
                    Vector3::zeros(),
                    UnitQuaternion::from_axis_angle(&Vector3::z_axis(), rate * t),
                )
            })
            .collect();
        let series = GtSeries::from_samples(samples, TimeUnit::Seconds);

        let derived = angular_velocity_from_orientations(&series).unwrap();
        for sample in derived.samples() {
            assert_relative_eq!(
                sample.angular_velocity,
                Vector3::new(0.0, 0.0, rate),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn derivation_requires_two_samples() {
        let series = GtSeries::from_samples(
            vec![pose_sample(0.0, Vector3::zeros(), UnitQuaternion::identity())],
            TimeUnit::Seconds,
        );
        assert!(matches!(
            velocity_from_positions(&series),
            Err(PrepError::Range(_))
        ));
        assert!(matches!(
            angular_velocity_from_orientations(&series),
            Err(PrepError::Range(_))
        ));
    }
}
