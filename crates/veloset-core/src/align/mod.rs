mod orientation;

pub use orientation::slerp_shortest;

use log::debug;

use crate::errors::PrepError;
use crate::samples::{GtSample, GtSeries, ImuSample, ImuSeries};

/// Trims the IMU series to the ground-truth span and synthesizes one
/// ground-truth state per surviving IMU timestamp.
///
/// Only IMU samples strictly inside the open interval between the first and
/// last ground-truth timestamps survive. The strict bound guarantees that
/// every retained sample has a bracketing pair on both sides, so no state is
/// ever extrapolated. Vector fields blend linearly; orientation goes through
/// [`slerp_shortest`]. Both outputs have identical length and timestamps.
pub fn align(imu: &ImuSeries, gt: &GtSeries) -> Result<(ImuSeries, GtSeries), PrepError> {
    if gt.len() < 2 {
        return Err(PrepError::Range(format!(
            "alignment needs at least two ground-truth samples to bracket IMU data, got {}",
            gt.len()
        )));
    }
    let span_start = gt.samples()[0].timestamp;
    let span_end = gt.samples()[gt.len() - 1].timestamp;

    let retained: Vec<ImuSample> = imu
        .samples()
        .iter()
        .copied()
        .filter(|s| s.timestamp > span_start && s.timestamp < span_end)
        .collect();
    if retained.is_empty() {
        return Err(PrepError::Range(format!(
            "no IMU samples inside the ground-truth span ({span_start:.6}, {span_end:.6})"
        )));
    }
    debug!(
        target: "veloset_core::align",
        "Trimmed IMU series from {} to {} samples inside ground-truth span ({:.6}, {:.6})",
        imu.len(),
        retained.len(),
        span_start,
        span_end
    );

    let synthesized: Vec<GtSample> = retained
        .iter()
        .map(|s| interpolate_state(gt, s.timestamp))
        .collect();

    Ok((
        ImuSeries::from_samples(retained, imu.unit()),
        GtSeries::from_samples(synthesized, gt.unit()),
    ))
}

/// Interpolated ground-truth state at `timestamp`, which must lie strictly
/// inside the series' span. The trim in [`align`] establishes that bound.
fn interpolate_state(gt: &GtSeries, timestamp: f64) -> GtSample {
    let samples = gt.samples();
    let upper = samples.partition_point(|s| s.timestamp <= timestamp);
    let (before, after) = (&samples[upper - 1], &samples[upper]);
    let alpha = (timestamp - before.timestamp) / (after.timestamp - before.timestamp);
    GtSample {
        timestamp,
        position: before.position.lerp(&after.position, alpha),
        orientation: slerp_shortest(&before.orientation, &after.orientation, alpha),
        velocity: before.velocity.lerp(&after.velocity, alpha),
        angular_velocity: before
            .angular_velocity
            .lerp(&after.angular_velocity, alpha),
        acceleration: before.acceleration.lerp(&after.acceleration, alpha),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{UnitQuaternion, Vector3};

    use super::*;
    use crate::samples::TimeUnit;

    fn imu_at(timestamp: f64) -> ImuSample {
        ImuSample {
            timestamp,
            gyro: Vector3::new(0.1, 0.2, 0.3),
            acc: Vector3::new(0.0, 0.0, 9.81),
        }
    }

    fn gt_at(timestamp: f64, velocity: Vector3<f64>) -> GtSample {
        GtSample {
            timestamp,
            position: velocity * timestamp,
            orientation: UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.01 * timestamp),
            velocity,
            angular_velocity: Vector3::zeros(),
            acceleration: Vector3::zeros(),
        }
    }

    fn fixture() -> (ImuSeries, GtSeries) {
        let imu = ImuSeries::from_samples(
            (0..=10).map(|i| imu_at(i as f64)).collect(),
            TimeUnit::Seconds,
        );
        let gt = GtSeries::from_samples(
            vec![
                gt_at(2.0, Vector3::new(1.0, 0.0, 0.0)),
                gt_at(5.0, Vector3::new(4.0, 0.0, 0.0)),
                gt_at(8.0, Vector3::new(1.0, 0.0, 0.0)),
            ],
            TimeUnit::Seconds,
        );
        (imu, gt)
    }

    #[test]
    fn trims_to_strict_interior_of_ground_truth_span() {
        let (imu, gt) = fixture();
        let (trimmed, synthesized) = align(&imu, &gt).unwrap();

        let timestamps: Vec<f64> = trimmed.samples().iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(trimmed.len(), synthesized.len());
        for (imu_sample, gt_sample) in trimmed.samples().iter().zip(synthesized.samples()) {
            assert_eq!(imu_sample.timestamp, gt_sample.timestamp);
        }
    }

    #[test]
    fn interpolates_vector_fields_linearly() {
        let (imu, gt) = fixture();
        let (_, synthesized) = align(&imu, &gt).unwrap();

        // t = 3 sits a third of the way from t = 2 to t = 5.
        assert_relative_eq!(
            synthesized.samples()[0].velocity,
            Vector3::new(2.0, 0.0, 0.0),
            epsilon = 1e-12
        );
        // t = 5 is an exact knot.
        assert_relative_eq!(
            synthesized.samples()[2].velocity,
            Vector3::new(4.0, 0.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn interpolated_orientations_are_unit_norm() {
        let (imu, gt) = fixture();
        let (_, synthesized) = align(&imu, &gt).unwrap();
        for sample in synthesized.samples() {
            assert_relative_eq!(sample.orientation.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn boundary_timestamps_are_excluded() {
        let imu = ImuSeries::from_samples(
            vec![imu_at(2.0), imu_at(4.0), imu_at(8.0)],
            TimeUnit::Seconds,
        );
        let gt = GtSeries::from_samples(
            vec![
                gt_at(2.0, Vector3::zeros()),
                gt_at(8.0, Vector3::zeros()),
            ],
            TimeUnit::Seconds,
        );
        let (trimmed, _) = align(&imu, &gt).unwrap();
        assert_eq!(trimmed.len(), 1);
        assert_eq!(trimmed.first_timestamp(), Some(4.0));
    }

    #[test]
    fn rejects_short_or_disjoint_ground_truth() {
        let (imu, _) = fixture();
        let single = GtSeries::from_samples(
            vec![gt_at(5.0, Vector3::zeros())],
            TimeUnit::Seconds,
        );
        assert!(matches!(align(&imu, &single), Err(PrepError::Range(_))));

        let disjoint = GtSeries::from_samples(
            vec![gt_at(100.0, Vector3::zeros()), gt_at(200.0, Vector3::zeros())],
            TimeUnit::Seconds,
        );
        assert!(matches!(align(&imu, &disjoint), Err(PrepError::Range(_))));
    }
}
