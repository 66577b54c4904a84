use nalgebra::{Quaternion, UnitQuaternion};

/// Cosine above which the arc is too short for a stable sin-weighted blend.
const PARALLEL_DOT_THRESHOLD: f64 = 1.0 - 1e-9;

/// Spherical interpolation along the shorter of the two great-circle arcs.
///
/// `q` and `-q` encode the same rotation, so when the quaternion dot product
/// is negative the second operand is negated before blending. Nearly
/// parallel inputs fall back to a normalized linear blend because the
/// sin-weighted form degenerates there.
pub fn slerp_shortest(
    a: &UnitQuaternion<f64>,
    b: &UnitQuaternion<f64>,
    t: f64,
) -> UnitQuaternion<f64> {
    let qa = a.into_inner();
    let mut qb = b.into_inner();
    let mut dot = qa.dot(&qb);
    if dot < 0.0 {
        qb = -qb;
        dot = -dot;
    }
    if dot >= PARALLEL_DOT_THRESHOLD {
        return normalize_or_identity(qa.lerp(&qb, t));
    }
    let omega = dot.clamp(-1.0, 1.0).acos();
    let denom = omega.sin();
    let weight_a = ((1.0 - t) * omega).sin() / denom;
    let weight_b = (t * omega).sin() / denom;
    normalize_or_identity(qa * weight_a + qb * weight_b)
}

fn normalize_or_identity(q: Quaternion<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::try_new(q, f64::EPSILON).unwrap_or_else(UnitQuaternion::identity)
}
