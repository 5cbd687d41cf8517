use nalgebra as na;

const LCG_A: u64 = 48271;
const LCG_C: u64 = 0;
const LCG_M: u64 = 2147483647;
const UNIFORM_STEPS: u64 = 999;

pub const DEFAULT_SEED: u64 = 1000;

/// Low quality but machine independent uniform numbers in `[0, 1)`.
///
/// `x0 = seed + 1`, `x <- (48271 x) mod (2^31 - 1)`, yields `(x mod 999) / 999`.
#[derive(Debug, Clone)]
pub struct DeterministicUniform {
    x: u64,
}

impl DeterministicUniform {
    pub fn new(seed: u64) -> DeterministicUniform {
        DeterministicUniform { x: seed + 1 }
    }

    pub fn next_f64(&mut self) -> f64 {
        self.x = (LCG_A * self.x + LCG_C) % LCG_M;
        (self.x % UNIFORM_STEPS) as f64 / UNIFORM_STEPS as f64
    }

    /// Three values in `[-1, 1)`.
    pub fn rand3(&mut self) -> na::Vector3<f64> {
        let x = self.next_f64();
        let y = self.next_f64();
        let z = self.next_f64();
        na::Vector3::new(x, y, z) * 2.0 - na::Vector3::repeat(1.0)
    }
}

impl Default for DeterministicUniform {
    fn default() -> Self {
        DeterministicUniform::new(DEFAULT_SEED)
    }
}

impl Iterator for DeterministicUniform {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_f64())
    }
}

/// Rotation matrix of a `(w, x, y, z)` quaternion, not normalized.
pub fn quaternion_to_rotation_matrix(q: &[f64; 4]) -> na::Matrix3<f64> {
    let [w, x, y, z] = *q;
    na::Matrix3::new(
        w * w + x * x - y * y - z * z,
        2.0 * x * y - 2.0 * w * z,
        2.0 * x * z + 2.0 * w * y,
        2.0 * x * y + 2.0 * w * z,
        w * w - x * x + y * y - z * z,
        2.0 * y * z - 2.0 * w * x,
        2.0 * x * z - 2.0 * w * y,
        2.0 * y * z + 2.0 * w * x,
        w * w - x * x - y * y + z * z,
    )
}

/// Axis times angle of the rotation closest to `r`.
pub fn rotation_matrix_to_rotvec(r: &na::Matrix3<f64>) -> na::Vector3<f64> {
    na::Rotation3::from_matrix(r).scaled_axis()
}

/// Small random rotation: `rand3 * max_deg` degrees, redrawn until its angle is above 1e-6 rad.
pub fn random_small_rotation(rng: &mut DeterministicUniform, max_deg: f64) -> na::Matrix3<f64> {
    let (rot_vec, angle) = loop {
        let rot_vec = rng.rand3() * max_deg / 180.0 * std::f64::consts::PI;
        let angle = rot_vec.norm();
        if angle >= 1e-6 {
            break (rot_vec, angle);
        }
    };
    let axis = rot_vec / angle;
    let s = (angle * 0.5).sin();
    quaternion_to_rotation_matrix(&[(angle * 0.5).cos(), s * axis.x, s * axis.y, s * axis.z])
}
