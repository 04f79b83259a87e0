//! Random draws for initial conditions
//!
//! - [`density`]: semimajor axes from a truncated power law dN/da ∝ a^-p
//! - [`gen_disk`]: orientation angles for a nearly aligned eccentric disk

use std::f64::consts::TAU;

use rand::Rng;
use rand_distr::StandardNormal;

use crate::simulation::orbits::wrap_angle;
use crate::simulation::states::NVec3;

/// Inverse-CDF transform of a uniform `r` in [0, 1) onto the power law
/// dN/da ∝ a^-p truncated to [min, max]. p = 1 is log-uniform.
pub fn density_from_uniform(r: f64, min: f64, max: f64, p: f64) -> f64 {
    if p == 1.0 {
        min * (r * (max / min).ln()).exp()
    } else {
        let q = 1.0 - p;
        let lo = min.powf(q);
        let hi = max.powf(q);
        let a = (r * (hi - lo) + lo).powf(1.0 / q);
        // keep rounding from stepping outside the support
        a.clamp(min.min(max), max.max(min))
    }
}

/// One semimajor axis from the truncated power law; caller ensures
/// `min > 0` and `max >= min`.
pub fn density<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64, p: f64) -> f64 {
    density_from_uniform(rng.gen::<f64>(), min, max, p)
}

/// Inclination, longitude of ascending node and argument of periapsis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DiskOrientation {
    pub inclination: f64,
    pub node: f64,
    pub periapsis: f64,
}

/// Rotate `vec` by `angle` about the unit vector `axis` (Rodrigues)
pub fn rotate_vec(angle: f64, axis: &NVec3, vec: &NVec3) -> NVec3 {
    let (s, c) = angle.sin_cos();
    vec * c + axis.cross(vec) * s + axis * axis.dot(vec) * (1.0 - c)
}

/// Orientation obtained by tilting aligned eccentricity (x) and angular
/// momentum (z) unit vectors.
///
/// j is rotated by `angle1` about e and by `angle2` about b = j × e; e is
/// rotated by `angle2` about b and then by `angle3` about the new j.
pub fn disk_orientation(angle1: f64, angle2: f64, angle3: f64) -> DiskOrientation {
    let z = NVec3::z();
    let mut ehat = NVec3::x();
    let mut jhat = z;
    let bhat = jhat.cross(&ehat);

    jhat = rotate_vec(angle1, &ehat, &jhat);
    jhat = rotate_vec(angle2, &bhat, &jhat);
    ehat = rotate_vec(angle2, &bhat, &ehat);
    ehat = rotate_vec(angle3, &jhat, &ehat);

    let inclination = jhat.z.clamp(-1.0, 1.0).acos();
    let node_vec = z.cross(&jhat);
    let node_len = node_vec.norm();

    // j still along ±z: no line of nodes, measure ω from the x axis
    if node_len < 1.0e-15 {
        return DiskOrientation {
            inclination,
            node: 0.0,
            periapsis: wrap_angle(ehat.y.atan2(ehat.x)),
        };
    }

    let n = node_vec / node_len;
    let node = n.y.atan2(n.x);
    let mut periapsis = n.dot(&ehat).clamp(-1.0, 1.0).acos();
    if ehat.z < 0.0 {
        periapsis = TAU - periapsis;
    }

    DiskOrientation {
        inclination,
        node,
        periapsis,
    }
}

/// Random disk orientation; each tilt angle is Normal(0, `spread`) radians.
pub fn gen_disk<R: Rng + ?Sized>(rng: &mut R, spread: f64) -> DiskOrientation {
    let mut tilt = || {
        let z: f64 = rng.sample(StandardNormal);
        z * spread
    };
    let (a1, a2, a3) = (tilt(), tilt(), tilt());
    disk_orientation(a1, a2, a3)
}
