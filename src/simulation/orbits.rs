//! Orbital element representations and conversions.
//!
//! Converts between a relative Cartesian state (position, velocity of a body
//! with respect to its primary) and Keplerian elements (a, e, i, Ω, ω, M).
//! All angles are in radians; `mu` is G times the summed mass of the primary
//! and the body.

use std::f64::consts::{PI, TAU};

use crate::simulation::states::NVec3;

/// Below this eccentricity / node length the corresponding angle is undefined
const EPS: f64 = 1.0e-12;

/// Keplerian orbital elements.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrbitalElements {
    /// Semi-major axis (negative for unbound orbits)
    pub semi_major_axis: f64,

    /// Eccentricity
    pub eccentricity: f64,

    /// Inclination, in [0, π]
    pub inclination: f64,

    /// Longitude of ascending node Ω, in [0, 2π)
    pub longitude_ascending_node: f64,

    /// Argument of periapsis ω, in [0, 2π)
    pub argument_of_periapsis: f64,

    /// True anomaly f, in [0, 2π)
    pub true_anomaly: f64,

    /// Mean anomaly M
    pub mean_anomaly: f64,
}

impl OrbitalElements {
    /// Bound elliptical orbit with the given angles and mean anomaly.
    pub fn new(a: f64, e: f64, inc: f64, node: f64, peri: f64, mean_anomaly: f64) -> Self {
        Self {
            semi_major_axis: a,
            eccentricity: e,
            inclination: inc,
            longitude_ascending_node: node,
            argument_of_periapsis: peri,
            true_anomaly: true_from_mean(mean_anomaly, e),
            mean_anomaly,
        }
    }

    /// Orbital period, T = 2π√(a³/μ)
    pub fn period(&self, mu: f64) -> f64 {
        TAU * (self.semi_major_axis.powi(3) / mu).sqrt()
    }
}

/// Wrap an angle into [0, 2π)
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Solve Kepler's equation M = E - e sin(E) for E by Newton-Raphson.
pub fn solve_keplers_equation(mean_anomaly: f64, eccentricity: f64) -> f64 {
    let m = wrap_angle(mean_anomaly);
    let mut ecc_anomaly = if eccentricity > 0.8 { PI } else { m };

    for _ in 0..64 {
        let f = ecc_anomaly - eccentricity * ecc_anomaly.sin() - m;
        let f_prime = 1.0 - eccentricity * ecc_anomaly.cos();

        let delta = f / f_prime;
        ecc_anomaly -= delta;

        if delta.abs() < 1e-15 {
            break;
        }
    }

    ecc_anomaly
}

/// True anomaly for an elliptical orbit given its mean anomaly
fn true_from_mean(mean_anomaly: f64, e: f64) -> f64 {
    let ecc_anomaly = solve_keplers_equation(mean_anomaly, e);
    let (s, c) = (ecc_anomaly * 0.5).sin_cos();
    wrap_angle(2.0 * ((1.0 + e).sqrt() * s).atan2((1.0 - e).sqrt() * c))
}

/// Convert elliptical Keplerian elements to a relative Cartesian state.
///
/// Returns `(position, velocity)` with respect to the primary.
pub fn orbital_elements_to_cartesian(mu: f64, elements: &OrbitalElements) -> (NVec3, NVec3) {
    let a = elements.semi_major_axis;
    let e = elements.eccentricity;

    let ecc_anomaly = solve_keplers_equation(elements.mean_anomaly, e);
    let (sin_e, cos_e) = ecc_anomaly.sin_cos();
    let sqrt_1me2 = (1.0 - e * e).sqrt();
    let one_minus_ecos = 1.0 - e * cos_e;

    // Perifocal frame: periapsis along P, orbital motion along Q
    let x_p = a * (cos_e - e);
    let y_p = a * sqrt_1me2 * sin_e;

    let n = (mu / a.powi(3)).sqrt();
    let vx_p = -a * n * sin_e / one_minus_ecos;
    let vy_p = a * n * sqrt_1me2 * cos_e / one_minus_ecos;

    let (p_hat, q_hat) = perifocal_basis(
        elements.inclination,
        elements.longitude_ascending_node,
        elements.argument_of_periapsis,
    );

    (x_p * p_hat + y_p * q_hat, vx_p * p_hat + vy_p * q_hat)
}

/// Unit vectors towards periapsis (P) and 90° ahead in the orbit (Q),
/// from the rotation Rz(Ω) Rx(i) Rz(ω).
fn perifocal_basis(inc: f64, node: f64, peri: f64) -> (NVec3, NVec3) {
    let (si, ci) = inc.sin_cos();
    let (sn, cn) = node.sin_cos();
    let (sp, cp) = peri.sin_cos();

    let p_hat = NVec3::new(cn * cp - sn * sp * ci, sn * cp + cn * sp * ci, sp * si);
    let q_hat = NVec3::new(-cn * sp - sn * cp * ci, -sn * sp + cn * cp * ci, cp * si);
    (p_hat, q_hat)
}

/// Convert a relative Cartesian state to Keplerian elements.
///
/// Circular orbits get ω = 0 with the anomaly measured from the node (or the
/// x axis for equatorial orbits); equatorial orbits get Ω = 0.
pub fn cartesian_to_orbital_elements(mu: f64, r_vec: NVec3, v_vec: NVec3) -> OrbitalElements {
    let r = r_vec.norm();
    let v2 = v_vec.norm_squared();

    // Specific orbital energy: ε = v²/2 - μ/r, a = -μ/(2ε)
    let specific_energy = 0.5 * v2 - mu / r;
    let a = -mu / (2.0 * specific_energy);

    let h_vec = r_vec.cross(&v_vec);
    let h = h_vec.norm();

    // Eccentricity vector: (v × h)/μ - r/|r|
    let e_vec = v_vec.cross(&h_vec) / mu - r_vec / r;
    let e = e_vec.norm();

    let inclination = if h > 0.0 { (h_vec.z / h).clamp(-1.0, 1.0).acos() } else { 0.0 };

    // Node vector n = z × h
    let n_vec = NVec3::new(-h_vec.y, h_vec.x, 0.0);
    let n = n_vec.norm();
    let has_node = n > EPS * h.max(1.0);

    let node = if has_node { wrap_angle(n_vec.y.atan2(n_vec.x)) } else { 0.0 };

    let peri = if e > EPS {
        if has_node {
            let cos_w = (n_vec.dot(&e_vec) / (n * e)).clamp(-1.0, 1.0);
            let w = cos_w.acos();
            if e_vec.z < 0.0 { TAU - w } else { w }
        } else {
            let w = e_vec.y.atan2(e_vec.x);
            wrap_angle(if h_vec.z < 0.0 { -w } else { w })
        }
    } else {
        0.0
    };

    let true_anomaly = if e > EPS {
        let cos_f = (e_vec.dot(&r_vec) / (e * r)).clamp(-1.0, 1.0);
        let f = cos_f.acos();
        if r_vec.dot(&v_vec) < 0.0 { TAU - f } else { f }
    } else if has_node {
        // argument of latitude
        let cos_u = (n_vec.dot(&r_vec) / (n * r)).clamp(-1.0, 1.0);
        let u = cos_u.acos();
        if r_vec.z < 0.0 { TAU - u } else { u }
    } else {
        let u = r_vec.y.atan2(r_vec.x);
        wrap_angle(if h_vec.z < 0.0 { -u } else { u })
    };

    let mean_anomaly = if e < 1.0 {
        let (s, c) = (true_anomaly * 0.5).sin_cos();
        let ecc_anomaly = 2.0 * ((1.0 - e).sqrt() * s).atan2((1.0 + e).sqrt() * c);
        wrap_angle(ecc_anomaly - e * ecc_anomaly.sin())
    } else {
        let hyp_anomaly = 2.0 * (((e - 1.0) / (e + 1.0)).sqrt() * (0.5 * true_anomaly).tan()).atanh();
        e * hyp_anomaly.sinh() - hyp_anomaly
    };

    OrbitalElements {
        semi_major_axis: a,
        eccentricity: e,
        inclination,
        longitude_ascending_node: node,
        argument_of_periapsis: peri,
        true_anomaly,
        mean_anomaly,
    }
}
