#![allow(non_snake_case)]
extern crate nalgebra as na;

use crate::basis::Basis;
use crate::helper::{boys_sequence, factorial};
use itertools::iproduct;
use na::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Serialize, Deserialize, Copy, Clone)]
pub struct GTO1d {
    pub alpha: f64,
    pub l: i32,
    pub center: f64,
    pub norm: f64,
}

impl GTO1d {
    pub fn new(alpha: f64, l: i32, center: f64) -> Self {
        let norm = GTO1d::compute_norm(alpha, l);
        Self {
            alpha,
            l,
            center,
            norm,
        }
    }

    fn compute_norm(alpha: f64, l: i32) -> f64 {
        // N^2 = (2^(3l) * l! * alpha^l * sqrt(2 alpha / pi)) / (2l)!
        let numerator = 2.0_f64.powi(3 * l) * factorial(l) * alpha.powi(l);
        let factor = (2.0 * alpha / PI).sqrt();
        (numerator * factor / factorial(2 * l)).sqrt()
    }

    pub(crate) fn evaluate(&self, x: f64) -> f64 {
        let x = x - self.center;
        self.norm * x.powi(self.l) * (-self.alpha * x.powi(2)).exp()
    }

    /// Hermite expansion coefficient E^{ij}_t of the product of two
    /// unnormalised 1d Gaussians separated by `Qx`.
    pub fn Eab(i: i32, j: i32, t: i32, Qx: f64, a: f64, b: f64) -> f64 {
        let p = a + b;
        let q = a * b / p;

        if t < 0 || t > i + j || i < 0 || j < 0 {
            0.0
        } else if i == 0 && j == 0 && t == 0 {
            (-q * Qx.powi(2)).exp()
        } else if j == 0 {
            GTO1d::Eab(i - 1, j, t - 1, Qx, a, b) / (2.0 * p)
                - GTO1d::Eab(i - 1, j, t, Qx, a, b) * q * Qx / a
                + GTO1d::Eab(i - 1, j, t + 1, Qx, a, b) * ((t + 1) as f64)
        } else {
            GTO1d::Eab(i, j - 1, t - 1, Qx, a, b) / (2.0 * p)
                + GTO1d::Eab(i, j - 1, t, Qx, a, b) * q * Qx / b
                + GTO1d::Eab(i, j - 1, t + 1, Qx, a, b) * ((t + 1) as f64)
        }
    }

    /// All nonzero coefficients E^{ij}_t, t = 0..=i+j, without normalisation.
    pub(crate) fn expansion(a: &GTO1d, b: &GTO1d) -> Vec<f64> {
        let Qx = a.center - b.center;
        (0..=a.l + b.l)
            .map(|t| GTO1d::Eab(a.l, b.l, t, Qx, a.alpha, b.alpha))
            .collect()
    }

    // overlap integral
    pub(crate) fn Sab(a: &GTO1d, b: &GTO1d) -> f64 {
        let p = a.alpha + b.alpha;
        let Qx = a.center - b.center;
        GTO1d::Eab(a.l, b.l, 0, Qx, a.alpha, b.alpha) * (PI / p).sqrt() * a.norm * b.norm
    }

    // kinetic integral
    pub(crate) fn Tab(a: &GTO1d, b: &GTO1d) -> f64 {
        let p = a.alpha + b.alpha;
        let Qx = a.center - b.center;
        let norm = a.norm * b.norm * (PI / p).sqrt();

        let term1 =
            b.l as f64 * (b.l as f64 - 1.0) * GTO1d::Eab(a.l, b.l - 2, 0, Qx, a.alpha, b.alpha);
        let term2 = -2.0
            * b.alpha
            * (2.0 * b.l as f64 + 1.0)
            * GTO1d::Eab(a.l, b.l, 0, Qx, a.alpha, b.alpha);
        let term3 = 4.0 * b.alpha.powi(2) * GTO1d::Eab(a.l, b.l + 2, 0, Qx, a.alpha, b.alpha);

        -0.5 * norm * (term1 + term2 + term3)
    }

    // first moment <a|x - origin|b>
    pub(crate) fn Mab(a: &GTO1d, b: &GTO1d, origin: f64) -> f64 {
        let p = a.alpha + b.alpha;
        let Qx = a.center - b.center;
        let P = (a.alpha * a.center + b.alpha * b.center) / p;
        let e0 = GTO1d::Eab(a.l, b.l, 0, Qx, a.alpha, b.alpha);
        let e1 = GTO1d::Eab(a.l, b.l, 1, Qx, a.alpha, b.alpha);
        (e1 + (P - origin) * e0) * (PI / p).sqrt() * a.norm * b.norm
    }
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone)]
pub struct GTO {
    pub alpha: f64,
    pub l_xyz: Vector3<i32>,
    pub center: Vector3<f64>,
    pub norm: f64,
    pub gto1d: [GTO1d; 3],
}

/// Hermite Coulomb integrals R^0_{tuv} for all t + u + v <= l_max, built
/// level by level from the Boys functions instead of by plain recursion.
pub struct HermiteTable {
    dim: usize,
    values: Vec<f64>,
}

impl HermiteTable {
    pub fn new(l_max: usize, p: f64, PC: Vector3<f64>) -> Self {
        let dim = l_max + 1;
        let idx = |t: usize, u: usize, v: usize| (t * dim + u) * dim + v;
        let boys = boys_sequence(l_max, p * PC.norm_squared());

        let mut upper = vec![0.0; dim * dim * dim];
        for n in (0..=l_max).rev() {
            let mut level = vec![0.0; dim * dim * dim];
            level[idx(0, 0, 0)] = (-2.0 * p).powi(n as i32) * boys[n];
            let order = l_max - n;
            for (t, u, v) in iproduct!(0..=order, 0..=order, 0..=order) {
                if t + u + v == 0 || t + u + v > order {
                    continue;
                }
                level[idx(t, u, v)] = if t > 0 {
                    let mut r = PC.x * upper[idx(t - 1, u, v)];
                    if t > 1 {
                        r += (t - 1) as f64 * upper[idx(t - 2, u, v)];
                    }
                    r
                } else if u > 0 {
                    let mut r = PC.y * upper[idx(t, u - 1, v)];
                    if u > 1 {
                        r += (u - 1) as f64 * upper[idx(t, u - 2, v)];
                    }
                    r
                } else {
                    let mut r = PC.z * upper[idx(t, u, v - 1)];
                    if v > 1 {
                        r += (v - 1) as f64 * upper[idx(t, u, v - 2)];
                    }
                    r
                };
            }
            upper = level;
        }

        Self {
            dim,
            values: upper,
        }
    }

    pub fn get(&self, t: usize, u: usize, v: usize) -> f64 {
        self.values[(t * self.dim + u) * self.dim + v]
    }
}

impl GTO {
    pub fn new(alpha: f64, l_xyz: Vector3<i32>, center: Vector3<f64>) -> Self {
        let gto1d = [
            GTO1d::new(alpha, l_xyz.x, center.x),
            GTO1d::new(alpha, l_xyz.y, center.y),
            GTO1d::new(alpha, l_xyz.z, center.z),
        ];
        let norm = gto1d[0].norm * gto1d[1].norm * gto1d[2].norm;
        Self {
            alpha,
            l_xyz,
            center,
            norm,
            gto1d,
        }
    }

    pub fn set_center(&mut self, center: Vector3<f64>) {
        *self = GTO::new(self.alpha, self.l_xyz, center);
    }

    pub(crate) fn merge(a: &GTO, b: &GTO) -> GTO {
        let center = (a.center * a.alpha + b.center * b.alpha) / (a.alpha + b.alpha);
        let l_xyz = a.l_xyz + b.l_xyz;
        let alpha = a.alpha + b.alpha;
        GTO::new(alpha, l_xyz, center)
    }

    fn expansion(a: &GTO, b: &GTO) -> [Vec<f64>; 3] {
        [
            GTO1d::expansion(&a.gto1d[0], &b.gto1d[0]),
            GTO1d::expansion(&a.gto1d[1], &b.gto1d[1]),
            GTO1d::expansion(&a.gto1d[2], &b.gto1d[2]),
        ]
    }

    fn total_l(&self) -> usize {
        (self.l_xyz.x + self.l_xyz.y + self.l_xyz.z) as usize
    }
}

impl Basis for GTO {
    fn evaluate(&self, r: &Vector3<f64>) -> f64 {
        self.gto1d[0].evaluate(r.x) * self.gto1d[1].evaluate(r.y) * self.gto1d[2].evaluate(r.z)
    }

    fn center(&self) -> Vector3<f64> {
        self.center
    }

    fn Sab(a: &GTO, b: &GTO) -> f64 {
        GTO1d::Sab(&a.gto1d[0], &b.gto1d[0])
            * GTO1d::Sab(&a.gto1d[1], &b.gto1d[1])
            * GTO1d::Sab(&a.gto1d[2], &b.gto1d[2])
    }

    fn Tab(a: &GTO, b: &GTO) -> f64 {
        let s = [
            GTO1d::Sab(&a.gto1d[0], &b.gto1d[0]),
            GTO1d::Sab(&a.gto1d[1], &b.gto1d[1]),
            GTO1d::Sab(&a.gto1d[2], &b.gto1d[2]),
        ];
        GTO1d::Tab(&a.gto1d[0], &b.gto1d[0]) * s[1] * s[2]
            + GTO1d::Tab(&a.gto1d[1], &b.gto1d[1]) * s[0] * s[2]
            + GTO1d::Tab(&a.gto1d[2], &b.gto1d[2]) * s[0] * s[1]
    }

    fn Vab(a: &GTO, b: &GTO, R: Vector3<f64>, Z: u32) -> f64 {
        let c = GTO::merge(a, b);
        let dr = c.center - R;
        let [ex, ey, ez] = GTO::expansion(a, b);
        let table = HermiteTable::new(c.total_l(), c.alpha, dr);

        let val = iproduct!(0..ex.len(), 0..ey.len(), 0..ez.len())
            .map(|(t, u, v)| ex[t] * ey[u] * ez[v] * table.get(t, u, v))
            .sum::<f64>();

        // minus sign, nuclear attraction
        -1.0 * a.norm * b.norm * val * 2.0 * PI * (Z as f64) / c.alpha
    }

    fn JKabcd(a: &GTO, b: &GTO, c: &GTO, d: &GTO) -> f64 {
        let e = GTO::merge(a, b);
        let f = GTO::merge(c, d);
        let dr = e.center - f.center;
        let alpha = e.alpha * f.alpha / (e.alpha + f.alpha);

        let [eab_x, eab_y, eab_z] = GTO::expansion(a, b);
        let [ecd_x, ecd_y, ecd_z] = GTO::expansion(c, d);
        let table = HermiteTable::new(e.total_l() + f.total_l(), alpha, dr);

        let mut val = 0.0;
        for (t, u, v) in iproduct!(0..eab_x.len(), 0..eab_y.len(), 0..eab_z.len()) {
            let eab = eab_x[t] * eab_y[u] * eab_z[v];
            if eab == 0.0 {
                continue;
            }
            for (tau, nu, phi) in iproduct!(0..ecd_x.len(), 0..ecd_y.len(), 0..ecd_z.len()) {
                // odd tau + nu + phi flips the sign
                let sgn = if (tau + nu + phi) % 2 == 0 { 1.0 } else { -1.0 };
                val += eab
                    * ecd_x[tau]
                    * ecd_y[nu]
                    * ecd_z[phi]
                    * sgn
                    * table.get(t + tau, u + nu, v + phi);
            }
        }

        a.norm * b.norm * c.norm * d.norm * val * 2.0 * PI.powf(2.5)
            / (e.alpha * f.alpha * (e.alpha + f.alpha).sqrt())
    }

    fn Dab(a: &GTO, b: &GTO, origin: Vector3<f64>) -> Vector3<f64> {
        let s = [
            GTO1d::Sab(&a.gto1d[0], &b.gto1d[0]),
            GTO1d::Sab(&a.gto1d[1], &b.gto1d[1]),
            GTO1d::Sab(&a.gto1d[2], &b.gto1d[2]),
        ];
        Vector3::new(
            GTO1d::Mab(&a.gto1d[0], &b.gto1d[0], origin.x) * s[1] * s[2],
            GTO1d::Mab(&a.gto1d[1], &b.gto1d[1], origin.y) * s[0] * s[2],
            GTO1d::Mab(&a.gto1d[2], &b.gto1d[2], origin.z) * s[0] * s[1],
        )
    }
}
