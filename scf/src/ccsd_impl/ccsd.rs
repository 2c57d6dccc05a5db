extern crate nalgebra as na;

use crate::error::ScfError;
use crate::integrals::Tensor4;
use crate::scf_impl::MeanField;
use crate::spin_orbital::SpinOrbitalSystem;
use na::DMatrix;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct CCSD {
    pub frozen: usize,
    pub max_cycle: usize,
    pub conv_tol: f64,
    pub conv_tol_normt: f64,
    pub e_corr: Option<f64>,
    pub converged: bool,
    pub cycles: usize,
}

impl Default for CCSD {
    fn default() -> Self {
        CCSD {
            frozen: 0,
            max_cycle: 50,
            conv_tol: 1e-7,
            conv_tol_normt: 1e-5,
            e_corr: None,
            converged: false,
            cycles: 0,
        }
    }
}

struct Amplitudes {
    t1: DMatrix<f64>,
    t2: Tensor4,
}

impl Amplitudes {
    fn tau(&self, i: usize, j: usize, a: usize, b: usize) -> f64 {
        self.t2.get(i, j, a, b) + self.t1[(i, a)] * self.t1[(j, b)]
            - self.t1[(i, b)] * self.t1[(j, a)]
    }

    fn tau_tilde(&self, i: usize, j: usize, a: usize, b: usize) -> f64 {
        self.t2.get(i, j, a, b)
            + 0.5 * (self.t1[(i, a)] * self.t1[(j, b)] - self.t1[(i, b)] * self.t1[(j, a)])
    }
}

impl CCSD {
    pub fn new(frozen: usize) -> Self {
        CCSD {
            frozen,
            ..Default::default()
        }
    }

    pub fn kernel(&mut self, mf: &MeanField) -> Result<f64, ScfError> {
        let so = SpinOrbitalSystem::from_mean_field(mf, self.frozen)?;
        info!("===========================================");
        info!("     CCSD");
        info!("===========================================");
        info!("Occupied spin orbitals: {}", so.nocc);
        info!("Virtual spin orbitals: {}", so.nvirt);
        info!("Max iterations: {}", self.max_cycle);
        info!("Convergence threshold: {:.2e}", self.conv_tol);
        let e_corr = self.solve(&so);
        Ok(e_corr)
    }

    fn energy(so: &SpinOrbitalSystem, amps: &Amplitudes) -> f64 {
        let o = so.nocc;
        let v = so.nvirt;
        let mut e = 0.0;
        for i in 0..o {
            for j in 0..o {
                for a in 0..v {
                    for b in 0..v {
                        let g = so.g.get(i, j, o + a, o + b);
                        e += 0.25 * g * amps.t2.get(i, j, a, b)
                            + 0.5 * g * amps.t1[(i, a)] * amps.t1[(j, b)];
                    }
                }
            }
        }
        e
    }

    pub(crate) fn solve(&mut self, so: &SpinOrbitalSystem) -> f64 {
        let o = so.nocc;
        let v = so.nvirt;

        // MP2 guess
        let mut t2 = Tensor4::zeros([o, o, v, v]);
        for i in 0..o {
            for j in 0..o {
                for a in 0..v {
                    for b in 0..v {
                        let d = so.eps[i] + so.eps[j] - so.eps[o + a] - so.eps[o + b];
                        t2.set(i, j, a, b, so.g.get(i, j, o + a, o + b) / d);
                    }
                }
            }
        }
        let mut amps = Amplitudes {
            t1: DMatrix::zeros(o, v),
            t2,
        };
        let mut e_old = Self::energy(so, &amps);
        info!("Initial energy (MP2): {:.12} Eh", e_old);

        self.converged = false;
        for cycle in 0..self.max_cycle {
            let next = Self::update(so, &amps);
            let dt1 = (&next.t1 - &amps.t1).norm_squared();
            let dt2: f64 = (0..o)
                .flat_map(|i| (0..o).map(move |j| (i, j)))
                .map(|(i, j)| {
                    let mut s = 0.0;
                    for a in 0..v {
                        for b in 0..v {
                            s += (next.t2.get(i, j, a, b) - amps.t2.get(i, j, a, b)).powi(2);
                        }
                    }
                    s
                })
                .sum();
            let normt = (dt1 + dt2).sqrt();
            amps = next;
            let e_new = Self::energy(so, &amps);
            let delta = e_new - e_old;
            debug!(
                "cycle {:3}: E_corr = {:.12}  dE = {:.3e}  |dt| = {:.3e}",
                cycle, e_new, delta, normt
            );
            e_old = e_new;
            self.cycles = cycle + 1;
            if delta.abs() < self.conv_tol && normt < self.conv_tol_normt {
                self.converged = true;
                break;
            }
        }

        if self.converged {
            info!(
                "CCSD converged in {} iterations, correlation energy = {:.12} Eh",
                self.cycles, e_old
            );
        } else {
            info!(
                "CCSD not converged after {} iterations, correlation energy = {:.12} Eh",
                self.cycles, e_old
            );
        }
        self.e_corr = Some(e_old);
        e_old
    }

    fn update(so: &SpinOrbitalSystem, amps: &Amplitudes) -> Amplitudes {
        let o = so.nocc;
        let v = so.nvirt;
        let g = |p: usize, q: usize, r: usize, s: usize| so.g.get(p, q, r, s);
        let t1 = &amps.t1;
        let t2 = &amps.t2;

        let mut fae = DMatrix::zeros(v, v);
        for a in 0..v {
            for e in 0..v {
                let mut x = 0.0;
                for m in 0..o {
                    for f in 0..v {
                        x += t1[(m, f)] * g(m, o + a, o + f, o + e);
                        for n in 0..o {
                            x -= 0.5 * amps.tau_tilde(m, n, a, f) * g(m, n, o + e, o + f);
                        }
                    }
                }
                fae[(a, e)] = x;
            }
        }

        let mut fmi = DMatrix::zeros(o, o);
        for m in 0..o {
            for i in 0..o {
                let mut x = 0.0;
                for n in 0..o {
                    for e in 0..v {
                        x += t1[(n, e)] * g(m, n, i, o + e);
                        for f in 0..v {
                            x += 0.5 * amps.tau_tilde(i, n, e, f) * g(m, n, o + e, o + f);
                        }
                    }
                }
                fmi[(m, i)] = x;
            }
        }

        let mut fme = DMatrix::zeros(o, v);
        for m in 0..o {
            for e in 0..v {
                let mut x = 0.0;
                for n in 0..o {
                    for f in 0..v {
                        x += t1[(n, f)] * g(m, n, o + e, o + f);
                    }
                }
                fme[(m, e)] = x;
            }
        }

        let mut wmnij = Tensor4::zeros([o, o, o, o]);
        for (m, n, i, j) in itertools::iproduct!(0..o, 0..o, 0..o, 0..o) {
            let mut x = g(m, n, i, j);
            for e in 0..v {
                x += t1[(j, e)] * g(m, n, i, o + e) - t1[(i, e)] * g(m, n, j, o + e);
                for f in 0..v {
                    x += 0.25 * amps.tau(i, j, e, f) * g(m, n, o + e, o + f);
                }
            }
            wmnij.set(m, n, i, j, x);
        }

        let mut wabef = Tensor4::zeros([v, v, v, v]);
        for (a, b, e, f) in itertools::iproduct!(0..v, 0..v, 0..v, 0..v) {
            let mut x = g(o + a, o + b, o + e, o + f);
            for m in 0..o {
                x -= t1[(m, b)] * g(o + a, m, o + e, o + f) - t1[(m, a)] * g(o + b, m, o + e, o + f);
                for n in 0..o {
                    x += 0.25 * amps.tau(m, n, a, b) * g(m, n, o + e, o + f);
                }
            }
            wabef.set(a, b, e, f, x);
        }

        // W_mbej stored as [m, b, e, j]
        let mut wmbej = Tensor4::zeros([o, v, v, o]);
        for (m, b, e, j) in itertools::iproduct!(0..o, 0..v, 0..v, 0..o) {
            let mut x = g(m, o + b, o + e, j);
            for f in 0..v {
                x += t1[(j, f)] * g(m, o + b, o + e, o + f);
            }
            for n in 0..o {
                x -= t1[(n, b)] * g(m, n, o + e, j);
                for f in 0..v {
                    x -= (0.5 * t2.get(j, n, f, b) + t1[(j, f)] * t1[(n, b)])
                        * g(m, n, o + e, o + f);
                }
            }
            wmbej.set(m, b, e, j, x);
        }

        let mut t1_new = DMatrix::zeros(o, v);
        for i in 0..o {
            for a in 0..v {
                let mut r = 0.0;
                for e in 0..v {
                    r += t1[(i, e)] * fae[(a, e)];
                }
                for m in 0..o {
                    r -= t1[(m, a)] * fmi[(m, i)];
                    for e in 0..v {
                        r += t2.get(i, m, a, e) * fme[(m, e)];
                        for f in 0..v {
                            r -= 0.5 * t2.get(i, m, e, f) * g(m, o + a, o + e, o + f);
                        }
                        for n in 0..o {
                            r -= 0.5 * t2.get(m, n, a, e) * g(n, m, o + e, i);
                        }
                    }
                }
                for n in 0..o {
                    for f in 0..v {
                        r -= t1[(n, f)] * g(n, o + a, i, o + f);
                    }
                }
                t1_new[(i, a)] = r / (so.eps[i] - so.eps[o + a]);
            }
        }

        let fae_t = DMatrix::from_fn(v, v, |b, e| {
            fae[(b, e)] - 0.5 * (0..o).map(|m| t1[(m, b)] * fme[(m, e)]).sum::<f64>()
        });
        let fmi_t = DMatrix::from_fn(o, o, |m, j| {
            fmi[(m, j)] + 0.5 * (0..v).map(|e| t1[(j, e)] * fme[(m, e)]).sum::<f64>()
        });

        let mut x = Tensor4::zeros([o, o, v, v]);
        for (i, j, a, b) in itertools::iproduct!(0..o, 0..o, 0..v, 0..v) {
            let mut s = 0.0;
            for m in 0..o {
                for e in 0..v {
                    s += t2.get(i, m, a, e) * wmbej.get(m, b, e, j)
                        - t1[(i, e)] * t1[(m, a)] * g(m, o + b, o + e, j);
                }
            }
            x.set(i, j, a, b, s);
        }

        let mut t2_new = Tensor4::zeros([o, o, v, v]);
        for (i, j, a, b) in itertools::iproduct!(0..o, 0..o, 0..v, 0..v) {
            let mut r = g(i, j, o + a, o + b);
            for e in 0..v {
                r += t2.get(i, j, a, e) * fae_t[(b, e)] - t2.get(i, j, b, e) * fae_t[(a, e)];
                r += t1[(i, e)] * g(o + a, o + b, o + e, j) - t1[(j, e)] * g(o + a, o + b, o + e, i);
                for f in 0..v {
                    r += 0.5 * amps.tau(i, j, e, f) * wabef.get(a, b, e, f);
                }
            }
            for m in 0..o {
                r -= t2.get(i, m, a, b) * fmi_t[(m, j)] - t2.get(j, m, a, b) * fmi_t[(m, i)];
                r -= t1[(m, a)] * g(m, o + b, i, j) - t1[(m, b)] * g(m, o + a, i, j);
                for n in 0..o {
                    r += 0.5 * amps.tau(m, n, a, b) * wmnij.get(m, n, i, j);
                }
            }
            r += x.get(i, j, a, b) - x.get(j, i, a, b) - x.get(i, j, b, a) + x.get(j, i, b, a);
            let d = so.eps[i] + so.eps[j] - so.eps[o + a] - so.eps[o + b];
            t2_new.set(i, j, a, b, r / d);
        }

        Amplitudes {
            t1: t1_new,
            t2: t2_new,
        }
    }
}
