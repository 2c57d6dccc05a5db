//! Correlated methods layered on a mean-field reference.

extern crate nalgebra as na;

use crate::ccsd_impl::CCSD;
use crate::ci_impl::{CISolver, CiTarget, CASCI, CASSCF, TDA};
use crate::error::ScfError;
use crate::mp2_impl::MP2;
use crate::scf_impl::MeanField;
use na::Vector3;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    MP2,
    CISD,
    CCSD,
    FCI,
    TDA,
    CASCI { ncas: usize, nelecas: usize },
    CASSCF { ncas: usize, nelecas: usize },
}

impl Method {
    /// Single-reference methods by class name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self, ScfError> {
        match name.to_uppercase().as_str() {
            "MP2" => Ok(Method::MP2),
            "CISD" => Ok(Method::CISD),
            "CCSD" => Ok(Method::CCSD),
            "FCI" => Ok(Method::FCI),
            "TDA" => Ok(Method::TDA),
            other => Err(ScfError::Unsupported(format!("post-method {}", other))),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Method::MP2 => "MP2".to_string(),
            Method::CISD => "CISD".to_string(),
            Method::CCSD => "CCSD".to_string(),
            Method::FCI => "FCI".to_string(),
            Method::TDA => "TDA".to_string(),
            Method::CASCI { ncas, nelecas } => format!("CASCI({}, {})", ncas, nelecas),
            Method::CASSCF { ncas, nelecas } => format!("CASSCF({}, {})", ncas, nelecas),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostSettings {
    /// Number of frozen core orbitals
    pub frozen: usize,
    pub conv_tol: f64,
    pub conv_tol_grad: f64,
    pub max_cycle: usize,
    pub nroots: usize,
    /// Excited states requested from TDA.
    pub nstates: usize,
    /// Singlet (true) or triplet excitations of a restricted reference.
    pub singlet: bool,
    pub verbose: i64,
    pub max_memory: f64,
}

impl Default for PostSettings {
    fn default() -> Self {
        PostSettings {
            frozen: 0,
            conv_tol: 1e-7,
            conv_tol_grad: 1e-4,
            max_cycle: 50,
            nroots: 1,
            nstates: 3,
            singlet: true,
            verbose: 3,
            max_memory: 4000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostResult {
    pub e_tot: f64,
    pub e_corr: f64,
    pub converged: bool,
    pub cycles: usize,
    /// Total energies of every computed root (CI methods).
    pub roots: Vec<f64>,
    /// Excitation energies (TDA).
    pub e: Vec<f64>,
}

impl PostResult {
    fn ground(e_ref: f64, e_corr: f64) -> Self {
        PostResult {
            e_tot: e_ref + e_corr,
            e_corr,
            converged: true,
            cycles: 0,
            roots: vec![e_ref + e_corr],
            e: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostMethod {
    pub method: Method,
    pub base: MeanField,
    pub settings: PostSettings,
    result: Option<PostResult>,
}

impl PostMethod {
    pub fn new(method: Method, base: MeanField) -> Self {
        let mut settings = PostSettings::default();
        settings.verbose = base.settings.verbose;
        settings.max_memory = base.settings.max_memory;
        PostMethod {
            method,
            base,
            settings,
            result: None,
        }
    }

    /// Runs the reference first when needed and returns the total energy.
    pub fn kernel(&mut self) -> Result<f64, ScfError> {
        if !self.base.is_run() {
            self.base.kernel()?;
        }
        let e_ref = self.base.e_tot()?;
        let s = &self.settings;
        let result = match self.method {
            Method::MP2 => PostResult::ground(e_ref, MP2::new(s.frozen).kernel(&self.base)?),
            Method::CCSD => {
                let mut cc = CCSD::new(s.frozen);
                cc.conv_tol = s.conv_tol;
                cc.max_cycle = s.max_cycle;
                let e_corr = cc.kernel(&self.base)?;
                PostResult {
                    converged: cc.converged,
                    cycles: cc.cycles,
                    ..PostResult::ground(e_ref, e_corr)
                }
            }
            Method::CISD | Method::FCI => {
                let target = if self.method == Method::CISD {
                    CiTarget::SinglesDoubles
                } else {
                    CiTarget::Full
                };
                let solver = CISolver {
                    frozen: s.frozen,
                    nroots: s.nroots,
                    ..Default::default()
                };
                let ci = solver.kernel(&self.base, target)?;
                PostResult {
                    roots: ci.e_tot,
                    ..PostResult::ground(e_ref, ci.e_corr)
                }
            }
            Method::TDA => {
                let mut tda = TDA::new(s.nstates, s.singlet);
                let e = tda.kernel(&self.base)?;
                PostResult {
                    roots: e.iter().map(|de| e_ref + de).collect(),
                    e,
                    ..PostResult::ground(e_ref, 0.0)
                }
            }
            Method::CASCI { ncas, nelecas } => {
                let mut cas = CASCI::new(ncas, nelecas);
                cas.nroots = s.nroots;
                let e_tot = cas.kernel(&self.base)?;
                PostResult {
                    roots: cas.result.map(|r| r.e_tot).unwrap_or_default(),
                    ..PostResult::ground(e_ref, e_tot - e_ref)
                }
            }
            Method::CASSCF { ncas, nelecas } => {
                let mut mc = CASSCF::new(ncas, nelecas);
                mc.conv_tol = s.conv_tol;
                mc.conv_tol_grad = s.conv_tol_grad;
                mc.max_cycle = s.max_cycle;
                let e_tot = mc.kernel(&self.base)?;
                PostResult {
                    converged: mc.converged,
                    cycles: mc.cycles,
                    ..PostResult::ground(e_ref, e_tot - e_ref)
                }
            }
        };
        info!(
            "{} E_tot = {:.12} Eh, E_corr = {:.12} Eh",
            self.method.name(),
            result.e_tot,
            result.e_corr
        );
        let e_tot = result.e_tot;
        self.result = Some(result);
        Ok(e_tot)
    }

    /// A fresh, not yet run, copy at another geometry.
    pub fn at_geometry(&self, coords: &[Vector3<f64>]) -> Result<PostMethod, ScfError> {
        Ok(PostMethod {
            method: self.method,
            base: self.base.at_geometry(coords)?,
            settings: self.settings.clone(),
            result: None,
        })
    }

    pub fn is_run(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Result<&PostResult, ScfError> {
        self.result.as_ref().ok_or(ScfError::NotRun("post-method"))
    }

    pub fn e_tot(&self) -> Result<f64, ScfError> {
        Ok(self.result()?.e_tot)
    }

    pub fn e_corr(&self) -> Result<f64, ScfError> {
        Ok(self.result()?.e_corr)
    }

    pub fn converged(&self) -> Result<bool, ScfError> {
        Ok(self.result()?.converged)
    }

    /// Excitation energies of a TDA calculation.
    pub fn e(&self) -> Result<&[f64], ScfError> {
        Ok(&self.result()?.e)
    }
}
