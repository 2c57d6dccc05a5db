use super::{
    float, matrix, to_bool, to_f64, to_i64, to_opt_string, to_string, to_usize, vector, vector3,
    Attr, Attributes,
};
use crate::error::Result;
use scf::scf_impl::Orbitals;
use scf::MeanField;
use serde_json::{json, Value};

/// One array for a restricted solution, `[alpha, beta]` otherwise.
fn per_spin<F>(orbitals: &[Orbitals], f: F) -> Value
where
    F: Fn(&Orbitals) -> Value,
{
    match orbitals {
        [single] => f(single),
        channels => Value::Array(channels.iter().map(f).collect()),
    }
}

impl Attributes for MeanField {
    fn type_name(&self) -> &'static str {
        "MeanField"
    }

    fn get_attr(&self, name: &str) -> Result<Attr<'_>> {
        let s = &self.settings;
        let value = match name {
            "mol" => return Ok(Attr::Object(&self.mol)),
            "method" => json!(self.method),
            "conv_tol" => float(s.conv_tol),
            "conv_tol_grad" => s.conv_tol_grad.map_or(Value::Null, float),
            "max_cycle" => json!(s.max_cycle),
            "diis" => json!(s.diis),
            "diis_space" => json!(s.diis_space),
            "diis_start_cycle" => json!(s.diis_start_cycle),
            "level_shift" => float(s.level_shift),
            "damp" => float(s.damp),
            "init_guess" => json!(s.init_guess),
            "verbose" => json!(s.verbose),
            "max_memory" => float(s.max_memory),
            "direct_scf" => json!(s.direct_scf),
            "chkfile" => json!(s.chkfile),
            "e_tot" => float(self.e_tot()?),
            "converged" => json!(self.converged()?),
            "cycles" => json!(self.solution()?.cycles),
            "mo_energy" => per_spin(&self.solution()?.orbitals, |o| vector(&o.mo_energy)),
            "mo_coeff" => per_spin(&self.solution()?.orbitals, |o| matrix(&o.mo_coeff)),
            "mo_occ" => per_spin(&self.solution()?.orbitals, |o| vector(&o.mo_occ)),
            "energy_nuc" | "energy_elec" | "energy_tot" | "dip_moment" | "make_rdm1"
            | "spin_square" | "get_ovlp" | "get_hcore" | "kernel" => return Ok(Attr::Method),
            _ => return Err(self.unknown(name)),
        };
        Ok(Attr::Data(value))
    }

    fn set_attr(&mut self, name: &str, value: &Value) -> Result<()> {
        let t = self.type_name();
        let s = &mut self.settings;
        match name {
            "conv_tol" => s.conv_tol = to_f64(t, name, value)?,
            "conv_tol_grad" => {
                s.conv_tol_grad = match value {
                    Value::Null => None,
                    other => Some(to_f64(t, name, other)?),
                }
            }
            "max_cycle" => s.max_cycle = to_usize(t, name, value)?,
            "diis" => s.diis = to_bool(t, name, value)?,
            "diis_space" => s.diis_space = to_usize(t, name, value)?,
            "diis_start_cycle" => s.diis_start_cycle = to_usize(t, name, value)?,
            "level_shift" => s.level_shift = to_f64(t, name, value)?,
            "damp" => s.damp = to_f64(t, name, value)?,
            "init_guess" => s.init_guess = to_string(t, name, value)?,
            "verbose" => s.verbose = to_i64(t, name, value)?,
            "max_memory" => s.max_memory = to_f64(t, name, value)?,
            "direct_scf" => s.direct_scf = to_bool(t, name, value)?,
            "chkfile" => s.chkfile = to_opt_string(t, name, value)?,
            _ => return Err(self.unknown(name)),
        }
        Ok(())
    }

    fn attr_object_mut(&mut self, name: &str) -> Option<&mut dyn Attributes> {
        match name {
            "mol" => Some(&mut self.mol),
            _ => None,
        }
    }

    fn call(&self, name: &str) -> Result<Value> {
        match name {
            "energy_nuc" => Ok(float(self.energy_nuc())),
            "energy_elec" => Ok(float(self.energy_elec()?)),
            "energy_tot" | "kernel" => Ok(float(self.e_tot()?)),
            "dip_moment" => Ok(vector3(&self.dip_moment()?)),
            "make_rdm1" => Ok(matrix(&self.make_rdm1()?)),
            "spin_square" => {
                let (ss, multiplicity) = self.spin_square()?;
                Ok(json!([ss, multiplicity]))
            }
            "get_ovlp" => Ok(matrix(&self.integrals()?.overlap)),
            "get_hcore" => Ok(matrix(&self.integrals()?.hcore)),
            _ => Err(self.unknown(name)),
        }
    }
}
