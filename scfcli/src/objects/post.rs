use super::{float, floats, to_bool, to_f64, to_i64, to_usize, Attr, Attributes};
use crate::error::Result;
use scf::{Method, PostMethod};
use serde_json::{json, Value};

impl Attributes for PostMethod {
    fn type_name(&self) -> &'static str {
        "PostMethod"
    }

    fn get_attr(&self, name: &str) -> Result<Attr<'_>> {
        let s = &self.settings;
        let value = match name {
            "_scf" => return Ok(Attr::Object(&self.base)),
            "mol" => return Ok(Attr::Object(&self.base.mol)),
            "method" => json!(self.method.name()),
            "frozen" => json!(s.frozen),
            "conv_tol" => float(s.conv_tol),
            "conv_tol_grad" => float(s.conv_tol_grad),
            "max_cycle" | "max_cycle_macro" => json!(s.max_cycle),
            "nroots" => json!(s.nroots),
            "nstates" => json!(s.nstates),
            "singlet" => json!(s.singlet),
            "verbose" => json!(s.verbose),
            "max_memory" => float(s.max_memory),
            "ncas" | "nelecas" => match self.method {
                Method::CASCI { ncas, nelecas } | Method::CASSCF { ncas, nelecas } => {
                    json!(if name == "ncas" { ncas } else { nelecas })
                }
                _ => return Err(self.unknown(name)),
            },
            "e_tot" => {
                let result = self.result()?;
                if self.method == Method::TDA || result.roots.len() > 1 {
                    floats(result.roots.iter())
                } else {
                    float(result.e_tot)
                }
            }
            "e_corr" => float(self.e_corr()?),
            "converged" => json!(self.converged()?),
            "cycles" => json!(self.result()?.cycles),
            "e" => floats(self.e()?.iter()),
            "kernel" => return Ok(Attr::Method),
            _ => return Err(self.unknown(name)),
        };
        Ok(Attr::Data(value))
    }

    fn set_attr(&mut self, name: &str, value: &Value) -> Result<()> {
        let t = self.type_name();
        let s = &mut self.settings;
        match name {
            "frozen" => s.frozen = to_usize(t, name, value)?,
            "conv_tol" => s.conv_tol = to_f64(t, name, value)?,
            "conv_tol_grad" => s.conv_tol_grad = to_f64(t, name, value)?,
            "max_cycle" | "max_cycle_macro" => s.max_cycle = to_usize(t, name, value)?,
            "nroots" => s.nroots = to_usize(t, name, value)?,
            "nstates" => s.nstates = to_usize(t, name, value)?,
            "singlet" => s.singlet = to_bool(t, name, value)?,
            "verbose" => s.verbose = to_i64(t, name, value)?,
            "max_memory" => s.max_memory = to_f64(t, name, value)?,
            _ => return Err(self.unknown(name)),
        }
        Ok(())
    }

    fn attr_object_mut(&mut self, name: &str) -> Option<&mut dyn Attributes> {
        match name {
            "_scf" => Some(&mut self.base),
            "mol" => Some(&mut self.base.mol),
            _ => None,
        }
    }

    fn call(&self, name: &str) -> Result<Value> {
        match name {
            "kernel" => Ok(float(self.e_tot()?)),
            _ => Err(self.unknown(name)),
        }
    }
}
