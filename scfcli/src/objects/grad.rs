use super::{float, matrix, to_f64, to_string, to_usize, Attr, Attributes};
use crate::error::Result;
use scf::{GeometryOptimizer, Gradients};
use serde_json::{json, Value};

impl Attributes for Gradients {
    fn type_name(&self) -> &'static str {
        "Gradients"
    }

    fn get_attr(&self, name: &str) -> Result<Attr<'_>> {
        let value = match name {
            "mol" => return Ok(Attr::Object(self.mol())),
            "step" => float(self.step),
            "de" => matrix(self.de()?),
            "grad" | "kernel" => return Ok(Attr::Method),
            _ => return Err(self.unknown(name)),
        };
        Ok(Attr::Data(value))
    }

    fn set_attr(&mut self, name: &str, value: &Value) -> Result<()> {
        match name {
            "step" => {
                let step = to_f64(self.type_name(), name, value)?;
                if step <= 0.0 {
                    return Err(super::invalid(self.type_name(), name, "step must be positive"));
                }
                self.step = step;
            }
            _ => return Err(self.unknown(name)),
        }
        Ok(())
    }

    fn call(&self, name: &str) -> Result<Value> {
        match name {
            "grad" | "kernel" => Ok(matrix(self.de()?)),
            _ => Err(self.unknown(name)),
        }
    }
}

impl Attributes for GeometryOptimizer {
    fn type_name(&self) -> &'static str {
        "GeometryOptimizer"
    }

    fn get_attr(&self, name: &str) -> Result<Attr<'_>> {
        let value = match name {
            "mol" => return Ok(Attr::Object(&self.result()?.mol)),
            "max_cycle" | "max_steps" => json!(self.max_cycle),
            "conv_tol" => float(self.conv_tol),
            "conv_tol_grad" => float(self.conv_tol_grad),
            "algorithm" => json!(self.algorithm),
            "converged" => json!(self.result()?.converged),
            "e_tot" => float(self.result()?.e_tot),
            "cycles" => json!(self.result()?.cycles),
            _ => return Err(self.unknown(name)),
        };
        Ok(Attr::Data(value))
    }

    fn set_attr(&mut self, name: &str, value: &Value) -> Result<()> {
        let t = self.type_name();
        match name {
            "max_cycle" | "max_steps" => self.max_cycle = to_usize(t, name, value)?,
            "conv_tol" => self.conv_tol = to_f64(t, name, value)?,
            "conv_tol_grad" => self.conv_tol_grad = to_f64(t, name, value)?,
            "algorithm" => {
                let algorithm = to_string(t, name, value)?;
                algorithm
                    .parse::<scf::optim_impl::Algorithm>()
                    .map_err(|e| super::invalid(t, name, e.to_string()))?;
                self.algorithm = algorithm;
            }
            _ => return Err(self.unknown(name)),
        }
        Ok(())
    }

    fn attr_object_mut(&mut self, name: &str) -> Option<&mut dyn Attributes> {
        match name {
            "gradients" => Some(&mut self.gradients),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use scf::{GradTarget, MeanField, Mole};

    fn optimizer() -> GeometryOptimizer {
        let mut mol = Mole::new();
        mol.atom = "H 0 0 0; H 0 0 0.74".to_string();
        mol.build().unwrap();
        let mf = MeanField::new("HF", mol).unwrap();
        GeometryOptimizer::new(Gradients::new(GradTarget::MeanField(mf)))
    }

    #[test]
    fn test_algorithm_is_validated() {
        let mut opt = optimizer();
        opt.set_attr("algorithm", &json!("cg")).unwrap();
        assert_eq!(opt.algorithm, "cg");
        assert!(matches!(
            opt.set_attr("algorithm", &json!("bfgs")),
            Err(Error::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn test_results_before_run() {
        let opt = optimizer();
        assert!(matches!(opt.get_attr("e_tot"), Err(Error::Scf(_))));
        assert!(matches!(opt.get_attr("max_steps").unwrap(), Attr::Data(v) if v == json!(100)));
    }

    #[test]
    fn test_step_must_be_positive() {
        let mut opt = optimizer();
        let grad = opt.attr_object_mut("gradients").unwrap();
        assert!(grad.set_attr("step", &json!(0.0)).is_err());
        grad.set_attr("step", &json!(2e-4)).unwrap();
        assert!((opt.gradients.step - 2e-4).abs() < 1e-15);
    }
}
