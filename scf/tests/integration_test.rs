//! End-to-end checks of the public API: molecule, mean field, the
//! correlated methods on top of it, gradients and geometry optimisation.

use scf::{GradTarget, Gradients, GeometryOptimizer, MeanField, Method, Mole, PostMethod, ScfError};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use approx::assert_relative_eq;

    fn h2() -> Mole {
        let mut mol = Mole::new();
        mol.atom = "H 0 0 0; H 0 0 1.4".to_string();
        mol.unit = "bohr".to_string();
        mol.build().unwrap();
        mol
    }

    fn water() -> Mole {
        let mut mol = Mole::new();
        mol.atom = "O 0 0 0\nH 0 -0.757 0.587\nH 0 0.757 0.587".to_string();
        mol.build().unwrap();
        mol
    }

    fn post(method: Method, mol: Mole) -> PostMethod {
        PostMethod::new(method, MeanField::new("HF", mol).unwrap())
    }

    #[test]
    fn test_h2_method_hierarchy() {
        let mut mf = MeanField::new("RHF", h2()).unwrap();
        let e_hf = mf.kernel().unwrap();
        assert!((e_hf + 1.1167).abs() < 1e-3);

        let mut mp2 = PostMethod::new(Method::MP2, mf.clone());
        mp2.kernel().unwrap();
        assert!((mp2.e_corr().unwrap() + 0.0131).abs() < 5e-4);

        let mut energies = Vec::new();
        for method in [
            Method::CISD,
            Method::CCSD,
            Method::FCI,
            Method::CASCI { ncas: 2, nelecas: 2 },
        ] {
            let mut p = PostMethod::new(method, mf.clone());
            energies.push(p.kernel().unwrap());
            assert!(p.converged().unwrap());
        }
        for e in &energies {
            assert_relative_eq!(*e, energies[0], epsilon = 1e-6);
        }
        assert!((energies[0] - e_hf + 0.0206).abs() < 1e-3);
    }

    #[test]
    fn test_post_method_runs_its_reference() {
        let mut p = post(Method::MP2, h2());
        assert!(!p.base.is_run());
        let e = p.kernel().unwrap();
        assert!(p.base.is_run());
        assert_relative_eq!(e, p.base.e_tot().unwrap() + p.e_corr().unwrap());
    }

    #[test]
    fn test_water_correlation_ordering() {
        let mut mp2 = post(Method::MP2, water());
        mp2.settings.frozen = 1;
        mp2.kernel().unwrap();
        let mut cisd = post(Method::CISD, water());
        cisd.settings.frozen = 1;
        cisd.kernel().unwrap();
        let mut fci = post(Method::FCI, water());
        fci.settings.frozen = 1;
        fci.kernel().unwrap();

        let (e_mp2, e_cisd, e_fci) = (
            mp2.e_corr().unwrap(),
            cisd.e_corr().unwrap(),
            fci.e_corr().unwrap(),
        );
        assert!(e_mp2 < 0.0 && e_cisd < 0.0);
        assert!(e_fci <= e_cisd + 1e-10);
    }

    #[test]
    fn test_tda_through_post_method() {
        let mut p = post(Method::TDA, h2());
        p.settings.nstates = 5;
        p.kernel().unwrap();
        let e = p.e().unwrap();
        assert_eq!(e.len(), 1);
        assert!(e[0] > 0.0);
    }

    #[test]
    fn test_unknown_post_method_name() {
        assert!(matches!(
            Method::from_name("ADC2"),
            Err(ScfError::Unsupported(_))
        ));
        assert_eq!(Method::from_name("ccsd").unwrap(), Method::CCSD);
    }

    #[test]
    fn test_results_before_kernel_are_errors() {
        let p = post(Method::MP2, h2());
        assert!(matches!(p.e_tot(), Err(ScfError::NotRun(_))));
    }

    #[test]
    fn test_gradient_then_optimizer() {
        let mut mol = h2();
        mol.set_geom(&[
            nalgebra::Vector3::zeros(),
            nalgebra::Vector3::new(0.0, 0.0, 1.5),
        ])
        .unwrap();
        let grad = Gradients::new(GradTarget::MeanField(MeanField::new("RHF", mol).unwrap()));
        let mut opt = GeometryOptimizer::new(grad);
        opt.algorithm = "cg".to_string();
        let result = opt.kernel().unwrap();
        assert!(result.converged);
        assert!(result.mol.is_built());
        assert!(result.e_tot < -1.117);
    }
}
