#[cfg(test)]
mod tests {
    use crate::basis::Basis;
    use crate::cgto::ContractedGTO;
    use crate::gto::{GTO1d, HermiteTable, GTO};
    use crate::helper::*;
    use crate::library::BasisSetName;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use periodic_table_on_an_enum::Element;

    fn h2_sto3g(distance: f64) -> (ContractedGTO, ContractedGTO) {
        let basis = BasisSetName::Sto3g;
        let h = Element::from_symbol("H").unwrap();
        let a = basis.atom_basis(&h, Vector3::zeros()).unwrap().remove(0);
        let b = basis
            .atom_basis(&h, Vector3::new(0.0, 0.0, distance))
            .unwrap()
            .remove(0);
        (a, b)
    }

    #[test]
    fn test_gto1d_normalization() {
        let gto = GTO1d::new(1.0, 2, 1.0);
        let integral = simpson_integration(|x| gto.evaluate(x).powi(2), -10.0, 10.0, 10_000);
        assert!((integral - 1.0).abs() < 1e-5, "got {}", integral);
    }

    #[test]
    fn test_gto1d_overlap() {
        let gto1 = GTO1d::new(1.2, 1, 1.0);
        let gto2 = GTO1d::new(0.8, 1, 3.0);
        let integral = simpson_integration(
            |x| gto1.evaluate(x) * gto2.evaluate(x),
            -10.0,
            10.0,
            10_000,
        );
        assert!((integral - GTO1d::Sab(&gto1, &gto2)).abs() < 1e-5);
    }

    #[test]
    fn test_gto1d_first_moment() {
        let gto1 = GTO1d::new(0.9, 1, -0.4);
        let gto2 = GTO1d::new(0.5, 0, 0.7);
        let origin = 0.3;
        let integral = simpson_integration(
            |x| gto1.evaluate(x) * (x - origin) * gto2.evaluate(x),
            -15.0,
            15.0,
            20_000,
        );
        assert!((integral - GTO1d::Mab(&gto1, &gto2, origin)).abs() < 1e-6);
    }

    #[test]
    fn test_gto_self_overlap_is_one() {
        let gto = GTO::new(0.7, Vector3::new(1, 0, 1), Vector3::new(0.1, -0.2, 0.3));
        assert_relative_eq!(GTO::Sab(&gto, &gto), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_s_type_kinetic_closed_form() {
        // <s_a|T|s_a> = 3 alpha / 2 for a normalised s gaussian
        let gto = GTO::new(1.3, Vector3::zeros(), Vector3::zeros());
        assert_relative_eq!(GTO::Tab(&gto, &gto), 1.5 * 1.3, epsilon = 1e-12);
    }

    #[test]
    fn test_s_type_nuclear_attraction_closed_form() {
        // <s|-1/r|s> = -2 sqrt(2 alpha / pi) for a normalised s gaussian on the nucleus
        let alpha = 0.8;
        let gto = GTO::new(alpha, Vector3::zeros(), Vector3::zeros());
        let expected = -2.0 * (2.0 * alpha / std::f64::consts::PI).sqrt();
        assert_relative_eq!(
            GTO::Vab(&gto, &gto, Vector3::zeros(), 1),
            expected,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_hermite_table_matches_boys() {
        let pc = Vector3::new(0.3, -0.2, 0.5);
        let p = 1.7;
        let table = HermiteTable::new(3, p, pc);
        assert_relative_eq!(
            table.get(0, 0, 0),
            boys_function(0, p * pc.norm_squared()),
            epsilon = 1e-14
        );
        // R_100 = X_PC * R^1_000
        let r1 = -2.0 * p * boys_function(1, p * pc.norm_squared());
        assert_relative_eq!(table.get(1, 0, 0), pc.x * r1, epsilon = 1e-14);
        assert_relative_eq!(table.get(0, 0, 1), pc.z * r1, epsilon = 1e-14);
    }

    #[test]
    fn test_eri_permutational_symmetry() {
        let a = GTO::new(0.9, Vector3::new(1, 0, 0), Vector3::new(0.0, 0.0, 0.0));
        let b = GTO::new(0.4, Vector3::new(0, 0, 0), Vector3::new(0.5, 0.1, 0.0));
        let c = GTO::new(1.1, Vector3::new(0, 1, 0), Vector3::new(-0.3, 0.2, 0.4));
        let d = GTO::new(0.6, Vector3::new(0, 0, 1), Vector3::new(0.2, 0.0, -0.5));
        let abcd = GTO::JKabcd(&a, &b, &c, &d);
        assert_relative_eq!(abcd, GTO::JKabcd(&b, &a, &c, &d), epsilon = 1e-12);
        assert_relative_eq!(abcd, GTO::JKabcd(&c, &d, &a, &b), epsilon = 1e-12);
        assert_relative_eq!(abcd, GTO::JKabcd(&b, &a, &d, &c), epsilon = 1e-12);
    }

    #[test]
    fn test_contracted_functions_are_normalised() {
        let oxygen = Element::from_symbol("O").unwrap();
        let functions = BasisSetName::Sto3g
            .atom_basis(&oxygen, Vector3::new(0.2, 0.0, -0.1))
            .unwrap();
        assert_eq!(functions.len(), 5);
        for f in &functions {
            assert_relative_eq!(ContractedGTO::Sab(f, f), 1.0, epsilon = 1e-10);
        }
    }

    // H2 at 1.4 bohr, integral values from Szabo & Ostlund, chapter 3
    #[test]
    fn test_h2_sto3g_one_electron_integrals() {
        let (a, b) = h2_sto3g(1.4);
        let ra = a.center;
        assert!((ContractedGTO::Sab(&a, &b) - 0.6593).abs() < 1e-3);
        assert!((ContractedGTO::Tab(&a, &a) - 0.7600).abs() < 1e-3);
        assert!((ContractedGTO::Tab(&a, &b) - 0.2365).abs() < 1e-3);
        assert!((ContractedGTO::Vab(&a, &a, ra, 1) + 1.2266).abs() < 1e-3);
        assert!((ContractedGTO::Vab(&a, &b, ra, 1) + 0.5974).abs() < 1e-3);
        assert!((ContractedGTO::Vab(&b, &b, ra, 1) + 0.6538).abs() < 1e-3);
    }

    #[test]
    fn test_h2_sto3g_two_electron_integrals() {
        let (a, b) = h2_sto3g(1.4);
        assert!((ContractedGTO::JKabcd(&a, &a, &a, &a) - 0.7746).abs() < 1e-3);
        assert!((ContractedGTO::JKabcd(&a, &a, &b, &b) - 0.5697).abs() < 1e-3);
        assert!((ContractedGTO::JKabcd(&b, &a, &a, &a) - 0.4441).abs() < 1e-3);
        assert!((ContractedGTO::JKabcd(&b, &a, &b, &a) - 0.2970).abs() < 1e-3);
    }

    #[test]
    fn test_dipole_of_s_function_is_its_center() {
        let (a, _) = h2_sto3g(1.4);
        let mut shifted = a.clone();
        shifted.set_center(Vector3::new(0.0, 1.0, 2.0));
        let d = ContractedGTO::Dab(&shifted, &shifted, Vector3::zeros());
        assert_relative_eq!(d.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(d.y, 1.0, epsilon = 1e-10);
        assert_relative_eq!(d.z, 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_unknown_basis_and_element() {
        assert!("6-31G**".parse::<BasisSetName>().is_err());
        assert_eq!("STO-3G".parse::<BasisSetName>(), Ok(BasisSetName::Sto3g));
        let sodium = Element::from_symbol("Na").unwrap();
        assert!(BasisSetName::Sto3g
            .atom_basis(&sodium, Vector3::zeros())
            .is_err());
    }
}
