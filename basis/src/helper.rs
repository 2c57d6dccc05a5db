#![allow(non_snake_case)]
use libm::erf;
use std::f64::consts::PI;

pub(crate) fn factorial(n: i32) -> f64 {
    (1..=n).fold(1.0, |acc, x| acc * x as f64)
}

// Simpson's rule integration
#[cfg(test)]
pub(crate) fn simpson_integration<F>(f: F, a: f64, b: f64, n: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    let n = if n % 2 == 0 { n } else { n + 1 };
    let h = (b - a) / n as f64;

    let mut sum = f(a) + f(b);
    for i in 1..n {
        let x = a + i as f64 * h;
        sum += if i % 2 == 0 { 2.0 * f(x) } else { 4.0 * f(x) };
    }
    sum * h / 3.0
}

/// Boys functions F_0(x) ..= F_nmax(x).
///
/// Small and intermediate arguments use the power series for the highest
/// order followed by downward recursion, large arguments start from the
/// closed form of F_0 and recurse upward.
pub fn boys_sequence(n_max: usize, x: f64) -> Vec<f64> {
    let mut vals = vec![0.0; n_max + 1];

    if x < 1.0e-12 {
        for (n, v) in vals.iter_mut().enumerate() {
            *v = 1.0 / (2 * n + 1) as f64;
        }
        return vals;
    }

    let y = (-x).exp();

    if x > 35.0 {
        let sx = x.sqrt();
        vals[0] = 0.5 * (PI / x).sqrt() * erf(sx);
        for n in 1..=n_max {
            vals[n] = ((2 * n - 1) as f64 * vals[n - 1] - y) / (2.0 * x);
        }
        return vals;
    }

    let mut term = 1.0 / (2 * n_max + 1) as f64;
    let mut sum = term;
    let mut k = 1;
    while term > 1.0e-17 * sum && k < 500 {
        term *= 2.0 * x / (2 * n_max + 2 * k + 1) as f64;
        sum += term;
        k += 1;
    }
    vals[n_max] = y * sum;

    for n in (0..n_max).rev() {
        vals[n] = (2.0 * x * vals[n + 1] + y) / (2 * n + 1) as f64;
    }
    vals
}

pub fn boys_function(n: i32, x: f64) -> f64 {
    let n = n.max(0) as usize;
    boys_sequence(n, x.max(0.0))[n]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_boys_function_at_origin() {
        assert_relative_eq!(boys_function(0, 0.0), 1.0);
        assert_relative_eq!(boys_function(1, 0.0), 1.0 / 3.0);
        assert_relative_eq!(boys_function(4, 0.0), 1.0 / 9.0);
    }

    #[test]
    fn test_boys_function_against_erf() {
        for &x in &[0.1, 0.5, 1.0, 3.7, 12.0, 30.0, 40.0, 80.0] {
            let exact = 0.5 * (PI / x).sqrt() * erf(x.sqrt());
            assert_relative_eq!(boys_function(0, x), exact, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_boys_function_against_quadrature() {
        for n in 0..6 {
            for &x in &[0.3, 2.5, 9.0, 40.0] {
                let integrand = |t: f64| t.powi(2 * n) * (-x * t * t).exp();
                let numeric = simpson_integration(integrand, 0.0, 1.0, 20_000);
                assert_relative_eq!(boys_function(n, x), numeric, max_relative = 1e-8);
            }
        }
    }

    #[test]
    fn test_boys_sequence_is_decreasing() {
        let vals = boys_sequence(8, 5.0);
        for w in vals.windows(2) {
            assert!(w[0] > w[1]);
        }
    }
}
