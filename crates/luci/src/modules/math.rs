//! The `math` module: the usual single-argument double functions plus
//! `pow(double, double)`.

use crate::errors::{ErrorObj, Flow};
use crate::object::{double_obj, ObjectKind, ObjectRef};

use super::{add_function, module_value, new_module_env};

fn double_argument(value: &ObjectRef, name: &str) -> Result<f64, Flow> {
    match &value.borrow().kind {
        ObjectKind::Double(value) => Ok(*value),
        other => Err(Flow::Error(ErrorObj::type_err(format!(
            "{name}: expected argument 1 to be a double, got {}",
            other.tag()
        )))),
    }
}

#[must_use]
pub fn create_module() -> ObjectRef {
    let env = new_module_env();

    let functions: &[(&str, fn(f64) -> f64)] = &[
        ("abs", f64::abs),
        ("acos", f64::acos),
        ("asin", f64::asin),
        ("atan", f64::atan),
        ("cbrt", f64::cbrt),
        ("cos", f64::cos),
        ("erf", erf),
        ("erfc", erfc),
        ("exp", f64::exp),
        ("lgamma", lgamma),
        ("log", f64::ln),
        ("log10", f64::log10),
        ("round", f64::round),
        ("sin", f64::sin),
        ("sqrt", f64::sqrt),
        ("tan", f64::tan),
        ("tgamma", tgamma),
        ("trunc", f64::trunc),
    ];
    for (name, function) in functions {
        let name = (*name).to_string();
        let function = *function;
        let error_name = name.clone();
        add_function(
            &env,
            &name,
            "double",
            "double",
            Box::new(move |evaluator, arguments, call_env, _token| {
                let values = evaluator.eval_builtin_args(arguments, call_env)?;
                if values.len() != 1 {
                    return Err(Flow::Error(ErrorObj::type_err(format!(
                        "{error_name}: expected 1 argument"
                    ))));
                }
                let value = double_argument(&values[0], &error_name)?;
                Ok(double_obj(function(value)))
            }),
        );
    }

    add_function(
        &env,
        "pow",
        "double, double",
        "double",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            if values.len() != 2 {
                return Err(Flow::Error(ErrorObj::type_err("pow: expected 2 arguments")));
            }
            let base = double_argument(&values[0], "pow")?;
            let exponent = double_argument(&values[1], "pow")?;
            Ok(double_obj(base.powf(exponent)))
        }),
    );

    module_value(env)
}

/// Abramowitz & Stegun 7.1.26 rational approximation, good to ~1.5e-7.
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let a1 = 0.254_829_592;
    let a2 = -0.284_496_736;
    let a3 = 1.421_413_741;
    let a4 = -1.453_152_027;
    let a5 = 1.061_405_429;
    let p = 0.327_591_1;

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();
    sign * y
}

fn erfc(x: f64) -> f64 {
    1.0 - erf(x)
}

/// Lanczos approximation of the gamma function.
fn tgamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEFFICIENTS: [f64; 9] = [
        0.999_999_999_999_809_93,
        676.520_368_121_885_1,
        -1259.139_216_722_402_8,
        771.323_428_777_653_13,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        // reflection formula
        return std::f64::consts::PI / ((std::f64::consts::PI * x).sin() * tgamma(1.0 - x));
    }

    let x = x - 1.0;
    let mut accumulator = COEFFICIENTS[0];
    for (index, coefficient) in COEFFICIENTS.iter().enumerate().skip(1) {
        accumulator += coefficient / (x + index as f64);
    }
    let t = x + G + 0.5;
    (2.0 * std::f64::consts::PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * accumulator
}

fn lgamma(x: f64) -> f64 {
    tgamma(x).abs().ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gamma_matches_factorials() {
        assert!((tgamma(5.0) - 24.0).abs() < 1e-9);
        assert!((tgamma(1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn erf_bounds() {
        assert!(erf(0.0).abs() < 1e-12);
        assert!((erf(3.0) - 1.0).abs() < 1e-4);
        assert!((erf(-3.0) + 1.0).abs() < 1e-4);
    }
}
