//! Element casts between vector types and `as.character`.
//!
//! Casts follow R's rules: NA maps to NA, strings that do not parse become
//! NA with a warning, doubles are truncated toward zero when cast to integer
//! and out-of-range values become NA. Doubles are formatted with up to 15
//! significant digits, in fixed or scientific notation, whichever is
//! narrower (fixed wins ties).

use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::dispatch::MethodTable;
use crate::backend::errors::{RError, RResult};
use crate::backend::models::element::{
    double_na, is_double_na, logical_from_bool, Element, RComplex, INT_NA, LOGICAL_FALSE,
    LOGICAL_NA, LOGICAL_TRUE,
};
use crate::backend::models::{RType, RValue, RVector, VectorData};

/// Cast storage to `target`. Same-type casts share the storage.
pub fn cast_data(data: &VectorData, target: RType) -> RResult<VectorData> {
    if data.rtype() == target {
        return Ok(data.clone());
    }
    if let VectorData::List(items) = data {
        return list_to_atomic(items, target);
    }
    let mut introduced_na = false;
    let cast = match target {
        RType::Logical => VectorData::Logical(Arc::new(to_logical(data, &mut introduced_na))),
        RType::Integer => VectorData::Integer(Arc::new(to_integer(data, &mut introduced_na))),
        RType::Double => VectorData::Double(Arc::new(to_double(data, &mut introduced_na))),
        RType::Complex => VectorData::Complex(Arc::new(to_complex(data, &mut introduced_na))),
        RType::Character => VectorData::Character(Arc::new(to_character(data))),
        RType::List => VectorData::List(Arc::new(
            RVector::new(data.clone()).elements(),
        )),
        other => {
            return Err(RError::coercion(format!(
                "cannot coerce type '{}' to vector of type '{}'",
                data.rtype(),
                other
            )))
        }
    };
    if introduced_na {
        warn!(target: "rcore::coerce", from = %data.rtype(), to = %target, "NAs introduced by coercion");
    }
    Ok(cast)
}

/// Cast a vector, keeping its attributes.
pub fn cast_vector(vector: &RVector, target: RType) -> RResult<RVector> {
    if vector.rtype() == target {
        return Ok(vector.clone());
    }
    let data = cast_data(vector.data(), target)?;
    Ok(vector.clone().with_data(data))
}

/// Cast any value to a vector of `target`; `NULL` becomes a zero-length vector.
pub fn cast_value(value: &RValue, target: RType) -> RResult<RVector> {
    match value {
        RValue::Null => RVector::empty(target).ok_or_else(|| {
            RError::coercion(format!("cannot coerce type 'NULL' to vector of type '{}'", target))
        }),
        RValue::Vector(v) => cast_vector(v, target),
        RValue::Symbol(s) if target == RType::Character => {
            Ok(RVector::character(vec![Some(s.to_string())]))
        }
        RValue::Symbol(_) | RValue::Closure(_) | RValue::Foreign(_) if target == RType::List => {
            Ok(RVector::list(vec![value.clone()]))
        }
        other => Err(RError::coercion(format!(
            "cannot coerce type '{}' to vector of type '{}'",
            other.rtype(),
            target
        ))),
    }
}

/// `as.character`: class-dispatched first, default conversion otherwise.
///
/// A failing class method falls back to the default conversion.
pub fn as_character(value: &RValue, methods: &MethodTable) -> RResult<RValue> {
    if let RValue::Vector(v) = value {
        if v.is_object() {
            match methods.dispatch("as.character", value) {
                Some(Ok(result)) => return Ok(result),
                Some(Err(e)) => {
                    debug!(target: "rcore::coerce", error = %e, "as.character method failed, using default conversion");
                }
                None => {}
            }
        }
    }
    default_as_character(value)
}

fn default_as_character(value: &RValue) -> RResult<RValue> {
    match value {
        RValue::Null => Ok(RValue::Vector(RVector::character(Vec::new()))),
        RValue::Symbol(s) => Ok(RValue::string(s.as_str())),
        RValue::Vector(v) if v.rtype() == RType::List => Err(RError::coercion(
            "list type not supported for as.character - requires deparsing",
        )),
        RValue::Vector(v) => {
            let mut result = RVector::new(cast_data(v.data(), RType::Character)?);
            if let Some(names) = v.names() {
                result.set_names(Some(names))?;
            }
            Ok(RValue::Vector(result))
        }
        other => Err(RError::coercion(format!(
            "cannot coerce type '{}' to vector of type 'character'",
            other.rtype()
        ))),
    }
}

fn list_to_atomic(items: &[RValue], target: RType) -> RResult<VectorData> {
    let mut out = VectorData::na_filled(target, items.len()).ok_or_else(|| {
        RError::coercion(format!("cannot coerce type 'list' to vector of type '{}'", target))
    })?;
    for (i, item) in items.iter().enumerate() {
        match item {
            RValue::Vector(v) if v.len() == 1 && v.rtype().is_atomic() => {
                let element = cast_data(v.data(), target)?;
                out.assign_recycled(&[i], &element)?;
            }
            _ => {
                return Err(RError::coercion(format!(
                    "(list) object cannot be coerced to type '{}'",
                    target.type_name()
                )))
            }
        }
    }
    Ok(out)
}

fn to_logical(data: &VectorData, introduced_na: &mut bool) -> Vec<u8> {
    match data {
        VectorData::Logical(v) => v.as_ref().clone(),
        VectorData::Integer(v) => v
            .iter()
            .map(|&x| if x == INT_NA { LOGICAL_NA } else { logical_from_bool(x != 0) })
            .collect(),
        VectorData::Double(v) => v
            .iter()
            .map(|&x| if x.is_nan() { LOGICAL_NA } else { logical_from_bool(x != 0.0) })
            .collect(),
        VectorData::Complex(v) => v
            .iter()
            .map(|c| {
                if c.is_na() || c.re.is_nan() || c.im.is_nan() {
                    LOGICAL_NA
                } else {
                    logical_from_bool(c.re != 0.0 || c.im != 0.0)
                }
            })
            .collect(),
        VectorData::Character(v) => v
            .iter()
            .map(|s| match s.as_deref() {
                None => LOGICAL_NA,
                Some(s) => match parse_logical(s) {
                    Some(b) => b,
                    None => {
                        *introduced_na |= s != "NA";
                        LOGICAL_NA
                    }
                },
            })
            .collect(),
        VectorData::List(_) => Vec::new(),
    }
}

fn to_integer(data: &VectorData, introduced_na: &mut bool) -> Vec<i32> {
    let from_double = |x: f64, introduced_na: &mut bool| -> i32 {
        if x.is_nan() {
            INT_NA
        } else if x >= 2147483648.0 || x <= -2147483649.0 {
            *introduced_na = true;
            INT_NA
        } else {
            x.trunc() as i32
        }
    };
    match data {
        VectorData::Logical(v) => v
            .iter()
            .map(|&x| if x == LOGICAL_NA { INT_NA } else { x as i32 })
            .collect(),
        VectorData::Integer(v) => v.as_ref().clone(),
        VectorData::Double(v) => v.iter().map(|&x| from_double(x, introduced_na)).collect(),
        VectorData::Complex(v) => v
            .iter()
            .map(|c| {
                if c.is_na() {
                    INT_NA
                } else {
                    from_double(c.re, introduced_na)
                }
            })
            .collect(),
        VectorData::Character(v) => v
            .iter()
            .map(|s| match s.as_deref() {
                None => INT_NA,
                Some(s) => match parse_double(s) {
                    Some(x) => from_double(x, introduced_na),
                    None => {
                        *introduced_na = true;
                        INT_NA
                    }
                },
            })
            .collect(),
        VectorData::List(_) => Vec::new(),
    }
}

fn to_double(data: &VectorData, introduced_na: &mut bool) -> Vec<f64> {
    match data {
        VectorData::Logical(v) => v
            .iter()
            .map(|&x| if x == LOGICAL_NA { double_na() } else { x as f64 })
            .collect(),
        VectorData::Integer(v) => v
            .iter()
            .map(|&x| if x == INT_NA { double_na() } else { x as f64 })
            .collect(),
        VectorData::Double(v) => v.as_ref().clone(),
        VectorData::Complex(v) => v
            .iter()
            .map(|c| if c.is_na() { double_na() } else { c.re })
            .collect(),
        VectorData::Character(v) => v
            .iter()
            .map(|s| match s.as_deref() {
                None => double_na(),
                Some(s) => parse_double(s).unwrap_or_else(|| {
                    *introduced_na = true;
                    double_na()
                }),
            })
            .collect(),
        VectorData::List(_) => Vec::new(),
    }
}

fn to_complex(data: &VectorData, introduced_na: &mut bool) -> Vec<RComplex> {
    if let VectorData::Complex(v) = data {
        return v.as_ref().clone();
    }
    to_double(data, introduced_na)
        .into_iter()
        .map(|re| {
            if is_double_na(re) {
                RComplex::na()
            } else {
                RComplex::new(re, 0.0)
            }
        })
        .collect()
}

fn to_character(data: &VectorData) -> Vec<Option<String>> {
    match data {
        VectorData::Logical(v) => v
            .iter()
            .map(|&x| match x {
                LOGICAL_TRUE => Some("TRUE".to_string()),
                LOGICAL_FALSE => Some("FALSE".to_string()),
                _ => None,
            })
            .collect(),
        VectorData::Integer(v) => v
            .iter()
            .map(|&x| if x == INT_NA { None } else { Some(x.to_string()) })
            .collect(),
        VectorData::Double(v) => v.iter().map(|&x| format_double(x)).collect(),
        VectorData::Complex(v) => v.iter().map(format_complex).collect(),
        VectorData::Character(v) => v.as_ref().clone(),
        VectorData::List(_) => Vec::new(),
    }
}

fn parse_logical(s: &str) -> Option<u8> {
    match s {
        "TRUE" | "true" | "True" | "T" => Some(LOGICAL_TRUE),
        "FALSE" | "false" | "False" | "F" => Some(LOGICAL_FALSE),
        _ => None,
    }
}

/// Parse a number the way `as.numeric` does; `None` if it is not a number.
pub fn parse_double(s: &str) -> Option<f64> {
    let t = s.trim();
    match t {
        "NA" => return Some(double_na()),
        "Inf" | "+Inf" => return Some(f64::INFINITY),
        "-Inf" => return Some(f64::NEG_INFINITY),
        "NaN" => return Some(f64::NAN),
        _ => {}
    }
    let (negative, body) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        let x = i64::from_str_radix(hex, 16).ok()? as f64;
        return Some(if negative { -x } else { x });
    }
    t.parse::<f64>().ok()
}

/// R's `as.character` rendering of a double; `None` for NA.
pub fn format_double(x: f64) -> Option<String> {
    if is_double_na(x) {
        return None;
    }
    if x.is_nan() {
        return Some("NaN".to_string());
    }
    if x.is_infinite() {
        return Some(if x > 0.0 { "Inf" } else { "-Inf" }.to_string());
    }
    if x == 0.0 {
        return Some("0".to_string());
    }

    let sci = format!("{:.14e}", x.abs());
    let (mantissa, exponent) = sci.split_once('e')?;
    let exp: i32 = exponent.parse().ok()?;
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let digits = digits.trim_end_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };
    let sig = digits.len() as i32;

    let fixed_width = if exp >= 0 {
        if sig > exp + 1 {
            sig + 1
        } else {
            exp + 1
        }
    } else {
        sig - exp + 1
    };
    let exp_digits = if exp.abs() >= 100 { 3 } else { 2 };
    let sci_width = sig + i32::from(sig > 1) + 2 + exp_digits;

    let body = if fixed_width <= sci_width {
        if exp >= 0 {
            let int_len = (exp + 1) as usize;
            if digits.len() <= int_len {
                format!("{}{}", digits, "0".repeat(int_len - digits.len()))
            } else {
                format!("{}.{}", &digits[..int_len], &digits[int_len..])
            }
        } else {
            format!("0.{}{}", "0".repeat((-exp - 1) as usize), digits)
        }
    } else {
        let (lead, rest) = digits.split_at(1);
        let point = if rest.is_empty() {
            String::new()
        } else {
            format!(".{}", rest)
        };
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}{}e{}{:0width$}", lead, point, sign, exp.abs(), width = exp_digits as usize)
    };
    Some(if x < 0.0 { format!("-{}", body) } else { body })
}

fn format_complex(c: &RComplex) -> Option<String> {
    if c.is_na() {
        return None;
    }
    let re = format_double(c.re)?;
    let im = format_double(c.im.abs())?;
    let sign = if c.im < 0.0 || (c.im == 0.0 && c.im.is_sign_negative()) {
        '-'
    } else {
        '+'
    };
    Some(format!("{}{}{}i", re, sign, im))
}
