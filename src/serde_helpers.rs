//! Lenient (de)serializers for backend JSON.
//!
//! The rental backend is loose about types: quantities arrive as strings,
//! missing totals as `null`, dates with or without a time part. Inbound
//! numbers follow `Number(value) || 0`.

use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// `Number(value) || 0`: anything that is not a finite number becomes 0.
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(0.0)
            }
        }
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Exact decimal form of `value`, 0 when it is not numeric.
pub fn coerce_decimal(value: &Value) -> BigDecimal {
    let parsed = match value {
        Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
        Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
        Value::Bool(true) => Some(BigDecimal::from(1)),
        _ => None,
    };
    parsed.unwrap_or_else(BigDecimal::zero)
}

pub fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(coerce_number(&Value::deserialize(d)?))
}

/// Whole-unit count; fractional quantities round to the nearest unit.
pub fn lenient_i32<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
    Ok(coerce_number(&Value::deserialize(d)?).round() as i32)
}

pub fn lenient_decimal<'de, D: Deserializer<'de>>(d: D) -> Result<BigDecimal, D::Error> {
    Ok(coerce_decimal(&Value::deserialize(d)?))
}

pub fn lenient_opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let value = Value::deserialize(d)?;
    let n = match &value {
        Value::Null => return Ok(None),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        other => coerce_number(other),
    };
    Ok(Some(n.round() as i64))
}

pub fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

pub fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let s = lenient_string(d)?;
    Ok((!s.trim().is_empty()).then_some(s))
}

/// `null` becomes the type's default.
pub fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Accepts `2024-03-01` as well as `2024-03-01T00:00:00.000Z`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

pub fn lenient_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => parse_date(&s),
        _ => None,
    })
}

pub fn lenient_time<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => parse_time(&s),
        _ => None,
    })
}

/// The backend expects money as a plain JSON number.
pub fn decimal_as_number<S: Serializer>(value: &BigDecimal, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(value.to_f64().unwrap_or(0.0))
}

pub fn opt_decimal_as_number<S: Serializer>(
    value: &Option<BigDecimal>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => decimal_as_number(v, s),
        None => s.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn coerces_like_number_or_zero() {
        assert_eq!(coerce_number(&json!("12.5")), 12.5);
        assert_eq!(coerce_number(&json!(" 7 ")), 7.0);
        assert_eq!(coerce_number(&json!(3)), 3.0);
        assert_eq!(coerce_number(&json!(null)), 0.0);
        assert_eq!(coerce_number(&json!("")), 0.0);
        assert_eq!(coerce_number(&json!("abc")), 0.0);
        assert_eq!(coerce_number(&json!("NaN")), 0.0);
        assert_eq!(coerce_number(&json!(true)), 1.0);
        assert_eq!(coerce_number(&json!(false)), 0.0);
        assert_eq!(coerce_number(&json!({"a": 1})), 0.0);
    }

    #[test]
    fn decimal_coercion_keeps_precision() {
        assert_eq!(coerce_decimal(&json!("19.99")).to_string(), "19.99");
        assert_eq!(coerce_decimal(&json!(0.1)), BigDecimal::from_str("0.1").unwrap());
        assert_eq!(coerce_decimal(&json!("x")), BigDecimal::zero());
    }

    #[derive(Debug, serde::Deserialize)]
    struct Counted {
        #[serde(deserialize_with = "lenient_i32")]
        quantity: i32,
    }

    #[test]
    fn fractional_quantities_round() {
        let parse = |v: Value| serde_json::from_value::<Counted>(json!({"quantity": v})).unwrap();
        assert_eq!(parse(json!("2.7")).quantity, 3);
        assert_eq!(parse(json!(2.2)).quantity, 2);
        assert_eq!(parse(json!("-1.5")).quantity, -2);
        assert_eq!(parse(json!("lots")).quantity, 0);
    }

    #[test]
    fn dates_accept_iso_datetimes() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(parse_date("2024-03-01"), expected);
        assert_eq!(parse_date("2024-03-01T18:30:00.000Z"), expected);
        assert_eq!(parse_date("01/03/2024"), None);
    }

    #[test]
    fn times_accept_with_or_without_seconds() {
        assert_eq!(parse_time("09:15"), NaiveTime::from_hms_opt(9, 15, 0));
        assert_eq!(parse_time("09:15:30"), NaiveTime::from_hms_opt(9, 15, 30));
        assert_eq!(parse_time("later"), None);
    }
}
