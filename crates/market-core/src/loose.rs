//! # Loose Numbers
//!
//! Numeric fields on stored documents come from browser forms and older
//! records, so a number may arrive as a JSON number or as a numeric string.
//! Use with `#[serde(deserialize_with = "...")]`; optional fields also need
//! `default`.

use serde::de::{self, Deserializer, Visitor};
use std::fmt;

/// `12.5`, `12` or `"12.5"`
pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    deserializer.deserialize_any(NumberVisitor)
}

/// `3`, `3.0` or `"3"`; fractions are rejected
pub fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    deserializer.deserialize_any(IntegerVisitor)
}

/// As [`number`]; `null` and `""` read as absent
pub fn optional_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    deserializer.deserialize_any(Optional(NumberVisitor))
}

/// As [`integer`]; `null` and `""` read as absent
pub fn optional_integer<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    deserializer.deserialize_any(Optional(IntegerVisitor))
}

struct NumberVisitor;

impl<'de> Visitor<'de> for NumberVisitor {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
        Ok(v)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

struct IntegerVisitor;

impl<'de> Visitor<'de> for IntegerVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an integer or an integer string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
        if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
            Ok(v as i64)
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        let trimmed = v.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            return Ok(n);
        }
        match trimmed.parse::<f64>() {
            Ok(n) => self.visit_f64(n),
            Err(_) => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
        }
    }
}

struct Optional<V>(V);

impl<'de, V> Visitor<'de> for Optional<V>
where
    V: Visitor<'de>,
{
    type Value = Option<V::Value>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.expecting(f)?;
        f.write_str(" or null")
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        self.0.visit_i64(v).map(Some)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        self.0.visit_u64(v).map(Some)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        self.0.visit_f64(v).map(Some)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        if v.trim().is_empty() {
            return Ok(None);
        }
        self.0.visit_str(v).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "number")]
        price: f64,
        #[serde(deserialize_with = "integer")]
        quantity: i64,
        #[serde(default, deserialize_with = "optional_number")]
        rating: Option<f64>,
        #[serde(default, deserialize_with = "optional_integer")]
        minimum: Option<i64>,
    }

    fn sample(value: serde_json::Value) -> Result<Sample, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_numbers_and_strings() {
        let s = sample(json!({ "price": "25", "quantity": " 5 ", "rating": 4.5 })).unwrap();
        assert_eq!(s.price, 25.0);
        assert_eq!(s.quantity, 5);
        assert_eq!(s.rating, Some(4.5));
        assert_eq!(s.minimum, None);

        let s = sample(json!({ "price": 12, "quantity": 3.0, "minimum": "2" })).unwrap();
        assert_eq!(s.price, 12.0);
        assert_eq!(s.quantity, 3);
        assert_eq!(s.minimum, Some(2));
    }

    #[test]
    fn test_optional_blank_and_null() {
        let s = sample(json!({ "price": 1, "quantity": 1, "rating": null, "minimum": "" })).unwrap();
        assert_eq!(s.rating, None);
        assert_eq!(s.minimum, None);
    }

    #[test]
    fn test_rejects_non_numeric() {
        assert!(sample(json!({ "price": "cheap", "quantity": 1 })).is_err());
        assert!(sample(json!({ "price": 1, "quantity": 2.5 })).is_err());
        assert!(sample(json!({ "price": 1, "quantity": "2.5" })).is_err());
        assert!(sample(json!({ "price": "NaN", "quantity": 1 })).is_err());
        assert!(sample(json!({ "price": true, "quantity": 1 })).is_err());
    }
}
