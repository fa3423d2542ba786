//! Typed access to untyped JSON payload fields.
//!
//! `null` counts as absent so defaults still apply; anything else that is
//! present must coerce cleanly or the field is rejected.

use serde_json::{Map, Value};

use crate::errors::ValidationError;

pub(crate) struct Fields<'a> {
    payload: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(payload: &'a Map<String, Value>) -> Self {
        Self { payload }
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        self.payload.get(name).filter(|value| !value.is_null())
    }

    pub(crate) fn required_f64(&self, name: &str) -> Result<f64, ValidationError> {
        self.optional_f64(name)?
            .ok_or_else(|| ValidationError::missing(name))
    }

    pub(crate) fn optional_f64(&self, name: &str) -> Result<Option<f64>, ValidationError> {
        self.get(name).map(|value| coerce_f64(name, value)).transpose()
    }

    /// Non-negative whole number that fits in `u32`.
    pub(crate) fn optional_u32(&self, name: &str) -> Result<Option<u32>, ValidationError> {
        let Some(number) = self.optional_f64(name)? else {
            return Ok(None);
        };
        if number.fract() != 0.0 {
            return Err(ValidationError::invalid_value(
                name,
                format!("{number} is not a whole number"),
            ));
        }
        if number < 0.0 || number > f64::from(u32::MAX) {
            return Err(ValidationError::out_of_range(
                name,
                format!("{number} is negative or too large"),
            ));
        }
        Ok(Some(number as u32))
    }

    /// Trimmed string; blank strings are treated as absent.
    pub(crate) fn optional_string(&self, name: &str) -> Result<Option<String>, ValidationError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(text)) => {
                let trimmed = text.trim();
                Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
            }
            Some(_) => Err(ValidationError::invalid_type(name, "a string")),
        }
    }

    /// Array of strings or a single comma-separated string.
    ///
    /// Entries are trimmed and lowercased; blanks and repeats are dropped
    /// while first-seen order is kept.
    pub(crate) fn string_list(&self, name: &str) -> Result<Vec<String>, ValidationError> {
        let raw: Vec<&str> = match self.get(name) {
            None => return Ok(Vec::new()),
            Some(Value::String(text)) => text.split(',').collect(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .ok_or_else(|| ValidationError::invalid_type(name, "a list of strings"))
                })
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(ValidationError::invalid_type(
                    name,
                    "a list of strings or a comma-separated string",
                ));
            }
        };

        let mut entries: Vec<String> = Vec::with_capacity(raw.len());
        for entry in raw {
            let entry = entry.trim().to_lowercase();
            if !entry.is_empty() && !entries.contains(&entry) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}

/// Accepts JSON numbers and strings holding exactly one finite number.
fn coerce_f64(name: &str, value: &Value) -> Result<f64, ValidationError> {
    let number = match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| ValidationError::invalid_value(name, "number is not representable"))?,
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::invalid_value(name, "empty string"));
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| ValidationError::invalid_type(name, "a number"))?
        }
        _ => return Err(ValidationError::invalid_type(name, "a number")),
    };

    if !number.is_finite() {
        return Err(ValidationError::invalid_value(name, "number must be finite"));
    }
    Ok(number)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::errors::ValidationErrorKind;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let map = payload(json!({"lat": " 37.8 ", "lng": -122.4, "limit": "25"}));
        let fields = Fields::new(&map);

        assert_eq!(fields.required_f64("lat").unwrap(), 37.8);
        assert_eq!(fields.required_f64("lng").unwrap(), -122.4);
        assert_eq!(fields.optional_u32("limit").unwrap(), Some(25));
    }

    #[test]
    fn test_ambiguous_numbers_are_rejected() {
        let map = payload(json!({
            "a": "12abc",
            "b": true,
            "c": "",
            "d": "NaN",
            "e": [1.0],
        }));
        let fields = Fields::new(&map);

        assert_eq!(
            fields.required_f64("a").unwrap_err().kind,
            ValidationErrorKind::InvalidType
        );
        assert_eq!(
            fields.required_f64("b").unwrap_err().kind,
            ValidationErrorKind::InvalidType
        );
        assert_eq!(
            fields.required_f64("c").unwrap_err().kind,
            ValidationErrorKind::InvalidValue
        );
        assert_eq!(
            fields.required_f64("d").unwrap_err().kind,
            ValidationErrorKind::InvalidValue
        );
        assert!(fields.required_f64("e").is_err());
    }

    #[test]
    fn test_null_counts_as_absent() {
        let map = payload(json!({"lat": null, "limit": null}));
        let fields = Fields::new(&map);

        assert_eq!(
            fields.required_f64("lat").unwrap_err().kind,
            ValidationErrorKind::Missing
        );
        assert_eq!(fields.optional_u32("limit").unwrap(), None);
    }

    #[test]
    fn test_whole_numbers_only_for_integers() {
        let map = payload(json!({"whole": 10.0, "frac": 2.5, "neg": -1}));
        let fields = Fields::new(&map);

        assert_eq!(fields.optional_u32("whole").unwrap(), Some(10));
        assert_eq!(
            fields.optional_u32("frac").unwrap_err().kind,
            ValidationErrorKind::InvalidValue
        );
        assert_eq!(
            fields.optional_u32("neg").unwrap_err().kind,
            ValidationErrorKind::OutOfRange
        );
    }

    #[test]
    fn test_string_list_normalization() {
        let map = payload(json!({
            "arr": ["Greek", " english ", "greek", ""],
            "csv": "ro, en,,RO",
            "bad": [1, 2],
        }));
        let fields = Fields::new(&map);

        assert_eq!(fields.string_list("arr").unwrap(), vec!["greek", "english"]);
        assert_eq!(fields.string_list("csv").unwrap(), vec!["ro", "en"]);
        assert!(fields.string_list("missing").unwrap().is_empty());
        assert_eq!(
            fields.string_list("bad").unwrap_err().kind,
            ValidationErrorKind::InvalidType
        );
    }

    #[test]
    fn test_blank_strings_are_absent() {
        let map = payload(json!({"country": "  ", "region": " Attica ", "locality": 5}));
        let fields = Fields::new(&map);

        assert_eq!(fields.optional_string("country").unwrap(), None);
        assert_eq!(
            fields.optional_string("region").unwrap().as_deref(),
            Some("Attica")
        );
        assert!(fields.optional_string("locality").is_err());
    }
}
