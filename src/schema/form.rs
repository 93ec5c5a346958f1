/// Editable form state and its frozen submission snapshot.
///
/// [`FormInput`] holds raw text for every schema field, exactly as a user
/// would type it: numeric fields may be empty or half-typed while editing.
/// [`FormInput::freeze`] validates the whole form and produces a
/// [`FrozenInput`], the immutable value that travels with a request.
use serde::Serialize;
use serde::ser::SerializeMap;
use thiserror::Error;

use super::{FieldKind, FieldSpec, fields, index_of};

/// Problems with form contents.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("`{value}` is not a valid choice for {field}")]
    UnknownChoice { field: &'static str, value: String },
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{field} expects a number, got `{value}`")]
    NotANumber { field: &'static str, value: String },
}

// ---------------------------------------------------------------------------
// Editable form
// ---------------------------------------------------------------------------

/// Current form values, one raw string per schema field, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct FormInput {
    values: Vec<String>,
}

impl Default for FormInput {
    fn default() -> Self {
        Self::defaults()
    }
}

impl FormInput {
    /// Form seeded with every field's schema default.
    pub fn defaults() -> Self {
        Self {
            values: fields().iter().map(|f| f.default.to_string()).collect(),
        }
    }

    /// Raw value of a field.
    pub fn get(&self, name: &str) -> Option<&str> {
        index_of(name).map(|i| self.values[i].as_str())
    }

    /// Apply one edit.
    ///
    /// Categorical fields only accept members of their choice set. Numeric
    /// fields accept any text so partially typed values survive; they are
    /// checked by [`freeze`](Self::freeze).
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), FormError> {
        let idx = index_of(name).ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        let spec = &fields()[idx];
        let value = value.into();

        if let FieldKind::Categorical(choices) = spec.kind
            && !value.is_empty()
            && !choices.contains(&value.as_str())
        {
            return Err(FormError::UnknownChoice {
                field: spec.name,
                value,
            });
        }

        self.values[idx] = value;
        Ok(())
    }

    /// Iterate `(spec, raw value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static FieldSpec, &str)> {
        fields().iter().zip(self.values.iter().map(String::as_str))
    }

    /// Validate every field and snapshot the form for submission.
    ///
    /// Fails on the first field (in schema order) that is empty, not a
    /// number, or outside its choice set.
    pub fn freeze(&self) -> Result<FrozenInput, FormError> {
        let mut values = Vec::with_capacity(self.values.len());

        for (spec, raw) in self.iter() {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(FormError::Empty(spec.name));
            }

            let value = match spec.kind {
                FieldKind::Numeric => {
                    let n = trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|n| n.is_finite())
                        .ok_or_else(|| FormError::NotANumber {
                            field: spec.name,
                            value: raw.to_string(),
                        })?;
                    FieldValue::Number(n)
                }
                FieldKind::Categorical(choices) => {
                    if !choices.contains(&trimmed) {
                        return Err(FormError::UnknownChoice {
                            field: spec.name,
                            value: raw.to_string(),
                        });
                    }
                    FieldValue::Choice(trimmed.to_string())
                }
            };
            values.push(value);
        }

        Ok(FrozenInput { values })
    }
}

// ---------------------------------------------------------------------------
// Frozen snapshot
// ---------------------------------------------------------------------------

/// A validated field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Choice(String),
}

/// Validated, immutable copy of the form taken at submission time.
///
/// Every numeric schema field holds a finite number and every categorical
/// field holds a legal choice. Serializes to the request body: a JSON
/// object keyed by field name.
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenInput {
    values: Vec<FieldValue>,
}

impl FrozenInput {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        index_of(name).map(|i| &self.values[i])
    }

    /// Numeric value of a field, `None` for unknown or categorical fields.
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Choice(_) => None,
        }
    }

    /// Categorical value of a field, `None` for unknown or numeric fields.
    pub fn choice(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            FieldValue::Choice(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }
}

impl Serialize for FrozenInput {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (spec, value) in fields().iter().zip(&self.values) {
            map.serialize_entry(spec.name, value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_schema() {
        let form = FormInput::defaults();
        assert_eq!(form.get("Nitrogen"), Some("80"));
        assert_eq!(form.get("Crop_Type"), Some("Rice"));
        assert_eq!(form.get("Soil_pH"), Some("6.5"));
        assert_eq!(form.get("Missing"), None);
    }

    #[test]
    fn set_rejects_unknown_field() {
        let mut form = FormInput::defaults();
        let err = form.set("Magnesium", "4").unwrap_err();
        assert_eq!(err, FormError::UnknownField("Magnesium".to_string()));
    }

    #[test]
    fn set_rejects_choice_outside_set() {
        let mut form = FormInput::defaults();
        assert!(form.set("Crop_Type", "Banana").is_err());
        assert_eq!(form.get("Crop_Type"), Some("Rice"));

        form.set("Crop_Type", "Wheat").unwrap();
        assert_eq!(form.get("Crop_Type"), Some("Wheat"));
    }

    #[test]
    fn numeric_fields_accept_transient_text() {
        let mut form = FormInput::defaults();
        form.set("Nitrogen", "").unwrap();
        form.set("Soil_pH", "6.").unwrap();
        assert_eq!(form.get("Nitrogen"), Some(""));
    }

    #[test]
    fn freeze_rejects_empty_value() {
        let mut form = FormInput::defaults();
        form.set("Rainfall", "  ").unwrap();
        assert_eq!(form.freeze().unwrap_err(), FormError::Empty("Rainfall"));
    }

    #[test]
    fn freeze_rejects_unparsable_number() {
        let mut form = FormInput::defaults();
        form.set("Humidity", "lots").unwrap();
        assert!(matches!(
            form.freeze(),
            Err(FormError::NotANumber { field: "Humidity", .. })
        ));
    }

    #[test]
    fn freeze_rejects_non_finite_number() {
        let mut form = FormInput::defaults();
        form.set("Area", "inf").unwrap();
        assert!(form.freeze().is_err());
    }

    #[test]
    fn freeze_parses_numbers() {
        let mut form = FormInput::defaults();
        form.set("Soil_pH", " 7.25 ").unwrap();
        let frozen = form.freeze().unwrap();
        assert_eq!(frozen.number("Soil_pH"), Some(7.25));
        assert_eq!(frozen.choice("Season"), Some("Kharif"));
        assert_eq!(frozen.number("Season"), None);
    }

    #[test]
    fn frozen_input_serializes_as_flat_object() {
        let frozen = FormInput::defaults().freeze().unwrap();
        let json = serde_json::to_value(&frozen).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), fields().len());
        assert_eq!(obj["Nitrogen"], serde_json::json!(80.0));
        assert_eq!(obj["Soil_Type"], serde_json::json!("Clay"));
        assert_eq!(obj["Season"], serde_json::json!("Kharif"));
    }

    #[test]
    fn frozen_copy_is_independent_of_later_edits() {
        let mut form = FormInput::defaults();
        let frozen = form.freeze().unwrap();
        form.set("Nitrogen", "150").unwrap();
        assert_eq!(frozen.number("Nitrogen"), Some(80.0));
    }
}
