//! Request bodies and their validation.
//!
//! Fields arrive as loose JSON values. A field counts as present when it is
//! truthy: not absent, not `null`, `false`, `0` or `""`. Present values are
//! then coerced to the column types before they become statement parameters.

use serde::Deserialize;
use serde_json::Value;

use super::errors::ValidationError;
use crate::store::{Param, Record};

/// Body of `POST /users`
#[derive(Debug, Default, Deserialize)]
pub struct CreateRecordRequest {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub brand: Option<Value>,
    #[serde(default)]
    pub model: Option<Value>,
    #[serde(default)]
    pub year: Option<Value>,
}

/// Body of `PUT /users/update/:id`. An `id` in the body is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRecordRequest {
    #[serde(default)]
    pub brand: Option<Value>,
    #[serde(default)]
    pub model: Option<Value>,
    #[serde(default)]
    pub year: Option<Value>,
}

/// Validated replacement values for an existing record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChanges {
    pub brand: String,
    pub model: String,
    pub year: i32,
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn present(value: &Option<Value>) -> bool {
    value.as_ref().map_or(false, is_truthy)
}

fn integer(field: &'static str, value: &Value) -> Result<i64, ValidationError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or(ValidationError::InvalidField {
        field,
        expected: "an integer",
    })
}

fn year(value: &Value) -> Result<i32, ValidationError> {
    let year = integer("year", value)?;
    i32::try_from(year).map_err(|_| ValidationError::InvalidField {
        field: "year",
        expected: "an integer",
    })
}

fn text(field: &'static str, value: Value) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(ValidationError::InvalidField {
            field,
            expected: "a string",
        }),
    }
}

impl CreateRecordRequest {
    pub fn into_record(self) -> Result<Record, ValidationError> {
        let (Some(id), Some(brand), Some(model), Some(year_value)) =
            (self.id, self.brand, self.model, self.year)
        else {
            return Err(ValidationError::MissingCreateFields);
        };
        if ![&id, &brand, &model, &year_value].into_iter().all(is_truthy) {
            return Err(ValidationError::MissingCreateFields);
        }

        Ok(Record {
            id: integer("id", &id)?,
            brand: text("brand", brand)?,
            model: text("model", model)?,
            year: year(&year_value)?,
        })
    }
}

impl UpdateRecordRequest {
    pub fn into_changes(self) -> Result<RecordChanges, ValidationError> {
        if ![&self.brand, &self.model, &self.year].into_iter().all(present) {
            return Err(ValidationError::MissingUpdateFields);
        }
        let (Some(brand), Some(model), Some(year_value)) = (self.brand, self.model, self.year)
        else {
            return Err(ValidationError::MissingUpdateFields);
        };

        Ok(RecordChanges {
            brand: text("brand", brand)?,
            model: text("model", model)?,
            year: year(&year_value)?,
        })
    }
}

/// Parse the `:id` path segment
pub fn parse_id(raw: &str) -> Result<i64, ValidationError> {
    raw.trim().parse().map_err(|_| ValidationError::InvalidField {
        field: "id",
        expected: "an integer",
    })
}

/// Parameters for `Statement::InsertRecord`
pub fn insert_params(record: &Record) -> Vec<Param> {
    vec![
        Param::BigInt(record.id),
        Param::Text(record.brand.clone()),
        Param::Text(record.model.clone()),
        Param::Int(record.year),
    ]
}

/// Parameters for `Statement::UpdateRecordById`
pub fn update_params(id: i64, changes: &RecordChanges) -> Vec<Param> {
    vec![
        Param::Text(changes.brand.clone()),
        Param::Text(changes.model.clone()),
        Param::Int(changes.year),
        Param::BigInt(id),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(body: Value) -> Result<Record, ValidationError> {
        serde_json::from_value::<CreateRecordRequest>(body)
            .unwrap()
            .into_record()
    }

    fn update(body: Value) -> Result<RecordChanges, ValidationError> {
        serde_json::from_value::<UpdateRecordRequest>(body)
            .unwrap()
            .into_changes()
    }

    #[test]
    fn test_truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!is_truthy(&falsy), "{} should be falsy", falsy);
        }
        for truthy in [json!(true), json!(1), json!(-1), json!("0"), json!([]), json!({})] {
            assert!(is_truthy(&truthy), "{} should be truthy", truthy);
        }
    }

    #[test]
    fn test_create_valid() {
        let record =
            create(json!({"id": 1, "brand": "Toyota", "model": "Corolla", "year": 2020})).unwrap();
        assert_eq!(
            record,
            Record {
                id: 1,
                brand: "Toyota".to_string(),
                model: "Corolla".to_string(),
                year: 2020,
            }
        );
    }

    #[test]
    fn test_create_accepts_numeric_strings() {
        let record =
            create(json!({"id": "7", "brand": "Honda", "model": "Civic", "year": "2019"})).unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.year, 2019);
    }

    #[test]
    fn test_create_missing_or_falsy_fields() {
        let bodies = [
            json!({"brand": "Toyota", "model": "Corolla", "year": 2020}),
            json!({"id": 1, "model": "Corolla", "year": 2020}),
            json!({"id": 1, "brand": "Toyota", "year": 2020}),
            json!({"id": 1, "brand": "Toyota", "model": "Corolla"}),
            json!({"id": 0, "brand": "Toyota", "model": "Corolla", "year": 2020}),
            json!({"id": 1, "brand": "", "model": "Corolla", "year": 2020}),
            json!({"id": 1, "brand": "Toyota", "model": null, "year": 2020}),
            json!({"id": 1, "brand": "Toyota", "model": "Corolla", "year": false}),
            json!({}),
        ];
        for body in bodies {
            assert_eq!(
                create(body.clone()),
                Err(ValidationError::MissingCreateFields),
                "{}",
                body
            );
        }
    }

    #[test]
    fn test_create_rejects_uncoercible_values() {
        assert_eq!(
            create(json!({"id": "abc", "brand": "Toyota", "model": "Corolla", "year": 2020})),
            Err(ValidationError::InvalidField {
                field: "id",
                expected: "an integer"
            })
        );
        assert_eq!(
            create(json!({"id": 1, "brand": 5, "model": "Corolla", "year": 2020})),
            Err(ValidationError::InvalidField {
                field: "brand",
                expected: "a string"
            })
        );
        assert_eq!(
            create(json!({"id": 1, "brand": "Toyota", "model": "Corolla", "year": 1e12})),
            Err(ValidationError::InvalidField {
                field: "year",
                expected: "an integer"
            })
        );
    }

    #[test]
    fn test_whole_number_floats_are_integers() {
        let record =
            create(json!({"id": 7.0, "brand": "Toyota", "model": "Corolla", "year": 2020.0}))
                .unwrap();
        assert_eq!((record.id, record.year), (7, 2020));
        assert_eq!(
            create(json!({"id": 1, "brand": "Toyota", "model": "Corolla", "year": 2020.5})),
            Err(ValidationError::InvalidField {
                field: "year",
                expected: "an integer"
            })
        );
    }

    #[test]
    fn test_update_ignores_id() {
        let changes =
            update(json!({"id": 99, "brand": "Toyota", "model": "Camry", "year": 2021})).unwrap();
        assert_eq!(
            changes,
            RecordChanges {
                brand: "Toyota".to_string(),
                model: "Camry".to_string(),
                year: 2021,
            }
        );
    }

    #[test]
    fn test_update_missing_fields() {
        assert_eq!(
            update(json!({"brand": "Toyota", "model": "Camry"})),
            Err(ValidationError::MissingUpdateFields)
        );
        assert_eq!(
            update(json!({"brand": "Toyota", "model": "", "year": 2021})),
            Err(ValidationError::MissingUpdateFields)
        );
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42"), Ok(42));
        assert!(parse_id("forty-two").is_err());
    }

    #[test]
    fn test_param_order() {
        let changes = RecordChanges {
            brand: "Toyota".to_string(),
            model: "Camry".to_string(),
            year: 2021,
        };
        assert_eq!(update_params(1, &changes)[3], Param::BigInt(1));
    }
}
