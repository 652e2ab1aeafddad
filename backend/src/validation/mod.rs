//! JSON Schema validation of sales records.
//!
//! Rows of a cleaned or transformed table are converted to JSON objects and
//! checked against an embedded Draft 7 schema (`schemas/sales-record.json`).
//! Missing cells are left out of the object, so a required column that is
//! missing on a row fails that row.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use retail_etl::validation::{is_valid_sales_record, validate_sales_record};
//!
//! let record = json!({
//!     "ORDERNUMBER": 10107,
//!     "QUANTITYORDERED": 30,
//!     "PRICEEACH": 95.7,
//!     "ORDERDATE": "2003-02-24",
//!     "PRODUCTLINE": "Motorcycles"
//! });
//! assert!(is_valid_sales_record(&record));
//! assert!(validate_sales_record(&json!({ "ORDERNUMBER": 1 })).is_err());
//! ```

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::{ValidationError, ValidationResult};
use crate::models::{Cell, Row, Table};

const SALES_RECORD_SCHEMA: &str = include_str!("../../schemas/sales-record.json");

/// Validate `data` against an already parsed schema.
///
/// Returns every error message when `data` does not conform. A schema that
/// fails to compile is reported as a single error.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Yes/no variant of [`validate`].
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    validate(schema, data).is_ok()
}

/// The embedded sales-record schema.
pub fn sales_record_schema() -> ValidationResult<Value> {
    serde_json::from_str(SALES_RECORD_SCHEMA).map_err(|e| ValidationError::SchemaError {
        errors: vec![format!("Invalid embedded schema: {}", e)],
    })
}

/// Validate one record against the sales-record schema.
pub fn validate_sales_record(data: &Value) -> Result<(), Vec<String>> {
    let schema = sales_record_schema().map_err(|e| vec![e.to_string()])?;
    validate(&schema, data)
}

pub fn is_valid_sales_record(data: &Value) -> bool {
    validate_sales_record(data).is_ok()
}

fn cell_to_json(cell: &Cell) -> Option<Value> {
    match cell {
        Cell::Missing => None,
        Cell::Int(v) => Some(Value::from(*v)),
        Cell::Float(v) => Number::from_f64(*v).map(Value::Number),
        Cell::Text(s) => Some(Value::String(s.clone())),
        Cell::Date(_) => Some(Value::String(cell.to_string())),
    }
}

/// One row as a JSON object keyed by column name, missing cells omitted.
pub fn row_to_json(columns: &[String], row: &Row) -> Value {
    let object: Map<String, Value> = columns
        .iter()
        .zip(row)
        .filter_map(|(name, cell)| cell_to_json(cell).map(|v| (name.clone(), v)))
        .collect();
    Value::Object(object)
}

/// Errors of one failing row; `row` counts data rows from 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowErrors {
    pub row: usize,
    pub errors: Vec<String>,
}

/// Outcome of validating a whole table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub total: usize,
    pub invalid: Vec<RowErrors>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }

    /// `Err(InvalidRows)` when any row failed.
    pub fn into_result(self) -> ValidationResult<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(ValidationError::InvalidRows {
                invalid: self.invalid.len(),
                total: self.total,
            })
        }
    }
}

/// Validate every row of `table`, compiling the schema once.
pub fn validate_table(table: &Table) -> ValidationResult<ValidationReport> {
    let schema = sales_record_schema()?;
    let validator = jsonschema::draft7::new(&schema).map_err(|e| ValidationError::SchemaError {
        errors: vec![e.to_string()],
    })?;

    let mut report = ValidationReport {
        total: table.len(),
        invalid: Vec::new(),
    };
    for (idx, row) in table.rows().iter().enumerate() {
        let record = row_to_json(table.columns(), row);
        let errors: Vec<String> = validator.iter_errors(&record).map(|e| e.to_string()).collect();
        if !errors.is_empty() {
            report.invalid.push(RowErrors { row: idx + 1, errors });
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;
    use serde_json::json;

    #[test]
    fn test_generic_validate() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        });
        assert!(validate(&schema, &json!({ "name": "test" })).is_ok());
        assert!(!is_valid(&schema, &json!({ "age": 42 })));
    }

    #[test]
    fn test_valid_sales_record() {
        let record = json!({
            "ORDERNUMBER": 10107,
            "QUANTITYORDERED": 30,
            "PRICEEACH": 95.7,
            "SALES": 2871.0,
            "ORDERDATE": "2003-02-24",
            "PRODUCTLINE": "Motorcycles"
        });
        assert!(is_valid_sales_record(&record));
    }

    #[test]
    fn test_negative_and_malformed_fields() {
        let record = json!({
            "ORDERNUMBER": 1,
            "QUANTITYORDERED": -3,
            "PRICEEACH": 10.0,
            "ORDERDATE": "24/02/2003",
            "PRODUCTLINE": "Planes"
        });
        let errors = validate_sales_record(&record).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_missing_required_field() {
        assert!(!is_valid_sales_record(&json!({ "ORDERNUMBER": 1 })));
    }

    #[test]
    fn test_row_to_json_omits_missing() {
        let columns = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let row = vec![Cell::Int(1), Cell::Missing, Cell::Float(2.5)];
        assert_eq!(row_to_json(&columns, &row), json!({ "A": 1, "C": 2.5 }));
    }

    #[test]
    fn test_validate_table_reports_failing_rows() {
        let csv = "\
ORDERNUMBER,QUANTITYORDERED,PRICEEACH,ORDERDATE,PRODUCTLINE
1,10,5.0,2024-01-01,Classic Cars
2,20,3.0,2024-01-02,
";
        let report = validate_table(&parse_str(csv, ',').unwrap()).unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.invalid.len(), 1);
        assert_eq!(report.invalid[0].row, 2);

        match report.into_result() {
            Err(ValidationError::InvalidRows { invalid, total }) => {
                assert_eq!((invalid, total), (1, 2));
            }
            other => panic!("expected InvalidRows, got {:?}", other),
        }
    }
}
