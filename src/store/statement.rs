//! Statement catalogue.
//!
//! Every statement the service can run is listed here with its SQL text and
//! parameter signature. SQL text is constant; values only travel as bound
//! parameters.

use std::fmt;

use super::errors::{StoreError, StoreResult};

/// Table holding the records
pub const TABLE: &str = "users";

/// Column type of a bound parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// 64-bit integer (`BIGINT`)
    BigInt,
    /// 32-bit integer (`INTEGER`)
    Int,
    /// Text (`TEXT`)
    Text,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::BigInt => "bigint",
            ParamKind::Int => "integer",
            ParamKind::Text => "text",
        }
    }
}

/// A positional statement parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    BigInt(i64),
    Int(i32),
    Text(String),
}

impl Param {
    pub fn kind(&self) -> ParamKind {
        match self {
            Param::BigInt(_) => ParamKind::BigInt,
            Param::Int(_) => ParamKind::Int,
            Param::Text(_) => ParamKind::Text,
        }
    }

    pub fn as_bigint(&self) -> Option<i64> {
        match self {
            Param::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Param::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Param::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// The statements issued against [`TABLE`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    /// `$1` id, `$2` brand, `$3` model, `$4` year
    InsertRecord,
    SelectAllRecords,
    /// `$1` id
    SelectRecordById,
    /// `$1` brand, `$2` model, `$3` year, `$4` id
    UpdateRecordById,
    /// `$1` id
    DeleteRecordById,
}

impl Statement {
    /// SQL text with `$n` placeholders
    pub fn sql(&self) -> &'static str {
        match self {
            Statement::InsertRecord => {
                "INSERT INTO users (id, brand, model, year) VALUES ($1, $2, $3, $4) \
                 RETURNING id, brand, model, year"
            }
            Statement::SelectAllRecords => "SELECT id, brand, model, year FROM users",
            Statement::SelectRecordById => {
                "SELECT id, brand, model, year FROM users WHERE id = $1"
            }
            Statement::UpdateRecordById => {
                "UPDATE users SET brand = $1, model = $2, year = $3 WHERE id = $4 \
                 RETURNING id, brand, model, year"
            }
            Statement::DeleteRecordById => {
                "DELETE FROM users WHERE id = $1 RETURNING id, brand, model, year"
            }
        }
    }

    /// Expected parameter types, in placeholder order
    pub fn signature(&self) -> &'static [ParamKind] {
        use ParamKind::*;
        match self {
            Statement::InsertRecord => &[BigInt, Text, Text, Int],
            Statement::SelectAllRecords => &[],
            Statement::SelectRecordById => &[BigInt],
            Statement::UpdateRecordById => &[Text, Text, Int, BigInt],
            Statement::DeleteRecordById => &[BigInt],
        }
    }

    /// Reject parameter lists that do not match [`Statement::signature`]
    pub fn check_params(&self, params: &[Param]) -> StoreResult<()> {
        let signature = self.signature();
        if signature.len() != params.len() {
            return Err(StoreError::Arity {
                statement: *self,
                expected: signature.len(),
                actual: params.len(),
            });
        }

        for (index, (kind, param)) in signature.iter().zip(params).enumerate() {
            if param.kind() != *kind {
                return Err(StoreError::ParamType {
                    statement: *self,
                    position: index + 1,
                    expected: kind.as_str(),
                });
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        match self {
            Statement::InsertRecord => "InsertRecord",
            Statement::SelectAllRecords => "SelectAllRecords",
            Statement::SelectRecordById => "SelectRecordById",
            Statement::UpdateRecordById => "UpdateRecordById",
            Statement::DeleteRecordById => "DeleteRecordById",
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
