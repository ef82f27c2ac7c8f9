//! Transformation steps.
//!
//! A [`Step`] is one unit of a per-column pipeline. Steps are a closed set
//! tagged by `op`, so configuration text naming an unknown op fails when it
//! is deserialized. Parameters that are structurally optional here (empty
//! lists, empty names) are checked by the interpreter, which reports them
//! against the target and step index.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::ModelError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    FromColumn {
        #[serde(default)]
        column: String,
    },
    /// Non-integral numbers become exact decimals at run time. YAML reads
    /// unquoted `1.10` as `1.1`; quote the value to keep its scale.
    #[serde(rename = "const", alias = "constant")]
    Constant {
        #[serde(default)]
        value: JsonValue,
    },
    Null,
    Coalesce {
        #[serde(default)]
        columns: Vec<String>,
    },
    #[serde(rename = "map_values", alias = "value_lookup")]
    ValueLookup {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        column: Option<String>,
        #[serde(default)]
        mapping: BTreeMap<String, JsonValue>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<JsonValue>,
    },
    Concat {
        #[serde(default)]
        columns: Vec<String>,
        #[serde(default)]
        sep: String,
    },
    Cast {
        to: CastTarget,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scale: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        precision: Option<u32>,
    },
    Round {
        #[serde(default)]
        ndigits: i32,
    },
    #[serde(rename = "math", alias = "arithmetic")]
    Arithmetic {
        operator: ArithmeticOperator,
        #[serde(default)]
        operands: Vec<Operand>,
    },
    #[serde(rename = "when", alias = "conditional")]
    Conditional {
        #[serde(default)]
        column: String,
        #[serde(default)]
        value: JsonValue,
        #[serde(default)]
        then: JsonValue,
        #[serde(rename = "else", default)]
        otherwise: JsonValue,
    },
    #[serde(rename = "expr", alias = "pandas_expr", alias = "sandboxed_expr")]
    SandboxedExpr {
        #[serde(default)]
        expr: String,
    },
    #[serde(rename = "sql", alias = "external_query")]
    ExternalQuery {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expr: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        query: Option<String>,
    },
}

impl Step {
    /// The configuration name of this step kind.
    pub fn op_name(&self) -> &'static str {
        match self {
            Step::FromColumn { .. } => "from_column",
            Step::Constant { .. } => "const",
            Step::Null => "null",
            Step::Coalesce { .. } => "coalesce",
            Step::ValueLookup { .. } => "map_values",
            Step::Concat { .. } => "concat",
            Step::Cast { .. } => "cast",
            Step::Round { .. } => "round",
            Step::Arithmetic { .. } => "math",
            Step::Conditional { .. } => "when",
            Step::SandboxedExpr { .. } => "expr",
            Step::ExternalQuery { .. } => "sql",
        }
    }

    /// Source columns this step reads by name.
    pub fn referenced_columns(&self) -> Vec<&str> {
        match self {
            Step::FromColumn { column } | Step::Conditional { column, .. } => {
                vec![column.as_str()]
            }
            Step::Coalesce { columns } | Step::Concat { columns, .. } => {
                columns.iter().map(String::as_str).collect()
            }
            Step::ValueLookup { column, .. } => column.as_deref().into_iter().collect(),
            Step::Arithmetic { operands, .. } => operands
                .iter()
                .filter_map(|operand| match operand {
                    Operand::Column(name) => Some(name.as_str()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.op_name())
    }
}

/// Keywords a full external query may start with.
pub const READ_ONLY_QUERY_KEYWORDS: [&str; 2] = ["SELECT", "WITH"];

/// True when `query` starts with a read-only keyword, ignoring case and leading space.
pub fn is_read_only_query(query: &str) -> bool {
    let upper = query.trim_start().to_ascii_uppercase();
    READ_ONLY_QUERY_KEYWORDS
        .iter()
        .any(|keyword| upper.starts_with(keyword))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastTarget {
    String,
    #[serde(alias = "numeric")]
    Float,
    #[serde(alias = "integer")]
    Int,
    #[serde(alias = "date-time", alias = "date_time")]
    Datetime,
    Decimal,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOperator {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithmeticOperator {
    /// `add` and `mul` fold over any number of operands; `sub` and `div` take two.
    pub fn is_binary_only(&self) -> bool {
        matches!(self, ArithmeticOperator::Sub | ArithmeticOperator::Div)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArithmeticOperator::Add => "add",
            ArithmeticOperator::Sub => "sub",
            ArithmeticOperator::Mul => "mul",
            ArithmeticOperator::Div => "div",
        }
    }
}

impl fmt::Display for ArithmeticOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One input of an arithmetic step.
///
/// Written in configuration as `{current: true}`, `{column: Name}` or
/// `{const: 1.5}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JsonMap<String, JsonValue>", into = "JsonMap<String, JsonValue>")]
pub enum Operand {
    Current,
    Column(String),
    Constant(JsonValue),
}

impl TryFrom<JsonMap<String, JsonValue>> for Operand {
    type Error = ModelError;

    fn try_from(map: JsonMap<String, JsonValue>) -> Result<Self, Self::Error> {
        if map.get("current") == Some(&JsonValue::Bool(true)) {
            return Ok(Operand::Current);
        }
        if let Some(column) = map.get("column") {
            return match column {
                JsonValue::String(name) if !name.is_empty() => Ok(Operand::Column(name.clone())),
                _ => Err(ModelError::InvalidOperand(
                    "operand.column must be a non-empty string".to_string(),
                )),
            };
        }
        if let Some(value) = map.get("const") {
            return Ok(Operand::Constant(value.clone()));
        }
        Err(ModelError::InvalidOperand(
            "operand must include one of: current=true, column, const".to_string(),
        ))
    }
}

impl From<Operand> for JsonMap<String, JsonValue> {
    fn from(operand: Operand) -> Self {
        let mut map = JsonMap::new();
        match operand {
            Operand::Current => map.insert("current".to_string(), JsonValue::Bool(true)),
            Operand::Column(name) => map.insert("column".to_string(), JsonValue::String(name)),
            Operand::Constant(value) => map.insert("const".to_string(), value),
        };
        map
    }
}
