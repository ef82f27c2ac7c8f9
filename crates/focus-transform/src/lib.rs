//! Turning source billing data into FOCUS columns.
//!
//! - [`interpreter`]: runs the step list of one mapping rule.
//! - [`expr`]: restricted expression sandbox used by `expr` steps.
//! - [`query`]: SQL bridge used by `sql` steps.
//! - [`coerce`]: casts spec columns to their canonical types.
//! - [`generate`]: ties the above together for a whole mapping.

pub mod coerce;
pub mod datetime;
pub mod error;
pub mod expr;
pub mod frame;
pub mod generate;
pub mod interpreter;
pub mod numeric;
pub mod query;

pub use coerce::{coerce_column, coerce_table_to_spec, coerce_value};
pub use datetime::{cell_to_datetime, parse_datetime_utc, parse_datetime_with_format};
pub use error::{FrameError, Result, TransformError};
pub use expr::{SandboxError, check_expression};
pub use frame::{dataframe_to_table, table_to_dataframe, table_to_text_dataframe};
pub use generate::{generate_focus_table, generate_focus_table_with};
pub use interpreter::{StepInterpreter, apply_steps};
pub use numeric::{Number, cell_to_decimal, decimal_precision, parse_decimal, quantize};
pub use query::{PolarsSqlEngine, QueryEngine, QueryError, QueryRequest, SOURCE_RELATION};
