//! Query pipeline: parse the expression, bind parameters, execute against a
//! store, stream rows, extract fields.

mod exec;
mod extract;
mod params;
mod parse;
mod rows;

pub(crate) use exec::run;

pub use extract::{RESULT_COLUMN, ResultEntry};
pub use params::{PLACEHOLDER, ParamValue, bind_placeholders};
pub use parse::{OperandList, Operation, ParsedQuery};
pub use rows::RowSet;
