//! Column type annotations.

use crate::catalog::Column;

/// Render a column's type annotation.
///
/// The display name is upper-cased, then followed by ` pk` for primary keys,
/// `(<precision>)` for precision-bearing types and ` NOT NULL` for columns
/// that reject NULL. A precision-bearing column without a precision gets no
/// suffix; callers that care check [`Column::is_missing_precision`] first.
pub fn format_type(column: &Column) -> String {
    let mut output = column.sql_type.display_name().to_uppercase();

    if column.primary_key {
        output.push_str(" pk");
    }

    if column.sql_type.has_precision {
        if let Some(precision) = column.precision {
            output.push_str(&format!("({})", precision));
        }
    }

    if column.not_null {
        output.push_str(" NOT NULL");
    }

    output
}
