//! Mapping of PostgreSQL type metadata onto [`SqlType`].

use crate::catalog::SqlType;

/// Short aliases for SQL-standard multi-word type names
const INTERNAL_NAMES: &[(&str, &str)] = &[
    ("character varying", "varchar"),
    ("character", "bpchar"),
    ("bit varying", "varbit"),
    ("double precision", "float8"),
    ("timestamp without time zone", "timestamp"),
    ("timestamp with time zone", "timestamptz"),
    ("time without time zone", "time"),
    ("time with time zone", "timetz"),
];

/// Types whose columns carry a precision in their type modifier
const PRECISION_TYPES: &[&str] = &[
    "varchar",
    "bpchar",
    "bit",
    "varbit",
    "numeric",
    "time",
    "timetz",
    "timestamp",
    "timestamptz",
    "interval",
];

/// Precision types where an unconstrained column gets the server default
/// (microsecond resolution) rather than an unbounded length
const IMPLICIT_PRECISION_TYPES: &[&str] =
    &["time", "timetz", "timestamp", "timestamptz", "interval"];

// Interval typmods pack the field mask in the high half
const INTERVAL_PRECISION_MASK: i32 = 0xffff;

/// Build the type of a column from `pg_type.typname` and
/// `format_type(atttypid, NULL)`.
pub fn resolve_type(typname: &str, canonical: &str) -> SqlType {
    let mut sql_type = SqlType::new(canonical);

    if let Some((_, alias)) = INTERNAL_NAMES.iter().find(|(name, _)| *name == canonical) {
        sql_type = sql_type.with_internal_name(*alias);
    }

    if PRECISION_TYPES.contains(&typname) {
        sql_type = sql_type.with_precision();
    }

    if IMPLICIT_PRECISION_TYPES.contains(&typname) {
        sql_type = sql_type.with_implicit_precision();
    }

    sql_type
}

/// Decode the precision from a column's `atttypmod`.
///
/// Returns `None` for unconstrained columns (`typmod` of -1) and for types
/// that carry no precision.
pub fn precision_from_typmod(typname: &str, typmod: i32) -> Option<u32> {
    if typmod < 0 {
        return None;
    }

    let precision = match typname {
        "varchar" | "bpchar" => typmod - 4,
        "numeric" => ((typmod - 4) >> 16) & 0xffff,
        "bit" | "varbit" | "time" | "timetz" | "timestamp" | "timestamptz" => typmod,
        "interval" => {
            let precision = typmod & INTERVAL_PRECISION_MASK;
            if precision == INTERVAL_PRECISION_MASK {
                return None;
            }
            precision
        }
        _ => return None,
    };

    u32::try_from(precision).ok()
}
