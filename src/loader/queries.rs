//! Catalog queries. Every query takes the schema name list as `$1`.

pub const SCHEMAS: &str = r#"
SELECT n.nspname::text AS schema_name
FROM pg_catalog.pg_namespace n
WHERE n.nspname = ANY($1::text[])
ORDER BY array_position($1::text[], n.nspname::text)
"#;

pub const TABLES: &str = r#"
SELECT n.nspname::text AS schema_name,
       c.relname::text AS table_name
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE c.relkind IN ('r', 'p')
  AND n.nspname = ANY($1::text[])
ORDER BY n.nspname, c.relname
"#;

pub const COLUMNS: &str = r#"
SELECT n.nspname::text AS schema_name,
       c.relname::text AS table_name,
       a.attname::text AS column_name,
       a.attnum::int4 AS ordinal,
       t.typname::text AS typname,
       pg_catalog.format_type(a.atttypid, NULL) AS type_name,
       a.atttypmod AS typmod,
       a.attnotnull AS not_null
FROM pg_catalog.pg_attribute a
JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_type t ON t.oid = a.atttypid
WHERE c.relkind IN ('r', 'p')
  AND a.attnum > 0
  AND NOT a.attisdropped
  AND n.nspname = ANY($1::text[])
ORDER BY n.nspname, c.relname, a.attnum
"#;

pub const PRIMARY_KEYS: &str = r#"
SELECT n.nspname::text AS schema_name,
       c.relname::text AS table_name,
       a.attname::text AS column_name
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
CROSS JOIN LATERAL unnest(con.conkey) AS k(attnum)
JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
WHERE con.contype = 'p'
  AND n.nspname = ANY($1::text[])
"#;

pub const FOREIGN_KEYS: &str = r#"
SELECT n.nspname::text AS schema_name,
       c.relname::text AS table_name,
       con.conname::text AS foreign_key,
       tn.nspname::text AS target_schema,
       tc.relname::text AS target_table,
       a.attname::text AS column_name,
       k.ord::int4 AS position
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_class tc ON tc.oid = con.confrelid
JOIN pg_catalog.pg_namespace tn ON tn.oid = tc.relnamespace
CROSS JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
WHERE con.contype = 'f'
  AND n.nspname = ANY($1::text[])
ORDER BY n.nspname, c.relname, con.conname, k.ord
"#;

// Key entries of the index on the referenced table; attnum 0 marks an expression
pub const INDEX_ENTRIES: &str = r#"
SELECT n.nspname::text AS schema_name,
       c.relname::text AS table_name,
       con.conname::text AS foreign_key,
       k.ord::int4 AS position,
       a.attname::text AS column_name,
       pg_catalog.pg_get_indexdef(con.conindid, k.ord::int4, true) AS expression
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_index i ON i.indexrelid = con.conindid
CROSS JOIN LATERAL unnest(i.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
LEFT JOIN pg_catalog.pg_attribute a
       ON a.attrelid = i.indrelid AND a.attnum = k.attnum AND k.attnum <> 0
WHERE con.contype = 'f'
  AND k.ord <= i.indnkeyatts
  AND n.nspname = ANY($1::text[])
ORDER BY n.nspname, c.relname, con.conname, k.ord
"#;
