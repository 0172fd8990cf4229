//! Unit tests for the DSL rendering module.

use pg_schema_dsl::catalog::{
    Column, ForeignKey, IndexEntry, JoinPath, Relation, RelationKind, Schema, SqlType, Table,
};
use pg_schema_dsl::dsl::{
    format_relation, format_type, render_table, serialize, serialize_with, DslError,
    RenderedForeignKeys, SerializeOptions,
};

fn integer() -> SqlType {
    SqlType::new("integer")
}

fn varchar() -> SqlType {
    SqlType::new("character varying")
        .with_internal_name("varchar")
        .with_precision()
}

fn users_table() -> Table {
    let mut users = Table::new("users");
    users.columns = vec![
        Column::new("id", integer()).primary_key().not_null(),
        Column::new("name", varchar()).with_precision(255),
    ];
    users
}

fn fk(name: &str, columns: &[&str], index: Vec<IndexEntry>) -> ForeignKey {
    ForeignKey {
        name: name.to_string(),
        columns: columns.iter().map(|c| c.to_string()).collect(),
        index,
    }
}

fn relation(kind: RelationKind, source: &str, target: &str, fk: ForeignKey) -> Relation {
    Relation {
        kind,
        source_table: source.to_string(),
        target_schema: None,
        target_table: target.to_string(),
        foreign_key: fk,
        join: None,
    }
}

fn shop_schema() -> Schema {
    let user_fk = fk(
        "orders_user_id_fkey",
        &["user_id"],
        vec![IndexEntry::Column("id".to_string())],
    );

    let mut users = users_table();
    users.relations.push(relation(
        RelationKind::OneToMany,
        "users",
        "orders",
        user_fk.clone(),
    ));

    let mut orders = Table::new("orders");
    orders.columns = vec![
        Column::new("id", integer()).primary_key().not_null(),
        Column::new("user_id", integer()).not_null(),
    ];
    orders.relations.push(relation(
        RelationKind::ManyToOne,
        "orders",
        "users",
        user_fk,
    ));

    Schema {
        name: "public".to_string(),
        tables: vec![users, orders],
    }
}

mod format_type_tests {
    use super::*;

    #[test]
    fn test_plain_type_is_uppercased() {
        let column = Column::new("payload", SqlType::new("jsonb"));
        assert_eq!(format_type(&column), "JSONB");
    }

    #[test]
    fn test_canonical_name_without_internal_name() {
        let column = Column::new("created", SqlType::new("timestamp with time zone"));
        assert_eq!(format_type(&column), "TIMESTAMP WITH TIME ZONE");
    }

    #[test]
    fn test_non_precision_type_never_has_parentheses() {
        for column in [
            Column::new("a", integer()),
            Column::new("b", integer()).primary_key(),
            Column::new("c", SqlType::new("text")).not_null(),
            Column::new("d", SqlType::new("uuid")).primary_key().not_null(),
        ] {
            let rendered = format_type(&column);
            assert!(!rendered.contains('('), "unexpected precision in {}", rendered);
        }
    }

    #[test]
    fn test_pk_marker_follows_type_name() {
        let column = Column::new("code", varchar())
            .with_precision(8)
            .primary_key()
            .not_null();
        assert_eq!(format_type(&column), "VARCHAR pk(8) NOT NULL");
    }

    #[test]
    fn test_not_null_suffix() {
        let column = Column::new("id", integer()).not_null();
        assert_eq!(format_type(&column), "INTEGER NOT NULL");
    }
}

mod relation_tests {
    use super::*;

    #[test]
    fn test_relation_symbols() {
        assert_eq!(RelationKind::ManyToOne.symbol(), ">");
        assert_eq!(RelationKind::OneToMany.symbol(), "<");
        assert_eq!(RelationKind::ManyToMany.symbol(), "<>");
    }

    #[test]
    fn test_each_kind_renders_its_symbol() {
        let key = fk("k", &["a_id"], vec![IndexEntry::Column("id".to_string())]);
        for (kind, expected) in [
            (RelationKind::ManyToOne, "a.a_id > b.id"),
            (RelationKind::OneToMany, "a.a_id < b.id"),
            (RelationKind::ManyToMany, "a.a_id <> b.id"),
        ] {
            let mut rendered = RenderedForeignKeys::new();
            let lines = format_relation(&relation(kind, "a", "b", key.clone()), &mut rendered)
                .unwrap();
            assert_eq!(lines, vec![expected.to_string()]);
        }
    }

    #[test]
    fn test_composite_key_reuses_join_column() {
        let key = fk(
            "line_items_order_fkey",
            &["order_id", "order_version"],
            vec![
                IndexEntry::Column("id".to_string()),
                IndexEntry::Column("version".to_string()),
            ],
        );
        let mut rendered = RenderedForeignKeys::new();
        let lines = format_relation(
            &relation(RelationKind::ManyToOne, "line_items", "orders", key),
            &mut rendered,
        )
        .unwrap();

        assert_eq!(
            lines,
            vec![
                "line_items.order_id > orders.id".to_string(),
                "line_items.order_version > orders.id".to_string(),
            ]
        );
    }

    #[test]
    fn test_expression_entries_are_skipped() {
        let key = fk(
            "accounts_email_fkey",
            &["email"],
            vec![
                IndexEntry::Expression("lower(email)".to_string()),
                IndexEntry::Column("email".to_string()),
            ],
        );
        let mut rendered = RenderedForeignKeys::new();
        let lines = format_relation(
            &relation(RelationKind::ManyToOne, "accounts", "people", key),
            &mut rendered,
        )
        .unwrap();
        assert_eq!(lines, vec!["accounts.email > people.email".to_string()]);
    }

    #[test]
    fn test_missing_join_column_is_an_error() {
        let key = fk(
            "odd_fkey",
            &["x"],
            vec![IndexEntry::Expression("lower(x)".to_string())],
        );
        let mut rendered = RenderedForeignKeys::new();
        let err = format_relation(
            &relation(RelationKind::ManyToOne, "a", "b", key),
            &mut rendered,
        )
        .unwrap_err();

        assert_eq!(
            err,
            DslError::MissingJoinColumn {
                foreign_key: "odd_fkey".to_string()
            }
        );
        assert!(rendered.is_empty());
    }

    #[test]
    fn test_rendered_set_records_names_without_filtering() {
        let key = fk("dup_fkey", &["b_id"], vec![IndexEntry::Column("id".to_string())]);
        let rel = relation(RelationKind::ManyToOne, "a", "b", key);
        let mut rendered = RenderedForeignKeys::new();

        let first = format_relation(&rel, &mut rendered).unwrap();
        let second = format_relation(&rel, &mut rendered).unwrap();

        assert_eq!(first, second);
        assert!(rendered.contains("dup_fkey"));
        assert_eq!(rendered.len(), 1);
    }

    #[test]
    fn test_many_to_many_with_join_path() {
        let key = fk(
            "tags_posts_post_fkey",
            &["post_id"],
            vec![IndexEntry::Column("id".to_string())],
        );
        let mut rel = relation(RelationKind::ManyToMany, "posts", "tags", key);
        rel.join = Some(JoinPath {
            table: "tags_posts".to_string(),
            target_foreign_key: fk(
                "tags_posts_tag_fkey",
                &["tag_id"],
                vec![IndexEntry::Column("id".to_string())],
            ),
        });

        let mut rendered = RenderedForeignKeys::new();
        let lines = format_relation(&rel, &mut rendered).unwrap();
        assert_eq!(lines, vec!["posts.post_id <> tags.id".to_string()]);
    }
}

mod serializer_tests {
    use super::*;

    #[test]
    fn test_single_table_document() {
        let schema = Schema {
            name: "public".to_string(),
            tables: vec![users_table()],
        };

        let doc = serialize(&schema).unwrap();
        assert_eq!(
            doc,
            "users [] { \n    id: INTEGER pk NOT NULL \n    name: VARCHAR(255) \n}\n\n"
        );
    }

    #[test]
    fn test_many_to_one_line_in_relations_section() {
        let doc = serialize(&shop_schema()).unwrap();

        let (definitions, relations) = doc.split_once("}\n\n\n").unwrap();
        assert!(definitions.contains("orders [] { \n"));
        assert_eq!(relations, "orders.user_id > users.id");
        assert!(doc.contains("orders.user_id > users.id"));
        assert!(!doc.contains("users.id < orders"));
    }

    #[test]
    fn test_full_document_layout() {
        let doc = serialize(&shop_schema()).unwrap();
        assert_eq!(
            doc,
            "users [] { \n    id: INTEGER pk NOT NULL \n    name: VARCHAR(255) \n}\n\n\
             orders [] { \n    id: INTEGER pk NOT NULL \n    user_id: INTEGER NOT NULL \n}\n\n\
             \norders.user_id > users.id"
        );
    }

    #[test]
    fn test_body_lines_match_columns() {
        let table = users_table();
        let mut rendered = RenderedForeignKeys::new();
        let out = render_table(&table, &mut rendered, &SerializeOptions::default()).unwrap();

        let lines: Vec<&str> = out.definition.lines().collect();
        assert_eq!(lines.len(), table.columns.len() + 2);
        assert_eq!(lines[0], "users [] { ");
        assert_eq!(lines[1], "    id: INTEGER pk NOT NULL ");
        assert_eq!(lines[2], "    name: VARCHAR(255) ");
        assert_eq!(lines[3], "}");
        assert!(out.relations.is_empty());
    }

    #[test]
    fn test_empty_table() {
        let mut rendered = RenderedForeignKeys::new();
        let out = render_table(
            &Table::new("empty"),
            &mut rendered,
            &SerializeOptions::default(),
        )
        .unwrap();
        assert_eq!(out.definition, "empty [] { \n\n}");
    }

    #[test]
    fn test_empty_schema() {
        let doc = serialize(&Schema::new("public")).unwrap();
        assert_eq!(doc, "\n\n");
    }

    #[test]
    fn test_idempotent() {
        let schema = shop_schema();
        assert_eq!(serialize(&schema).unwrap(), serialize(&schema).unwrap());
    }

    #[test]
    fn test_rendered_set_is_fresh_per_call() {
        let schema = shop_schema();
        let options = SerializeOptions::default();

        let first = serialize_with(&schema, &options).unwrap();
        let second = serialize_with(&schema, &options).unwrap();

        assert_eq!(first.text, second.text);
        assert_eq!(first.rendered_foreign_keys.sorted_names(), vec!["orders_user_id_fkey"]);
        assert_eq!(second.rendered_foreign_keys.len(), 1);
        assert_eq!(first.relation_lines, 1);
    }

    #[test]
    fn test_missing_join_column_aborts_serialization() {
        let mut schema = shop_schema();
        schema.tables[1].relations[0].foreign_key.index =
            vec![IndexEntry::Expression("(id + 1)".to_string())];

        let err = serialize(&schema).unwrap_err();
        assert!(matches!(err, DslError::MissingJoinColumn { .. }));
    }

    #[test]
    fn test_missing_precision_lenient_and_strict() {
        let mut table = Table::new("notes");
        table.columns = vec![Column::new("body", varchar())];
        let schema = Schema {
            name: "public".to_string(),
            tables: vec![table],
        };

        let lenient = serialize(&schema).unwrap();
        assert!(lenient.contains("    body: VARCHAR \n"));

        let err = serialize_with(
            &schema,
            &SerializeOptions {
                strict_precision: true,
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            DslError::MissingPrecision {
                table: "notes".to_string(),
                column: "body".to_string()
            }
        );
    }

    #[test]
    fn test_default_datetime_precision_passes_strict() {
        let timestamptz = SqlType::new("timestamp with time zone")
            .with_internal_name("timestamptz")
            .with_precision()
            .with_implicit_precision();
        let mut table = Table::new("events");
        table.columns = vec![
            Column::new("created_at", timestamptz.clone()).not_null(),
            Column::new("logged_at", timestamptz).with_precision(3),
        ];
        let schema = Schema {
            name: "public".to_string(),
            tables: vec![table],
        };

        let doc = serialize_with(
            &schema,
            &SerializeOptions {
                strict_precision: true,
            },
        )
        .unwrap();
        assert!(doc.text.contains("    created_at: TIMESTAMPTZ NOT NULL \n"));
        assert!(doc.text.contains("    logged_at: TIMESTAMPTZ(3) \n"));
    }

    #[test]
    fn test_composite_foreign_key_lines() {
        let key = fk(
            "shipments_order_fkey",
            &["order_id", "order_region"],
            vec![IndexEntry::Column("id".to_string())],
        );
        let mut shipments = Table::new("shipments");
        shipments.columns = vec![
            Column::new("order_id", integer()),
            Column::new("order_region", integer()),
        ];
        shipments
            .relations
            .push(relation(RelationKind::ManyToOne, "shipments", "orders", key));

        let mut orders = Table::new("orders");
        orders.columns = vec![Column::new("id", integer()).primary_key()];

        let schema = Schema {
            name: "public".to_string(),
            tables: vec![orders, shipments],
        };
        let doc = serialize_with(&schema, &SerializeOptions::default()).unwrap();

        assert!(doc
            .text
            .ends_with("\nshipments.order_id > orders.id\nshipments.order_region > orders.id"));
        assert_eq!(doc.relation_lines, 2);
    }
}
