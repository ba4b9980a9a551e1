use tabula::{
    Clause, Column, Compile, Compiler, CompilerConfig, ForeignKey, Integer, MysqlDialect,
    PostgresDialect, Record, ReferentialAction, SqliteDialect, Table, Text, Value, Values,
    Varchar,
};

#[derive(Record, Debug, Default, Clone)]
struct Person {
    pub id: i64,
    pub name: String,
}

fn people() -> Table {
    Table::new("people")
        .with(Column::new("id", Integer::new().primary_key()))
        .with(Column::new("name", Varchar::new(32).not_null()))
        .build()
}

fn placeholders(sql: &str) -> Vec<usize> {
    let mut out = Vec::new();
    let mut rest = sql;
    while let Some(pos) = rest.find('$') {
        rest = &rest[pos + 1..];
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        if let Ok(n) = digits.parse() {
            out.push(n);
        }
    }
    out
}

#[test]
fn test_create_single_column_table() {
    let t = Table::new("t")
        .with(Column::new("id", Integer::new().primary_key()))
        .build();
    assert_eq!(
        t.create().to_sql(),
        "CREATE TABLE \"t\" (\n  \"id\" INTEGER PRIMARY KEY\n);"
    );
}

#[test]
fn test_create_with_foreign_key() {
    let p = people();
    let pets = Table::new("pets")
        .with(Column::new("id", Integer::new().primary_key()))
        .with(ForeignKey::new("owner_id", &p.c("id")).on_delete(ReferentialAction::Cascade))
        .build();
    assert_eq!(
        pets.create().to_sql(),
        "CREATE TABLE \"pets\" (\n  \"id\" INTEGER PRIMARY KEY,\n  \"owner_id\" INTEGER REFERENCES people(\"id\") ON DELETE CASCADE\n);"
    );
}

#[test]
fn test_select_exact_with_parameter() {
    let p = people();
    let built = p
        .select()
        .filter(p.c("name").equals("ann"))
        .build(&PostgresDialect)
        .unwrap();
    assert_eq!(
        built.sql,
        r#"SELECT "people"."id", "people"."name" FROM "people" WHERE "people"."name" = $1"#
    );
    assert_eq!(built.params.values(), &[Value::Text("ann".into())]);
}

#[test]
fn test_bulk_insert_record_then_field_order() {
    let p = people();
    let rows = vec![
        Person {
            id: 1,
            name: "ann".into(),
        },
        Person {
            id: 2,
            name: "bob".into(),
        },
    ];
    let built = p.insert().values(&rows).build(&PostgresDialect).unwrap();
    assert_eq!(
        built.sql,
        r#"INSERT INTO "people" ("id", "name") VALUES ($1, $2), ($3, $4)"#
    );
    assert_eq!(
        built.params.values(),
        &[
            Value::Int(1),
            Value::Text("ann".into()),
            Value::Int(2),
            Value::Text("bob".into()),
        ]
    );
}

#[test]
fn test_update_sorted_keys_and_empty_error() {
    let p = people();
    let values = Values::new().set("name", "ann").set("id", 9);
    let built = p
        .update(values)
        .filter(p.c("id").equals(1))
        .build(&PostgresDialect)
        .unwrap();
    assert_eq!(
        built.sql,
        r#"UPDATE "people" SET "id" = $1, "name" = $2 WHERE "people"."id" = $3"#
    );

    let err = p.update(Values::new()).build(&PostgresDialect).unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_empty_groups_fail_to_compile() {
    let p = people();
    for clause in [Clause::all_of(Vec::new()), Clause::any_of(Vec::new())] {
        assert!(p.select().filter(clause).build(&PostgresDialect).is_err());
    }
}

#[test]
fn test_placeholder_count_matches_parameters() {
    let p = people();
    let select = p
        .select()
        .filter(
            p.c("id")
                .in_list([1, 2, 3])
                .or(p.c("name").like("a%").and(p.c("id").between(10, 20))),
        )
        .order_by(p.c("name").desc())
        .limit(5);
    let built = select.build(&PostgresDialect).unwrap();
    let found = placeholders(&built.sql);
    assert_eq!(found, (1..=built.params.len()).collect::<Vec<_>>());
    assert_eq!(built.params.len(), 6);
}

#[test]
fn test_recompilation_is_deterministic() {
    let p = people();
    let select = p.select().filter(p.c("id").gte(3)).offset(10);
    let first = select.build(&PostgresDialect).unwrap();
    let second = select.build(&PostgresDialect).unwrap();
    assert_eq!(first.sql, second.sql);
    assert_eq!(first.params, second.params);
}

#[test]
fn test_question_mark_dialects() {
    let p = people();
    let delete = p.delete().filter(p.c("id").equals(4));
    assert_eq!(
        delete.build(&SqliteDialect).unwrap().sql,
        r#"DELETE FROM "people" WHERE "people"."id" = ?"#
    );
    assert_eq!(
        delete.build(&MysqlDialect).unwrap().sql,
        r#"DELETE FROM "people" WHERE "people"."id" = ?"#
    );
}

#[test]
fn test_compiler_from_config() {
    let config: CompilerConfig =
        serde_json::from_str(r#"{"dialect": "mysql", "max_sql_length": null}"#).unwrap();
    assert_eq!(config.max_sql_length, None);
    let compiler = Compiler::from_config(config).unwrap();
    let p = people();
    let built = compiler.build(&p.delete().value(&Person::default())).unwrap();
    assert_eq!(built.sql, r#"DELETE FROM "people" WHERE "people"."id" = ?"#);
    assert_eq!(built.params.values(), &[Value::Int(0)]);
}

#[test]
fn test_cross_table_select_and_join() {
    let p = people();
    let notes = Table::new("notes")
        .with(Column::new("id", Integer::new().primary_key()))
        .with(Column::new("person_id", Integer::new()))
        .with(Column::new("body", Text::new()))
        .build();
    let sql = tabula::select((p.c("name"), notes.c("body")))
        .join(&notes.c("person_id"), &p.c("id"))
        .to_sql();
    assert_eq!(
        sql,
        r#"SELECT "people"."name", "notes"."body" FROM "notes" JOIN "people" ON "notes"."person_id" = "people"."id""#
    );
}
