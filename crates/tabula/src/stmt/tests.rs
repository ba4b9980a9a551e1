use super::*;
use crate::clause::Clause;
use crate::dialect::{MysqlDialect, PostgresDialect};
use crate::error::{OrmError, OrmResult};
use crate::reflect::{FieldDef, Record};
use crate::schema::{Column, Integer, PrimaryKey, Table, Text, Varchar};
use crate::value::{FromValue, ToValue, Value};

fn users() -> Table {
    Table::new("users")
        .with(Column::new("id", Integer::new().primary_key()))
        .with(Column::new("name", Varchar::new(64).not_null()))
        .with(Column::new("password", Text::new()))
        .build()
}

fn posts() -> Table {
    Table::new("posts")
        .with(Column::new("id", Integer::new().primary_key()))
        .with(Column::new("user_id", Integer::new()))
        .with(Column::new("title", Text::new()))
        .build()
}

#[derive(Debug, Default, Clone, PartialEq)]
struct User {
    id: i32,
    name: String,
    password: String,
}

impl Record for User {
    fn field_defs() -> Vec<FieldDef> {
        vec![
            FieldDef::leaf("id", Some("id,omitempty"), true),
            FieldDef::leaf("name", None, true),
            FieldDef::leaf("password", None, true),
        ]
    }

    fn get(&self, path: &[usize]) -> OrmResult<Value> {
        match path {
            [0] => Ok(self.id.to_value()),
            [1] => Ok(self.name.to_value()),
            [2] => Ok(self.password.to_value()),
            _ => Err(OrmError::field_path("User", path)),
        }
    }

    fn set(&mut self, path: &[usize], value: Value) -> OrmResult<()> {
        match path {
            [0] => self.id = FromValue::from_value(value)?,
            [1] => self.name = FromValue::from_value(value)?,
            [2] => self.password = FromValue::from_value(value)?,
            _ => return Err(OrmError::field_path("User", path)),
        }
        Ok(())
    }
}

fn user(id: i32, name: &str) -> User {
    User {
        id,
        name: name.to_string(),
        password: "pw".to_string(),
    }
}

fn build(stmt: &impl Compile) -> BuiltQuery {
    stmt.build(&PostgresDialect).unwrap()
}

// ── SELECT ──────────────────────────────────────────────────────────────────

#[test]
fn test_select_table_with_filter() {
    let u = users();
    let q = build(&u.select().filter(u.c("id").equals(1)));
    assert_eq!(
        q.sql,
        r#"SELECT "users"."id", "users"."name", "users"."password" FROM "users" WHERE "users"."id" = $1"#
    );
    assert_eq!(q.values(), &[Value::Int(1)]);
}

#[test]
fn test_select_full_keyword_order() {
    let u = users();
    let q = build(
        &Select::new((u.c("name"), u.c("id").count().as_("n")))
            .distinct()
            .filter(u.c("name").like("a%"))
            .filter(u.c("id").greater_than(10))
            .group_by(u.c("name"))
            .having(u.c("id").count().greater_than(2))
            .order_by(u.c("name").desc().nulls_first())
            .limit(10)
            .offset(20),
    );
    assert_eq!(
        q.sql,
        concat!(
            r#"SELECT DISTINCT "users"."name", COUNT("users"."id") AS "n" FROM "users""#,
            r#" WHERE ("users"."name" LIKE $1 AND "users"."id" > $2)"#,
            r#" GROUP BY "users"."name" HAVING COUNT("users"."id") > $3"#,
            r#" ORDER BY "users"."name" DESC NULLS FIRST LIMIT 10 OFFSET 20"#,
        )
    );
    assert_eq!(q.params.len(), 3);
}

#[test]
fn test_select_chained_joins() {
    let u = users();
    let p = posts();
    let c = Table::new("comments")
        .with(Column::new("id", Integer::new().primary_key()))
        .with(Column::new("post_id", Integer::new()))
        .build();
    let q = build(
        &Select::new((u.c("name"), p.c("title"), c.c("id")))
            .join(&u.c("id"), &p.c("user_id"))
            .join(&p.c("id"), &c.c("post_id")),
    );
    assert_eq!(
        q.sql,
        concat!(
            r#"SELECT "users"."name", "posts"."title", "comments"."id" FROM "users""#,
            r#" JOIN "posts" ON "users"."id" = "posts"."user_id""#,
            r#" JOIN "comments" ON "posts"."id" = "comments"."post_id""#,
        )
    );
}

#[test]
fn test_filter_on_empty_group_stays_an_error() {
    let u = users();
    let err = u
        .select()
        .filter(Clause::all_of(Vec::new()))
        .filter(u.c("id").equals(1))
        .build(&PostgresDialect)
        .unwrap_err();
    assert!(matches!(err, OrmError::Compile(_)));
}

#[test]
fn test_select_join_removes_joined_table_from_from() {
    let u = users();
    let p = posts();
    let q = build(
        &Select::new((&u, p.c("title")))
            .join(&u.c("id"), &p.c("user_id"))
            .filter(p.c("title").is_not_null()),
    );
    assert_eq!(
        q.sql,
        concat!(
            r#"SELECT "users"."id", "users"."name", "users"."password", "posts"."title""#,
            r#" FROM "users" JOIN "posts" ON "users"."id" = "posts"."user_id""#,
            r#" WHERE "posts"."title" IS NOT NULL"#,
        )
    );
    assert!(q.params.is_empty());
}

#[test]
fn test_select_left_join() {
    let u = users();
    let p = posts();
    let sql = Select::new(u.c("name"))
        .left_join(&u.c("id"), &p.c("user_id"))
        .to_sql();
    assert_eq!(
        sql,
        r#"SELECT "users"."name" FROM "users" LEFT OUTER JOIN "posts" ON "users"."id" = "posts"."user_id""#
    );
}

#[test]
fn test_select_multiple_tables_in_first_appearance_order() {
    let u = users();
    let p = posts();
    let sql = Select::new([p.c("id"), u.c("id"), p.c("title")]).to_sql();
    assert_eq!(
        sql,
        r#"SELECT "posts"."id", "users"."id", "posts"."title" FROM "posts", "users""#
    );
}

#[test]
fn test_select_without_tables_omits_from() {
    let sql = Select::new(Selection::computed(Clause::raw("1"), None)).to_sql();
    assert_eq!(sql, "SELECT 1");
}

#[test]
fn test_select_empty_is_error() {
    let err = Select::new(Vec::<Column>::new())
        .build(&PostgresDialect)
        .unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_select_is_a_template() {
    let u = users();
    let base = u.select().order_by(u.c("id"));
    let first = base.clone().limit(5).to_sql();
    let second = base.to_sql();
    assert!(first.ends_with("ORDER BY \"users\".\"id\" LIMIT 5"));
    assert!(second.ends_with("ORDER BY \"users\".\"id\""));
}

#[test]
fn test_select_mysql_placeholders() {
    let u = users();
    let q = u
        .select()
        .filter(u.c("id").in_list([1, 2]))
        .build(&MysqlDialect)
        .unwrap();
    assert!(q.sql.ends_with(r#"WHERE "users"."id" IN (?, ?)"#));
    assert_eq!(q.params.len(), 2);
}

#[test]
fn test_select_propagates_clause_error() {
    let u = users();
    let err = u
        .select()
        .filter(Clause::all_of(Vec::new()))
        .build(&PostgresDialect)
        .unwrap_err();
    assert!(matches!(err, OrmError::Compile(_)));
}

// ── INSERT ──────────────────────────────────────────────────────────────────

#[test]
fn test_insert_without_values_binds_nulls() {
    let u = users();
    let q = build(&Insert::new([u.c("name"), u.c("password")]));
    assert_eq!(
        q.sql,
        r#"INSERT INTO "users" ("name", "password") VALUES ($1, $2)"#
    );
    assert_eq!(q.values(), &[Value::Null, Value::Null]);
}

#[test]
fn test_insert_bulk_records() {
    let u = users();
    let q = build(
        &Insert::new([u.c("name"), u.c("password")])
            .values(&[user(1, "ann"), user(2, "bob")]),
    );
    assert_eq!(
        q.sql,
        r#"INSERT INTO "users" ("name", "password") VALUES ($1, $2), ($3, $4)"#
    );
    assert_eq!(
        q.values(),
        &[
            Value::Text("ann".into()),
            Value::Text("pw".into()),
            Value::Text("bob".into()),
            Value::Text("pw".into()),
        ]
    );
}

#[test]
fn test_insert_omits_empty_fields() {
    let u = users();
    let q = build(&u.insert().value(&user(0, "ann")).returning(u.c("id")));
    assert_eq!(
        q.sql,
        r#"INSERT INTO "users" ("name", "password") VALUES ($1, $2) RETURNING "id""#
    );

    let q = build(&u.insert().value(&user(7, "ann")));
    assert_eq!(
        q.sql,
        r#"INSERT INTO "users" ("id", "name", "password") VALUES ($1, $2, $3)"#
    );
}

#[test]
fn test_insert_bulk_rows_must_agree_on_omitted_columns() {
    let u = users();
    let err = u
        .insert()
        .values(&[user(0, "ann"), user(3, "bob")])
        .build(&PostgresDialect)
        .unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_insert_cross_table_is_recorded() {
    let u = users();
    let p = posts();
    let err = Insert::new([u.c("name"), p.c("title")])
        .build(&PostgresDialect)
        .unwrap_err();
    assert!(err.to_string().contains("of table \"posts\""));
}

#[test]
fn test_insert_duplicate_column_is_recorded() {
    let u = users();
    let err = Insert::new([u.c("id"), u.c("id")])
        .build(&PostgresDialect)
        .unwrap_err();
    assert!(err.is_config());
    assert!(err.to_string().contains("\"id\" twice"));
}

#[test]
fn test_insert_needs_columns() {
    let err = Insert::new(Vec::new()).build(&PostgresDialect).unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_insert_record_missing_field() {
    let t = Table::new("accounts")
        .with(Column::new("name", Text::new()))
        .with(Column::new("balance", Integer::new()))
        .build();
    let err = t
        .insert()
        .value(&user(1, "x"))
        .build(&PostgresDialect)
        .unwrap_err();
    assert!(err.to_string().contains("\"balance\""));
}

#[test]
fn test_insert_values_map_and_rows() {
    let u = users();
    let q = build(
        &Insert::new([u.c("name"), u.c("password")])
            .row(vec![Value::Text("a".into()), Value::Text("b".into())])
            .row(vec![Value::Text("c".into()), Value::Null]),
    );
    assert_eq!(
        q.sql,
        r#"INSERT INTO "users" ("name", "password") VALUES ($1, $2), ($3, $4)"#
    );

    let q = build(&u.insert().values_map(Values::new().set("name", "z")));
    assert_eq!(q.sql, r#"INSERT INTO "users" ("name") VALUES ($1)"#);

    let err = u
        .insert()
        .values_map(Values::new().set("nope", 1))
        .build(&PostgresDialect)
        .unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_insert_row_length_mismatch() {
    let u = users();
    let err = u
        .insert()
        .row(vec![Value::Int(1)])
        .build(&PostgresDialect)
        .unwrap_err();
    assert!(err.to_string().contains("1 values for 3 columns"));
}

#[test]
fn test_insert_default_values() {
    let u = users();
    let q = build(&u.insert().values_map(Values::new()));
    assert_eq!(q.sql, r#"INSERT INTO "users" DEFAULT VALUES"#);
    assert!(q.params.is_empty());
}

// ── UPDATE ──────────────────────────────────────────────────────────────────

#[test]
fn test_update_sorted_keys() {
    let u = users();
    let q = build(
        &u.update(Values::new().set("password", "x").set("name", "y"))
            .filter(u.c("id").equals(3)),
    );
    assert_eq!(
        q.sql,
        r#"UPDATE "users" SET "name" = $1, "password" = $2 WHERE "users"."id" = $3"#
    );
    assert_eq!(
        q.values(),
        &[
            Value::Text("y".into()),
            Value::Text("x".into()),
            Value::Int(3)
        ]
    );
}

#[test]
fn test_update_empty_is_error() {
    let u = users();
    let err = u.update(Values::new()).build(&PostgresDialect).unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_update_unknown_key_is_error() {
    let u = users();
    let err = u
        .update(Values::new().set("nope", 1))
        .build(&PostgresDialect)
        .unwrap_err();
    assert!(err.to_string().contains("no column \"nope\""));
}

#[test]
fn test_update_from_record_with_returning() {
    let u = users();
    let values = Values::from_record(&user(0, "ann")).unwrap();
    assert!(!values.contains("id"));
    let q = build(&u.update(values).returning((u.c("id"), u.c("name"))));
    assert_eq!(
        q.sql,
        r#"UPDATE "users" SET "name" = $1, "password" = $2 RETURNING "id", "name""#
    );
}

// ── DELETE ──────────────────────────────────────────────────────────────────

#[test]
fn test_delete_all_and_filtered() {
    let u = users();
    assert_eq!(u.delete().to_sql(), r#"DELETE FROM "users""#);
    assert_eq!(
        u.delete().filter(u.c("name").equals("x")).to_sql(),
        r#"DELETE FROM "users" WHERE "users"."name" = $1"#
    );
}

#[test]
fn test_delete_by_records() {
    let u = users();
    let q = build(&u.delete().value(&user(4, "a")));
    assert_eq!(q.sql, r#"DELETE FROM "users" WHERE "users"."id" = $1"#);
    assert_eq!(q.values(), &[Value::Int(4)]);

    let q = build(&u.delete().values(&[user(4, "a"), user(5, "b")]));
    assert_eq!(q.sql, r#"DELETE FROM "users" WHERE "users"."id" IN ($1, $2)"#);
}

#[test]
fn test_delete_by_composite_key() {
    let t = Table::new("memberships")
        .with(Column::new("id", Integer::new()))
        .with(Column::new("name", Text::new()))
        .with(PrimaryKey::new(["id", "name"]))
        .build();
    let q = build(&t.delete().values(&[user(1, "a"), user(2, "b")]));
    assert_eq!(
        q.sql,
        concat!(
            r#"DELETE FROM "memberships" WHERE (("memberships"."id" = $1 AND "memberships"."name" = $2)"#,
            r#" OR ("memberships"."id" = $3 AND "memberships"."name" = $4))"#,
        )
    );
}

#[test]
fn test_delete_by_record_requires_primary_key() {
    let t = Table::new("logs")
        .with(Column::new("name", Text::new()))
        .build();
    let err = t
        .delete()
        .value(&user(1, "a"))
        .build(&PostgresDialect)
        .unwrap_err();
    assert!(err.to_string().contains("primary key"));
}

// ── DDL ─────────────────────────────────────────────────────────────────────

#[test]
fn test_create_table_without_columns_is_error() {
    let t = Table::new("empty").build();
    let err = t.create().build(&PostgresDialect).unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_create_table_exact() {
    let t = Table::new("t")
        .with(Column::new("id", Integer::new().primary_key()))
        .build();
    assert_eq!(
        t.create().to_sql(),
        "CREATE TABLE \"t\" (\n  \"id\" INTEGER PRIMARY KEY\n);"
    );
}

#[test]
fn test_create_table_with_constraints() {
    let t = Table::new("tags")
        .with(Column::new("post_id", Integer::new().not_null()))
        .with(Column::new("tag", Varchar::new(32).not_null()))
        .with(PrimaryKey::new(["post_id", "tag"]))
        .with(crate::schema::Unique::new(["tag"]))
        .build();
    assert_eq!(
        t.create().if_not_exists().to_sql(),
        concat!(
            "CREATE TABLE IF NOT EXISTS \"tags\" (\n",
            "  \"post_id\" INTEGER NOT NULL,\n",
            "  \"tag\" VARCHAR(32) NOT NULL,\n",
            "  PRIMARY KEY (\"post_id\", \"tag\"),\n",
            "  UNIQUE (\"tag\")\n",
            ");"
        )
    );
}

#[test]
fn test_drop_table() {
    let u = users();
    assert_eq!(u.drop().to_sql(), r#"DROP TABLE "users""#);
    assert_eq!(u.drop().if_exists().to_sql(), r#"DROP TABLE IF EXISTS "users""#);
}

#[test]
fn test_alter_table() {
    let u = users();
    assert_eq!(
        u.alter().rename_to("people").to_sql(),
        r#"ALTER TABLE "users" RENAME TO "people""#
    );
    assert_eq!(
        u.alter()
            .add_column(Column::new("age", Integer::new()))
            .to_sql(),
        r#"ALTER TABLE "users" ADD COLUMN "age" INTEGER"#
    );
    assert_eq!(
        u.alter().drop_column("password").to_sql(),
        r#"ALTER TABLE "users" DROP COLUMN "password""#
    );
    let err = u.alter().build(&PostgresDialect).unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_display_uses_to_sql() {
    let u = users();
    assert_eq!(u.drop().to_string(), r#"DROP TABLE "users""#);
    assert!(u.alter().to_string().starts_with("<invalid statement:"));
}
