use sql_schema_linter::{
    ast::{NodeCursor, lower_statement},
    mutation::{Mutation, MutationDispatcher, Outcome},
    schema::{ConstraintKind, Database, Datatype, IndexKey, ModelError, Table, TableName},
    source::{SqlDialect, split_statements}
};

struct Harness {
    db:         Database,
    dispatcher: MutationDispatcher
}

impl Harness {
    fn new() -> Self {
        Self {
            db:         Database::new("test"),
            dispatcher: MutationDispatcher::with_builtins()
        }
    }

    /// Apply every statement, returning the per-statement results
    fn apply(&mut self, sql: &str) -> Vec<Result<Outcome, ModelError>> {
        let dialect = SqlDialect::Generic.into_parser_dialect();
        split_statements(sql)
            .iter()
            .map(|statement| {
                let parsed = statement.parse(dialect.as_ref()).unwrap();
                self.dispatcher.dispatch(&lower_statement(&parsed), &mut self.db)
            })
            .collect()
    }

    fn apply_ok(&mut self, sql: &str) {
        for result in self.apply(sql) {
            assert_eq!(result.unwrap(), Outcome::Applied, "{}", sql);
        }
    }

    fn table(&self, name: &str) -> Option<&Table> {
        self.db.find_table(None, name)
    }
}

fn dbo(table: &str) -> TableName {
    TableName::new("dbo", table)
}

#[test]
fn test_create_table_with_inline_constraints() {
    let mut h = Harness::new();
    h.apply_ok(
        "CREATE TABLE users (
            id INT PRIMARY KEY,
            email VARCHAR(255) NOT NULL UNIQUE,
            age INT DEFAULT 0 CHECK (age >= 0)
        )"
    );

    let users = h.table("users").unwrap();
    assert_eq!(users.columns().count(), 3);
    assert_eq!(users.primary_key().unwrap().columns, vec!["id"]);

    let id = users.column("id").unwrap();
    assert!(!id.is_nullable());

    let email = users.column("email").unwrap();
    assert_eq!(email.datatype, Datatype::parse("VARCHAR(255)"));
    assert!(email.has(ConstraintKind::NotNull));
    assert!(email.has(ConstraintKind::Unique));

    let age = users.column("age").unwrap();
    assert_eq!(age.default_value(), Some("0"));
    assert!(age.has(ConstraintKind::Check));
    assert!(h.db.index().contains(&IndexKey::column("dbo", "users", "age")));
}

#[test]
fn test_create_table_with_table_constraints() {
    let mut h = Harness::new();
    h.apply_ok(
        "CREATE TABLE t1 (a INT, b INT);
         CREATE TABLE t2 (
            x INT,
            y INT,
            note TEXT,
            CONSTRAINT pk_t2 PRIMARY KEY (x, y),
            CONSTRAINT fk_t2_t1 FOREIGN KEY (x) REFERENCES t1 (a),
            UNIQUE (note),
            CHECK (x > y)
         )"
    );

    let t2 = h.table("t2").unwrap();
    let pk = t2.primary_key().unwrap();
    assert!(pk.is_composite());
    assert_eq!(pk.name.as_deref(), Some("pk_t2"));
    assert_eq!(t2.uniques().len(), 1);
    assert_eq!(t2.checks().len(), 1);

    let fk = t2.foreign_keys()[0];
    assert_eq!(fk.name.as_deref(), Some("fk_t2_t1"));
    assert_eq!(fk.referenced, dbo("t1"));
    assert!(
        h.table("t1")
            .unwrap()
            .constraints()
            .contains_key(&(dbo("t1"), dbo("t2")))
    );
}

#[test]
fn test_inline_reference_defaults_to_primary_key() {
    let mut h = Harness::new();
    h.apply_ok(
        "CREATE TABLE parent (id INT PRIMARY KEY);
         CREATE TABLE child (id INT, parent_id INT REFERENCES parent)"
    );
    let fk = h.table("child").unwrap().foreign_keys()[0];
    assert_eq!(fk.ref_columns, vec!["id"]);
}

#[test]
fn test_foreign_key_to_missing_table_fails_that_statement_only() {
    let mut h = Harness::new();
    let results = h.apply(
        "CREATE TABLE t2 (id INT, t1_id INT REFERENCES t1 (id));
         CREATE TABLE t3 (id INT)"
    );

    let err = results[0].as_ref().unwrap_err();
    assert!(matches!(err, ModelError::MissingTable { table } if table == &dbo("t1")));
    assert!(!err.is_fatal());
    assert!(h.table("t2").is_none());
    assert!(!h.db.index().contains(&dbo("t2").index_key()));

    assert_eq!(results[1], Ok(Outcome::Applied));
    assert!(h.table("t3").is_some());
}

#[test]
fn test_create_table_if_not_exists() {
    let mut h = Harness::new();
    h.apply_ok("CREATE TABLE t (a INT); CREATE TABLE IF NOT EXISTS t (b INT)");
    assert!(h.table("t").unwrap().has_column("a"));
    assert!(!h.table("t").unwrap().has_column("b"));

    let results = h.apply("CREATE TABLE t (c INT)");
    assert!(matches!(results[0], Err(ModelError::TableAlreadyExists { .. })));
}

#[test]
fn test_drop_table_cascade_and_if_exists() {
    let mut h = Harness::new();
    h.apply_ok(
        "CREATE TABLE t1 (id INT PRIMARY KEY);
         CREATE TABLE t2 (t1_id INT REFERENCES t1 (id))"
    );

    let results = h.apply("DROP TABLE t1");
    assert!(matches!(results[0], Err(ModelError::HasDependents { .. })));
    assert!(h.table("t1").is_some());

    h.apply_ok("DROP TABLE t1 CASCADE; DROP TABLE IF EXISTS t1");
    assert!(h.table("t1").is_none());
    assert!(h.table("t2").unwrap().constraints().is_empty());

    let results = h.apply("DROP TABLE t1");
    assert!(matches!(results[0], Err(ModelError::MissingTable { .. })));
}

#[test]
fn test_schemas() {
    let mut h = Harness::new();
    h.apply_ok(
        "CREATE SCHEMA sales;
         CREATE SCHEMA IF NOT EXISTS sales;
         CREATE TABLE sales.orders (id INT)"
    );
    assert!(h.db.find_table(Some("sales"), "orders").is_some());

    let results = h.apply("DROP SCHEMA sales");
    assert!(matches!(results[0], Err(ModelError::HasDependents { .. })));

    h.apply_ok("DROP SCHEMA sales CASCADE; DROP SCHEMA IF EXISTS sales");
    assert!(h.db.schema("sales").is_none());
    assert!(!h.db.index().contains(&IndexKey::table("sales", "orders")));
}

#[test]
fn test_table_in_unknown_schema_fails() {
    let mut h = Harness::new();
    let results = h.apply("CREATE TABLE nowhere.t (id INT)");
    assert!(matches!(results[0], Err(ModelError::MissingSchema { .. })));
}

#[test]
fn test_create_and_drop_index() {
    let mut h = Harness::new();
    h.apply_ok(
        "CREATE TABLE t (a INT, b INT);
         CREATE UNIQUE INDEX ix_ab ON t (a, b);
         CREATE INDEX IF NOT EXISTS ix_ab ON t (a)"
    );
    let ix = h.table("t").unwrap().index("ix_ab").unwrap();
    assert!(ix.unique);
    assert_eq!(ix.columns, vec!["a", "b"]);

    let results = h.apply("CREATE INDEX ix_bad ON t (missing)");
    assert!(matches!(results[0], Err(ModelError::MissingColumn { .. })));

    h.apply_ok("ALTER INDEX ix_ab RENAME TO ix_t_ab");
    assert!(h.db.find_index("dbo", "ix_t_ab").is_some());

    h.apply_ok("DROP INDEX ix_t_ab; DROP INDEX IF EXISTS ix_t_ab");
    assert_eq!(h.table("t").unwrap().indexes().count(), 0);
}

#[test]
fn test_alter_table_columns() {
    let mut h = Harness::new();
    h.apply_ok(
        "CREATE TABLE t (a INT, b INT);
         ALTER TABLE t ADD COLUMN c VARCHAR(10) NOT NULL;
         ALTER TABLE t DROP COLUMN b;
         ALTER TABLE t RENAME COLUMN a TO id"
    );
    let t = h.table("t").unwrap();
    let names: Vec<&str> = t.columns().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "c"]);
    assert!(!t.column("c").unwrap().is_nullable());
    assert!(h.db.index().contains(&IndexKey::column("dbo", "t", "id")));
    assert!(!h.db.index().contains(&IndexKey::column("dbo", "t", "b")));

    let results = h.apply("ALTER TABLE t DROP COLUMN b");
    assert!(matches!(results[0], Err(ModelError::MissingColumn { .. })));
}

#[test]
fn test_alter_table_rename_continues_under_new_name() {
    let mut h = Harness::new();
    h.apply_ok(
        "CREATE TABLE t (a INT);
         ALTER TABLE t RENAME TO renamed"
    );
    assert!(h.table("t").is_none());
    assert!(h.table("renamed").unwrap().has_column("a"));
    assert!(h.db.index().contains(&IndexKey::column("dbo", "renamed", "a")));
}

#[test]
fn test_alter_table_constraints() {
    let mut h = Harness::new();
    h.apply_ok(
        "CREATE TABLE parent (id INT);
         CREATE TABLE child (id INT, parent_id INT);
         ALTER TABLE parent ADD CONSTRAINT pk_parent PRIMARY KEY (id);
         ALTER TABLE child ADD CONSTRAINT fk_child FOREIGN KEY (parent_id) REFERENCES parent (id)"
    );
    assert_eq!(h.db.foreign_keys().len(), 1);

    h.apply_ok("ALTER TABLE child DROP CONSTRAINT fk_child");
    assert!(h.db.foreign_keys().is_empty());
    assert!(h.table("parent").unwrap().constraints().is_empty());

    let results = h.apply("ALTER TABLE child DROP CONSTRAINT fk_child");
    assert!(matches!(results[0], Err(ModelError::MissingConstraint { .. })));

    h.apply_ok("ALTER TABLE parent DROP PRIMARY KEY");
    assert!(h.table("parent").unwrap().primary_key().is_none());
}

#[test]
fn test_alter_table_skips_unsupported_constraint() {
    let mut h = Harness::new();
    h.apply_ok(
        "CREATE TABLE t (id INT, body TEXT);
         ALTER TABLE t ADD FULLTEXT INDEX ft (body);
         ALTER TABLE t ADD CONSTRAINT uq_id UNIQUE (id)"
    );
    let t = h.table("t").unwrap();
    assert!(t.indexes().next().is_none());
    assert_eq!(t.uniques().len(), 1);
}

#[test]
fn test_alter_column_operations() {
    let mut h = Harness::new();
    h.apply_ok(
        "CREATE TABLE t (a INT);
         ALTER TABLE t ALTER COLUMN a SET NOT NULL;
         ALTER TABLE t ALTER COLUMN a SET DEFAULT 42;
         ALTER TABLE t ALTER COLUMN a SET DATA TYPE BIGINT"
    );
    let a = h.table("t").unwrap().column("a").unwrap();
    assert!(!a.is_nullable());
    assert_eq!(a.default_value(), Some("42"));
    assert_eq!(a.datatype.name, "BIGINT");

    h.apply_ok(
        "ALTER TABLE t ALTER COLUMN a DROP NOT NULL;
         ALTER TABLE t ALTER COLUMN a DROP DEFAULT"
    );
    let a = h.table("t").unwrap().column("a").unwrap();
    assert!(a.is_nullable());
    assert_eq!(a.default_value(), None);
}

#[test]
fn test_alter_operations_stop_at_first_failure() {
    let mut h = Harness::new();
    h.apply_ok("CREATE TABLE t (a INT)");
    let results = h.apply("ALTER TABLE t ADD COLUMN b INT, DROP COLUMN missing, ADD COLUMN c INT");
    assert!(matches!(results[0], Err(ModelError::MissingColumn { .. })));

    let t = h.table("t").unwrap();
    assert!(t.has_column("b"));
    assert!(!t.has_column("c"));
}

#[test]
fn test_alter_missing_table() {
    let mut h = Harness::new();
    let results = h.apply("ALTER TABLE ghost ADD COLUMN a INT");
    assert!(matches!(results[0], Err(ModelError::MissingTable { .. })));
}

#[test]
fn test_data_and_query_statements_leave_the_model_unchanged() {
    let mut h = Harness::new();
    h.apply_ok("CREATE TABLE t (a INT)");
    let results = h.apply(
        "INSERT INTO t (a) VALUES (1);
         UPDATE t SET a = 2;
         DELETE FROM t;
         SELECT a FROM t"
    );
    assert_eq!(
        results,
        vec![
            Ok(Outcome::Applied),
            Ok(Outcome::Applied),
            Ok(Outcome::Applied),
            Ok(Outcome::NotModifying)
        ]
    );
    assert_eq!(h.table("t").unwrap().columns().count(), 1);
}

#[test]
fn test_views_are_unsupported() {
    let mut h = Harness::new();
    h.apply_ok("CREATE TABLE t (a INT)");
    let results = h.apply("CREATE VIEW v AS SELECT a FROM t");
    assert_eq!(results[0], Ok(Outcome::Unsupported));
}

fn forbid(_: NodeCursor<'_>, _: &mut Database) -> Result<(), ModelError> {
    Err(ModelError::Integrity("tables are frozen".into()))
}

#[test]
fn test_custom_handler_is_routed_by_key() {
    let mut dispatcher = MutationDispatcher::new();
    assert!(dispatcher.register_mutation(Mutation::new("create_table", forbid)));
    assert!(!dispatcher.register_mutation(Mutation::new("create_table", forbid)));
    let mut h = Harness {
        db: Database::new("test"),
        dispatcher
    };

    let results = h.apply("CREATE TABLE t (a INT); DROP TABLE t");
    assert!(results[0].as_ref().unwrap_err().is_fatal());
    assert_eq!(results[1], Ok(Outcome::Unsupported));
    assert!(h.table("t").is_none());
}
