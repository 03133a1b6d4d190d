// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use compact_str::CompactString;
use sql_schema_linter::schema::{
    Constraint, ConstraintKind, Database, Datatype, ForeignKey, IndexKey, IndexedObject,
    ModelError, PrimaryKey, SqlIndex, TableName
};

fn names(columns: &[&str]) -> Vec<CompactString> {
    columns.iter().map(|c| CompactString::from(*c)).collect()
}

fn table_with(db: &mut Database, name: &str, columns: &[&str]) -> TableName {
    let table = db.create_table(None, name).unwrap();
    for column in columns {
        db.add_column(&table, column, Datatype::new("INT")).unwrap();
    }
    table
}

fn primary_key(db: &mut Database, table: &TableName, columns: &[&str]) {
    let pk = PrimaryKey {
        id:      db.allocate_id(),
        name:    None,
        columns: names(columns)
    };
    db.add_constraint(table, Constraint::PrimaryKey(pk)).unwrap();
}

fn foreign_key(
    db: &mut Database,
    owner: &TableName,
    owner_columns: &[&str],
    referenced: &TableName,
    ref_columns: &[&str]
) -> ForeignKey {
    ForeignKey {
        id:            db.allocate_id(),
        name:          Some("fk_test".into()),
        owner:         owner.clone(),
        owner_columns: names(owner_columns),
        referenced:    referenced.clone(),
        ref_columns:   names(ref_columns)
    }
}

fn keys_under(db: &Database, prefix: &IndexKey) -> usize {
    db.index().with_prefix(prefix).count()
}

#[test]
fn test_default_schema_is_indexed() {
    let db = Database::new("main");
    assert_eq!(db.default_schema(), "dbo");
    assert!(matches!(
        db.index().get(&IndexKey::schema("dbo")),
        Some(IndexedObject::Schema(_))
    ));
}

#[test]
fn test_add_column_registers_table_map_and_index() {
    let mut db = Database::new("main");
    let t1 = table_with(&mut db, "t1", &["a", "b"]);

    let table = db.get_table_or_error(&t1).unwrap();
    assert_eq!(table.columns().count(), 2);
    let id = table.column("a").unwrap().id;
    assert_eq!(
        db.index().get(&IndexKey::column("dbo", "t1", "a")),
        Some(IndexedObject::Column(id))
    );
}

#[test]
fn test_duplicate_column_is_rejected() {
    let mut db = Database::new("main");
    let t1 = table_with(&mut db, "t1", &["a"]);
    let err = db.add_column(&t1, "a", Datatype::new("TEXT")).unwrap_err();
    assert!(matches!(err, ModelError::ColumnAlreadyExists { .. }));
    assert_eq!(keys_under(&db, &t1.index_key()), 2);
}

#[test]
fn test_deregister_removes_every_key_under_the_prefix() {
    let mut db = Database::new("main");
    let t1 = table_with(&mut db, "t1", &["a", "b", "c"]);
    let t10 = table_with(&mut db, "t10", &["a"]);
    assert_eq!(keys_under(&db, &t1.index_key()), 4);

    let removed = db.index_deregister(&t1.index_key());
    assert_eq!(removed.len(), 4);
    assert_eq!(keys_under(&db, &t1.index_key()), 0);
    assert_eq!(keys_under(&db, &t10.index_key()), 2);
}

#[test]
fn test_delete_table_cascades_index_keys() {
    let mut db = Database::new("main");
    let t1 = table_with(&mut db, "t1", &["a", "b"]);

    db.delete_table(&t1, false).unwrap();
    assert!(db.get_table_or_none(&t1).is_none());
    assert_eq!(keys_under(&db, &t1.index_key()), 0);
    assert!(db.index().contains(&IndexKey::schema("dbo")));
}

#[test]
fn test_recreated_table_gets_a_new_identity() {
    let mut db = Database::new("main");
    let first = table_with(&mut db, "t1", &["a"]);
    let first_id = db.get_table_or_error(&first).unwrap().id;
    db.delete_table(&first, false).unwrap();

    let second = table_with(&mut db, "t1", &["a"]);
    let second_id = db.get_table_or_error(&second).unwrap().id;
    assert_ne!(first_id, second_id);
    assert_eq!(
        db.index().get(&second.index_key()),
        Some(IndexedObject::Table(second_id))
    );
}

#[test]
fn test_lookup_errors_name_the_key() {
    let mut db = Database::new("main");
    let missing = TableName::new("dbo", "nope");
    let err = db.get_table_or_error(&missing).unwrap_err();
    assert_eq!(err.missing_key(), Some(missing.index_key()));

    let err = db.create_table(Some("sales"), "orders").unwrap_err();
    assert!(matches!(err, ModelError::MissingSchema { ref schema } if schema == "sales"));
}

#[test]
fn test_foreign_key_is_registered_under_both_participants() {
    let mut db = Database::new("main");
    let t1 = table_with(&mut db, "t1", &["id"]);
    let t2 = table_with(&mut db, "t2", &["id", "t1_id"]);
    primary_key(&mut db, &t1, &["id"]);

    let fk = foreign_key(&mut db, &t2, &["t1_id"], &t1, &[]);
    db.add_constraint(&t2, Constraint::ForeignKey(fk)).unwrap();

    let owner = db.get_table_or_error(&t2).unwrap();
    let referenced = db.get_table_or_error(&t1).unwrap();
    assert!(owner.constraints().contains_key(&(t2.clone(), t2.clone())));
    assert!(referenced.constraints().contains_key(&(t1.clone(), t2.clone())));

    let stored = owner.foreign_keys()[0];
    assert_eq!(stored.ref_columns, names(&["id"]));
    assert_eq!(db.foreign_keys().len(), 1);
}

#[test]
fn test_foreign_key_to_missing_table_fails() {
    let mut db = Database::new("main");
    let t2 = table_with(&mut db, "t2", &["t1_id"]);
    let ghost = TableName::new("dbo", "t1");

    let fk = foreign_key(&mut db, &t2, &["t1_id"], &ghost, &["id"]);
    let err = db.add_foreign_key(fk).unwrap_err();
    assert!(matches!(err, ModelError::MissingTable { ref table } if table == &ghost));
    assert!(!err.is_fatal());
    assert!(db.get_table_or_error(&t2).unwrap().constraints().is_empty());
}

#[test]
fn test_foreign_key_arity_mismatch() {
    let mut db = Database::new("main");
    let t1 = table_with(&mut db, "t1", &["a", "b"]);
    let t2 = table_with(&mut db, "t2", &["x"]);

    let fk = foreign_key(&mut db, &t2, &["x"], &t1, &["a", "b"]);
    assert!(matches!(
        db.add_foreign_key(fk),
        Err(ModelError::ForeignKeyArity {
            owner_columns: 1,
            ref_columns: 2,
            ..
        })
    ));
}

#[test]
fn test_delete_guard_and_cascade() {
    let mut db = Database::new("main");
    let t1 = table_with(&mut db, "t1", &["id"]);
    let t2 = table_with(&mut db, "t2", &["t1_id"]);
    let fk = foreign_key(&mut db, &t2, &["t1_id"], &t1, &["id"]);
    db.add_foreign_key(fk).unwrap();

    let err = db.delete_table(&t1, false).unwrap_err();
    assert!(matches!(err, ModelError::HasDependents { .. }));
    assert!(err.to_string().contains("fk_test"));
    assert!(db.get_table_or_none(&t1).is_some());

    db.delete_table(&t1, true).unwrap();
    assert!(db.get_table_or_none(&t1).is_none());
    let owner = db.get_table_or_error(&t2).unwrap();
    assert!(owner.constraints().is_empty());
    assert!(!owner.has_dependents());

    db.delete_table(&t2, false).unwrap();
}

#[test]
fn test_dropping_the_owner_also_needs_cascade() {
    let mut db = Database::new("main");
    let t1 = table_with(&mut db, "t1", &["id"]);
    let t2 = table_with(&mut db, "t2", &["t1_id"]);
    let fk = foreign_key(&mut db, &t2, &["t1_id"], &t1, &["id"]);
    db.add_foreign_key(fk).unwrap();

    assert!(db.delete_table(&t2, false).is_err());
    db.delete_table(&t2, true).unwrap();
    assert!(db.get_table_or_error(&t1).unwrap().constraints().is_empty());
}

#[test]
fn test_self_reference_is_severed_completely() {
    let mut db = Database::new("main");
    let node = table_with(&mut db, "node", &["id", "parent_id"]);
    let fk = foreign_key(&mut db, &node, &["parent_id"], &node, &["id"]);
    db.add_foreign_key(fk.clone()).unwrap();

    let pair = (node.clone(), node.clone());
    assert_eq!(db.get_table_or_error(&node).unwrap().constraints()[&pair].len(), 2);

    db.sever_foreign_key(&fk).unwrap();
    assert!(db.get_table_or_error(&node).unwrap().constraints().is_empty());
    assert!(matches!(
        db.sever_foreign_key(&fk),
        Err(ModelError::Integrity(_))
    ));
}

#[test]
fn test_drop_schema_requires_cascade_when_not_empty() {
    let mut db = Database::new("main");
    db.create_schema("sales").unwrap();
    let orders = db.create_table(Some("sales"), "orders").unwrap();
    db.add_column(&orders, "id", Datatype::new("INT")).unwrap();
    let t1 = table_with(&mut db, "t1", &["order_id"]);
    let fk = foreign_key(&mut db, &t1, &["order_id"], &orders, &["id"]);
    db.add_foreign_key(fk).unwrap();

    assert!(matches!(
        db.drop_schema("sales", false),
        Err(ModelError::HasDependents { .. })
    ));

    db.drop_schema("sales", true).unwrap();
    assert!(db.schema("sales").is_none());
    assert_eq!(keys_under(&db, &IndexKey::schema("sales")), 0);
    assert!(db.get_table_or_error(&t1).unwrap().constraints().is_empty());
}

#[test]
fn test_column_constraints_are_one_per_kind() {
    let mut db = Database::new("main");
    let t1 = table_with(&mut db, "t1", &["id", "other"]);
    primary_key(&mut db, &t1, &["id"]);

    let table = db.get_table_or_error(&t1).unwrap();
    let id = table.column("id").unwrap();
    assert!(id.has(ConstraintKind::PrimaryKey));
    assert!(!id.is_nullable());

    let second = PrimaryKey {
        id:      db.allocate_id(),
        name:    None,
        columns: names(&["other"])
    };
    assert!(matches!(
        db.add_constraint(&t1, Constraint::PrimaryKey(second)),
        Err(ModelError::DuplicatePrimaryKey { .. })
    ));
}

#[test]
fn test_drop_column_guards() {
    let mut db = Database::new("main");
    let t1 = table_with(&mut db, "t1", &["a", "b", "c"]);
    primary_key(&mut db, &t1, &["a", "b"]);

    assert!(matches!(
        db.drop_column(&t1, "a"),
        Err(ModelError::ColumnInUse { .. })
    ));
    db.drop_column(&t1, "c").unwrap();
    assert!(!db.index().contains(&IndexKey::column("dbo", "t1", "c")));
    assert!(matches!(
        db.drop_column(&t1, "c"),
        Err(ModelError::MissingColumn { .. })
    ));
}

#[test]
fn test_rename_table_rekeys_index_and_foreign_keys() {
    let mut db = Database::new("main");
    let t1 = table_with(&mut db, "t1", &["id"]);
    let t2 = table_with(&mut db, "t2", &["t1_id"]);
    let fk = foreign_key(&mut db, &t2, &["t1_id"], &t1, &["id"]);
    db.add_foreign_key(fk).unwrap();

    let renamed = db.rename_table(&t1, "parents").unwrap();
    assert!(db.get_table_or_none(&t1).is_none());
    assert!(db.index().contains(&IndexKey::column("dbo", "parents", "id")));
    assert_eq!(keys_under(&db, &t1.index_key()), 0);

    let owner = db.get_table_or_error(&t2).unwrap();
    assert_eq!(owner.foreign_keys()[0].referenced, renamed);
    let parents = db.get_table_or_error(&renamed).unwrap();
    assert!(parents.constraints().contains_key(&(renamed.clone(), t2.clone())));
}

#[test]
fn test_rename_column_updates_foreign_keys() {
    let mut db = Database::new("main");
    let t1 = table_with(&mut db, "t1", &["id"]);
    let t2 = table_with(&mut db, "t2", &["t1_id"]);
    let fk = foreign_key(&mut db, &t2, &["t1_id"], &t1, &["id"]);
    db.add_foreign_key(fk).unwrap();

    db.rename_column(&t2, "t1_id", "parent_id").unwrap();
    assert!(db.index().contains(&IndexKey::column("dbo", "t2", "parent_id")));
    assert!(!db.index().contains(&IndexKey::column("dbo", "t2", "t1_id")));
    let referenced = db.get_table_or_error(&t1).unwrap();
    assert_eq!(referenced.foreign_keys()[0].owner_columns, names(&["parent_id"]));
}

#[test]
fn test_index_names_are_unique_per_schema() {
    let mut db = Database::new("main");
    let t1 = table_with(&mut db, "t1", &["a"]);
    let t2 = table_with(&mut db, "t2", &["a"]);
    let index = |db: &mut Database, name: &str| SqlIndex {
        id:      db.allocate_id(),
        name:    name.into(),
        columns: names(&["a"]),
        unique:  false
    };

    let ix = index(&mut db, "ix_a");
    db.add_index(&t1, ix).unwrap();
    let ix = index(&mut db, "ix_a");
    assert!(matches!(
        db.add_index(&t2, ix),
        Err(ModelError::IndexAlreadyExists { .. })
    ));

    db.rename_index("dbo", "ix_a", "ix_t1_a").unwrap();
    assert!(db.find_index("dbo", "ix_t1_a").is_some());
    assert_eq!(db.drop_index("dbo", "ix_t1_a").unwrap().len(), 1);
    assert!(matches!(
        db.drop_index("dbo", "ix_t1_a"),
        Err(ModelError::MissingIndex { .. })
    ));
}

#[test]
fn test_alter_column_operations() {
    let mut db = Database::new("main");
    let t1 = table_with(&mut db, "t1", &["a"]);

    db.set_column_not_null(&t1, "a").unwrap();
    db.set_column_default(&t1, "a", "0".to_string()).unwrap();
    db.change_column_datatype(&t1, "a", Datatype::parse("BIGINT")).unwrap();
    let column = db.get_table_or_error(&t1).unwrap().column("a").unwrap();
    assert!(!column.is_nullable());
    assert_eq!(column.default_value(), Some("0"));
    assert_eq!(column.datatype, Datatype::parse("BIGINT"));

    db.drop_column_not_null(&t1, "a").unwrap();
    db.drop_column_default(&t1, "a").unwrap();
    let column = db.get_table_or_error(&t1).unwrap().column("a").unwrap();
    assert!(column.is_nullable());
    assert_eq!(column.default_value(), None);
}
