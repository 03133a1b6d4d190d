//! In-memory schema model built up by DDL statements.
//!
//! # Structure
//!
//! ```text
//! Database ──┬── Schema ──┬── Table ──┬── Column ── [Constraint]
//!            │            │           ├── PrimaryKey
//!            │            │           ├── constraints[(owner, other)] ── [ForeignKey]
//!            │            │           └── indexes[name] ── SqlIndex
//!            │            └── ...
//!            └── LookupIndex: (schema) / (schema, table) / (schema, table, column)
//! ```
//!
//! Every live schema, table and column has exactly one entry in the
//! [`LookupIndex`]; an object missing from the index does not exist. Objects
//! get a fresh [`ObjectId`] on creation, ids are never reused, so a table
//! re-created after a drop is a different object.
//!
//! Foreign keys are registered symmetrically: under
//! `owner.constraints[(owner, owner)]` and under
//! `referenced.constraints[(referenced, owner)]`. Either side can therefore
//! find and sever the key when it is dropped.

mod alter;
mod constraint;
mod error;
mod index;
mod relations;
mod table;

use std::fmt;

use compact_str::CompactString;
pub use constraint::{
    CheckExpression, Constraint, ConstraintKind, Datatype, DefaultValue, ForeignKey,
    PreventNotNull, PrimaryKey, SqlIndex, UniqueValue
};
pub use error::ModelError;
use indexmap::IndexMap;
pub use index::{IndexKey, IndexedObject, LookupIndex};
use serde::Serialize;
pub use table::{Column, ParticipantPair, Schema, Table};
use tracing::debug;

/// Default schema for unqualified names
pub const DEFAULT_SCHEMA: &str = "dbo";

/// Unique, never reused identity of a model object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ObjectId(pub(crate) u64);

impl ObjectId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Schema-qualified table name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TableName {
    pub schema: CompactString,
    pub table:  CompactString
}

impl TableName {
    pub fn new(schema: impl Into<CompactString>, table: impl Into<CompactString>) -> Self {
        Self {
            schema: schema.into(),
            table:  table.into()
        }
    }

    pub fn index_key(&self) -> IndexKey {
        IndexKey::table(&self.schema, &self.table)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Root of the schema model.
///
/// # Example
///
/// ```
/// use sql_schema_linter::schema::{Database, Datatype, IndexKey};
///
/// let mut db = Database::new("main");
/// let t1 = db.create_table(None, "t1").unwrap();
/// db.add_column(&t1, "id", Datatype::new("INT")).unwrap();
/// assert!(db.index().contains(&IndexKey::column("dbo", "t1", "id")));
///
/// db.delete_table(&t1, false).unwrap();
/// assert!(!db.index().contains(&IndexKey::column("dbo", "t1", "id")));
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pub name:       CompactString,
    default_schema: CompactString,
    schemas:        IndexMap<CompactString, Schema>,
    index:          LookupIndex,
    next_id:        u64
}

impl Database {
    /// Create a database with the default `dbo` schema
    pub fn new(name: &str) -> Self {
        Self::with_default_schema(name, DEFAULT_SCHEMA)
    }

    pub fn with_default_schema(name: &str, default_schema: &str) -> Self {
        let id = ObjectId(1);
        let mut schemas = IndexMap::new();
        schemas.insert(default_schema.into(), Schema::new(id, default_schema));
        Self {
            name: name.into(),
            default_schema: default_schema.into(),
            schemas,
            index: LookupIndex::seeded(IndexKey::schema(default_schema), IndexedObject::Schema(id)),
            next_id: id.0
        }
    }

    pub fn default_schema(&self) -> &str {
        &self.default_schema
    }

    /// Resolve an optional schema qualifier against the default schema
    pub fn resolve_schema<'a>(&'a self, schema: Option<&'a str>) -> &'a str {
        schema.unwrap_or(&self.default_schema)
    }

    /// Qualify a table name with the resolved schema
    pub fn table_name(&self, schema: Option<&str>, table: &str) -> TableName {
        TableName::new(self.resolve_schema(schema), table)
    }

    pub fn allocate_id(&mut self) -> ObjectId {
        self.next_id += 1;
        ObjectId(self.next_id)
    }

    pub fn index(&self) -> &LookupIndex {
        &self.index
    }

    pub fn index_register(&mut self, key: IndexKey, object: IndexedObject) -> Result<(), ModelError> {
        self.index.register(key, object)
    }

    /// Remove `key` and every key it prefixes from the lookup index
    pub fn index_deregister(&mut self, key: &IndexKey) -> Vec<(IndexKey, IndexedObject)> {
        let removed = self.index.deregister(key);
        debug!(key = %key, removed = removed.len(), "deregistered index keys");
        removed
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn get_schema_or_error(&self, name: &str) -> Result<&Schema, ModelError> {
        self.schemas.get(name).ok_or_else(|| ModelError::MissingSchema {
            schema: name.into()
        })
    }

    pub fn get_or_create_schema(&mut self, name: &str) -> Result<&mut Schema, ModelError> {
        if !self.schemas.contains_key(name) {
            self.create_schema(name)?;
        }
        self.schemas.get_mut(name).ok_or_else(|| ModelError::MissingSchema {
            schema: name.into()
        })
    }

    pub fn create_schema(&mut self, name: &str) -> Result<&mut Schema, ModelError> {
        if self.schemas.contains_key(name) {
            return Err(ModelError::SchemaAlreadyExists {
                schema: name.into()
            });
        }
        let id = self.allocate_id();
        self.index
            .register(IndexKey::schema(name), IndexedObject::Schema(id))?;
        let schema = self
            .schemas
            .entry(name.into())
            .or_insert_with(|| Schema::new(id, name));
        Ok(schema)
    }

    /// Drop a schema. Without `cascade` the schema must be empty; with it,
    /// every table is dropped with cascade first.
    pub fn drop_schema(&mut self, name: &str, cascade: bool) -> Result<Schema, ModelError> {
        let schema = self.get_schema_or_error(name)?;
        if !schema.is_empty() && !cascade {
            let tables: Vec<&str> = schema.tables().map(|t| t.name.table.as_str()).collect();
            return Err(ModelError::HasDependents {
                object:     format!("Schema \"{}\"", name),
                dependents: format!("contains table(s) {}", tables.join(", "))
            });
        }
        let tables: Vec<TableName> = schema.tables().map(|t| t.name.clone()).collect();
        for table in tables {
            self.delete_table(&table, true)?;
        }
        let schema = self
            .schemas
            .shift_remove(name)
            .ok_or_else(|| ModelError::MissingSchema {
                schema: name.into()
            })?;
        self.index_deregister(&IndexKey::schema(name));
        Ok(schema)
    }

    /// Create a table. The default schema always exists; any other schema
    /// must have been created first.
    pub fn create_table(&mut self, schema: Option<&str>, name: &str) -> Result<TableName, ModelError> {
        let table_name = self.table_name(schema, name);
        if !self.schemas.contains_key(&table_name.schema) {
            return Err(ModelError::MissingSchema {
                schema: table_name.schema
            });
        }
        if self.get_table_or_none(&table_name).is_some() {
            return Err(ModelError::TableAlreadyExists { table: table_name });
        }
        let id = self.allocate_id();
        self.index
            .register(table_name.index_key(), IndexedObject::Table(id))?;
        if let Some(schema) = self.schemas.get_mut(&table_name.schema) {
            schema
                .tables
                .insert(table_name.table.clone(), Table::new(id, table_name.clone()));
        }
        Ok(table_name)
    }

    pub fn get_or_create_table(&mut self, schema: Option<&str>, name: &str) -> Result<&mut Table, ModelError> {
        let table_name = self.table_name(schema, name);
        self.get_or_create_schema(&table_name.schema)?;
        if self.get_table_or_none(&table_name).is_none() {
            self.create_table(Some(&table_name.schema), &table_name.table)?;
        }
        self.table_mut(&table_name)
    }

    pub fn get_table_or_none(&self, name: &TableName) -> Option<&Table> {
        self.schemas.get(&name.schema)?.tables.get(&name.table)
    }

    pub fn get_table_or_error(&self, name: &TableName) -> Result<&Table, ModelError> {
        let schema = self.get_schema_or_error(&name.schema)?;
        schema
            .tables
            .get(&name.table)
            .ok_or_else(|| ModelError::MissingTable {
                table: name.clone()
            })
    }

    /// Look a table up by optional schema qualifier and name
    pub fn find_table(&self, schema: Option<&str>, name: &str) -> Option<&Table> {
        self.get_table_or_none(&self.table_name(schema, name))
    }

    pub fn table_mut(&mut self, name: &TableName) -> Result<&mut Table, ModelError> {
        let schema = self
            .schemas
            .get_mut(&name.schema)
            .ok_or_else(|| ModelError::MissingSchema {
                schema: name.schema.clone()
            })?;
        schema
            .tables
            .get_mut(&name.table)
            .ok_or_else(|| ModelError::MissingTable {
                table: name.clone()
            })
    }

    /// Build a column and add it through [`Table::add_column`]
    pub fn add_column(&mut self, table: &TableName, name: &str, datatype: Datatype) -> Result<ObjectId, ModelError> {
        self.add_column_with(table, name, datatype, Vec::new())
    }

    /// Build a column from constraints parsed ahead of it.
    ///
    /// Each constraint gets its column back-reference set here, after the
    /// column object exists.
    pub fn add_column_with(
        &mut self,
        table: &TableName,
        name: &str,
        datatype: Datatype,
        constraints: Vec<Constraint>
    ) -> Result<ObjectId, ModelError> {
        let id = self.allocate_id();
        let mut column = Column::new(id, table.clone(), name, datatype);
        for constraint in constraints {
            column.add_constraint(constraint)?;
        }
        let Database { schemas, index, .. } = self;
        let target = schemas
            .get_mut(&table.schema)
            .and_then(|s| s.tables.get_mut(&table.table))
            .ok_or_else(|| ModelError::MissingTable {
                table: table.clone()
            })?;
        target.add_column(column, index)?;
        Ok(id)
    }

    /// Delete a table.
    ///
    /// Fails with [`ModelError::HasDependents`] while the table takes part in
    /// a foreign key, unless `cascade` is set, in which case every foreign
    /// key owning or referencing it is severed first.
    pub fn delete_table(&mut self, name: &TableName, cascade: bool) -> Result<Table, ModelError> {
        let table = self.get_table_or_error(name)?;
        if table.has_dependents() {
            if !cascade {
                let dependents: Vec<String> =
                    table.foreign_keys().iter().map(|fk| fk.display_name()).collect();
                return Err(ModelError::HasDependents {
                    object:     format!("Table \"{}\"", name),
                    dependents: format!("foreign key(s) {}", dependents.join(", "))
                });
            }
            let keys: Vec<ForeignKey> = table.foreign_keys().into_iter().cloned().collect();
            for fk in &keys {
                self.sever_foreign_key(fk)?;
            }
        }
        let table = self
            .schemas
            .get_mut(&name.schema)
            .and_then(|s| s.tables.shift_remove(&name.table))
            .ok_or_else(|| ModelError::MissingTable {
                table: name.clone()
            })?;
        self.index_deregister(&name.index_key());
        Ok(table)
    }

    /// Every table across all schemas
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.schemas.values().flat_map(|s| s.tables())
    }

    pub(crate) fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.schemas.values_mut().flat_map(|s| s.tables.values_mut())
    }

    pub(crate) fn schema_mut(&mut self, name: &str) -> Result<&mut Schema, ModelError> {
        self.schemas
            .get_mut(name)
            .ok_or_else(|| ModelError::MissingSchema {
                schema: name.into()
            })
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new("main")
    }
}
