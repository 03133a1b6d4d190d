//! Constraint routing, foreign keys and SQL indexes.

use tracing::debug;

use super::{
    Constraint, Database, ForeignKey, ModelError, SqlIndex, Table, TableName
};

impl Database {
    /// Attach a constraint to `table`, storing it where its kind belongs.
    ///
    /// Foreign keys go to the participant maps of both tables, primary keys
    /// to the table and its member columns, single-column constraints to the
    /// column named by their back-reference.
    pub fn add_constraint(&mut self, table: &TableName, constraint: Constraint) -> Result<(), ModelError> {
        match constraint {
            Constraint::ForeignKey(fk) => self.add_foreign_key(fk),
            Constraint::PrimaryKey(pk) => self.table_mut(table)?.set_primary_key(pk),
            Constraint::UniqueValue(unique) => self.table_mut(table)?.add_unique(unique),
            Constraint::CheckExpression(check) => self.table_mut(table)?.add_check(check),
            Constraint::Index(index) => self.add_index(table, index),
            other => {
                let Some(column) = other.column().map(str::to_owned) else {
                    return Err(ModelError::Integrity(format!(
                        "{} constraint on \"{}\" has no column",
                        other.kind(),
                        table
                    )));
                };
                let target = self.table_mut(table)?;
                let missing = target.missing_column(&column);
                target
                    .column_mut(&column)
                    .ok_or(missing)?
                    .add_constraint(other)
            }
        }
    }

    /// Register a foreign key under both participant tables.
    ///
    /// An empty referenced column list means the referenced table's primary
    /// key.
    pub fn add_foreign_key(&mut self, mut fk: ForeignKey) -> Result<(), ModelError> {
        let owner = self.get_table_or_error(&fk.owner)?;
        for column in &fk.owner_columns {
            owner.get_column_or_error(column)?;
        }
        let referenced = self.get_table_or_error(&fk.referenced)?;
        if fk.ref_columns.is_empty()
            && let Some(pk) = referenced.primary_key()
        {
            fk.ref_columns = pk.columns.clone();
        }
        for column in &fk.ref_columns {
            referenced.get_column_or_error(column)?;
        }
        if fk.owner_columns.len() != fk.ref_columns.len() {
            return Err(ModelError::ForeignKeyArity {
                table:         fk.owner.clone(),
                owner_columns: fk.owner_columns.len(),
                ref_columns:   fk.ref_columns.len()
            });
        }

        let owner = fk.owner.clone();
        let referenced = fk.referenced.clone();
        let owner_pair = (owner.clone(), owner.clone());
        let ref_pair = (referenced.clone(), owner.clone());
        self.table_mut(&owner)?
            .register_constraint(owner_pair, Constraint::ForeignKey(fk.clone()));
        self.table_mut(&referenced)?
            .register_constraint(ref_pair, Constraint::ForeignKey(fk));
        Ok(())
    }

    /// Remove a foreign key from both participants' constraint maps.
    ///
    /// Entries left empty are pruned, so a table whose last foreign key is
    /// severed has an empty map again.
    pub fn sever_foreign_key(&mut self, fk: &ForeignKey) -> Result<(), ModelError> {
        let mut removed = 0;
        for name in [&fk.owner, &fk.referenced] {
            if let Ok(table) = self.table_mut(name) {
                removed += table.unregister_constraint(fk.id);
            }
        }
        if removed == 0 {
            return Err(ModelError::Integrity(format!(
                "foreign key {} is not registered on either participant",
                fk.display_name()
            )));
        }
        debug!(foreign_key = %fk.display_name(), entries = removed, "severed foreign key");
        Ok(())
    }

    /// Every distinct foreign key in the model
    pub fn foreign_keys(&self) -> Vec<&ForeignKey> {
        let mut keys: Vec<&ForeignKey> = Vec::new();
        for fk in self.tables().flat_map(|t| t.foreign_keys()) {
            if !keys.iter().any(|k| k.id == fk.id) {
                keys.push(fk);
            }
        }
        keys
    }

    /// Drop a named constraint of `table`.
    ///
    /// Foreign keys owned by the table are severed on both sides; any other
    /// named constraint is removed from the table or its columns.
    pub fn drop_constraint(&mut self, table: &TableName, name: &str) -> Result<Constraint, ModelError> {
        let owned = self
            .get_table_or_error(table)?
            .foreign_keys()
            .into_iter()
            .find(|fk| &fk.owner == table && fk.name.as_deref() == Some(name))
            .cloned();
        if let Some(fk) = owned {
            self.sever_foreign_key(&fk)?;
            return Ok(Constraint::ForeignKey(fk));
        }
        self.table_mut(table)?
            .remove_named_constraint(name)
            .ok_or_else(|| ModelError::MissingConstraint {
                table: table.clone(),
                name:  name.into()
            })
    }

    /// Table and index carrying `name` within `schema`
    pub fn find_index(&self, schema: &str, name: &str) -> Option<(&Table, &SqlIndex)> {
        self.schema(schema)?
            .tables()
            .find_map(|t| t.index(name).map(|ix| (t, ix)))
    }

    /// Add a named index to `table`. Index names are unique per schema.
    pub fn add_index(&mut self, table: &TableName, index: SqlIndex) -> Result<(), ModelError> {
        if self.find_index(&table.schema, &index.name).is_some() {
            return Err(ModelError::IndexAlreadyExists {
                schema: table.schema.clone(),
                index:  index.name
            });
        }
        self.table_mut(table)?.insert_index(index)
    }

    /// Remove the named index from every table of `schema`
    pub fn drop_index(&mut self, schema: &str, name: &str) -> Result<Vec<SqlIndex>, ModelError> {
        let removed: Vec<SqlIndex> = self
            .schema_mut(schema)?
            .tables
            .values_mut()
            .filter_map(|t| t.remove_index(name))
            .collect();
        if removed.is_empty() {
            return Err(ModelError::MissingIndex {
                schema: schema.into(),
                index:  name.into()
            });
        }
        Ok(removed)
    }

    pub fn rename_index(&mut self, schema: &str, old: &str, new: &str) -> Result<(), ModelError> {
        if self.find_index(schema, new).is_some() {
            return Err(ModelError::IndexAlreadyExists {
                schema: schema.into(),
                index:  new.into()
            });
        }
        let renamed = self
            .schema_mut(schema)?
            .tables
            .values_mut()
            .any(|t| t.rename_index(old, new));
        if !renamed {
            return Err(ModelError::MissingIndex {
                schema: schema.into(),
                index:  old.into()
            });
        }
        Ok(())
    }
}
