//! Column and table alterations.

use compact_str::CompactString;

use super::{
    Constraint, ConstraintKind, Database, Datatype, DefaultValue, IndexKey, ModelError,
    PreventNotNull, TableName
};

impl Database {
    /// Drop a column.
    ///
    /// Refused while the column belongs to a composite primary key or to a
    /// foreign key on either side.
    pub fn drop_column(&mut self, table: &TableName, column: &str) -> Result<(), ModelError> {
        let target = self.get_table_or_error(table)?;
        target.get_column_or_error(column)?;

        if let Some(pk) = target.primary_key()
            && pk.is_composite()
            && pk.columns.iter().any(|c| c.as_str() == column)
        {
            return Err(ModelError::ColumnInUse {
                table:   table.clone(),
                column:  column.into(),
                used_by: "a composite primary key".into()
            });
        }
        for fk in target.foreign_keys() {
            let owning = &fk.owner == table && fk.owner_columns.iter().any(|c| c.as_str() == column);
            let referenced =
                &fk.referenced == table && fk.ref_columns.iter().any(|c| c.as_str() == column);
            if owning || referenced {
                return Err(ModelError::ColumnInUse {
                    table:   table.clone(),
                    column:  column.into(),
                    used_by: format!("foreign key {}", fk.display_name())
                });
            }
        }

        self.table_mut(table)?.take_column(column);
        self.index_deregister(&IndexKey::column(&table.schema, &table.table, column));
        Ok(())
    }

    /// Rename a column, re-keying the lookup index and every foreign key
    /// that lists it.
    pub fn rename_column(&mut self, table: &TableName, old: &str, new: &str) -> Result<(), ModelError> {
        let target = self.table_mut(table)?;
        let id = target.get_column_or_error(old)?.id;
        target.rename_column_entry(old, new)?;

        self.index_deregister(&IndexKey::column(&table.schema, &table.table, old));
        self.index_register(
            IndexKey::column(&table.schema, &table.table, new),
            super::IndexedObject::Column(id)
        )?;

        let rename = |name: &mut CompactString| {
            if name.as_str() == old {
                *name = new.into();
            }
        };
        for other in self.tables_mut() {
            for constraint in other.constraints_mut().values_mut().flatten() {
                if let Constraint::ForeignKey(fk) = constraint {
                    if &fk.owner == table {
                        fk.owner_columns.iter_mut().for_each(rename);
                    }
                    if &fk.referenced == table {
                        fk.ref_columns.iter_mut().for_each(rename);
                    }
                }
            }
        }
        Ok(())
    }

    /// Rename a table within its schema.
    ///
    /// Index keys of the table and its columns move to the new name, and
    /// participant pairs and foreign keys naming the table are rewritten.
    pub fn rename_table(&mut self, table: &TableName, new_name: &str) -> Result<TableName, ModelError> {
        let renamed = TableName::new(table.schema.clone(), new_name);
        self.get_table_or_error(table)?;
        if self.get_table_or_none(&renamed).is_some() {
            return Err(ModelError::TableAlreadyExists { table: renamed });
        }

        let schema = self.schema_mut(&table.schema)?;
        let position = schema.tables.get_index_of(&table.table).unwrap_or(schema.tables.len());
        if let Some(mut moved) = schema.tables.shift_remove(&table.table) {
            moved.set_name(renamed.clone());
            let position = position.min(schema.tables.len());
            schema
                .tables
                .shift_insert(position, renamed.table.clone(), moved);
        }

        for (key, object) in self.index_deregister(&table.index_key()) {
            let mut parts: Vec<CompactString> = key.parts().to_vec();
            parts[1] = renamed.table.clone();
            let key = match parts.as_slice() {
                [schema, name] => IndexKey::table(schema, name),
                [schema, name, column] => IndexKey::column(schema, name, column),
                _ => {
                    return Err(ModelError::Integrity(format!(
                        "unexpected index key {} under table {}",
                        key, table
                    )));
                }
            };
            self.index_register(key, object)?;
        }

        let swap = |name: TableName| if &name == table { renamed.clone() } else { name };
        for other in self.tables_mut() {
            let entries = std::mem::take(other.constraints_mut());
            for ((owner, peer), mut list) in entries {
                for constraint in &mut list {
                    if let Constraint::ForeignKey(fk) = constraint {
                        fk.owner = swap(fk.owner.clone());
                        fk.referenced = swap(fk.referenced.clone());
                    }
                }
                other
                    .constraints_mut()
                    .entry((swap(owner), swap(peer)))
                    .or_default()
                    .extend(list);
            }
        }
        Ok(renamed)
    }

    pub fn set_column_not_null(&mut self, table: &TableName, column: &str) -> Result<(), ModelError> {
        let id = self.allocate_id();
        let target = self.table_mut(table)?;
        let missing = target.missing_column(column);
        let column = target.column_mut(column).ok_or(missing)?;
        if column.has(ConstraintKind::NotNull) {
            return Ok(());
        }
        column.add_constraint(Constraint::PreventNotNull(PreventNotNull {
            id,
            name: None,
            column: None
        }))
    }

    /// Drop NOT NULL; refused for primary key members
    pub fn drop_column_not_null(&mut self, table: &TableName, column: &str) -> Result<(), ModelError> {
        let target = self.table_mut(table)?;
        let missing = target.missing_column(column);
        let col = target.column_mut(column).ok_or(missing)?;
        if col.has(ConstraintKind::PrimaryKey) {
            return Err(ModelError::ColumnInUse {
                table:   table.clone(),
                column:  column.into(),
                used_by: "the primary key".into()
            });
        }
        col.remove_kind(ConstraintKind::NotNull);
        Ok(())
    }

    /// Replace the column default
    pub fn set_column_default(
        &mut self,
        table: &TableName,
        column: &str,
        expression: String
    ) -> Result<(), ModelError> {
        let id = self.allocate_id();
        let target = self.table_mut(table)?;
        let missing = target.missing_column(column);
        let column = target.column_mut(column).ok_or(missing)?;
        column.remove_kind(ConstraintKind::Default);
        column.add_constraint(Constraint::DefaultValue(DefaultValue {
            id,
            name: None,
            column: None,
            expression
        }))
    }

    pub fn drop_column_default(&mut self, table: &TableName, column: &str) -> Result<(), ModelError> {
        let target = self.table_mut(table)?;
        let missing = target.missing_column(column);
        target
            .column_mut(column)
            .ok_or(missing)?
            .remove_kind(ConstraintKind::Default);
        Ok(())
    }

    pub fn change_column_datatype(
        &mut self,
        table: &TableName,
        column: &str,
        datatype: Datatype
    ) -> Result<(), ModelError> {
        let target = self.table_mut(table)?;
        let missing = target.missing_column(column);
        target
            .column_mut(column)
            .ok_or(missing)?
            .change_datatype(datatype);
        Ok(())
    }
}
