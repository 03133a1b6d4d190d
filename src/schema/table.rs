use compact_str::CompactString;
use indexmap::IndexMap;

use super::{
    CheckExpression, Constraint, ConstraintKind, Datatype, ForeignKey, IndexKey, IndexedObject,
    LookupIndex, ModelError, ObjectId, PrimaryKey, SqlIndex, TableName, UniqueValue
};

/// Participant pair keying a table's constraint map: `(owner, other)`
pub type ParticipantPair = (TableName, TableName);

#[derive(Debug, Clone)]
pub struct Schema {
    pub id:              ObjectId,
    pub name:            CompactString,
    pub(crate) tables:   IndexMap<CompactString, Table>
}

impl Schema {
    pub(crate) fn new(id: ObjectId, name: &str) -> Self {
        Self {
            id,
            name: name.into(),
            tables: IndexMap::new()
        }
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    pub id:          ObjectId,
    pub name:        TableName,
    columns:         IndexMap<CompactString, Column>,
    primary_key:     Option<PrimaryKey>,
    constraints:     IndexMap<ParticipantPair, Vec<Constraint>>,
    checks:          Vec<CheckExpression>,
    uniques:         Vec<UniqueValue>,
    indexes:         IndexMap<CompactString, SqlIndex>
}

impl Table {
    pub(crate) fn new(id: ObjectId, name: TableName) -> Self {
        Self {
            id,
            name,
            columns: IndexMap::new(),
            primary_key: None,
            constraints: IndexMap::new(),
            checks: Vec::new(),
            uniques: Vec::new(),
            indexes: IndexMap::new()
        }
    }

    /// Add a column to the table and register it in the lookup index
    pub fn add_column(&mut self, column: Column, index: &mut LookupIndex) -> Result<(), ModelError> {
        if self.columns.contains_key(&column.name) {
            return Err(ModelError::ColumnAlreadyExists {
                table:  self.name.clone(),
                column: column.name
            });
        }
        index.register(
            IndexKey::column(&self.name.schema, &self.name.table, &column.name),
            IndexedObject::Column(column.id)
        )?;
        self.columns.insert(column.name.clone(), column);
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.get_mut(name)
    }

    pub fn get_column_or_error(&self, name: &str) -> Result<&Column, ModelError> {
        self.columns.get(name).ok_or_else(|| self.missing_column(name))
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn primary_key(&self) -> Option<&PrimaryKey> {
        self.primary_key.as_ref()
    }

    /// Install the primary key and mark each member column with it
    pub fn set_primary_key(&mut self, pk: PrimaryKey) -> Result<(), ModelError> {
        if self.primary_key.is_some() {
            return Err(ModelError::DuplicatePrimaryKey {
                table: self.name.clone()
            });
        }
        for name in &pk.columns {
            if !self.columns.contains_key(name) {
                return Err(self.missing_column(name));
            }
        }
        for name in &pk.columns {
            if let Some(column) = self.columns.get_mut(name) {
                column.add_constraint(Constraint::PrimaryKey(pk.clone()))?;
            }
        }
        self.primary_key = Some(pk);
        Ok(())
    }

    pub fn drop_primary_key(&mut self) -> Option<PrimaryKey> {
        let pk = self.primary_key.take()?;
        for name in &pk.columns {
            if let Some(column) = self.columns.get_mut(name) {
                column.remove_kind(ConstraintKind::PrimaryKey);
            }
        }
        Some(pk)
    }

    /// Participant-pair constraint map (foreign keys)
    pub fn constraints(&self) -> &IndexMap<ParticipantPair, Vec<Constraint>> {
        &self.constraints
    }

    pub fn has_dependents(&self) -> bool {
        !self.constraints.is_empty()
    }

    /// Every foreign key this table owns or is referenced by, once each
    pub fn foreign_keys(&self) -> Vec<&ForeignKey> {
        let mut seen = Vec::new();
        let mut keys = Vec::new();
        for constraint in self.constraints.values().flatten() {
            if let Constraint::ForeignKey(fk) = constraint
                && !seen.contains(&fk.id)
            {
                seen.push(fk.id);
                keys.push(fk);
            }
        }
        keys
    }

    pub(crate) fn register_constraint(&mut self, pair: ParticipantPair, constraint: Constraint) {
        self.constraints.entry(pair).or_default().push(constraint);
    }

    /// Remove every constraint with `id` from the map, pruning empty entries
    pub(crate) fn unregister_constraint(&mut self, id: ObjectId) -> usize {
        let mut removed = 0;
        for list in self.constraints.values_mut() {
            let before = list.len();
            list.retain(|c| c.id() != id);
            removed += before - list.len();
        }
        self.constraints.retain(|_, list| !list.is_empty());
        removed
    }

    pub(crate) fn constraints_mut(&mut self) -> &mut IndexMap<ParticipantPair, Vec<Constraint>> {
        &mut self.constraints
    }

    pub fn uniques(&self) -> &[UniqueValue] {
        &self.uniques
    }

    /// Add a UNIQUE constraint; single-column ones also land on the column
    pub fn add_unique(&mut self, unique: UniqueValue) -> Result<(), ModelError> {
        for name in &unique.columns {
            if !self.columns.contains_key(name) {
                return Err(self.missing_column(name));
            }
        }
        if let [single] = unique.columns.as_slice()
            && let Some(column) = self.columns.get_mut(single)
        {
            column.add_constraint(Constraint::UniqueValue(unique.clone()))?;
        }
        self.uniques.push(unique);
        Ok(())
    }

    pub fn checks(&self) -> &[CheckExpression] {
        &self.checks
    }

    /// Add a CHECK; column-bound ones go to the column's constraint list
    pub fn add_check(&mut self, check: CheckExpression) -> Result<(), ModelError> {
        match check.column.clone() {
            Some(name) => {
                let table = self.name.clone();
                let column = self.columns.get_mut(&name).ok_or(ModelError::MissingColumn {
                    table,
                    column: name
                })?;
                column.add_constraint(Constraint::CheckExpression(check))
            }
            None => {
                self.checks.push(check);
                Ok(())
            }
        }
    }

    pub fn indexes(&self) -> impl Iterator<Item = &SqlIndex> {
        self.indexes.values()
    }

    pub fn index(&self, name: &str) -> Option<&SqlIndex> {
        self.indexes.get(name)
    }

    pub(crate) fn insert_index(&mut self, index: SqlIndex) -> Result<(), ModelError> {
        for name in &index.columns {
            if !self.columns.contains_key(name) {
                return Err(self.missing_column(name));
            }
        }
        self.indexes.insert(index.name.clone(), index);
        Ok(())
    }

    pub(crate) fn remove_index(&mut self, name: &str) -> Option<SqlIndex> {
        self.indexes.shift_remove(name)
    }

    pub(crate) fn rename_index(&mut self, old: &str, new: &str) -> bool {
        let Some(position) = self.indexes.get_index_of(old) else {
            return false;
        };
        if let Some(mut index) = self.indexes.shift_remove(old) {
            index.name = new.into();
            self.indexes.shift_insert(position, index.name.clone(), index);
        }
        true
    }

    /// True when some index, unique constraint or the primary key starts
    /// with exactly `columns` (in any order)
    pub fn is_covered_by_index(&self, columns: &[CompactString]) -> bool {
        let covers = |candidate: &[CompactString]| {
            candidate.len() >= columns.len()
                && columns.iter().all(|c| candidate[..columns.len()].contains(c))
        };
        self.indexes.values().any(|ix| covers(&ix.columns))
            || self.uniques.iter().any(|u| covers(&u.columns))
            || self.primary_key.as_ref().is_some_and(|pk| covers(&pk.columns))
    }

    /// Remove a named constraint stored on this table or one of its columns.
    ///
    /// Foreign keys live in the participant map and are removed through
    /// [`Database::drop_constraint`](super::Database::drop_constraint).
    pub(crate) fn remove_named_constraint(&mut self, name: &str) -> Option<Constraint> {
        if self
            .primary_key
            .as_ref()
            .is_some_and(|pk| pk.name.as_deref() == Some(name))
        {
            return self.drop_primary_key().map(Constraint::PrimaryKey);
        }
        if let Some(pos) = self.uniques.iter().position(|u| u.name.as_deref() == Some(name)) {
            let unique = self.uniques.remove(pos);
            for column in self.columns.values_mut() {
                column.remove_id(unique.id);
            }
            return Some(Constraint::UniqueValue(unique));
        }
        if let Some(pos) = self.checks.iter().position(|c| c.name.as_deref() == Some(name)) {
            return Some(Constraint::CheckExpression(self.checks.remove(pos)));
        }
        for column in self.columns.values_mut() {
            if let Some(pos) = column.constraints.iter().position(|c| c.name() == Some(name)) {
                return Some(column.constraints.remove(pos));
            }
        }
        None
    }

    /// Remove a column from the table maps; callers handle the lookup index
    pub(crate) fn take_column(&mut self, name: &str) -> Option<Column> {
        let column = self.columns.shift_remove(name)?;
        if self
            .primary_key
            .as_ref()
            .is_some_and(|pk| pk.columns.iter().any(|c| c.as_str() == name))
        {
            self.primary_key = None;
        }
        self.uniques.retain(|u| !u.columns.iter().any(|c| c.as_str() == name));
        self.checks.retain(|c| c.column.as_deref() != Some(name));
        for index in self.indexes.values_mut() {
            index.columns.retain(|c| c.as_str() != name);
        }
        self.indexes.retain(|_, ix| !ix.columns.is_empty());
        Some(column)
    }

    pub(crate) fn rename_column_entry(&mut self, old: &str, new: &str) -> Result<(), ModelError> {
        if self.columns.contains_key(new) {
            return Err(ModelError::ColumnAlreadyExists {
                table:  self.name.clone(),
                column: new.into()
            });
        }
        let position = self
            .columns
            .get_index_of(old)
            .ok_or_else(|| self.missing_column(old))?;
        let Some(mut column) = self.columns.shift_remove(old) else {
            return Err(self.missing_column(old));
        };
        column.name = new.into();
        for constraint in &mut column.constraints {
            constraint.rename_column(old, new);
        }
        self.columns.shift_insert(position, column.name.clone(), column);

        let rename = |name: &mut CompactString| {
            if name.as_str() == old {
                *name = new.into();
            }
        };
        if let Some(pk) = &mut self.primary_key {
            pk.columns.iter_mut().for_each(rename);
        }
        for unique in &mut self.uniques {
            unique.columns.iter_mut().for_each(rename);
        }
        for index in self.indexes.values_mut() {
            index.columns.iter_mut().for_each(rename);
        }
        for other in self.columns.values_mut() {
            for constraint in &mut other.constraints {
                if matches!(
                    constraint.kind(),
                    ConstraintKind::PrimaryKey | ConstraintKind::Unique
                ) {
                    constraint.rename_column(old, new);
                }
            }
        }
        Ok(())
    }

    /// Point every back-reference at the table's new name
    pub(crate) fn set_name(&mut self, name: TableName) {
        for column in self.columns.values_mut() {
            column.table = name.clone();
        }
        self.name = name;
    }

    pub(crate) fn missing_column(&self, name: &str) -> ModelError {
        ModelError::MissingColumn {
            table:  self.name.clone(),
            column: name.into()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub id:                 ObjectId,
    pub name:               CompactString,
    pub table:              TableName,
    pub datatype:           Datatype,
    pub(crate) constraints: Vec<Constraint>
}

impl Column {
    pub fn new(id: ObjectId, table: TableName, name: &str, datatype: Datatype) -> Self {
        Self {
            id,
            name: name.into(),
            table,
            datatype,
            constraints: Vec::new()
        }
    }

    /// Attach a constraint, at most one per kind.
    ///
    /// A primary key implies NOT NULL.
    pub fn add_constraint(&mut self, mut constraint: Constraint) -> Result<(), ModelError> {
        let kind = constraint.kind();
        if self.has(kind) {
            return Err(ModelError::DuplicateConstraint {
                table: self.table.clone(),
                column: self.name.clone(),
                kind
            });
        }
        constraint.attach_to(&self.name);
        let implied_not_null = match &constraint {
            Constraint::PrimaryKey(pk) if !self.has(ConstraintKind::NotNull) => Some(pk.id),
            _ => None
        };
        self.constraints.push(constraint);
        if let Some(id) = implied_not_null {
            self.constraints
                .push(Constraint::PreventNotNull(super::PreventNotNull {
                    id,
                    name: None,
                    column: Some(self.name.clone())
                }));
        }
        Ok(())
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn has(&self, kind: ConstraintKind) -> bool {
        self.constraints.iter().any(|c| c.kind() == kind)
    }

    pub fn constraint(&self, kind: ConstraintKind) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.kind() == kind)
    }

    pub fn remove_kind(&mut self, kind: ConstraintKind) -> Option<Constraint> {
        let pos = self.constraints.iter().position(|c| c.kind() == kind)?;
        Some(self.constraints.remove(pos))
    }

    pub(crate) fn remove_id(&mut self, id: ObjectId) {
        self.constraints.retain(|c| c.id() != id);
    }

    pub fn is_nullable(&self) -> bool {
        !self.has(ConstraintKind::NotNull)
    }

    pub fn default_value(&self) -> Option<&str> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::DefaultValue(d) => Some(d.expression.as_str()),
            _ => None
        })
    }

    pub fn change_datatype(&mut self, datatype: Datatype) {
        self.datatype = datatype;
    }
}
