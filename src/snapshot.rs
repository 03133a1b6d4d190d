//! Serializable view of the final schema model, written by `--snapshot`.

use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    schema::{Column, Constraint, Database, Table}
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSnapshot {
    pub database:       String,
    pub default_schema: String,
    pub schemas:        Vec<SchemaSnapshot>
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaSnapshot {
    pub name:   String,
    pub tables: Vec<TableSnapshot>
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSnapshot {
    pub name:         String,
    pub columns:      Vec<ColumnSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key:  Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKeySnapshot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unique:       Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks:       Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub indexes:      Vec<IndexSnapshot>
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSnapshot {
    pub name:     String,
    pub datatype: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default:  Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks:   Vec<String>
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeySnapshot {
    pub name:        String,
    pub columns:     Vec<String>,
    /// `schema.table` of the referenced table
    pub references:  String,
    pub ref_columns: Vec<String>
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSnapshot {
    pub name:    String,
    pub columns: Vec<String>,
    pub unique:  bool
}

fn strings<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    items.iter().map(|s| s.as_ref().to_owned()).collect()
}

impl From<&Column> for ColumnSnapshot {
    fn from(column: &Column) -> Self {
        let checks = column
            .constraints()
            .iter()
            .filter_map(|c| match c {
                Constraint::CheckExpression(check) => Some(check.expression.clone()),
                _ => None
            })
            .collect();
        Self {
            name: column.name.to_string(),
            datatype: column.datatype.to_string(),
            nullable: column.is_nullable(),
            default: column.default_value().map(str::to_owned),
            checks
        }
    }
}

impl From<&Table> for TableSnapshot {
    fn from(table: &Table) -> Self {
        let foreign_keys = table
            .foreign_keys()
            .into_iter()
            .filter(|fk| fk.owner == table.name)
            .map(|fk| ForeignKeySnapshot {
                name:        fk.display_name(),
                columns:     strings(&fk.owner_columns),
                references:  fk.referenced.to_string(),
                ref_columns: strings(&fk.ref_columns)
            })
            .collect();
        Self {
            name: table.name.table.to_string(),
            columns: table.columns().map(ColumnSnapshot::from).collect(),
            primary_key: table.primary_key().map(|pk| strings(&pk.columns)),
            foreign_keys,
            unique: table.uniques().iter().map(|u| strings(&u.columns)).collect(),
            checks: table.checks().iter().map(|c| c.expression.clone()).collect(),
            indexes: table
                .indexes()
                .map(|ix| IndexSnapshot {
                    name:    ix.name.to_string(),
                    columns: strings(&ix.columns),
                    unique:  ix.unique
                })
                .collect()
        }
    }
}

impl From<&Database> for ModelSnapshot {
    fn from(db: &Database) -> Self {
        Self {
            database:       db.name.to_string(),
            default_schema: db.default_schema().to_owned(),
            schemas:        db
                .schemas()
                .map(|schema| SchemaSnapshot {
                    name:   schema.name.to_string(),
                    tables: schema.tables().map(TableSnapshot::from).collect()
                })
                .collect()
        }
    }
}

impl ModelSnapshot {
    pub fn to_json(&self) -> AppResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AppError::internal(format!("Failed to serialize model snapshot: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Datatype;

    #[test]
    fn test_snapshot_lists_tables_per_schema() {
        let mut db = Database::new("main");
        let users = db.create_table(None, "users").unwrap();
        db.add_column(&users, "id", Datatype::parse("varchar(20)"))
            .unwrap();

        let snapshot = ModelSnapshot::from(&db);
        assert_eq!(snapshot.default_schema, "dbo");
        let table = &snapshot.schemas[0].tables[0];
        assert_eq!(table.name, "users");
        assert_eq!(table.columns[0].datatype, "VARCHAR(20)");
        assert!(table.columns[0].nullable);
    }
}
