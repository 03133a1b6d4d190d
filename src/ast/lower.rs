//! Lowering of `sqlparser` statements into the flat node stream.

use compact_str::CompactString;
use sqlparser::ast::{
    AlterColumnOperation, AlterIndexOperation, AlterTableOperation, ColumnDef, ColumnOption,
    Expr, FromTable, FunctionArg, FunctionArgExpr, FunctionArguments, GroupByExpr, Ident,
    JoinConstraint, JoinOperator, ObjectName, Query, SchemaName, Select, SelectItem, SetExpr,
    Statement, TableConstraint, TableFactor, TableWithJoins
};

use super::{
    ColumnRef, Node, NodeData, NodeKind, StatementFlags, StatementTree, SubqueryInfo, TableRef
};

/// Lower a parsed statement into a [`StatementTree`].
///
/// Statements without a dedicated shape become a single `Command` root.
pub fn lower_statement(statement: &Statement) -> StatementTree {
    let mut lowering = Lowering::default();
    lowering.statement(statement);
    StatementTree::new(lowering.nodes)
}

/// Unquoted identifiers fold to lowercase, quoted ones keep their case
pub(crate) fn ident_name(ident: &Ident) -> CompactString {
    if ident.quote_style.is_some() {
        CompactString::from(ident.value.as_str())
    } else {
        CompactString::from(ident.value.to_lowercase())
    }
}

fn object_parts(name: &ObjectName) -> Vec<CompactString> {
    name.0.iter().map(ident_name).collect()
}

fn table_ref(name: &ObjectName, alias: Option<&Ident>) -> TableRef {
    let mut parts = object_parts(name);
    let table = parts.pop().unwrap_or_default();
    TableRef {
        schema: parts.pop(),
        name:   table,
        alias:  alias.map(ident_name)
    }
}

/// Output column names of a query and whether its projection has a `*`
fn projection_names(query: &Query) -> (Vec<CompactString>, bool) {
    fn from_set_expr(body: &SetExpr) -> (Vec<CompactString>, bool) {
        match body {
            SetExpr::Select(select) => {
                let mut names = Vec::new();
                let mut wildcard = false;
                for item in &select.projection {
                    match item {
                        SelectItem::UnnamedExpr(Expr::Identifier(ident)) => {
                            names.push(ident_name(ident))
                        }
                        SelectItem::UnnamedExpr(Expr::CompoundIdentifier(idents)) => {
                            if let Some(last) = idents.last() {
                                names.push(ident_name(last));
                            }
                        }
                        SelectItem::ExprWithAlias { alias, .. } => names.push(ident_name(alias)),
                        SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => wildcard = true,
                        SelectItem::UnnamedExpr(_) => {}
                    }
                }
                (names, wildcard)
            }
            SetExpr::Query(query) => projection_names(query),
            SetExpr::SetOperation { left, .. } => from_set_expr(left),
            _ => (Vec::new(), true)
        }
    }
    from_set_expr(&query.body)
}

fn flags(if_exists: bool, if_not_exists: bool, cascade: bool, unique: bool) -> NodeData {
    NodeData::Flags(StatementFlags {
        if_exists,
        if_not_exists,
        cascade,
        unique
    })
}

fn first_keyword(statement: &Statement) -> CompactString {
    statement
        .to_string()
        .split_whitespace()
        .next()
        .map(|w| CompactString::from(w.to_uppercase()))
        .unwrap_or_default()
}

#[derive(Default)]
struct Lowering {
    nodes: Vec<Node>
}

impl Lowering {
    fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Query(query) => self.query(query, 0),
            Statement::Insert(insert) => {
                let target = table_ref(&insert.table_name, None);
                self.push(Node::new(NodeKind::Insert, target.name.clone(), 0));
                self.push(
                    Node::new(NodeKind::Table, target.name.clone(), 1)
                        .with_data(NodeData::Table(target.clone()))
                );
                for column in &insert.columns {
                    let name = ident_name(column);
                    self.push(Node::new(NodeKind::Column, name.clone(), 1).with_data(
                        NodeData::Column(ColumnRef {
                            qualifier: Some(target.name.clone()),
                            name
                        })
                    ));
                }
                if let Some(source) = &insert.source {
                    self.query(source, 1);
                }
            }
            Statement::Update {
                table,
                assignments,
                selection,
                ..
            } => {
                let name = match &table.relation {
                    TableFactor::Table { name, .. } => table_ref(name, None).name,
                    _ => CompactString::default()
                };
                self.push(Node::new(NodeKind::Update, name, 0));
                self.table_with_joins(table, 1);
                for assignment in assignments {
                    self.push(Node::new(
                        NodeKind::Assignment,
                        assignment.target.to_string().to_lowercase(),
                        1
                    ));
                    self.expr(&assignment.value, 2);
                }
                self.where_clause(selection.as_ref(), 1);
            }
            Statement::Delete(delete) => {
                let tables = match &delete.from {
                    FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables
                };
                let name = tables
                    .first()
                    .and_then(|t| match &t.relation {
                        TableFactor::Table { name, .. } => Some(table_ref(name, None).name),
                        _ => None
                    })
                    .unwrap_or_default();
                self.push(Node::new(NodeKind::Delete, name, 0));
                for table in tables {
                    self.table_with_joins(table, 1);
                }
                self.where_clause(delete.selection.as_ref(), 1);
            }
            Statement::CreateTable(create) => {
                let target = table_ref(&create.name, None);
                self.push(
                    Node::new(NodeKind::Create, target.name.clone(), 0)
                        .with_sub_kind("table")
                        .with_data(flags(false, create.if_not_exists, false, false))
                );
                self.push(
                    Node::new(NodeKind::Table, target.name.clone(), 1)
                        .with_data(NodeData::Table(target))
                );
                for column in &create.columns {
                    self.column_def(column, 1);
                }
                for constraint in &create.constraints {
                    self.table_constraint(constraint, 1);
                }
                if let Some(query) = &create.query {
                    self.query(query, 1);
                }
            }
            Statement::CreateIndex(create) => {
                let name = create
                    .name
                    .as_ref()
                    .and_then(|n| object_parts(n).pop())
                    .unwrap_or_default();
                let target = table_ref(&create.table_name, None);
                self.push(
                    Node::new(NodeKind::Create, name, 0)
                        .with_sub_kind("index")
                        .with_data(flags(false, create.if_not_exists, false, create.unique))
                );
                self.push(
                    Node::new(NodeKind::Table, target.name.clone(), 1)
                        .with_data(NodeData::Table(target))
                );
                for column in &create.columns {
                    let name = match &column.expr {
                        Expr::Identifier(ident) => ident_name(ident),
                        other => CompactString::from(other.to_string())
                    };
                    self.push(Node::new(NodeKind::Identifier, name, 1));
                }
            }
            Statement::CreateSchema {
                schema_name,
                if_not_exists,
                ..
            } => {
                let name = match schema_name {
                    SchemaName::Simple(name) | SchemaName::NamedAuthorization(name, _) => {
                        object_parts(name).pop().unwrap_or_default()
                    }
                    SchemaName::UnnamedAuthorization(ident) => ident_name(ident)
                };
                self.push(
                    Node::new(NodeKind::Create, name.clone(), 0)
                        .with_sub_kind("schema")
                        .with_data(flags(false, *if_not_exists, false, false))
                );
                self.push(Node::new(NodeKind::Schema, name, 1));
            }
            Statement::CreateView { name, query, .. } => {
                let target = table_ref(name, None);
                self.push(Node::new(NodeKind::Create, target.name.clone(), 0).with_sub_kind("view"));
                self.push(
                    Node::new(NodeKind::Table, target.name.clone(), 1)
                        .with_data(NodeData::Table(target))
                );
                self.query(query, 1);
            }
            Statement::Drop {
                object_type,
                if_exists,
                names,
                cascade,
                ..
            } => {
                let kind = object_type.to_string().to_lowercase().replace(' ', "_");
                let child = match kind.as_str() {
                    "schema" => NodeKind::Schema,
                    "index" => NodeKind::Index,
                    _ => NodeKind::Table
                };
                let root_name = names
                    .first()
                    .and_then(|n| object_parts(n).pop())
                    .unwrap_or_default();
                self.push(
                    Node::new(NodeKind::Drop, root_name, 0)
                        .with_sub_kind(kind)
                        .with_data(flags(*if_exists, false, *cascade, false))
                );
                for name in names {
                    let target = table_ref(name, None);
                    self.push(
                        Node::new(child, target.name.clone(), 1).with_data(NodeData::Table(target))
                    );
                }
            }
            Statement::AlterTable {
                name,
                if_exists,
                operations,
                ..
            } => {
                let target = table_ref(name, None);
                self.push(
                    Node::new(NodeKind::AlterTable, target.name.clone(), 0)
                        .with_data(flags(*if_exists, false, false, false))
                );
                self.push(
                    Node::new(NodeKind::Table, target.name.clone(), 1)
                        .with_data(NodeData::Table(target))
                );
                for operation in operations {
                    self.alter_operation(operation, 1);
                }
            }
            Statement::AlterIndex { name, operation } => {
                let target = table_ref(name, None);
                self.push(
                    Node::new(NodeKind::AlterIndex, target.name.clone(), 0)
                        .with_data(NodeData::Table(target))
                );
                match operation {
                    AlterIndexOperation::RenameIndex { index_name } => {
                        let new_name = object_parts(index_name).pop().unwrap_or_default();
                        self.push(Node::new(NodeKind::Index, new_name, 1).with_sub_kind("rename"));
                    }
                }
            }
            Statement::Truncate { table_names, .. } => {
                self.push(Node::new(NodeKind::Truncate, "TRUNCATE", 0));
                for target in table_names {
                    let target = table_ref(&target.name, None);
                    self.push(
                        Node::new(NodeKind::Table, target.name.clone(), 1)
                            .with_data(NodeData::Table(target))
                    );
                }
            }
            other => self.push(Node::new(NodeKind::Command, first_keyword(other), 0))
        }
    }

    /// A query rooted at `depth`: the body's root node, then the CTEs, the
    /// body's clauses and ORDER BY beneath it.
    fn query(&mut self, query: &Query, depth: usize) {
        match query.body.as_ref() {
            SetExpr::Select(select) => {
                self.push(Node::new(NodeKind::Select, "", depth));
                self.with_clause(query, depth + 1);
                self.select(select, depth + 1);
            }
            SetExpr::SetOperation {
                op,
                set_quantifier,
                left,
                right
            } => {
                let name = format!("{} {}", op, set_quantifier).trim().to_uppercase();
                self.push(Node::new(NodeKind::SetOperation, name, depth));
                self.with_clause(query, depth + 1);
                self.set_expr(left, depth + 1);
                self.set_expr(right, depth + 1);
            }
            SetExpr::Query(inner) => {
                self.query(inner, depth);
                return;
            }
            other => {
                self.set_expr(other, depth);
                return;
            }
        }
        if let Some(order_by) = &query.order_by
            && !order_by.exprs.is_empty()
        {
            self.push(Node::new(NodeKind::Order, "", depth + 1));
            for item in &order_by.exprs {
                self.expr(&item.expr, depth + 2);
            }
        }
    }

    fn with_clause(&mut self, query: &Query, depth: usize) {
        let Some(with) = &query.with else {
            return;
        };
        self.push(Node::new(NodeKind::With, "", depth));
        for cte in &with.cte_tables {
            self.push(Node::new(NodeKind::Cte, ident_name(&cte.alias.name), depth + 1));
            self.query(&cte.query, depth + 2);
        }
    }

    fn set_expr(&mut self, body: &SetExpr, depth: usize) {
        match body {
            SetExpr::Select(select) => {
                self.push(Node::new(NodeKind::Select, "", depth));
                self.select(select, depth + 1);
            }
            SetExpr::Query(query) => self.query(query, depth),
            SetExpr::SetOperation {
                op,
                set_quantifier,
                left,
                right
            } => {
                let name = format!("{} {}", op, set_quantifier).trim().to_uppercase();
                self.push(Node::new(NodeKind::SetOperation, name, depth));
                self.set_expr(left, depth + 1);
                self.set_expr(right, depth + 1);
            }
            SetExpr::Values(values) => {
                self.push(Node::new(NodeKind::Values, "VALUES", depth));
                for row in &values.rows {
                    for value in row {
                        self.expr(value, depth + 1);
                    }
                }
            }
            other => self.push(Node::new(NodeKind::Expression, other.to_string(), depth))
        }
    }

    fn select(&mut self, select: &Select, depth: usize) {
        for item in &select.projection {
            match item {
                SelectItem::UnnamedExpr(expr) => self.expr(expr, depth),
                SelectItem::ExprWithAlias { expr, alias } => {
                    self.push(Node::new(NodeKind::Alias, ident_name(alias), depth));
                    self.expr(expr, depth + 1);
                }
                SelectItem::Wildcard(_) => self.push(Node::new(NodeKind::Star, "*", depth)),
                SelectItem::QualifiedWildcard(name, _) => {
                    let qualifier = object_parts(name).pop();
                    self.push(
                        Node::new(NodeKind::Star, format!("{}.*", name), depth).with_data(
                            NodeData::Column(ColumnRef {
                                qualifier,
                                name: "*".into()
                            })
                        )
                    );
                }
            }
        }
        if !select.from.is_empty() {
            self.push(Node::new(NodeKind::From, "", depth));
            for table in &select.from {
                self.table_with_joins(table, depth + 1);
            }
        }
        self.where_clause(select.selection.as_ref(), depth);
        if let GroupByExpr::Expressions(exprs, _) = &select.group_by
            && !exprs.is_empty()
        {
            self.push(Node::new(NodeKind::Group, "", depth));
            for expr in exprs {
                self.expr(expr, depth + 1);
            }
        }
        if let Some(having) = &select.having {
            self.push(Node::new(NodeKind::Having, "", depth));
            self.expr(having, depth + 1);
        }
    }

    fn where_clause(&mut self, selection: Option<&Expr>, depth: usize) {
        if let Some(selection) = selection {
            self.push(Node::new(NodeKind::Where, "", depth));
            self.expr(selection, depth + 1);
        }
    }

    fn table_with_joins(&mut self, table: &TableWithJoins, depth: usize) {
        self.table_factor(&table.relation, depth);
        for join in &table.joins {
            let (kind, constraint) = match &join.join_operator {
                JoinOperator::Inner(c) => ("inner", Some(c)),
                JoinOperator::LeftOuter(c) => ("left", Some(c)),
                JoinOperator::RightOuter(c) => ("right", Some(c)),
                JoinOperator::FullOuter(c) => ("full", Some(c)),
                JoinOperator::CrossJoin => ("cross", None),
                _ => ("other", None)
            };
            self.push(
                Node::new(NodeKind::Join, kind.to_uppercase(), depth).with_sub_kind(kind)
            );
            self.table_factor(&join.relation, depth + 1);
            if let Some(JoinConstraint::On(expr)) = constraint {
                self.expr(expr, depth + 1);
            }
        }
    }

    fn table_factor(&mut self, factor: &TableFactor, depth: usize) {
        match factor {
            TableFactor::Table { name, alias, .. } => {
                let target = table_ref(name, alias.as_ref().map(|a| &a.name));
                self.push(
                    Node::new(NodeKind::Table, target.name.clone(), depth)
                        .with_data(NodeData::Table(target))
                );
            }
            TableFactor::Derived {
                subquery, alias, ..
            } => {
                let alias = alias.as_ref().map(|a| ident_name(&a.name));
                let (columns, wildcard) = projection_names(subquery);
                self.push(
                    Node::new(NodeKind::Subquery, alias.clone().unwrap_or_default(), depth)
                        .with_data(NodeData::Subquery(SubqueryInfo {
                            alias,
                            columns,
                            wildcard
                        }))
                );
                self.query(subquery, depth + 1);
            }
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.table_with_joins(table_with_joins, depth),
            other => self.push(Node::new(NodeKind::Expression, other.to_string(), depth))
        }
    }

    fn subquery(&mut self, query: &Query, depth: usize) {
        let (columns, wildcard) = projection_names(query);
        self.push(
            Node::new(NodeKind::Subquery, "", depth).with_data(NodeData::Subquery(SubqueryInfo {
                alias: None,
                columns,
                wildcard
            }))
        );
        self.query(query, depth + 1);
    }

    fn expr(&mut self, expr: &Expr, depth: usize) {
        match expr {
            Expr::Identifier(ident) => {
                let name = ident_name(ident);
                self.push(Node::new(NodeKind::Column, name.clone(), depth).with_data(
                    NodeData::Column(ColumnRef {
                        qualifier: None,
                        name
                    })
                ));
            }
            Expr::CompoundIdentifier(idents) => {
                let mut parts: Vec<CompactString> = idents.iter().map(ident_name).collect();
                let name = parts.pop().unwrap_or_default();
                self.push(
                    Node::new(NodeKind::Column, name.clone(), depth).with_data(NodeData::Column(
                        ColumnRef {
                            qualifier: parts.pop(),
                            name
                        }
                    ))
                );
            }
            Expr::Value(value) => self.push(Node::new(NodeKind::Literal, value.to_string(), depth)),
            Expr::Nested(inner) => self.expr(inner, depth),
            Expr::BinaryOp { left, op, right } => {
                self.push(Node::new(NodeKind::Binary, op.to_string(), depth));
                self.expr(left, depth + 1);
                self.expr(right, depth + 1);
            }
            Expr::Like {
                expr, pattern, ..
            }
            | Expr::ILike {
                expr, pattern, ..
            } => {
                self.push(Node::new(NodeKind::Binary, "LIKE", depth));
                self.expr(expr, depth + 1);
                self.expr(pattern, depth + 1);
            }
            Expr::UnaryOp { op, expr } => {
                self.push(Node::new(NodeKind::Unary, op.to_string(), depth));
                self.expr(expr, depth + 1);
            }
            Expr::IsNull(inner) => {
                self.push(Node::new(NodeKind::Unary, "IS NULL", depth));
                self.expr(inner, depth + 1);
            }
            Expr::IsNotNull(inner) => {
                self.push(Node::new(NodeKind::Unary, "IS NOT NULL", depth));
                self.expr(inner, depth + 1);
            }
            Expr::Between {
                expr, low, high, ..
            } => {
                self.push(Node::new(NodeKind::Between, "BETWEEN", depth));
                self.expr(expr, depth + 1);
                self.expr(low, depth + 1);
                self.expr(high, depth + 1);
            }
            Expr::InList { expr, list, .. } => {
                self.push(Node::new(NodeKind::InList, "IN", depth));
                self.expr(expr, depth + 1);
                for item in list {
                    self.expr(item, depth + 1);
                }
            }
            Expr::InSubquery {
                expr, subquery, ..
            } => {
                self.push(Node::new(NodeKind::InList, "IN", depth));
                self.expr(expr, depth + 1);
                self.subquery(subquery, depth + 1);
            }
            Expr::Exists { subquery, .. } => {
                self.push(Node::new(NodeKind::Exists, "EXISTS", depth));
                self.subquery(subquery, depth + 1);
            }
            Expr::Subquery(query) => self.subquery(query, depth),
            Expr::Cast {
                expr, data_type, ..
            } => {
                self.push(Node::new(NodeKind::Cast, data_type.to_string(), depth));
                self.expr(expr, depth + 1);
            }
            Expr::Function(function) => {
                self.push(Node::new(
                    NodeKind::Function,
                    function.name.to_string().to_uppercase(),
                    depth
                ));
                if let FunctionArguments::List(list) = &function.args {
                    for arg in &list.args {
                        match arg {
                            FunctionArg::Unnamed(FunctionArgExpr::Expr(e))
                            | FunctionArg::Named {
                                arg: FunctionArgExpr::Expr(e),
                                ..
                            } => self.expr(e, depth + 1),
                            _ => {}
                        }
                    }
                }
            }
            other => self.push(
                Node::new(NodeKind::Expression, "", depth)
                    .with_data(NodeData::Expression(other.to_string()))
            )
        }
    }

    fn column_def(&mut self, column: &ColumnDef, depth: usize) {
        let name = ident_name(&column.name);
        self.push(Node::new(NodeKind::ColumnDef, name.clone(), depth));
        self.push(Node::new(NodeKind::Identifier, name, depth + 1));
        self.push(Node::new(NodeKind::DataType, column.data_type.to_string(), depth + 1));
        for option in &column.options {
            let constraint_name = option.name.as_ref().map(ident_name).unwrap_or_default();
            match &option.option {
                ColumnOption::NotNull => {
                    self.push(Node::new(NodeKind::NotNull, constraint_name, depth + 1))
                }
                ColumnOption::Unique { is_primary, .. } => {
                    let kind = if *is_primary {
                        NodeKind::PrimaryKey
                    } else {
                        NodeKind::Unique
                    };
                    self.push(Node::new(kind, constraint_name, depth + 1));
                }
                ColumnOption::Default(expr) => self.push(
                    Node::new(NodeKind::Default, constraint_name, depth + 1)
                        .with_data(NodeData::Expression(expr.to_string()))
                ),
                ColumnOption::Check(expr) => self.push(
                    Node::new(NodeKind::Check, constraint_name, depth + 1)
                        .with_data(NodeData::Expression(expr.to_string()))
                ),
                ColumnOption::ForeignKey {
                    foreign_table,
                    referred_columns,
                    ..
                } => {
                    self.push(Node::new(NodeKind::Reference, constraint_name, depth + 1));
                    self.reference(foreign_table, referred_columns, depth + 2);
                }
                _ => {}
            }
        }
    }

    fn reference(&mut self, table: &ObjectName, columns: &[Ident], depth: usize) {
        let target = table_ref(table, None);
        self.push(
            Node::new(NodeKind::Table, target.name.clone(), depth).with_data(NodeData::Table(target))
        );
        self.identifiers(columns, depth);
    }

    fn identifiers(&mut self, idents: &[Ident], depth: usize) {
        for ident in idents {
            self.push(Node::new(NodeKind::Identifier, ident_name(ident), depth));
        }
    }

    fn table_constraint(&mut self, constraint: &TableConstraint, depth: usize) {
        let constraint_name = |name: &Option<Ident>| name.as_ref().map(ident_name).unwrap_or_default();
        match constraint {
            TableConstraint::PrimaryKey { name, columns, .. } => {
                self.push(Node::new(NodeKind::PrimaryKey, constraint_name(name), depth));
                self.identifiers(columns, depth + 1);
            }
            TableConstraint::Unique { name, columns, .. } => {
                self.push(Node::new(NodeKind::Unique, constraint_name(name), depth));
                self.identifiers(columns, depth + 1);
            }
            TableConstraint::ForeignKey {
                name,
                columns,
                foreign_table,
                referred_columns,
                ..
            } => {
                self.push(Node::new(NodeKind::ForeignKey, constraint_name(name), depth));
                self.identifiers(columns, depth + 1);
                self.push(Node::new(NodeKind::Reference, "", depth + 1));
                self.reference(foreign_table, referred_columns, depth + 2);
            }
            TableConstraint::Check { name, expr, .. } => self.push(
                Node::new(NodeKind::Check, constraint_name(name), depth)
                    .with_data(NodeData::Expression(expr.to_string()))
            ),
            TableConstraint::Index { name, columns, .. } => {
                self.push(Node::new(NodeKind::Index, constraint_name(name), depth));
                self.identifiers(columns, depth + 1);
            }
            other => self.push(Node::new(NodeKind::Unsupported, other.to_string(), depth))
        }
    }

    fn alter_operation(&mut self, operation: &AlterTableOperation, depth: usize) {
        match operation {
            AlterTableOperation::AddColumn {
                column_def,
                if_not_exists,
                ..
            } => {
                self.push(
                    Node::new(NodeKind::AddColumn, ident_name(&column_def.name), depth)
                        .with_data(flags(false, *if_not_exists, false, false))
                );
                self.column_def(column_def, depth + 1);
            }
            AlterTableOperation::DropColumn {
                column_name,
                if_exists,
                ..
            } => self.push(
                Node::new(NodeKind::DropColumn, ident_name(column_name), depth)
                    .with_data(flags(*if_exists, false, false, false))
            ),
            AlterTableOperation::RenameColumn {
                old_column_name,
                new_column_name
            } => {
                self.push(Node::new(NodeKind::RenameColumn, ident_name(old_column_name), depth));
                self.identifiers(&[old_column_name.clone(), new_column_name.clone()], depth + 1);
            }
            AlterTableOperation::RenameTable { table_name } => {
                let target = table_ref(table_name, None);
                self.push(Node::new(NodeKind::RenameTable, target.name.clone(), depth));
                self.push(
                    Node::new(NodeKind::Table, target.name.clone(), depth + 1)
                        .with_data(NodeData::Table(target))
                );
            }
            AlterTableOperation::AddConstraint(constraint) => {
                self.push(Node::new(NodeKind::AddConstraint, "", depth));
                self.table_constraint(constraint, depth + 1);
            }
            AlterTableOperation::DropConstraint {
                name, if_exists, ..
            } => self.push(
                Node::new(NodeKind::DropConstraint, ident_name(name), depth)
                    .with_data(flags(*if_exists, false, false, false))
            ),
            AlterTableOperation::DropPrimaryKey => {
                self.push(Node::new(NodeKind::DropPrimaryKey, "", depth))
            }
            AlterTableOperation::AlterColumn { column_name, op } => {
                let name = ident_name(column_name);
                match op {
                    AlterColumnOperation::SetNotNull => self.push(
                        Node::new(NodeKind::AlterColumn, name, depth).with_sub_kind("set_not_null")
                    ),
                    AlterColumnOperation::DropNotNull => self.push(
                        Node::new(NodeKind::AlterColumn, name, depth).with_sub_kind("drop_not_null")
                    ),
                    AlterColumnOperation::SetDefault { value } => {
                        self.push(
                            Node::new(NodeKind::AlterColumn, name, depth).with_sub_kind("set_default")
                        );
                        self.push(
                            Node::new(NodeKind::Default, "", depth + 1)
                                .with_data(NodeData::Expression(value.to_string()))
                        );
                    }
                    AlterColumnOperation::DropDefault => self.push(
                        Node::new(NodeKind::AlterColumn, name, depth).with_sub_kind("drop_default")
                    ),
                    AlterColumnOperation::SetDataType { data_type, .. } => {
                        self.push(
                            Node::new(NodeKind::AlterColumn, name, depth)
                                .with_sub_kind("set_data_type")
                        );
                        self.push(Node::new(NodeKind::DataType, data_type.to_string(), depth + 1));
                    }
                    other => self.push(
                        Node::new(NodeKind::Unsupported, format!("ALTER COLUMN {} {}", name, other), depth)
                    )
                }
            }
            other => self.push(Node::new(NodeKind::Unsupported, other.to_string(), depth))
        }
    }
}
