//! Commands and their clauses.

use enum_as_inner::EnumAsInner;
use fedquery_common::data_type::DataTypeName;
use fedquery_common::types::ProcedureId;

use crate::Ident;
use crate::criteria::Criteria;
use crate::expression::Expression;
use crate::macros::{base, ext};
use crate::procedure::{CreateProcedureCommand, TriggerAction};
use crate::symbol::{ElementSymbol, GroupSymbol};

#[apply(base)]
#[derive(EnumAsInner)]
pub enum Command {
    Query(Query),
    SetQuery(SetQuery),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    StoredProcedure(StoredProcedure),
    Dynamic(DynamicCommand),
    Create(CreateTempTable),
    Drop(DropTempTable),
    Procedure(CreateProcedureCommand),
    TriggerAction(TriggerAction),
}

impl Command {
    /// A short name for the kind of command, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Command::Query(_) => "query",
            Command::SetQuery(_) => "set query",
            Command::Insert(_) => "insert",
            Command::Update(_) => "update",
            Command::Delete(_) => "delete",
            Command::StoredProcedure(_) => "stored procedure",
            Command::Dynamic(_) => "dynamic command",
            Command::Create(_) => "create",
            Command::Drop(_) => "drop",
            Command::Procedure(_) => "procedure",
            Command::TriggerAction(_) => "trigger action",
        }
    }

    /// The symbols the command projects, with wildcards expanded once resolved.
    ///
    /// Commands without a result set project nothing.
    pub fn projected_symbols(&self) -> Vec<Expression> {
        match self {
            Command::Query(query) => query.select.projected_symbols(),
            Command::SetQuery(set_query) => set_query.left.projected_symbols(),
            Command::StoredProcedure(sp) => sp
                .result_columns
                .iter()
                .cloned()
                .map(Expression::Element)
                .collect(),
            Command::Dynamic(dynamic) if dynamic.into.is_none() => dynamic
                .as_columns
                .iter()
                .cloned()
                .map(Expression::Element)
                .collect(),
            Command::Procedure(procedure) => procedure
                .result_columns
                .iter()
                .cloned()
                .map(Expression::Element)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns `true` if executing the command yields rows to the caller.
    pub fn returns_results(&self) -> bool {
        match self {
            Command::Query(query) => query.into.is_none(),
            Command::SetQuery(_) => true,
            Command::StoredProcedure(sp) => !sp.result_columns.is_empty(),
            Command::Dynamic(dynamic) => dynamic.into.is_none() && !dynamic.as_columns.is_empty(),
            Command::Procedure(procedure) => !procedure.result_columns.is_empty(),
            _ => false,
        }
    }
}

#[apply(base)]
#[derive(Default)]
pub struct Query {
    pub select: Select,
    pub into: Option<IntoClause>,
    pub from: Option<FromList>,
    pub criteria: Option<Criteria>,
    pub group_by: Option<GroupBy>,
    pub having: Option<Criteria>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<Limit>,
}

impl Query {
    /// `SELECT symbols FROM groups`
    pub fn new(symbols: Vec<Expression>, groups: Vec<GroupSymbol>) -> Self {
        let from = (!groups.is_empty()).then(|| FromList {
            clauses: groups.into_iter().map(FromClause::group).collect(),
        });
        Self {
            select: Select {
                distinct: false,
                symbols,
            },
            from,
            ..Self::default()
        }
    }

    pub fn with_criteria(mut self, criteria: Criteria) -> Self {
        self.criteria = Some(criteria);
        self
    }

    pub fn with_order_by(mut self, items: Vec<OrderByItem>) -> Self {
        self.order_by = Some(OrderBy { items });
        self
    }

    /// The groups named directly in the FROM clause, in order of appearance.
    pub fn from_groups(&self) -> Vec<&GroupSymbol> {
        let mut groups = Vec::new();
        if let Some(from) = &self.from {
            for clause in &from.clauses {
                clause.collect_groups(&mut groups);
            }
        }
        groups
    }
}

#[apply(base)]
#[derive(Default)]
pub struct Select {
    pub distinct: bool,
    pub symbols: Vec<Expression>,
}

impl Select {
    pub fn projected_symbols(&self) -> Vec<Expression> {
        let mut projected = Vec::with_capacity(self.symbols.len());
        for symbol in &self.symbols {
            match symbol {
                Expression::Wildcard(wildcard) => projected.extend(
                    wildcard
                        .elements
                        .iter()
                        .flatten()
                        .cloned()
                        .map(Expression::Element),
                ),
                other => projected.push(other.clone()),
            }
        }
        projected
    }
}

#[apply(base)]
pub struct IntoClause {
    pub group: GroupSymbol,
}

#[apply(base)]
pub struct FromList {
    pub clauses: Vec<FromClause>,
}

#[apply(base)]
#[derive(EnumAsInner)]
pub enum FromClause {
    Unary(UnaryFromClause),
    Join(JoinPredicate),
    Subquery(SubqueryFromClause),
}

impl FromClause {
    #[inline]
    pub fn group(group: GroupSymbol) -> Self {
        FromClause::Unary(UnaryFromClause { group })
    }

    pub fn join(
        left: FromClause,
        join_type: JoinType,
        right: FromClause,
        criteria: Vec<Criteria>,
    ) -> Self {
        FromClause::Join(JoinPredicate {
            left: Box::new(left),
            join_type,
            right: Box::new(right),
            criteria,
        })
    }

    pub fn subquery(alias: impl Into<Ident>, command: Command) -> Self {
        FromClause::Subquery(SubqueryFromClause {
            group: GroupSymbol::new(alias),
            command: Box::new(command),
            lateral: false,
        })
    }

    fn collect_groups<'a>(&'a self, groups: &mut Vec<&'a GroupSymbol>) {
        match self {
            FromClause::Unary(unary) => groups.push(&unary.group),
            FromClause::Subquery(subquery) => groups.push(&subquery.group),
            FromClause::Join(join) => {
                join.left.collect_groups(groups);
                join.right.collect_groups(groups);
            }
        }
    }
}

#[apply(base)]
pub struct UnaryFromClause {
    pub group: GroupSymbol,
}

#[apply(ext)]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    Cross,
}

impl JoinType {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::LeftOuter => "LEFT OUTER JOIN",
            JoinType::RightOuter => "RIGHT OUTER JOIN",
            JoinType::FullOuter => "FULL OUTER JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

#[apply(base)]
pub struct JoinPredicate {
    pub left: Box<FromClause>,
    pub join_type: JoinType,
    pub right: Box<FromClause>,
    pub criteria: Vec<Criteria>,
}

/// A derived table, optionally `LATERAL`.
#[apply(base)]
pub struct SubqueryFromClause {
    pub group: GroupSymbol,
    pub command: Box<Command>,
    pub lateral: bool,
}

#[apply(base)]
pub struct GroupBy {
    pub symbols: Vec<Expression>,
}

#[apply(ext)]
pub enum NullOrdering {
    First,
    Last,
}

#[apply(base)]
pub struct OrderBy {
    pub items: Vec<OrderByItem>,
}

#[apply(base)]
pub struct OrderByItem {
    pub expression: Expression,
    pub ascending: bool,
    pub null_ordering: Option<NullOrdering>,
    /// Zero-based index of the projected symbol the item sorts by, once resolved.
    pub position: Option<usize>,
    /// Set when the item sorts by an expression that is not projected.
    pub unrelated: bool,
}

impl OrderByItem {
    pub fn new(expression: Expression) -> Self {
        Self {
            expression,
            ascending: true,
            null_ordering: None,
            position: None,
            unrelated: false,
        }
    }

    pub fn descending(mut self) -> Self {
        self.ascending = false;
        self
    }
}

#[apply(base)]
pub struct Limit {
    pub offset: Option<Expression>,
    pub row_limit: Option<Expression>,
}

#[apply(ext)]
pub enum SetOperation {
    Union,
    Intersect,
    Except,
}

impl SetOperation {
    pub fn keyword(self) -> &'static str {
        match self {
            SetOperation::Union => "UNION",
            SetOperation::Intersect => "INTERSECT",
            SetOperation::Except => "EXCEPT",
        }
    }

    /// `INTERSECT` binds tighter than `UNION` and `EXCEPT`.
    #[inline]
    pub fn precedence(self) -> u8 {
        match self {
            SetOperation::Intersect => 2,
            SetOperation::Union | SetOperation::Except => 1,
        }
    }
}

#[apply(base)]
pub struct SetQuery {
    pub op: SetOperation,
    pub all: bool,
    pub left: Box<Command>,
    pub right: Box<Command>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<Limit>,
    /// Reconciled column types, set on resolution.
    pub projected_types: Vec<DataTypeName>,
}

impl SetQuery {
    pub fn new(op: SetOperation, all: bool, left: Command, right: Command) -> Self {
        Self {
            op,
            all,
            left: Box::new(left),
            right: Box::new(right),
            order_by: None,
            limit: None,
            projected_types: Vec::new(),
        }
    }
}

/// `INSERT INTO group (variables) VALUES (values)` or `INSERT INTO group (variables) query`.
#[apply(base)]
pub struct Insert {
    pub group: GroupSymbol,
    pub variables: Vec<ElementSymbol>,
    pub values: Vec<Expression>,
    pub query: Option<Box<Command>>,
}

impl Insert {
    pub fn values(group: GroupSymbol, variables: Vec<ElementSymbol>, values: Vec<Expression>) -> Self {
        Self {
            group,
            variables,
            values,
            query: None,
        }
    }

    pub fn query(group: GroupSymbol, variables: Vec<ElementSymbol>, query: Command) -> Self {
        Self {
            group,
            variables,
            values: Vec::new(),
            query: Some(Box::new(query)),
        }
    }
}

#[apply(base)]
pub struct SetClause {
    pub symbol: ElementSymbol,
    pub value: Expression,
}

impl SetClause {
    pub fn new(symbol: impl Into<Ident>, value: Expression) -> Self {
        Self {
            symbol: ElementSymbol::new(symbol),
            value,
        }
    }
}

#[apply(base)]
pub struct Update {
    pub group: GroupSymbol,
    pub changes: Vec<SetClause>,
    pub criteria: Option<Criteria>,
}

#[apply(base)]
pub struct Delete {
    pub group: GroupSymbol,
    pub criteria: Option<Criteria>,
}

#[apply(ext)]
pub enum ParameterDirection {
    In,
    Out,
    InOut,
    ReturnValue,
}

impl ParameterDirection {
    #[inline]
    pub fn is_input(self) -> bool {
        matches!(self, ParameterDirection::In | ParameterDirection::InOut)
    }

    #[inline]
    pub fn is_output(self) -> bool {
        matches!(
            self,
            ParameterDirection::Out | ParameterDirection::InOut | ParameterDirection::ReturnValue
        )
    }
}

#[apply(base)]
pub struct SpParameter {
    /// Set for named arguments and filled with the formal name on resolution.
    pub name: Option<Ident>,
    /// The argument. For output parameters, the element receiving the value.
    pub expression: Option<Expression>,
    pub direction: ParameterDirection,
    pub data_type: Option<DataTypeName>,
    /// One-based position of the formal parameter, set on resolution.
    pub index: usize,
    pub uses_default: bool,
}

impl SpParameter {
    pub fn positional(expression: Expression) -> Self {
        Self {
            name: None,
            expression: Some(expression),
            direction: ParameterDirection::In,
            data_type: None,
            index: 0,
            uses_default: false,
        }
    }

    pub fn named(name: impl Into<Ident>, expression: Expression) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::positional(expression)
        }
    }
}

/// `EXEC procedure(args)`
#[apply(base)]
pub struct StoredProcedure {
    pub name: Ident,
    pub parameters: Vec<SpParameter>,
    /// Set when arguments are passed by name.
    pub named_parameters: bool,
    /// `target = EXEC ...`
    pub return_target: Option<ElementSymbol>,
    pub procedure_id: Option<ProcedureId>,
    /// The temp group exposing the result set, set on resolution.
    pub result_group: Option<GroupSymbol>,
    pub result_columns: Vec<ElementSymbol>,
}

impl StoredProcedure {
    pub fn new(name: impl Into<Ident>, parameters: Vec<SpParameter>) -> Self {
        let named_parameters = parameters.iter().any(|p| p.name.is_some());
        Self {
            name: name.into(),
            parameters,
            named_parameters,
            return_target: None,
            procedure_id: None,
            result_group: None,
            result_columns: Vec::new(),
        }
    }
}

/// `EXECUTE IMMEDIATE sql [AS columns] [INTO group] [USING bindings] [UPDATE count]`
#[apply(base)]
pub struct DynamicCommand {
    pub sql: Expression,
    pub as_columns: Vec<ElementSymbol>,
    pub into: Option<GroupSymbol>,
    pub using: Vec<SetClause>,
    pub update_count: i32,
}

impl DynamicCommand {
    pub fn new(sql: Expression) -> Self {
        Self {
            sql,
            as_columns: Vec::new(),
            into: None,
            using: Vec::new(),
            update_count: 0,
        }
    }
}

#[apply(base)]
pub struct ColumnDefinition {
    pub name: Ident,
    pub data_type: DataTypeName,
    pub nullable: bool,
    pub auto_increment: bool,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<Ident>, data_type: DataTypeName) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            auto_increment: false,
        }
    }
}

/// `CREATE LOCAL TEMPORARY TABLE`
#[apply(base)]
pub struct CreateTempTable {
    pub table: GroupSymbol,
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: Vec<Ident>,
}

#[apply(base)]
pub struct DropTempTable {
    pub table: GroupSymbol,
}
