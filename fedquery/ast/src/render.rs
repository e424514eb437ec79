//! Canonical string form of the object model.
//!
//! Every node renders to a tree of [`Parts`]: literal text interleaved with the nested parts of
//! its children. The tree is flattened on demand. Identifiers are quoted segment by segment when
//! they are reserved words or not simple names, and string literals double embedded quotes.

use std::borrow::Cow;
use std::fmt;

use fedquery_common::constants::{CAST_FUNCTION, CONVERT_FUNCTION, UNDEFINED};
use fedquery_common::value::ScalarValue;
use itertools::Itertools;

use crate::command::{
    ColumnDefinition, Command, CreateTempTable, Delete, DropTempTable, DynamicCommand,
    FromClause, Insert, Limit, OrderBy, OrderByItem, Query, SetClause, SetQuery, SpParameter,
    StoredProcedure, Update,
};
use crate::criteria::{
    CompareCriteria, Criteria, CriteriaSelector, LogicalOp, MatchMode, SelectorKind,
};
use crate::expression::{Constant, Expression, Function, ReferenceKind};
use crate::procedure::{
    Block, CreateProcedureCommand, ProcedureKind, Statement, TriggerAction,
};
use crate::reserved::needs_quoting;
use crate::symbol::{ElementSymbol, GroupSymbol};

/// Functions rendered as infix operators.
const INFIX_OPERATORS: &[&str] = &["+", "-", "*", "/", "||"];

#[derive(Debug, Clone)]
pub enum Part {
    Text(Cow<'static, str>),
    Nested(Parts),
}

#[derive(Debug, Clone, Default)]
pub struct Parts(Vec<Part>);

impl Parts {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn text(&mut self, text: impl Into<Cow<'static, str>>) -> &mut Self {
        self.0.push(Part::Text(text.into()));
        self
    }

    #[inline]
    pub fn node<T: Render + ?Sized>(&mut self, node: &T) -> &mut Self {
        self.0.push(Part::Nested(node.to_parts()));
        self
    }

    pub fn list<'a, T, I>(&mut self, nodes: I, separator: &'static str) -> &mut Self
    where
        T: Render + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        for (i, node) in nodes.into_iter().enumerate() {
            if i > 0 {
                self.text(separator);
            }
            self.node(node);
        }
        self
    }

    #[inline]
    pub fn ident(&mut self, name: &str) -> &mut Self {
        self.text(quote_identifier(name))
    }

    fn flatten_into(&self, out: &mut String) {
        for part in &self.0 {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Nested(nested) => nested.flatten_into(out),
            }
        }
    }
}

impl fmt::Display for Parts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.flatten_into(&mut out);
        f.write_str(&out)
    }
}

pub trait Render {
    fn to_parts(&self) -> Parts;

    fn render(&self) -> String {
        self.to_parts().to_string()
    }
}

/// Renders a node, or the `<undefined>` placeholder when it is absent.
pub fn render<T: Render + ?Sized>(node: Option<&T>) -> String {
    node.map_or_else(|| UNDEFINED.to_string(), Render::render)
}

/// Quotes each dot-separated segment of `name` that needs it.
pub fn quote_identifier(name: &str) -> String {
    name.split('.')
        .map(|segment| {
            if needs_quoting(segment) {
                Cow::Owned(format!("\"{}\"", segment.replace('"', "\"\"")))
            } else {
                Cow::Borrowed(segment)
            }
        })
        .join(".")
}

/// Renders a string literal, doubling embedded single quotes.
pub fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl<T: Render + ?Sized> Render for Box<T> {
    fn to_parts(&self) -> Parts {
        (**self).to_parts()
    }
}

impl Render for Command {
    fn to_parts(&self) -> Parts {
        match self {
            Command::Query(query) => query.to_parts(),
            Command::SetQuery(set_query) => set_query.to_parts(),
            Command::Insert(insert) => insert.to_parts(),
            Command::Update(update) => update.to_parts(),
            Command::Delete(delete) => delete.to_parts(),
            Command::StoredProcedure(sp) => sp.to_parts(),
            Command::Dynamic(dynamic) => dynamic.to_parts(),
            Command::Create(create) => create.to_parts(),
            Command::Drop(drop) => drop.to_parts(),
            Command::Procedure(procedure) => procedure.to_parts(),
            Command::TriggerAction(action) => action.to_parts(),
        }
    }
}

impl Render for Query {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        parts.text("SELECT ");
        if self.select.distinct {
            parts.text("DISTINCT ");
        }
        parts.list(&self.select.symbols, ", ");
        if let Some(into) = &self.into {
            parts.text(" INTO ").node(&into.group);
        }
        if let Some(from) = &self.from {
            parts.text(" FROM ").list(&from.clauses, ", ");
        }
        if let Some(criteria) = &self.criteria {
            parts.text(" WHERE ").node(criteria);
        }
        if let Some(group_by) = &self.group_by {
            parts.text(" GROUP BY ").list(&group_by.symbols, ", ");
        }
        if let Some(having) = &self.having {
            parts.text(" HAVING ").node(having);
        }
        if let Some(order_by) = &self.order_by {
            parts.text(" ").node(order_by);
        }
        if let Some(limit) = &self.limit {
            parts.text(" ").node(limit);
        }
        parts
    }
}

impl Render for FromClause {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        match self {
            FromClause::Unary(unary) => {
                parts.node(&unary.group);
            }
            FromClause::Subquery(subquery) => {
                if subquery.lateral {
                    parts.text("LATERAL");
                }
                parts
                    .text("(")
                    .node(&subquery.command)
                    .text(") AS ")
                    .ident(&subquery.group.name);
            }
            FromClause::Join(join) => {
                parts.node(&join.left).text(" ").text(join.join_type.keyword()).text(" ");
                if matches!(*join.right, FromClause::Join(_)) {
                    parts.text("(").node(&join.right).text(")");
                } else {
                    parts.node(&join.right);
                }
                if !join.criteria.is_empty() {
                    parts.text(" ON ").list(&join.criteria, " AND ");
                }
            }
        }
        parts
    }
}

impl Render for OrderBy {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        parts.text("ORDER BY ").list(&self.items, ", ");
        parts
    }
}

impl Render for OrderByItem {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        parts.node(&self.expression);
        if !self.ascending {
            parts.text(" DESC");
        }
        match self.null_ordering {
            Some(crate::command::NullOrdering::First) => {
                parts.text(" NULLS FIRST");
            }
            Some(crate::command::NullOrdering::Last) => {
                parts.text(" NULLS LAST");
            }
            None => {}
        }
        parts
    }
}

impl Render for Limit {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        match (&self.offset, &self.row_limit) {
            (Some(offset), Some(row_limit)) => {
                parts.text("LIMIT ").node(offset).text(", ").node(row_limit);
            }
            (None, Some(row_limit)) => {
                parts.text("LIMIT ").node(row_limit);
            }
            (Some(offset), None) => {
                parts.text("OFFSET ").node(offset).text(" ROWS");
            }
            (None, None) => {}
        }
        parts
    }
}

/// Parenthesizes a branch that would not read back as the same tree. Set operations associate
/// to the left, so a nested set query on the left stays bare unless it carries its own ORDER BY
/// or LIMIT, or differs from the parent in precedence or ALL.
fn set_query_branch(parts: &mut Parts, branch: &Command, parent: &SetQuery, right: bool) {
    let parenthesize = match branch {
        Command::Query(query) => query.order_by.is_some() || query.limit.is_some(),
        Command::SetQuery(nested) => {
            right
                || nested.order_by.is_some()
                || nested.limit.is_some()
                || nested.op.precedence() != parent.op.precedence()
                || nested.all != parent.all
        }
        _ => false,
    };
    if parenthesize {
        parts.text("(").node(branch).text(")");
    } else {
        parts.node(branch);
    }
}

impl Render for SetQuery {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        set_query_branch(&mut parts, &self.left, self, false);
        parts.text(" ").text(self.op.keyword());
        if self.all {
            parts.text(" ALL");
        }
        parts.text(" ");
        set_query_branch(&mut parts, &self.right, self, true);
        if let Some(order_by) = &self.order_by {
            parts.text(" ").node(order_by);
        }
        if let Some(limit) = &self.limit {
            parts.text(" ").node(limit);
        }
        parts
    }
}

impl Render for Insert {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        parts.text("INSERT INTO ").node(&self.group);
        if !self.variables.is_empty() {
            parts.text(" (").list(&self.variables, ", ").text(")");
        }
        match &self.query {
            Some(query) => {
                parts.text(" ").node(query);
            }
            None => {
                parts.text(" VALUES (").list(&self.values, ", ").text(")");
            }
        }
        parts
    }
}

impl Render for SetClause {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        parts.node(&self.symbol).text(" = ").node(&self.value);
        parts
    }
}

impl Render for Update {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        parts
            .text("UPDATE ")
            .node(&self.group)
            .text(" SET ")
            .list(&self.changes, ", ");
        if let Some(criteria) = &self.criteria {
            parts.text(" WHERE ").node(criteria);
        }
        parts
    }
}

impl Render for Delete {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        parts.text("DELETE FROM ").node(&self.group);
        if let Some(criteria) = &self.criteria {
            parts.text(" WHERE ").node(criteria);
        }
        parts
    }
}

impl Render for SpParameter {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        if let Some(name) = &self.name {
            parts.ident(name).text(" => ");
        }
        match &self.expression {
            Some(expression) => parts.node(expression),
            None => parts.text("null"),
        };
        parts
    }
}

impl Render for StoredProcedure {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        if let Some(target) = &self.return_target {
            parts.node(target).text(" = ");
        }
        let arguments = self
            .parameters
            .iter()
            .filter(|p| p.expression.is_some() && !p.uses_default && p.direction.is_input());
        parts.text("EXEC ").ident(&self.name).text("(");
        if self.named_parameters {
            parts.list(arguments, ", ");
        } else {
            let expressions: Vec<&Expression> =
                arguments.filter_map(|p| p.expression.as_ref()).collect();
            parts.list(expressions, ", ");
        }
        parts.text(")");
        parts
    }
}

impl Render for ElementSymbol {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        parts.ident(&self.name);
        parts
    }
}

impl Render for GroupSymbol {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        match &self.definition {
            Some(definition) => parts.ident(definition).text(" AS ").ident(&self.name),
            None => parts.ident(&self.name),
        };
        parts
    }
}

impl Render for DynamicCommand {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        parts.text("EXECUTE IMMEDIATE ").node(&self.sql);
        if !self.as_columns.is_empty() {
            parts.text(" AS ");
            for (i, column) in self.as_columns.iter().enumerate() {
                if i > 0 {
                    parts.text(", ");
                }
                parts.ident(column.short_name());
                if let Some(ty) = column.data_type() {
                    parts.text(" ").text(ty.name());
                }
            }
        }
        if let Some(into) = &self.into {
            parts.text(" INTO ").node(into);
        }
        if !self.using.is_empty() {
            parts.text(" USING ").list(&self.using, ", ");
        }
        if self.update_count != 0 {
            parts.text(format!(" UPDATE {}", self.update_count));
        }
        parts
    }
}

impl Render for ColumnDefinition {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        parts.ident(&self.name).text(" ").text(self.data_type.name());
        if !self.nullable {
            parts.text(" NOT NULL");
        }
        if self.auto_increment {
            parts.text(" AUTO_INCREMENT");
        }
        parts
    }
}

impl Render for CreateTempTable {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        parts
            .text("CREATE LOCAL TEMPORARY TABLE ")
            .node(&self.table)
            .text(" (")
            .list(&self.columns, ", ");
        if !self.primary_key.is_empty() {
            let key = self.primary_key.iter().map(|c| quote_identifier(c)).join(", ");
            parts.text(format!(", PRIMARY KEY({key})"));
        }
        parts.text(")");
        parts
    }
}

impl Render for DropTempTable {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        parts.text("DROP TABLE ").node(&self.table);
        parts
    }
}

impl Render for CreateProcedureCommand {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        match &self.kind {
            ProcedureKind::Stored { .. } => parts.text("CREATE VIRTUAL PROCEDURE\n"),
            ProcedureKind::Update { .. } => parts.text("CREATE PROCEDURE\n"),
        };
        parts.node(&self.block);
        parts
    }
}

impl Render for TriggerAction {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        parts.text("FOR EACH ROW\n").node(&self.block);
        parts
    }
}

impl Render for Block {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        if let Some(label) = &self.label {
            parts.ident(label).text(" : ");
        }
        parts.text("BEGIN");
        if self.atomic {
            parts.text(" ATOMIC");
        }
        for statement in &self.statements {
            parts.text("\n").node(statement);
        }
        if let Some(group) = &self.exception_group {
            parts.text("\nEXCEPTION ").ident(group);
            for statement in &self.exception_statements {
                parts.text("\n").node(statement);
            }
        }
        parts.text("\nEND");
        parts
    }
}

fn label_prefix(parts: &mut Parts, label: Option<&crate::Ident>) {
    if let Some(label) = label {
        parts.ident(label).text(" : ");
    }
}

impl Render for Statement {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        match self {
            Statement::Declare(declare) => {
                parts
                    .text("DECLARE ")
                    .text(declare.data_type.name())
                    .text(" ")
                    .node(&declare.variable);
                if let Some(value) = &declare.value {
                    parts.text(" = ").node(value);
                }
                parts.text(";");
            }
            Statement::Assignment(assignment) => {
                parts
                    .node(&assignment.variable)
                    .text(" = ")
                    .node(&assignment.value)
                    .text(";");
            }
            Statement::Command(statement) => {
                parts.node(&statement.command).text(";");
            }
            Statement::If(statement) => {
                parts
                    .text("IF(")
                    .node(&statement.condition)
                    .text(")\n")
                    .node(&statement.then_block);
                if let Some(else_block) = &statement.else_block {
                    parts.text("\nELSE\n").node(else_block);
                }
            }
            Statement::Loop(statement) => {
                label_prefix(&mut parts, statement.label.as_ref());
                parts
                    .text("LOOP ON (")
                    .node(&statement.command)
                    .text(") AS ")
                    .ident(&statement.cursor)
                    .text("\n")
                    .node(&statement.block);
            }
            Statement::While(statement) => {
                label_prefix(&mut parts, statement.label.as_ref());
                parts
                    .text("WHILE(")
                    .node(&statement.condition)
                    .text(")\n")
                    .node(&statement.block);
            }
            Statement::Block(block) => {
                parts.node(block);
            }
            Statement::Raise(statement) => {
                parts.text("RAISE ");
                if statement.warning {
                    parts.text("SQLWARNING ");
                }
                parts.node(&statement.expression).text(";");
            }
            Statement::Return(statement) => {
                parts.text("RETURN");
                if let Some(expression) = &statement.expression {
                    parts.text(" ").node(expression);
                }
                parts.text(";");
            }
            Statement::Branch(statement) => {
                parts.text(statement.kind.keyword());
                if let Some(label) = &statement.label {
                    parts.text(" ").ident(label);
                }
                parts.text(";");
            }
        }
        parts
    }
}

impl Render for Constant {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        if self.multi_valued {
            parts.text("?");
            return parts;
        }
        if self.value.is_null() {
            parts.text("null");
            return parts;
        }
        let text = match &self.value {
            ScalarValue::String(Some(s)) => quote_string(s),
            ScalarValue::Char(Some(c)) => quote_string(&c.to_string()),
            ScalarValue::Boolean(Some(b)) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            ScalarValue::Date(Some(d)) => format!("{{d{}}}", quote_string(d)),
            ScalarValue::Time(Some(t)) => format!("{{t{}}}", quote_string(t)),
            ScalarValue::Timestamp(Some(ts)) => format!("{{ts{}}}", quote_string(ts)),
            other => other.to_string(),
        };
        parts.text(text);
        parts
    }
}

impl Render for Function {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        let name = self.name.as_str();
        match self.args.as_slice() {
            [left, right] if INFIX_OPERATORS.contains(&name) => {
                parts
                    .text("(")
                    .node(left)
                    .text(format!(" {name} "))
                    .node(right)
                    .text(")");
            }
            [value, Expression::Constant(target)]
                if name.eq_ignore_ascii_case(CONVERT_FUNCTION)
                    || name.eq_ignore_ascii_case(CAST_FUNCTION) =>
            {
                let type_name = match &target.value {
                    ScalarValue::String(Some(s)) => s.clone(),
                    other => other.to_string(),
                };
                if name.eq_ignore_ascii_case(CAST_FUNCTION) {
                    parts.text("cast(").node(value).text(format!(" AS {type_name})"));
                } else {
                    parts.text("convert(").node(value).text(format!(", {type_name})"));
                }
            }
            args => {
                parts.text(self.name.to_string()).text("(").list(args, ", ").text(")");
            }
        }
        parts
    }
}

impl Render for Expression {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        match self {
            Expression::Element(element) => {
                parts.node(element);
            }
            Expression::Constant(constant) => {
                parts.node(constant);
            }
            Expression::Function(function) => {
                parts.node(function);
            }
            Expression::Aggregate(aggregate) => {
                parts.text(aggregate.function.name()).text("(");
                if aggregate.distinct {
                    parts.text("DISTINCT ");
                }
                match &aggregate.arg {
                    Some(arg) => parts.node(arg),
                    None => parts.text("*"),
                };
                parts.text(")");
            }
            Expression::Case(case) => {
                parts.text("CASE ").node(&case.operand);
                for (when, then) in case.whens.iter().zip(&case.thens) {
                    parts.text(" WHEN ").node(when).text(" THEN ").node(then);
                }
                if let Some(else_expression) = &case.else_expression {
                    parts.text(" ELSE ").node(else_expression);
                }
                parts.text(" END");
            }
            Expression::SearchedCase(case) => {
                parts.text("CASE");
                for (when, then) in case.whens.iter().zip(&case.thens) {
                    parts.text(" WHEN ").node(when).text(" THEN ").node(then);
                }
                if let Some(else_expression) = &case.else_expression {
                    parts.text(" ELSE ").node(else_expression);
                }
                parts.text(" END");
            }
            Expression::Reference(reference) => match &reference.kind {
                ReferenceKind::Positional(_) => {
                    parts.text("?");
                }
                ReferenceKind::Named(element) => {
                    parts.node(element);
                }
            },
            Expression::ScalarSubquery(subquery) => {
                parts.text("(").node(&subquery.command).text(")");
            }
            Expression::ExpressionSymbol(symbol) => {
                parts.node(&symbol.expression);
            }
            Expression::Alias(alias) => {
                parts.node(&alias.symbol).text(" AS ").ident(&alias.name);
            }
            Expression::Wildcard(wildcard) => {
                if let Some(group) = &wildcard.group {
                    parts.ident(group).text(".");
                }
                parts.text("*");
            }
        }
        parts
    }
}

impl Render for CompareCriteria {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        parts
            .node(&self.left)
            .text(" ")
            .text(self.op.symbol())
            .text(" ")
            .node(&self.right);
        parts
    }
}

impl Render for CriteriaSelector {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        match self.kind {
            SelectorKind::Any => {}
            SelectorKind::Compare(op) => {
                parts.text(op.symbol()).text(" ");
            }
            SelectorKind::Like => {
                parts.text("LIKE ");
            }
            SelectorKind::In => {
                parts.text("IN ");
            }
            SelectorKind::IsNull => {
                parts.text("IS NULL ");
            }
            SelectorKind::Between => {
                parts.text("BETWEEN ");
            }
        }
        parts.text("CRITERIA");
        if !self.elements.is_empty() {
            parts.text(" ON (").list(&self.elements, ", ").text(")");
        }
        parts
    }
}

fn not_keyword(negated: bool) -> &'static str {
    if negated { "NOT " } else { "" }
}

impl Render for Criteria {
    fn to_parts(&self) -> Parts {
        let mut parts = Parts::new();
        match self {
            Criteria::Compare(compare) => {
                parts.node(compare);
            }
            Criteria::Between(between) => {
                parts
                    .node(&between.expression)
                    .text(" ")
                    .text(not_keyword(between.negated))
                    .text("BETWEEN ")
                    .node(&between.lower)
                    .text(" AND ")
                    .node(&between.upper);
            }
            Criteria::IsNull(is_null) => {
                parts
                    .node(&is_null.expression)
                    .text(" IS ")
                    .text(not_keyword(is_null.negated))
                    .text("NULL");
            }
            Criteria::Match(matching) => {
                let keyword = match matching.mode {
                    MatchMode::Like => "LIKE ",
                    MatchMode::SimilarTo => "SIMILAR TO ",
                    MatchMode::Regex => "LIKE_REGEX ",
                };
                parts
                    .node(&matching.left)
                    .text(" ")
                    .text(not_keyword(matching.negated))
                    .text(keyword)
                    .node(&matching.right);
                if let Some(escape) = matching.escape {
                    parts.text(" ESCAPE ").text(quote_string(&escape.to_string()));
                }
            }
            Criteria::Set(set) => {
                parts
                    .node(&set.expression)
                    .text(" ")
                    .text(not_keyword(set.negated))
                    .text("IN (")
                    .list(&set.values, ", ")
                    .text(")");
            }
            Criteria::SubquerySet(set) => {
                parts
                    .node(&set.expression)
                    .text(" ")
                    .text(not_keyword(set.negated))
                    .text("IN (")
                    .node(&set.command)
                    .text(")");
            }
            Criteria::Compound(compound) => {
                let separator = match compound.op {
                    LogicalOp::And => " AND ",
                    LogicalOp::Or => " OR ",
                };
                for (i, criteria) in compound.criteria.iter().enumerate() {
                    if i > 0 {
                        parts.text(separator);
                    }
                    if matches!(criteria, Criteria::Compound(_)) {
                        parts.text("(").node(criteria).text(")");
                    } else {
                        parts.node(criteria);
                    }
                }
            }
            Criteria::Not(not) => {
                parts.text("NOT (").node(&not.criteria).text(")");
            }
            Criteria::Exists(exists) => {
                parts
                    .text(not_keyword(exists.negated))
                    .text("EXISTS (")
                    .node(&exists.command)
                    .text(")");
            }
            Criteria::SubqueryCompare(compare) => {
                let quantifier = match compare.quantifier {
                    crate::criteria::Quantifier::Some => "SOME",
                    crate::criteria::Quantifier::Any => "ANY",
                    crate::criteria::Quantifier::All => "ALL",
                };
                parts
                    .node(&compare.left)
                    .text(format!(" {} {quantifier} (", compare.op.symbol()))
                    .node(&compare.command)
                    .text(")");
            }
            Criteria::Has(has) => {
                parts.text("HAS ").node(&has.selector);
            }
            Criteria::Translate(translate) => {
                parts.text("TRANSLATE ").node(&translate.selector);
                if !translate.translations.is_empty() {
                    parts
                        .text(" WITH (")
                        .list(&translate.translations, ", ")
                        .text(")");
                }
            }
        }
        parts
    }
}

macro_rules! impl_display_via_render {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.to_parts())
                }
            }
        )*
    };
}

impl_display_via_render!(
    Command,
    Expression,
    Criteria,
    Statement,
    Block,
    GroupSymbol,
    ElementSymbol,
);
