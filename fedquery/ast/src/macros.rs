use macro_rules_attribute::attribute_alias;

attribute_alias! {
    #[apply(base)] =
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)];

    #[apply(ext)] =
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)];
}


/// Generates a visitor trait, the navigator driving it and the walk entry points, over shared
/// (`make_visitor!(Visitor, Navigator, Visit)`) or mutable
/// (`make_visitor!(VisitorMut, NavigatorMut, VisitMut, mut)`) references.
macro_rules! make_visitor {
    ($visitor:ident, $navigator:ident, $walk:ident $(, $m:ident)?) => {
        use $crate::command::{
            Command, CreateTempTable, Delete, DropTempTable, DynamicCommand, FromClause, FromList,
            GroupBy, Insert, IntoClause, JoinPredicate, Limit, OrderBy, OrderByItem, Query, Select,
            SetClause, SetQuery, SpParameter, StoredProcedure, SubqueryFromClause,
            UnaryFromClause, Update,
        };
        use $crate::criteria::{
            BetweenCriteria, CompareCriteria, CompoundCriteria, Criteria, CriteriaSelector,
            ExistsCriteria, HasCriteria, IsNullCriteria, MatchCriteria, NotCriteria,
            SetCriteria, SubqueryCompareCriteria, SubquerySetCriteria, TranslateCriteria,
        };
        use $crate::expression::{
            AggregateSymbol, AliasSymbol, CaseExpression, Constant, Expression, ExpressionSymbol,
            Function, MultipleElementSymbol, Reference, ReferenceKind, ScalarSubquery,
            SearchedCaseExpression,
        };
        use $crate::procedure::{
            AssignmentStatement, Block, BranchStatement, CommandStatement,
            CreateProcedureCommand, DeclareStatement, IfStatement, LoopStatement, ProcedureKind,
            RaiseStatement, ReturnStatement, Statement, TriggerAction, WhileStatement,
        };
        use $crate::symbol::{ElementSymbol, GroupSymbol};

        /// Callbacks invoked by the navigator, one per node kind. Every callback defaults to a
        /// no-op.
        #[allow(unused_variables)]
        pub trait $visitor {
            /// Polled after every callback; once it returns `true` the traversal stops.
            fn should_abort(&self) -> bool {
                false
            }

            fn visit_query(&mut self, node: &$($m)? Query) {}
            fn visit_select(&mut self, node: &$($m)? Select) {}
            fn visit_into_clause(&mut self, node: &$($m)? IntoClause) {}
            fn visit_from_list(&mut self, node: &$($m)? FromList) {}
            fn visit_unary_from_clause(&mut self, node: &$($m)? UnaryFromClause) {}
            fn visit_join_predicate(&mut self, node: &$($m)? JoinPredicate) {}
            fn visit_subquery_from_clause(&mut self, node: &$($m)? SubqueryFromClause) {}
            fn visit_group_by(&mut self, node: &$($m)? GroupBy) {}
            fn visit_order_by(&mut self, node: &$($m)? OrderBy) {}
            fn visit_order_by_item(&mut self, node: &$($m)? OrderByItem) {}
            fn visit_limit(&mut self, node: &$($m)? Limit) {}
            fn visit_set_query(&mut self, node: &$($m)? SetQuery) {}
            fn visit_insert(&mut self, node: &$($m)? Insert) {}
            fn visit_update(&mut self, node: &$($m)? Update) {}
            fn visit_set_clause(&mut self, node: &$($m)? SetClause) {}
            fn visit_delete(&mut self, node: &$($m)? Delete) {}
            fn visit_stored_procedure(&mut self, node: &$($m)? StoredProcedure) {}
            fn visit_sp_parameter(&mut self, node: &$($m)? SpParameter) {}
            fn visit_dynamic_command(&mut self, node: &$($m)? DynamicCommand) {}
            fn visit_create_temp_table(&mut self, node: &$($m)? CreateTempTable) {}
            fn visit_drop_temp_table(&mut self, node: &$($m)? DropTempTable) {}
            fn visit_create_procedure(&mut self, node: &$($m)? CreateProcedureCommand) {}
            fn visit_trigger_action(&mut self, node: &$($m)? TriggerAction) {}
            fn visit_block(&mut self, node: &$($m)? Block) {}
            fn visit_declare_statement(&mut self, node: &$($m)? DeclareStatement) {}
            fn visit_assignment_statement(&mut self, node: &$($m)? AssignmentStatement) {}
            fn visit_command_statement(&mut self, node: &$($m)? CommandStatement) {}
            fn visit_if_statement(&mut self, node: &$($m)? IfStatement) {}
            fn visit_loop_statement(&mut self, node: &$($m)? LoopStatement) {}
            fn visit_while_statement(&mut self, node: &$($m)? WhileStatement) {}
            fn visit_raise_statement(&mut self, node: &$($m)? RaiseStatement) {}
            fn visit_return_statement(&mut self, node: &$($m)? ReturnStatement) {}
            fn visit_branch_statement(&mut self, node: &$($m)? BranchStatement) {}
            fn visit_group_symbol(&mut self, node: &$($m)? GroupSymbol) {}
            fn visit_element_symbol(&mut self, node: &$($m)? ElementSymbol) {}
            fn visit_constant(&mut self, node: &$($m)? Constant) {}
            fn visit_function(&mut self, node: &$($m)? Function) {}
            fn visit_aggregate_symbol(&mut self, node: &$($m)? AggregateSymbol) {}
            fn visit_case_expression(&mut self, node: &$($m)? CaseExpression) {}
            fn visit_searched_case_expression(&mut self, node: &$($m)? SearchedCaseExpression) {}
            fn visit_reference(&mut self, node: &$($m)? Reference) {}
            fn visit_scalar_subquery(&mut self, node: &$($m)? ScalarSubquery) {}
            fn visit_expression_symbol(&mut self, node: &$($m)? ExpressionSymbol) {}
            fn visit_alias_symbol(&mut self, node: &$($m)? AliasSymbol) {}
            fn visit_multiple_element_symbol(&mut self, node: &$($m)? MultipleElementSymbol) {}
            fn visit_compare_criteria(&mut self, node: &$($m)? CompareCriteria) {}
            fn visit_between_criteria(&mut self, node: &$($m)? BetweenCriteria) {}
            fn visit_is_null_criteria(&mut self, node: &$($m)? IsNullCriteria) {}
            fn visit_match_criteria(&mut self, node: &$($m)? MatchCriteria) {}
            fn visit_set_criteria(&mut self, node: &$($m)? SetCriteria) {}
            fn visit_subquery_set_criteria(&mut self, node: &$($m)? SubquerySetCriteria) {}
            fn visit_compound_criteria(&mut self, node: &$($m)? CompoundCriteria) {}
            fn visit_not_criteria(&mut self, node: &$($m)? NotCriteria) {}
            fn visit_exists_criteria(&mut self, node: &$($m)? ExistsCriteria) {}
            fn visit_subquery_compare_criteria(&mut self, node: &$($m)? SubqueryCompareCriteria) {}
            fn visit_has_criteria(&mut self, node: &$($m)? HasCriteria) {}
            fn visit_translate_criteria(&mut self, node: &$($m)? TranslateCriteria) {}
            fn visit_criteria_selector(&mut self, node: &$($m)? CriteriaSelector) {}
        }

        /// Drives a visitor over a tree in pre- or post-order.
        ///
        /// A shallow navigator treats nested commands (subqueries, derived tables, procedure
        /// statements' commands) as leaves; a deep one descends into them.
        pub struct $navigator<'v, V: ?Sized> {
            visitor: &'v mut V,
            order: $crate::visit::Order,
            deep: bool,
        }

        impl<'v, V: $visitor + ?Sized> $navigator<'v, V> {
            pub fn new(visitor: &'v mut V, order: $crate::visit::Order, deep: bool) -> Self {
                Self {
                    visitor,
                    order,
                    deep,
                }
            }

            #[inline]
            fn aborted(&self) -> bool {
                self.visitor.should_abort()
            }

            #[inline]
            fn pre(&self) -> bool {
                self.order == $crate::visit::Order::Pre && !self.aborted()
            }

            #[inline]
            fn post(&self) -> bool {
                self.order == $crate::visit::Order::Post && !self.aborted()
            }

            fn sub_command(&mut self, node: &$($m)? Command) {
                if self.deep {
                    self.command(node);
                }
            }

            pub fn command(&mut self, node: &$($m)? Command) {
                match node {
                    Command::Query(query) => self.query(query),
                    Command::SetQuery(set_query) => self.set_query(set_query),
                    Command::Insert(insert) => self.insert(insert),
                    Command::Update(update) => self.update(update),
                    Command::Delete(delete) => self.delete(delete),
                    Command::StoredProcedure(sp) => self.stored_procedure(sp),
                    Command::Dynamic(dynamic) => self.dynamic_command(dynamic),
                    Command::Create(create) => self.create_temp_table(create),
                    Command::Drop(drop) => self.drop_temp_table(drop),
                    Command::Procedure(procedure) => self.create_procedure(procedure),
                    Command::TriggerAction(action) => self.trigger_action(action),
                }
            }

            pub fn query(&mut self, node: &$($m)? Query) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_query(node);
                }
                self.select(&$($m)? node.select);
                if let Some(into) = &$($m)? node.into {
                    self.into_clause(into);
                }
                if let Some(from) = &$($m)? node.from {
                    self.from_list(from);
                }
                if let Some(criteria) = &$($m)? node.criteria {
                    self.criteria(criteria);
                }
                if let Some(group_by) = &$($m)? node.group_by {
                    self.group_by(group_by);
                }
                if let Some(having) = &$($m)? node.having {
                    self.criteria(having);
                }
                if let Some(order_by) = &$($m)? node.order_by {
                    self.order_by(order_by);
                }
                if let Some(limit) = &$($m)? node.limit {
                    self.limit(limit);
                }
                if self.post() {
                    self.visitor.visit_query(node);
                }
            }

            pub fn select(&mut self, node: &$($m)? Select) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_select(node);
                }
                for symbol in &$($m)? node.symbols {
                    self.expression(symbol);
                }
                if self.post() {
                    self.visitor.visit_select(node);
                }
            }

            pub fn into_clause(&mut self, node: &$($m)? IntoClause) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_into_clause(node);
                }
                self.group_symbol(&$($m)? node.group);
                if self.post() {
                    self.visitor.visit_into_clause(node);
                }
            }

            pub fn from_list(&mut self, node: &$($m)? FromList) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_from_list(node);
                }
                for clause in &$($m)? node.clauses {
                    self.from_clause(clause);
                }
                if self.post() {
                    self.visitor.visit_from_list(node);
                }
            }

            pub fn from_clause(&mut self, node: &$($m)? FromClause) {
                match node {
                    FromClause::Unary(unary) => self.unary_from_clause(unary),
                    FromClause::Join(join) => self.join_predicate(join),
                    FromClause::Subquery(subquery) => self.subquery_from_clause(subquery),
                }
            }

            pub fn unary_from_clause(&mut self, node: &$($m)? UnaryFromClause) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_unary_from_clause(node);
                }
                self.group_symbol(&$($m)? node.group);
                if self.post() {
                    self.visitor.visit_unary_from_clause(node);
                }
            }

            pub fn join_predicate(&mut self, node: &$($m)? JoinPredicate) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_join_predicate(node);
                }
                self.from_clause(&$($m)? node.left);
                self.from_clause(&$($m)? node.right);
                for criteria in &$($m)? node.criteria {
                    self.criteria(criteria);
                }
                if self.post() {
                    self.visitor.visit_join_predicate(node);
                }
            }

            pub fn subquery_from_clause(&mut self, node: &$($m)? SubqueryFromClause) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_subquery_from_clause(node);
                }
                self.sub_command(&$($m)? node.command);
                self.group_symbol(&$($m)? node.group);
                if self.post() {
                    self.visitor.visit_subquery_from_clause(node);
                }
            }

            pub fn group_by(&mut self, node: &$($m)? GroupBy) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_group_by(node);
                }
                for symbol in &$($m)? node.symbols {
                    self.expression(symbol);
                }
                if self.post() {
                    self.visitor.visit_group_by(node);
                }
            }

            pub fn order_by(&mut self, node: &$($m)? OrderBy) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_order_by(node);
                }
                for item in &$($m)? node.items {
                    self.order_by_item(item);
                }
                if self.post() {
                    self.visitor.visit_order_by(node);
                }
            }

            pub fn order_by_item(&mut self, node: &$($m)? OrderByItem) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_order_by_item(node);
                }
                self.expression(&$($m)? node.expression);
                if self.post() {
                    self.visitor.visit_order_by_item(node);
                }
            }

            pub fn limit(&mut self, node: &$($m)? Limit) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_limit(node);
                }
                if let Some(offset) = &$($m)? node.offset {
                    self.expression(offset);
                }
                if let Some(row_limit) = &$($m)? node.row_limit {
                    self.expression(row_limit);
                }
                if self.post() {
                    self.visitor.visit_limit(node);
                }
            }

            pub fn set_query(&mut self, node: &$($m)? SetQuery) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_set_query(node);
                }
                self.command(&$($m)? node.left);
                self.command(&$($m)? node.right);
                if let Some(order_by) = &$($m)? node.order_by {
                    self.order_by(order_by);
                }
                if let Some(limit) = &$($m)? node.limit {
                    self.limit(limit);
                }
                if self.post() {
                    self.visitor.visit_set_query(node);
                }
            }

            pub fn insert(&mut self, node: &$($m)? Insert) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_insert(node);
                }
                self.group_symbol(&$($m)? node.group);
                for variable in &$($m)? node.variables {
                    self.element_symbol(variable);
                }
                for value in &$($m)? node.values {
                    self.expression(value);
                }
                if let Some(query) = &$($m)? node.query {
                    self.sub_command(query);
                }
                if self.post() {
                    self.visitor.visit_insert(node);
                }
            }

            pub fn update(&mut self, node: &$($m)? Update) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_update(node);
                }
                self.group_symbol(&$($m)? node.group);
                for change in &$($m)? node.changes {
                    self.set_clause(change);
                }
                if let Some(criteria) = &$($m)? node.criteria {
                    self.criteria(criteria);
                }
                if self.post() {
                    self.visitor.visit_update(node);
                }
            }

            pub fn set_clause(&mut self, node: &$($m)? SetClause) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_set_clause(node);
                }
                self.element_symbol(&$($m)? node.symbol);
                self.expression(&$($m)? node.value);
                if self.post() {
                    self.visitor.visit_set_clause(node);
                }
            }

            pub fn delete(&mut self, node: &$($m)? Delete) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_delete(node);
                }
                self.group_symbol(&$($m)? node.group);
                if let Some(criteria) = &$($m)? node.criteria {
                    self.criteria(criteria);
                }
                if self.post() {
                    self.visitor.visit_delete(node);
                }
            }

            pub fn stored_procedure(&mut self, node: &$($m)? StoredProcedure) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_stored_procedure(node);
                }
                for parameter in &$($m)? node.parameters {
                    self.sp_parameter(parameter);
                }
                if let Some(target) = &$($m)? node.return_target {
                    self.element_symbol(target);
                }
                if self.post() {
                    self.visitor.visit_stored_procedure(node);
                }
            }

            pub fn sp_parameter(&mut self, node: &$($m)? SpParameter) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_sp_parameter(node);
                }
                if let Some(expression) = &$($m)? node.expression {
                    self.expression(expression);
                }
                if self.post() {
                    self.visitor.visit_sp_parameter(node);
                }
            }

            pub fn dynamic_command(&mut self, node: &$($m)? DynamicCommand) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_dynamic_command(node);
                }
                self.expression(&$($m)? node.sql);
                for column in &$($m)? node.as_columns {
                    self.element_symbol(column);
                }
                if let Some(into) = &$($m)? node.into {
                    self.group_symbol(into);
                }
                for binding in &$($m)? node.using {
                    self.set_clause(binding);
                }
                if self.post() {
                    self.visitor.visit_dynamic_command(node);
                }
            }

            pub fn create_temp_table(&mut self, node: &$($m)? CreateTempTable) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_create_temp_table(node);
                }
                self.group_symbol(&$($m)? node.table);
                if self.post() {
                    self.visitor.visit_create_temp_table(node);
                }
            }

            pub fn drop_temp_table(&mut self, node: &$($m)? DropTempTable) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_drop_temp_table(node);
                }
                self.group_symbol(&$($m)? node.table);
                if self.post() {
                    self.visitor.visit_drop_temp_table(node);
                }
            }

            pub fn create_procedure(&mut self, node: &$($m)? CreateProcedureCommand) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_create_procedure(node);
                }
                if let ProcedureKind::Update { virtual_group, .. } = &$($m)? node.kind {
                    self.group_symbol(virtual_group);
                }
                self.block(&$($m)? node.block);
                if self.post() {
                    self.visitor.visit_create_procedure(node);
                }
            }

            pub fn trigger_action(&mut self, node: &$($m)? TriggerAction) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_trigger_action(node);
                }
                self.group_symbol(&$($m)? node.view);
                self.block(&$($m)? node.block);
                if self.post() {
                    self.visitor.visit_trigger_action(node);
                }
            }

            pub fn block(&mut self, node: &$($m)? Block) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_block(node);
                }
                for statement in &$($m)? node.statements {
                    self.statement(statement);
                }
                for statement in &$($m)? node.exception_statements {
                    self.statement(statement);
                }
                if self.post() {
                    self.visitor.visit_block(node);
                }
            }

            pub fn statement(&mut self, node: &$($m)? Statement) {
                if self.aborted() {
                    return;
                }
                match node {
                    Statement::Declare(declare) => {
                        if self.pre() {
                            self.visitor.visit_declare_statement(declare);
                        }
                        self.element_symbol(&$($m)? declare.variable);
                        if let Some(value) = &$($m)? declare.value {
                            self.expression(value);
                        }
                        if self.post() {
                            self.visitor.visit_declare_statement(declare);
                        }
                    }
                    Statement::Assignment(assignment) => {
                        if self.pre() {
                            self.visitor.visit_assignment_statement(assignment);
                        }
                        self.element_symbol(&$($m)? assignment.variable);
                        self.expression(&$($m)? assignment.value);
                        if self.post() {
                            self.visitor.visit_assignment_statement(assignment);
                        }
                    }
                    Statement::Command(statement) => {
                        if self.pre() {
                            self.visitor.visit_command_statement(statement);
                        }
                        self.sub_command(&$($m)? statement.command);
                        if self.post() {
                            self.visitor.visit_command_statement(statement);
                        }
                    }
                    Statement::If(statement) => {
                        if self.pre() {
                            self.visitor.visit_if_statement(statement);
                        }
                        self.criteria(&$($m)? statement.condition);
                        self.block(&$($m)? statement.then_block);
                        if let Some(else_block) = &$($m)? statement.else_block {
                            self.block(else_block);
                        }
                        if self.post() {
                            self.visitor.visit_if_statement(statement);
                        }
                    }
                    Statement::Loop(statement) => {
                        if self.pre() {
                            self.visitor.visit_loop_statement(statement);
                        }
                        self.sub_command(&$($m)? statement.command);
                        self.block(&$($m)? statement.block);
                        if self.post() {
                            self.visitor.visit_loop_statement(statement);
                        }
                    }
                    Statement::While(statement) => {
                        if self.pre() {
                            self.visitor.visit_while_statement(statement);
                        }
                        self.criteria(&$($m)? statement.condition);
                        self.block(&$($m)? statement.block);
                        if self.post() {
                            self.visitor.visit_while_statement(statement);
                        }
                    }
                    Statement::Block(block) => self.block(block),
                    Statement::Raise(statement) => {
                        if self.pre() {
                            self.visitor.visit_raise_statement(statement);
                        }
                        self.expression(&$($m)? statement.expression);
                        if self.post() {
                            self.visitor.visit_raise_statement(statement);
                        }
                    }
                    Statement::Return(statement) => {
                        if self.pre() {
                            self.visitor.visit_return_statement(statement);
                        }
                        if let Some(expression) = &$($m)? statement.expression {
                            self.expression(expression);
                        }
                        if self.post() {
                            self.visitor.visit_return_statement(statement);
                        }
                    }
                    Statement::Branch(statement) => {
                        if !self.aborted() {
                            self.visitor.visit_branch_statement(statement);
                        }
                    }
                }
            }

            pub fn group_symbol(&mut self, node: &$($m)? GroupSymbol) {
                if !self.aborted() {
                    self.visitor.visit_group_symbol(node);
                }
            }

            pub fn element_symbol(&mut self, node: &$($m)? ElementSymbol) {
                if !self.aborted() {
                    self.visitor.visit_element_symbol(node);
                }
            }

            pub fn expression(&mut self, node: &$($m)? Expression) {
                if self.aborted() {
                    return;
                }
                match node {
                    Expression::Element(element) => self.element_symbol(element),
                    Expression::Constant(constant) => self.visitor.visit_constant(constant),
                    Expression::Function(function) => {
                        if self.pre() {
                            self.visitor.visit_function(function);
                        }
                        for arg in &$($m)? function.args {
                            self.expression(arg);
                        }
                        if self.post() {
                            self.visitor.visit_function(function);
                        }
                    }
                    Expression::Aggregate(aggregate) => {
                        if self.pre() {
                            self.visitor.visit_aggregate_symbol(aggregate);
                        }
                        if let Some(arg) = &$($m)? aggregate.arg {
                            self.expression(arg);
                        }
                        if self.post() {
                            self.visitor.visit_aggregate_symbol(aggregate);
                        }
                    }
                    Expression::Case(case) => {
                        if self.pre() {
                            self.visitor.visit_case_expression(case);
                        }
                        self.expression(&$($m)? case.operand);
                        for when in &$($m)? case.whens {
                            self.expression(when);
                        }
                        for then in &$($m)? case.thens {
                            self.expression(then);
                        }
                        if let Some(else_expression) = &$($m)? case.else_expression {
                            self.expression(else_expression);
                        }
                        if self.post() {
                            self.visitor.visit_case_expression(case);
                        }
                    }
                    Expression::SearchedCase(case) => {
                        if self.pre() {
                            self.visitor.visit_searched_case_expression(case);
                        }
                        for when in &$($m)? case.whens {
                            self.criteria(when);
                        }
                        for then in &$($m)? case.thens {
                            self.expression(then);
                        }
                        if let Some(else_expression) = &$($m)? case.else_expression {
                            self.expression(else_expression);
                        }
                        if self.post() {
                            self.visitor.visit_searched_case_expression(case);
                        }
                    }
                    Expression::Reference(reference) => {
                        if self.pre() {
                            self.visitor.visit_reference(reference);
                        }
                        if let ReferenceKind::Named(element) = &$($m)? reference.kind {
                            self.element_symbol(element);
                        }
                        if self.post() {
                            self.visitor.visit_reference(reference);
                        }
                    }
                    Expression::ScalarSubquery(subquery) => {
                        if self.pre() {
                            self.visitor.visit_scalar_subquery(subquery);
                        }
                        self.sub_command(&$($m)? subquery.command);
                        if self.post() {
                            self.visitor.visit_scalar_subquery(subquery);
                        }
                    }
                    Expression::ExpressionSymbol(symbol) => {
                        if self.pre() {
                            self.visitor.visit_expression_symbol(symbol);
                        }
                        self.expression(&$($m)? symbol.expression);
                        if self.post() {
                            self.visitor.visit_expression_symbol(symbol);
                        }
                    }
                    Expression::Alias(alias) => {
                        if self.pre() {
                            self.visitor.visit_alias_symbol(alias);
                        }
                        self.expression(&$($m)? alias.symbol);
                        if self.post() {
                            self.visitor.visit_alias_symbol(alias);
                        }
                    }
                    Expression::Wildcard(wildcard) => {
                        self.visitor.visit_multiple_element_symbol(wildcard)
                    }
                }
            }

            pub fn criteria(&mut self, node: &$($m)? Criteria) {
                if self.aborted() {
                    return;
                }
                match node {
                    Criteria::Compare(compare) => self.compare_criteria(compare),
                    Criteria::Between(between) => {
                        if self.pre() {
                            self.visitor.visit_between_criteria(between);
                        }
                        self.expression(&$($m)? between.expression);
                        self.expression(&$($m)? between.lower);
                        self.expression(&$($m)? between.upper);
                        if self.post() {
                            self.visitor.visit_between_criteria(between);
                        }
                    }
                    Criteria::IsNull(is_null) => {
                        if self.pre() {
                            self.visitor.visit_is_null_criteria(is_null);
                        }
                        self.expression(&$($m)? is_null.expression);
                        if self.post() {
                            self.visitor.visit_is_null_criteria(is_null);
                        }
                    }
                    Criteria::Match(matching) => {
                        if self.pre() {
                            self.visitor.visit_match_criteria(matching);
                        }
                        self.expression(&$($m)? matching.left);
                        self.expression(&$($m)? matching.right);
                        if self.post() {
                            self.visitor.visit_match_criteria(matching);
                        }
                    }
                    Criteria::Set(set) => {
                        if self.pre() {
                            self.visitor.visit_set_criteria(set);
                        }
                        self.expression(&$($m)? set.expression);
                        for value in &$($m)? set.values {
                            self.expression(value);
                        }
                        if self.post() {
                            self.visitor.visit_set_criteria(set);
                        }
                    }
                    Criteria::SubquerySet(set) => {
                        if self.pre() {
                            self.visitor.visit_subquery_set_criteria(set);
                        }
                        self.expression(&$($m)? set.expression);
                        self.sub_command(&$($m)? set.command);
                        if self.post() {
                            self.visitor.visit_subquery_set_criteria(set);
                        }
                    }
                    Criteria::Compound(compound) => {
                        if self.pre() {
                            self.visitor.visit_compound_criteria(compound);
                        }
                        for criteria in &$($m)? compound.criteria {
                            self.criteria(criteria);
                        }
                        if self.post() {
                            self.visitor.visit_compound_criteria(compound);
                        }
                    }
                    Criteria::Not(not) => {
                        if self.pre() {
                            self.visitor.visit_not_criteria(not);
                        }
                        self.criteria(&$($m)? not.criteria);
                        if self.post() {
                            self.visitor.visit_not_criteria(not);
                        }
                    }
                    Criteria::Exists(exists) => {
                        if self.pre() {
                            self.visitor.visit_exists_criteria(exists);
                        }
                        self.sub_command(&$($m)? exists.command);
                        if self.post() {
                            self.visitor.visit_exists_criteria(exists);
                        }
                    }
                    Criteria::SubqueryCompare(compare) => {
                        if self.pre() {
                            self.visitor.visit_subquery_compare_criteria(compare);
                        }
                        self.expression(&$($m)? compare.left);
                        self.sub_command(&$($m)? compare.command);
                        if self.post() {
                            self.visitor.visit_subquery_compare_criteria(compare);
                        }
                    }
                    Criteria::Has(has) => {
                        if self.pre() {
                            self.visitor.visit_has_criteria(has);
                        }
                        self.criteria_selector(&$($m)? has.selector);
                        if self.post() {
                            self.visitor.visit_has_criteria(has);
                        }
                    }
                    Criteria::Translate(translate) => {
                        if self.pre() {
                            self.visitor.visit_translate_criteria(translate);
                        }
                        self.criteria_selector(&$($m)? translate.selector);
                        for translation in &$($m)? translate.translations {
                            self.compare_criteria(translation);
                        }
                        if self.post() {
                            self.visitor.visit_translate_criteria(translate);
                        }
                    }
                }
            }

            pub fn compare_criteria(&mut self, node: &$($m)? CompareCriteria) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_compare_criteria(node);
                }
                self.expression(&$($m)? node.left);
                self.expression(&$($m)? node.right);
                if self.post() {
                    self.visitor.visit_compare_criteria(node);
                }
            }

            pub fn criteria_selector(&mut self, node: &$($m)? CriteriaSelector) {
                if self.aborted() {
                    return;
                }
                if self.pre() {
                    self.visitor.visit_criteria_selector(node);
                }
                for element in &$($m)? node.elements {
                    self.element_symbol(element);
                }
                if self.post() {
                    self.visitor.visit_criteria_selector(node);
                }
            }
        }

        /// A node the navigator can start a traversal from.
        pub trait $walk {
            fn walk<V: $visitor + ?Sized>(&$($m)? self, navigator: &mut $navigator<'_, V>);
        }

        impl $walk for Command {
            fn walk<V: $visitor + ?Sized>(&$($m)? self, navigator: &mut $navigator<'_, V>) {
                navigator.command(self);
            }
        }

        impl $walk for Expression {
            fn walk<V: $visitor + ?Sized>(&$($m)? self, navigator: &mut $navigator<'_, V>) {
                navigator.expression(self);
            }
        }

        impl $walk for Criteria {
            fn walk<V: $visitor + ?Sized>(&$($m)? self, navigator: &mut $navigator<'_, V>) {
                navigator.criteria(self);
            }
        }

        impl $walk for Statement {
            fn walk<V: $visitor + ?Sized>(&$($m)? self, navigator: &mut $navigator<'_, V>) {
                navigator.statement(self);
            }
        }

        impl $walk for Block {
            fn walk<V: $visitor + ?Sized>(&$($m)? self, navigator: &mut $navigator<'_, V>) {
                navigator.block(self);
            }
        }

        pub fn pre_order<N, V>(node: &$($m)? N, visitor: &mut V)
        where
            N: $walk + ?Sized,
            V: $visitor + ?Sized,
        {
            node.walk(&mut $navigator::new(visitor, $crate::visit::Order::Pre, false));
        }

        pub fn post_order<N, V>(node: &$($m)? N, visitor: &mut V)
        where
            N: $walk + ?Sized,
            V: $visitor + ?Sized,
        {
            node.walk(&mut $navigator::new(visitor, $crate::visit::Order::Post, false));
        }

        pub fn deep_pre_order<N, V>(node: &$($m)? N, visitor: &mut V)
        where
            N: $walk + ?Sized,
            V: $visitor + ?Sized,
        {
            node.walk(&mut $navigator::new(visitor, $crate::visit::Order::Pre, true));
        }

        pub fn deep_post_order<N, V>(node: &$($m)? N, visitor: &mut V)
        where
            N: $walk + ?Sized,
            V: $visitor + ?Sized,
        {
            node.walk(&mut $navigator::new(visitor, $crate::visit::Order::Post, true));
        }
    };
}

pub(crate) use make_visitor;
