//! Descriptions of catalog groups, columns and procedures.

use fedquery_ast::command::ParameterDirection;
use fedquery_common::data_type::DataTypeName;
use fedquery_common::types::{GroupId, ProcedureId};
use fedquery_common::value::ScalarValue;
use serde::Serialize;
use smol_str::SmolStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GroupKind {
    /// A table of a source model.
    Physical,
    /// A view defined by a query over other groups.
    Virtual,
    /// A tree-shaped document queried by element paths.
    Document,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ColumnMetadata {
    pub name: SmolStr,
    pub data_type: DataTypeName,
    /// Whether `*` expands to the column.
    pub selectable: bool,
    pub updatable: bool,
    pub nullable: bool,
    pub auto_increment: bool,
    pub default: Option<ScalarValue>,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<SmolStr>, data_type: DataTypeName) -> Self {
        Self {
            name: name.into(),
            data_type,
            selectable: true,
            updatable: true,
            nullable: true,
            auto_increment: false,
            default: None,
        }
    }

    #[inline]
    pub fn not_selectable(mut self) -> Self {
        self.selectable = false;
        self
    }

    #[inline]
    pub fn read_only(mut self) -> Self {
        self.updatable = false;
        self
    }

    #[inline]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    #[inline]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    #[inline]
    pub fn with_default(mut self, value: ScalarValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Returns `true` if an insert may leave the column out.
    #[inline]
    pub fn is_insert_optional(&self) -> bool {
        self.nullable || self.auto_increment || self.default.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupMetadata {
    pub id: GroupId,
    /// Fully qualified name, e.g. `model.table`.
    pub name: SmolStr,
    pub kind: GroupKind,
    pub columns: Vec<ColumnMetadata>,
}

impl GroupMetadata {
    pub fn new(
        id: GroupId,
        name: impl Into<SmolStr>,
        kind: GroupKind,
        columns: Vec<ColumnMetadata>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            columns,
        }
    }

    /// Case-insensitive column lookup, returning the column's position.
    pub fn column(&self, name: &str) -> Option<(usize, &ColumnMetadata)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, column)| column.name.eq_ignore_ascii_case(name))
    }

    pub fn selectable_columns(&self) -> impl Iterator<Item = (usize, &ColumnMetadata)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, column)| column.selectable)
    }

    pub fn updatable_columns(&self) -> impl Iterator<Item = (usize, &ColumnMetadata)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, column)| column.updatable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcedureParameter {
    pub name: SmolStr,
    pub data_type: DataTypeName,
    pub direction: ParameterDirection,
    pub default: Option<ScalarValue>,
    pub nullable: bool,
}

impl ProcedureParameter {
    pub fn new(name: impl Into<SmolStr>, data_type: DataTypeName, direction: ParameterDirection) -> Self {
        Self {
            name: name.into(),
            data_type,
            direction,
            default: None,
            nullable: true,
        }
    }

    #[inline]
    pub fn input(name: impl Into<SmolStr>, data_type: DataTypeName) -> Self {
        Self::new(name, data_type, ParameterDirection::In)
    }

    #[inline]
    pub fn with_default(mut self, value: ScalarValue) -> Self {
        self.default = Some(value);
        self
    }

    #[inline]
    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Returns `true` if a call may omit the parameter.
    #[inline]
    pub fn is_optional(&self) -> bool {
        self.default.is_some() || self.nullable
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcedureMetadata {
    pub id: ProcedureId,
    pub name: SmolStr,
    pub parameters: Vec<ProcedureParameter>,
    pub result_columns: Vec<ColumnMetadata>,
    /// Defined by a procedural body rather than by a source.
    pub is_virtual: bool,
}

impl ProcedureMetadata {
    pub fn new(id: ProcedureId, name: impl Into<SmolStr>) -> Self {
        Self {
            id,
            name: name.into(),
            parameters: Vec::new(),
            result_columns: Vec::new(),
            is_virtual: false,
        }
    }

    pub fn with_parameter(mut self, parameter: ProcedureParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_result_column(mut self, column: ColumnMetadata) -> Self {
        self.result_columns.push(column);
        self
    }

    #[inline]
    pub fn virtual_procedure(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// Parameters appearing in a call's argument list, in declaration order.
    pub fn call_parameters(&self) -> impl Iterator<Item = &ProcedureParameter> {
        self.parameters
            .iter()
            .filter(|p| p.direction != ParameterDirection::ReturnValue)
    }

    pub fn return_parameter(&self) -> Option<&ProcedureParameter> {
        self.parameters
            .iter()
            .find(|p| p.direction == ParameterDirection::ReturnValue)
    }

    pub fn parameter(&self, name: &str) -> Option<(usize, &ProcedureParameter)> {
        self.parameters
            .iter()
            .enumerate()
            .find(|(_, p)| p.name.eq_ignore_ascii_case(name))
    }
}
