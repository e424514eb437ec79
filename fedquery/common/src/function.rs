use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::data_type::DataTypeName;

/// Where a function may be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PushDown {
    /// Evaluated by the engine or a source, whichever is cheaper.
    #[default]
    CanPushdown,
    /// Only a source can evaluate the function.
    MustPushdown,
    /// Only the engine can evaluate the function.
    CannotPushdown,
}

/// How stable a function's result is across invocations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum Determinism {
    #[default]
    Deterministic,
    /// Stable within one command execution.
    CommandDeterministic,
    Nondeterministic,
}

/// Signature and evaluation properties of a scalar function overload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub name: SmolStr,
    pub arg_types: Vec<DataTypeName>,
    pub return_type: DataTypeName,
    /// Further arguments of the last argument type may follow.
    pub var_args: bool,
    pub pushdown: PushDown,
    pub determinism: Determinism,
}

impl FunctionDescriptor {
    pub fn new(
        name: impl Into<SmolStr>,
        arg_types: impl IntoIterator<Item = DataTypeName>,
        return_type: DataTypeName,
    ) -> Self {
        Self {
            name: name.into(),
            arg_types: arg_types.into_iter().collect(),
            return_type,
            var_args: false,
            pushdown: PushDown::default(),
            determinism: Determinism::default(),
        }
    }

    #[inline]
    pub fn with_var_args(mut self) -> Self {
        self.var_args = true;
        self
    }

    #[inline]
    pub fn with_pushdown(mut self, pushdown: PushDown) -> Self {
        self.pushdown = pushdown;
        self
    }

    #[inline]
    pub fn with_determinism(mut self, determinism: Determinism) -> Self {
        self.determinism = determinism;
        self
    }

    /// Formal type of the argument at `index`, accounting for variable arity.
    pub fn arg_type(&self, index: usize) -> Option<DataTypeName> {
        match self.arg_types.get(index) {
            Some(ty) => Some(*ty),
            None if self.var_args => self.arg_types.last().copied(),
            None => None,
        }
    }

    /// Returns `true` if the descriptor accepts `count` arguments.
    #[inline]
    pub fn accepts_arity(&self, count: usize) -> bool {
        if self.var_args {
            count >= self.arg_types.len()
        } else {
            count == self.arg_types.len()
        }
    }
}
