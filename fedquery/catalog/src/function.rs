//! Scalar function overloads and signature binding.

use std::collections::HashMap;
use std::sync::LazyLock;

use fedquery_common::constants::{CAST_FUNCTION, CONVERT_FUNCTION};
use fedquery_common::data_type::{DataTypeName, implicit_conversion_cost};
use fedquery_common::function::{Determinism, FunctionDescriptor, PushDown};
use fedquery_common::types::name_key;
use itertools::Itertools;
use smol_str::SmolStr;
use thiserror::Error;

static BUILTIN: LazyLock<FunctionLibrary> = LazyLock::new(FunctionLibrary::new_builtin);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("function {0} does not exist")]
    NotFound(String),

    #[error("no overload of {name} accepts ({args})")]
    NoMatch { name: String, args: String },

    #[error("call {name}({args}) matches more than one overload")]
    Ambiguous { name: String, args: String },
}

/// The overload a call bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionMatch {
    pub descriptor: FunctionDescriptor,
    /// Per argument, the type it has to be converted to, or `None` if it already matches.
    pub conversions: Vec<Option<DataTypeName>>,
}

#[derive(Debug, Clone, Default)]
pub struct FunctionLibrary {
    overloads: HashMap<SmolStr, Vec<FunctionDescriptor>>,
}

impl FunctionLibrary {
    /// The shared library of builtin functions.
    #[inline]
    pub fn builtin() -> &'static FunctionLibrary {
        &BUILTIN
    }

    fn new_builtin() -> Self {
        use DataTypeName::*;

        let mut library = Self::default();
        for ty in [Integer, Long, Double, BigDecimal] {
            for op in ["+", "-", "*", "/"] {
                library.register(FunctionDescriptor::new(op, [ty, ty], ty));
            }
            library.register(FunctionDescriptor::new("abs", [ty], ty));
        }
        for name in ["||", "concat"] {
            library.register(FunctionDescriptor::new(name, [String, String], String));
        }
        library.register(FunctionDescriptor::new("upper", [String], String));
        library.register(FunctionDescriptor::new("lower", [String], String));
        library.register(FunctionDescriptor::new("length", [String], Integer));
        library.register(FunctionDescriptor::new("substring", [String, Integer], String));
        library.register(FunctionDescriptor::new(
            "substring",
            [String, Integer, Integer],
            String,
        ));
        for ty in [
            String, Boolean, Integer, Long, Double, BigDecimal, Date, Time, Timestamp, Object,
        ] {
            library.register(FunctionDescriptor::new("coalesce", [ty, ty], ty).with_var_args());
            library.register(FunctionDescriptor::new("nvl", [ty, ty], ty));
        }
        library.register(FunctionDescriptor::new(CONVERT_FUNCTION, [Object, String], Object));
        library.register(FunctionDescriptor::new(CAST_FUNCTION, [Object, String], Object));
        library.register(
            FunctionDescriptor::new("rand", [], Double)
                .with_determinism(Determinism::Nondeterministic),
        );
        library.register(
            FunctionDescriptor::new("rand", [Integer], Double)
                .with_determinism(Determinism::Nondeterministic),
        );
        library.register(
            FunctionDescriptor::new("now", [], Timestamp)
                .with_determinism(Determinism::CommandDeterministic),
        );
        library.register(
            FunctionDescriptor::new("uuid", [], String)
                .with_determinism(Determinism::Nondeterministic),
        );
        library.register(
            FunctionDescriptor::new("lookup", [String, String, String, Object], Object)
                .with_pushdown(PushDown::CannotPushdown),
        );
        library.register(
            FunctionDescriptor::new("source_hint", [String], String)
                .with_pushdown(PushDown::MustPushdown),
        );
        library
    }

    pub fn register(&mut self, descriptor: FunctionDescriptor) {
        self.overloads
            .entry(name_key(&descriptor.name))
            .or_default()
            .push(descriptor);
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.overloads.contains_key(&name_key(name))
    }

    /// Binds a call to the overload needing the cheapest implicit argument conversions.
    ///
    /// `None` stands for an argument whose type is not known yet; it matches any formal type.
    /// An exact match always wins; a tie between the cheapest candidates is ambiguous.
    pub fn lookup(
        &self,
        name: &str,
        arg_types: &[Option<DataTypeName>],
    ) -> Result<FunctionMatch, LookupError> {
        let Some(overloads) = self.overloads.get(&name_key(name)) else {
            return Err(LookupError::NotFound(name.to_string()));
        };
        let mut best: Vec<(u32, &FunctionDescriptor, Vec<Option<DataTypeName>>)> = Vec::new();
        for descriptor in overloads {
            let Some((cost, conversions)) = match_cost(descriptor, arg_types) else {
                continue;
            };
            match best.first().map(|(best_cost, ..)| *best_cost) {
                Some(best_cost) if cost > best_cost => {}
                Some(best_cost) if cost == best_cost => best.push((cost, descriptor, conversions)),
                _ => best = vec![(cost, descriptor, conversions)],
            }
        }
        let args = || {
            arg_types
                .iter()
                .map(|ty| ty.map_or("?", DataTypeName::name))
                .join(", ")
        };
        match best.len() {
            0 => Err(LookupError::NoMatch {
                name: name.to_string(),
                args: args(),
            }),
            1 => {
                let (_, descriptor, conversions) = best.remove(0);
                Ok(FunctionMatch {
                    descriptor: descriptor.clone(),
                    conversions,
                })
            }
            _ => Err(LookupError::Ambiguous {
                name: name.to_string(),
                args: args(),
            }),
        }
    }

    /// Descriptor of the implicit conversion from `from` to `to`.
    pub fn conversion_descriptor(from: DataTypeName, to: DataTypeName) -> FunctionDescriptor {
        FunctionDescriptor::new(CONVERT_FUNCTION, [from, DataTypeName::String], to)
    }
}

fn match_cost(
    descriptor: &FunctionDescriptor,
    arg_types: &[Option<DataTypeName>],
) -> Option<(u32, Vec<Option<DataTypeName>>)> {
    if !descriptor.accepts_arity(arg_types.len()) {
        return None;
    }
    let mut cost = 0;
    let mut conversions = Vec::with_capacity(arg_types.len());
    for (index, actual) in arg_types.iter().enumerate() {
        let formal = descriptor.arg_type(index)?;
        if let Some(actual) = actual {
            cost += implicit_conversion_cost(*actual, formal)?;
        }
        conversions.push((*actual != Some(formal)).then_some(formal));
    }
    Some((cost, conversions))
}

#[cfg(test)]
mod tests {
    use DataTypeName::*;

    use super::*;

    fn lookup(name: &str, args: &[Option<DataTypeName>]) -> Result<FunctionMatch, LookupError> {
        FunctionLibrary::builtin().lookup(name, args)
    }

    #[test]
    fn test_exact_match() {
        let found = lookup("+", &[Some(Integer), Some(Integer)]).unwrap();
        assert_eq!(found.descriptor.return_type, Integer);
        assert_eq!(found.conversions, [None, None]);
    }

    #[test]
    fn test_widening_match() {
        let found = lookup("+", &[Some(Integer), Some(Double)]).unwrap();
        assert_eq!(found.descriptor.return_type, Double);
        assert_eq!(found.conversions, [Some(Double), None]);

        let found = lookup("concat", &[Some(String), Some(Integer)]).unwrap();
        assert_eq!(found.conversions, [None, Some(String)]);
    }

    #[test]
    fn test_untyped_arguments() {
        let found = lookup("upper", &[None]).unwrap();
        assert_eq!(found.conversions, [Some(String)]);
        assert!(matches!(
            lookup("+", &[None, None]),
            Err(LookupError::Ambiguous { .. })
        ));
        let found = lookup("coalesce", &[Some(Integer), Some(Null), Some(Integer)]).unwrap();
        assert_eq!(found.descriptor.return_type, Integer);
    }

    #[test]
    fn test_lookup_failures() {
        assert_eq!(
            lookup("nope", &[]),
            Err(LookupError::NotFound("nope".into()))
        );
        let err = lookup("+", &[Some(Blob), Some(Integer)]).unwrap_err();
        assert_eq!(err.to_string(), "no overload of + accepts (blob, integer)");
        assert!(lookup("substring", &[Some(String)]).is_err());
    }

    #[test]
    fn test_descriptor_properties() {
        let hint = lookup("source_hint", &[Some(String)]).unwrap();
        assert_eq!(hint.descriptor.pushdown, PushDown::MustPushdown);
        let rand = lookup("RAND", &[]).unwrap();
        assert_eq!(rand.descriptor.determinism, Determinism::Nondeterministic);
    }
}
