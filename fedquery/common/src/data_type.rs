use std::fmt;
use std::str::FromStr;

use arrow::datatypes::{DataType, TimeUnit};
use serde::{Deserialize, Serialize};

/// Runtime data types known to the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataTypeName {
    String,
    Char,
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    BigInteger,
    Float,
    Double,
    BigDecimal,
    Date,
    Time,
    Timestamp,
    Object,
    Blob,
    Clob,
    Xml,
    Null,
}

impl DataTypeName {
    pub const ALL: [DataTypeName; 19] = [
        DataTypeName::String,
        DataTypeName::Char,
        DataTypeName::Boolean,
        DataTypeName::Byte,
        DataTypeName::Short,
        DataTypeName::Integer,
        DataTypeName::Long,
        DataTypeName::BigInteger,
        DataTypeName::Float,
        DataTypeName::Double,
        DataTypeName::BigDecimal,
        DataTypeName::Date,
        DataTypeName::Time,
        DataTypeName::Timestamp,
        DataTypeName::Object,
        DataTypeName::Blob,
        DataTypeName::Clob,
        DataTypeName::Xml,
        DataTypeName::Null,
    ];

    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            DataTypeName::String => "string",
            DataTypeName::Char => "char",
            DataTypeName::Boolean => "boolean",
            DataTypeName::Byte => "byte",
            DataTypeName::Short => "short",
            DataTypeName::Integer => "integer",
            DataTypeName::Long => "long",
            DataTypeName::BigInteger => "biginteger",
            DataTypeName::Float => "float",
            DataTypeName::Double => "double",
            DataTypeName::BigDecimal => "bigdecimal",
            DataTypeName::Date => "date",
            DataTypeName::Time => "time",
            DataTypeName::Timestamp => "timestamp",
            DataTypeName::Object => "object",
            DataTypeName::Blob => "blob",
            DataTypeName::Clob => "clob",
            DataTypeName::Xml => "xml",
            DataTypeName::Null => "null",
        }
    }

    /// Looks up a type by its name or one of the common SQL aliases, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let ty = match lower.as_str() {
            "varchar" | "text" => DataTypeName::String,
            "tinyint" => DataTypeName::Byte,
            "smallint" => DataTypeName::Short,
            "int" => DataTypeName::Integer,
            "bigint" => DataTypeName::Long,
            "real" => DataTypeName::Float,
            "decimal" | "numeric" => DataTypeName::BigDecimal,
            "bool" => DataTypeName::Boolean,
            "varbinary" => DataTypeName::Blob,
            other => return Self::ALL.into_iter().find(|ty| ty.name() == other),
        };
        Some(ty)
    }

    #[inline]
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            DataTypeName::Byte
                | DataTypeName::Short
                | DataTypeName::Integer
                | DataTypeName::Long
                | DataTypeName::BigInteger
        )
    }

    #[inline]
    pub fn is_numeric(self) -> bool {
        self.is_integral()
            || matches!(
                self,
                DataTypeName::Float | DataTypeName::Double | DataTypeName::BigDecimal
            )
    }

    #[inline]
    pub fn is_lob(self) -> bool {
        matches!(
            self,
            DataTypeName::Blob | DataTypeName::Clob | DataTypeName::Xml
        )
    }

    #[inline]
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            DataTypeName::Date | DataTypeName::Time | DataTypeName::Timestamp
        )
    }

    #[inline]
    pub fn is_string_like(self) -> bool {
        matches!(self, DataTypeName::String | DataTypeName::Char)
    }

    pub fn to_arrow_data_type(self) -> DataType {
        match self {
            DataTypeName::String | DataTypeName::Clob | DataTypeName::Xml => DataType::Utf8,
            DataTypeName::Char => DataType::Utf8,
            DataTypeName::Boolean => DataType::Boolean,
            DataTypeName::Byte => DataType::Int8,
            DataTypeName::Short => DataType::Int16,
            DataTypeName::Integer => DataType::Int32,
            DataTypeName::Long => DataType::Int64,
            DataTypeName::BigInteger => DataType::Decimal128(38, 0),
            DataTypeName::Float => DataType::Float32,
            DataTypeName::Double => DataType::Float64,
            DataTypeName::BigDecimal => DataType::Decimal128(38, 10),
            DataTypeName::Date => DataType::Date32,
            DataTypeName::Time => DataType::Time64(TimeUnit::Microsecond),
            DataTypeName::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
            DataTypeName::Object | DataTypeName::Blob => DataType::Binary,
            DataTypeName::Null => DataType::Null,
        }
    }

    /// Position of a numeric type in the widening chain.
    #[inline]
    fn numeric_rank(self) -> Option<u32> {
        let rank = match self {
            DataTypeName::Byte => 1,
            DataTypeName::Short => 2,
            DataTypeName::Integer => 3,
            DataTypeName::Long => 4,
            DataTypeName::BigInteger => 5,
            DataTypeName::Float => 6,
            DataTypeName::Double => 7,
            DataTypeName::BigDecimal => 8,
            _ => return None,
        };
        Some(rank)
    }

    /// Types this type converts to without an explicit conversion, excluding itself.
    fn implicit_targets(self) -> &'static [DataTypeName] {
        use DataTypeName::*;
        match self {
            Null => &Self::ALL,
            Boolean => &[String, Object],
            Byte => &[
                Short, Integer, Long, BigInteger, Float, Double, BigDecimal, String, Object,
            ],
            Short => &[
                Integer, Long, BigInteger, Float, Double, BigDecimal, String, Object,
            ],
            Integer => &[Long, BigInteger, Float, Double, BigDecimal, String, Object],
            Long => &[BigInteger, Float, Double, BigDecimal, String, Object],
            BigInteger => &[Double, BigDecimal, String, Object],
            Float => &[Double, BigDecimal, String, Object],
            Double => &[BigDecimal, String, Object],
            BigDecimal => &[String, Object],
            Char => &[String, Object],
            String => &[Clob, Object],
            Date => &[Timestamp, String, Object],
            Time => &[Timestamp, String, Object],
            Timestamp => &[String, Object],
            Xml => &[Clob, Object],
            Blob | Clob => &[Object],
            Object => &[],
        }
    }
}

impl fmt::Display for DataTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataTypeName {
    type Err = UnknownDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownDataType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown data type: {0}")]
pub struct UnknownDataType(pub String);

/// Returns `true` if a value of type `from` may be used where `to` is expected without an
/// explicit conversion.
#[inline]
pub fn is_implicit_conversion(from: DataTypeName, to: DataTypeName) -> bool {
    from == to || from.implicit_targets().contains(&to)
}

/// Returns `true` if `convert(value, to)` is legal for a value of type `from`.
pub fn is_explicit_conversion(from: DataTypeName, to: DataTypeName) -> bool {
    use DataTypeName::*;
    if is_implicit_conversion(from, to) || from == Object {
        return true;
    }
    match (from, to) {
        (a, b) if a.is_numeric() && b.is_numeric() => true,
        (a, Boolean) | (Boolean, a) if a.is_numeric() => true,
        (String | Char, b) => !matches!(b, Blob),
        (Clob | Xml, String) | (Clob, Xml) => true,
        (Timestamp, Date | Time) => true,
        _ => false,
    }
}

/// Relative cost of an implicit conversion; `None` if the conversion is not implicit.
///
/// Used to rank function signatures: widening along the numeric chain is cheap, converting to
/// `string` is expensive and falling back to `object` is the most expensive.
pub fn implicit_conversion_cost(from: DataTypeName, to: DataTypeName) -> Option<u32> {
    if from == to {
        return Some(0);
    }
    if !is_implicit_conversion(from, to) {
        return None;
    }
    if from == DataTypeName::Null {
        return Some(1);
    }
    let cost = match (from.numeric_rank(), to.numeric_rank()) {
        (Some(a), Some(b)) => b.saturating_sub(a),
        _ => match to {
            DataTypeName::Object => 20,
            DataTypeName::String | DataTypeName::Clob => 10,
            _ => 1,
        },
    };
    Some(cost)
}

/// Finds the narrowest type every input converts to implicitly.
///
/// `null` inputs are ignored unless every input is `null`. `object` is only chosen when one of
/// the inputs is already `object`. Returns `None` if there is no common type.
pub fn common_type<I>(types: I) -> Option<DataTypeName>
where
    I: IntoIterator<Item = DataTypeName>,
{
    let mut inputs: Vec<DataTypeName> = types.into_iter().collect();
    inputs.sort();
    inputs.dedup();
    let has_null = inputs.contains(&DataTypeName::Null);
    inputs.retain(|ty| *ty != DataTypeName::Null);
    match inputs.as_slice() {
        [] => return has_null.then_some(DataTypeName::Null),
        [single] => return Some(*single),
        _ => {}
    }
    let allow_object = inputs.contains(&DataTypeName::Object);
    let candidates: Vec<DataTypeName> = DataTypeName::ALL
        .into_iter()
        .filter(|candidate| *candidate != DataTypeName::Null)
        .filter(|candidate| allow_object || *candidate != DataTypeName::Object)
        .filter(|candidate| inputs.iter().all(|ty| is_implicit_conversion(*ty, *candidate)))
        .collect();
    candidates
        .iter()
        .copied()
        .find(|candidate| {
            candidates
                .iter()
                .all(|other| is_implicit_conversion(*candidate, *other))
        })
        .or_else(|| candidates.first().copied())
}
