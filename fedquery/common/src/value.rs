use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::data_type::DataTypeName;
use crate::error::ConversionError;

pub type Nullable<T> = Option<T>;

/// A wrapper around floats providing implementations of `Eq` and `Hash`.
pub type F32 = OrderedFloat<f32>;
pub type F64 = OrderedFloat<f64>;

/// A literal value. Every variant except [`ScalarValue::Null`] carries its own type, so a typed
/// null is `ScalarValue::Integer(None)` and an untyped null is `ScalarValue::Null`.
///
/// Big decimals and temporal values are kept in their canonical text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Boolean(Nullable<bool>),
    Byte(Nullable<i8>),
    Short(Nullable<i16>),
    Integer(Nullable<i32>),
    Long(Nullable<i64>),
    BigInteger(Nullable<i128>),
    Float(Nullable<F32>),
    Double(Nullable<F64>),
    BigDecimal(Nullable<String>),
    Char(Nullable<char>),
    String(Nullable<String>),
    Date(Nullable<String>),
    Time(Nullable<String>),
    Timestamp(Nullable<String>),
}

impl ScalarValue {
    /// Returns a null of the given type.
    pub fn null_of(ty: DataTypeName) -> Self {
        match ty {
            DataTypeName::Boolean => ScalarValue::Boolean(None),
            DataTypeName::Byte => ScalarValue::Byte(None),
            DataTypeName::Short => ScalarValue::Short(None),
            DataTypeName::Integer => ScalarValue::Integer(None),
            DataTypeName::Long => ScalarValue::Long(None),
            DataTypeName::BigInteger => ScalarValue::BigInteger(None),
            DataTypeName::Float => ScalarValue::Float(None),
            DataTypeName::Double => ScalarValue::Double(None),
            DataTypeName::BigDecimal => ScalarValue::BigDecimal(None),
            DataTypeName::Char => ScalarValue::Char(None),
            DataTypeName::String | DataTypeName::Clob | DataTypeName::Xml => {
                ScalarValue::String(None)
            }
            DataTypeName::Date => ScalarValue::Date(None),
            DataTypeName::Time => ScalarValue::Time(None),
            DataTypeName::Timestamp => ScalarValue::Timestamp(None),
            DataTypeName::Object | DataTypeName::Blob | DataTypeName::Null => ScalarValue::Null,
        }
    }

    pub fn data_type(&self) -> DataTypeName {
        match self {
            ScalarValue::Null => DataTypeName::Null,
            ScalarValue::Boolean(_) => DataTypeName::Boolean,
            ScalarValue::Byte(_) => DataTypeName::Byte,
            ScalarValue::Short(_) => DataTypeName::Short,
            ScalarValue::Integer(_) => DataTypeName::Integer,
            ScalarValue::Long(_) => DataTypeName::Long,
            ScalarValue::BigInteger(_) => DataTypeName::BigInteger,
            ScalarValue::Float(_) => DataTypeName::Float,
            ScalarValue::Double(_) => DataTypeName::Double,
            ScalarValue::BigDecimal(_) => DataTypeName::BigDecimal,
            ScalarValue::Char(_) => DataTypeName::Char,
            ScalarValue::String(_) => DataTypeName::String,
            ScalarValue::Date(_) => DataTypeName::Date,
            ScalarValue::Time(_) => DataTypeName::Time,
            ScalarValue::Timestamp(_) => DataTypeName::Timestamp,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            ScalarValue::Null => true,
            ScalarValue::Boolean(v) => v.is_none(),
            ScalarValue::Byte(v) => v.is_none(),
            ScalarValue::Short(v) => v.is_none(),
            ScalarValue::Integer(v) => v.is_none(),
            ScalarValue::Long(v) => v.is_none(),
            ScalarValue::BigInteger(v) => v.is_none(),
            ScalarValue::Float(v) => v.is_none(),
            ScalarValue::Double(v) => v.is_none(),
            ScalarValue::Char(v) => v.is_none(),
            ScalarValue::BigDecimal(v)
            | ScalarValue::String(v)
            | ScalarValue::Date(v)
            | ScalarValue::Time(v)
            | ScalarValue::Timestamp(v) => v.is_none(),
        }
    }

    /// Returns the value as a signed integer if it is integral, or a text or decimal holding an
    /// integral number.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            ScalarValue::Byte(v) => v.map(i128::from),
            ScalarValue::Short(v) => v.map(i128::from),
            ScalarValue::Integer(v) => v.map(i128::from),
            ScalarValue::Long(v) => v.map(i128::from),
            ScalarValue::BigInteger(v) => *v,
            ScalarValue::Boolean(v) => v.map(i128::from),
            ScalarValue::BigDecimal(Some(s)) | ScalarValue::String(Some(s)) => {
                s.trim().parse().ok()
            }
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Float(v) => v.map(|f| f64::from(f.into_inner())),
            ScalarValue::Double(v) => v.map(|f| f.into_inner()),
            ScalarValue::BigDecimal(Some(s)) | ScalarValue::String(Some(s)) => {
                s.trim().parse().ok()
            }
            other => other.as_i128().map(|i| i as f64),
        }
    }

    /// Converts the value to `target`, returning a typed null for null inputs.
    pub fn convert_to(&self, target: DataTypeName) -> Result<ScalarValue, ConversionError> {
        let source = self.data_type();
        if source == target || target == DataTypeName::Object {
            return Ok(self.clone());
        }
        if self.is_null() {
            return Ok(ScalarValue::null_of(target));
        }
        let incompatible = || ConversionError::Incompatible {
            from: source,
            to: target,
        };
        let text = self.to_string();
        let parse_error = || ConversionError::Parse {
            text: text.clone(),
            to: target,
        };
        let overflow = |value: &dyn fmt::Display| ConversionError::Overflow {
            value: value.to_string(),
            to: target,
        };

        let converted = match target {
            DataTypeName::Byte
            | DataTypeName::Short
            | DataTypeName::Integer
            | DataTypeName::Long
            | DataTypeName::BigInteger => {
                let value = match self {
                    ScalarValue::Float(_) | ScalarValue::Double(_) => {
                        let f = self.as_f64().ok_or_else(incompatible)?;
                        if !f.is_finite() {
                            return Err(overflow(&f));
                        }
                        f.trunc() as i128
                    }
                    ScalarValue::BigDecimal(Some(s)) => match s.trim().parse::<i128>() {
                        Ok(i) => i,
                        Err(_) => s.trim().parse::<f64>().map_err(|_| parse_error())?.trunc()
                            as i128,
                    },
                    ScalarValue::String(Some(s)) => {
                        s.trim().parse::<i128>().map_err(|_| parse_error())?
                    }
                    ScalarValue::Char(_)
                    | ScalarValue::Date(_)
                    | ScalarValue::Time(_)
                    | ScalarValue::Timestamp(_) => return Err(incompatible()),
                    other => other.as_i128().ok_or_else(incompatible)?,
                };
                integral_value(value, target).ok_or_else(|| overflow(&value))?
            }
            DataTypeName::Float | DataTypeName::Double => {
                let value = match self {
                    ScalarValue::String(Some(s)) => {
                        s.trim().parse::<f64>().map_err(|_| parse_error())?
                    }
                    ScalarValue::Char(_) | ScalarValue::Boolean(_) => return Err(incompatible()),
                    other => other.as_f64().ok_or_else(incompatible)?,
                };
                if target == DataTypeName::Float {
                    ScalarValue::Float(Some(OrderedFloat(value as f32)))
                } else {
                    ScalarValue::Double(Some(OrderedFloat(value)))
                }
            }
            DataTypeName::BigDecimal => match self {
                ScalarValue::String(Some(s)) => {
                    s.trim().parse::<f64>().map_err(|_| parse_error())?;
                    ScalarValue::BigDecimal(Some(s.trim().to_string()))
                }
                other if other.data_type().is_numeric() => {
                    ScalarValue::BigDecimal(Some(other.to_string()))
                }
                _ => return Err(incompatible()),
            },
            DataTypeName::Boolean => match self {
                ScalarValue::String(Some(s)) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => ScalarValue::Boolean(Some(true)),
                    "false" | "0" => ScalarValue::Boolean(Some(false)),
                    _ => return Err(parse_error()),
                },
                other if other.data_type().is_numeric() => {
                    let f = other.as_f64().ok_or_else(incompatible)?;
                    ScalarValue::Boolean(Some(f != 0.0))
                }
                _ => return Err(incompatible()),
            },
            DataTypeName::String | DataTypeName::Clob | DataTypeName::Xml => {
                ScalarValue::String(Some(text.clone()))
            }
            DataTypeName::Char => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => ScalarValue::Char(Some(c)),
                    _ => return Err(parse_error()),
                }
            }
            DataTypeName::Date => match self {
                ScalarValue::String(Some(s)) if is_date(s.trim()) => {
                    ScalarValue::Date(Some(s.trim().to_string()))
                }
                ScalarValue::Timestamp(Some(ts)) => {
                    ScalarValue::Date(Some(ts.split(' ').next().unwrap_or_default().to_string()))
                }
                ScalarValue::String(_) => return Err(parse_error()),
                _ => return Err(incompatible()),
            },
            DataTypeName::Time => match self {
                ScalarValue::String(Some(s)) if is_time(s.trim()) => {
                    ScalarValue::Time(Some(s.trim().to_string()))
                }
                ScalarValue::Timestamp(Some(ts)) => ScalarValue::Time(Some(
                    ts.split(' ').nth(1).unwrap_or("00:00:00").to_string(),
                )),
                ScalarValue::String(_) => return Err(parse_error()),
                _ => return Err(incompatible()),
            },
            DataTypeName::Timestamp => match self {
                ScalarValue::String(Some(s)) if is_timestamp(s.trim()) => {
                    ScalarValue::Timestamp(Some(s.trim().to_string()))
                }
                ScalarValue::Date(Some(d)) => ScalarValue::Timestamp(Some(format!("{d} 00:00:00"))),
                ScalarValue::Time(Some(t)) => {
                    ScalarValue::Timestamp(Some(format!("1970-01-01 {t}")))
                }
                ScalarValue::String(_) => return Err(parse_error()),
                _ => return Err(incompatible()),
            },
            DataTypeName::Blob | DataTypeName::Object | DataTypeName::Null => {
                return Err(incompatible());
            }
        };
        Ok(converted)
    }
}

fn integral_value(value: i128, target: DataTypeName) -> Option<ScalarValue> {
    let converted = match target {
        DataTypeName::Byte => ScalarValue::Byte(Some(i8::try_from(value).ok()?)),
        DataTypeName::Short => ScalarValue::Short(Some(i16::try_from(value).ok()?)),
        DataTypeName::Integer => ScalarValue::Integer(Some(i32::try_from(value).ok()?)),
        DataTypeName::Long => ScalarValue::Long(Some(i64::try_from(value).ok()?)),
        DataTypeName::BigInteger => ScalarValue::BigInteger(Some(value)),
        _ => return None,
    };
    Some(converted)
}

fn digits(part: &str, len: usize) -> bool {
    part.len() == len && part.bytes().all(|b| b.is_ascii_digit())
}

fn is_date(text: &str) -> bool {
    let parts: Vec<&str> = text.split('-').collect();
    matches!(parts.as_slice(), [y, m, d] if digits(y, 4) && digits(m, 2) && digits(d, 2))
}

fn is_time(text: &str) -> bool {
    let parts: Vec<&str> = text.split(':').collect();
    matches!(parts.as_slice(), [h, m, s] if digits(h, 2) && digits(m, 2) && digits(s.split('.').next().unwrap_or_default(), 2))
}

fn is_timestamp(text: &str) -> bool {
    match text.split_once(' ') {
        Some((date, time)) => is_date(date) && is_time(time),
        None => is_date(text),
    }
}

impl fmt::Display for ScalarValue {
    /// Writes the plain text form of the value, `null` for nulls.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_opt<T: fmt::Display>(f: &mut fmt::Formatter<'_>, v: &Option<T>) -> fmt::Result {
            match v {
                Some(v) => write!(f, "{v}"),
                None => f.write_str("null"),
            }
        }
        match self {
            ScalarValue::Null => f.write_str("null"),
            ScalarValue::Boolean(v) => write_opt(f, v),
            ScalarValue::Byte(v) => write_opt(f, v),
            ScalarValue::Short(v) => write_opt(f, v),
            ScalarValue::Integer(v) => write_opt(f, v),
            ScalarValue::Long(v) => write_opt(f, v),
            ScalarValue::BigInteger(v) => write_opt(f, v),
            ScalarValue::Float(v) => write_opt(f, &v.map(|x| x.into_inner())),
            ScalarValue::Double(v) => write_opt(f, &v.map(|x| x.into_inner())),
            ScalarValue::Char(v) => write_opt(f, v),
            ScalarValue::BigDecimal(v)
            | ScalarValue::String(v)
            | ScalarValue::Date(v)
            | ScalarValue::Time(v)
            | ScalarValue::Timestamp(v) => write_opt(f, v),
        }
    }
}

macro_rules! for_each_non_null_variant {
    ($m:ident) => {
        $m!(boolean, bool, Boolean);
        $m!(byte, i8, Byte);
        $m!(short, i16, Short);
        $m!(integer, i32, Integer);
        $m!(long, i64, Long);
        $m!(big_integer, i128, BigInteger);
        $m!(float, F32, Float);
        $m!(double, F64, Double);
        $m!(char, char, Char);
        $m!(string, String, String);
    };
}

macro_rules! impl_from_for_variant {
    ($_:ident, $ty:ty, $variant:ident) => {
        impl From<$ty> for ScalarValue {
            #[inline]
            fn from(value: $ty) -> Self {
                ScalarValue::$variant(Some(value))
            }
        }
    };
}

for_each_non_null_variant!(impl_from_for_variant);

macro_rules! impl_from_nullable_for_variant {
    ($_:ident, $ty:ty, $variant:ident) => {
        impl From<Nullable<$ty>> for ScalarValue {
            #[inline]
            fn from(value: Nullable<$ty>) -> Self {
                ScalarValue::$variant(value)
            }
        }
    };
}

for_each_non_null_variant!(impl_from_nullable_for_variant);

impl From<&str> for ScalarValue {
    #[inline]
    fn from(value: &str) -> Self {
        ScalarValue::String(Some(value.to_string()))
    }
}

impl From<f64> for ScalarValue {
    #[inline]
    fn from(value: f64) -> Self {
        ScalarValue::Double(Some(OrderedFloat(value)))
    }
}

macro_rules! impl_as_for_variant {
    ($name:ident, $ty:ty, $variant:ident) => {
        impl ScalarValue {
            paste::paste! {
                #[doc = concat!(" Attempts to downcast `self` to borrowed `Nullable<", stringify!($ty), ">`, returning `None` if not possible.")]
                #[inline]
                pub fn [<try_as_$name>](&self) -> Option<&Nullable<$ty>> {
                    match self {
                        ScalarValue::$variant(value) => Some(value),
                        _ => None
                    }
                }
            }
        }
    };
}

for_each_non_null_variant!(impl_as_for_variant);
