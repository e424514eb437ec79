pub mod constants;
pub mod data_type;
pub mod error;
pub mod function;
pub mod types;
pub mod value;
