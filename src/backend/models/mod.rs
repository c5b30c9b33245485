pub mod attributes;
pub mod element;
pub mod foreign;
pub mod r_type;
pub mod r_value;
pub mod vector;

pub use attributes::Attributes;
pub use element::{
    double_na, is_double_na, RComplex, INT_NA, LOGICAL_FALSE, LOGICAL_NA, LOGICAL_TRUE,
};
pub use foreign::{ForeignKey, ForeignObject, ForeignRef, KeyInfo};
pub use r_type::RType;
pub use r_value::RValue;
pub use vector::{RVector, VectorData};
