//! Indexing foreign objects.
//!
//! Foreign containers take exactly one scalar position. Numbers address a
//! 0-based index (`x[[1]]` is key 0), strings address a member. A string key
//! the object does not have but its class object can write is written there
//! (static members).

use tracing::trace;

use super::positions::PositionArg;
use crate::backend::errors::{RError, RResult};
use crate::backend::models::element::{is_double_na, INT_NA};
use crate::backend::models::{ForeignKey, ForeignRef, RValue, VectorData};

/// Convert the position arguments of a foreign access into one key.
pub fn foreign_key(positions: &[PositionArg]) -> RResult<ForeignKey> {
    let [PositionArg::Value(value)] = positions else {
        return Err(RError::foreign("Invalid number positions for foreign access."));
    };
    let invalid = || {
        RError::foreign(format!(
            "invalid index/identifier during foreign access: {}",
            value
        ))
    };
    let RValue::Vector(vector) = value else {
        return Err(invalid());
    };
    if vector.len() != 1 {
        return Err(invalid());
    }
    match vector.data() {
        VectorData::Integer(v) if v[0] != INT_NA => Ok(ForeignKey::Index(v[0] as i64 - 1)),
        VectorData::Double(v) if v[0].is_finite() && !is_double_na(v[0]) => {
            let index = v[0].trunc();
            if index.abs() >= i64::MAX as f64 {
                return Err(invalid());
            }
            (index as i64)
                .checked_sub(1)
                .map(ForeignKey::Index)
                .ok_or_else(invalid)
        }
        VectorData::Character(v) => v[0]
            .as_ref()
            .map(|name| ForeignKey::Name(name.clone()))
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Read one key.
pub fn read(object: &ForeignRef, positions: &[PositionArg]) -> RResult<RValue> {
    let key = foreign_key(positions)?;
    if object.object().key_info(&key).readable {
        trace!(target: "rcore::extract", %key, "Foreign read");
        return object.object().read(&key);
    }
    if let (ForeignKey::Name(_), Some(class)) = (&key, object.object().class_object()) {
        if class.object().key_info(&key).readable {
            trace!(target: "rcore::extract", %key, "Foreign read through class object");
            return class.object().read(&key);
        }
    }
    Err(unknown_key(&key))
}

/// Write one key and return the (same) foreign object.
pub fn write(object: &ForeignRef, positions: &[PositionArg], value: RValue) -> RResult<RValue> {
    let key = foreign_key(positions)?;
    let info = object.object().key_info(&key);
    if info.writable {
        trace!(target: "rcore::replace", %key, "Foreign write");
        object.object().write(&key, value)?;
        return Ok(RValue::Foreign(object.clone()));
    }
    if let (ForeignKey::Name(_), false, Some(class)) =
        (&key, info.existing, object.object().class_object())
    {
        if class.object().key_info(&key).writable {
            trace!(target: "rcore::replace", %key, "Foreign write through class object");
            class.object().write(&key, value)?;
            return Ok(RValue::Foreign(object.clone()));
        }
    }
    Err(unknown_key(&key))
}

fn unknown_key(key: &ForeignKey) -> RError {
    RError::foreign(format!(
        "invalid index/identifier during foreign access: {}",
        key
    ))
}
