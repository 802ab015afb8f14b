//! Conversion between typed component values and the erased container.
//!
//! Values are stored as [`serde_json::Value`]. Cloning a `Value` is a deep
//! copy, which is what gives snapshots their isolation from live state.

use engine_component::{ComponentTypeId, ComponentValue};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::WorldError;

/// Encode a typed value for storage under `component`.
///
/// # Errors
///
/// Returns [`WorldError::Encode`] if serialisation fails, or if the encoded
/// form no longer decodes as `T`. The second case catches non-finite floats,
/// which `serde_json` writes as `null`.
pub(crate) fn encode<T: ComponentValue>(
    component: ComponentTypeId,
    value: T,
) -> Result<Value, WorldError> {
    let encoded =
        serde_json::to_value(value).map_err(|source| WorldError::Encode { component, source })?;
    T::deserialize(&encoded).map_err(|source| WorldError::Encode { component, source })?;
    Ok(encoded)
}

/// Decode a stored value as `T`.
///
/// A value that does not decode is treated as absent.
pub(crate) fn decode<T: ComponentValue>(component: ComponentTypeId, value: &Value) -> Option<T> {
    match T::deserialize(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            warn!(
                component = %component,
                expected = std::any::type_name::<T>(),
                %err,
                "stored value does not decode as the requested type"
            );
            None
        }
    }
}
