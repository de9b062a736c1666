use crate::schema::{FieldDecl, FieldKind};
use crate::StdSerializer;
use yggdrasil_types::types::{ArrayRef, FieldContext, FieldValue, ObjectRef, Type, Value};
use yggdrasil_types::Result;

/// Resolves field mismatches between a stream and the current shape of a type.
///
/// Each method returns whether the mismatch was handled. Handlers are asked in
/// registration order, after the type's own hooks.
pub trait FieldHandler {
    /// The stream holds a field the type no longer declares.
    fn excessive_field(&self, _obj: &ObjectRef, _field: &FieldContext) -> Result<bool> {
        Ok(false)
    }

    /// The type declares a field the stream does not hold.
    fn missing_field(&self, _obj: &ObjectRef, _decl: &FieldDecl) -> Result<bool> {
        Ok(false)
    }

    /// The stream's value cannot be assigned to the declared field.
    fn incompatible_field(
        &self,
        _obj: &ObjectRef,
        _decl: &FieldDecl,
        _field: &FieldContext,
    ) -> Result<bool> {
        Ok(false)
    }
}

/// Converts between arrays and the standard collections when a field changed from one
/// to the other.
///
/// Not registered by default.
pub struct CollectionFieldHandler;

impl CollectionFieldHandler {
    fn stored_items(value: &Value) -> Option<Vec<Value>> {
        match value {
            Value::Array(arr) if arr.component_primitive().is_none() => Some(arr.to_vec()),
            Value::Object(obj) => StdSerializer::collection_items(obj),
            _ => None,
        }
    }
}

impl FieldHandler for CollectionFieldHandler {
    fn incompatible_field(
        &self,
        obj: &ObjectRef,
        decl: &FieldDecl,
        field: &FieldContext,
    ) -> Result<bool> {
        let FieldValue::Object(stored) = field.value() else {
            return Ok(false);
        };
        let Some(items) = Self::stored_items(stored) else {
            return Ok(false);
        };
        let converted = match decl.kind() {
            FieldKind::Object(Type::Named(ty)) if StdSerializer::is_collection(ty) => {
                match StdSerializer::collection_from(ty, items) {
                    Some(collection) => Value::Object(collection),
                    None => return Ok(false),
                }
            }
            FieldKind::Object(Type::Array(component)) if !component.is_primitive() => {
                if !items.iter().all(|item| component.accepts(item)) {
                    return Ok(false);
                }
                Value::Array(ArrayRef::new((**component).clone(), items))
            }
            _ => return Ok(false),
        };
        Ok(decl.assign(obj, FieldValue::Object(converted)).is_ok())
    }
}
