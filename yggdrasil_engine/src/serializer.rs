use crate::ClassResolver;
use yggdrasil_types::types::{Fields, NamedType, ObjectRef};
use yggdrasil_types::{Result, YggError};

/// A plugin that (de)serializes the types it resolves, instead of field enumeration.
///
/// Types the plugin can instantiate are read like any generic object: an empty instance
/// from [`Serializer::new_instance`] is registered first, then filled by
/// [`Serializer::deserialize`]. Other types are only created after all their fields are
/// read, by [`Serializer::deserialize_new`], so they cannot be part of a cycle through
/// their own fields.
pub trait Serializer: ClassResolver {
    fn serialize(&self, obj: &ObjectRef) -> Result<Fields>;

    fn can_be_instantiated(&self, _ty: &NamedType) -> bool {
        true
    }

    fn new_instance(&self, ty: &NamedType) -> Result<ObjectRef> {
        Err(YggError::corrupted(format!(
            "cannot create an instance of {ty}"
        )))
    }

    fn deserialize(&self, obj: &ObjectRef, _fields: Fields) -> Result<()> {
        Err(YggError::corrupted(format!(
            "cannot fill an instance of {}",
            obj.named_type()
        )))
    }

    fn deserialize_new(&self, ty: &NamedType, _fields: Fields) -> Result<ObjectRef> {
        Err(YggError::corrupted(format!(
            "cannot create an instance of {ty} from its fields"
        )))
    }
}
