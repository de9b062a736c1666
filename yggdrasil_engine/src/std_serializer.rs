use crate::{ClassResolver, Serializer};
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;
use yggdrasil_types::types::{ArrayRef, Fields, NamedType, ObjectRef, Type, Value};
use yggdrasil_types::{Result, YggError};

pub type ValueList = Vec<Value>;
pub type ValueDeque = VecDeque<Value>;
pub type ValueSet = HashSet<Value>;
pub type ValueMap = HashMap<Value, Value>;

/// Container and utility types every engine knows.
///
/// Lists and sets are written as one `values` array, maps as parallel `keys` and `values`
/// arrays. A [`Uuid`] is two primitive longs and is created only once both are read.
pub struct StdSerializer;

const SUPPORTED: [&str; 5] = ["ArrayList", "LinkedList", "HashSet", "HashMap", "UUID"];

impl StdSerializer {
    fn supported() -> [NamedType; 5] {
        [
            NamedType::of::<ValueList>(),
            NamedType::of::<ValueDeque>(),
            NamedType::of::<ValueSet>(),
            NamedType::of::<ValueMap>(),
            NamedType::of::<Uuid>(),
        ]
    }

    /// Whether `ty` is one of the collection types, which hold a sequence of values.
    pub fn is_collection(ty: &NamedType) -> bool {
        ty.is::<ValueList>() || ty.is::<ValueDeque>() || ty.is::<ValueSet>()
    }

    /// The items of a collection instance, in iteration order.
    pub fn collection_items(obj: &ObjectRef) -> Option<Vec<Value>> {
        if let Some(list) = obj.borrow::<ValueList>() {
            return Some(list.clone());
        }
        if let Some(deque) = obj.borrow::<ValueDeque>() {
            return Some(deque.iter().cloned().collect());
        }
        if let Some(set) = obj.borrow::<ValueSet>() {
            return Some(set.iter().cloned().collect());
        }
        None
    }

    /// A new collection instance of type `ty`, holding `items`.
    pub fn collection_from(ty: &NamedType, items: Vec<Value>) -> Option<ObjectRef> {
        if ty.is::<ValueList>() {
            Some(ObjectRef::new(items))
        } else if ty.is::<ValueDeque>() {
            Some(ObjectRef::new(items.into_iter().collect::<ValueDeque>()))
        } else if ty.is::<ValueSet>() {
            Some(ObjectRef::new(items.into_iter().collect::<ValueSet>()))
        } else {
            None
        }
    }
}

impl ClassResolver for StdSerializer {
    fn id_of(&self, ty: &NamedType) -> Option<String> {
        Self::supported()
            .iter()
            .position(|t| t == ty)
            .map(|i| SUPPORTED[i].to_owned())
    }

    fn type_of(&self, id: &str) -> Option<NamedType> {
        let i = SUPPORTED.iter().position(|s| *s == id)?;
        Some(Self::supported()[i])
    }
}

impl Serializer for StdSerializer {
    fn serialize(&self, obj: &ObjectRef) -> Result<Fields> {
        let mut fields = Fields::with_capacity(2);
        if let Some(items) = Self::collection_items(obj) {
            fields.put_object("values", ArrayRef::new(Type::Any, items));
        } else if let Some(map) = obj.borrow::<ValueMap>() {
            let (keys, values): (Vec<Value>, Vec<Value>) =
                map.iter().map(|(k, v)| (k.clone(), v.clone())).unzip();
            fields.put_object("keys", ArrayRef::new(Type::Any, keys));
            fields.put_object("values", ArrayRef::new(Type::Any, values));
        } else if let Some(uuid) = obj.borrow::<Uuid>() {
            let bits = uuid.as_u128();
            fields.put_primitive("mostSigBits", (bits >> 64) as u64 as i64);
            fields.put_primitive("leastSigBits", bits as u64 as i64);
        } else {
            return Err(YggError::not_serializable(format!(
                "{} is not a standard container",
                obj.named_type()
            )));
        }
        Ok(fields)
    }

    fn can_be_instantiated(&self, ty: &NamedType) -> bool {
        !ty.is::<Uuid>()
    }

    fn new_instance(&self, ty: &NamedType) -> Result<ObjectRef> {
        if ty.is::<ValueMap>() {
            return Ok(ObjectRef::new(ValueMap::new()));
        }
        Self::collection_from(ty, vec![])
            .ok_or_else(|| YggError::corrupted(format!("cannot create an instance of {ty}")))
    }

    fn deserialize(&self, obj: &ObjectRef, mut fields: Fields) -> Result<()> {
        let ty = obj.named_type();
        if Self::is_collection(&ty) {
            let values = fields.take_object_as::<ArrayRef>("values")?.to_vec();
            if let Some(mut list) = obj.borrow_mut::<ValueList>() {
                list.extend(values);
            } else if let Some(mut deque) = obj.borrow_mut::<ValueDeque>() {
                deque.extend(values);
            } else if let Some(mut set) = obj.borrow_mut::<ValueSet>() {
                set.extend(values);
            }
        } else if let Some(mut map) = obj.borrow_mut::<ValueMap>() {
            let keys = fields.take_object_as::<ArrayRef>("keys")?.to_vec();
            let values = fields.take_object_as::<ArrayRef>("values")?.to_vec();
            if keys.len() != values.len() {
                return Err(YggError::corrupted(format!(
                    "map has {} keys but {} values",
                    keys.len(),
                    values.len()
                )));
            }
            map.extend(keys.into_iter().zip(values));
        } else {
            return Err(YggError::corrupted(format!("cannot fill an instance of {ty}")));
        }
        Ok(())
    }

    fn deserialize_new(&self, ty: &NamedType, fields: Fields) -> Result<ObjectRef> {
        if !ty.is::<Uuid>() {
            return Err(YggError::corrupted(format!(
                "cannot create an instance of {ty} from its fields"
            )));
        }
        let most = fields.get_primitive_as::<i64>("mostSigBits")? as u64;
        let least = fields.get_primitive_as::<i64>("leastSigBits")? as u64;
        let uuid = Uuid::from_u128(((most as u128) << 64) | least as u128);
        Ok(ObjectRef::new(uuid))
    }
}
