use crate::Serializer;
use std::collections::HashMap;
use yggdrasil_types::types::NamedType;
use yggdrasil_types::{Result, YggError};

/// Maps runtime types to stable identifiers and back.
///
/// Both directions must agree: if `id_of(t) == Some(id)` then `type_of(id) == Some(t)`.
pub trait ClassResolver {
    fn id_of(&self, ty: &NamedType) -> Option<String>;

    fn type_of(&self, id: &str) -> Option<NamedType>;
}

/// An explicit id table.
#[derive(Default)]
pub struct SimpleClassResolver {
    ids: HashMap<NamedType, String>,
    types: HashMap<String, NamedType>,
}

impl SimpleClassResolver {
    pub fn register(&mut self, ty: NamedType, id: &str) -> Result<()> {
        if let Some(prev) = self.types.get(id) {
            if *prev != ty {
                return Err(YggError::config(format!(
                    "id '{id}' is already registered for {prev}, cannot register it for {ty}"
                )));
            }
        }
        if let Some(prev) = self.ids.get(&ty) {
            if prev != id {
                return Err(YggError::config(format!(
                    "{ty} is already registered as '{prev}', cannot register it as '{id}'"
                )));
            }
        }
        self.ids.insert(ty, id.to_owned());
        self.types.insert(id.to_owned(), ty);
        Ok(())
    }
}

impl ClassResolver for SimpleClassResolver {
    fn id_of(&self, ty: &NamedType) -> Option<String> {
        self.ids.get(ty).cloned()
    }

    fn type_of(&self, id: &str) -> Option<NamedType> {
        self.types.get(id).copied()
    }
}

/// One link of the engine's resolver chain.
pub(crate) enum Resolver {
    Plain(Box<dyn ClassResolver>),
    Serializer(Box<dyn Serializer>),
    /// The engine's own id table, wherever it was placed in the chain.
    Simple,
}
