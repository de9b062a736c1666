use crate::serde::Primitive;
use crate::types::{ObjectField, PrimitiveField, Type, Value};
use crate::{Result, YggError};
use std::collections::HashMap;

/// What a field holds. A primitive field is never read back as an object, nor the other
/// way around.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum FieldValue {
    Primitive(Primitive),
    Object(Value),
}

impl FieldValue {
    pub fn is_primitive(&self) -> bool {
        matches!(self, FieldValue::Primitive(_))
    }

    /// `None` for a null object.
    pub fn type_of(&self) -> Option<Type> {
        match self {
            FieldValue::Primitive(p) => Some(Type::Primitive(p.kind())),
            FieldValue::Object(v) => v.type_of(),
        }
    }
}

/// A field id together with its value.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FieldContext {
    id: String,
    value: FieldValue,
}

impl FieldContext {
    pub fn new(id: impl Into<String>, value: FieldValue) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn into_value(self) -> FieldValue {
        self.value
    }

    pub fn is_primitive(&self) -> bool {
        self.value.is_primitive()
    }

    pub fn get_object(&self) -> Result<&Value> {
        match &self.value {
            FieldValue::Object(v) => Ok(v),
            FieldValue::Primitive(_) => Err(YggError::corrupted(format!(
                "field {} is a primitive, but expected an object",
                self.id
            ))),
        }
    }

    pub fn get_primitive(&self) -> Result<Primitive> {
        match &self.value {
            FieldValue::Primitive(p) => Ok(*p),
            FieldValue::Object(_) => Err(YggError::corrupted(format!(
                "field {} is not a primitive, but expected one",
                self.id
            ))),
        }
    }

    pub fn get_object_as<T: ObjectField>(&self) -> Result<T> {
        let v = self.get_object()?.clone();
        T::from_value(v).map_err(|v| self.mismatch(&v, &T::declared_type()))
    }

    pub fn get_primitive_as<T: PrimitiveField>(&self) -> Result<T> {
        let p = self.get_primitive()?;
        T::from_primitive(p).ok_or_else(|| {
            YggError::corrupted(format!(
                "field {} holds {}, but expected {}",
                self.id,
                p.kind(),
                T::KIND
            ))
        })
    }

    fn mismatch(&self, v: &Value, expected: &Type) -> YggError {
        let found = v.type_of().map_or("null".to_owned(), |ty| ty.to_string());
        YggError::corrupted(format!(
            "field {} holds {found}, but expected {expected}",
            self.id
        ))
    }
}

/// The name-keyed bag of field values exchanged between streams and types.
///
/// Insertion order is kept for writing, but carries no meaning.
#[derive(Clone, Default, Debug)]
pub struct Fields {
    entries: Vec<FieldContext>,
    index: HashMap<String, usize>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            entries: Vec::with_capacity(cap),
            index: HashMap::with_capacity(cap),
        }
    }

    /// Sets a field, replacing any previous value of the same id.
    pub fn put(&mut self, ctx: FieldContext) {
        match self.index.get(ctx.id()) {
            Some(&i) => self.entries[i] = ctx,
            None => {
                self.index.insert(ctx.id.clone(), self.entries.len());
                self.entries.push(ctx);
            }
        }
    }

    pub fn put_object(&mut self, id: impl Into<String>, value: impl Into<Value>) {
        self.put(FieldContext::new(id, FieldValue::Object(value.into())));
    }

    pub fn put_primitive(&mut self, id: impl Into<String>, value: impl Into<Primitive>) {
        self.put(FieldContext::new(id, FieldValue::Primitive(value.into())));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&FieldContext> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    fn get_existing(&self, id: &str) -> Result<&FieldContext> {
        self.get(id)
            .ok_or_else(|| YggError::corrupted(format!("nonexistent field {id}")))
    }

    pub fn get_object(&self, id: &str) -> Result<&Value> {
        self.get_existing(id)?.get_object()
    }

    pub fn get_object_as<T: ObjectField>(&self, id: &str) -> Result<T> {
        self.get_existing(id)?.get_object_as()
    }

    pub fn get_primitive(&self, id: &str) -> Result<Primitive> {
        self.get_existing(id)?.get_primitive()
    }

    pub fn get_primitive_as<T: PrimitiveField>(&self, id: &str) -> Result<T> {
        self.get_existing(id)?.get_primitive_as()
    }

    pub fn take_object_as<T: ObjectField>(&mut self, id: &str) -> Result<T> {
        let t = self.get_object_as(id)?;
        self.remove(id);
        Ok(t)
    }

    pub fn take_primitive_as<T: PrimitiveField>(&mut self, id: &str) -> Result<T> {
        let t = self.get_primitive_as(id)?;
        self.remove(id);
        Ok(t)
    }

    /// Removes and returns a field.
    pub fn take(&mut self, id: &str) -> Option<FieldContext> {
        let i = self.index.remove(id)?;
        let ctx = self.entries.remove(i);
        for j in self.index.values_mut() {
            if *j > i {
                *j -= 1;
            }
        }
        Some(ctx)
    }

    /// Whether a field with the given id existed.
    pub fn remove(&mut self, id: &str) -> bool {
        self.take(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldContext> {
        self.entries.iter()
    }
}

impl IntoIterator for Fields {
    type Item = FieldContext;
    type IntoIter = std::vec::IntoIter<FieldContext>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = &'a FieldContext;
    type IntoIter = std::slice::Iter<'a, FieldContext>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<FieldContext> for Fields {
    fn from_iter<I: IntoIterator<Item = FieldContext>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for ctx in iter {
            fields.put(ctx);
        }
        fields
    }
}
