//! Per-type field lists.
//!
//! A [`Schema`] tells the engine which fields a Rust type has, how to read and assign
//! each of them, and how to create an empty instance. Types with a schema are written as
//! generic objects, field by field. Ancestor schemas can be spliced in with
//! [`SchemaBuilder::extends`].

use std::any::Any;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::rc::Rc;
use yggdrasil_types::serde::PrimitiveType;
use yggdrasil_types::types::{
    FieldContext, FieldValue, Fields, NamedType, NativeEnum, ObjectField, ObjectRef,
    PrimitiveField, Type, Value,
};
use yggdrasil_types::{Result, YggError};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum FieldKind {
    Primitive(PrimitiveType),
    /// An object field and its declared type.
    Object(Type),
}

type Getter = Rc<dyn Fn(&dyn Any) -> Option<FieldValue>>;
/// Hands the value back if it cannot be assigned.
type Setter = Rc<dyn Fn(&mut dyn Any, FieldValue) -> Result<(), FieldValue>>;

type MissingHook = Rc<dyn Fn(&mut dyn Any, &FieldDecl) -> Result<bool>>;
type ContextHook = Rc<dyn Fn(&mut dyn Any, &FieldContext) -> Result<bool>>;

type CustomSer = Rc<dyn Fn(&dyn Any) -> Option<Result<Fields>>>;
type CustomDe = Rc<dyn Fn(&mut dyn Any, Fields) -> Option<Result<()>>>;

/// One declared field: its id, its kind and its accessors.
#[derive(Clone)]
pub struct FieldDecl {
    id: String,
    kind: FieldKind,
    get: Getter,
    set: Setter,
}

impl FieldDecl {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn declared_type(&self) -> Type {
        match &self.kind {
            FieldKind::Primitive(kind) => Type::Primitive(*kind),
            FieldKind::Object(ty) => ty.clone(),
        }
    }

    /// The current value of this field in `obj`.
    pub fn read(&self, obj: &ObjectRef) -> Result<FieldValue> {
        let any = obj.borrow_any();
        self.read_any(&*any, obj.named_type())
    }

    fn read_any(&self, any: &dyn Any, ty: NamedType) -> Result<FieldValue> {
        let value = (self.get)(any).ok_or_else(|| {
            YggError::not_serializable(format!("field {} does not belong to {ty}", self.id))
        })?;
        if let (FieldKind::Object(declared), FieldValue::Object(v)) = (&self.kind, &value) {
            if !declared.accepts(v) {
                let found = v.type_of().map_or("null".to_owned(), |t| t.to_string());
                return Err(YggError::not_serializable(format!(
                    "field {} of {ty} is declared {declared}, but holds {found}",
                    self.id
                )));
            }
        }
        Ok(value)
    }

    /// Assigns `value` to this field of `obj`, widening primitives where needed.
    /// Hands the value back if it is incompatible with the field.
    pub fn assign(&self, obj: &ObjectRef, value: FieldValue) -> Result<(), FieldValue> {
        let mut any = obj.borrow_any_mut();
        (self.set)(&mut *any, value)
    }

    fn project<T: 'static, P: 'static>(
        &self,
        project: fn(&T) -> &P,
        project_mut: fn(&mut T) -> &mut P,
    ) -> FieldDecl {
        let get = self.get.clone();
        let set = self.set.clone();
        FieldDecl {
            id: self.id.clone(),
            kind: self.kind.clone(),
            get: Rc::new(move |any| {
                let t = any.downcast_ref::<T>()?;
                get(project(t))
            }),
            set: Rc::new(move |any, value| match any.downcast_mut::<T>() {
                Some(t) => set(project_mut(t), value),
                None => Err(value),
            }),
        }
    }
}

/// The field list and construction path of one Rust type.
#[derive(Clone)]
pub struct Schema {
    ty: NamedType,
    fields: Vec<FieldDecl>,
    construct: Option<Rc<dyn Fn() -> ObjectRef>>,
    custom: Option<(CustomSer, CustomDe)>,
    on_missing: Option<MissingHook>,
    on_excessive: Option<ContextHook>,
    on_incompatible: Option<ContextHook>,
}

impl Schema {
    pub fn builder<T: 'static>() -> SchemaBuilder<T> {
        SchemaBuilder::new()
    }

    pub fn named_type(&self) -> NamedType {
        self.ty
    }

    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|decl| decl.id == id)
    }

    /// Whether instances can be created when reading. A schema without a construction
    /// path describes an abstract type, which is neither written nor read.
    pub fn is_constructible(&self) -> bool {
        self.construct.is_some()
    }

    /// Whether the type maps its own fields instead of listing them.
    pub fn is_custom(&self) -> bool {
        self.custom.is_some()
    }

    pub fn instantiate(&self) -> Option<ObjectRef> {
        self.construct.as_ref().map(|construct| construct())
    }

    pub fn serialize(&self, obj: &ObjectRef) -> Result<Fields> {
        let any = obj.borrow_any();
        if let Some((ser, _)) = &self.custom {
            return ser(&*any).unwrap_or_else(|| Err(self.foreign(obj)));
        }
        let mut fields = Fields::with_capacity(self.fields.len());
        for decl in &self.fields {
            let value = decl.read_any(&*any, obj.named_type())?;
            fields.put(FieldContext::new(decl.id.clone(), value));
        }
        Ok(fields)
    }

    /// Hands `fields` to the type's own mapping. Only for custom schemas.
    pub fn deserialize_custom(&self, obj: &ObjectRef, fields: Fields) -> Result<()> {
        let (_, de) = self.custom.as_ref().ok_or_else(|| {
            YggError::config(format!("{} does not map its own fields", self.ty))
        })?;
        let mut any = obj.borrow_any_mut();
        de(&mut *any, fields).unwrap_or_else(|| Err(self.foreign(obj)))
    }

    pub fn missing_hook(&self, obj: &ObjectRef, decl: &FieldDecl) -> Result<bool> {
        match &self.on_missing {
            Some(hook) => hook(&mut *obj.borrow_any_mut(), decl),
            None => Ok(false),
        }
    }

    pub fn excessive_hook(&self, obj: &ObjectRef, ctx: &FieldContext) -> Result<bool> {
        match &self.on_excessive {
            Some(hook) => hook(&mut *obj.borrow_any_mut(), ctx),
            None => Ok(false),
        }
    }

    pub fn incompatible_hook(&self, obj: &ObjectRef, ctx: &FieldContext) -> Result<bool> {
        match &self.on_incompatible {
            Some(hook) => hook(&mut *obj.borrow_any_mut(), ctx),
            None => Ok(false),
        }
    }

    fn foreign(&self, obj: &ObjectRef) -> YggError {
        YggError::not_serializable(format!(
            "schema of {} applied to {}",
            self.ty,
            obj.named_type()
        ))
    }
}

/// Declares the [`Schema`] of `T`.
///
/// ```ignore
/// let schema = Schema::builder::<Point>()
///     .constructible()
///     .primitive("x", |p| p.x, |p, v| p.x = v)
///     .primitive("y", |p| p.y, |p, v| p.y = v)
///     .build()?;
/// ```
pub struct SchemaBuilder<T> {
    schema: Schema,
    ancestors: Vec<FieldDecl>,
    errors: Vec<String>,
    _t: PhantomData<fn(T) -> T>,
}

impl<T: 'static> Default for SchemaBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> SchemaBuilder<T> {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                ty: NamedType::of::<T>(),
                fields: vec![],
                construct: None,
                custom: None,
                on_missing: None,
                on_excessive: None,
                on_incompatible: None,
            },
            ancestors: vec![],
            errors: vec![],
            _t: PhantomData,
        }
    }

    /* construction */

    pub fn constructible(self) -> Self
    where
        T: Default,
    {
        self.factory(T::default)
    }

    pub fn factory(mut self, factory: impl Fn() -> T + 'static) -> Self {
        self.schema.construct = Some(Rc::new(move || ObjectRef::new(factory())));
        self
    }

    /* fields */

    fn push(mut self, id: &str, kind: FieldKind, get: Getter, set: Setter) -> Self {
        self.schema.fields.push(FieldDecl {
            id: id.to_owned(),
            kind,
            get,
            set,
        });
        self
    }

    pub fn primitive<V: PrimitiveField>(
        self,
        id: &str,
        get: impl Fn(&T) -> V + 'static,
        set: impl Fn(&mut T, V) + 'static,
    ) -> Self {
        let getter: Getter = Rc::new(move |any| {
            let t = any.downcast_ref::<T>()?;
            Some(FieldValue::Primitive(get(t).into_primitive()))
        });
        let setter: Setter = Rc::new(move |any, value| {
            let Some(t) = any.downcast_mut::<T>() else {
                return Err(value);
            };
            match value {
                FieldValue::Primitive(p) => match V::from_primitive(p) {
                    Some(v) => {
                        set(t, v);
                        Ok(())
                    }
                    None => Err(FieldValue::Primitive(p)),
                },
                value => Err(value),
            }
        });
        self.push(id, FieldKind::Primitive(V::KIND), getter, setter)
    }

    pub fn object<V: ObjectField + 'static>(
        self,
        id: &str,
        get: impl Fn(&T) -> V + 'static,
        set: impl Fn(&mut T, V) + 'static,
    ) -> Self {
        self.object_typed(id, V::declared_type(), get, set)
    }

    /// An object field whose declared type is narrower than `V` can express, such as an
    /// array of a given component.
    pub fn object_typed<V: ObjectField + 'static>(
        self,
        id: &str,
        declared: Type,
        get: impl Fn(&T) -> V + 'static,
        set: impl Fn(&mut T, V) + 'static,
    ) -> Self {
        let getter: Getter = Rc::new(move |any| {
            let t = any.downcast_ref::<T>()?;
            Some(FieldValue::Object(get(t).into_value()))
        });
        let accepted = declared.clone();
        let setter: Setter = Rc::new(move |any, value| {
            let Some(t) = any.downcast_mut::<T>() else {
                return Err(value);
            };
            match value {
                FieldValue::Object(v) if accepted.accepts(&v) => match V::from_value(v) {
                    Ok(v) => {
                        set(t, v);
                        Ok(())
                    }
                    Err(v) => Err(FieldValue::Object(v)),
                },
                value => Err(value),
            }
        });
        self.push(id, FieldKind::Object(declared), getter, setter)
    }

    /// A nullable handle to an instance of `R`.
    pub fn reference<R: 'static>(
        self,
        id: &str,
        get: impl Fn(&T) -> Option<ObjectRef> + 'static,
        set: impl Fn(&mut T, Option<ObjectRef>) + 'static,
    ) -> Self {
        self.object_typed(id, Type::named::<R>(), get, set)
    }

    /// A non-null constant of a native enum.
    pub fn enumeration<E: NativeEnum>(
        self,
        id: &str,
        get: impl Fn(&T) -> E + 'static,
        set: impl Fn(&mut T, E) + 'static,
    ) -> Self {
        let getter: Getter = Rc::new(move |any| {
            let t = any.downcast_ref::<T>()?;
            Some(FieldValue::Object(Value::Enum(get(t).to_constant())))
        });
        let setter: Setter = Rc::new(move |any, value| {
            let Some(t) = any.downcast_mut::<T>() else {
                return Err(value);
            };
            let native = match &value {
                FieldValue::Object(Value::Enum(constant)) => E::from_constant(constant),
                _ => None,
            };
            match native {
                Some(e) => {
                    set(t, e);
                    Ok(())
                }
                None => Err(value),
            }
        });
        self.push(id, FieldKind::Object(Type::Named(E::named_type())), getter, setter)
    }

    /// Splices in the fields of an ancestor, reached through `project`/`project_mut`.
    /// Ancestor fields come after the type's own fields.
    pub fn extends<P: 'static>(
        mut self,
        parent: &Schema,
        project: fn(&T) -> &P,
        project_mut: fn(&mut T) -> &mut P,
    ) -> Self {
        if !parent.ty.is::<P>() {
            self.errors.push(format!(
                "{} cannot extend the schema of {} through a projection to {}",
                self.schema.ty,
                parent.ty,
                std::any::type_name::<P>()
            ));
            return self;
        }
        if parent.is_custom() {
            self.errors.push(format!(
                "{} cannot extend {}, which maps its own fields",
                self.schema.ty, parent.ty
            ));
            return self;
        }
        for decl in &parent.fields {
            self.ancestors.push(decl.project(project, project_mut));
        }
        self
    }

    /* recovery hooks */

    pub fn on_missing(mut self, hook: impl Fn(&mut T, &FieldDecl) -> Result<bool> + 'static) -> Self {
        self.schema.on_missing = Some(Rc::new(move |any, decl| match any.downcast_mut::<T>() {
            Some(t) => hook(t, decl),
            None => Ok(false),
        }));
        self
    }

    pub fn on_excessive(
        mut self,
        hook: impl Fn(&mut T, &FieldContext) -> Result<bool> + 'static,
    ) -> Self {
        self.schema.on_excessive = Some(wrap_context_hook(hook));
        self
    }

    pub fn on_incompatible(
        mut self,
        hook: impl Fn(&mut T, &FieldContext) -> Result<bool> + 'static,
    ) -> Self {
        self.schema.on_incompatible = Some(wrap_context_hook(hook));
        self
    }

    /* self-managed mapping */

    pub fn custom(
        mut self,
        serialize: impl Fn(&T) -> Result<Fields> + 'static,
        deserialize: impl Fn(&mut T, Fields) -> Result<()> + 'static,
    ) -> Self {
        let ser: CustomSer = Rc::new(move |any| any.downcast_ref::<T>().map(&serialize));
        let de: CustomDe = Rc::new(move |any, fields| {
            let t = any.downcast_mut::<T>()?;
            Some(deserialize(t, fields))
        });
        self.schema.custom = Some((ser, de));
        self
    }

    pub fn build(mut self) -> Result<Schema> {
        if let Some(e) = self.errors.into_iter().next() {
            return Err(YggError::config(e));
        }
        if self.schema.custom.is_some() && !(self.schema.fields.is_empty() && self.ancestors.is_empty()) {
            return Err(YggError::config(format!(
                "{} maps its own fields and cannot also declare them",
                self.schema.ty
            )));
        }
        self.schema.fields.append(&mut self.ancestors);
        let mut ids = HashSet::new();
        for decl in &self.schema.fields {
            if !ids.insert(decl.id.as_str()) {
                return Err(YggError::config(format!(
                    "{}: duplicate field id '{}'",
                    self.schema.ty, decl.id
                )));
            }
        }
        Ok(self.schema)
    }
}

fn wrap_context_hook<T: 'static>(
    hook: impl Fn(&mut T, &FieldContext) -> Result<bool> + 'static,
) -> ContextHook {
    Rc::new(move |any, ctx| match any.downcast_mut::<T>() {
        Some(t) => hook(t, ctx),
        None => Ok(false),
    })
}
