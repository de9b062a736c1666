use crate::resolver::Resolver;
use crate::schema::{FieldDecl, Schema};
use crate::{
    ClassResolver, FieldHandler, InputStream, OutputStream, Serializer, SimpleClassResolver,
    StdSerializer,
};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use yggdrasil_types::serde::{Tag, LATEST_VERSION};
use yggdrasil_types::types::{
    EnumConstant, EnumRegistry, FieldContext, Fields, NamedType, NativeEnum, ObjectField,
    ObjectRef, Type, Value,
};
use yggdrasil_types::{Result, YggError};

/// The engine: resolver chain, schemas, enum tables and field handlers of one dialect.
///
/// Populate it once at start-up, then create any number of short-lived streams from it.
pub struct Yggdrasil {
    version: u16,
    resolvers: Vec<Resolver>,
    simple: SimpleClassResolver,
    schemas: HashMap<NamedType, Schema>,
    enums: EnumRegistry,
    handlers: Vec<Box<dyn FieldHandler>>,
}

impl Default for Yggdrasil {
    fn default() -> Self {
        Self::new()
    }
}

impl Yggdrasil {
    pub fn new() -> Self {
        Self {
            version: LATEST_VERSION,
            resolvers: vec![Resolver::Serializer(Box::new(StdSerializer)), Resolver::Simple],
            simple: SimpleClassResolver::default(),
            schemas: HashMap::new(),
            enums: EnumRegistry::default(),
            handlers: vec![],
        }
    }

    /// An engine whose writers produce an older format version.
    pub fn with_version(version: u16) -> Result<Self> {
        if version == 0 || version > LATEST_VERSION {
            return Err(YggError::config(format!(
                "unsupported version {version}, expected 1..={LATEST_VERSION}"
            )));
        }
        Ok(Self {
            version,
            ..Self::new()
        })
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn new_writer<W: Write>(&self, w: W) -> Result<OutputStream<'_, W>> {
        OutputStream::new(self, w)
    }

    pub fn new_reader<R: Read>(&self, r: R) -> Result<InputStream<'_, R>> {
        InputStream::new(self, r)
    }

    /* registration */

    pub fn register_class_resolver(&mut self, resolver: impl ClassResolver + 'static) {
        debug!("registering class resolver #{}", self.resolvers.len());
        self.resolvers.push(Resolver::Plain(Box::new(resolver)));
    }

    pub fn register_serializer(&mut self, serializer: impl Serializer + 'static) {
        debug!("registering serializer #{}", self.resolvers.len());
        self.resolvers.push(Resolver::Serializer(Box::new(serializer)));
    }

    pub fn register_field_handler(&mut self, handler: impl FieldHandler + 'static) {
        debug!("registering field handler #{}", self.handlers.len());
        self.handlers.push(Box::new(handler));
    }

    fn check_id(&self, ty: &NamedType, id: &str) -> Result<()> {
        if id == Type::ANY_ID || Tag::by_name(id).is_some() {
            return Err(YggError::config(format!("id '{id}' is reserved")));
        }
        if id.is_empty() || id.len() >= Tag::Reference.byte() as usize {
            return Err(YggError::config(format!(
                "id '{id}' must be between 1 and {} bytes long",
                Tag::Reference.byte() - 1
            )));
        }
        if let Some(prev) = self.chain_type(id) {
            if prev != *ty {
                return Err(YggError::config(format!(
                    "id '{id}' already maps to {prev}, cannot map it to {ty}"
                )));
            }
        }
        if let Some(prev) = self.chain_id(ty) {
            if prev != id {
                return Err(YggError::config(format!(
                    "{ty} already has id '{prev}', cannot give it id '{id}'"
                )));
            }
        }
        Ok(())
    }

    /// Gives a type an id without a schema, for types whose instances are handled by a
    /// serializer or which are only used as class values.
    pub fn register_type(&mut self, ty: NamedType, id: &str) -> Result<()> {
        self.check_id(&ty, id)?;
        self.simple.register(ty, id)?;
        debug!("registered {ty} as '{id}'");
        Ok(())
    }

    pub fn register_class(&mut self, id: &str, schema: Schema) -> Result<()> {
        let ty = schema.named_type();
        if self.schemas.contains_key(&ty) {
            return Err(YggError::config(format!("{ty} already has a schema")));
        }
        self.register_type(ty, id)?;
        self.schemas.insert(ty, schema);
        Ok(())
    }

    pub fn register_enum<E: NativeEnum>(&mut self, id: &str) -> Result<()> {
        let ty = E::named_type();
        self.check_id(&ty, id)?;
        self.enums.declare_native::<E>()?;
        self.register_type(ty, id)
    }

    /// Declares an open enumeration. Its constants are added with [`Self::register_constant`].
    pub fn register_pseudo_enum(&mut self, ty: NamedType, id: &str) -> Result<()> {
        self.check_id(&ty, id)?;
        self.enums.declare_open(ty)?;
        self.register_type(ty, id)
    }

    pub fn register_constant(&mut self, ty: NamedType, name: &str) -> Result<EnumConstant> {
        let constant = self.enums.register(ty, name)?;
        debug!("registered constant {constant:?} #{}", constant.ordinal());
        Ok(constant)
    }

    /* lookups */

    pub fn enums(&self) -> &EnumRegistry {
        &self.enums
    }

    pub fn schema(&self, ty: &NamedType) -> Option<&Schema> {
        self.schemas.get(ty)
    }

    /// The first serializer in the chain that resolves `ty`.
    pub fn serializer_for(&self, ty: &NamedType) -> Option<&dyn Serializer> {
        self.resolvers.iter().find_map(|r| match r {
            Resolver::Serializer(s) if s.id_of(ty).is_some() => Some(s.as_ref()),
            _ => None,
        })
    }

    fn chain_id(&self, ty: &NamedType) -> Option<String> {
        self.resolvers.iter().find_map(|r| match r {
            Resolver::Plain(r) => r.id_of(ty),
            Resolver::Serializer(s) => s.id_of(ty),
            Resolver::Simple => self.simple.id_of(ty),
        })
    }

    fn chain_type(&self, id: &str) -> Option<NamedType> {
        self.resolvers.iter().find_map(|r| match r {
            Resolver::Plain(r) => r.type_of(id),
            Resolver::Serializer(s) => s.type_of(id),
            Resolver::Simple => self.simple.type_of(id),
        })
    }

    /// The identifier written for a named type, or `"Object"` for the untyped root.
    pub fn type_id(&self, ty: &Type) -> Result<String> {
        match ty {
            Type::Any => Ok(Type::ANY_ID.to_owned()),
            Type::Named(named) => self
                .chain_id(named)
                .ok_or_else(|| YggError::not_serializable(format!("no id found for {named}"))),
            ty => Err(YggError::not_serializable(format!(
                "{ty} is identified by its tag, not by an id"
            ))),
        }
    }

    pub fn type_by_name(&self, id: &str) -> Result<Type> {
        if id == Type::ANY_ID {
            return Ok(Type::Any);
        }
        self.chain_type(id)
            .map(Type::Named)
            .ok_or_else(|| YggError::not_serializable(format!("no type found for id '{id}'")))
    }

    /// The tag a class descriptor of `ty` is written under.
    ///
    /// Named types are classified by what this engine registered for them, not by the
    /// kind carried in the descriptor.
    pub fn tag_of(&self, ty: &Type) -> Tag {
        match ty {
            Type::Named(named) if self.enums.contains_type(named) => Tag::Enum,
            Type::Named(_) => Tag::Object,
            ty => Tag::from(ty),
        }
    }

    /// Whether values of `ty` can be both written and read back.
    pub fn is_serializable(&self, ty: &Type) -> bool {
        match ty {
            Type::Primitive(_) | Type::Wrapper(_) | Type::String | Type::Class | Type::Any => true,
            Type::Array(component) => self.is_serializable(component),
            Type::Named(named) => {
                if self.chain_id(named).is_none() {
                    return false;
                }
                if self.enums.contains_type(named) {
                    return true;
                }
                if let Some(s) = self.serializer_for(named) {
                    if s.can_be_instantiated(named) {
                        return s.new_instance(named).is_ok();
                    }
                    // empty fields may be rejected as corrupt, any other failure means the
                    // plugin cannot build this type at all
                    return match s.deserialize_new(named, Fields::new()) {
                        Ok(_) => true,
                        Err(e) => e.is_corrupted(),
                    };
                }
                self.schemas.get(named).is_some_and(Schema::is_constructible)
            }
        }
    }

    /* schema evolution */

    pub(crate) fn set_fields(&self, schema: &Schema, obj: &ObjectRef, mut fields: Fields) -> Result<()> {
        for decl in schema.fields() {
            match fields.take(decl.id()) {
                None => self.missing_field(schema, obj, decl)?,
                Some(ctx) => {
                    let id = ctx.id().to_owned();
                    if let Err(value) = decl.assign(obj, ctx.into_value()) {
                        let ctx = FieldContext::new(id, value);
                        self.incompatible_field(schema, obj, decl, &ctx)?;
                    }
                }
            }
        }
        for ctx in fields {
            self.excessive_field(schema, obj, &ctx)?;
        }
        Ok(())
    }

    fn missing_field(&self, schema: &Schema, obj: &ObjectRef, decl: &FieldDecl) -> Result<()> {
        if schema.missing_hook(obj, decl)? {
            return Ok(());
        }
        for handler in &self.handlers {
            if handler.missing_field(obj, decl)? {
                return Ok(());
            }
        }
        warn!("missing field {} in {} was not handled", decl.id(), obj.named_type());
        Err(YggError::corrupted(format!(
            "missing field {} in {} was not handled",
            decl.id(),
            obj.named_type()
        )))
    }

    fn excessive_field(&self, schema: &Schema, obj: &ObjectRef, ctx: &FieldContext) -> Result<()> {
        if schema.excessive_hook(obj, ctx)? {
            return Ok(());
        }
        for handler in &self.handlers {
            if handler.excessive_field(obj, ctx)? {
                return Ok(());
            }
        }
        warn!("excessive field {} in {} was not handled", ctx.id(), obj.named_type());
        Err(YggError::corrupted(format!(
            "excessive field {} in {} was not handled",
            ctx.id(),
            obj.named_type()
        )))
    }

    fn incompatible_field(
        &self,
        schema: &Schema,
        obj: &ObjectRef,
        decl: &FieldDecl,
        ctx: &FieldContext,
    ) -> Result<()> {
        if schema.incompatible_hook(obj, ctx)? {
            return Ok(());
        }
        for handler in &self.handlers {
            if handler.incompatible_field(obj, decl, ctx)? {
                return Ok(());
            }
        }
        let found = ctx
            .value()
            .type_of()
            .map_or("null".to_owned(), |ty| ty.to_string());
        warn!(
            "incompatible field {} in {} holding {found} was not handled",
            decl.id(),
            obj.named_type()
        );
        Err(YggError::corrupted(format!(
            "incompatible field {} in {}: declared {}, but the stream holds {found}",
            decl.id(),
            obj.named_type(),
            decl.declared_type()
        )))
    }

    /* files */

    pub fn save_to_file(&self, value: &Value, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut out = self.new_writer(BufWriter::new(file))?;
        out.write_object(value)?;
        out.finish()?;
        debug!("saved {}", path.as_ref().display());
        Ok(())
    }

    pub fn load_from_file<T: ObjectField>(&self, path: impl AsRef<Path>) -> Result<T> {
        let file = File::open(path.as_ref())?;
        let mut input = self.new_reader(BufReader::new(file))?;
        let t = input.read_object_as::<T>()?;
        input.finish()?;
        debug!("loaded {}", path.as_ref().display());
        Ok(t)
    }
}
