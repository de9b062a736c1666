use crate::Yggdrasil;
use log::{debug, trace};
use std::collections::HashMap;
use std::io::Write;
use yggdrasil_types::serde::{Primitive, Tag, UnsignedInt, UnsignedShort, MAGIC_NUMBER};
use yggdrasil_types::types::{ArrayRef, EnumConstant, FieldValue, ObjectRef, Type, Value};
use yggdrasil_types::{Result, YggError};

/// What the writer deduplicates on.
#[derive(PartialEq, Eq, Hash)]
enum Identity {
    Object(usize),
    Array(usize),
    Enum(EnumConstant),
    Class(Type),
}

#[derive(Clone, Copy)]
enum Slot {
    Ready(u32),
    /// An object that can only be created from its complete fields, while they are written.
    Pending,
}

struct Written {
    slot: Slot,
    /// Keeps the address in use for as long as the identity is in the table.
    _keep: Value,
}

/// Writes values to a byte sink, one stream per instance.
///
/// Every value written through the same stream shares one reference table, so a handle
/// written twice is encoded in full once and as a reference afterwards.
pub struct OutputStream<'y, W: Write> {
    ygg: &'y Yggdrasil,
    w: W,
    version: u16,
    w_len: usize,

    written: HashMap<Identity, Written>,
    next_object_id: u32,

    short_strings: HashMap<String, u32>,
    next_short_string_id: u32,
}

impl<'y, W: Write> OutputStream<'y, W> {
    pub(crate) fn new(ygg: &'y Yggdrasil, w: W) -> Result<Self> {
        let version = ygg.version();
        let mut out = Self {
            ygg,
            w,
            version,
            w_len: 0,
            written: HashMap::new(),
            next_object_id: 0,
            short_strings: HashMap::new(),
            next_short_string_id: 0,
        };

        /* header */
        out.put(&MAGIC_NUMBER.to_be_bytes())?;
        out.put(&version.to_be_bytes())?;

        debug!("opened output stream, version {version}");
        Ok(out)
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn bytes_written(&self) -> usize {
        self.w_len
    }

    pub fn write(&mut self, value: impl Into<Value>) -> Result<()> {
        self.write_object(&value.into())
    }

    pub fn write_object(&mut self, value: &Value) -> Result<()> {
        trace!("write {value:?}");
        let identity = match value {
            Value::Null => return self.put_tag(Tag::Null),
            Value::Primitive(_) | Value::String(_) => None,
            Value::Array(arr) => Some(Identity::Array(arr.addr())),
            Value::Enum(constant) => Some(Identity::Enum(constant.clone())),
            Value::Class(ty) => Some(Identity::Class(ty.clone())),
            Value::Object(obj) => Some(Identity::Object(obj.addr())),
        };
        let seen = identity.as_ref().and_then(|i| self.written.get(i)).map(|w| w.slot);
        if let Some(slot) = seen {
            return match slot {
                Slot::Ready(id) => self.write_reference(id),
                Slot::Pending => Err(YggError::not_serializable(format!(
                    "{value:?} cannot be instantiated before its fields are read, \
                     but is referenced from its own fields"
                ))),
            };
        }

        let id = self.next_object_id;
        if id > UnsignedInt::MAX {
            return Err(YggError::not_serializable("too many objects in one stream"));
        }
        self.next_object_id += 1;
        if let Some(identity) = identity {
            let written = Written {
                slot: Slot::Ready(id),
                _keep: value.clone(),
            };
            self.written.insert(identity, written);
        }

        match value {
            Value::Null => self.put_tag(Tag::Null),
            Value::Primitive(p) => {
                self.put_tag(p.kind().wrapper_tag())?;
                self.put_primitive(p)
            }
            Value::String(s) => self.write_string(s),
            Value::Array(arr) => self.write_array(arr),
            Value::Enum(constant) => self.write_enum(constant),
            Value::Class(ty) => {
                self.put_tag(Tag::Class)?;
                self.write_class_desc(ty)
            }
            Value::Object(obj) => self.write_generic_object(obj, id),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.w.flush()?;
        Ok(())
    }

    /// Flushes and hands back the sink.
    pub fn finish(mut self) -> Result<W> {
        self.w.flush()?;
        debug!(
            "closed output stream, {} bytes, {} objects",
            self.w_len, self.next_object_id
        );
        Ok(self.w)
    }

    /* raw output */

    fn put(&mut self, buf: &[u8]) -> Result<()> {
        self.w.write_all(buf)?;
        self.w_len += buf.len();
        Ok(())
    }

    fn put_tag(&mut self, tag: Tag) -> Result<()> {
        self.w_len += tag.ser(&mut self.w)?;
        Ok(())
    }

    fn put_primitive(&mut self, p: &Primitive) -> Result<()> {
        self.w_len += p.ser(&mut self.w)?;
        Ok(())
    }

    fn put_len(&mut self, len: usize, what: &str) -> Result<()> {
        let len = UnsignedInt::new(len)
            .ok_or_else(|| YggError::not_serializable(format!("{what} is too long ({len})")))?;
        self.w_len += len.ser(&mut self.w)?;
        Ok(())
    }

    /// Writes a type id, field id or enum constant id.
    fn write_short_string(&mut self, s: &str) -> Result<()> {
        if let Some(&id) = self.short_strings.get(s) {
            self.put_tag(Tag::Reference)?;
            if self.version <= 1 {
                self.put(&id.to_be_bytes())?;
            } else {
                self.put_len(id as usize, "short string table")?;
            }
            return Ok(());
        }
        let bytes = s.as_bytes();
        if bytes.len() >= Tag::Reference.byte() as usize {
            return Err(YggError::not_serializable(format!(
                "field id or type id too long: {s}"
            )));
        }
        self.put(&[bytes.len() as u8])?;
        self.put(bytes)?;
        if bytes.len() > 4 {
            if self.next_short_string_id > UnsignedInt::MAX {
                return Err(YggError::not_serializable("too many field ids and type ids"));
            }
            self.short_strings.insert(s.to_owned(), self.next_short_string_id);
            self.next_short_string_id += 1;
        }
        Ok(())
    }

    fn write_reference(&mut self, id: u32) -> Result<()> {
        trace!("reference #{id}");
        self.put_tag(Tag::Reference)?;
        self.put_len(id as usize, "reference")
    }

    /* values */

    fn write_string(&mut self, s: &str) -> Result<()> {
        self.put_tag(Tag::String)?;
        self.put_len(s.len(), "string")?;
        self.put(s.as_bytes())
    }

    fn write_array(&mut self, arr: &ArrayRef) -> Result<()> {
        let (component, items) = {
            let arr = arr.borrow();
            (arr.component.clone(), arr.items.clone())
        };
        for item in &items {
            let fits = match &component {
                Type::Primitive(kind) => matches!(item, Value::Primitive(p) if p.kind() == *kind),
                component => component.accepts(item),
            };
            if !fits {
                return Err(YggError::not_serializable(format!(
                    "{component}[] holds {item:?}"
                )));
            }
        }

        self.put_tag(Tag::Array)?;
        self.write_class_desc(&component)?;
        self.put_len(items.len(), "array")?;
        for item in &items {
            match item {
                Value::Primitive(p) if component.is_primitive() => self.put_primitive(p)?,
                item => self.write_object(item)?,
            }
        }
        Ok(())
    }

    fn write_enum(&mut self, constant: &EnumConstant) -> Result<()> {
        let ty = constant.declaring_type();
        let type_id = self.ygg.type_id(&Type::Named(ty))?;
        if self.ygg.enums().lookup(&ty, constant.name()).is_none() {
            return Err(YggError::not_serializable(format!(
                "{constant:?} is not registered"
            )));
        }
        self.put_tag(Tag::Enum)?;
        self.write_short_string(&type_id)?;
        self.write_short_string(constant.name())
    }

    /// One array tag per dimension, then the base tag and, for named bases, the id.
    fn write_class_desc(&mut self, ty: &Type) -> Result<()> {
        let (dims, base) = ty.base();
        let base_id = match base {
            Type::Any | Type::Named(_) => Some(self.ygg.type_id(base)?),
            _ => None,
        };
        for _ in 0..dims {
            self.put_tag(Tag::Array)?;
        }
        self.put_tag(self.ygg.tag_of(base))?;
        if let Some(id) = base_id {
            self.write_short_string(&id)?;
        }
        Ok(())
    }

    fn write_generic_object(&mut self, obj: &ObjectRef, id: u32) -> Result<()> {
        let ygg = self.ygg;
        let ty = obj.named_type();
        let type_id = ygg.type_id(&Type::Named(ty))?;

        let (fields, instantiable) = if let Some(s) = ygg.serializer_for(&ty) {
            (s.serialize(obj)?, s.can_be_instantiated(&ty))
        } else if let Some(schema) = ygg.schema(&ty) {
            if !schema.is_constructible() {
                return Err(YggError::not_serializable(format!(
                    "{ty} has no construction path"
                )));
            }
            (schema.serialize(obj)?, true)
        } else {
            return Err(YggError::not_serializable(format!(
                "{ty} has neither a serializer nor a schema"
            )));
        };
        let count = UnsignedShort::new(fields.len()).ok_or_else(|| {
            YggError::not_serializable(format!("{ty} has too many fields ({})", fields.len()))
        })?;

        let identity = Identity::Object(obj.addr());
        if !instantiable {
            if let Some(written) = self.written.get_mut(&identity) {
                written.slot = Slot::Pending;
            }
        }

        self.put_tag(Tag::Object)?;
        self.write_short_string(&type_id)?;
        self.w_len += count.ser(&mut self.w)?;
        for ctx in fields {
            self.write_short_string(ctx.id())?;
            match ctx.into_value() {
                FieldValue::Primitive(p) => {
                    self.put_tag(p.kind().tag())?;
                    self.put_primitive(&p)?;
                }
                FieldValue::Object(v) => self.write_object(&v)?,
            }
        }

        if !instantiable {
            if let Some(written) = self.written.get_mut(&identity) {
                written.slot = Slot::Ready(id);
            }
        }
        Ok(())
    }
}
