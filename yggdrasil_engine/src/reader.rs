use crate::Yggdrasil;
use log::{debug, trace};
use std::io::Read;
use yggdrasil_types::serde::{
    Primitive, PrimitiveType, Tag, UnsignedInt, UnsignedShort, LATEST_VERSION, MAGIC_NUMBER,
};
use yggdrasil_types::types::{
    ArrayRef, FieldContext, FieldValue, Fields, NamedType, ObjectField, ObjectRef, Type, Value,
};
use yggdrasil_types::{Result, YggError};

/// Upper bound on the capacity reserved up front for an array, whatever length the stream claims.
const MAX_PREALLOC: usize = 1 << 12;

/// Reads values from a byte source, one stream per instance.
pub struct InputStream<'y, R: Read> {
    ygg: &'y Yggdrasil,
    r: R,
    version: u16,
    r_len: usize,

    /// `None` while an object that is created from its fields is still being read.
    objects: Vec<Option<Value>>,
    short_strings: Vec<String>,
}

impl<'y, R: Read> InputStream<'y, R> {
    pub(crate) fn new(ygg: &'y Yggdrasil, r: R) -> Result<Self> {
        let mut input = Self {
            ygg,
            r,
            version: 0,
            r_len: 0,
            objects: vec![],
            short_strings: vec![],
        };

        /* header */
        let mut magic = [0u8; 4];
        input.take_exact(&mut magic)?;
        if u32::from_be_bytes(magic) != MAGIC_NUMBER {
            return Err(YggError::corrupted(format!(
                "not an Yggdrasil stream (magic {:08x})",
                u32::from_be_bytes(magic)
            )));
        }
        let mut version = [0u8; 2];
        input.take_exact(&mut version)?;
        let version = u16::from_be_bytes(version);
        if version == 0 || version > LATEST_VERSION {
            return Err(YggError::corrupted(format!(
                "unsupported version {version}, expected 1..={LATEST_VERSION}"
            )));
        }
        input.version = version;

        debug!("opened input stream, version {version}");
        Ok(input)
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn bytes_read(&self) -> usize {
        self.r_len
    }

    pub fn read_object(&mut self) -> Result<Value> {
        let tag = self.take_tag()?;
        self.read_tagged(tag)
    }

    /// Reads the next value and converts it, failing if the stream holds anything else.
    pub fn read_object_as<T: ObjectField>(&mut self) -> Result<T> {
        let value = self.read_object()?;
        T::from_value(value).map_err(|v| {
            YggError::corrupted(format!(
                "expected {}, but the stream holds {v:?}",
                T::declared_type()
            ))
        })
    }

    /// Checks that the whole stream was consumed.
    pub fn finish(mut self) -> Result<()> {
        let mut buf = [0u8; 1];
        if self.r.read(&mut buf)? != 0 {
            return Err(YggError::corrupted(format!(
                "trailing data after {} bytes",
                self.r_len
            )));
        }
        debug!(
            "closed input stream, {} bytes, {} objects",
            self.r_len,
            self.objects.len()
        );
        Ok(())
    }

    /* raw input */

    fn take_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.r.read_exact(buf)?;
        self.r_len += buf.len();
        Ok(())
    }

    fn take_tag(&mut self) -> Result<Tag> {
        let (r_len, tag) = Tag::deser(&mut self.r)?;
        self.r_len += r_len;
        Ok(tag)
    }

    fn take_primitive(&mut self, kind: PrimitiveType) -> Result<Primitive> {
        let (r_len, p) = Primitive::deser(kind, &mut self.r)?;
        self.r_len += r_len;
        Ok(p)
    }

    fn take_len(&mut self) -> Result<usize> {
        let (r_len, len) = UnsignedInt::deser(&mut self.r)?;
        self.r_len += r_len;
        Ok(*len as usize)
    }

    fn take_utf8(&mut self, len: usize) -> Result<String> {
        let mut buf = Vec::with_capacity(len.min(MAX_PREALLOC));
        let got = (&mut self.r).take(len as u64).read_to_end(&mut buf)?;
        self.r_len += got;
        if got != len {
            return Err(YggError::corrupted(format!(
                "premature end of stream: expected {len} bytes, got {got}"
            )));
        }
        String::from_utf8(buf).map_err(|e| YggError::corrupted(format!("invalid utf-8: {e}")))
    }

    fn read_short_string(&mut self) -> Result<String> {
        let mut first = [0u8; 1];
        self.take_exact(&mut first)?;
        if first[0] == Tag::Reference.byte() {
            let idx = if self.version <= 1 {
                let mut buf = [0u8; 4];
                self.take_exact(&mut buf)?;
                u32::from_be_bytes(buf) as usize
            } else {
                self.take_len()?
            };
            return self.short_strings.get(idx).cloned().ok_or_else(|| {
                YggError::corrupted(format!(
                    "invalid string reference {idx}, only {} known",
                    self.short_strings.len()
                ))
            });
        }
        let s = self.take_utf8(first[0] as usize)?;
        if s.len() > 4 {
            self.short_strings.push(s.clone());
        }
        Ok(s)
    }

    /* values */

    fn read_tagged(&mut self, tag: Tag) -> Result<Value> {
        trace!("read {tag} at {}", self.r_len);
        match tag {
            Tag::Null => Ok(Value::Null),
            Tag::Reference => self.read_reference(),
            Tag::String => {
                let len = self.take_len()?;
                let s = Value::String(self.take_utf8(len)?);
                Ok(self.remember(s))
            }
            Tag::Array => self.read_array(),
            Tag::Enum => self.read_enum(),
            Tag::Class => {
                let ty = self.read_class_desc()?;
                Ok(self.remember(Value::Class(ty)))
            }
            Tag::Object => self.read_generic_object(),
            tag if tag.is_wrapper() => {
                let kind = tag
                    .primitive_type()
                    .ok_or_else(|| YggError::corrupted(format!("invalid wrapper tag {tag}")))?;
                let p = Value::Primitive(self.take_primitive(kind)?);
                Ok(self.remember(p))
            }
            tag => Err(YggError::corrupted(format!(
                "primitive tag {tag} where an object is expected"
            ))),
        }
    }

    fn remember(&mut self, value: Value) -> Value {
        self.objects.push(Some(value.clone()));
        value
    }

    fn read_reference(&mut self) -> Result<Value> {
        let idx = self.take_len()?;
        match self.objects.get(idx) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(YggError::corrupted(format!(
                "reference {idx} points to an object that is still being read"
            ))),
            None => Err(YggError::corrupted(format!(
                "invalid reference {idx}, only {} objects read",
                self.objects.len()
            ))),
        }
    }

    fn resolve_type_id(&self, id: &str) -> Result<Type> {
        self.ygg
            .type_by_name(id)
            .map_err(|_| YggError::corrupted(format!("unknown type id '{id}'")))
    }

    fn read_named_type(&mut self) -> Result<NamedType> {
        let id = self.read_short_string()?;
        match self.resolve_type_id(&id)? {
            Type::Named(ty) => Ok(ty),
            _ => Err(YggError::corrupted(format!("'{id}' does not name a concrete type"))),
        }
    }

    fn read_class_desc(&mut self) -> Result<Type> {
        let mut dims = 0;
        let mut tag = self.take_tag()?;
        while tag == Tag::Array {
            dims += 1;
            tag = self.take_tag()?;
        }
        let mut ty = match tag {
            Tag::String => Type::String,
            Tag::Class => Type::Class,
            Tag::Object | Tag::Enum => {
                let id = self.read_short_string()?;
                let ty = self.resolve_type_id(&id)?;
                if self.ygg.tag_of(&ty) != tag {
                    return Err(YggError::corrupted(format!(
                        "'{id}' is not described by tag {tag}"
                    )));
                }
                ty
            }
            tag => match tag.primitive_type() {
                Some(kind) if tag.is_primitive() => Type::Primitive(kind),
                Some(kind) => Type::Wrapper(kind),
                None => {
                    return Err(YggError::corrupted(format!(
                        "tag {tag} does not start a type"
                    )))
                }
            },
        };
        for _ in 0..dims {
            ty = Type::array_of(ty);
        }
        Ok(ty)
    }

    fn read_array(&mut self) -> Result<Value> {
        let component = self.read_class_desc()?;
        let len = self.take_len()?;
        let arr = ArrayRef::new(component.clone(), Vec::with_capacity(len.min(MAX_PREALLOC)));
        let value = self.remember(Value::Array(arr.clone()));

        for _ in 0..len {
            let item = match &component {
                Type::Primitive(kind) => Value::Primitive(self.take_primitive(*kind)?),
                component => {
                    let item = self.read_object()?;
                    if !component.accepts(&item) {
                        return Err(YggError::corrupted(format!(
                            "{component}[] cannot hold {item:?}"
                        )));
                    }
                    item
                }
            };
            arr.push(item);
        }
        Ok(value)
    }

    fn read_enum(&mut self) -> Result<Value> {
        let ty = self.read_named_type()?;
        if !self.ygg.enums().contains_type(&ty) {
            return Err(YggError::corrupted(format!("{ty} is not an enumeration")));
        }
        let name = self.read_short_string()?;
        let constant = self.ygg.enums().resolve(&ty, &name)?;
        Ok(self.remember(Value::Enum(constant)))
    }

    fn read_fields(&mut self) -> Result<Fields> {
        let (r_len, count) = UnsignedShort::deser(&mut self.r)?;
        self.r_len += r_len;
        let count = *count as usize;

        let mut fields = Fields::with_capacity(count);
        for _ in 0..count {
            let id = self.read_short_string()?;
            if fields.contains(&id) {
                return Err(YggError::corrupted(format!("duplicate field {id}")));
            }
            let tag = self.take_tag()?;
            let value = match tag.primitive_type() {
                Some(kind) if tag.is_primitive() => FieldValue::Primitive(self.take_primitive(kind)?),
                _ => FieldValue::Object(self.read_tagged(tag)?),
            };
            fields.put(FieldContext::new(id, value));
        }
        Ok(fields)
    }

    fn read_generic_object(&mut self) -> Result<Value> {
        let ygg = self.ygg;
        let ty = self.read_named_type()?;
        if ygg.enums().contains_type(&ty) {
            return Err(YggError::corrupted(format!(
                "{ty} is an enumeration, but is written as an object"
            )));
        }

        if let Some(s) = ygg.serializer_for(&ty) {
            if s.can_be_instantiated(&ty) {
                let obj = s.new_instance(&ty)?;
                let value = self.remember(Value::Object(obj.clone()));
                let fields = self.read_fields()?;
                s.deserialize(&obj, fields)?;
                return Ok(value);
            }
            let slot = self.objects.len();
            self.objects.push(None);
            let fields = self.read_fields()?;
            let value = Value::Object(s.deserialize_new(&ty, fields)?);
            self.objects[slot] = Some(value.clone());
            return Ok(value);
        }

        let schema = ygg.schema(&ty).ok_or_else(|| {
            YggError::corrupted(format!("{ty} has neither a serializer nor a schema"))
        })?;
        let obj: ObjectRef = schema
            .instantiate()
            .ok_or_else(|| YggError::corrupted(format!("{ty} cannot be instantiated")))?;
        let value = self.remember(Value::Object(obj.clone()));
        let fields = self.read_fields()?;
        if schema.is_custom() {
            schema.deserialize_custom(&obj, fields)?;
        } else {
            ygg.set_fields(schema, &obj, fields)?;
        }
        Ok(value)
    }
}
