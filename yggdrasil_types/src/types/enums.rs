use crate::types::NamedType;
use crate::{Result, YggError};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// One constant of an enumeration, native or open.
///
/// Equality is (declaring type, name). The ordinal is the registration position in the
/// current process and is never written.
#[derive(Clone)]
pub struct EnumConstant {
    ty: NamedType,
    name: Rc<str>,
    ordinal: usize,
}

impl EnumConstant {
    fn new(ty: NamedType, name: Rc<str>, ordinal: usize) -> Self {
        Self { ty, name, ordinal }
    }

    pub fn declaring_type(&self) -> NamedType {
        self.ty
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

impl PartialEq for EnumConstant {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.name == other.name
    }
}
impl Eq for EnumConstant {}
impl Hash for EnumConstant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ty.hash(state);
        self.name.hash(state);
    }
}
impl fmt::Debug for EnumConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.ty, self.name)
    }
}

/// A Rust enum whose constants can be written.
///
/// ```ignore
/// #[derive(Clone, Copy, PartialEq, Eq)]
/// enum Weather { Clear, Rain }
///
/// impl NativeEnum for Weather {
///     const CONSTANTS: &'static [Self] = &[Weather::Clear, Weather::Rain];
///     fn id(self) -> &'static str {
///         match self { Weather::Clear => "clear", Weather::Rain => "rain" }
///     }
/// }
/// ```
pub trait NativeEnum: Copy + Eq + 'static {
    const CONSTANTS: &'static [Self];

    /// Stable id written to streams. Must be unique within the enum.
    fn id(self) -> &'static str;

    /// Called when a stream names a constant that no longer exists.
    fn excessive_constant(_id: &str) -> Option<Self> {
        None
    }

    fn named_type() -> NamedType {
        NamedType::enumeration::<Self>()
    }

    fn to_constant(self) -> EnumConstant {
        let ordinal = Self::CONSTANTS.iter().position(|c| *c == self).unwrap_or(Self::CONSTANTS.len());
        EnumConstant::new(Self::named_type(), Rc::from(self.id()), ordinal)
    }

    fn from_constant(constant: &EnumConstant) -> Option<Self> {
        if constant.declaring_type() != Self::named_type() {
            return None;
        }
        Self::CONSTANTS.iter().copied().find(|c| c.id() == constant.name())
    }
}

fn native_excessive<E: NativeEnum>(id: &str) -> Option<EnumConstant> {
    E::excessive_constant(id).map(E::to_constant)
}

struct EnumTable {
    ty: NamedType,
    constants: Vec<EnumConstant>,
    by_name: HashMap<Rc<str>, usize>,
    /// Native tables are fixed at declaration.
    sealed: bool,
    excessive: Option<fn(&str) -> Option<EnumConstant>>,
}

impl EnumTable {
    fn new(ty: NamedType) -> Self {
        Self {
            ty,
            constants: vec![],
            by_name: HashMap::new(),
            sealed: false,
            excessive: None,
        }
    }

    fn push(&mut self, name: &str) -> Result<EnumConstant> {
        if self.by_name.contains_key(name) {
            return Err(YggError::config(format!(
                "duplicate constant '{name}' in {}",
                self.ty
            )));
        }
        let name: Rc<str> = Rc::from(name);
        let constant = EnumConstant::new(self.ty, name.clone(), self.constants.len());
        self.by_name.insert(name, self.constants.len());
        self.constants.push(constant.clone());
        Ok(constant)
    }
}

/// Constant tables of every enumeration an engine knows.
///
/// Open ("pseudo") enumerations start empty and grow through [`EnumRegistry::register`].
#[derive(Default)]
pub struct EnumRegistry {
    tables: HashMap<NamedType, EnumTable>,
}

impl EnumRegistry {
    pub fn declare_native<E: NativeEnum>(&mut self) -> Result<()> {
        let ty = E::named_type();
        if self.tables.contains_key(&ty) {
            return Err(YggError::config(format!("enum {ty} is already declared")));
        }
        let mut table = EnumTable::new(ty);
        for constant in E::CONSTANTS {
            table.push(constant.id())?;
        }
        table.sealed = true;
        table.excessive = Some(native_excessive::<E>);
        self.tables.insert(ty, table);
        Ok(())
    }

    pub fn declare_open(&mut self, ty: NamedType) -> Result<()> {
        if !ty.is_enum() {
            return Err(YggError::config(format!("{ty} is not an enumeration type")));
        }
        if self.tables.contains_key(&ty) {
            return Err(YggError::config(format!("enum {ty} is already declared")));
        }
        self.tables.insert(ty, EnumTable::new(ty));
        Ok(())
    }

    /// Adds a constant to an open enumeration, with the next ordinal.
    pub fn register(&mut self, ty: NamedType, name: &str) -> Result<EnumConstant> {
        let table = self
            .tables
            .get_mut(&ty)
            .ok_or_else(|| YggError::config(format!("enum {ty} is not declared")))?;
        if table.sealed {
            return Err(YggError::config(format!(
                "cannot add constant '{name}' to native enum {ty}"
            )));
        }
        table.push(name)
    }

    pub fn contains_type(&self, ty: &NamedType) -> bool {
        self.tables.contains_key(ty)
    }

    pub fn lookup(&self, ty: &NamedType, name: &str) -> Option<EnumConstant> {
        let table = self.tables.get(ty)?;
        let i = *table.by_name.get(name)?;
        table.constants.get(i).cloned()
    }

    /// Like [`Self::lookup`], then falls back to the enum's unknown-constant hook.
    pub fn resolve(&self, ty: &NamedType, name: &str) -> Result<EnumConstant> {
        let table = self
            .tables
            .get(ty)
            .ok_or_else(|| YggError::corrupted(format!("{ty} is not an enum type")))?;
        if let Some(i) = table.by_name.get(name) {
            return Ok(table.constants[*i].clone());
        }
        let fallback = table.excessive.and_then(|excessive| excessive(name));
        match fallback {
            Some(constant) if constant.declaring_type() == *ty => Ok(constant),
            Some(constant) => Err(YggError::config(format!(
                "{ty} resolved unknown constant '{name}' to a foreign constant {constant:?}"
            ))),
            None => Err(YggError::corrupted(format!(
                "enum constant '{name}' does not exist in {ty}"
            ))),
        }
    }

    pub fn values(&self, ty: &NamedType) -> Option<&[EnumConstant]> {
        self.tables.get(ty).map(|table| table.constants.as_slice())
    }

    pub fn constant(&self, ty: &NamedType, ordinal: usize) -> Option<EnumConstant> {
        self.tables.get(ty)?.constants.get(ordinal).cloned()
    }
}
