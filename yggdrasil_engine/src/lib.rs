//! Writes and reads graphs of Rust values in the Yggdrasil format.
//!
//! An [`Yggdrasil`] engine holds everything the format needs to know about the program's
//! types. Streams borrow it:
//!
//! ```ignore
//! let mut ygg = Yggdrasil::new();
//! ygg.register_class("Point", point_schema)?;
//!
//! let mut out = ygg.new_writer(vec![])?;
//! out.write(point)?;
//! let bytes = out.finish()?;
//!
//! let mut input = ygg.new_reader(&bytes[..])?;
//! let point = input.read_object_as::<ObjectRef>()?;
//! input.finish()?;
//! ```

mod field_handler;
mod reader;
mod resolver;
mod schema;
mod serializer;
mod std_serializer;
mod writer;
mod yggdrasil;

pub use field_handler::{CollectionFieldHandler, FieldHandler};
pub use reader::InputStream;
pub use resolver::{ClassResolver, SimpleClassResolver};
pub use schema::*;
pub use serializer::Serializer;
pub use std_serializer::{StdSerializer, ValueDeque, ValueList, ValueMap, ValueSet};
pub use writer::OutputStream;
pub use yggdrasil::Yggdrasil;
