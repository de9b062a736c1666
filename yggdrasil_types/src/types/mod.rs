mod enums;
mod field_conv;
mod fields;
mod type_desc;
mod value;

pub use enums::*;
pub use field_conv::*;
pub use fields::*;
pub use type_desc::*;
pub use value::*;
