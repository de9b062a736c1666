use super::helpers::*;
use anyhow::Result;
use itertools::Itertools;
use yggdrasil_engine::Yggdrasil;
use yggdrasil_types::types::{ArrayRef, EnumConstant, NamedType, NativeEnum, Type, Value};

fn as_constant(value: Value) -> EnumConstant {
    match value {
        Value::Enum(constant) => constant,
        other => panic!("not an enum constant: {other:?}"),
    }
}

#[test]
fn native_constants() -> Result<()> {
    init_logger();
    let ygg = engine()?;
    let colors = Color::CONSTANTS.iter().map(|c| Value::from(c.to_constant())).collect_vec();
    let arr = ArrayRef::new(Type::Named(Color::named_type()), colors.clone());

    let bytes = write_one(&ygg, &arr.into())?;
    let back = read_one(&ygg, &bytes)?;
    let back = back.as_array().unwrap().to_vec();
    assert_eq!(back, colors);
    let natives = back
        .iter()
        .filter_map(|v| match v {
            Value::Enum(constant) => Color::from_constant(constant),
            _ => None,
        })
        .collect_vec();
    assert_eq!(natives, Color::CONSTANTS);
    Ok(())
}

#[test]
fn constants_are_written_once() -> Result<()> {
    init_logger();
    let ygg = engine()?;
    let blue = Value::from(Color::Blue.to_constant());
    let arr = ArrayRef::new(Type::Any, vec![blue.clone(), blue.clone(), blue]);
    let bytes = write_one(&ygg, &arr.into())?;
    assert_eq!(bytes.windows(4).filter(|w| *w == b"blue").count(), 1);
    Ok(())
}

/// An open enumeration standing in for an older `Color` that had more constants.
struct LegacyColor;

fn legacy_engine(constants: &[&str]) -> Result<Yggdrasil> {
    let ty = NamedType::enumeration::<LegacyColor>();
    let mut ygg = Yggdrasil::new();
    ygg.register_pseudo_enum(ty, "Color")?;
    for name in constants {
        ygg.register_constant(ty, name)?;
    }
    Ok(ygg)
}

#[test]
fn removed_native_constants() -> Result<()> {
    init_logger();
    let old = legacy_engine(&["red", "purple", "orange"])?;
    let ty = NamedType::enumeration::<LegacyColor>();
    let current = engine()?;

    let purple = old.enums().lookup(&ty, "purple").unwrap();
    let back = read_one(&current, &write_one(&old, &purple.into())?)?;
    let back = as_constant(back);
    assert_eq!(Color::from_constant(&back), Some(Color::Blue));

    let orange = old.enums().lookup(&ty, "orange").unwrap();
    let bytes = write_one(&old, &orange.into())?;
    let mut input = current.new_reader(&bytes[..])?;
    assert!(input.read_object().unwrap_err().is_corrupted());
    Ok(())
}

#[test]
fn pseudo_enums_match_by_name() -> Result<()> {
    init_logger();
    let current = engine()?;
    let ty = biome_type();
    assert_eq!(
        current.enums().values(&ty).unwrap().iter().map(|c| c.name()).collect_vec(),
        vec!["plains", "desert"]
    );

    // another program registered the same constants in the opposite order
    let mut other = Yggdrasil::new();
    other.register_pseudo_enum(ty, "Biome")?;
    let desert = other.register_constant(ty, "desert")?;
    other.register_constant(ty, "plains")?;
    assert_eq!(desert.ordinal(), 0);

    let back = read_one(&current, &write_one(&other, &desert.clone().into())?)?;
    let back = as_constant(back);
    assert_eq!(back.name(), "desert");
    assert_eq!(back.ordinal(), 1);
    assert_eq!(back, desert);
    Ok(())
}

#[test]
fn enum_registration_errors() -> Result<()> {
    init_logger();
    let mut ygg = engine()?;
    assert!(ygg.register_constant(Color::named_type(), "purple").unwrap_err().is_config());
    assert!(ygg.register_constant(biome_type(), "desert").unwrap_err().is_config());
    assert!(ygg.register_enum::<Color>("Colour").unwrap_err().is_config());
    assert!(ygg
        .register_pseudo_enum(NamedType::of::<LegacyColor>(), "Legacy")
        .unwrap_err()
        .is_config());

    // a constant the engine does not know is never written
    let stray = legacy_engine(&["teal"])?
        .enums()
        .lookup(&NamedType::enumeration::<LegacyColor>(), "teal")
        .unwrap();
    let mut out = ygg.new_writer(vec![])?;
    assert!(out.write(stray).unwrap_err().is_not_serializable());
    Ok(())
}

#[test]
fn enum_ids_are_not_objects() -> Result<()> {
    init_logger();
    let ygg = engine()?;
    // object tag naming an enum type
    let mut bytes = vec![0x59, 0x67, 0x67, 0x00, 0x00, 0x02, 0x80, 0x05];
    bytes.extend_from_slice(b"Color");
    bytes.push(0x80);
    let mut input = ygg.new_reader(&bytes[..])?;
    assert!(input.read_object().unwrap_err().is_corrupted());

    // enum tag naming a composite type
    let mut bytes = vec![0x59, 0x67, 0x67, 0x00, 0x00, 0x02, 0x40, 0x06];
    bytes.extend_from_slice(b"Entity");
    bytes.extend_from_slice(&[0x03, b'r', b'e', b'd']);
    let mut input = ygg.new_reader(&bytes[..])?;
    assert!(input.read_object().unwrap_err().is_corrupted());
    Ok(())
}

#[test]
fn enum_descriptors_built_as_plain_types() -> Result<()> {
    init_logger();
    let ygg = engine()?;
    let color = Type::named::<Color>();
    let red = Value::from(Color::Red.to_constant());

    let back = round_trip(&ygg, &Value::Class(color.clone()))?;
    assert_eq!(back, Value::Class(color.clone()));

    let arr = ArrayRef::new(color.clone(), vec![red.clone(), Value::Null]);
    let back = round_trip(&ygg, &arr.into())?;
    let back = back.as_array().unwrap();
    assert_eq!(back.component(), color);
    assert_eq!(back.to_vec(), vec![red, Value::Null]);
    Ok(())
}
