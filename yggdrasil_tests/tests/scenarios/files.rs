use super::helpers::*;
use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;
use yggdrasil_types::types::{ObjectRef, Value};

fn scratch_path() -> PathBuf {
    std::env::temp_dir().join(format!("yggdrasil-{}.ygg", Uuid::new_v4()))
}

#[test]
fn save_and_load() -> Result<()> {
    init_logger();
    let ygg = engine()?;
    let path = scratch_path();

    let node = new_node("saved");
    link(&node, &node);
    ygg.save_to_file(&node.into(), &path)?;

    let loaded = ygg.load_from_file::<ObjectRef>(&path)?;
    assert_eq!(name_of(&loaded), "saved");
    assert!(next_of(&loaded).unwrap().ptr_eq(&loaded));

    // a file is one value and nothing after it
    let mut bytes = fs::read(&path)?;
    bytes.push(0x00);
    fs::write(&path, &bytes)?;
    let err = ygg.load_from_file::<ObjectRef>(&path).unwrap_err();
    assert!(err.is_corrupted(), "{err}");

    // the value must have the requested shape
    ygg.save_to_file(&Value::from("text"), &path)?;
    let err = ygg.load_from_file::<ObjectRef>(&path).unwrap_err();
    assert!(err.is_corrupted(), "{err}");
    assert_eq!(ygg.load_from_file::<String>(&path)?, "text");

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn missing_file() -> Result<()> {
    init_logger();
    let ygg = engine()?;
    let err = ygg.load_from_file::<Value>(scratch_path()).unwrap_err();
    assert!(!err.is_corrupted(), "{err}");
    Ok(())
}
