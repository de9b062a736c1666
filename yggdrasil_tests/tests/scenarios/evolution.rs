//! Streams written by an older shape of a type, read by a newer one. Both shapes share the
//! type id, so each test uses one engine to write and another to read.

use super::helpers::*;
use anyhow::Result;
use yggdrasil_engine::{
    CollectionFieldHandler, FieldDecl, FieldHandler, Schema, ValueList, Yggdrasil,
};
use yggdrasil_types::types::{ArrayRef, FieldContext, ObjectRef, Type, Value};

fn engine_with(id: &str, schema: Schema) -> Result<Yggdrasil> {
    let mut ygg = Yggdrasil::new();
    ygg.register_class(id, schema)?;
    Ok(ygg)
}

fn transfer(from: &Yggdrasil, to: &Yggdrasil, value: impl Into<Value>) -> Result<ObjectRef> {
    let bytes = write_one(from, &value.into())?;
    let back = read_one(to, &bytes)?;
    Ok(back.as_object().cloned().unwrap())
}

/* older shapes */

#[derive(Default)]
struct TitledEntity {
    name: String,
    health: i32,
    title: String,
}

fn titled_engine() -> Result<Yggdrasil> {
    let schema = Schema::builder::<TitledEntity>()
        .constructible()
        .object("name", |e| e.name.clone(), |e, v| e.name = v)
        .primitive("health", |e| e.health, |e, v| e.health = v)
        .object("title", |e| e.title.clone(), |e, v| e.title = v)
        .build()?;
    engine_with("Entity", schema)
}

fn titled() -> ObjectRef {
    ObjectRef::new(TitledEntity {
        name: "Steve".into(),
        health: 20,
        title: "the Brave".into(),
    })
}

#[derive(Default)]
struct NamedOnly {
    name: String,
}

fn named_only_engine() -> Result<Yggdrasil> {
    let schema = Schema::builder::<NamedOnly>()
        .constructible()
        .object("name", |e| e.name.clone(), |e, v| e.name = v)
        .build()?;
    engine_with("Entity", schema)
}

#[derive(Default)]
struct TextHealth {
    name: String,
    health: String,
}

fn text_health_engine() -> Result<Yggdrasil> {
    let schema = Schema::builder::<TextHealth>()
        .constructible()
        .object("name", |e| e.name.clone(), |e, v| e.name = v)
        .object("health", |e| e.health.clone(), |e, v| e.health = v)
        .build()?;
    engine_with("Entity", schema)
}

#[derive(Default)]
struct ShortHealth {
    name: String,
    health: i16,
}

/* handlers */

struct IgnoreExcessive;

impl FieldHandler for IgnoreExcessive {
    fn excessive_field(
        &self,
        _obj: &ObjectRef,
        _field: &FieldContext,
    ) -> yggdrasil_types::Result<bool> {
        Ok(true)
    }
}

struct FullHealth;

impl FieldHandler for FullHealth {
    fn missing_field(&self, obj: &ObjectRef, decl: &FieldDecl) -> yggdrasil_types::Result<bool> {
        match (decl.id(), obj.borrow_mut::<Entity>()) {
            ("health", Some(mut entity)) => {
                entity.health = 100;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/* tests */

#[test]
fn unhandled_mismatches_corrupt_the_stream() -> Result<()> {
    init_logger();
    let current = engine()?;
    let writers = [
        (titled_engine()?, titled()),
        (named_only_engine()?, ObjectRef::new(NamedOnly { name: "x".into() })),
        (
            text_health_engine()?,
            ObjectRef::new(TextHealth {
                name: "x".into(),
                health: "20".into(),
            }),
        ),
    ];
    for (old, value) in writers {
        let bytes = write_one(&old, &value.into())?;
        let mut input = current.new_reader(&bytes[..])?;
        let err = input.read_object().unwrap_err();
        assert!(err.is_corrupted(), "{err}");
    }
    Ok(())
}

#[test]
fn excessive_field_hook() -> Result<()> {
    init_logger();
    #[derive(Default)]
    struct Entity2 {
        name: String,
        health: i32,
        legacy_title: Option<String>,
    }
    let schema = Schema::builder::<Entity2>()
        .constructible()
        .object("name", |e| e.name.clone(), |e, v| e.name = v)
        .primitive("health", |e| e.health, |e, v| e.health = v)
        .on_excessive(|e, field| {
            if field.id() != "title" {
                return Ok(false);
            }
            e.legacy_title = Some(field.get_object_as::<String>()?);
            Ok(true)
        })
        .build()?;
    let current = engine_with("Entity", schema)?;

    let back = transfer(&titled_engine()?, &current, titled())?;
    let back = back.borrow::<Entity2>().unwrap();
    assert_eq!(back.name, "Steve");
    assert_eq!(back.health, 20);
    assert_eq!(back.legacy_title.as_deref(), Some("the Brave"));
    Ok(())
}

#[test]
fn excessive_field_handler() -> Result<()> {
    init_logger();
    let mut current = engine()?;
    current.register_field_handler(IgnoreExcessive);

    let back = transfer(&titled_engine()?, &current, titled())?;
    assert_eq!(
        *back.borrow::<Entity>().unwrap(),
        Entity {
            name: "Steve".into(),
            health: 20
        }
    );
    Ok(())
}

#[test]
fn missing_field_hook_and_handler() -> Result<()> {
    init_logger();
    let old = named_only_engine()?;
    let value = || ObjectRef::new(NamedOnly { name: "Alex".into() });

    let schema = Schema::builder::<Entity>()
        .constructible()
        .object("name", |e| e.name.clone(), |e, v| e.name = v)
        .primitive("health", |e| e.health, |e, v| e.health = v)
        .on_missing(|e, decl| {
            if decl.id() == "health" {
                e.health = 42;
            }
            Ok(decl.id() == "health")
        })
        .build()?;
    let hooked = engine_with("Entity", schema)?;
    let back = transfer(&old, &hooked, value())?;
    assert_eq!(back.borrow::<Entity>().unwrap().health, 42);

    let mut handled = engine()?;
    handled.register_field_handler(IgnoreExcessive);
    handled.register_field_handler(FullHealth);
    let back = transfer(&old, &handled, value())?;
    assert_eq!(
        *back.borrow::<Entity>().unwrap(),
        Entity {
            name: "Alex".into(),
            health: 100
        }
    );
    Ok(())
}

#[test]
fn incompatible_field_hook() -> Result<()> {
    init_logger();
    let schema = Schema::builder::<Entity>()
        .constructible()
        .object("name", |e| e.name.clone(), |e, v| e.name = v)
        .primitive("health", |e| e.health, |e, v| e.health = v)
        .on_incompatible(|e, field| {
            let Ok(text) = field.get_object_as::<String>() else {
                return Ok(false);
            };
            match text.parse() {
                Ok(health) => {
                    e.health = health;
                    Ok(true)
                }
                Err(_) => Ok(false),
            }
        })
        .build()?;
    let current = engine_with("Entity", schema)?;
    let old = text_health_engine()?;

    let back = transfer(
        &old,
        &current,
        ObjectRef::new(TextHealth {
            name: "x".into(),
            health: "17".into(),
        }),
    )?;
    assert_eq!(back.borrow::<Entity>().unwrap().health, 17);

    let bytes = write_one(
        &old,
        &ObjectRef::new(TextHealth {
            name: "x".into(),
            health: "lots".into(),
        })
        .into(),
    )?;
    let mut input = current.new_reader(&bytes[..])?;
    assert!(input.read_object().unwrap_err().is_corrupted());
    Ok(())
}

#[test]
fn primitive_fields_widen() -> Result<()> {
    init_logger();
    let schema = Schema::builder::<ShortHealth>()
        .constructible()
        .object("name", |e| e.name.clone(), |e, v| e.name = v)
        .primitive("health", |e| e.health, |e, v| e.health = v)
        .build()?;
    let old = engine_with("Entity", schema)?;

    let back = transfer(
        &old,
        &engine()?,
        ObjectRef::new(ShortHealth {
            name: "x".into(),
            health: -3,
        }),
    )?;
    assert_eq!(back.borrow::<Entity>().unwrap().health, -3);

    // narrowing is never implicit
    let bytes = write_one(&engine()?, &ObjectRef::new(Entity::default()).into())?;
    let mut input = old.new_reader(&bytes[..])?;
    assert!(input.read_object().unwrap_err().is_corrupted());
    Ok(())
}

#[test]
fn arrays_and_collections_convert() -> Result<()> {
    init_logger();

    #[derive(Default)]
    struct ArrayBag {
        items: Option<ArrayRef>,
    }
    #[derive(Default)]
    struct ListBag {
        items: Option<ObjectRef>,
    }

    let array_schema = || {
        Schema::builder::<ArrayBag>()
            .constructible()
            .object_typed(
                "items",
                Type::array_of(Type::String),
                |b| b.items.clone(),
                |b, v| b.items = v,
            )
            .build()
    };
    let list_schema = || {
        Schema::builder::<ListBag>()
            .constructible()
            .object_typed(
                "items",
                Type::named::<ValueList>(),
                |b| b.items.clone(),
                |b, v| b.items = v,
            )
            .build()
    };

    let array_engine = engine_with("Bag", array_schema()?)?;
    let mut list_engine = engine_with("Bag", list_schema()?)?;
    let words = vec![Value::from("a"), Value::from("b")];

    // without the handler the change is an error
    let arr = ArrayRef::new(Type::String, words.clone());
    let bytes = write_one(&array_engine, &ObjectRef::new(ArrayBag { items: Some(arr) }).into())?;
    let mut input = list_engine.new_reader(&bytes[..])?;
    assert!(input.read_object().unwrap_err().is_corrupted());

    // array to list
    list_engine.register_field_handler(CollectionFieldHandler);
    let back = read_one(&list_engine, &bytes)?;
    let back = back.as_object().unwrap().borrow::<ListBag>().unwrap().items.clone().unwrap();
    assert_eq!(*back.borrow::<ValueList>().unwrap(), words);

    // list to array
    let mut array_engine = array_engine;
    array_engine.register_field_handler(CollectionFieldHandler);
    let list = ObjectRef::new(words.clone());
    let bag = ObjectRef::new(ListBag { items: Some(list) });
    let back = transfer(&list_engine, &array_engine, bag)?;
    let items = back.borrow::<ArrayBag>().unwrap().items.clone().unwrap();
    assert_eq!(items.component(), Type::String);
    assert_eq!(items.to_vec(), words);
    Ok(())
}
