use super::helpers::*;
use anyhow::Result;
use itertools::Itertools;
use uuid::Uuid;
use yggdrasil_engine::{
    ClassResolver, Serializer, ValueDeque, ValueList, ValueMap, ValueSet, Yggdrasil,
};
use yggdrasil_types::serde::Primitive;
use yggdrasil_types::types::{Fields, NamedType, ObjectRef, Type, Value};

#[test]
fn standard_collections() -> Result<()> {
    init_logger();
    let ygg = engine()?;
    let node = new_node("inside");

    let list: ValueList = vec!["a".into(), Primitive::Long(1).into(), node.clone().into()];
    let deque: ValueDeque = ["x", "y"].into_iter().map(Value::from).collect();
    let set: ValueSet = (0..10).map(|i| Value::from(Primitive::Int(i))).collect();
    let mut map = ValueMap::new();
    map.insert("key".into(), node.clone().into());
    map.insert(Primitive::Boolean(true).into(), Value::Null);

    let all = ObjectRef::new(vec![
        Value::from(ObjectRef::new(list)),
        ObjectRef::new(deque).into(),
        ObjectRef::new(set).into(),
        ObjectRef::new(map).into(),
    ]);
    let back = round_trip(&ygg, &all.into())?;
    let back = back.as_object().unwrap().borrow::<ValueList>().unwrap().clone();
    assert_eq!(back.len(), 4);

    let list = back[0].as_object().unwrap().borrow::<ValueList>().unwrap().clone();
    assert_eq!(list[..2], [Value::from("a"), Primitive::Long(1).into()]);
    let inside = list[2].as_object().cloned().unwrap();
    assert_eq!(name_of(&inside), "inside");

    let deque = back[1].as_object().unwrap();
    assert_eq!(
        deque.borrow::<ValueDeque>().unwrap().iter().collect_vec(),
        vec![&Value::from("x"), &Value::from("y")]
    );

    let set = back[2].as_object().unwrap();
    let set = set.borrow::<ValueSet>().unwrap();
    assert_eq!(set.len(), 10);
    assert!(set.contains(&Primitive::Int(7).into()));

    let map = back[3].as_object().unwrap();
    let map = map.borrow::<ValueMap>().unwrap();
    assert_eq!(map.get(&Primitive::Boolean(true).into()), Some(&Value::Null));
    // the node in the list and the node in the map are one node
    let in_map = map.get(&"key".into()).and_then(|v| v.as_object().cloned()).unwrap();
    assert!(in_map.ptr_eq(&inside));
    Ok(())
}

#[test]
fn uuids() -> Result<()> {
    init_logger();
    let ygg = Yggdrasil::new();
    let id = ObjectRef::new(Uuid::new_v4());
    let list: ValueList = vec![
        id.clone().into(),
        id.clone().into(),
        ObjectRef::new(Uuid::nil()).into(),
    ];

    let back = round_trip(&ygg, &ObjectRef::new(list).into())?;
    let back = back.as_object().unwrap().borrow::<ValueList>().unwrap().clone();
    let uuids = back.iter().map(|v| v.as_object().cloned().unwrap()).collect_vec();
    assert_eq!(*uuids[0].borrow::<Uuid>().unwrap(), *id.borrow::<Uuid>().unwrap());
    assert!(uuids[0].ptr_eq(&uuids[1]));
    assert!(uuids[2].borrow::<Uuid>().unwrap().is_nil());
    Ok(())
}

/* a plugin whose type is built from its complete fields */

struct Frozen {
    label: String,
    inner: Option<ObjectRef>,
}

struct FrozenSerializer;

impl ClassResolver for FrozenSerializer {
    fn id_of(&self, ty: &NamedType) -> Option<String> {
        ty.is::<Frozen>().then(|| "Frozen".to_owned())
    }

    fn type_of(&self, id: &str) -> Option<NamedType> {
        (id == "Frozen").then(NamedType::of::<Frozen>)
    }
}

impl Serializer for FrozenSerializer {
    fn serialize(&self, obj: &ObjectRef) -> yggdrasil_types::Result<Fields> {
        let frozen = obj
            .borrow::<Frozen>()
            .ok_or_else(|| anyhow::anyhow!("not a Frozen: {obj:?}"))?;
        let mut fields = Fields::new();
        fields.put_object("label", frozen.label.clone());
        fields.put_object("inner", frozen.inner.clone());
        Ok(fields)
    }

    fn can_be_instantiated(&self, _ty: &NamedType) -> bool {
        false
    }

    fn deserialize_new(
        &self,
        _ty: &NamedType,
        mut fields: Fields,
    ) -> yggdrasil_types::Result<ObjectRef> {
        Ok(ObjectRef::new(Frozen {
            label: fields.take_object_as("label")?,
            inner: fields.take_object_as("inner")?,
        }))
    }
}

fn frozen(label: &str, inner: Option<ObjectRef>) -> ObjectRef {
    ObjectRef::new(Frozen {
        label: label.to_owned(),
        inner,
    })
}

#[test]
fn objects_built_from_fields() -> Result<()> {
    init_logger();
    let mut ygg = engine()?;
    ygg.register_serializer(FrozenSerializer);
    assert!(ygg.is_serializable(&Type::named::<Frozen>()));

    // a node cycle below a frozen object is fine
    let node = new_node("loop");
    link(&node, &node);
    let outer = frozen("outer", Some(frozen("inner", Some(node))));
    let back = round_trip(&ygg, &outer.into())?;
    let back = back.as_object().unwrap();
    let back = back.borrow::<Frozen>().unwrap();
    assert_eq!(back.label, "outer");
    let inner = back.inner.as_ref().unwrap().borrow::<Frozen>().unwrap();
    assert_eq!(inner.label, "inner");
    let node = inner.inner.clone().unwrap();
    assert!(next_of(&node).unwrap().ptr_eq(&node));
    Ok(())
}

#[test]
fn cycle_through_object_built_from_fields() -> Result<()> {
    init_logger();
    let mut ygg = engine()?;
    ygg.register_serializer(FrozenSerializer);

    let list = ObjectRef::new(ValueList::new());
    let cyclic = frozen("cyclic", Some(list.clone()));
    if let Some(mut list) = list.borrow_mut::<ValueList>() {
        list.push(cyclic.clone().into());
    }

    let mut out = ygg.new_writer(vec![])?;
    let err = out.write(cyclic).unwrap_err();
    assert!(err.is_not_serializable(), "{err}");
    Ok(())
}

#[test]
fn unregistered_plugin_types_are_corrupt() -> Result<()> {
    init_logger();
    let mut writer = engine()?;
    writer.register_serializer(FrozenSerializer);
    let bytes = write_one(&writer, &frozen("x", None).into())?;

    let reader = engine()?;
    let mut input = reader.new_reader(&bytes[..])?;
    assert!(input.read_object().unwrap_err().is_corrupted());
    Ok(())
}
