use anyhow::Result;
use std::collections::HashMap;
use yggdrasil_engine::{Schema, Yggdrasil};
use yggdrasil_types::types::{ArrayRef, NamedType, NativeEnum, ObjectRef, Value};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/* domain */

#[derive(Default)]
pub struct Node {
    pub name: String,
    pub next: Option<ObjectRef>,
}

#[derive(Default, PartialEq, Debug)]
pub struct Entity {
    pub name: String,
    pub health: i32,
}

#[derive(Default)]
pub struct Player {
    pub level: i16,
    pub color: Color,
    pub friend: Option<ObjectRef>,
    pub inventory: Option<ArrayRef>,
    pub entity: Entity,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Color {
    #[default]
    Red,
    Green,
    Blue,
}

impl NativeEnum for Color {
    const CONSTANTS: &'static [Self] = &[Color::Red, Color::Green, Color::Blue];

    fn id(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
        }
    }

    fn excessive_constant(id: &str) -> Option<Self> {
        match id {
            "purple" => Some(Color::Blue),
            _ => None,
        }
    }
}

/// Marker of an open enumeration whose constants are registered at run time.
pub struct Biome;

pub fn biome_type() -> NamedType {
    NamedType::enumeration::<Biome>()
}

/* schemas */

pub fn node_schema() -> Result<Schema> {
    let schema = Schema::builder::<Node>()
        .constructible()
        .object("name", |n| n.name.clone(), |n, v| n.name = v)
        .reference::<Node>("next", |n| n.next.clone(), |n, v| n.next = v)
        .build()?;
    Ok(schema)
}

pub fn entity_schema() -> Result<Schema> {
    let schema = Schema::builder::<Entity>()
        .constructible()
        .object("name", |e| e.name.clone(), |e, v| e.name = v)
        .primitive("health", |e| e.health, |e, v| e.health = v)
        .build()?;
    Ok(schema)
}

pub fn player_schema() -> Result<Schema> {
    let schema = Schema::builder::<Player>()
        .constructible()
        .primitive("level", |p| p.level, |p, v| p.level = v)
        .enumeration("color", |p| p.color, |p, v| p.color = v)
        .reference::<Player>("friend", |p| p.friend.clone(), |p, v| p.friend = v)
        .object("inventory", |p| p.inventory.clone(), |p, v| p.inventory = v)
        .extends(&entity_schema()?, |p| &p.entity, |p| &mut p.entity)
        .build()?;
    Ok(schema)
}

/// An engine that knows every type above.
pub fn engine() -> Result<Yggdrasil> {
    let mut ygg = Yggdrasil::new();
    ygg.register_class("GraphNode", node_schema()?)?;
    ygg.register_class("Entity", entity_schema()?)?;
    ygg.register_class("Player", player_schema()?)?;
    ygg.register_enum::<Color>("Color")?;
    ygg.register_pseudo_enum(biome_type(), "Biome")?;
    ygg.register_constant(biome_type(), "plains")?;
    ygg.register_constant(biome_type(), "desert")?;
    Ok(ygg)
}

/* streams */

pub fn write_one(ygg: &Yggdrasil, value: &Value) -> Result<Vec<u8>> {
    let mut out = ygg.new_writer(vec![])?;
    out.write_object(value)?;
    Ok(out.finish()?)
}

pub fn read_one(ygg: &Yggdrasil, bytes: &[u8]) -> Result<Value> {
    let mut input = ygg.new_reader(bytes)?;
    let value = input.read_object()?;
    input.finish()?;
    Ok(value)
}

pub fn round_trip(ygg: &Yggdrasil, value: &Value) -> Result<Value> {
    let bytes = write_one(ygg, value)?;
    read_one(ygg, &bytes)
}

/* graph inspection */

pub fn next_of(node: &ObjectRef) -> Option<ObjectRef> {
    node.borrow::<Node>().and_then(|n| n.next.clone())
}

pub fn name_of(node: &ObjectRef) -> String {
    node.borrow::<Node>().map(|n| n.name.clone()).unwrap_or_default()
}

/// For every node, the position of its successor within `nodes`.
pub fn successor_positions(nodes: &[ObjectRef]) -> Vec<Option<usize>> {
    let positions = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.addr(), i))
        .collect::<HashMap<_, _>>();
    nodes
        .iter()
        .map(|n| next_of(n).and_then(|next| positions.get(&next.addr()).copied()))
        .collect()
}

pub fn new_node(name: &str) -> ObjectRef {
    ObjectRef::new(Node {
        name: name.to_owned(),
        next: None,
    })
}

pub fn link(from: &ObjectRef, to: &ObjectRef) {
    if let Some(mut node) = from.borrow_mut::<Node>() {
        node.next = Some(to.clone());
    }
}
