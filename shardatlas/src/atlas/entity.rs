//! Feature types stored in an atlas.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Location, PolyLine, Polygon, Rectangle};

/// Key/value tags attached to every feature.
pub type Tags = BTreeMap<String, String>;

/// The six feature kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Node,
    Edge,
    Area,
    Line,
    Point,
    Relation,
}

impl ItemType {
    pub fn name(&self) -> &'static str {
        match self {
            ItemType::Node => "node",
            ItemType::Edge => "edge",
            ItemType::Area => "area",
            ItemType::Line => "line",
            ItemType::Point => "point",
            ItemType::Relation => "relation",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Behaviour common to every feature kind.
pub trait AtlasEntity: fmt::Debug {
    fn identifier(&self) -> i64;

    fn item_type(&self) -> ItemType;

    fn tags(&self) -> &Tags;

    fn tag(&self, key: &str) -> Option<&str> {
        self.tags().get(key).map(String::as_str)
    }

    /// Bounds of the feature's own geometry.
    ///
    /// Relations have no geometry of their own and return `None`; their extent
    /// depends on which members the holding atlas can resolve.
    fn bounds(&self) -> Option<Rectangle>;
}

/// A closed polygonal feature (building, lake, park).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub identifier: i64,
    pub polygon: Polygon,
    #[serde(default)]
    pub tags: Tags,
}

impl Area {
    pub fn new(identifier: i64, polygon: Polygon) -> Self {
        Self {
            identifier,
            polygon,
            tags: Tags::new(),
        }
    }

    /// Add a tag, builder style.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// A non-navigable linear feature (coastline, power line).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub identifier: i64,
    pub polyline: PolyLine,
    #[serde(default)]
    pub tags: Tags,
}

impl Line {
    pub fn new(identifier: i64, polyline: PolyLine) -> Self {
        Self {
            identifier,
            polyline,
            tags: Tags::new(),
        }
    }

    /// Add a tag, builder style.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// A standalone point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub identifier: i64,
    pub location: Location,
    #[serde(default)]
    pub tags: Tags,
}

impl Point {
    pub fn new(identifier: i64, location: Location) -> Self {
        Self {
            identifier,
            location,
            tags: Tags::new(),
        }
    }

    /// Add a tag, builder style.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// A navigable network vertex joining edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub identifier: i64,
    pub location: Location,
    #[serde(default)]
    pub tags: Tags,
}

impl Node {
    pub fn new(identifier: i64, location: Location) -> Self {
        Self {
            identifier,
            location,
            tags: Tags::new(),
        }
    }

    /// Add a tag, builder style.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// A navigable network segment between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub identifier: i64,
    pub polyline: PolyLine,
    pub start_node: i64,
    pub end_node: i64,
    #[serde(default)]
    pub tags: Tags,
}

impl Edge {
    pub fn new(identifier: i64, polyline: PolyLine, start_node: i64, end_node: i64) -> Self {
        Self {
            identifier,
            polyline,
            start_node,
            end_node,
            tags: Tags::new(),
        }
    }

    /// Add a tag, builder style.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Reference from a relation to one of its members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationMember {
    pub item_type: ItemType,
    pub identifier: i64,
    #[serde(default)]
    pub role: String,
}

impl RelationMember {
    pub fn new(item_type: ItemType, identifier: i64, role: impl Into<String>) -> Self {
        Self {
            item_type,
            identifier,
            role: role.into(),
        }
    }

    /// The `(kind, identifier)` key of the referenced feature.
    pub fn key(&self) -> (ItemType, i64) {
        (self.item_type, self.identifier)
    }
}

/// A feature composed of references to other features, relations included.
///
/// Relations are never clipped at shard boundaries; each shard only lists the
/// members it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub identifier: i64,
    pub members: Vec<RelationMember>,
    #[serde(default)]
    pub tags: Tags,
}

impl Relation {
    pub fn new(identifier: i64, members: Vec<RelationMember>) -> Self {
        Self {
            identifier,
            members,
            tags: Tags::new(),
        }
    }

    /// Add a tag, builder style.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Whether the relation lists a member with this kind and identifier.
    pub fn has_member(&self, item_type: ItemType, identifier: i64) -> bool {
        self.members
            .iter()
            .any(|m| m.item_type == item_type && m.identifier == identifier)
    }
}

impl AtlasEntity for Area {
    fn identifier(&self) -> i64 {
        self.identifier
    }
    fn item_type(&self) -> ItemType {
        ItemType::Area
    }
    fn tags(&self) -> &Tags {
        &self.tags
    }
    fn bounds(&self) -> Option<Rectangle> {
        self.polygon.bounds()
    }
}

impl AtlasEntity for Line {
    fn identifier(&self) -> i64 {
        self.identifier
    }
    fn item_type(&self) -> ItemType {
        ItemType::Line
    }
    fn tags(&self) -> &Tags {
        &self.tags
    }
    fn bounds(&self) -> Option<Rectangle> {
        self.polyline.bounds()
    }
}

impl AtlasEntity for Point {
    fn identifier(&self) -> i64 {
        self.identifier
    }
    fn item_type(&self) -> ItemType {
        ItemType::Point
    }
    fn tags(&self) -> &Tags {
        &self.tags
    }
    fn bounds(&self) -> Option<Rectangle> {
        Some(Rectangle::from_point(self.location))
    }
}

impl AtlasEntity for Node {
    fn identifier(&self) -> i64 {
        self.identifier
    }
    fn item_type(&self) -> ItemType {
        ItemType::Node
    }
    fn tags(&self) -> &Tags {
        &self.tags
    }
    fn bounds(&self) -> Option<Rectangle> {
        Some(Rectangle::from_point(self.location))
    }
}

impl AtlasEntity for Edge {
    fn identifier(&self) -> i64 {
        self.identifier
    }
    fn item_type(&self) -> ItemType {
        ItemType::Edge
    }
    fn tags(&self) -> &Tags {
        &self.tags
    }
    fn bounds(&self) -> Option<Rectangle> {
        self.polyline.bounds()
    }
}

impl AtlasEntity for Relation {
    fn identifier(&self) -> i64 {
        self.identifier
    }
    fn item_type(&self) -> ItemType {
        ItemType::Relation
    }
    fn tags(&self) -> &Tags {
        &self.tags
    }
    fn bounds(&self) -> Option<Rectangle> {
        None
    }
}
