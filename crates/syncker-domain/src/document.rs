//! On-disk layout of the index.
//!
//! Nodes are flat JSON objects: two reserved metadata keys, an optional
//! `link` on files, and one key per child on folders.

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::path::LocalPath;
use crate::tree::{IndexNode, IndexTree};

pub const ID_KEY: &str = "__gdrive_id";
pub const FOLDER_KEY: &str = "__gdrive_folder";
pub const LINK_KEY: &str = "link";

/// Names that cannot be stored as children in this layout.
pub const RESERVED_KEYS: [&str; 2] = [ID_KEY, FOLDER_KEY];

#[must_use]
pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_KEYS.contains(&name)
}

impl Serialize for IndexNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let children: Vec<(&str, &IndexNode)> = self.children().collect();
        let link = self.link();
        let mut map = serializer.serialize_map(Some(2 + children.len() + usize::from(link.is_some())))?;
        map.serialize_entry(ID_KEY, self.id())?;
        map.serialize_entry(FOLDER_KEY, &self.is_folder())?;
        if let Some(link) = link {
            map.serialize_entry(LINK_KEY, link)?;
        }
        for (name, child) in children {
            map.serialize_entry(name, child)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for IndexNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        node_from_map(map).map_err(de::Error::custom)
    }
}

fn node_from_map(map: Map<String, Value>) -> Result<IndexNode, String> {
    let mut id = None;
    let mut folder = None;
    let mut rest = Vec::new();
    for (key, value) in map {
        match key.as_str() {
            ID_KEY => match value {
                Value::String(value) => id = Some(value),
                other => return Err(format!("\"{ID_KEY}\" must be a string, found {other}")),
            },
            FOLDER_KEY => match value {
                Value::Bool(value) => folder = Some(value),
                other => return Err(format!("\"{FOLDER_KEY}\" must be a boolean, found {other}")),
            },
            _ => rest.push((key, value)),
        }
    }
    let id = id.ok_or_else(|| format!("index node is missing \"{ID_KEY}\""))?;
    let folder = folder.ok_or_else(|| format!("index node {id} is missing \"{FOLDER_KEY}\""))?;

    if folder {
        let mut children = IndexMap::with_capacity(rest.len());
        for (name, value) in rest {
            let child = IndexNode::deserialize(value)
                .map_err(|err| format!("{name}: {err}"))?;
            children.insert(name, child);
        }
        return Ok(IndexNode::from_parts(id, Some(children), None));
    }

    let mut link = None;
    for (key, value) in rest {
        if key != LINK_KEY {
            return Err(format!("file node {id} has unexpected key \"{key}\""));
        }
        let Value::String(raw) = value else {
            return Err(format!("file node {id} has a non-string link"));
        };
        link = Some(LocalPath::try_from(raw).map_err(|err| err.to_string())?);
    }
    Ok(IndexNode::from_parts(id, None, link))
}

impl Serialize for IndexTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for IndexTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let root = IndexNode::deserialize(deserializer)?;
        IndexTree::from_root(root)
            .map_err(|_| de::Error::custom("the index root must be a folder"))
    }
}
