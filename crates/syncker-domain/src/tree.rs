use indexmap::IndexMap;

use crate::error::IndexError;
use crate::path::{LocalPath, RemotePath};

/// Id of the Drive root folder; every tree starts here.
pub const ROOT_ID: &str = "root";

/// A remote object known to the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexNode {
    Folder(FolderNode),
    File(FileNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    id: String,
    children: IndexMap<String, IndexNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    id: String,
    link: Option<LocalPath>,
}

impl IndexNode {
    #[must_use]
    pub fn folder(id: impl Into<String>) -> Self {
        Self::Folder(FolderNode {
            id: id.into(),
            children: IndexMap::new(),
        })
    }

    #[must_use]
    pub fn file(id: impl Into<String>) -> Self {
        Self::File(FileNode {
            id: id.into(),
            link: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Folder(folder) => &folder.id,
            Self::File(file) => &file.id,
        }
    }

    #[must_use]
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }

    /// Linked local path; always `None` for folders.
    #[must_use]
    pub fn link(&self) -> Option<&LocalPath> {
        match self {
            Self::Folder(_) => None,
            Self::File(file) => file.link.as_ref(),
        }
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Option<&IndexNode> {
        match self {
            Self::Folder(folder) => folder.children.get(name),
            Self::File(_) => None,
        }
    }

    /// Children in discovery order; empty for files.
    pub fn children(&self) -> impl Iterator<Item = (&str, &IndexNode)> {
        let children = match self {
            Self::Folder(folder) => Some(folder.children.iter()),
            Self::File(_) => None,
        };
        children
            .into_iter()
            .flatten()
            .map(|(name, node)| (name.as_str(), node))
    }

    /// Pre-order traversal of this node and everything below it.
    #[must_use]
    pub fn walk(&self, base: RemotePath) -> Walk<'_> {
        Walk {
            stack: vec![(base, self)],
        }
    }

    /// Only [`crate::links::LinkRegistry`] writes link fields.
    pub(crate) fn replace_link(&mut self, link: Option<LocalPath>) -> Option<LocalPath> {
        match self {
            Self::File(file) => std::mem::replace(&mut file.link, link),
            Self::Folder(_) => {
                debug_assert!(link.is_none(), "folders never carry links");
                None
            }
        }
    }

    pub(crate) fn attach_child(&mut self, name: String, child: IndexNode) {
        match self {
            Self::Folder(folder) => {
                folder.children.insert(name, child);
            }
            Self::File(_) => debug_assert!(false, "files never have children"),
        }
    }

    pub(crate) fn from_parts(
        id: String,
        children: Option<IndexMap<String, IndexNode>>,
        link: Option<LocalPath>,
    ) -> Self {
        match children {
            Some(children) => Self::Folder(FolderNode { id, children }),
            None => Self::File(FileNode { id, link }),
        }
    }
}

/// The locally indexed part of the Drive namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTree {
    root: IndexNode,
}

impl Default for IndexTree {
    fn default() -> Self {
        Self {
            root: IndexNode::folder(ROOT_ID),
        }
    }
}

impl IndexTree {
    /// Wraps an existing root; the root must be a folder.
    pub fn from_root(root: IndexNode) -> Result<Self, IndexError> {
        if !root.is_folder() {
            return Err(IndexError::NotAFolder {
                name: root.id().to_string(),
            });
        }
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &IndexNode {
        &self.root
    }

    /// Walks `path` one segment at a time from the root.
    pub fn resolve(&self, path: &RemotePath) -> Result<&IndexNode, IndexError> {
        let mut current = &self.root;
        let mut previous: Option<&str> = None;
        for segment in path.segments() {
            current = match current {
                IndexNode::Folder(folder) => {
                    folder
                        .children
                        .get(segment)
                        .ok_or_else(|| IndexError::NotIndexed {
                            path: path.to_string(),
                            segment: segment.clone(),
                        })?
                }
                IndexNode::File(_) => return Err(not_a_folder(previous)),
            };
            previous = Some(segment);
        }
        Ok(current)
    }

    pub(crate) fn resolve_mut(&mut self, path: &RemotePath) -> Result<&mut IndexNode, IndexError> {
        let mut current = &mut self.root;
        let mut previous: Option<&str> = None;
        for segment in path.segments() {
            current = match current {
                IndexNode::Folder(folder) => {
                    folder
                        .children
                        .get_mut(segment)
                        .ok_or_else(|| IndexError::NotIndexed {
                            path: path.to_string(),
                            segment: segment.clone(),
                        })?
                }
                IndexNode::File(_) => return Err(not_a_folder(previous)),
            };
            previous = Some(segment);
        }
        Ok(current)
    }

    /// Sets (or overwrites) `name` under the folder at `parent`, returning
    /// whatever subtree previously held that name.
    pub fn insert(
        &mut self,
        parent: &RemotePath,
        name: &str,
        node: IndexNode,
    ) -> Result<Option<IndexNode>, IndexError> {
        match self.resolve_mut(parent)? {
            IndexNode::Folder(folder) => Ok(folder.children.insert(name.to_string(), node)),
            IndexNode::File(_) => Err(not_a_folder(parent.name())),
        }
    }

    /// Detaches `name` from the folder at `parent`. Links inside the
    /// returned subtree are left for the caller to purge.
    pub fn remove(&mut self, parent: &RemotePath, name: &str) -> Result<IndexNode, IndexError> {
        match self.resolve_mut(parent)? {
            IndexNode::Folder(folder) => {
                folder
                    .children
                    .shift_remove(name)
                    .ok_or_else(|| IndexError::NotIndexed {
                        path: parent.join(name).to_string(),
                        segment: name.to_string(),
                    })
            }
            IndexNode::File(_) => Err(not_a_folder(parent.name())),
        }
    }

    /// Pre-order traversal from the root (the root itself comes first).
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        self.root.walk(RemotePath::root())
    }
}

fn not_a_folder(name: Option<&str>) -> IndexError {
    IndexError::NotAFolder {
        name: name.unwrap_or(ROOT_ID).to_string(),
    }
}

/// Lazy depth-first, pre-order iterator over `(path, node)` pairs.
pub struct Walk<'a> {
    stack: Vec<(RemotePath, &'a IndexNode)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (RemotePath, &'a IndexNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;
        if let IndexNode::Folder(folder) = node {
            for (name, child) in folder.children.iter().rev() {
                self.stack.push((path.join(name), child));
            }
        }
        Some((path, node))
    }
}
