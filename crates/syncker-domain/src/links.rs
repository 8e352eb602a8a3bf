use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::path::{LocalPath, RemotePath};
use crate::tree::{IndexNode, IndexTree};

/// A link that `bind` dropped to make room for a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkReplacement {
    /// The local file was linked to another Drive file, which lost its link.
    LocalRebound {
        local: LocalPath,
        previous_remote: RemotePath,
    },
    /// The Drive file was linked to another local file.
    RemoteRelinked {
        remote: RemotePath,
        previous_local: LocalPath,
    },
}

impl fmt::Display for LinkReplacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalRebound {
                local,
                previous_remote,
            } => write!(
                f,
                "\"{local}\" was linked to \"{previous_remote}\", replacing link"
            ),
            Self::RemoteRelinked {
                remote,
                previous_local,
            } => write!(
                f,
                "\"{remote}\" had existing link \"{previous_local}\", replacing link"
            ),
        }
    }
}

/// Local path to Drive path lookup, derived from the link fields of the
/// tree. Every mutation of a node link goes through here so both sides move
/// together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkRegistry {
    entries: IndexMap<LocalPath, RemotePath>,
}

impl LinkRegistry {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LocalPath, &RemotePath)> {
        self.entries.iter()
    }

    pub fn lookup_by_local(&self, local: &LocalPath) -> Result<&RemotePath, IndexError> {
        self.entries.get(local).ok_or_else(|| IndexError::NotLinked {
            path: local.to_string(),
            counterpart: "Drive",
        })
    }

    /// Links the file at `remote` to `local`, dropping any link either side
    /// already had. Fails without touching anything if `remote` is not an
    /// indexed file.
    pub fn bind(
        &mut self,
        tree: &mut IndexTree,
        remote: &RemotePath,
        local: LocalPath,
    ) -> Result<Vec<LinkReplacement>, IndexError> {
        let target = tree.resolve(remote)?;
        if target.is_folder() {
            return Err(IndexError::NotAFile {
                path: remote.to_string(),
            });
        }

        let mut replaced = Vec::new();
        if let Some(previous) = self.entries.get(&local).cloned() {
            if previous == *remote {
                return Ok(replaced);
            }
            self.entries.shift_remove(&local);
            if let Ok(node) = tree.resolve_mut(&previous) {
                node.replace_link(None);
            }
            replaced.push(LinkReplacement::LocalRebound {
                local: local.clone(),
                previous_remote: previous,
            });
        }

        let node = tree.resolve_mut(remote)?;
        if let Some(stale) = node.replace_link(Some(local.clone())) {
            self.entries.shift_remove(&stale);
            replaced.push(LinkReplacement::RemoteRelinked {
                remote: remote.clone(),
                previous_local: stale,
            });
        }
        self.entries.insert(local, remote.clone());
        Ok(replaced)
    }

    /// Clears the link of the file at `remote`, returning the local side.
    pub fn unbind(
        &mut self,
        tree: &mut IndexTree,
        remote: &RemotePath,
    ) -> Result<LocalPath, IndexError> {
        let node = tree.resolve_mut(remote)?;
        let local = node
            .replace_link(None)
            .ok_or_else(|| IndexError::NotLinked {
                path: remote.to_string(),
                counterpart: "local",
            })?;
        self.entries.shift_remove(&local);
        Ok(local)
    }

    /// Drops the entries of every link inside a subtree that has already
    /// been detached from the tree.
    pub fn purge_subtree(&mut self, subtree: &IndexNode, base: &RemotePath) -> Vec<LocalPath> {
        let mut purged = Vec::new();
        for (path, node) in subtree.walk(base.clone()) {
            if let Some(local) = node.link() {
                if self.entries.get(local) == Some(&path) {
                    self.entries.shift_remove(local);
                }
                purged.push(local.clone());
            }
        }
        purged
    }

    /// True when every entry points at a file linked back to it and every
    /// linked file has an entry.
    #[must_use]
    pub fn is_consistent_with(&self, tree: &IndexTree) -> bool {
        let entries_match = self.entries.iter().all(|(local, remote)| {
            tree.resolve(remote)
                .map(|node| node.link() == Some(local))
                .unwrap_or(false)
        });
        let mut linked = 0usize;
        let nodes_match = tree.walk().all(|(path, node)| match node.link() {
            Some(local) => {
                linked += 1;
                self.entries.get(local) == Some(&path)
            }
            None => true,
        });
        entries_match && nodes_match && linked == self.entries.len()
    }
}
