use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::document::is_reserved_name;
use crate::error::IndexError;
use crate::links::{LinkRegistry, LinkReplacement};
use crate::path::{is_drive_path, LocalPath, RemotePath};
use crate::remote::RemoteLister;
use crate::render::{render, RenderOptions, RenderedLine};
use crate::tree::{IndexNode, IndexTree};

/// A Drive file together with the local file it is linked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedPair {
    pub id: String,
    pub remote: RemotePath,
    pub local: LocalPath,
}

/// The persisted index: the tree of known Drive objects plus the link
/// lookup derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveIndex {
    #[serde(rename = "drive_files")]
    tree: IndexTree,
    #[serde(default)]
    links: LinkRegistry,
}

impl DriveIndex {
    #[must_use]
    pub fn tree(&self) -> &IndexTree {
        &self.tree
    }

    #[must_use]
    pub fn links(&self) -> &LinkRegistry {
        &self.links
    }

    /// Makes sure every segment of `path` is present in the tree, asking
    /// `lister` only about segments that are not indexed yet.
    ///
    /// When the store reports several objects with the same name, the first
    /// one wins. Nothing is inserted unless the whole path resolves.
    ///
    /// Returns the paths that were newly added, shallowest first.
    pub fn ensure_indexed<L>(
        &mut self,
        lister: &L,
        path: &RemotePath,
    ) -> Result<Vec<RemotePath>, IndexError>
    where
        L: RemoteLister + ?Sized,
    {
        let segments = path.segments();
        let mut current = self.tree.root();
        let mut known = 0;
        while let Some(segment) = segments.get(known) {
            let Some(child) = current.child(segment) else {
                break;
            };
            current = child;
            known += 1;
        }
        if known == segments.len() {
            debug!(path = %path, "already indexed");
            return Ok(Vec::new());
        }
        if !current.is_folder() {
            return Err(IndexError::NotAFolder {
                name: segments[known - 1].clone(),
            });
        }
        if let Some(reserved) = segments[known..]
            .iter()
            .find(|segment| is_reserved_name(segment))
        {
            return Err(IndexError::InvalidPath {
                path: format!("{path} (\"{reserved}\" is a reserved name)"),
            });
        }

        let mut parent_id = current.id().to_string();
        let mut discovered: Vec<(String, IndexNode)> = Vec::new();
        for segment in &segments[known..] {
            if let Some((name, node)) = discovered.last() {
                if !node.is_folder() {
                    return Err(IndexError::NotAFolder { name: name.clone() });
                }
            }
            info!("finding file {segment}");
            let matches = lister.list_children(&parent_id, segment)?;
            debug!(segment = %segment, matches = matches.len(), "listed remote folder");
            let Some(found) = matches.into_iter().next() else {
                return Err(IndexError::PathNotFound {
                    path: path.to_string(),
                });
            };
            parent_id.clone_from(&found.id);
            let node = if found.is_folder() {
                IndexNode::folder(found.id)
            } else {
                IndexNode::file(found.id)
            };
            discovered.push((segment.clone(), node));
        }

        let added = (known + 1..=segments.len())
            .map(|len| path.prefix(len))
            .collect();
        let mut chain: Option<(String, IndexNode)> = None;
        for (name, mut node) in discovered.into_iter().rev() {
            if let Some((child_name, child)) = chain.take() {
                node.attach_child(child_name, child);
            }
            chain = Some((name, node));
        }
        if let Some((name, node)) = chain {
            self.tree.insert(&path.prefix(known), &name, node)?;
        }
        Ok(added)
    }

    /// Removes `path` and everything below it, dropping every link found
    /// in the removed subtree. Returns the local paths that lost their link.
    pub fn unindex(&mut self, path: &RemotePath) -> Result<Vec<LocalPath>, IndexError> {
        let (Some(parent), Some(name)) = (path.parent(), path.name()) else {
            return Err(IndexError::RootUnindexable);
        };
        let removed = self.tree.remove(&parent, name)?;
        Ok(self.links.purge_subtree(&removed, path))
    }

    /// Links the Drive file at `remote` to `local`.
    pub fn link(
        &mut self,
        remote: &RemotePath,
        local: LocalPath,
    ) -> Result<Vec<LinkReplacement>, IndexError> {
        self.links.bind(&mut self.tree, remote, local)
    }

    /// Unlinks the pair found from either side; see [`Self::resolve_linked_pair`].
    pub fn unlink(&mut self, input: &str, base: &Path) -> Result<LinkedPair, IndexError> {
        let pair = self.resolve_linked_pair(input, base)?;
        self.links.unbind(&mut self.tree, &pair.remote)?;
        Ok(pair)
    }

    /// Finds the linked pair for a Drive path or a local path. Relative
    /// local paths are resolved against `base`.
    pub fn resolve_linked_pair(&self, input: &str, base: &Path) -> Result<LinkedPair, IndexError> {
        if is_drive_path(input) {
            let remote = RemotePath::parse(input)?;
            let node = self.tree.resolve(&remote)?;
            let local = node.link().cloned().ok_or_else(|| IndexError::NotLinked {
                path: input.to_string(),
                counterpart: "local",
            })?;
            return Ok(LinkedPair {
                id: node.id().to_string(),
                remote,
                local,
            });
        }

        let local = LocalPath::with_base(input, base)?;
        let remote = self.links.lookup_by_local(&local)?.clone();
        let node = self.tree.resolve(&remote)?;
        Ok(LinkedPair {
            id: node.id().to_string(),
            remote,
            local,
        })
    }

    /// Records a freshly uploaded file under `folder` and links it to
    /// `local`. A previously indexed entry with the same name is replaced
    /// and its links are dropped.
    pub fn adopt_upload(
        &mut self,
        folder: &RemotePath,
        name: &str,
        id: &str,
        local: LocalPath,
    ) -> Result<Vec<LinkReplacement>, IndexError> {
        check_entry_name(folder, name)?;
        let path = folder.join(name);
        if let Some(previous) = self.tree.insert(folder, name, IndexNode::file(id))? {
            for dropped in self.links.purge_subtree(&previous, &path) {
                debug!(local = %dropped, "dropped link of replaced entry");
            }
        }
        self.links.bind(&mut self.tree, &path, local)
    }

    #[must_use]
    pub fn render(&self, options: &RenderOptions<'_>) -> Vec<RenderedLine> {
        render(&self.tree, options)
    }
}

/// Rejects names that cannot live as a single segment under `folder`.
pub fn check_entry_name(folder: &RemotePath, name: &str) -> Result<(), IndexError> {
    let reason = if name.is_empty() {
        "empty name"
    } else if name.contains('/') {
        "names cannot contain `/`"
    } else if is_reserved_name(name) {
        "reserved name"
    } else {
        return Ok(());
    };
    Err(IndexError::InvalidPath {
        path: format!("{folder} + \"{name}\" ({reason})"),
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use crate::error::RemoteError;
    use crate::remote::{RemoteObject, FOLDER_MIME_TYPE};

    #[derive(Default)]
    struct FakeLister {
        entries: Vec<(String, RemoteObject)>,
        calls: RefCell<Vec<(String, String)>>,
    }

    impl FakeLister {
        fn with(mut self, parent: &str, id: &str, name: &str, folder: bool) -> Self {
            self.entries.push((
                parent.to_string(),
                RemoteObject {
                    id: id.to_string(),
                    name: name.to_string(),
                    mime_type: if folder {
                        FOLDER_MIME_TYPE.to_string()
                    } else {
                        "application/pdf".to_string()
                    },
                },
            ));
            self
        }
    }

    impl RemoteLister for FakeLister {
        fn list_children(
            &self,
            parent_id: &str,
            name: &str,
        ) -> Result<Vec<RemoteObject>, RemoteError> {
            self.calls
                .borrow_mut()
                .push((parent_id.to_string(), name.to_string()));
            Ok(self
                .entries
                .iter()
                .filter(|(parent, object)| parent == parent_id && object.name == name)
                .map(|(_, object)| object.clone())
                .collect())
        }
    }

    fn remote(raw: &str) -> RemotePath {
        RemotePath::parse(raw).unwrap()
    }

    fn local(raw: &str) -> LocalPath {
        LocalPath::with_base(raw, Path::new("/")).unwrap()
    }

    fn drive() -> FakeLister {
        FakeLister::default()
            .with("root", "rid", "Reports", true)
            .with("rid", "f1", "Q1.pdf", false)
            .with("rid", "a1", "Archive", true)
            .with("a1", "f2", "Q4.pdf", false)
    }

    #[test]
    fn indexing_builds_the_expected_document() {
        let lister = drive();
        let mut index = DriveIndex::default();
        let added = index
            .ensure_indexed(&lister, &remote("gdrive:/Reports/Q1.pdf"))
            .unwrap();
        assert_eq!(
            added,
            vec![remote("gdrive:/Reports"), remote("gdrive:/Reports/Q1.pdf")]
        );
        assert_eq!(
            serde_json::to_value(index.tree()).unwrap(),
            json!({
                "__gdrive_id": "root",
                "__gdrive_folder": true,
                "Reports": {
                    "__gdrive_id": "rid",
                    "__gdrive_folder": true,
                    "Q1.pdf": { "__gdrive_id": "f1", "__gdrive_folder": false }
                }
            })
        );
    }

    #[test]
    fn indexed_prefixes_are_not_queried_again() {
        let lister = drive();
        let mut index = DriveIndex::default();
        index
            .ensure_indexed(&lister, &remote("gdrive:/Reports/Q1.pdf"))
            .unwrap();
        index
            .ensure_indexed(&lister, &remote("gdrive:/Reports/Archive/Q4.pdf"))
            .unwrap();
        assert_eq!(
            lister.calls.borrow().as_slice(),
            &[
                ("root".to_string(), "Reports".to_string()),
                ("rid".to_string(), "Q1.pdf".to_string()),
                ("rid".to_string(), "Archive".to_string()),
                ("a1".to_string(), "Q4.pdf".to_string()),
            ]
        );

        let again = index
            .ensure_indexed(&lister, &remote("gdrive:/Reports/Archive/Q4.pdf"))
            .unwrap();
        assert!(again.is_empty());
        assert_eq!(lister.calls.borrow().len(), 4);
    }

    #[test]
    fn missing_remote_object_leaves_tree_untouched() {
        let lister = drive();
        let mut index = DriveIndex::default();
        let err = index
            .ensure_indexed(&lister, &remote("gdrive:/Reports/Q9.pdf"))
            .unwrap_err();
        assert_eq!(
            err,
            IndexError::PathNotFound {
                path: "gdrive:/Reports/Q9.pdf".into()
            }
        );
        assert_eq!(index, DriveIndex::default());
    }

    #[test]
    fn descending_into_a_remote_file_fails() {
        let lister = drive();
        let mut index = DriveIndex::default();
        let err = index
            .ensure_indexed(&lister, &remote("gdrive:/Reports/Q1.pdf/inner"))
            .unwrap_err();
        assert_eq!(
            err,
            IndexError::NotAFolder {
                name: "Q1.pdf".into()
            }
        );

        index
            .ensure_indexed(&lister, &remote("gdrive:/Reports/Q1.pdf"))
            .unwrap();
        let err = index
            .ensure_indexed(&lister, &remote("gdrive:/Reports/Q1.pdf/inner"))
            .unwrap_err();
        assert!(matches!(err, IndexError::NotAFolder { .. }));
    }

    #[test]
    fn first_match_wins_for_duplicate_names() {
        let lister = drive().with("root", "rid-2", "Reports", true);
        let mut index = DriveIndex::default();
        index
            .ensure_indexed(&lister, &remote("gdrive:/Reports"))
            .unwrap();
        assert_eq!(index.tree().resolve(&remote("gdrive:/Reports")).unwrap().id(), "rid");
    }

    #[test]
    fn reserved_names_cannot_be_indexed() {
        let lister = drive();
        let mut index = DriveIndex::default();
        let err = index
            .ensure_indexed(&lister, &remote("gdrive:/__gdrive_id"))
            .unwrap_err();
        assert!(matches!(err, IndexError::InvalidPath { .. }));
        assert!(lister.calls.borrow().is_empty());
    }

    #[test]
    fn unindex_cascades_links_and_nothing_else() {
        let lister = drive().with("root", "n1", "notes.txt", false);
        let mut index = DriveIndex::default();
        index
            .ensure_indexed(&lister, &remote("gdrive:/Reports/Q1.pdf"))
            .unwrap();
        index
            .ensure_indexed(&lister, &remote("gdrive:/Reports/Archive/Q4.pdf"))
            .unwrap();
        index
            .ensure_indexed(&lister, &remote("gdrive:/notes.txt"))
            .unwrap();
        index
            .link(&remote("gdrive:/Reports/Q1.pdf"), local("/home/u/q1.pdf"))
            .unwrap();
        index
            .link(&remote("gdrive:/Reports/Q1.pdf"), local("/home/u/q1-v2.pdf"))
            .unwrap();
        index
            .link(&remote("gdrive:/Reports/Archive/Q4.pdf"), local("/home/u/q4.pdf"))
            .unwrap();
        index
            .link(&remote("gdrive:/notes.txt"), local("/home/u/notes.txt"))
            .unwrap();

        let purged = index.unindex(&remote("gdrive:/Reports")).unwrap();
        assert_eq!(purged.len(), 2);
        assert!(index.links().lookup_by_local(&local("/home/u/q1-v2.pdf")).is_err());
        assert!(index.links().lookup_by_local(&local("/home/u/q4.pdf")).is_err());
        assert!(index.links().lookup_by_local(&local("/home/u/notes.txt")).is_ok());
        assert!(index.tree().resolve(&remote("gdrive:/Reports")).is_err());
        assert!(index.links().is_consistent_with(index.tree()));
    }

    #[test]
    fn unindexing_root_is_refused() {
        let mut index = DriveIndex::default();
        assert_eq!(
            index.unindex(&remote("gdrive:/")).unwrap_err(),
            IndexError::RootUnindexable
        );
        assert_eq!(
            index.unindex(&remote("gdrive://")).unwrap_err(),
            IndexError::RootUnindexable
        );
    }

    #[test]
    fn unindexing_unknown_path_fails() {
        let mut index = DriveIndex::default();
        let err = index.unindex(&remote("gdrive:/Nope")).unwrap_err();
        assert!(matches!(err, IndexError::NotIndexed { .. }));
    }

    #[test]
    fn linked_pair_resolves_from_either_side() {
        let lister = drive();
        let mut index = DriveIndex::default();
        index
            .ensure_indexed(&lister, &remote("gdrive:/Reports/Q1.pdf"))
            .unwrap();
        index
            .link(&remote("gdrive:/Reports/Q1.pdf"), local("/home/u/q1.pdf"))
            .unwrap();

        let from_remote = index
            .resolve_linked_pair("gdrive:/Reports/Q1.pdf", Path::new("/"))
            .unwrap();
        let from_local = index
            .resolve_linked_pair("q1.pdf", Path::new("/home/u"))
            .unwrap();
        assert_eq!(from_remote, from_local);
        assert_eq!(from_local.id, "f1");

        let err = index
            .resolve_linked_pair("other.pdf", Path::new("/home/u"))
            .unwrap_err();
        assert!(matches!(err, IndexError::NotLinked { .. }));
    }

    #[test]
    fn unlink_via_local_path_clears_both_sides() {
        let lister = drive();
        let mut index = DriveIndex::default();
        index
            .ensure_indexed(&lister, &remote("gdrive:/Reports/Q1.pdf"))
            .unwrap();
        let before = index.clone();
        index
            .link(&remote("gdrive:/Reports/Q1.pdf"), local("/home/u/q1.pdf"))
            .unwrap();
        let pair = index.unlink("/home/u/./q1.pdf", Path::new("/")).unwrap();
        assert_eq!(pair.remote, remote("gdrive:/Reports/Q1.pdf"));
        assert_eq!(index, before);
    }

    #[test]
    fn adopt_upload_indexes_and_links() {
        let lister = drive();
        let mut index = DriveIndex::default();
        index
            .ensure_indexed(&lister, &remote("gdrive:/Reports"))
            .unwrap();
        index
            .ensure_indexed(&lister, &remote("gdrive:/Reports/Q1.pdf"))
            .unwrap();
        index
            .link(&remote("gdrive:/Reports/Q1.pdf"), local("/tmp/a.txt"))
            .unwrap();

        let replaced = index
            .adopt_upload(&remote("gdrive:/Reports"), "a.txt", "new-id", local("/tmp/a.txt"))
            .unwrap();
        assert_eq!(replaced.len(), 1);
        let node = index
            .tree()
            .resolve(&remote("gdrive:/Reports/a.txt"))
            .unwrap();
        assert_eq!(node.id(), "new-id");
        assert_eq!(node.link(), Some(&local("/tmp/a.txt")));
        assert!(index
            .tree()
            .resolve(&remote("gdrive:/Reports/Q1.pdf"))
            .unwrap()
            .link()
            .is_none());
        assert!(index.links().is_consistent_with(index.tree()));
    }

    #[test]
    fn adopt_upload_over_a_linked_entry_drops_its_link() {
        let lister = drive();
        let mut index = DriveIndex::default();
        index
            .ensure_indexed(&lister, &remote("gdrive:/Reports/Q1.pdf"))
            .unwrap();
        index
            .link(&remote("gdrive:/Reports/Q1.pdf"), local("/tmp/old.pdf"))
            .unwrap();
        index
            .adopt_upload(&remote("gdrive:/Reports"), "Q1.pdf", "f9", local("/tmp/new.pdf"))
            .unwrap();
        assert!(index.links().lookup_by_local(&local("/tmp/old.pdf")).is_err());
        assert_eq!(index.links().len(), 1);
        assert!(index.links().is_consistent_with(index.tree()));
    }

    #[test]
    fn adopt_upload_rejects_names_that_are_not_one_segment() {
        let lister = drive();
        let mut index = DriveIndex::default();
        index
            .ensure_indexed(&lister, &remote("gdrive:/Reports"))
            .unwrap();
        let before = index.clone();
        for name in ["x/y", "", "__gdrive_id"] {
            let err = index
                .adopt_upload(&remote("gdrive:/Reports"), name, "new-id", local("/tmp/a.txt"))
                .unwrap_err();
            assert!(matches!(err, IndexError::InvalidPath { .. }), "{name}");
        }
        assert_eq!(index, before);

        let document = serde_json::to_string(&index).unwrap();
        let reloaded: DriveIndex = serde_json::from_str(&document).unwrap();
        assert!(reloaded.links().is_consistent_with(reloaded.tree()));
    }
}
