use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::tree::IndexTree;

/// Indentation emitted once per depth level in tree mode.
pub const TREE_BRANCH: &str = "\u{2502} ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// One full `gdrive:/...` path per line.
    Flat,
    /// Names indented by depth.
    Tree,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions<'a> {
    pub mode: RenderMode,
    pub hide_links: bool,
    pub home: Option<&'a Path>,
}

/// One rendered entry. `prefix` holds the tree glyphs so callers can style
/// them separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedLine {
    pub prefix: String,
    pub label: String,
    pub folder: bool,
}

impl fmt::Display for RenderedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.label)
    }
}

#[must_use]
pub fn render(tree: &IndexTree, options: &RenderOptions<'_>) -> Vec<RenderedLine> {
    tree.walk()
        .skip(1)
        .map(|(path, node)| {
            let depth = path.depth().saturating_sub(1);
            let name = path.name().unwrap_or_default();
            let mut label = match (options.mode, node.is_folder()) {
                (RenderMode::Flat, true) => format!("{path}/"),
                (RenderMode::Flat, false) => path.to_string(),
                (RenderMode::Tree, _) => name.to_string(),
            };
            if let Some(link) = node.link().filter(|_| !options.hide_links) {
                label.push_str(&format!(" [{}]", link.shorten(options.home)));
            }
            let prefix = match options.mode {
                RenderMode::Flat => String::new(),
                RenderMode::Tree => TREE_BRANCH.repeat(depth),
            };
            RenderedLine {
                prefix,
                label,
                folder: node.is_folder(),
            }
        })
        .collect()
}
