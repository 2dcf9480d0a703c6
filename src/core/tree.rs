//! Device tree walker
//!
//! Lists a device's object tree below a root path into an arena of
//! [`DeviceNode`]s. The arena owns every node; the execution plan and the
//! cleanup pass refer to nodes by [`NodeId`], so the `was_copied` flag set by
//! the transfer pass is visible to both.

use crate::core::config::DeviceConfig;
use crate::device::traits::{join_device_path, DeviceHandle, DeviceObject};
use log::{debug, trace, warn};
use std::collections::BTreeSet;

/// Index of a node inside a [`DeviceTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// One file or directory on the device
#[derive(Debug, Clone)]
pub struct DeviceNode {
    /// Absolute device-side path
    pub path: String,
    /// Leaf name
    pub name: String,
    /// Device-side path of the containing directory
    pub parent_dir: String,
    /// The object as reported by the device
    pub object: DeviceObject,
    /// Children in listing order (always empty for files)
    pub children: Vec<NodeId>,
    was_copied: bool,
}

impl DeviceNode {
    pub fn is_dir(&self) -> bool {
        self.object.is_dir
    }

    pub fn size(&self) -> u64 {
        self.object.size
    }

    /// Whether the file has been copied byte-for-byte to local disk
    pub fn was_copied(&self) -> bool {
        self.was_copied
    }
}

/// The listed tree below one device root path
#[derive(Debug, Clone, Default)]
pub struct DeviceTree {
    nodes: Vec<DeviceNode>,
    roots: Vec<NodeId>,
    root_path: String,
}

impl DeviceTree {
    /// Create an empty tree for a device root path
    pub fn new(root_path: &str) -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            root_path: root_path.to_string(),
        }
    }

    /// The device path the tree was listed from (its own node is not part of the tree)
    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// Top-level entries, directly under the root path
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &DeviceNode {
        &self.nodes[id.0]
    }

    /// Total number of nodes (files and directories)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of file nodes
    pub fn file_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_dir()).count()
    }

    /// All nodes in arena order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &DeviceNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Add an object under `parent` (or as a top-level entry when `None`)
    ///
    /// Adding below a file node is rejected and returns `None`.
    pub fn insert(&mut self, parent: Option<NodeId>, object: DeviceObject) -> Option<NodeId> {
        let parent_dir = match parent {
            Some(pid) => {
                let parent_node = &self.nodes[pid.0];
                if !parent_node.is_dir() {
                    return None;
                }
                parent_node.path.clone()
            }
            None => self.root_path.clone(),
        };

        let id = NodeId(self.nodes.len());
        self.nodes.push(DeviceNode {
            path: join_device_path(&parent_dir, &object.name),
            name: object.name.clone(),
            parent_dir,
            object,
            children: Vec::new(),
            was_copied: false,
        });

        match parent {
            Some(pid) => self.nodes[pid.0].children.push(id),
            None => self.roots.push(id),
        }
        Some(id)
    }

    /// Flag a file node as copied
    ///
    /// Returns `false` (and changes nothing) for directories and for files that
    /// were already flagged.
    pub fn mark_copied(&mut self, id: NodeId) -> bool {
        let node = &mut self.nodes[id.0];
        if node.is_dir() || node.was_copied {
            return false;
        }
        node.was_copied = true;
        true
    }

    fn sort_children(&mut self, parent: Option<NodeId>) {
        let mut ids = match parent {
            Some(pid) => std::mem::take(&mut self.nodes[pid.0].children),
            None => std::mem::take(&mut self.roots),
        };
        ids.sort_by(|a, b| self.nodes[a.0].name.cmp(&self.nodes[b.0].name));
        match parent {
            Some(pid) => self.nodes[pid.0].children = ids,
            None => self.roots = ids,
        }
    }
}

/// Builds [`DeviceTree`]s, skipping ignored system entries
#[derive(Debug, Clone)]
pub struct TreeWalker {
    ignored_names: BTreeSet<String>,
    sort_entries: bool,
}

impl Default for TreeWalker {
    fn default() -> Self {
        Self::from_config(&DeviceConfig::default())
    }
}

impl TreeWalker {
    /// Walker with an explicit ignore set, keeping device order
    pub fn new<I, S>(ignored_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignored_names: ignored_names.into_iter().map(Into::into).collect(),
            sort_entries: false,
        }
    }

    pub fn from_config(config: &DeviceConfig) -> Self {
        Self {
            ignored_names: config.ignored_names.clone(),
            sort_entries: config.sort_entries,
        }
    }

    /// Sort children by name instead of keeping device order
    pub fn sorted(mut self, sort_entries: bool) -> Self {
        self.sort_entries = sort_entries;
        self
    }

    /// Exact, case-sensitive match against the ignore set
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored_names.contains(name)
    }

    /// List everything below `root_path`
    ///
    /// The root's own node is not part of the result. A root that does not
    /// resolve yields an empty tree.
    pub fn walk<H: DeviceHandle + ?Sized>(&self, handle: &H, root_path: &str) -> DeviceTree {
        let mut tree = DeviceTree::new(root_path);

        let root = match handle.find_object(root_path) {
            Some(obj) => obj,
            None => {
                debug!("{} was not found", root_path);
                return tree;
            }
        };

        if !root.is_dir {
            debug!("{} is not a directory", root_path);
            return tree;
        }

        self.add_children(handle, &mut tree, None, root_path, &root.id);
        tree
    }

    fn add_children<H: DeviceHandle + ?Sized>(
        &self,
        handle: &H,
        tree: &mut DeviceTree,
        parent: Option<NodeId>,
        dir_path: &str,
        object_id: &str,
    ) {
        let objects = match handle.list_children(object_id) {
            Ok(objects) => objects,
            Err(e) => {
                warn!("Unable to list '{}': {}", dir_path, e);
                return;
            }
        };

        for object in objects {
            if self.is_ignored(&object.name) {
                trace!("Skipping ignored entry '{}' in {}", object.name, dir_path);
                continue;
            }

            let is_dir = object.is_dir;
            let child_object_id = object.id.clone();
            let Some(id) = tree.insert(parent, object) else {
                continue;
            };
            let child_path = tree.node(id).path.clone();
            debug!("Reading info: {}", child_path);

            if is_dir {
                self.add_children(handle, tree, Some(id), &child_path, &child_object_id);
            }
        }

        if self.sort_entries {
            tree.sort_children(parent);
        }
    }
}
