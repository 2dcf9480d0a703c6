//! Execution plan and plan iterator
//!
//! The plan is the flat, ordered list of files found in a [`DeviceTree`],
//! with a running byte total. It refers to tree nodes by [`NodeId`], so it
//! stays valid while the transfer pass flags nodes as copied.

use crate::core::tree::{DeviceTree, NodeId};

/// One file scheduled for transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanEntry {
    pub node: NodeId,
    pub size: u64,
}

/// Flattened list of files to transfer
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    entries: Vec<PlanEntry>,
    total_size: u64,
    root_dir: String,
}

impl ExecutionPlan {
    /// Create an empty plan for a device root path
    pub fn new(root_dir: &str) -> Self {
        Self {
            entries: Vec::new(),
            total_size: 0,
            root_dir: root_dir.to_string(),
        }
    }

    /// Flatten a tree: files in pre-order, directories traversed but never added
    pub fn build(tree: &DeviceTree) -> Self {
        let mut plan = Self::new(tree.root_path());
        for id in tree.roots() {
            plan.add_node(tree, *id);
        }
        plan
    }

    fn add_node(&mut self, tree: &DeviceTree, id: NodeId) {
        let node = tree.node(id);
        if node.is_dir() {
            for child in &node.children {
                self.add_node(tree, *child);
            }
        } else {
            self.add_file(id, node.size());
        }
    }

    /// Append a file, keeping the total in step
    pub fn add_file(&mut self, node: NodeId, size: u64) {
        self.entries.push(PlanEntry { node, size });
        self.total_size += size;
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn files_count(&self) -> usize {
        self.entries.len()
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Device root path relative paths are computed against
    pub fn root_dir(&self) -> &str {
        &self.root_dir
    }

    /// Human-readable total size (`"600 B"`, `"3.0 MiB"`)
    pub fn total_size_string(&self) -> String {
        format_size(self.total_size)
    }

    /// Fresh cursor positioned on the first file
    pub fn iter(&self) -> PlanIterator<'_> {
        PlanIterator {
            plan: self,
            index: 0,
            bytes_remaining: self.total_size,
        }
    }
}

/// Forward-only cursor over an [`ExecutionPlan`]
///
/// `bytes_remaining` still counts the current file until [`PlanIterator::next`]
/// moves past it. Advancing past the last file parks the cursor in a terminal
/// state where further calls change nothing.
#[derive(Debug, Clone)]
pub struct PlanIterator<'a> {
    plan: &'a ExecutionPlan,
    index: usize,
    bytes_remaining: u64,
}

impl<'a> PlanIterator<'a> {
    /// The file at the cursor, `None` once past the end
    pub fn current(&self) -> Option<&'a PlanEntry> {
        self.plan.entries.get(self.index)
    }

    /// Whether there is at least one more file after the current one
    pub fn has_next(&self) -> bool {
        self.files_total() > self.files_seen_count()
    }

    /// Advance by one and return the new current file
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&'a PlanEntry> {
        if !self.has_next() {
            self.index = self.files_total();
            self.bytes_remaining = 0;
            return None;
        }

        if let Some(entry) = self.current() {
            self.bytes_remaining = self.bytes_remaining.saturating_sub(entry.size);
        }
        self.index += 1;
        self.current()
    }

    /// 1-based count of files visited including the current one, capped at the total
    pub fn files_seen_count(&self) -> usize {
        if self.index >= self.files_total() {
            self.files_total()
        } else {
            self.index + 1
        }
    }

    pub fn files_total(&self) -> usize {
        self.plan.files_count()
    }

    /// Bytes not yet advanced past, including the current file
    pub fn bytes_remaining(&self) -> u64 {
        self.bytes_remaining
    }
}

/// Format a byte count with binary units (`"100 B"`, `"3.0 KiB"`, `"1.5 GiB"`)
pub fn format_size(size: u64) -> String {
    const UNIT: u64 = 1024;
    const PREFIXES: &[u8] = b"KMGTPE";

    if size < UNIT {
        return format!("{} B", size);
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = size / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!(
        "{:.1} {}iB",
        size as f64 / div as f64,
        PREFIXES[exp] as char
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::traits::DeviceObject;

    /// Tree of `count` files sized 100, 200, 300... directly under the root
    fn flat_tree(count: usize) -> DeviceTree {
        let mut tree = DeviceTree::new("/DCIM");
        for i in 0..count {
            let name = format!("file_{}", i);
            tree.insert(None, DeviceObject::file(&name, &name, (i as u64 + 1) * 100));
        }
        tree
    }

    fn plan_of(count: usize) -> (DeviceTree, ExecutionPlan) {
        let tree = flat_tree(count);
        let plan = ExecutionPlan::build(&tree);
        (tree, plan)
    }

    fn name_of<'t>(tree: &'t DeviceTree, entry: Option<&PlanEntry>) -> Option<&'t str> {
        entry.map(|e| tree.node(e.node).name.as_str())
    }

    #[test]
    fn test_empty_plan() {
        let plan = ExecutionPlan::new("/DCIM");
        assert!(plan.is_empty());
        assert_eq!(plan.files_count(), 0);
        assert_eq!(plan.total_size(), 0);
        assert_eq!(plan.total_size_string(), "0 B");
    }

    #[test]
    fn test_single_file_plan() {
        let (_, plan) = plan_of(1);
        assert!(!plan.is_empty());
        assert_eq!(plan.files_count(), 1);
        assert_eq!(plan.total_size(), 100);
        assert_eq!(plan.total_size_string(), "100 B");
    }

    #[test]
    fn test_three_file_plan() {
        let (_, plan) = plan_of(3);
        assert_eq!(plan.files_count(), 3);
        assert_eq!(plan.total_size(), 600);
        assert_eq!(plan.root_dir(), "/DCIM");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(3), "3 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(3 * 1024), "3.0 KiB");
        assert_eq!(format_size(1536), "1.5 KiB");
        assert_eq!(format_size(3 * 1024 * 1024 + 3), "3.0 MiB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024 + 3), "3.0 GiB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024 * 1024 + 3), "3.0 TiB");
    }

    #[test]
    fn test_build_is_preorder_files_only() {
        let mut tree = DeviceTree::new("/");
        let dcim = tree.insert(None, DeviceObject::folder("d", "DCIM")).unwrap();
        let a = tree.insert(Some(dcim), DeviceObject::folder("a", "100A")).unwrap();
        tree.insert(Some(a), DeviceObject::file("a1", "a1.jpg", 1));
        tree.insert(Some(a), DeviceObject::file("a2", "a2.jpg", 2));
        tree.insert(Some(dcim), DeviceObject::file("d1", "d1.jpg", 4));
        let b = tree.insert(Some(dcim), DeviceObject::folder("b", "100B")).unwrap();
        tree.insert(Some(b), DeviceObject::file("b1", "b1.jpg", 8));
        tree.insert(None, DeviceObject::folder("e", "EMPTY"));
        tree.insert(None, DeviceObject::file("t", "top.txt", 16));

        let plan = ExecutionPlan::build(&tree);
        let names: Vec<&str> = plan
            .entries()
            .iter()
            .map(|e| tree.node(e.node).name.as_str())
            .collect();
        assert_eq!(names, vec!["a1.jpg", "a2.jpg", "d1.jpg", "b1.jpg", "top.txt"]);
        assert_eq!(plan.total_size(), 31);
        assert_eq!(
            plan.total_size(),
            plan.entries().iter().map(|e| e.size).sum::<u64>()
        );
    }

    #[test]
    fn test_iterator_empty_plan() {
        let plan = ExecutionPlan::new("/");
        let it = plan.iter();
        assert!(!it.has_next());
        assert!(it.current().is_none());
        assert_eq!(it.files_seen_count(), 0);
        assert_eq!(it.files_total(), 0);
        assert_eq!(it.bytes_remaining(), 0);
    }

    #[test]
    fn test_iterator_single_file() {
        let (tree, plan) = plan_of(1);
        let mut it = plan.iter();

        assert!(!it.has_next());
        assert_eq!(name_of(&tree, it.current()), Some("file_0"));
        assert_eq!(it.files_seen_count(), 1);
        assert_eq!(it.files_total(), 1);
        assert_eq!(it.bytes_remaining(), 100);

        assert!(it.next().is_none());
        assert!(!it.has_next());
        assert!(it.current().is_none());
        assert_eq!(it.files_seen_count(), 1);
        assert_eq!(it.bytes_remaining(), 0);
    }

    #[test]
    fn test_iterator_three_files() {
        let (tree, plan) = plan_of(3);
        let mut it = plan.iter();

        assert!(it.has_next());
        assert_eq!(name_of(&tree, it.current()), Some("file_0"));
        assert_eq!(it.files_seen_count(), 1);
        assert_eq!(it.files_total(), 3);
        assert_eq!(it.bytes_remaining(), 600);

        assert_eq!(name_of(&tree, it.next()), Some("file_1"));
        assert!(it.has_next());
        assert_eq!(it.files_seen_count(), 2);
        assert_eq!(it.bytes_remaining(), 500);

        assert_eq!(name_of(&tree, it.next()), Some("file_2"));
        assert!(!it.has_next());
        assert_eq!(it.files_seen_count(), 3);
        assert_eq!(it.bytes_remaining(), 300);

        assert!(it.next().is_none());
        assert!(it.current().is_none());
        assert_eq!(it.files_seen_count(), 3);
        assert_eq!(it.bytes_remaining(), 0);
    }

    #[test]
    fn test_iterator_terminal_state_is_stable() {
        let (_, plan) = plan_of(4);
        let mut it = plan.iter();
        let mut visited = 1;
        while it.next().is_some() {
            visited += 1;
        }
        assert_eq!(visited, 4);

        for _ in 0..3 {
            assert!(it.next().is_none());
            assert_eq!(it.files_seen_count(), 4);
            assert_eq!(it.files_total(), 4);
            assert_eq!(it.bytes_remaining(), 0);
        }
    }

    #[test]
    fn test_iterators_are_independent() {
        let (_, plan) = plan_of(3);
        let mut first = plan.iter();
        first.next();
        first.next();

        let second = plan.iter();
        assert_eq!(second.files_seen_count(), 1);
        assert_eq!(second.bytes_remaining(), 600);
        assert_eq!(first.bytes_remaining(), 300);
    }
}
