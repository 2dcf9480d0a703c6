//! Cleanup pass: delete originals that were copied
//!
//! Walks the whole tree in listing order. Only file nodes flagged as copied are
//! deleted; directories are never touched and unflagged files are reported as
//! skipped. A failed delete is logged and the walk carries on.

use crate::core::progress::{ProgressEvent, ProgressPhase, ProgressRenderer};
use crate::core::transfer::relative_device_path;
use crate::core::tree::{DeviceTree, NodeId};
use crate::device::traits::DeviceHandle;
use log::{debug, info, warn};

/// Statistics about one cleanup pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupStats {
    pub deleted: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for CleanupStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Deleted: {}, Skipped: {}, Errors: {}",
            self.deleted, self.skipped, self.errors
        )
    }
}

/// Delete every copied file of `tree` from the device
pub fn remove_copied<H: DeviceHandle + ?Sized>(
    handle: &H,
    tree: &DeviceTree,
    progress: &mut dyn ProgressRenderer,
) -> CleanupStats {
    let mut pass = CleanupPass {
        handle,
        tree,
        progress,
        stats: CleanupStats::default(),
        seen: 0,
        total: tree.file_count(),
    };

    pass.progress.start(ProgressPhase::Deleting, pass.total, 0);
    for id in tree.roots() {
        pass.visit(*id);
    }
    pass.progress.finish(ProgressPhase::Deleting);

    info!("Cleanup finished: {}", pass.stats);
    pass.stats
}

struct CleanupPass<'a, H: ?Sized> {
    handle: &'a H,
    tree: &'a DeviceTree,
    progress: &'a mut dyn ProgressRenderer,
    stats: CleanupStats,
    seen: usize,
    total: usize,
}

impl<H: DeviceHandle + ?Sized> CleanupPass<'_, H> {
    fn visit(&mut self, id: NodeId) {
        let tree = self.tree;
        let node = tree.node(id);

        if !node.is_dir() {
            self.seen += 1;
            self.progress.update(&ProgressEvent {
                phase: ProgressPhase::Deleting,
                current: self.seen,
                total: self.total,
                bytes_done: 0,
                bytes_total: 0,
                label: relative_device_path(&node.path, tree.root_path()),
            });

            if node.was_copied() {
                match self.handle.delete(&node.object.id) {
                    Ok(()) => {
                        debug!("Deleting of '{}' - done", node.path);
                        self.stats.deleted += 1;
                    }
                    Err(e) => {
                        warn!("Deleting of '{}' - failed: {}", node.path, e);
                        self.stats.errors += 1;
                    }
                }
            } else {
                info!("Deleting of '{}' - skipped", node.path);
                self.stats.skipped += 1;
            }
        }

        for child in &node.children {
            self.visit(*child);
        }
    }
}
