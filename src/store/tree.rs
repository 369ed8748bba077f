use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::models::Session;
use crate::store::folder::{FolderItemRef, FolderSet};

/// Resolved child of a folder: the session itself, or a fully built
/// sub-folder node.
#[derive(Debug, Clone, PartialEq)]
pub enum FolderItem {
    Session(Session),
    Folder(FolderNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FolderNode {
    pub id: String,
    pub name: String,
    pub parent_folder_id: Option<String>,
    pub items: Vec<FolderItem>,
}

impl FolderNode {
    pub fn is_root(&self) -> bool {
        self.parent_folder_id.is_none()
    }
}

/// Hierarchical view derived from the flat session list plus folder
/// membership. Pure data: no UI state lives here.
#[derive(Debug, Clone, Default)]
pub struct FolderTree {
    /// Every resolvable folder, keyed by id (roots and nested alike).
    pub folders: HashMap<String, FolderNode>,
    /// Root folder ids in folder-store order.
    pub root_ids: Vec<String>,
    /// Sessions belonging to no folder, in session-store order.
    pub no_folder_sessions: Vec<Session>,
    /// Folders skipped because their parent chain or item graph loops.
    /// Sibling branches still build.
    pub rejected: Vec<String>,
}

impl FolderTree {
    /// Folders eligible for top-level rendering, in folder-store order.
    pub fn roots(&self) -> Vec<&FolderNode> {
        self.root_ids
            .iter()
            .filter_map(|id| self.folders.get(id))
            .collect()
    }
}

/// Derive the folder tree. Single pass over sessions for membership, then
/// recursive attachment of children; each recursion path carries a
/// visited set so a cyclic structure fails with `FolderCycle` instead of
/// looping. Items referencing unknown sessions or folders are skipped.
pub fn build_tree(sessions: &[Session], set: &FolderSet) -> FolderTree {
    let by_id: HashMap<&str, &Session> =
        sessions.iter().map(|s| (s.id.as_str(), s)).collect();

    let in_folder: HashSet<&str> = set
        .folders()
        .iter()
        .flat_map(|f| f.items.iter())
        .filter_map(|item| match item {
            FolderItemRef::Session { id } => Some(id.as_str()),
            FolderItemRef::Folder { .. } => None,
        })
        .collect();

    let mut tree = FolderTree::default();
    for folder in set.folders() {
        if let Err(Error::FolderCycle { folder_id }) = check_parent_chain(&folder.id, set) {
            tree.rejected.push(folder_id);
            continue;
        }
        let mut path = HashSet::new();
        match resolve_node(&folder.id, set, &by_id, &mut path) {
            Ok(node) => {
                if node.is_root() {
                    tree.root_ids.push(folder.id.clone());
                }
                tree.folders.insert(folder.id.clone(), node);
            }
            Err(Error::FolderCycle { folder_id }) => tree.rejected.push(folder_id),
            Err(_) => {}
        }
    }

    tree.no_folder_sessions = sessions
        .iter()
        .filter(|s| !in_folder.contains(s.id.as_str()))
        .cloned()
        .collect();
    tree
}

/// Resolve one folder id into a node. Fails with `FolderCycle` if the
/// folder's descendants loop back into the current path.
pub fn resolve_node(
    folder_id: &str,
    set: &FolderSet,
    sessions: &HashMap<&str, &Session>,
    path: &mut HashSet<String>,
) -> Result<FolderNode> {
    if !path.insert(folder_id.to_string()) {
        return Err(Error::FolderCycle {
            folder_id: folder_id.to_string(),
        });
    }
    let folder = set
        .get(folder_id)
        .ok_or_else(|| Error::missing(format!("folder {}", folder_id)))?;

    let mut items = Vec::new();
    for item in &folder.items {
        match item {
            FolderItemRef::Session { id } => {
                // Dangling session refs are dropped, not fatal.
                if let Some(session) = sessions.get(id.as_str()) {
                    items.push(FolderItem::Session((*session).clone()));
                }
            }
            FolderItemRef::Folder { id } => match resolve_node(id, set, sessions, path) {
                Ok(node) => items.push(FolderItem::Folder(node)),
                Err(err @ Error::FolderCycle { .. }) => return Err(err),
                Err(_) => {}
            },
        }
    }

    path.remove(folder_id);
    Ok(FolderNode {
        id: folder.id.clone(),
        name: folder.name.clone(),
        parent_folder_id: folder.parent_folder_id.clone(),
        items,
    })
}

/// Walk `parent_folder_id` links upward. The chain must terminate within
/// the total folder count.
fn check_parent_chain(folder_id: &str, set: &FolderSet) -> Result<()> {
    let mut seen = HashSet::new();
    let mut current = Some(folder_id.to_string());
    while let Some(id) = current {
        if !seen.insert(id.clone()) {
            return Err(Error::FolderCycle { folder_id: id });
        }
        current = set.get(&id).and_then(|f| f.parent_folder_id.clone());
    }
    Ok(())
}
