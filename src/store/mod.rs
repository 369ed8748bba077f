mod folder;
mod paths;
mod session;
mod tree;

pub use folder::{Folder, FolderItemRef, FolderSet};
pub use paths::{data_dir, ensure_data_dir};
pub use session::SessionStore;
pub use tree::{build_tree, FolderItem, FolderNode, FolderTree};
