//! Hierarchical directory of global variables.
//!
//! A tree of named directories, each mapping symbol names to objects. The
//! runtime walks the whole tree when marking GC roots, so anything stored
//! here stays alive until purged.

use std::collections::HashMap;

use crate::runtime::ObjectId;

/// One directory level.
#[derive(Clone, Debug, Default)]
pub struct Directory {
    vars: HashMap<String, ObjectId>,
    subdirs: HashMap<String, Directory>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, name: &str, id: ObjectId) {
        self.vars.insert(name.to_string(), id);
    }

    pub fn recall(&self, name: &str) -> Option<ObjectId> {
        self.vars.get(name).copied()
    }

    pub fn purge(&mut self, name: &str) -> Option<ObjectId> {
        self.vars.remove(name)
    }

    pub fn has_var(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Names of all variables at this level, unordered.
    pub fn var_names(&self) -> impl Iterator<Item = &String> {
        self.vars.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty() && self.subdirs.is_empty()
    }

    fn visit(&self, f: &mut dyn FnMut(ObjectId)) {
        for id in self.vars.values() {
            f(*id);
        }
        for sub in self.subdirs.values() {
            sub.visit(f);
        }
    }
}

/// The full tree plus the current position.
#[derive(Clone, Debug, Default)]
pub struct DirectoryTree {
    root: Directory,
    /// Path from root to the current directory; empty means home.
    path: Vec<String>,
}

impl DirectoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn is_at_home(&self) -> bool {
        self.path.is_empty()
    }

    pub fn home(&mut self) {
        self.path.clear();
    }

    /// Up one level; false when already at home.
    pub fn updir(&mut self) -> bool {
        self.path.pop().is_some()
    }

    fn current(&self) -> &Directory {
        let mut dir = &self.root;
        for name in &self.path {
            dir = dir.subdirs.get(name).expect("directory path out of sync");
        }
        dir
    }

    fn current_mut(&mut self) -> &mut Directory {
        let mut dir = &mut self.root;
        for name in &self.path {
            dir = dir
                .subdirs
                .get_mut(name)
                .expect("directory path out of sync");
        }
        dir
    }

    pub fn store(&mut self, name: &str, id: ObjectId) {
        self.current_mut().store(name, id);
    }

    /// Look a name up in the current directory, then in each enclosing
    /// directory up to home.
    pub fn recall(&self, name: &str) -> Option<ObjectId> {
        let mut dir = &self.root;
        let mut chain = vec![dir];
        for part in &self.path {
            dir = dir.subdirs.get(part).expect("directory path out of sync");
            chain.push(dir);
        }
        chain.iter().rev().find_map(|d| d.recall(name))
    }

    /// All variable names visible from the current directory.
    pub fn recall_all(&self) -> Vec<String> {
        let mut names: Vec<String> = self.current().var_names().cloned().collect();
        names.sort();
        names
    }

    pub fn purge(&mut self, name: &str) -> Option<ObjectId> {
        self.current_mut().purge(name)
    }

    pub fn has_var(&self, name: &str) -> bool {
        self.current().has_var(name)
    }

    /// Create a subdirectory; false when the name is taken.
    pub fn create_subdir(&mut self, name: &str) -> bool {
        let dir = self.current_mut();
        if dir.subdirs.contains_key(name) || dir.vars.contains_key(name) {
            return false;
        }
        dir.subdirs.insert(name.to_string(), Directory::new());
        true
    }

    /// Change into a subdirectory; false when it does not exist.
    pub fn cd(&mut self, name: &str) -> bool {
        if self.current().subdirs.contains_key(name) {
            self.path.push(name.to_string());
            true
        } else {
            false
        }
    }

    /// Visit every stored object id in the whole tree.
    pub fn visit(&self, f: &mut dyn FnMut(ObjectId)) {
        self.root.visit(f);
    }

    /// Flatten the tree for persistence: (path, name, id) triples.
    pub fn flatten(&self) -> Vec<(Vec<String>, String, ObjectId)> {
        let mut out = Vec::new();
        fn walk(
            dir: &Directory,
            path: &mut Vec<String>,
            out: &mut Vec<(Vec<String>, String, ObjectId)>,
        ) {
            let mut names: Vec<&String> = dir.vars.keys().collect();
            names.sort();
            for name in names {
                out.push((path.clone(), name.clone(), dir.vars[name]));
            }
            let mut subs: Vec<&String> = dir.subdirs.keys().collect();
            subs.sort();
            for sub in subs {
                path.push(sub.clone());
                walk(&dir.subdirs[sub], path, out);
                path.pop();
            }
        }
        walk(&self.root, &mut Vec::new(), &mut out);
        out
    }

    /// Rebuild a tree from flattened triples.
    pub fn from_flat(entries: Vec<(Vec<String>, String, ObjectId)>) -> Self {
        let mut tree = Self::new();
        for (path, name, id) in entries {
            let mut dir = &mut tree.root;
            for part in path {
                dir = dir
                    .subdirs
                    .entry(part)
                    .or_insert_with(Directory::new);
            }
            dir.store(&name, id);
        }
        tree
    }
}
