use super::node::ModuleNode;
use super::raw::Module;
use crate::error::{display_path, StoreError};

/// Owns the root module and every descendant, addressed by path.
pub(crate) struct ModuleTree {
    root: ModuleNode,
}

impl ModuleTree {
    pub(crate) fn new(raw: &Module) -> Result<Self, StoreError> {
        Ok(Self {
            root: ModuleNode::build(raw, &[], false)?,
        })
    }

    pub(crate) fn root(&self) -> &ModuleNode {
        &self.root
    }

    /// Node at `path`; the empty path is the root.
    pub(crate) fn get(&self, path: &[String]) -> Option<&ModuleNode> {
        path.iter()
            .try_fold(&self.root, |module, key| module.child(key))
    }

    fn get_mut(&mut self, path: &[String]) -> Option<&mut ModuleNode> {
        path.iter()
            .try_fold(&mut self.root, |module, key| module.child_mut(key))
    }

    pub(crate) fn has(&self, path: &[String]) -> bool {
        self.get(path).is_some()
    }

    /// Namespace of the module at `path`: `key/` for every namespaced
    /// module walked through, in root-to-leaf order.
    pub(crate) fn namespace(&self, path: &[String]) -> String {
        let mut module = &self.root;
        let mut namespace = String::new();
        for key in path {
            let Some(child) = module.child(key) else {
                break;
            };
            module = child;
            if module.namespaced() {
                namespace.push_str(key);
                namespace.push('/');
            }
        }
        namespace
    }

    /// Build `raw` and insert it at `path`. Its parent must exist.
    pub(crate) fn register(
        &mut self,
        path: &[String],
        raw: &Module,
        runtime: bool,
    ) -> Result<(), StoreError> {
        let Some((key, parent_path)) = path.split_last() else {
            return Err(StoreError::RootRegistration);
        };
        if key.is_empty() || key.contains('/') {
            return Err(StoreError::InvalidModule {
                path: display_path(path),
                message: format!(
                    "module key '{}' must be non-empty and must not contain '/'",
                    key
                ),
            });
        }

        let node = ModuleNode::build(raw, path, runtime)?;
        let parent = self
            .get_mut(parent_path)
            .ok_or_else(|| StoreError::ModuleNotFound {
                path: display_path(parent_path),
            })?;

        if parent.add_child(key.clone(), node).is_some() {
            tracing::warn!(path = %display_path(path), "Replaced an existing module");
        }
        Ok(())
    }

    /// Remove the runtime module at `path`. Returns whether anything was
    /// removed; missing and static modules are left alone with a warning.
    pub(crate) fn unregister(&mut self, path: &[String]) -> bool {
        let Some((key, parent_path)) = path.split_last() else {
            tracing::warn!("Cannot unregister the root module");
            return false;
        };
        let Some(parent) = self.get_mut(parent_path) else {
            tracing::warn!(
                path = %display_path(path),
                "Trying to unregister a module that is not registered"
            );
            return false;
        };

        let runtime = match parent.child(key) {
            Some(child) => child.runtime(),
            None => {
                tracing::warn!(
                    path = %display_path(path),
                    "Trying to unregister a module that is not registered"
                );
                return false;
            }
        };
        if !runtime {
            tracing::warn!(
                path = %display_path(path),
                "Cannot unregister a module declared at store construction"
            );
            return false;
        }
        parent.remove_child(key).is_some()
    }

    /// Hot-replace definitions across the existing tree.
    ///
    /// Shape errors in `raw` are returned before anything changes. Structural
    /// changes are not applied: new child modules and namespace toggles on
    /// modules with children are reported and skipped.
    pub(crate) fn update(&mut self, raw: &Module) -> Result<(), StoreError> {
        raw.validate(&[])?;
        let mut path = Vec::new();
        update_node(&mut path, &mut self.root, raw);
        Ok(())
    }
}

fn update_node(path: &mut Vec<String>, target: &mut ModuleNode, update: &Module) {
    let mut update_definitions = update.clone();
    if let Some(namespaced) = update.namespaced {
        if namespaced != target.namespaced() && target.has_children() {
            tracing::error!(
                path = %display_path(path),
                namespaced,
                "Hot update cannot toggle 'namespaced' on a module with children; \
                 keeping the current setting, a manual reload is needed"
            );
            update_definitions.namespaced = None;
        }
    }
    target.update_definitions(&update_definitions);

    for (key, child_update) in &update.modules {
        path.push(key.clone());
        match target.child_mut(key) {
            Some(child) => update_node(path, child, child_update),
            None => {
                tracing::warn!(
                    path = %display_path(path),
                    "Trying to add a new module on hot reloading, a manual reload is needed"
                );
                path.pop();
                return;
            }
        }
        path.pop();
    }
}
