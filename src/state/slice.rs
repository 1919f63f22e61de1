use std::ops::Deref;
use std::sync::Arc;

use serde_json::Value;

use super::resolve;

static MISSING: Value = Value::Null;

/// A module's view into a state snapshot.
///
/// Holds the root snapshot it was taken from plus the module path, and
/// dereferences to the subtree at that path (`Value::Null` if the path no
/// longer exists).
#[derive(Clone)]
pub struct StateSlice {
    root: Arc<Value>,
    path: Vec<String>,
}

impl StateSlice {
    pub(crate) fn new(root: Arc<Value>, path: Vec<String>) -> Self {
        Self { root, path }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The snapshot this slice was cut from.
    pub fn root(&self) -> &Arc<Value> {
        &self.root
    }

    pub fn exists(&self) -> bool {
        resolve(&self.root, &self.path).is_some()
    }

    pub fn clone_value(&self) -> Value {
        self.deref().clone()
    }
}

impl Deref for StateSlice {
    type Target = Value;

    fn deref(&self) -> &Value {
        resolve(&self.root, &self.path).unwrap_or(&MISSING)
    }
}

impl std::fmt::Debug for StateSlice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateSlice")
            .field("path", &self.path)
            .field("value", self.deref())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn derefs_to_subtree() {
        let root = Arc::new(json!({"cart": {"items": [1, 2]}}));
        let slice = StateSlice::new(root, vec!["cart".to_string()]);
        assert!(slice.exists());
        assert_eq!(slice["items"], json!([1, 2]));
    }

    #[test]
    fn missing_path_reads_as_null() {
        let root = Arc::new(json!({}));
        let slice = StateSlice::new(root, vec!["gone".to_string()]);
        assert!(!slice.exists());
        assert!(slice.is_null());
    }
}
