use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Identity of a workload (pod) being admitted.
///
/// `annotations` carries the object's annotations as last seen by the caller; the
/// retry counter is read from them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadRef {
    pub name: String,
    pub namespace: String,
    pub uid: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl WorkloadRef {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        uid: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            uid: uid.into(),
            annotations: BTreeMap::new(),
        }
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Key used by the node-state trackers: `{name}-{namespace}-{uid}`.
    pub fn storage_key(&self) -> String {
        format!("{}-{}-{}", self.name, self.namespace, self.uid)
    }
}

impl Display for WorkloadRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key() {
        let workload = WorkloadRef::new("web-0", "shop", "33d30e5a");
        assert_eq!(workload.storage_key(), "web-0-shop-33d30e5a");
        assert_eq!(workload.to_string(), "shop/web-0");
    }

    #[test]
    fn test_deserialize_without_annotations() {
        let workload: WorkloadRef =
            serde_json::from_str(r#"{"name":"a","namespace":"b","uid":"c"}"#).unwrap();
        assert!(workload.annotations.is_empty());
    }
}
