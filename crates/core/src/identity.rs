//! Object identities and reference sets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fully-qualified address of a resource instance in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectIdentity {
    pub namespace: String,
    pub name: String,
    pub group: String,
    pub kind: String,
}

impl ObjectIdentity {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        group: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self { namespace: namespace.into(), name: name.into(), group: group.into(), kind: kind.into() }
    }

    /// `Kind.group`, or just `Kind` for the core group.
    pub fn group_kind(&self) -> String {
        if self.group.is_empty() {
            self.kind.clone()
        } else {
            format!("{}.{}", self.kind, self.group)
        }
    }
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.group_kind(), self.namespace, self.name)
    }
}

/// Build one identity per name, sharing namespace, group and kind.
/// Input order is kept and duplicates are passed through.
pub fn build_references<I, S>(names: I, namespace: &str, group: &str, kind: &str) -> Vec<ObjectIdentity>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| ObjectIdentity::new(namespace, name.as_ref(), group, kind))
        .collect()
}

/// References to controller deployments (`apps/Deployment`) in `namespace`.
pub fn component_references<I, S>(components: I, namespace: &str) -> Vec<ObjectIdentity>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    build_references(components, namespace, "apps", "Deployment")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_identities_in_input_order() {
        let refs = build_references(["a", "b"], "ns1", "apps", "Deployment");
        assert_eq!(
            refs,
            vec![
                ObjectIdentity::new("ns1", "a", "apps", "Deployment"),
                ObjectIdentity::new("ns1", "b", "apps", "Deployment"),
            ]
        );
    }

    #[test]
    fn empty_names_yield_empty_set() {
        let refs = build_references(Vec::<String>::new(), "ns1", "apps", "Deployment");
        assert!(refs.is_empty());
    }

    #[test]
    fn duplicates_are_kept() {
        let refs = build_references(["a", "a"], "ns", "", "ConfigMap");
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0], refs[1]);
    }

    #[test]
    fn component_refs_target_deployments() {
        let refs = component_references(vec!["source-controller".to_string()], "flux-system");
        assert_eq!(refs[0].group, "apps");
        assert_eq!(refs[0].kind, "Deployment");
        assert_eq!(refs[0].namespace, "flux-system");
        assert_eq!(refs[0].to_string(), "Deployment.apps/flux-system/source-controller");
    }

    #[test]
    fn core_group_renders_bare_kind() {
        let id = ObjectIdentity::new("default", "cm", "", "ConfigMap");
        assert_eq!(id.group_kind(), "ConfigMap");
        assert_eq!(id.to_string(), "ConfigMap/default/cm");
    }
}
