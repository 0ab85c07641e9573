//! kstatus kubehub – kube-rs store client and the dynamic object adapter

#![forbid(unsafe_code)]

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use kube::{
    api::{Api, ObjectMeta},
    core::{ApiResource, DynamicObject},
    discovery::{Discovery, Scope},
    Client,
};
use kstatus_core::{Condition, ConditionSource, FetchError, ObjectIdentity, ObjectStore, Statusable};
use metrics::counter;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub async fn get_kube_client() -> Result<Client> {
    Client::try_default().await.context("building kube client from default config")
}

/// Store client backed by the cluster API. Kinds are resolved through
/// discovery once and cached by group/kind.
pub struct KubeStore {
    client: Client,
    resources: RwLock<FxHashMap<(String, String), (ApiResource, bool)>>,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client, resources: RwLock::new(FxHashMap::default()) }
    }

    pub async fn try_default() -> Result<Self> {
        Ok(Self::new(get_kube_client().await?))
    }

    async fn api_resource(&self, group: &str, kind: &str) -> Result<(ApiResource, bool)> {
        let key = (group.to_string(), kind.to_string());
        if let Some(hit) = self.resources.read().await.get(&key) {
            return Ok(hit.clone());
        }
        let resolved = find_api_resource(self.client.clone(), group, kind).await?;
        self.resources.write().await.insert(key, resolved.clone());
        Ok(resolved)
    }

    async fn api_for(&self, identity: &ObjectIdentity) -> Result<Api<DynamicObject>> {
        let (ar, namespaced) = self.api_resource(&identity.group, &identity.kind).await?;
        let api = if namespaced {
            if identity.namespace.is_empty() {
                return Err(anyhow!("namespace required for namespaced kind {}", identity.group_kind()));
            }
            Api::namespaced_with(self.client.clone(), &identity.namespace, &ar)
        } else {
            Api::all_with(self.client.clone(), &ar)
        };
        Ok(api)
    }
}

async fn find_api_resource(client: Client, group: &str, kind: &str) -> Result<(ApiResource, bool)> {
    let discovery = Discovery::new(client)
        .filter(&[group])
        .run()
        .await
        .with_context(|| format!("discovering API group {:?}", group))?;
    for g in discovery.groups() {
        if let Some((ar, caps)) = g.recommended_kind(kind) {
            let namespaced = matches!(caps.scope, Scope::Namespaced);
            debug!(group = %group, kind = %kind, version = %ar.version, namespaced, "resolved kind");
            return Ok((ar, namespaced));
        }
    }
    Err(anyhow!("kind not served: {} (group {:?})", kind, group))
}

fn is_not_found(e: &kube::Error) -> bool {
    matches!(e, kube::Error::Api(resp) if resp.code == 404)
}

#[async_trait]
impl ObjectStore<DynamicObject> for KubeStore {
    async fn fetch(&self, identity: &ObjectIdentity, into: &mut DynamicObject) -> Result<(), FetchError> {
        let api = self.api_for(identity).await?;
        match api.get(&identity.name).await {
            Ok(obj) => {
                *into = obj;
                Ok(())
            }
            Err(e) if is_not_found(&e) => Err(FetchError::NotFound(identity.clone())),
            Err(e) => {
                counter!("kube_fetch_errors").increment(1);
                warn!(object = %identity, error = %e, "get failed");
                Err(FetchError::Store(anyhow::Error::new(e).context(format!("getting {}", identity))))
            }
        }
    }
}

/// Statusable adapter for untyped objects following the usual
/// `status.observedGeneration` / `status.conditions` layout.
#[derive(Debug, Clone)]
pub struct DynamicResource {
    pub object: DynamicObject,
}

impl DynamicResource {
    /// Empty placeholder addressed at `identity`, filled in by the first fetch.
    pub fn new(identity: &ObjectIdentity) -> Self {
        let metadata = ObjectMeta {
            name: Some(identity.name.clone()),
            namespace: (!identity.namespace.is_empty()).then(|| identity.namespace.clone()),
            ..Default::default()
        };
        Self { object: DynamicObject { types: None, metadata, data: serde_json::Value::Null } }
    }

    pub fn from_object(object: DynamicObject) -> Self { Self { object } }

    fn status(&self) -> Option<&serde_json::Value> { self.object.data.get("status") }

    /// Conditions under `status.conditions`; entries that do not decode are skipped.
    pub fn conditions(&self) -> Vec<Condition> {
        let Some(raw) = self.status().and_then(|s| s.get("conditions")).and_then(|c| c.as_array()) else {
            return Vec::new();
        };
        raw.iter()
            .filter_map(|v| match serde_json::from_value::<Condition>(v.clone()) {
                Ok(c) => Some(c),
                Err(e) => {
                    debug!(error = %e, "skipping malformed condition");
                    None
                }
            })
            .collect()
    }
}

impl Statusable for DynamicResource {
    type Target = DynamicObject;

    fn generation(&self) -> i64 { self.object.metadata.generation.unwrap_or(0) }

    fn observed_generation(&self) -> i64 {
        self.status().and_then(|s| s.get("observedGeneration")).and_then(|v| v.as_i64()).unwrap_or(0)
    }

    fn fetch_target(&mut self) -> &mut DynamicObject { &mut self.object }

    fn condition_source(&self) -> ConditionSource<'_> { ConditionSource::owned(self.conditions()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kstatus_core::{resolve_conditions, ConditionStatus, Pending, Readiness, ReadinessCheck};

    fn dynamic(raw: serde_json::Value) -> DynamicResource {
        DynamicResource::from_object(serde_json::from_value(raw).unwrap())
    }

    fn kustomization(generation: i64, observed: i64, conditions: serde_json::Value) -> DynamicResource {
        dynamic(serde_json::json!({
            "apiVersion": "kustomize.toolkit.fluxcd.io/v1",
            "kind": "Kustomization",
            "metadata": { "name": "apps", "namespace": "flux-system", "generation": generation },
            "status": { "observedGeneration": observed, "conditions": conditions }
        }))
    }

    #[test]
    fn reads_generation_pair_and_conditions() {
        let r = kustomization(3, 2, serde_json::json!([
            { "type": "Ready", "status": "True", "reason": "ReconciliationSucceeded", "message": "Applied revision: main@sha1:1234" }
        ]));
        assert_eq!(r.generation(), 3);
        assert_eq!(r.observed_generation(), 2);
        let conds = resolve_conditions(&r);
        assert_eq!(conds.len(), 1);
        assert_eq!(conds[0].status, ConditionStatus::True);
        assert_eq!(conds[0].reason, "ReconciliationSucceeded");
    }

    #[test]
    fn missing_status_defaults_to_zero_and_empty() {
        let r = dynamic(serde_json::json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": "cm", "namespace": "default" }
        }));
        assert_eq!(r.generation(), 0);
        assert_eq!(r.observed_generation(), 0);
        assert!(resolve_conditions(&r).is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let r = kustomization(1, 1, serde_json::json!([
            { "status": "True" },
            { "type": "Ready", "status": "False", "message": "kustomize build failed" }
        ]));
        let conds = r.conditions();
        assert_eq!(conds.len(), 1);
        assert_eq!(conds[0].message, "kustomize build failed");
    }

    #[test]
    fn null_message_still_fails() {
        let r = kustomization(4, 4, serde_json::json!([
            { "type": "Ready", "status": "False", "reason": "ArtifactFailed", "message": null }
        ]));
        assert_eq!(r.conditions().len(), 1);
        let err = ReadinessCheck::default().evaluate(&r).unwrap_err();
        assert!(matches!(err, kstatus_core::CheckError::Failed { ref message } if message.is_empty()));
    }

    #[test]
    fn evaluates_dynamic_object() {
        let check = ReadinessCheck::default();
        let stale = kustomization(2, 1, serde_json::json!([]));
        assert_eq!(
            check.evaluate(&stale).unwrap(),
            Readiness::Pending(Pending::Stale { generation: 2, observed_generation: 1 })
        );
        let failed = kustomization(2, 2, serde_json::json!([
            { "type": "Ready", "status": "False", "message": "health check failed" }
        ]));
        assert_eq!(check.evaluate(&failed).unwrap_err().to_string(), "health check failed");
    }

    #[test]
    fn placeholder_carries_identity() {
        let id = ObjectIdentity::new("flux-system", "apps", "kustomize.toolkit.fluxcd.io", "Kustomization");
        let r = DynamicResource::new(&id);
        assert_eq!(r.object.metadata.name.as_deref(), Some("apps"));
        assert_eq!(r.object.metadata.namespace.as_deref(), Some("flux-system"));
        assert_eq!(r.generation(), 0);
    }

    #[test]
    fn only_404_counts_as_not_found() {
        let api_err = |code: u16, reason: &str| {
            kube::Error::Api(kube::error::ErrorResponse {
                status: "Failure".into(),
                message: format!("{} error", reason),
                reason: reason.into(),
                code,
            })
        };
        assert!(is_not_found(&api_err(404, "NotFound")));
        assert!(!is_not_found(&api_err(403, "Forbidden")));
        assert!(!is_not_found(&api_err(500, "InternalError")));
    }
}
