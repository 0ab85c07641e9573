#![forbid(unsafe_code)]

use async_trait::async_trait;
use kstatus_core::{
    check_ready, Condition, ConditionSource, ConditionStatus, FetchError, ObjectIdentity, ObjectStore,
    ObjectWithConditions, Statusable, READY_CONDITION,
};
use metrics_exporter_prometheus::PrometheusBuilder;

#[derive(Default)]
struct Release { generation: i64, observed: i64, conditions: Vec<Condition> }

impl ObjectWithConditions for Release {
    fn conditions(&self) -> &[Condition] { &self.conditions }
}

impl Statusable for Release {
    type Target = Self;
    fn generation(&self) -> i64 { self.generation }
    fn observed_generation(&self) -> i64 { self.observed }
    fn fetch_target(&mut self) -> &mut Self { self }
    fn condition_source(&self) -> ConditionSource<'_> { ConditionSource::current(self) }
}

struct ReadyStore;

#[async_trait]
impl ObjectStore<Release> for ReadyStore {
    async fn fetch(&self, _identity: &ObjectIdentity, into: &mut Release) -> Result<(), FetchError> {
        into.generation = 2;
        into.observed = 2;
        into.conditions = vec![Condition::new(READY_CONDITION, ConditionStatus::True, "Release reconciliation succeeded")];
        Ok(())
    }
}

#[tokio::test]
async fn readiness_counters_reach_prometheus_exporter() {
    let handle = PrometheusBuilder::new().install_recorder().expect("install recorder");
    let id = ObjectIdentity::new("flux-system", "podinfo", "helm.toolkit.fluxcd.io", "HelmRelease");
    let mut obj = Release::default();

    assert!(check_ready(&ReadyStore, &id, &mut obj).await.unwrap().is_ready());

    let rendered = handle.render();
    assert!(rendered.contains("readiness_checks"), "missing readiness_checks in:\n{}", rendered);
    assert!(rendered.contains("readiness_ready"), "missing readiness_ready in:\n{}", rendered);
}
