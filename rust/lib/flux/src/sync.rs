//! Store ⇄ gateway reconciliation.
//!
//! Every mutation goes to the server first. On success the store is patched
//! locally and then overwritten by a full refetch, so the UI never drifts
//! from the server by more than one round trip. On failure the error is
//! recorded in the store and handed back to the caller for inline feedback.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use zonedesk_client::{ApiError, Gateway};
use zonedesk_types::{Ack, Availability, Resource};

use crate::state::ResourceState;
use crate::store::ResourceStore;

/// A [`ResourceStore`] bound to the [`Gateway`] that feeds it.
///
/// Cloning is cheap; clones share the same store and gateway.
pub struct SyncedStore<T: Resource> {
    store: Arc<ResourceStore<T>>,
    gateway: Arc<dyn Gateway<T>>,
}

impl<T: Resource> Clone for SyncedStore<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            gateway: self.gateway.clone(),
        }
    }
}

impl<T: Resource> SyncedStore<T> {
    pub fn new(gateway: Arc<dyn Gateway<T>>) -> Self {
        Self {
            store: Arc::new(ResourceStore::new()),
            gateway,
        }
    }

    pub fn store(&self) -> &Arc<ResourceStore<T>> {
        &self.store
    }

    pub fn snapshot(&self) -> ResourceState<T> {
        self.store.snapshot()
    }

    /// Reload the whole collection from the server.
    ///
    /// On failure the previous collection is kept, except when the list
    /// response was structurally invalid or a `success: false` envelope:
    /// then the collection is emptied.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        self.store.set_loading(true);
        match self.gateway.list().await {
            Ok(items) => {
                info!(resource = T::PATH, count = items.len(), "refreshed");
                self.store.replace_items(items);
                Ok(())
            }
            Err(err) => {
                let clear = err.is_malformed() || err.is_envelope_rejection();
                warn!(resource = T::PATH, cleared = clear, "refresh failed: {}", err);
                self.store.fail_refresh(err.to_string(), clear);
                Err(err)
            }
        }
    }

    /// Fetch one record and make it the current record.
    pub async fn get(&self, id: &str) -> Result<T, ApiError> {
        let record = self.gateway.get(id).await.map_err(|e| self.fail("get", e))?;
        self.store.replace_if_present(&record);
        self.store.set_current(record.clone());
        Ok(record)
    }

    pub async fn create(&self, draft: &T::Draft) -> Result<T, ApiError> {
        let created = self
            .gateway
            .create(draft)
            .await
            .map_err(|e| self.fail("create", e))?;
        info!(resource = T::PATH, id = created.uuid(), "created {}", T::LABEL);
        self.store.upsert(created.clone());
        self.reconcile().await;
        Ok(created)
    }

    /// Update a record; the server's response becomes the current record.
    pub async fn update(&self, id: &str, patch: &T::Patch) -> Result<T, ApiError> {
        let updated = self
            .gateway
            .update(id, patch)
            .await
            .map_err(|e| self.fail("update", e))?;
        info!(resource = T::PATH, id, "updated {}", T::LABEL);
        self.store.upsert(updated.clone());
        self.store.set_current(updated.clone());
        self.reconcile().await;
        Ok(updated)
    }

    /// Soft delete. An acknowledgement with `success: false` is a failure
    /// even though the request itself went through.
    pub async fn delete(&self, id: &str) -> Result<Ack, ApiError> {
        let ack = self.gateway.delete(id).await.map_err(|e| self.fail("delete", e))?;
        if !ack.success {
            let message = ack
                .message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("{} '{}' could not be deleted", T::LABEL, id));
            return Err(self.fail("delete", ApiError::Rejected(message)));
        }
        info!(resource = T::PATH, id, "deleted {}", T::LABEL);
        self.store.set_deleted_at(id, Some(Utc::now()));
        self.reconcile().await;
        Ok(ack)
    }

    /// Undo a soft delete. Whatever the server returns is applied as-is.
    pub async fn restore(&self, id: &str) -> Result<T, ApiError> {
        let restored = self
            .gateway
            .restore(id)
            .await
            .map_err(|e| self.fail("restore", e))?;
        info!(resource = T::PATH, id, "restored {}", T::LABEL);
        self.store.upsert(restored.clone());
        self.reconcile().await;
        Ok(restored)
    }

    /// Live uniqueness probe for forms. Does not touch the store.
    pub async fn check_uniqueness(
        &self,
        value: &str,
        exclude_id: Option<&str>,
    ) -> Result<Availability, ApiError> {
        self.gateway.check_uniqueness(value, exclude_id).await
    }

    /// Authoritative refetch after a successful mutation. A failure here is
    /// already recorded in the store and does not undo the mutation.
    async fn reconcile(&self) {
        if let Err(err) = self.refresh().await {
            debug!(resource = T::PATH, "reconciliation refresh failed: {}", err);
        }
    }

    fn fail(&self, op: &str, err: ApiError) -> ApiError {
        warn!(resource = T::PATH, op, "{} failed: {}", T::LABEL, err);
        self.store.set_error(err.to_string());
        err
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::state::fixtures::*;
    use crate::state::Topic;
    use zonedesk_types::{Zone, ZoneDraft, ZonePatch, ZoneType};

    #[derive(Clone, Copy, PartialEq)]
    enum ListMode {
        Ok,
        Down,
        Malformed,
        Refused,
        RefusedWithErrors,
        Invalid,
    }

    /// In-memory server: soft deletes, server-side timestamps, unsorted lists.
    struct FakeGateway {
        zones: Mutex<Vec<Zone>>,
        list_mode: Mutex<ListMode>,
        refuse_delete: AtomicBool,
        next_id: Mutex<u32>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeGateway {
        fn new(zones: Vec<Zone>) -> Arc<Self> {
            Arc::new(Self {
                zones: Mutex::new(zones),
                list_mode: Mutex::new(ListMode::Ok),
                refuse_delete: AtomicBool::new(false),
                next_id: Mutex::new(100),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn set_list_mode(&self, mode: ListMode) {
            *self.list_mode.lock().unwrap() = mode;
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn not_found(id: &str) -> ApiError {
            ApiError::NotFound(format!("zone '{}' not found", id))
        }
    }

    #[async_trait::async_trait]
    impl Gateway<Zone> for FakeGateway {
        async fn list(&self) -> Result<Vec<Zone>, ApiError> {
            self.record("list");
            match *self.list_mode.lock().unwrap() {
                ListMode::Ok => {
                    // Newest first, like an unsorted SQL result.
                    let mut zones = self.zones.lock().unwrap().clone();
                    zones.reverse();
                    Ok(zones)
                }
                ListMode::Down => Err(ApiError::Server {
                    status: 503,
                    message: "Service Unavailable".into(),
                }),
                ListMode::Malformed => Err(ApiError::Decode("response body: expected value".into())),
                ListMode::Refused => Err(ApiError::Rejected("Listing zones is disabled".into())),
                ListMode::RefusedWithErrors => Err(ApiError::Validation {
                    message: "bad filter".into(),
                    errors: [("q".to_string(), vec!["invalid".to_string()])].into(),
                    in_envelope: true,
                }),
                ListMode::Invalid => Err(ApiError::Validation {
                    message: "bad filter".into(),
                    errors: [("q".to_string(), vec!["invalid".to_string()])].into(),
                    in_envelope: false,
                }),
            }
        }

        async fn get(&self, id: &str) -> Result<Zone, ApiError> {
            self.record("get");
            let zones = self.zones.lock().unwrap();
            zones.iter().find(|z| z.uuid == id).cloned().ok_or_else(|| Self::not_found(id))
        }

        async fn create(&self, draft: &ZoneDraft) -> Result<Zone, ApiError> {
            self.record("create");
            if draft.zone_name.trim().is_empty() {
                return Err(ApiError::Validation {
                    message: "The zone name field is required.".into(),
                    errors: [("zone_name".to_string(), vec!["required".to_string()])].into(),
                    in_envelope: false,
                });
            }
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let mut zone = zone(&format!("z{}", *next), &draft.zone_name);
            zone.zone_type = draft.zone_type;
            zone.zone_code = draft.zone_code.clone();
            zone.description = draft.description.clone();
            self.zones.lock().unwrap().push(zone.clone());
            Ok(zone)
        }

        async fn update(&self, id: &str, patch: &ZonePatch) -> Result<Zone, ApiError> {
            self.record("update");
            let mut zones = self.zones.lock().unwrap();
            let zone = zones.iter_mut().find(|z| z.uuid == id).ok_or_else(|| Self::not_found(id))?;
            if let Some(name) = &patch.zone_name {
                zone.zone_name = name.clone();
            }
            if let Some(desc) = &patch.description {
                zone.description = Some(desc.clone());
            }
            zone.updated_at = ts(9);
            Ok(zone.clone())
        }

        async fn delete(&self, id: &str) -> Result<Ack, ApiError> {
            self.record("delete");
            if self.refuse_delete.load(Ordering::Relaxed) {
                return Ok(Ack {
                    success: false,
                    message: Some("Zone is assigned to an open scope sheet".into()),
                });
            }
            let mut zones = self.zones.lock().unwrap();
            let zone = zones.iter_mut().find(|z| z.uuid == id).ok_or_else(|| Self::not_found(id))?;
            zone.deleted_at = Some(ts(10));
            Ok(Ack {
                success: true,
                message: Some("Zone deleted".into()),
            })
        }

        async fn restore(&self, id: &str) -> Result<Zone, ApiError> {
            self.record("restore");
            let mut zones = self.zones.lock().unwrap();
            let zone = zones.iter_mut().find(|z| z.uuid == id).ok_or_else(|| Self::not_found(id))?;
            zone.deleted_at = None;
            Ok(zone.clone())
        }

        async fn check_uniqueness(
            &self,
            value: &str,
            exclude_id: Option<&str>,
        ) -> Result<Availability, ApiError> {
            self.record("check");
            let zones = self.zones.lock().unwrap();
            let taken = zones
                .iter()
                .any(|z| z.zone_code.as_deref() == Some(value) && Some(z.uuid.as_str()) != exclude_id);
            Ok(Availability { available: !taken })
        }
    }

    fn synced(gateway: &Arc<FakeGateway>) -> SyncedStore<Zone> {
        SyncedStore::new(gateway.clone())
    }

    // ========================================================================
    // refresh
    // ========================================================================

    #[tokio::test]
    async fn refresh_populates_empty_store() {
        let gw = FakeGateway::new(vec![zone("z1", "Attic")]);
        let zones = synced(&gw);
        assert!(zones.store().is_empty());
        assert!(!zones.store().loading());

        zones.refresh().await.unwrap();

        let state = zones.snapshot();
        assert_eq!(state.items, vec![zone("z1", "Attic")]);
        assert!(!state.loading);
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn refresh_matches_server_list_sorted_by_name() {
        let gw = FakeGateway::new(vec![zone("z1", "Roof"), zone("z2", "Attic"), zone("z3", "Garage")]);
        let zones = synced(&gw);
        zones.refresh().await.unwrap();
        assert_eq!(names(&zones.store().items()), vec!["Attic", "Garage", "Roof"]);
    }

    #[tokio::test]
    async fn refresh_sets_loading_for_the_duration() {
        let gw = FakeGateway::new(vec![zone("z1", "Attic")]);
        let zones = synced(&gw);
        let loading = Arc::new(Mutex::new(Vec::<bool>::new()));
        let loading_c = loading.clone();
        zones.store().subscribe(move |_, state| {
            loading_c.lock().unwrap().push(state.loading);
        });

        zones.refresh().await.unwrap();
        assert_eq!(*loading.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn network_failure_keeps_previous_collection() {
        let gw = FakeGateway::new(vec![zone("z1", "Attic")]);
        let zones = synced(&gw);
        zones.refresh().await.unwrap();

        gw.set_list_mode(ListMode::Down);
        let err = zones.refresh().await.unwrap_err();

        assert!(matches!(err, ApiError::Server { status: 503, .. }));
        let state = zones.snapshot();
        assert_eq!(state.items, vec![zone("z1", "Attic")]);
        assert!(!state.last_error.unwrap().is_empty());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn malformed_list_clears_collection() {
        let gw = FakeGateway::new(vec![zone("z1", "Attic")]);
        let zones = synced(&gw);
        zones.refresh().await.unwrap();

        gw.set_list_mode(ListMode::Malformed);
        assert!(zones.refresh().await.is_err());

        assert!(zones.store().is_empty());
        assert!(zones.store().last_error().unwrap().starts_with("decode:"));
    }

    #[tokio::test]
    async fn unsuccessful_list_envelope_clears_collection() {
        for (mode, expected) in [
            (ListMode::Refused, "Listing zones is disabled"),
            (ListMode::RefusedWithErrors, "bad filter"),
        ] {
            let gw = FakeGateway::new(vec![zone("z1", "Attic")]);
            let zones = synced(&gw);
            zones.refresh().await.unwrap();
            assert_eq!(zones.store().len(), 1);

            gw.set_list_mode(mode);
            let err = zones.refresh().await.unwrap_err();

            assert!(err.is_envelope_rejection());
            assert!(zones.store().is_empty());
            assert_eq!(zones.store().last_error().as_deref(), Some(expected));
            assert!(!zones.store().loading());
        }
    }

    #[tokio::test]
    async fn unprocessable_list_keeps_collection() {
        let gw = FakeGateway::new(vec![zone("z1", "Attic")]);
        let zones = synced(&gw);
        zones.refresh().await.unwrap();

        gw.set_list_mode(ListMode::Invalid);
        assert!(zones.refresh().await.is_err());

        assert_eq!(zones.store().items(), vec![zone("z1", "Attic")]);
        assert_eq!(zones.store().last_error().as_deref(), Some("bad filter"));
    }

    // ========================================================================
    // create / update
    // ========================================================================

    #[tokio::test]
    async fn create_then_refresh_yields_sorted_collection() {
        let gw = FakeGateway::new(vec![zone("z1", "Attic")]);
        let zones = synced(&gw);
        zones.refresh().await.unwrap();

        let created = zones
            .create(&ZoneDraft::new("Garage", ZoneType::Interior))
            .await
            .unwrap();

        assert_eq!(names(&zones.store().items()), vec!["Attic", "Garage"]);
        let occurrences = zones.store().items().iter().filter(|z| z.uuid == created.uuid).count();
        assert_eq!(occurrences, 1, "optimistic insert and refetch must not duplicate");
        assert_eq!(gw.calls(), vec!["list", "create", "list"]);
    }

    #[tokio::test]
    async fn create_failure_records_error_and_returns_it() {
        let gw = FakeGateway::new(vec![zone("z1", "Attic")]);
        let zones = synced(&gw);
        zones.refresh().await.unwrap();

        let err = zones
            .create(&ZoneDraft::new(" ", ZoneType::Roof))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Validation { .. }));
        assert_eq!(zones.store().last_error().as_deref(), Some("The zone name field is required."));
        assert_eq!(zones.store().len(), 1);
        assert_eq!(gw.calls(), vec!["list", "create"], "no refetch after a failed mutation");
    }

    #[tokio::test]
    async fn create_succeeds_even_if_reconciliation_fails() {
        let gw = FakeGateway::new(vec![]);
        let zones = synced(&gw);
        gw.set_list_mode(ListMode::Down);

        let created = zones
            .create(&ZoneDraft::new("Garage", ZoneType::Exterior))
            .await
            .unwrap();

        // The optimistic insert survives; the failed refetch is recorded.
        assert_eq!(zones.store().items(), vec![created]);
        assert!(zones.store().last_error().is_some());
    }

    #[tokio::test]
    async fn update_sets_current_and_reconciles() {
        let gw = FakeGateway::new(vec![zone("z1", "Attic"), zone("z2", "Garage")]);
        let zones = synced(&gw);
        zones.refresh().await.unwrap();

        let patch = ZonePatch {
            zone_name: Some("Workshop".into()),
            ..Default::default()
        };
        let updated = zones.update("z1", &patch).await.unwrap();

        assert_eq!(updated.zone_name, "Workshop");
        assert_eq!(updated.updated_at, ts(9));
        assert_eq!(zones.store().current(), Some(updated));
        assert_eq!(names(&zones.store().items()), vec!["Garage", "Workshop"]);
    }

    #[tokio::test]
    async fn update_unknown_is_not_found() {
        let gw = FakeGateway::new(vec![]);
        let zones = synced(&gw);
        let err = zones.update("nope", &ZonePatch::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(zones.store().current().is_none());
        assert!(zones.store().last_error().unwrap().contains("nope"));
    }

    // ========================================================================
    // delete / restore
    // ========================================================================

    #[tokio::test]
    async fn delete_moves_record_to_deleted_view() {
        let gw = FakeGateway::new(vec![zone("z1", "Attic"), zone("z2", "Garage")]);
        let zones = synced(&gw);
        zones.refresh().await.unwrap();

        let ack = zones.delete("z1").await.unwrap();
        assert!(ack.success);

        let z1 = zones.store().find("z1").unwrap();
        assert_eq!(z1.deleted_at, Some(ts(10)), "server timestamp wins after refetch");
        assert_eq!(names(&zones.store().filtered_view("")), vec!["Garage"]);
        assert_eq!(names(&zones.store().deleted_view("")), vec!["Attic"]);
    }

    #[tokio::test]
    async fn refused_delete_is_a_failure() {
        let gw = FakeGateway::new(vec![zone("z1", "Attic")]);
        let zones = synced(&gw);
        zones.refresh().await.unwrap();
        gw.refuse_delete.store(true, Ordering::Relaxed);

        let err = zones.delete("z1").await.unwrap_err();

        match err {
            ApiError::Rejected(msg) => assert_eq!(msg, "Zone is assigned to an open scope sheet"),
            other => panic!("expected Rejected, got: {:?}", other),
        }
        assert!(!zones.store().find("z1").unwrap().is_deleted());
        assert_eq!(
            zones.store().last_error().as_deref(),
            Some("Zone is assigned to an open scope sheet")
        );
        assert_eq!(gw.calls(), vec!["list", "delete"]);
    }

    #[tokio::test]
    async fn restore_returns_record_to_active_view() {
        let gw = FakeGateway::new(vec![zone("z1", "Attic")]);
        let zones = synced(&gw);
        zones.refresh().await.unwrap();
        zones.delete("z1").await.unwrap();

        let restored = zones.restore("z1").await.unwrap();

        assert!(restored.deleted_at.is_none());
        assert!(zones.store().find("z1").unwrap().deleted_at.is_none());
        assert_eq!(names(&zones.store().filtered_view("")), vec!["Attic"]);
        assert!(zones.store().deleted_view("").is_empty());
    }

    #[tokio::test]
    async fn restore_of_active_record_applies_server_response() {
        let gw = FakeGateway::new(vec![zone("z1", "Attic")]);
        let zones = synced(&gw);
        zones.refresh().await.unwrap();

        let restored = zones.restore("z1").await.unwrap();
        assert_eq!(restored, zone("z1", "Attic"));
        assert_eq!(zones.store().len(), 1);
    }

    // ========================================================================
    // get / check_uniqueness
    // ========================================================================

    #[tokio::test]
    async fn get_sets_current_without_refetch() {
        let gw = FakeGateway::new(vec![zone("z1", "Attic")]);
        let zones = synced(&gw);

        let fetched = zones.get("z1").await.unwrap();
        assert_eq!(zones.store().current(), Some(fetched));
        assert!(zones.store().is_empty(), "get does not insert into the list");
        assert_eq!(gw.calls(), vec!["get"]);
    }

    #[tokio::test]
    async fn check_uniqueness_passes_through() {
        let mut attic = zone("z1", "Attic");
        attic.zone_code = Some("ATC".into());
        let gw = FakeGateway::new(vec![attic]);
        let zones = synced(&gw);

        let seen = Arc::new(Mutex::new(Vec::<Topic>::new()));
        let seen_c = seen.clone();
        zones.store().subscribe(move |topic, _| seen_c.lock().unwrap().push(topic));

        assert!(!zones.check_uniqueness("ATC", None).await.unwrap().available);
        assert!(zones.check_uniqueness("ATC", Some("z1")).await.unwrap().available);
        assert!(seen.lock().unwrap().is_empty(), "no store writes");
    }

    // ========================================================================
    // Shared handles
    // ========================================================================

    #[tokio::test]
    async fn clones_share_one_store() {
        let gw = FakeGateway::new(vec![zone("z1", "Attic")]);
        let zones = synced(&gw);
        let view = zones.clone();

        zones.refresh().await.unwrap();
        assert_eq!(view.store().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_creates_end_consistent() {
        let gw = FakeGateway::new(vec![]);
        let zones = synced(&gw);

        let a = ZoneDraft::new("Garage", ZoneType::Interior);
        let b = ZoneDraft::new("Attic", ZoneType::Interior);
        let (ra, rb) = tokio::join!(zones.create(&a), zones.create(&b));
        ra.unwrap();
        rb.unwrap();

        assert_eq!(names(&zones.store().items()), vec!["Attic", "Garage"]);
    }
}
