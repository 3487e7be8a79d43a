use std::sync::Arc;

use zonedesk_client::{Gateway, GatewayConfig, ResourceClient, TokenSource};
use zonedesk_types::{Customer, ScopeSheet, User, Zone};

use crate::sync::SyncedStore;

/// One synchronized store per resource kind, built once per session and
/// handed to every view that needs it.
#[derive(Clone)]
pub struct Dashboard {
    pub zones: SyncedStore<Zone>,
    pub scope_sheets: SyncedStore<ScopeSheet>,
    pub users: SyncedStore<User>,
    pub customers: SyncedStore<Customer>,
}

impl Dashboard {
    /// HTTP-backed dashboard. All resources share one connection pool,
    /// gateway config and token source.
    pub fn connect(config: GatewayConfig, token_source: Arc<dyn TokenSource>) -> Self {
        let http = reqwest::Client::new();
        Self {
            zones: SyncedStore::new(http_gateway::<Zone>(&http, &config, &token_source)),
            scope_sheets: SyncedStore::new(http_gateway::<ScopeSheet>(&http, &config, &token_source)),
            users: SyncedStore::new(http_gateway::<User>(&http, &config, &token_source)),
            customers: SyncedStore::new(http_gateway::<Customer>(&http, &config, &token_source)),
        }
    }

    pub fn new(
        zones: Arc<dyn Gateway<Zone>>,
        scope_sheets: Arc<dyn Gateway<ScopeSheet>>,
        users: Arc<dyn Gateway<User>>,
        customers: Arc<dyn Gateway<Customer>>,
    ) -> Self {
        Self {
            zones: SyncedStore::new(zones),
            scope_sheets: SyncedStore::new(scope_sheets),
            users: SyncedStore::new(users),
            customers: SyncedStore::new(customers),
        }
    }
}

fn http_gateway<T: zonedesk_types::Resource>(
    http: &reqwest::Client,
    config: &GatewayConfig,
    token_source: &Arc<dyn TokenSource>,
) -> Arc<dyn Gateway<T>> {
    Arc::new(ResourceClient::<T>::with_http(
        http.clone(),
        config.clone(),
        token_source.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonedesk_client::NoAuth;

    #[test]
    fn connect_starts_with_empty_stores() {
        let dashboard = Dashboard::connect(GatewayConfig::new("http://localhost:8000/api"), Arc::new(NoAuth));
        assert!(dashboard.zones.store().is_empty());
        assert!(dashboard.scope_sheets.store().is_empty());
        assert!(dashboard.users.store().is_empty());
        assert!(dashboard.customers.store().is_empty());
    }

    #[test]
    fn clones_share_stores() {
        let dashboard = Dashboard::connect(GatewayConfig::new("http://localhost:8000/api"), Arc::new(NoAuth));
        let view = dashboard.clone();
        dashboard.zones.store().set_search_term("attic");
        assert_eq!(view.zones.store().search_term(), "attic");
    }

    #[test]
    fn new_keeps_kinds_apart() {
        let http = reqwest::Client::new();
        let config = GatewayConfig::new("http://localhost:8000/api");
        let auth: Arc<dyn TokenSource> = Arc::new(NoAuth);
        let dashboard = Dashboard::new(
            http_gateway(&http, &config, &auth),
            http_gateway(&http, &config, &auth),
            http_gateway(&http, &config, &auth),
            http_gateway(&http, &config, &auth),
        );

        dashboard.users.store().set_error("boom");
        assert_eq!(dashboard.users.store().last_error().as_deref(), Some("boom"));
        assert!(dashboard.zones.store().last_error().is_none());
        assert!(dashboard.customers.store().last_error().is_none());
    }
}
