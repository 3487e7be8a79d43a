//! Resource commands, driven through the synchronized stores.

use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use serde::de::DeserializeOwned;
use tracing::debug;
use zonedesk_client::StaticToken;
use zonedesk_flux::{Dashboard, SyncedStore};
use zonedesk_types::Resource;

use crate::config::ClientConfig;

/// Resource kinds the CLI knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Zone,
    ScopeSheet,
    User,
    Customer,
}

impl FromStr for ResourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "zone" | "zones" => Ok(ResourceKind::Zone),
            "scope-sheet" | "scope-sheets" | "scopesheet" | "scopesheets" | "sheet" | "sheets" => {
                Ok(ResourceKind::ScopeSheet)
            }
            "user" | "users" => Ok(ResourceKind::User),
            "customer" | "customers" => Ok(ResourceKind::Customer),
            _ => anyhow::bail!(
                "Unknown resource type: \"{}\". Available: zones, scope-sheets, users, customers",
                s
            ),
        }
    }
}

/// Run `$body` with `$store` bound to the dashboard store for `$kind`.
macro_rules! on_resource {
    ($kind:expr, $dashboard:expr, |$store:ident| $body:expr) => {
        match $kind {
            ResourceKind::Zone => {
                let $store = &$dashboard.zones;
                $body
            }
            ResourceKind::ScopeSheet => {
                let $store = &$dashboard.scope_sheets;
                $body
            }
            ResourceKind::User => {
                let $store = &$dashboard.users;
                $body
            }
            ResourceKind::Customer => {
                let $store = &$dashboard.customers;
                $body
            }
        }
    };
}

/// What a resource command should do.
#[derive(Debug)]
pub enum Action {
    List { deleted: bool, search: Option<String> },
    Get { id: String },
    Create { body: String },
    Update { id: String, body: String },
    Delete { id: String },
    Restore { id: String },
    Check { value: String, exclude: Option<String> },
}

/// Build a dashboard for the current context and run `action` on `kind`.
pub async fn run(
    kind: ResourceKind,
    action: Action,
    output_json: bool,
    client_config_path: &Path,
) -> Result<()> {
    let dashboard = connect(client_config_path)?;
    execute(&dashboard, kind, action, output_json).await
}

fn connect(client_config_path: &Path) -> Result<Dashboard> {
    let config = ClientConfig::load(client_config_path)?;
    let ctx = config.require_current()?;
    let gateway_config = ctx.gateway_config()?;
    debug!(context = %ctx.name, server = %gateway_config.base_url, "connecting");

    let dashboard = Dashboard::connect(
        gateway_config,
        std::sync::Arc::new(StaticToken::new(ctx.token.clone())),
    );
    trace_changes(&dashboard.zones);
    trace_changes(&dashboard.scope_sheets);
    trace_changes(&dashboard.users);
    trace_changes(&dashboard.customers);
    Ok(dashboard)
}

fn trace_changes<T: Resource>(store: &SyncedStore<T>) {
    store.store().subscribe(|topic, state| {
        debug!(
            resource = T::PATH,
            %topic,
            items = state.items.len(),
            loading = state.loading,
            "store changed"
        );
    });
}

pub async fn execute(
    dashboard: &Dashboard,
    kind: ResourceKind,
    action: Action,
    output_json: bool,
) -> Result<()> {
    on_resource!(kind, dashboard, |store| {
        match action {
            Action::List { deleted, search } => list(store, deleted, search, output_json).await,
            Action::Get { id } => get(store, &id, output_json).await,
            Action::Create { body } => create(store, &body, output_json).await,
            Action::Update { id, body } => update(store, &id, &body, output_json).await,
            Action::Delete { id } => delete(store, &id).await,
            Action::Restore { id } => restore(store, &id, output_json).await,
            Action::Check { value, exclude } => check(store, &value, exclude.as_deref()).await,
        }
    })
}

/// LIST: refresh, then print the active or deleted view.
async fn list<T: Resource>(
    store: &SyncedStore<T>,
    deleted: bool,
    search: Option<String>,
    output_json: bool,
) -> Result<()> {
    store.refresh().await?;
    if let Some(term) = search {
        store.store().set_search_term(term);
    }
    let rows = if deleted {
        store.store().visible_deleted()
    } else {
        store.store().visible()
    };

    if output_json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", render_table(&rows));
    }
    Ok(())
}

async fn get<T: Resource>(store: &SyncedStore<T>, id: &str, output_json: bool) -> Result<()> {
    let record = store.get(id).await?;
    print_record(&record, output_json)
}

async fn create<T>(store: &SyncedStore<T>, body: &str, output_json: bool) -> Result<()>
where
    T: Resource,
    T::Draft: DeserializeOwned,
{
    let draft: T::Draft = parse_body(body)?;
    let created = store.create(&draft).await?;
    println!("{} \"{}\" created.", T::LABEL, created.name());
    print_record(&created, output_json)
}

async fn update<T>(store: &SyncedStore<T>, id: &str, body: &str, output_json: bool) -> Result<()>
where
    T: Resource,
    T::Patch: DeserializeOwned,
{
    let patch: T::Patch = parse_body(body)?;
    let updated = store.update(id, &patch).await?;
    println!("{} \"{}\" updated.", T::LABEL, updated.name());
    print_record(&updated, output_json)
}

async fn delete<T: Resource>(store: &SyncedStore<T>, id: &str) -> Result<()> {
    let ack = store.delete(id).await?;
    match ack.message.as_deref() {
        Some(msg) if !msg.is_empty() => println!("{}", msg),
        _ => println!("{} {} deleted.", T::LABEL, id),
    }
    Ok(())
}

async fn restore<T: Resource>(store: &SyncedStore<T>, id: &str, output_json: bool) -> Result<()> {
    let restored = store.restore(id).await?;
    println!("{} \"{}\" restored.", T::LABEL, restored.name());
    print_record(&restored, output_json)
}

async fn check<T: Resource>(
    store: &SyncedStore<T>,
    value: &str,
    exclude: Option<&str>,
) -> Result<()> {
    let availability = store.check_uniqueness(value, exclude).await?;
    if availability.available {
        println!("{} \"{}\" is available.", T::UNIQUE_FIELD, value);
    } else {
        println!("{} \"{}\" is already taken.", T::UNIQUE_FIELD, value);
    }
    Ok(())
}

fn parse_body<D: DeserializeOwned>(body: &str) -> Result<D> {
    serde_json::from_str(body).map_err(|e| anyhow::anyhow!("Invalid JSON: {}", e))
}

fn print_record<T: Resource>(record: &T, output_json: bool) -> Result<()> {
    if output_json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        print!("{}", render_table(std::slice::from_ref(record)));
    }
    Ok(())
}

fn render_table<T: Resource>(rows: &[T]) -> String {
    if rows.is_empty() {
        return "No records.\n".to_string();
    }
    let mut out = format!("{:38} {:32} {:20}\n", "UUID", "NAME", "DELETED");
    for row in rows {
        let deleted = row
            .deleted_at()
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("{:38} {:32} {:20}\n", row.uuid(), row.name(), deleted));
    }
    out
}
