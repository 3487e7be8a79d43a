//! Context management commands.

use std::path::Path;

use anyhow::Result;

use crate::config::{ClientConfig, Context};

/// Fields `context set` may change. `None` leaves the stored value alone.
#[derive(Debug, Default)]
pub struct ContextUpdate<'a> {
    pub server: Option<&'a str>,
    pub token: Option<&'a str>,
    pub csrf_token: Option<&'a str>,
    pub csrf_header: Option<&'a str>,
}

/// Create or update a context. The first context becomes current.
pub fn set(name: &str, update: ContextUpdate<'_>, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;
    let created = apply(&mut config, name, update);
    config.save(client_config_path)?;

    if created {
        println!("Context \"{}\" created.", name);
    } else {
        println!("Context \"{}\" updated.", name);
    }
    Ok(())
}

fn apply(config: &mut ClientConfig, name: &str, update: ContextUpdate<'_>) -> bool {
    let mut ctx = config
        .contexts
        .iter()
        .find(|c| c.name == name)
        .cloned();
    let created = ctx.is_none();
    let ctx_mut = ctx.get_or_insert_with(|| Context::new(name));

    if let Some(s) = update.server {
        ctx_mut.server = s.to_string();
    }
    if let Some(t) = update.token {
        ctx_mut.token = t.to_string();
    }
    if let Some(c) = update.csrf_token {
        ctx_mut.csrf_token = c.to_string();
    }
    if let Some(h) = update.csrf_header {
        ctx_mut.csrf_header = h.to_string();
    }

    config.upsert_context(ctx_mut.clone());
    if config.current_context.is_empty() {
        config.current_context = name.to_string();
    }
    created
}

/// List all contexts.
pub fn list(client_config_path: &Path) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;

    if config.contexts.is_empty() {
        println!("No contexts configured.");
        println!("Run: zonedesk context set <name> --server <url>");
        return Ok(());
    }

    println!("{:2} {:20} {:40} {:6}", "", "NAME", "SERVER", "TOKEN");
    for ctx in &config.contexts {
        let marker = if ctx.name == config.current_context {
            "*"
        } else {
            " "
        };
        let server = if ctx.server.is_empty() { "-" } else { &ctx.server };
        let token = if ctx.token.is_empty() { "no" } else { "yes" };
        println!("{:2} {:20} {:40} {:6}", marker, ctx.name, server, token);
    }

    Ok(())
}

/// Switch current context.
pub fn use_context(name: &str, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    if !config.contexts.iter().any(|c| c.name == name) {
        anyhow::bail!(
            "Context \"{}\" not found. Run `zonedesk context list` to see available contexts.",
            name
        );
    }

    config.current_context = name.to_string();
    config.save(client_config_path)?;
    println!("Switched to context \"{}\".", name);
    Ok(())
}

/// Delete a context.
pub fn delete(name: &str, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    if !config.remove_context(name) {
        anyhow::bail!("Context \"{}\" not found.", name);
    }

    config.save(client_config_path)?;
    println!("Context \"{}\" deleted.", name);
    Ok(())
}
