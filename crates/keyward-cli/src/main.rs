//! CLI entry point for Keyward.
//!
//! This binary provides the `keyward` command for adding, listing, searching
//! and revealing credentials stored in the local vault.

mod cli;
mod helpers;

use anyhow::{Context, Result, bail};
use clap::Parser;
use keyward_vault::{CredentialService, RecordId, VaultConfig};
use serde_json::json;
use tracing::info;
use zeroize::Zeroizing;

use crate::cli::{Cli, Commands, GenerateArgs, SecretArgs};
use crate::helpers::RecordView;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    helpers::init_tracing(if cli.verbose { "debug" } else { "warn" });

    let config = VaultConfig::load(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    let service = CredentialService::open(&config).context("failed to open vault")?;

    let json = cli.json;
    match cli.command {
        Commands::Add {
            title,
            username,
            secret,
            website,
            notes,
        } => cmd_add(&service, json, &title, &username, &secret, &website, &notes),
        Commands::List => cmd_list(&service, json),
        Commands::Show { id, reveal } => cmd_show(&service, json, RecordId(id), reveal),
        Commands::Update {
            id,
            title,
            username,
            secret,
            website,
            notes,
        } => cmd_update(
            &service,
            json,
            RecordId(id),
            UpdateFields {
                title,
                username,
                website,
                notes,
            },
            &secret,
        ),
        Commands::Delete { id, yes } => cmd_delete(&service, json, RecordId(id), yes),
        Commands::Search { query } => cmd_search(&service, json, &query),
        Commands::Generate { options } => cmd_generate(&service, json, &options),
        Commands::Count => cmd_count(&service, json),
        Commands::Check => cmd_check(&service, json),
    }
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn cmd_add(
    service: &CredentialService,
    json: bool,
    title: &str,
    username: &str,
    secret: &SecretArgs,
    website: &str,
    notes: &str,
) -> Result<()> {
    let Some(value) = resolve_secret(service, secret)? else {
        bail!("a secret is required: pass --secret, --secret-stdin or --generate");
    };

    let id = service
        .create(title, username, &value, website, notes)
        .context("failed to add credential")?;
    info!(%id, "credential added");

    if json {
        let mut out = json!({ "id": id.0 });
        if secret.generate {
            out["secret"] = json!(value.as_str());
        }
        helpers::print_json(&out)
    } else {
        println!("  Added credential {id}.");
        if secret.generate {
            println!("  Generated secret: {}", value.as_str());
        }
        Ok(())
    }
}

fn cmd_list(service: &CredentialService, json: bool) -> Result<()> {
    let records = service.list().context("failed to list credentials")?;
    if json {
        let views: Vec<RecordView<'_>> = records.iter().map(RecordView::new).collect();
        helpers::print_json(&views)
    } else {
        helpers::print_table(&records);
        Ok(())
    }
}

fn cmd_show(service: &CredentialService, json: bool, id: RecordId, reveal: bool) -> Result<()> {
    let record = service
        .get(id)
        .context("failed to load credential")?
        .with_context(|| format!("no credential with id {id}"))?;

    let secret = if reveal {
        Some(
            service
                .reveal(&record)
                .with_context(|| format!("failed to decrypt credential {id}"))?,
        )
    } else {
        None
    };

    let mut view = RecordView::new(&record);
    if let Some(secret) = &secret {
        view = view.with_secret(secret.as_str());
    }

    if json {
        helpers::print_json(&view)
    } else {
        helpers::print_detail(&view);
        Ok(())
    }
}

/// Metadata edits for `update`; `None` keeps the current value.
struct UpdateFields {
    title: Option<String>,
    username: Option<String>,
    website: Option<String>,
    notes: Option<String>,
}

fn cmd_update(
    service: &CredentialService,
    json: bool,
    id: RecordId,
    fields: UpdateFields,
    secret: &SecretArgs,
) -> Result<()> {
    let current = service
        .get(id)
        .context("failed to load credential")?
        .with_context(|| format!("no credential with id {id}"))?;

    let new_secret = resolve_secret(service, secret)?;
    let updated = service
        .update(
            id,
            fields.title.as_deref().unwrap_or(&current.title),
            fields.username.as_deref().unwrap_or(&current.username),
            new_secret.as_ref().map(|s| s.as_str()),
            fields.website.as_deref().unwrap_or(&current.website),
            fields.notes.as_deref().unwrap_or(&current.notes),
        )
        .context("failed to update credential")?;
    info!(%id, "credential updated");

    if json {
        let mut view = RecordView::new(&updated);
        if secret.generate {
            if let Some(value) = &new_secret {
                view = view.with_secret(value.as_str());
            }
        }
        helpers::print_json(&view)
    } else {
        println!("  Updated credential {id}.");
        if let (true, Some(value)) = (secret.generate, &new_secret) {
            println!("  Generated secret: {}", value.as_str());
        }
        Ok(())
    }
}

fn cmd_delete(service: &CredentialService, json: bool, id: RecordId, yes: bool) -> Result<()> {
    let record = service
        .get(id)
        .context("failed to load credential")?
        .with_context(|| format!("no credential with id {id}"))?;

    if !yes && !helpers::confirm(&format!("Delete \"{}\" ({})?", record.title, record.username))? {
        println!("  Cancelled.");
        return Ok(());
    }

    service.delete(&record).context("failed to delete credential")?;
    info!(%id, "credential deleted");

    if json {
        helpers::print_json(&json!({ "deleted": id.0 }))
    } else {
        println!("  Deleted credential {id}.");
        Ok(())
    }
}

fn cmd_search(service: &CredentialService, json: bool, query: &str) -> Result<()> {
    let records = service.search(query).context("search failed")?;
    if json {
        let views: Vec<RecordView<'_>> = records.iter().map(RecordView::new).collect();
        helpers::print_json(&views)
    } else {
        helpers::print_table(&records);
        Ok(())
    }
}

fn cmd_generate(service: &CredentialService, json: bool, options: &GenerateArgs) -> Result<()> {
    let policy = service.policy();
    let length = options.length.unwrap_or(policy.default_length);
    let secret = Zeroizing::new(
        service
            .generate_secret(length, options.classes(policy.classes))
            .context("failed to generate secret")?,
    );

    if json {
        helpers::print_json(&json!({ "secret": secret.as_str(), "length": length }))
    } else {
        println!("{}", secret.as_str());
        Ok(())
    }
}

fn cmd_count(service: &CredentialService, json: bool) -> Result<()> {
    let count = service.count().context("failed to count credentials")?;
    if json {
        helpers::print_json(&json!({ "count": count }))
    } else {
        println!("  {count} credential(s) stored.");
        Ok(())
    }
}

fn cmd_check(service: &CredentialService, json: bool) -> Result<()> {
    let result = service.check_encryption();
    if json {
        helpers::print_json(&json!({
            "ok": result.is_ok(),
            "error": result.as_ref().err().map(|e| e.to_string()),
        }))?;
    } else if result.is_ok() {
        println!("  Encryption check passed.");
    }
    result.context("encryption check failed")
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Turn the secret flags into a value, or `None` if no source was given.
fn resolve_secret(
    service: &CredentialService,
    args: &SecretArgs,
) -> Result<Option<Zeroizing<String>>> {
    if !args.is_given() {
        return Ok(None);
    }
    let value = if let Some(secret) = &args.secret {
        secret.clone()
    } else if args.secret_stdin {
        helpers::read_stdin_line()?
    } else {
        service
            .generate_default_secret()
            .context("failed to generate secret")?
    };
    Ok(Some(Zeroizing::new(value)))
}
