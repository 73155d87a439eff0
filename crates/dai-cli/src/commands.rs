use std::collections::BTreeMap;
use std::fs::File;
use std::io;

use anyhow::{bail, Context};
use colored::Colorize;
use dai_archive::{content_checksum, ArchiveRecord, ManualEdit, ManualEntry, ManualKind, QueueRequest};
use dai_sdk::{AssetUsage, IntegrityCheck, UsageClass};
use serde::Serialize;

use crate::cli::*;
use crate::workspace::Workspace;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Scan(args) => cmd_scan(&cli, args).await,
        Command::Status => cmd_status(&cli),
        Command::Usage(args) => cmd_usage(&cli, args),
        Command::Orphans => cmd_orphans(&cli),
        Command::Archive(args) => cmd_archive(&cli, &args.action),
        Command::Export(args) => cmd_export(&cli, args),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn cmd_scan(cli: &Cli, args: &ScanArgs) -> anyhow::Result<()> {
    let ws = Workspace::open_with(cli, |config| {
        if args.timeout.is_some() {
            config.scan.timeout_secs = args.timeout;
        }
    })?;
    let task = ws.dai.spawn_scan()?;
    let handle = task.handle;
    let wait = task.wait();
    tokio::pin!(wait);

    let outcome = tokio::select! {
        result = &mut wait => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("{} cancelling scan {}", "!".yellow().bold(), handle);
            ws.dai.cancel(handle)?;
            (&mut wait).await
        }
    };
    let summary = match outcome {
        Ok(summary) => summary,
        Err(err) => {
            let status = ws.dai.status(handle)?;
            if cli.format == OutputFormat::Json {
                print_json(&status)?;
            }
            return Err(err).context(format!(
                "scan {handle} failed after {} of {} records; the live inventory is unchanged",
                status.processed, status.total
            ));
        }
    };
    ws.save()?;

    if cli.format == OutputFormat::Json {
        return print_json(&summary);
    }
    let stats = summary.promoted;
    println!("{} Generation {} is live", "✓".green().bold(), stats.generation.to_string().bold());
    println!("  Assets:  {}", stats.assets);
    println!("  Usages:  {}", stats.usages);
    println!("  Orphans: {}", stats.orphans);
    if summary.retired.generation > 0 {
        println!(
            "  Replaced generation {} ({} assets)",
            summary.retired.generation, summary.retired.assets
        );
    }
    Ok(())
}

fn cmd_status(cli: &Cli) -> anyhow::Result<()> {
    let ws = Workspace::open(cli)?;
    let stats = ws.dai.live()?.stats();
    let mut by_status: BTreeMap<&'static str, usize> = BTreeMap::new();
    for record in ws.dai.archive().list()? {
        *by_status.entry(record.status.as_str()).or_default() += 1;
    }

    if cli.format == OutputFormat::Json {
        return print_json(&serde_json::json!({
            "inventory": stats,
            "archive": by_status,
        }));
    }
    if stats.generation == 0 {
        println!("No scan has completed yet. Run {}.", "dai scan".bold());
    } else {
        println!("Generation {}", stats.generation.to_string().yellow().bold());
        println!("  Assets:  {}", stats.assets);
        println!("  Usages:  {}", stats.usages);
        println!("  Orphans: {}", stats.orphans);
    }
    if by_status.is_empty() {
        println!("\nNo archive records.");
    } else {
        println!("\nArchive records:");
        for (status, count) in by_status {
            println!("  {status:<18} {count}");
        }
    }
    Ok(())
}

fn cmd_usage(cli: &Cli, args: &UsageArgs) -> anyhow::Result<()> {
    let ws = Workspace::open(cli)?;
    let id = ws.dai.asset_id_for(&args.asset)?;
    let usage = ws.dai.usage(&id)?;
    if cli.format == OutputFormat::Json {
        return print_json(&usage);
    }
    print_usage(&usage);
    Ok(())
}

fn print_usage(usage: &AssetUsage) {
    let class = match usage.class {
        UsageClass::InUse => usage.class.to_string().green(),
        UsageClass::OrphanOnly => usage.class.to_string().yellow(),
        UsageClass::Unused => usage.class.to_string().dimmed(),
    };
    println!("{} {}", usage.asset.name.bold(), usage.asset.id.short_hex().dimmed());
    println!("  Location: {}", usage.asset.location.cyan());
    println!("  Category: {}", usage.asset.category);
    println!("  Usage:    {class}");
    for u in &usage.usages {
        println!("    {} {} via {} (x{})", "→".green(), u.root, u.field, u.occurrences);
    }
    for o in &usage.orphans {
        println!(
            "    {} {} in {} ({}, at {})",
            "✗".yellow(),
            o.field,
            o.source,
            o.reason,
            o.broken_at
        );
    }
}

fn cmd_orphans(cli: &Cli) -> anyhow::Result<()> {
    let ws = Workspace::open(cli)?;
    let orphans = ws.dai.orphans()?;
    if cli.format == OutputFormat::Json {
        return print_json(&orphans);
    }
    if orphans.is_empty() {
        println!("{} No orphan references.", "✓".green().bold());
        return Ok(());
    }
    let live = ws.dai.live()?;
    for o in &orphans {
        let name = live.asset(&o.asset).map_or("?", |a| a.name.as_str());
        println!(
            "{} {} <- {}.{} ({}, broken at {})",
            "✗".yellow(),
            name.bold(),
            o.source,
            o.field,
            o.reason,
            o.broken_at
        );
    }
    println!("\n{} orphan references", orphans.len());
    Ok(())
}

fn cmd_export(cli: &Cli, args: &ExportArgs) -> anyhow::Result<()> {
    let ws = Workspace::open(cli)?;
    let rows = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let rows = ws.dai.export_audit(file)?;
            eprintln!("{} Wrote {} rows to {}", "✓".green().bold(), rows, path.display());
            rows
        }
        None => ws.dai.export_audit(io::stdout().lock())?,
    };
    tracing::debug!(rows, "audit exported");
    Ok(())
}

fn version_of(ws: &Workspace, record: &RecordArgs) -> anyhow::Result<u64> {
    match record.version {
        Some(version) => Ok(version),
        None => Ok(ws.dai.archive().get(&record.id)?.version),
    }
}

fn cmd_archive(cli: &Cli, action: &ArchiveAction) -> anyhow::Result<()> {
    let ws = Workspace::open(cli)?;
    let archive = ws.dai.archive();
    let actor = cli.actor.as_str();

    let record = match action {
        ArchiveAction::Show { id } => return show_record(cli, &archive.get(id)?),
        ArchiveAction::List => return list_records(cli, &archive.list()?),
        ArchiveAction::Check(args) => return cmd_check(cli, &ws, args),
        ArchiveAction::Queue {
            asset,
            reason,
            description,
        } => archive.queue(
            QueueRequest {
                asset: ws.dai.asset_id_for(asset)?,
                reason: *reason,
                description: description.clone(),
            },
            actor,
        )?,
        ArchiveAction::Execute { record, visibility } => {
            let current = archive.get(&record.id)?;
            let checksum = ws.read_content(&current)?.map(|bytes| content_checksum(&bytes));
            if checksum.is_none() && !current.is_manual() {
                tracing::warn!(id = %record.id, "no local copy; archiving without a checksum");
            }
            archive.execute(&record.id, version_of(&ws, record)?, *visibility, checksum, actor)?
        }
        ArchiveAction::Toggle(record) => {
            archive.toggle_visibility(&record.id, version_of(&ws, record)?, actor)?
        }
        ArchiveAction::Unarchive(record) => {
            archive.unarchive(&record.id, version_of(&ws, record)?, actor)?
        }
        ArchiveAction::Delete(record) => {
            archive.delete_underlying(&record.id, version_of(&ws, record)?, actor)?
        }
        ArchiveAction::Remove(record) => {
            archive.remove_entry(&record.id, version_of(&ws, record)?, actor)?
        }
        ArchiveAction::Manual {
            url,
            title,
            kind,
            visibility,
            reason,
            description,
        } => archive.manual_entry(
            ManualEntry {
                url: url.clone(),
                title: title.clone(),
                kind: match kind {
                    ManualKindArg::Page => ManualKind::Page,
                    ManualKindArg::External => ManualKind::External,
                },
                visibility: *visibility,
                reason: *reason,
                description: description.clone(),
            },
            actor,
        )?,
        ArchiveAction::Edit {
            record,
            title,
            url,
            description,
        } => archive.edit(
            &record.id,
            version_of(&ws, record)?,
            ManualEdit {
                title: title.clone(),
                url: url.clone(),
                description: description.clone(),
            },
            actor,
        )?,
        ArchiveAction::Note { id, text } => archive.add_note(id, text, actor)?,
    };

    ws.save()?;
    if cli.format == OutputFormat::Json {
        return print_json(&record);
    }
    println!(
        "{} {} is {}",
        "✓".green().bold(),
        record.id.to_string().yellow(),
        record.status.as_str().bold()
    );
    if record.flags.archived_while_in_use {
        println!("  {} archived while still in use", "!".yellow().bold());
    }
    if record.flags.forced_post_deadline {
        println!("  {} counted as post-deadline: an earlier exemption was voided", "!".yellow().bold());
    }
    Ok(())
}

fn cmd_check(cli: &Cli, ws: &Workspace, args: &RecordArgs) -> anyhow::Result<()> {
    let record = ws.dai.archive().get(&args.id)?;
    let Some(content) = ws.read_content(&record)? else {
        bail!("no local copy of {} to check", record.target.reference());
    };
    let outcome = ws.dai.archive().check_integrity(
        &args.id,
        version_of(ws, args)?,
        &content,
        &cli.actor,
    )?;

    match outcome {
        IntegrityCheck::Intact => println!("{} {} matches its checksum", "✓".green().bold(), record.name),
        IntegrityCheck::Unverified => {
            println!("{} {} has no checksum to compare", "?".yellow().bold(), record.name)
        }
        IntegrityCheck::Changed(changed) => {
            ws.save()?;
            println!(
                "{} {} changed since archiving; now {}",
                "✗".red().bold(),
                changed.name,
                changed.status.as_str().bold()
            );
        }
    }
    Ok(())
}

fn show_record(cli: &Cli, record: &ArchiveRecord) -> anyhow::Result<()> {
    if cli.format == OutputFormat::Json {
        return print_json(record);
    }
    println!("{} {}", record.id.to_string().yellow().bold(), record.name.bold());
    println!("  Reference:  {}", record.target.reference().cyan());
    println!("  Type:       {}", record.target.type_label());
    println!("  Status:     {}", record.status);
    println!("  Reason:     {}", record.reason);
    if !record.description.is_empty() {
        println!("  Notes:      {}", record.description);
    }
    if let (Some(at), Some(category)) = (record.classified_at, record.category) {
        println!("  Classified: {} ({})", at.to_rfc3339(), category);
    }
    let warnings = record.flags.names();
    if !warnings.is_empty() {
        println!("  Warnings:   {}", warnings.join(", ").yellow());
    }
    if let Some(deletion) = &record.deletion {
        println!(
            "  Ended:      {} by {} at {}",
            deletion.action,
            deletion.actor,
            deletion.at.to_rfc3339()
        );
    }
    println!("  Version:    {}", record.version);
    for note in &record.notes {
        println!("  - [{}] {}: {}", note.at.to_rfc3339(), note.actor, note.text);
    }
    Ok(())
}

fn list_records(cli: &Cli, records: &[ArchiveRecord]) -> anyhow::Result<()> {
    if cli.format == OutputFormat::Json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("No archive records.");
        return Ok(());
    }
    for record in records {
        println!(
            "{}  {:<18} {:<10} {}",
            record.id.short_id().dimmed(),
            record.status.as_str(),
            record.target.type_label(),
            record.name
        );
    }
    Ok(())
}
