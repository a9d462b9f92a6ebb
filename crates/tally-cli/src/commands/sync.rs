//! Cloud sync commands

use anyhow::{bail, Result};
use tally_core::sync::{CloudSync, SyncReport};

fn finish(report: SyncReport, verb: &str) -> Result<()> {
    if report.success {
        println!("✅ {} {} records", verb, report.records);
        return Ok(());
    }

    let reason = report.error.unwrap_or_else(|| "unknown error".to_string());
    bail!("Sync failed: {}", reason)
}

/// Upload local records, replacing the user's remote copy
pub async fn cmd_sync_up(sync: &CloudSync, email: &str) -> Result<()> {
    println!("☁️  Uploading to {}...", sync.remote_name());
    let report = sync.sync_to_cloud(email).await;
    finish(report, "Uploaded")
}

/// Download the user's remote records, replacing local ones
pub async fn cmd_sync_down(sync: &CloudSync, email: &str) -> Result<()> {
    println!("☁️  Downloading from {}...", sync.remote_name());
    let report = sync.sync_from_cloud(email).await;
    finish(report, "Downloaded")
}

pub async fn cmd_sync_status(sync: &CloudSync, email: &str) -> Result<()> {
    let status = sync.sync_status(email).await;

    println!("Cloud sync");
    println!("   Enabled:       {}", if status.enabled { "yes" } else { "no" });
    if let Some(count) = status.cloud_records {
        println!("   Cloud records: {}", count);
    }
    match status.last_sync {
        Some(at) => println!("   Last sync:     {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("   Last sync:     never (this session)"),
    }
    if let Some(error) = status.error {
        println!("   ⚠️  {}", error);
    }

    Ok(())
}
