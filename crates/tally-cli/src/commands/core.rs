//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `open_sync` - Cloud sync coordinator from configuration
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::db::{Database, DEMO_USER_EMAIL, SCHEMA_VERSION};
use tally_core::{CloudSync, SyncConfig};

/// Open the database, creating it and its directory if needed
pub fn open_db(db_path: &Path) -> Result<Database> {
    Database::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))
}

/// Build the sync coordinator for the configured gateway
pub fn open_sync(db: &Database, config: SyncConfig) -> Result<CloudSync> {
    CloudSync::from_config(db.clone(), config).context("Failed to set up cloud sync")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;
    println!("   Schema version: {}", SCHEMA_VERSION);

    match db.ensure_demo_user().context("Failed to seed demo user")? {
        Some(_) => println!("   Created demo account ({})", DEMO_USER_EMAIL),
        None => println!("   Users already exist, demo account not created"),
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Create your account: tally register -e you@example.com -n You -p secret");
    println!("  2. Record an expense: tally expense add -t Lunch -a 250 -c food_dining");

    Ok(())
}
