//! User account commands

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use tally_core::db::Database;
use tally_core::models::{NewUser, SettingsPatch, Theme, UserProfile, MIN_PASSWORD_LEN};

use super::{parse_amount, parse_choice};

/// Settings flags as given on the command line
#[derive(Debug, Default)]
pub struct SettingsArgs {
    pub currency: Option<String>,
    pub theme: Option<String>,
    pub notifications: Option<bool>,
    pub budget_alerts: Option<bool>,
    pub budget: Option<String>,
}

impl SettingsArgs {
    fn is_empty(&self) -> bool {
        self.currency.is_none()
            && self.theme.is_none()
            && self.notifications.is_none()
            && self.budget_alerts.is_none()
            && self.budget.is_none()
    }

    fn into_patch(self) -> Result<SettingsPatch> {
        let monthly_budget = match self.budget.as_deref().map(str::trim) {
            None => None,
            Some(b) if b.eq_ignore_ascii_case("none") => Some(None),
            Some(b) => Some(Some(parse_amount(b)?)),
        };

        Ok(SettingsPatch {
            currency: self.currency,
            theme: self.theme.as_deref().map(parse_choice::<Theme>).transpose()?,
            notifications: self.notifications,
            budget_alerts: self.budget_alerts,
            monthly_budget,
        })
    }
}

fn require_user(db: &Database, email: &str) -> Result<UserProfile> {
    db.find_user_by_email(email)?
        .with_context(|| format!("No user with email {}", email))
}

fn print_settings(user: &UserProfile) {
    let s = &user.settings;
    println!("Settings for {} <{}>", user.name, user.email);
    println!("   Currency:      {}", s.currency);
    println!("   Theme:         {}", s.theme);
    println!("   Notifications: {}", s.notifications);
    println!("   Budget alerts: {}", s.budget_alerts);
    match s.monthly_budget {
        Some(budget) => println!("   Budget:        {}", budget),
        None => println!("   Budget:        (none)"),
    }
}

pub fn cmd_register(db: &Database, email: &str, name: &str, password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        bail!("Password must be at least {} characters", MIN_PASSWORD_LEN);
    }

    let id = db
        .register_user(&NewUser {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        })
        .context("Failed to register user")?;

    println!("✅ Registered {} (id {})", email.trim(), id);
    Ok(())
}

pub fn cmd_login(db: &Database, email: &str, password: &str) -> Result<()> {
    let user = db.login_user(email, password).context("Login failed")?;

    println!("✅ Logged in as {} <{}>", user.name, user.email);
    println!("   Member since {}", user.created_at.format("%Y-%m-%d"));
    Ok(())
}

pub fn cmd_passwd(db: &Database, email: &str, current: &str, new: &str) -> Result<()> {
    if new.chars().count() < MIN_PASSWORD_LEN {
        bail!("Password must be at least {} characters", MIN_PASSWORD_LEN);
    }

    let user = require_user(db, email)?;
    db.update_user_password(user.id, current, new)
        .context("Failed to change password")?;

    println!("✅ Password changed");
    Ok(())
}

pub fn cmd_settings(db: &Database, email: &str, args: SettingsArgs) -> Result<()> {
    let mut user = require_user(db, email)?;

    if !args.is_empty() {
        let patch = args.into_patch()?;
        user.settings = db
            .update_user_settings(user.id, &patch)
            .context("Failed to update settings")?;
        println!("✅ Settings updated");
    }

    print_settings(&user);
    Ok(())
}

pub fn cmd_delete_account(db: &Database, email: &str, password: &str, yes: bool) -> Result<()> {
    let user = db
        .login_user(email, password)
        .context("Cannot delete account")?;

    if !yes {
        print!(
            "⚠️  This deletes {} and ALL expenses, incomes, investments and loans. Continue? [y/N] ",
            user.email
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled");
            return Ok(());
        }
    }

    db.delete_account(user.id)
        .context("Failed to delete account")?;
    println!("✅ Account {} deleted", user.email);
    Ok(())
}
