//! `rakshika` - CLI for the personal safety toolkit
//!
//! This binary sends SOS alerts, manages trusted contacts, shares live
//! location and shows the static safety content.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{debug, info};

use rakshika::cli::{
    Cli, Command, ConfigCommand, ContactsCommand, HelplinesCommand, ShareCommand, SosCommand,
    SupportCommand,
};
use rakshika::location::test_location_access;
use rakshika::sharing::{format_remaining, SharingState};
use rakshika::sos::{DispatchReport, FallbackAction};
use rakshika::tips::{
    find_helpline, HELPLINES, SAFETY_TIPS, SUPPORT_EMAIL, SUPPORT_HOTLINE, SUPPORT_OPTIONS,
};
use rakshika::{init_logging, AppContext, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
        Command::Tips => {
            handle_tips();
            Ok(())
        }
        Command::Platform => {
            handle_platform(&config);
            Ok(())
        }
        command => run(command, config, cli.quiet).await,
    }
}

/// Run a command that needs the host adapters and the contact store.
async fn run(command: Command, config: Config, quiet: bool) -> anyhow::Result<()> {
    rakshika_desktop::init()?;
    let ctx = AppContext::from_config(config, quiet)?;

    match command {
        Command::Sos(sos_cmd) => handle_sos(&ctx, &sos_cmd).await,
        Command::Contacts(contacts_cmd) => handle_contacts(&ctx, contacts_cmd).await,
        Command::Share(share_cmd) => handle_share(&ctx, &share_cmd).await,
        Command::Locate => {
            let timeout = ctx.config().sos_timings().location_timeout;
            if test_location_access(ctx.geolocation(), ctx.notifier(), timeout)
                .await
                .is_none()
            {
                bail!("location access is not working");
            }
            Ok(())
        }
        Command::Helplines(helplines_cmd) => handle_helplines(&ctx, &helplines_cmd).await,
        Command::Support(support_cmd) => handle_support(&ctx, &support_cmd),
        Command::Dashboard(dashboard_cmd) => handle_dashboard(&ctx, dashboard_cmd.json),
        Command::Config(_) | Command::Tips | Command::Platform => Ok(()),
    }
}

async fn handle_sos(ctx: &AppContext, cmd: &SosCommand) -> anyhow::Result<()> {
    let result = dispatch_sos(ctx, cmd).await;
    // Let the alarm ring out before the runtime shuts down.
    ctx.wait_for_alarm().await;
    result
}

async fn dispatch_sos(ctx: &AppContext, cmd: &SosCommand) -> anyhow::Result<()> {
    let dispatcher = ctx.sos_dispatcher();
    let report = dispatcher.activate().await?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    let Some(dialog) = &report.fallback else {
        return Ok(());
    };

    println!();
    println!("{}", dialog.title());
    println!("{}", dialog.description());
    for action in dialog.actions() {
        println!("  - {}", action.label());
    }

    if let Some(choice) = cmd.fallback {
        let action = FallbackAction::from(choice);
        if !dialog.actions().contains(&action) {
            bail!("'{}' is not offered on this device", action.label());
        }
        let pause = dispatcher.settings().timings.attempt_pause;
        let done = dialog
            .perform(action, ctx.handoff(), ctx.notifier(), pause)
            .await;
        debug!(action = action.label(), done, "Backup action finished");
    }
    Ok(())
}

fn print_report(report: &DispatchReport) {
    println!("SOS dispatch");
    println!("------------");
    println!("Contacts:      {}", report.contacts_processed);
    match &report.location {
        Some(sample) => println!("Location:      {}", sample.coordinates_label()),
        None => println!("Location:      unavailable"),
    }
    for outcome in &report.outcomes {
        let channel = outcome
            .channel
            .as_ref()
            .map_or_else(|| "not delivered".to_string(), |c| c.to_string());
        println!("  {:<20} {channel}", outcome.contact_name);
    }
    if let Some(alert) = &report.alert {
        println!("Recorded:      alert #{} at {}", alert.id, alert.created_at);
    }
}

async fn handle_contacts(ctx: &AppContext, cmd: ContactsCommand) -> anyhow::Result<()> {
    let store = ctx.contacts();
    match cmd {
        ContactsCommand::List { json } => {
            let contacts = store.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&contacts)?);
            } else if contacts.is_empty() {
                println!("No trusted contacts yet. Add one with `rakshika contacts add`.");
            } else {
                println!("Trusted contacts ({} backend)", store.backend());
                for contact in &contacts {
                    println!(
                        "  [{}] {:<20} {}",
                        contact.id,
                        contact.name,
                        contact.display_phone()
                    );
                }
            }
        }
        ContactsCommand::Add {
            name,
            phone,
            country_code,
        } => {
            let code = country_code
                .unwrap_or_else(|| ctx.config().contacts.default_country_code.clone());
            let contact = store.add(&name, &phone, &code).await?;
            info!(id = %contact.id, "Contact added");
            println!("Added {} ({})", contact.name, contact.display_phone());
        }
        ContactsCommand::Delete { id } => {
            if store.delete(&id).await? {
                println!("Removed contact {id}");
            } else {
                println!("No contact with id {id}");
            }
        }
    }
    Ok(())
}

async fn handle_share(ctx: &AppContext, cmd: &ShareCommand) -> anyhow::Result<()> {
    let session = ctx.live_session();
    let minutes = cmd.minutes.unwrap_or(session.limits().default_minutes);
    session.start(&cmd.recipients, minutes)?;
    println!(
        "Sharing with {} contact(s) for {minutes} minutes. Press Ctrl-C to stop.",
        session.contact_count()
    );

    let mut link_pending = cmd.link;
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("failed to listen for Ctrl-C")?;
                session.stop();
                break;
            }
            _ = ticker.tick() => match session.state() {
                SharingState::Inactive => break,
                SharingState::Starting => {}
                SharingState::Active => {
                    if link_pending {
                        session.share_current_link().await;
                        link_pending = false;
                    }
                    let secs = session.remaining().as_secs();
                    if secs % 60 == 0 {
                        println!("{} remaining", format_remaining(secs));
                    }
                }
            },
        }
    }

    if let Some(sample) = session.latest() {
        println!("Last shared position: {}", sample.coordinates_label());
    }
    Ok(())
}

fn handle_tips() {
    println!("Daily Safety Tips");
    println!("=================");
    for tip in &SAFETY_TIPS {
        println!();
        println!("{}", tip.title);
        println!("  {}", tip.description);
    }
}

async fn handle_helplines(ctx: &AppContext, cmd: &HelplinesCommand) -> anyhow::Result<()> {
    if let Some(query) = &cmd.call {
        let Some(helpline) = find_helpline(query) else {
            bail!("unknown helpline: {query}");
        };
        println!("Calling {} ({})...", helpline.name, helpline.number);
        helpline.call(ctx.handoff()).await?;
        return Ok(());
    }

    println!("Emergency Helplines");
    println!("===================");
    for helpline in &HELPLINES {
        println!("  {:<28} {}", helpline.name, helpline.number);
    }
    Ok(())
}

fn handle_support(ctx: &AppContext, cmd: &SupportCommand) -> anyhow::Result<()> {
    if let Some(title) = &cmd.request {
        let Some(option) = SUPPORT_OPTIONS
            .iter()
            .find(|o| o.title.eq_ignore_ascii_case(title.trim()))
        else {
            bail!("unknown support service: {title}");
        };
        option.request(ctx.notifier());
        return Ok(());
    }

    println!("Community Support");
    println!("=================");
    for option in &SUPPORT_OPTIONS {
        println!();
        println!("{} [{}]", option.title, option.action);
        println!("  {}", option.description);
    }
    println!();
    println!("24/7 hotline: {SUPPORT_HOTLINE}");
    println!("Email:        {SUPPORT_EMAIL}");
    Ok(())
}

fn handle_dashboard(ctx: &AppContext, json: bool) -> anyhow::Result<()> {
    let view = ctx.dashboard()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("Welcome, {}", view.display_name);
    println!("------------------------------");
    println!("Trusted contacts: {}", view.stats.total_contacts);
    println!("Alerts sent:      {}", view.stats.total_alerts);
    if let Some(at) = view.stats.last_alert_at {
        println!("Last alert:       {at}");
    }
    if !view.recent_alerts.is_empty() {
        println!();
        println!("Recent alerts");
        for entry in &view.recent_alerts {
            println!(
                "  {}  {} contact(s)  {}",
                entry.alert.created_at.format("%Y-%m-%d %H:%M"),
                entry.alert.contacts_notified,
                entry.maps_url.as_deref().unwrap_or("no location")
            );
        }
    }
    Ok(())
}

fn handle_platform(config: &Config) {
    let platform = config.platform();
    println!("Host:          {}", rakshika_desktop::platform_name());
    println!("Device class:  {}", platform.kind());
    println!("Mobile:        {}", platform.is_mobile());
    println!("User agent:    {}", platform.user_agent());
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Contacts]");
                println!("  Backend:            {}", config.contacts.backend);
                println!(
                    "  Local store:        {}",
                    config.local_storage_path().display()
                );
                println!(
                    "  Country code:       +{}",
                    config.contacts.default_country_code
                );
                println!();
                println!("[Account]");
                println!(
                    "  User:               {}",
                    config.account.user_id.as_deref().unwrap_or("(signed out)")
                );
                println!("  Database path:      {}", config.database_path().display());
                println!("  Record alerts:      {}", config.account.record_alerts);
                println!();
                println!("[SOS]");
                println!("  Contact stagger:    {} ms", config.sos.contact_stagger_ms);
                println!("  Location timeout:   {} ms", config.sos.location_timeout_ms);
                println!("  Alarm:              {}", config.sos.alarm_enabled);
                println!();
                println!("[Sharing]");
                println!(
                    "  Duration:           {} min ({}..={})",
                    config.sharing.default_minutes,
                    config.sharing.min_minutes,
                    config.sharing.max_minutes
                );
                println!();
                println!("[Location]");
                println!("  Enabled:            {}", config.location.enabled);
                match config.location.latitude.zip(config.location.longitude) {
                    Some((lat, lng)) => println!("  Position:           {lat:.6}, {lng:.6}"),
                    None => println!("  Position:           (not set)"),
                }
                println!("  Maps:               {}", config.maps.base_url);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
