//! Console host for the page manager
//!
//! Every line read from stdin is either an answer to a pending question
//! (`y`/`n`) or a history token such as `main:reports/content:pivot?db=3`,
//! which is published as a navigation request.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use nav_core::events::handler_for;
use nav_core::{EventBus, NavigationAgreed, NavigationRequested, PageManager, Place};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

mod pages;
mod settings;

use pages::{ConsoleFrame, Prompt};
use settings::ShellSettings;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let settings_path = std::env::args().nth(1).map(PathBuf::from);
    let settings = ShellSettings::load(settings_path.as_deref())?;
    info!(?settings, "starting navigator");

    let bus = Arc::new(EventBus::new());
    let root = ConsoleFrame::new("root");
    let prompt = Arc::new(Prompt::default());

    let manager = PageManager::new(
        bus.clone(),
        root,
        &settings.navigation,
        tokio::runtime::Handle::current(),
    )?;
    pages::register_loaders(&manager, &settings, &prompt);

    bus.subscribe::<NavigationAgreed>(handler_for(|event: &NavigationAgreed| {
        println!("=> {}", event.place);
    }));

    let start: Place = settings
        .start_place
        .parse()
        .with_context(|| format!("Invalid start place '{}'", settings.start_place))?;
    bus.publish(NavigationRequested { place: start });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "exit" => break,
            _ if prompt.answer(line) => continue,
            _ => {}
        }

        match line.parse::<Place>() {
            Ok(place) => bus.publish(NavigationRequested { place }),
            Err(err) => warn!(token = line, error = %err, "not a valid place"),
        }
    }

    info!(place = ?manager.active_place().map(|p| p.to_string()), "shutting down");
    Ok(())
}
