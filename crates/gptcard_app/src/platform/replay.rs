use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use card_logging::card_info;
use clap::Parser;
use gptcard_engine::{ContentScript, ContentScriptSettings, Document, LocalStorage, StorageContents};

use super::host::HostPage;
use super::logging::{self, LogDestination};
use super::session::load_session;

const FINAL_SETTLE: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(name = "gptcard_app")]
#[command(about = "Replay a scripted card session against a host page")]
pub struct ReplayArgs {
    /// Host page HTML file
    pub page: PathBuf,

    /// Session script (RON list of host steps)
    pub session: PathBuf,

    /// Extension storage file; in-memory empty storage when omitted
    pub storage: Option<PathBuf>,
}

/// Replays a session against a host page and prints the final `#root` markup.
pub fn run_replay(args: ReplayArgs) -> anyhow::Result<()> {
    logging::initialize(LogDestination::Both);

    let page = fs::read_to_string(&args.page)
        .with_context(|| format!("reading host page {}", args.page.display()))?;
    let session = load_session(&args.session)?;
    let storage = match &args.storage {
        Some(path) => LocalStorage::open(path)
            .with_context(|| format!("opening storage {}", path.display()))?,
        None => LocalStorage::in_memory(StorageContents::default()),
    };

    let settings = ContentScriptSettings::default();
    let root_selector = settings.root_selector.clone();
    let mut script = ContentScript::new(Document::parse(&page), storage, settings);
    let mut host = HostPage::default();

    for (index, step) in session.steps.into_iter().enumerate() {
        card_info!("Step {}: {:?}", index + 1, step);
        host.apply(&mut script, step)
            .with_context(|| format!("replaying step {}", index + 1))?;
    }
    if !script.run_until_idle(FINAL_SETTLE) {
        bail!("requests still pending after {:?}", FINAL_SETTLE);
    }

    let root = script
        .document()
        .query_selector(&root_selector)?
        .with_context(|| format!("{root_selector} is not in the page"))?;
    println!("{}", script.document().outer_html(root)?);
    Ok(())
}
