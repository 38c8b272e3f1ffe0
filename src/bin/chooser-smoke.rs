//! Smoke test binary for the chooser core.
//!
//! Run with:
//!   cargo run --bin chooser-smoke -- --entries apps.json --keys "m,a,i,cmd+1,enter"
//!
//! Loads a JSON array of entries, activates a chooser, replays the key
//! sequence (printable passthrough keys are typed into the query) and prints
//! the result as JSON on stdout.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{json, Value};
use tracing::info;

use chooser_core::config::{load_config, load_config_from};
use chooser_core::error::ResultExt;
use chooser_core::{
    logging, Chooser, DispatchOutcome, Entry, EventLoop, KeyEvent, LocalKeyMonitor,
    MatchStrategy, SearchMode, Shortcut,
};

#[derive(Parser, Debug)]
#[command(name = "chooser-smoke", about = "Drive a chooser from the command line")]
struct Args {
    /// JSON file holding an array of entries
    #[arg(long)]
    entries: PathBuf,

    /// Comma-separated key chords, e.g. "a,i,l,cmd+1,enter"
    #[arg(long, default_value = "")]
    keys: String,

    /// Config file (defaults to the user config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the query-changed debounce delay
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Match against subtext as well as text
    #[arg(long)]
    subtext: bool,

    /// Use fuzzy subsequence matching
    #[arg(long)]
    fuzzy: bool,
}

fn main() -> Result<()> {
    let _guard = logging::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config_from(path)
            .inspect_err(|e| eprintln!("{}", e.user_message()))
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => load_config(),
    };
    if let Some(ms) = args.debounce_ms {
        config.debounce_delay_ms = ms;
    }
    if args.subtext {
        config.search_mode = SearchMode::TextAndSubtext;
    }
    if args.fuzzy {
        config.match_strategy = MatchStrategy::Fuzzy;
    }

    let raw = fs::read_to_string(&args.entries)
        .with_context(|| format!("Failed to read {}", args.entries.display()))?;
    let entries = Entry::list_from_json(&raw)
        .inspect_err(|e| eprintln!("{}", e.user_message()))
        .with_context(|| format!("Invalid entries in {}", args.entries.display()))?;

    let event_loop = EventLoop::new();
    let mut chooser = Chooser::new(config, event_loop.clone(), Box::new(LocalKeyMonitor::new()))
        .context("Failed to create chooser")?;

    let queries: Rc<RefCell<Vec<String>>> = Rc::default();
    let sink = queries.clone();
    chooser.on_query_changed(move |q| sink.borrow_mut().push(q));

    let selection: Rc<RefCell<Option<Option<Entry>>>> = Rc::default();
    let slot = selection.clone();
    chooser.on_selection(move |entry: Option<&Entry>| {
        *slot.borrow_mut() = Some(entry.cloned());
    });

    chooser.set_entries(entries);
    chooser.activate();

    let mut query = String::new();
    for token in args.keys.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let shortcut =
            Shortcut::parse(token).with_context(|| format!("Invalid key chord '{}'", token))?;
        let event = KeyEvent::new(shortcut.key, shortcut.modifiers);
        let outcome = chooser.handle_key_event(&event);
        if outcome == DispatchOutcome::Passthrough {
            // Stand-in for the host's text field
            if let Some(text) = event.text() {
                query.push_str(text);
                chooser.set_query(&query);
            } else if event.key == "backspace" {
                query.pop();
                chooser.set_query(&query);
            }
        }
        info!(chord = token, outcome = ?outcome, rows = chooser.result_len(), "Replayed key");
        if !chooser.is_active() {
            break;
        }
    }
    event_loop.run_until_idle();

    let rows: Vec<&str> = chooser.result_entries().map(|e| e.text.as_str()).collect();
    let selected = match &*selection.borrow() {
        Some(Some(entry)) => serde_json::to_value(entry)
            .log_err()
            .unwrap_or(Value::Null),
        _ => Value::Null,
    };
    let report = json!({
        "phase": format!("{:?}", chooser.phase()),
        "placeholder": chooser.placeholder(),
        "query": chooser.query(),
        "rows": rows,
        "highlighted": chooser.selected_row(),
        "queryNotifications": queries.borrow().clone(),
        "selection": selected,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
