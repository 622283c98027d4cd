use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context};
use colored::Colorize;
use ripple_collection::{
    Collection, CollectionConfig, CollectionState, LoadError, Phase, StateChanged,
};
use ripple_diff::{
    apply, apply_sections, ChangeSet, DiffEngine, EditOp, EditScript, SectionedEditScript,
};
use ripple_types::{Entity, EntityId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::cli::*;
use crate::config::CliConfig;
use crate::record::{load_records, load_sections, read_json, records_from, Record};

pub fn run_command(cli: Cli, config: CliConfig) -> anyhow::Result<()> {
    let format = cli.format.unwrap_or(config.default_format);
    match cli.command {
        Command::Diff(args) => {
            let outcome = cmd_diff(&args, &config)?;
            print_diff(&outcome, format)
        }
        Command::Check(args) => {
            let report = cmd_check(&args)?;
            print_check(&report, format)?;
            if !report.is_clean() {
                bail!("{} duplicate id(s) in {}", report.duplicates.len(), args.file.display());
            }
            Ok(())
        }
        Command::Replay(args) => {
            let events = cmd_replay(&args, &config)?;
            print_replay(&events, format)
        }
    }
}

// ---- diff ----

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Script {
    Flat(EditScript),
    Sectioned(SectionedEditScript),
}

#[derive(Debug, Serialize)]
pub struct DiffOutcome {
    pub script: Script,
    pub changes: usize,
    /// Replaying the script against the old snapshot reproduced the new one.
    pub verified: bool,
}

fn cmd_diff(args: &DiffArgs, config: &CliConfig) -> anyhow::Result<DiffOutcome> {
    let engine = DiffEngine::new(config.diff_with(args.policy));

    let (script, verified) = if args.sections {
        let old = load_sections(&args.old)?;
        let new = load_sections(&args.new)?;
        let script = engine.diff_sections(&old, &new)?;
        let verified = apply_sections(&script, &old, &new)? == new;
        (Script::Sectioned(script), verified)
    } else {
        let old = load_records(&args.old)?;
        let new = load_records(&args.new)?;
        let script = engine.diff(&old, &new)?;
        let verified = apply(&script, &old, &new)? == new;
        (Script::Flat(script), verified)
    };

    let changes = match &script {
        Script::Flat(s) => s.change_count(),
        Script::Sectioned(s) => s.change_count(),
    };
    info!(old = %args.old.display(), new = %args.new.display(), changes, verified, "diff complete");
    Ok(DiffOutcome {
        script,
        changes,
        verified,
    })
}

fn print_diff(outcome: &DiffOutcome, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    match &outcome.script {
        Script::Flat(script) => print_ops(script, "  "),
        Script::Sectioned(script) => {
            if !script.sections.is_empty() {
                println!("{}", "sections:".bold());
                print_ops(&script.sections, "  ");
            }
            for entry in &script.items {
                println!(
                    "{} {} (was {})",
                    "section".bold(),
                    entry.new_section,
                    entry.old_section
                );
                print_ops(&entry.script, "  ");
            }
        }
    }

    if outcome.changes == 0 {
        println!("No changes.");
    } else {
        println!("{} change(s)", outcome.changes.to_string().bold());
    }
    if outcome.verified {
        println!("{} Round trip verified", "✓".green().bold());
    } else {
        println!("{} Round trip mismatch", "✗".red().bold());
    }
    Ok(())
}

fn print_ops(script: &EditScript, indent: &str) {
    for op in script {
        let line = op.to_string();
        let line = match op {
            EditOp::Delete(_) => line.red(),
            EditOp::Insert(_) => line.green(),
            EditOp::Move { .. } => line.yellow(),
            EditOp::Update(_) => line.cyan(),
        };
        println!("{indent}{line}");
    }
}

// ---- check ----

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Duplicate {
    /// `"item"` or `"section"`.
    pub kind: &'static str,
    pub id: String,
    pub first: usize,
    pub second: usize,
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub entries: usize,
    pub duplicates: Vec<Duplicate>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty()
    }
}

fn cmd_check(args: &CheckArgs) -> anyhow::Result<CheckReport> {
    let mut duplicates = Vec::new();
    let entries = if args.sections {
        let sections = load_sections(&args.file)?;
        duplicates.extend(find_duplicates("section", sections.iter().map(|s| &s.id)));
        duplicates.extend(find_duplicates("item", sections.items().map(Entity::id)));
        sections.item_count()
    } else {
        let records = load_records(&args.file)?;
        duplicates.extend(find_duplicates("item", records.iter().map(Entity::id)));
        records.len()
    };
    Ok(CheckReport {
        entries,
        duplicates,
    })
}

/// Every repeat of an id, paired with its first occurrence. Item positions
/// count across sections in display order.
fn find_duplicates<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a EntityId>,
) -> Vec<Duplicate> {
    let mut first_seen: HashMap<&EntityId, usize> = HashMap::new();
    let mut found = Vec::new();
    for (i, id) in ids.enumerate() {
        match first_seen.get(id) {
            Some(&first) => found.push(Duplicate {
                kind,
                id: id.to_string(),
                first,
                second: i,
            }),
            None => {
                first_seen.insert(id, i);
            }
        }
    }
    found
}

fn print_check(report: &CheckReport, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    if report.is_clean() {
        println!(
            "{} {} entries, no duplicate ids",
            "✓".green().bold(),
            report.entries
        );
    }
    for dup in &report.duplicates {
        println!(
            "{} duplicate {} id {} at {} and {}",
            "✗".red().bold(),
            dup.kind,
            dup.id.yellow(),
            dup.first,
            dup.second
        );
    }
    Ok(())
}

// ---- replay ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Step {
    Load {
        #[serde(default)]
        carry: bool,
    },
    Loaded(Vec<Value>),
    Error(String),
}

#[derive(Debug, Serialize)]
pub struct ReplayEvent {
    pub step: usize,
    pub previous: Phase,
    pub phase: Phase,
    pub items: usize,
    pub script: EditScript,
}

fn cmd_replay(args: &ReplayArgs, config: &CliConfig) -> anyhow::Result<Vec<ReplayEvent>> {
    let steps: Vec<Step> = serde_json::from_value(read_json(&args.steps)?)
        .with_context(|| format!("{} is not a JSON array of steps", args.steps.display()))?;

    let collection: Collection<Vec<Record>> = Collection::new(CollectionConfig {
        label: replay_label(&args.steps),
        diff: config.diff_with(None),
        strict_transitions: args.strict,
    });

    let step = Arc::new(AtomicUsize::new(0));
    let events: Arc<Mutex<Vec<ReplayEvent>>> = Arc::default();
    let _subscription = {
        let step = Arc::clone(&step);
        let events = Arc::clone(&events);
        collection.observe(move |change: &StateChanged<Vec<Record>>| {
            events.lock().expect("replay log lock poisoned").push(ReplayEvent {
                step: step.load(Ordering::Relaxed),
                previous: change.previous,
                phase: change.state.phase(),
                items: change.state.content().map_or(0, Vec::len),
                script: change.script.clone(),
            });
        })
    };

    let mut ticket = None;
    for (i, next) in steps.into_iter().enumerate() {
        step.store(i + 1, Ordering::Relaxed);
        match next {
            Step::Load { carry } => {
                ticket = Some(
                    collection
                        .begin_load(carry)
                        .with_context(|| format!("step {}", i + 1))?,
                );
            }
            Step::Loaded(values) => {
                let records = records_from(values).with_context(|| format!("step {}", i + 1))?;
                let settled = match ticket.take() {
                    Some(ticket) => collection.finish_load(ticket, records).map(|_| ()),
                    None => collection.set_state(CollectionState::Loaded(records)).map(|_| ()),
                };
                settled.with_context(|| format!("step {}", i + 1))?;
            }
            Step::Error(message) => {
                let error = LoadError::new(message);
                let settled = match ticket.take() {
                    Some(ticket) => collection.fail_load(ticket, error).map(|_| ()),
                    None => collection.set_state(CollectionState::Error(error)).map(|_| ()),
                };
                settled.with_context(|| format!("step {}", i + 1))?;
            }
        }
    }

    let events = std::mem::take(&mut *events.lock().expect("replay log lock poisoned"));
    Ok(events)
}

fn replay_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "replay".into())
}

fn print_replay(events: &[ReplayEvent], format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(events)?);
        return Ok(());
    }
    for event in events {
        println!(
            "{} {} -> {} ({} items, {} changes)",
            format!("[{}]", event.step).dimmed(),
            event.previous,
            event.phase.to_string().bold(),
            event.items,
            event.script.len()
        );
        print_ops(&event.script, "    ");
    }
    Ok(())
}
