//! Command implementations

use std::{
    fs,
    io::Read,
    path::Path,
    sync::Arc,
};

use chrono::{DateTime, Utc};
use guardrail_config::{ConfigManager, GuardrailsConfig};
use guardrail_safety::{GuardrailsEngine, PiiRedactor, RuleKind};
use guardrail_sessions::{ConversationStore, Message, StoreConfig};
use serde::Deserialize;
use tracing::info;

use crate::{
    cli::{Commands, InputArgs, RulesCommand},
    error::{CliError, CliResult},
    output::{render, Notice, ReplayReport, Report, RuleSummary, RulesReport, SessionReport},
};

/// Rendered command output and whether the command succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub output: String,
    pub success: bool,
}

impl Outcome {
    fn from_report<R: Report>(report: &R, json: bool) -> CliResult<Self> {
        Ok(Self {
            output: render(report, json)?,
            success: report.success(),
        })
    }
}

/// Load the configuration document, if a path was given
pub async fn load_config(path: Option<&Path>) -> CliResult<Option<GuardrailsConfig>> {
    match path {
        Some(path) => {
            let mut manager = ConfigManager::with_path(path);
            Ok(Some(manager.load_config_async().await?.clone()))
        }
        None => Ok(None),
    }
}

/// Build the engine from a loaded document or the built-in defaults
pub fn build_engine(config: Option<GuardrailsConfig>) -> CliResult<Arc<GuardrailsEngine>> {
    let builder = match config {
        Some(config) => GuardrailsEngine::builder().config(config),
        None => GuardrailsEngine::builder(),
    };
    Ok(Arc::new(builder.build()?))
}

/// Run a command that needs an engine
pub fn execute(command: Commands, engine: Arc<GuardrailsEngine>, json: bool) -> CliResult<Outcome> {
    match command {
        Commands::Check(input) => {
            let content = read_input(&input)?;
            Outcome::from_report(&engine.check_content(&content, None), json)
        }
        Commands::Validate(input) => {
            let content = read_input(&input)?;
            Outcome::from_report(&engine.validate_output(&content, None), json)
        }
        Commands::Redact(input) => {
            let content = read_input(&input)?;
            Outcome::from_report(&PiiRedactor::new().redact(&content), json)
        }
        Commands::Rules {
            command: RulesCommand::List { enabled },
        } => Outcome::from_report(&list_rules(&engine, enabled), json),
        Commands::Rules {
            command: RulesCommand::Export { path },
        } => {
            engine.save_config(&path)?;
            let notice = Notice {
                message: format!(
                    "Wrote {} rule(s) to {}",
                    engine.list_rules().len(),
                    path.display()
                ),
            };
            Outcome::from_report(&notice, json)
        }
        Commands::Replay {
            transcript,
            max_history,
            window,
        } => Outcome::from_report(&replay(engine, &transcript, max_history, window)?, json),
        Commands::Init { path, force } => Outcome::from_report(&init(&path, force)?, json),
    }
}

/// Write the default configuration document to `path`
pub fn init(path: &Path, force: bool) -> CliResult<Notice> {
    if path.exists() && !force {
        return Err(CliError::invalid_argument(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    ConfigManager::from_config(GuardrailsConfig::default()).save_config(Some(path))?;
    Ok(Notice {
        message: format!("Wrote default configuration to {}", path.display()),
    })
}

fn read_input(input: &InputArgs) -> CliResult<String> {
    if let Some(file) = &input.file {
        return Ok(fs::read_to_string(file)?);
    }
    match input.text.as_deref() {
        Some("-") | None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
        Some(text) => Ok(text.to_string()),
    }
}

fn list_rules(engine: &GuardrailsEngine, enabled_only: bool) -> RulesReport {
    let rules = if enabled_only {
        engine.list_enabled_rules()
    } else {
        engine.list_rules()
    };
    RulesReport {
        rules: rules
            .into_iter()
            .map(|rule| RuleSummary {
                kind: kind_name(&rule.kind).to_string(),
                parameters: rule.parameters(),
                name: rule.name,
                description: rule.description,
                enabled: rule.enabled,
                threshold: rule.threshold,
            })
            .collect(),
    }
}

fn kind_name(kind: &RuleKind) -> &'static str {
    match kind {
        RuleKind::Keywords { .. } => "keywords",
        RuleKind::Patterns { .. } => "patterns",
        RuleKind::MaxLength { .. } => "max_length",
        RuleKind::Custom { .. } => "custom",
    }
}

/// One line of a conversation transcript
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptEntry {
    #[serde(default)]
    pub session_id: Option<String>,
    pub user_id: String,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

pub fn read_transcript(path: &Path) -> CliResult<Vec<TranscriptEntry>> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| CliError::Transcript(format!("{}: {}", path.display(), e)))
}

/// Append every transcript entry to a fresh store and report per session.
///
/// Entries without a session id share one generated session.
pub fn replay(
    engine: Arc<GuardrailsEngine>,
    transcript: &Path,
    max_history: usize,
    window: usize,
) -> CliResult<ReplayReport> {
    let entries = read_transcript(transcript)?;
    let store = ConversationStore::with_config(
        engine,
        StoreConfig {
            max_history,
            ..StoreConfig::default()
        },
    )?;

    let mut default_session: Option<String> = None;
    let mut order: Vec<String> = Vec::new();

    for entry in entries {
        let mut message = Message::new(entry.content, entry.user_id);
        if let Some(timestamp) = entry.timestamp {
            message = message.with_timestamp(timestamp);
        }

        let requested = entry.session_id.or_else(|| default_session.clone());
        let session_id = store.append(message, requested.as_deref());
        if requested.is_none() {
            default_session = Some(session_id.clone());
        }
        if !order.contains(&session_id) {
            order.push(session_id);
        }
    }

    info!("Replayed transcript into {} session(s)", order.len());

    Ok(ReplayReport {
        sessions: order
            .into_iter()
            .map(|id| SessionReport {
                stats: store.session_stats(&id),
                safety: store.session_safety(&id),
                recent: store.window(&id, window),
            })
            .collect(),
    })
}
