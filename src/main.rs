use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;

use polycode::core::context::{classify, classify_by_extension};
use polycode::core::features::converter::{ConversionOrchestrator, HttpBackendClient, Workspace};
use polycode::core::history::{summarize, HistoryCache};
use polycode::core::storage::open_local_store;
use polycode::core::theme::ThemeStore;
use polycode::shared::emit::EventSink;
use polycode::shared::error::{AppError, AppResult};
use polycode::shared::events::AppEvent;
use polycode::shared::settings::{ClientSettings, ServerSettings};
use polycode::shared::types::{LanguageLabel, LanguageSelection, NoticeKind};

#[derive(Parser)]
#[command(name = "polycode", version, about = "Translate source code between programming languages")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the conversion backend (needs CEREBRAS_API_KEY)
    Serve,
    /// Convert code through a running backend
    Convert {
        /// Target language, e.g. "Rust" or "C++"
        #[arg(long, short)]
        to: LanguageLabel,
        /// Source language, or "auto" to detect it
        #[arg(long, short, default_value = "auto")]
        from: LanguageSelection,
        /// Also write the result to converted_code.<ext> in the current directory
        #[arg(long)]
        save: bool,
        /// Source file; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Explain code in plain English
    Explain {
        #[arg(long, short)]
        language: Option<LanguageLabel>,
        /// Source file; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Guess the language of a file or of stdin
    Detect { file: Option<PathBuf> },
    /// Trim every line of a file (or stdin) and print it
    Format { file: Option<PathBuf> },
    /// Inspect past conversions
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// Show the theme, or switch it
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List stored conversions, newest first
    List,
    /// Print one stored conversion
    Show { index: usize },
    /// Forget every stored conversion
    Clear,
}

#[derive(Subcommand)]
enum ThemeAction {
    Toggle,
}

/// Prints notices for a terminal user; everything else goes to the debug log
struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&self, event: AppEvent) {
        match event {
            AppEvent::Notice { kind: NoticeKind::Success, message } => eprintln!("✓ {}", message),
            AppEvent::Notice { kind: NoticeKind::Error, message } => eprintln!("✗ {}", message),
            other => tracing::debug!("event: {:?}", other),
        }
    }
}

async fn read_source(file: Option<&Path>) -> AppResult<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::Io(format!("Failed to read {}: {}", path.display(), e))),
        None => {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            Ok(text)
        }
    }
}

async fn workspace() -> Workspace {
    let settings = ClientSettings::load().await.unwrap_or_else(|e| {
        tracing::warn!("Failed to load settings: {}", e);
        ClientSettings::default()
    });

    let sink: Arc<dyn EventSink> = Arc::new(ConsoleSink);
    let store = open_local_store();
    let history = HistoryCache::load(Arc::clone(&store), Arc::clone(&sink));
    let backend = Arc::new(HttpBackendClient::new(settings.backend_url.clone()));
    let orchestrator = Arc::new(ConversionOrchestrator::new(backend, history, Arc::clone(&sink)));

    Workspace::new(
        orchestrator,
        ThemeStore::load(store),
        sink,
        Duration::from_millis(settings.debounce_ms),
    )
}

async fn run(command: Command) -> AppResult<()> {
    match command {
        Command::Serve => {
            let settings = ServerSettings::from_env()?;
            polycode::api::serve(settings).await
        }

        Command::Convert { to, from, save, file } => {
            let ws = workspace().await;
            let source = read_source(file.as_deref()).await?;
            match file.as_deref().and_then(|p| p.file_name()).and_then(|n| n.to_str()) {
                Some(name) => ws.upload(name, source),
                None => ws.input(source),
            }

            // An explicit --from wins over detection from the file name
            if !from.is_auto() {
                ws.select_source(from);
            }
            ws.select_target(to);

            let output = ws.convert().await?;
            println!("{}", output);

            if save {
                let (name, contents) = ws.download()?;
                tokio::fs::write(&name, contents).await?;
                eprintln!("Saved {}", name);
            }
            Ok(())
        }

        Command::Explain { language, file } => {
            let ws = workspace().await;
            let code = read_source(file.as_deref()).await?;
            let explanation = ws.orchestrator().explain(&code, language).await?;
            println!("{}", explanation);
            Ok(())
        }

        Command::Detect { file } => {
            let by_name = file
                .as_deref()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .and_then(classify_by_extension);
            let label = match by_name {
                Some(label) => Some(label),
                None => classify(&read_source(file.as_deref()).await?),
            };

            match label {
                Some(label) => println!("{}", label),
                None => println!("unknown"),
            }
            Ok(())
        }

        Command::Format { file } => {
            let ws = workspace().await;
            ws.input(read_source(file.as_deref()).await?);
            println!("{}", ws.format()?);
            Ok(())
        }

        Command::History { action } => {
            let ws = workspace().await;
            match action.unwrap_or(HistoryAction::List) {
                HistoryAction::List => {
                    let records = ws.history();
                    if records.is_empty() {
                        println!("No history yet");
                    }
                    let now = chrono::Utc::now().timestamp_millis();
                    for (index, record) in records.iter().enumerate() {
                        let summary = summarize(record, now);
                        println!("{:>2}  {:<24} {:>8}  {}", index, summary.languages, summary.time_ago, summary.preview);
                    }
                }
                HistoryAction::Show { index } => match ws.load_history_item(index) {
                    Some(record) => {
                        println!("{} → {}", record.source_lang, record.target_lang);
                        println!("--- source ---\n{}", record.source_code);
                        println!("--- output ---\n{}", record.output);
                    }
                    None => {
                        let message = format!("No history item at index {}", index);
                        eprintln!("✗ {}", message);
                        return Err(AppError::Validation(message));
                    }
                },
                HistoryAction::Clear => ws.clear_history(),
            }
            Ok(())
        }

        Command::Theme { action } => {
            let ws = workspace().await;
            let theme = match action {
                Some(ThemeAction::Toggle) => ws.toggle_theme(),
                None => ws.theme(),
            };
            println!("{}", theme);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    polycode::init_tracing();
    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ (AppError::Config(_) | AppError::Io(_) | AppError::Persistence(_) | AppError::Unknown(_))) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            // Validation and backend failures were already shown as notices
            tracing::debug!("command failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
