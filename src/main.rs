// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use subweave::app_config::{self, Config, TranslationProvider};
use subweave::database::{DatabaseConnection, KeyValueStore, Repository};
use subweave::language_utils::Language;
use subweave::providers::supported_languages;
use subweave::subtitle_codec::{self, CodecOptions, Resync, SubtitleFormat};
use subweave::subtitles::SubtitleManager;
use subweave::translation::{DiffEngine, DiffRequest, SchedulerRegistry};

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliTranslationProvider {
    Baidu,
    Ali,
    Youdao,
    Huoshan,
    Azure,
    #[value(name = "deepl")]
    DeepL,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Baidu => TranslationProvider::Baidu,
            CliTranslationProvider::Ali => TranslationProvider::Ali,
            CliTranslationProvider::Youdao => TranslationProvider::Youdao,
            CliTranslationProvider::Huoshan => TranslationProvider::Huoshan,
            CliTranslationProvider::Azure => TranslationProvider::Azure,
            CliTranslationProvider::DeepL => TranslationProvider::DeepL,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the detected format of a subtitle file
    Detect {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Convert a subtitle file to another format
    Convert {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format (vtt, srt, lrc, sbv, smi, sub)
        #[arg(long)]
        to: SubtitleFormat,

        /// Input format, detected when omitted
        #[arg(long)]
        from: Option<SubtitleFormat>,

        /// Shift every timestamp by this many milliseconds
        #[arg(long, allow_hyphen_values = true)]
        offset_ms: Option<i64>,

        /// Scale every timestamp by this ratio
        #[arg(long)]
        ratio: Option<f64>,

        /// Frame rate for MicroDVD
        #[arg(long)]
        fps: Option<f64>,

        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a subtitle file as the source track of a record
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Language of the file
        #[arg(short, long)]
        lang: Language,

        /// Record to replace, a new one is created when omitted
        #[arg(long)]
        id: Option<String>,
    },

    /// Translate whatever a record's target track is missing
    Translate {
        #[arg(value_name = "ID")]
        id: String,

        /// Source language
        #[arg(short, long)]
        source: Language,

        /// Target language
        #[arg(short, long)]
        target: Language,

        /// Translation provider, the configured one when omitted
        #[arg(short, long, value_enum)]
        provider: Option<CliTranslationProvider>,

        /// Segments per call
        #[arg(short, long)]
        batch_size: Option<usize>,
    },

    /// Export a stored track
    Export {
        #[arg(value_name = "ID")]
        id: String,

        /// Track to export
        #[arg(short, long)]
        lang: Language,

        /// Second track merged under each cue
        #[arg(long)]
        secondary: Option<Language>,

        /// Output format
        #[arg(short, long, default_value = "srt")]
        format: SubtitleFormat,

        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List stored records
    List,

    /// Store the credential object for a provider
    Credentials {
        #[arg(value_enum)]
        provider: CliTranslationProvider,

        /// JSON object, e.g. '{"appid":"...","key":"..."}' for Baidu
        #[arg(value_name = "JSON")]
        json: String,
    },

    /// List the languages a provider supports
    Languages {
        #[arg(value_enum)]
        provider: CliTranslationProvider,
    },

    /// Generate shell completions for subweave
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// subweave - incremental subtitle translation
///
/// Converts between subtitle formats and keeps translated tracks in step
/// with a growing source track through machine-translation providers.
#[derive(Parser, Debug)]
#[command(name = "subweave")]
#[command(version)]
#[command(about = "Incremental subtitle translation through machine-translation providers")]
#[command(long_about = "subweave converts subtitle files and translates their tracks incrementally.

EXAMPLES:
    subweave detect movie.srt
    subweave convert movie.srt --to vtt -o movie.vtt
    subweave convert lyrics.lrc --to srt --offset-ms -250
    subweave import movie.srt --lang en                # prints the record id
    subweave credentials deepl '{\"authKey\":\"...\",\"deeplAccType\":\"free\"}'
    subweave translate <ID> -s en -t fr -p deepl
    subweave export <ID> -l en --secondary fr -f srt -o movie.en-fr.srt
    subweave completions bash > subweave.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file does not
    exist a default one is written. Provider credentials are kept in the
    database, see the credentials command.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config: PathBuf,

    /// Set logging level
    #[arg(long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Database file, overrides the configured one
    #[arg(long, global = true)]
    database: Option<PathBuf>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is set once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(level) = cli.log_level {
        log::set_max_level(app_config::LogLevel::from(level).to_level_filter());
    }

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subweave", &mut std::io::stdout());
            Ok(())
        }
        Commands::Detect { file } => {
            let content = read_file(&file)?;
            match subtitle_codec::detect(&content) {
                Some(format) => println!("{}", format.name()),
                None => return Err(anyhow!("Unable to detect subtitle format of {}", file.display())),
            }
            Ok(())
        }
        Commands::Convert {
            file,
            to,
            from,
            offset_ms,
            ratio,
            fps,
            output,
        } => {
            let content = read_file(&file)?;
            let from = from.or_else(|| SubtitleFormat::from_path(&file));
            let shift = (offset_ms.is_some() || ratio.is_some()).then(|| Resync {
                offset_ms: offset_ms.unwrap_or(0),
                ratio: ratio.unwrap_or(1.0),
            });
            let mut options = CodecOptions::default();
            if let Some(fps) = fps {
                options.fps = fps;
            }
            let converted = subtitle_codec::convert(&content, from, to, shift, &options)
                .with_context(|| format!("Failed to convert {}", file.display()))?;
            write_output(output.as_deref(), &converted)
        }
        command => {
            let config = load_config(&cli.config, cli.log_level)?;
            let store = open_store(cli.database.as_deref(), &config)?;
            run_stored(command, config, store).await
        }
    }
}

/// Commands that need configuration and the database
async fn run_stored(command: Commands, config: Config, store: Arc<Repository>) -> Result<()> {
    let manager = Arc::new(SubtitleManager::new(store.clone()));

    match command {
        Commands::Import { file, lang, id } => {
            let content = read_file(&file)?;
            let id = match id {
                Some(id) => id,
                None => manager.create_record().await?.id,
            };
            let timeline = manager.import(&id, &content, lang).await?;
            info!("Imported {} segments from {}", timeline.len(), file.display());
            println!("{}", id);
        }
        Commands::Translate {
            id,
            source,
            target,
            provider,
            batch_size,
        } => {
            let provider: TranslationProvider = provider
                .map(Into::into)
                .unwrap_or(config.translation.provider);
            let request = DiffRequest::new(id, source, target, provider)
                .with_batch_size(batch_size.unwrap_or(config.translation.batch_size));

            let registry = Arc::new(SchedulerRegistry::new(store.clone(), &config));
            let engine = DiffEngine::new(manager, registry);

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, finishing the batch in flight");
                    on_signal.cancel();
                }
            });

            let spinner = ProgressBar::new_spinner();
            let style = ProgressStyle::default_spinner()
                .template("{spinner} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.enable_steady_tick(Duration::from_millis(120));
            spinner.set_message(format!("Translating with {}", provider));

            let result = engine
                .translate_until_caught_up_with_progress(&request, cancel, |report| {
                    spinner.set_message(format!(
                        "{} segments translated, {} remaining",
                        report.translated, report.remaining
                    ));
                })
                .await;

            match result {
                Ok(report) if report.cancelled => {
                    spinner.abandon_with_message(format!(
                        "Stopped after {} segments in {} batches",
                        report.translated, report.batches
                    ));
                }
                Ok(report) => {
                    spinner.finish_with_message(format!(
                        "Caught up: {} segments in {} batches ({} characters billed)",
                        report.translated, report.batches, report.word_count
                    ));
                }
                Err(e) => {
                    spinner.abandon_with_message("Translation failed");
                    return Err(e.into());
                }
            }
        }
        Commands::Export {
            id,
            lang,
            secondary,
            format,
            output,
        } => {
            let content = manager.export(&id, lang, secondary, format).await?;
            write_output(output.as_deref(), &content)?;
        }
        Commands::List => {
            for key in store.keys_with_prefix("subtitles:").await? {
                let id = &key["subtitles:".len()..];
                if id.contains(':') {
                    continue;
                }
                if let Some(record) = manager.get_record(id).await? {
                    let languages: Vec<&str> = record.languages.iter().map(|l| l.code()).collect();
                    println!(
                        "{}\t{}\t{}",
                        record.id,
                        record.default_lang.map(|l| l.code()).unwrap_or("-"),
                        languages.join(",")
                    );
                }
            }
        }
        Commands::Credentials { provider, json } => {
            let provider: TranslationProvider = provider.into();
            let value: serde_json::Value =
                serde_json::from_str(&json).context("Credentials must be a JSON object")?;
            if !value.is_object() {
                return Err(anyhow!("Credentials must be a JSON object"));
            }
            store.set(provider.credentials_key(), &value.to_string()).await?;
            info!("Stored credentials for {}", provider.display_name());
        }
        Commands::Languages { provider } => {
            let provider: TranslationProvider = provider.into();
            for language in supported_languages(provider) {
                println!("{}\t{}", language.code(), language.english_name());
            }
        }
        Commands::Detect { .. } | Commands::Convert { .. } | Commands::Completions { .. } => {}
    }

    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Success: {}", path.display());
            Ok(())
        }
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}

/// Load the config file, writing a default one when it is missing
fn load_config(path: &Path, cli_level: Option<CliLogLevel>) -> Result<Config> {
    let mut config = if path.exists() {
        Config::from_file(path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        config
    };

    match cli_level {
        Some(level) => config.log_level = level.into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn open_store(database: Option<&Path>, config: &Config) -> Result<Arc<Repository>> {
    let connection = match database.or(config.database_path.as_deref()) {
        Some(path) => DatabaseConnection::new(path)?,
        None => DatabaseConnection::new_default()?,
    };
    Ok(Arc::new(Repository::new(connection)))
}
