//! novel-agent entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI, load config
//!   3. Apply CLI setting overrides as one batch
//!   4. Resolve effective log level (CLI `-v` flags > env > config), init logger
//!   5. Load the novel, build provider, retriever and prompts
//!   6. Create the run's history folder and round logs
//!   7. Spawn Ctrl-C → shutdown signal watcher
//!   8. Run the session until exit, end of input, or Ctrl-C

use std::io::Write as _;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::info;

use novel_agent::agent::{
    ConsolePresenter, FileRoundLogger, PromptTemplates, ScriptedSource, Session, StdinSource,
};
use novel_agent::config::{self, Config};
use novel_agent::document::Document;
use novel_agent::error::AppError;
use novel_agent::retrieval::keyword::{KeywordRetriever, RetrieverParams};
use novel_agent::{cli, llm, logger};

const RUN_STAMP_FORMAT: &str = "%Y%m%d-%H%M%S-%6f";

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    };
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
    // A pending stdin read would otherwise keep the runtime alive after Ctrl-C.
    std::process::exit(code);
}

async fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let args = cli::parse();

    let mut config = config::load(args.config_path.as_deref())?;
    config.settings.update(&args.overrides()?)?;
    if args.no_cold_start {
        config.cold_start = false;
    }

    let cli_level = logger::level_for_verbosity(args.verbose);
    let effective_log_level = cli_level.unwrap_or(config.log_level.as_str());
    logger::init(effective_log_level, cli_level.is_some(), args.log_file.as_deref())?;

    info!(
        name = %config.name,
        work_dir = %config.work_dir.display(),
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        matching_method = %config.settings.matching_method(),
        "config loaded"
    );

    let document = Document::load(&args.novel)?;

    let provider =
        llm::providers::build(&config.llm, &config.settings, config.llm_api_key.clone())?;
    let retriever = KeywordRetriever::new(RetrieverParams::from_settings(
        &config.settings,
        config.retrieval.chunk_chars,
    ))?;
    let prompts = PromptTemplates::load(config.prompts_dir.as_deref())?;

    let run_stamp = chrono::Local::now().format(RUN_STAMP_FORMAT).to_string();
    let history_folder = config.settings.history_folder(&run_stamp);
    let round_logger = FileRoundLogger::create(config.logs_dir.join(&history_folder).join("logs"))?;
    info!(log_dir = %round_logger.dir().display(), "round logs ready");

    print_startup_summary(
        &config,
        &document,
        provider.kind(),
        &history_folder,
        round_logger.dir(),
        args.script.is_none(),
    );

    // Ctrl-C handler — cancels the token; the session stops at its next wait.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received — initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    let mut session = Session::new(config.settings.clone(), document.into_text(), retriever, provider)
        .with_prompts(prompts);
    if !config.cold_start {
        session = session.with_cold_start(Vec::<String>::new());
    }

    let mut presenter = ConsolePresenter;
    let outcome = match &args.script {
        Some(path) => {
            let mut source = ScriptedSource::from_file(path)?;
            session.run(&mut source, &mut presenter, &round_logger, &shutdown).await?
        }
        None => {
            let mut source = StdinSource::new();
            session.run(&mut source, &mut presenter, &round_logger, &shutdown).await?
        }
    };

    info!(
        session = %session.id(),
        rounds = outcome.rounds_completed,
        exit = ?outcome.exit,
        "session finished"
    );
    Ok(())
}

fn print_startup_summary(
    config: &Config,
    document: &Document,
    provider_kind: &str,
    history_folder: &str,
    log_dir: &Path,
    interactive: bool,
) {
    let fit = |text: String| -> String {
        const WIDTH: usize = 58;
        let char_count = text.chars().count();
        if char_count >= WIDTH {
            let mut out = text.chars().take(WIDTH - 1).collect::<String>();
            out.push('…');
            out
        } else {
            format!("{text:<WIDTH$}")
        }
    };

    let novel_line = format!("{} ({} chars)", document.name(), document.char_count());
    let llm_line = format!("provider={} model={}", provider_kind, config.settings.common_model());
    let seeds_line = if config.cold_start { "cold start: on" } else { "cold start: off" };

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ 📖 {:<58}║", config.name);
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║   {}║", fit(format!("novel: {novel_line}")));
    println!("║   {}║", fit(format!("llm: {llm_line}")));
    println!("║   {}║", fit(format!("run: {history_folder}")));
    println!("║   {}║", fit(format!("logs: {}", log_dir.display())));
    println!("║   {}║", fit(seeds_line.to_string()));
    println!("╚══════════════════════════════════════════════════════════════╝");

    if interactive {
        println!("💡 Type your question (exit to quit)");
    }
}
