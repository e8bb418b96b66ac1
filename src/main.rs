use anyhow::{Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use idea_improver::config::{self, Config};
use idea_improver::events::{CollectingHandler, TerminalEventHandler, drain_events};
use idea_improver::format::{
    DEFAULT_WIDTH, format_builtin_help, format_cancelled, format_char_counter, format_document,
    format_error_message, format_startup_banner,
};
use idea_improver::{
    Idea, ImproveClient, ImproveResult, ResponseMode, TextDirection, TypingPace, logging, markdown,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;
const HISTORY_CAPACITY: usize = 1000;

/// Exit code for a stream cancelled with Ctrl-C.
const EXIT_CANCELLED: u8 = 130;

const HELP_TEXT: &str = "\
Commands:
  /q, /quit, /exit   Exit the REPL
  /endpoint          Show the improve endpoint
  /mode [MODE]       Show or set the response mode (auto, stream, whole)
  /h, /help          Show this help message

Anything else is sent as an idea (up to 500 characters).
Ctrl-C cancels a running request, Ctrl-D exits.";

#[derive(Parser)]
#[command(name = "idea-improver")]
#[command(version)]
#[command(about = "Turn a rough idea into a detailed prompt, streamed live")]
struct Args {
    /// Idea to improve (non-interactive mode)
    #[arg(short, long)]
    idea: Option<String>,

    /// Read the idea from a file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Backend origin; the idea is posted to <URL>/improve
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// How to read the response body
    #[arg(short, long, value_enum)]
    mode: Option<ResponseMode>,

    /// Print characters as they arrive, without the typing effect
    #[arg(long)]
    no_typing: bool,

    /// Output width used to right-align right-to-left text
    #[arg(short, long)]
    width: Option<usize>,

    /// Force the output direction (ltr or rtl) instead of detecting it
    #[arg(short, long, value_name = "DIR")]
    direction: Option<TextDirection>,

    /// Increase diagnostic output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the backend is up
    Health,
}

/// Per-process settings shared by every request.
struct Session {
    client: ImproveClient,
    mode: ResponseMode,
    pace: TypingPace,
    width: usize,
    /// Forced output direction; detected from the response when `None`.
    direction: Option<TextDirection>,
    /// stdout is a terminal: redraw lines live instead of rendering once.
    live: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = config::load_config();
    let endpoint = config.endpoint(args.api_url.as_deref())?;
    let client = ImproveClient::new(endpoint, config.connect_timeout())?;

    if let Some(Command::Health) = args.command {
        return Ok(run_health(&client).await);
    }

    let live = io::stdout().is_terminal();
    let typing = !args.no_typing && config.typing.unwrap_or(true) && live;
    let mut session = Session {
        client,
        mode: args.mode.or(config.mode).unwrap_or_default(),
        pace: if typing {
            TypingPace::default()
        } else {
            TypingPace::instant()
        },
        width: resolve_width(args.width, &config),
        direction: args.direction.or(config.direction),
        live,
    };

    eprintln!(
        "{}",
        format_startup_banner(
            env!("CARGO_PKG_VERSION"),
            session.client.endpoint().improve_url().as_str(),
            &session.mode.to_string()
        )
    );
    eprintln!();

    let mut piped_input = String::new();
    if !io::stdin().is_terminal() {
        io::stdin().read_to_string(&mut piped_input)?;
    }
    let piped_input = piped_input.trim();

    let mut idea = args.idea;
    if let Some(file_path) = args.file {
        let file_content = std::fs::read_to_string(file_path)?;
        idea = Some(match idea {
            Some(i) => format!("{i}\n\n{file_content}"),
            None => file_content,
        });
    }

    let combined = if piped_input.is_empty() {
        idea
    } else if let Some(i) = idea {
        Some(format!("{piped_input}\n\n{i}"))
    } else {
        Some(piped_input.to_string())
    };

    if let Some(raw) = combined {
        // Non-interactive mode: run a single idea
        return Ok(match run_idea(&session, &raw).await {
            Ok(result) if result.cancelled => ExitCode::from(EXIT_CANCELLED),
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                report_error(&e);
                ExitCode::FAILURE
            }
        });
    }

    if !io::stdin().is_terminal() {
        bail!("no idea given: pass --idea, --file, or pipe text on stdin");
    }

    run_repl(&mut session).await?;
    Ok(ExitCode::SUCCESS)
}

/// CLI flag, then config, then `$COLUMNS`, then the default.
fn resolve_width(cli: Option<usize>, config: &Config) -> usize {
    cli.or(config.width)
        .or_else(|| std::env::var("COLUMNS").ok().and_then(|c| c.parse().ok()))
        .filter(|w| *w > 0)
        .unwrap_or(DEFAULT_WIDTH)
}

async fn run_health(client: &ImproveClient) -> ExitCode {
    match client.health().await {
        Ok(()) => {
            println!("{} {}", "ok".green(), client.endpoint().health_url());
            ExitCode::SUCCESS
        }
        Err(e) => {
            report_error(&anyhow::Error::from(e));
            ExitCode::FAILURE
        }
    }
}

fn report_error(e: &anyhow::Error) {
    tracing::error!("{e:#}");
    eprintln!("\n{}", format_error_message(&format!("{e:#}")));
}

/// Validate, send, and display one idea.
async fn run_idea(session: &Session, raw: &str) -> Result<ImproveResult> {
    let idea = Idea::parse(raw)?;
    eprintln!(
        "{}",
        format_char_counter(idea.char_count(), idea.direction())
    );

    let cancellation_token = CancellationToken::new();
    let ctrl_c = tokio::spawn({
        let token = cancellation_token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        }
    });

    let (events_tx, mut events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let request = session.client.improve(
        &idea,
        session.mode,
        Some(events_tx),
        &session.pace,
        &cancellation_token,
    );

    let stdout = io::stdout();
    let result = if session.live {
        let mut handler =
            TerminalEventHandler::new(stdout.lock(), session.width, session.direction);
        let (result, ()) = tokio::join!(request, drain_events(&mut events_rx, &mut handler));
        result
    } else {
        let mut handler =
            CollectingHandler::new(stdout.lock(), session.width, session.direction);
        let (result, ()) = tokio::join!(request, drain_events(&mut events_rx, &mut handler));
        result
    };
    ctrl_c.abort();

    let result = result?;
    if result.cancelled {
        eprintln!("{}", format_cancelled());
    } else if result.chars_emitted == 0 && !result.text.is_empty() {
        // Whole responses arrive without events
        let direction = session
            .direction
            .unwrap_or_else(|| TextDirection::detect(&result.text));
        let rendered = markdown::render(&result.text, direction);
        println!("{}", format_document(&rendered, session.width));
    }
    Ok(result)
}

async fn run_repl(session: &mut Session) -> Result<()> {
    let mut line_editor = Reedline::create();

    let history_path = home::home_dir().map(|mut p| {
        p.push(".idea_improver_history");
        p
    });
    if let Some(path) = history_path
        && let Ok(history) = FileBackedHistory::with_file(HISTORY_CAPACITY, path)
    {
        line_editor = line_editor.with_history(Box::new(history));
    }

    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic("idea".to_string()),
        DefaultPromptSegment::Empty,
    );

    loop {
        match line_editor.read_line(&prompt)? {
            Signal::Success(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }

                if input == "/quit" || input == "/exit" || input == "/q" {
                    break;
                }

                if input == "/help" || input == "/h" {
                    eprint!("{}", format_builtin_help(HELP_TEXT));
                    continue;
                }

                if input == "/endpoint" {
                    println!("{}", session.client.endpoint().improve_url().as_str().green());
                    continue;
                }

                if let Some(rest) = input.strip_prefix("/mode") {
                    handle_mode_command(session, rest.trim());
                    continue;
                }

                if let Err(e) = run_idea(session, input).await {
                    report_error(&e);
                }
                eprintln!();
            }
            Signal::CtrlC => {
                // Nothing running at the prompt
                continue;
            }
            Signal::CtrlD => break,
        }
    }

    Ok(())
}

fn handle_mode_command(session: &mut Session, arg: &str) {
    if arg.is_empty() {
        println!("{}", session.mode.to_string().yellow());
        return;
    }
    match <ResponseMode as clap::ValueEnum>::from_str(arg, true) {
        Ok(mode) => {
            session.mode = mode;
            eprintln!("[mode: {mode}]");
        }
        Err(e) => eprintln!("{}", format_error_message(&e)),
    }
}
