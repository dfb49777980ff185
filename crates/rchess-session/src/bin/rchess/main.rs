mod terminal;

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use rchess_session::config::{EngineEntry, MAX_DEPTH, MIN_DEPTH, PlayerColor};
use rchess_session::{AppConfig, PgnFile, Session};
use terminal::{HELP, PendingPromotion, TerminalPresenter, spawn_stdin_reader};

const CHANNEL_SIZE: usize = 256;

#[derive(Parser, Debug)]
#[command(author, version, about = "Play chess against a UCI engine", long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "rchess.toml")]
    config: PathBuf,

    /// Engine to play against (a name from [[engines]])
    #[arg(short, long)]
    engine: Option<String>,

    /// Engine executable, used instead of the configured engines
    #[arg(long)]
    engine_path: Option<PathBuf>,

    /// Play the black pieces
    #[arg(long)]
    black: bool,

    /// Engine max depth (1000 = unlimited)
    #[arg(long)]
    depth: Option<u32>,

    /// Polyglot opening book
    #[arg(long, conflicts_with = "no_book")]
    book: Option<PathBuf>,

    /// Never use the opening book
    #[arg(long)]
    no_book: bool,

    /// PGN file that games are appended to
    #[arg(long)]
    pgn: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();

    use std::io::Write;
    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
    )
    .format(|buf, record| writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args()))
    .write_style(env_logger::WriteStyle::Never)
    .target(env_logger::Target::Stderr)
    .init();

    if let Err(e) = run(args) {
        log::error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

/// コマンドライン引数で設定ファイルの値を上書きする。
fn apply_args(config: &mut AppConfig, args: &Args) -> Result<()> {
    if let Some(path) = &args.engine_path {
        let name = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());
        config.engines.retain(|e| e.name != name);
        config.engines.insert(
            0,
            EngineEntry {
                name: name.clone(),
                path: path.clone(),
                args: Vec::new(),
                working_dir: None,
                options: Default::default(),
            },
        );
        config.engine.name = Some(name);
    }
    if let Some(name) = &args.engine {
        if config.find_engine(name).is_none() {
            bail!("unknown engine {name:?}");
        }
        config.engine.name = Some(name.clone());
    }
    if args.black {
        config.player.color = PlayerColor::Black;
    }
    if let Some(depth) = args.depth {
        config.engine.max_depth = Some(depth.clamp(MIN_DEPTH, MAX_DEPTH));
    }
    if let Some(book) = &args.book {
        config.book.path = Some(book.clone());
        config.book.enabled = true;
    }
    if args.no_book {
        config.book.enabled = false;
    }
    if let Some(pgn) = &args.pgn {
        config.pgn.path = pgn.clone();
    }
    config.validate()
}

fn run(args: Args) -> Result<()> {
    let mut config = AppConfig::load(&args.config)?;
    apply_args(&mut config, &args)?;

    let settings = config.session_settings();
    match &settings.engine {
        Some(engine) => log::info!("engine: {} ({})", engine.name, engine.path.display()),
        None => log::warn!("no engine configured, use --engine-path or [[engines]]"),
    }

    let (tx, rx) = crossbeam_channel::bounded(CHANNEL_SIZE);
    let promotion = PendingPromotion::default();
    // 標準入力が閉じるまで読み続けるので join しない
    let _reader = spawn_stdin_reader(tx, promotion.clone());

    let presenter = TerminalPresenter::new(promotion);
    let sink = PgnFile::new(&config.pgn.path);
    let mut session = Session::new(settings, presenter, rx, sink);
    if let Some(book) = config.book_advisor() {
        session = session.with_book(book);
    }

    println!("{HELP}");
    session.run();
    Ok(())
}
