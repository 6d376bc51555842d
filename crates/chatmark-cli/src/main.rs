use anyhow::{Context, Result};
use chatmark_config::{Config, RevealConfig};
use chatmark_core::{ParserOptions, StreamingProcessor, Tokenizer, Tree};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::{
    env,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
    time::{Duration, Instant},
};

mod render;

const USAGE: &str = "Usage: chatmark-cli <file.md> [--dump | --tokens] [--config <path>]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Preview,
    Dump,
    Tokens,
}

struct Args {
    file: PathBuf,
    mode: Mode,
    config: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Option<Args> {
    let mut file = None;
    let mut mode = Mode::Preview;
    let mut config = None;
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--dump" => mode = Mode::Dump,
            "--tokens" => mode = Mode::Tokens,
            "--config" => config = Some(PathBuf::from(iter.next()?)),
            flag if flag.starts_with("--") => return None,
            path if file.is_none() => file = Some(PathBuf::from(path)),
            _ => return None,
        }
    }
    Some(Args {
        file: file?,
        mode,
        config,
    })
}

struct App {
    source: String,
    total: usize,
    visible: usize,
    processor: StreamingProcessor,
    tree: Tree,
    reveal: RevealConfig,
    paused: bool,
}

impl App {
    fn new(source: String, options: ParserOptions, reveal: RevealConfig) -> Self {
        let mut processor = StreamingProcessor::with_options(options);
        let tree = processor.append_text(&source, 0);
        Self {
            total: source.chars().count(),
            source,
            visible: 0,
            processor,
            tree,
            reveal,
            paused: false,
        }
    }

    fn done(&self) -> bool {
        self.visible >= self.total
    }

    fn tick(&mut self) {
        if self.paused || self.done() {
            return;
        }
        self.visible = (self.visible + self.reveal.chars_per_tick.max(1)).min(self.total);
        self.tree = if self.done() {
            self.processor.finalize(&self.source)
        } else {
            self.processor.append_text(&self.source, self.visible)
        };
    }

    fn restart(&mut self) {
        log::debug!("restarting reveal");
        self.processor.reset();
        self.visible = 0;
        self.tree = self.processor.append_text(&self.source, 0);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(args) = parse_args(&args) else {
        eprintln!("{USAGE}");
        process::exit(1);
    };

    let loaded = match &args.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };
    let config = match loaded {
        Ok(Some(config)) => {
            log::info!("Loaded config: {:?}", config);
            config
        }
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let options = config.parser_options();

    match args.mode {
        Mode::Dump => {
            let tree = StreamingProcessor::with_options(options).finalize(&source);
            print!("{tree}");
            Ok(())
        }
        Mode::Tokens => {
            let mut tokenizer = Tokenizer::with_options(options);
            for ch in source.chars() {
                for token in tokenizer.accept(ch) {
                    println!("{token:?}");
                }
            }
            for token in tokenizer.flush() {
                println!("{token:?}");
            }
            Ok(())
        }
        Mode::Preview => preview(App::new(source, options, config.reveal)),
    }
}

fn preview(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(app.reveal.tick_ms);
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char(' ') => app.paused = !app.paused,
                KeyCode::Char('r') => app.restart(),
                _ => {}
            }
        }
        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    let title = if app.done() {
        " Committed "
    } else {
        " Tentative "
    };
    let content = Paragraph::new(render::render(&app.tree))
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(content, chunks[0]);

    let state = if app.paused { "paused" } else { "running" };
    let status = Line::from(vec![
        Span::styled(
            format!(
                "{}/{} chars | {} nodes | {state} ",
                app.visible,
                app.total,
                app.tree.node_count()
            ),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("| q: Quit | Space: Pause | r: Restart"),
    ]);
    f.render_widget(Paragraph::new(status), chunks[1]);
}
