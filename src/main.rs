mod app;
mod model;
mod msg;
mod plugin;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use model::config::AppConfig;
use msg::Msg;
use plugin::PluginManager;

fn main() -> Result<()> {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("aether-plugins: failed to load configuration: {e:?}");
            return Ok(());
        }
    };

    // Initialize logging to file (never stdout)
    let _guard = match init_logging(&config.log_dir()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!(
                "aether-plugins: cannot create log directory {}: {e}",
                config.log_dir().display()
            );
            return Ok(());
        }
    };

    tracing::info!("aether-plugins starting");

    let manager = match PluginManager::new(&config) {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!("failed to initialize plugin manager: {e}");
            eprintln!("aether-plugins: {e}");
            return Ok(());
        }
    };

    let mut terminal = match setup_terminal() {
        Ok(terminal) => terminal,
        Err(e) => {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            tracing::error!("failed to set up terminal: {e}");
            eprintln!("aether-plugins: cannot set up terminal: {e}");
            return Ok(());
        }
    };

    let result = run(&mut terminal, App::new(manager));

    if let Err(e) = restore_terminal(&mut terminal) {
        tracing::warn!("failed to restore terminal: {e}");
    }

    if let Err(e) = result {
        tracing::error!("unexpected error: {e:?}");
        eprintln!("aether-plugins error: {e:?}");
    }

    tracing::info!("aether-plugins exiting");
    Ok(())
}

fn init_logging(log_dir: &Path) -> io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "aether-plugins.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("aether_plugins=info")),
        )
        .init();
    Ok(guard)
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Msg>();

    // Input thread: reads terminal events and forwards as Msg
    let tx_input = tx.clone();
    thread::spawn(move || {
        loop {
            if let Ok(event) = event::read() {
                let msg = match event {
                    Event::Key(k) => Msg::Key(k),
                    Event::Resize(..) => Msg::Resize,
                    _ => continue,
                };
                if tx_input.send(msg).is_err() {
                    break;
                }
            }
        }
    });

    // Tick thread: drives redraws and deferred work such as a queued download
    let tx_tick = tx.clone();
    thread::spawn(move || {
        loop {
            thread::sleep(Duration::from_millis(50));
            if tx_tick.send(Msg::Tick).is_err() {
                break;
            }
        }
    });

    // File watcher thread: emits FileChanged for create/modify/remove events.
    spawn_file_watcher(app.watch_root(), tx);

    terminal.draw(|f| app.view(f))?;

    // ── Main event loop ──
    loop {
        // Batch-drain all pending messages
        let first = rx.recv()?;
        app.update(first);

        while let Ok(msg) = rx.try_recv() {
            app.update(msg);
        }

        if app.should_quit {
            break;
        }

        terminal.draw(|f| app.view(f))?;
    }

    Ok(())
}

fn spawn_file_watcher(versions_dir: PathBuf, tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        let tx_watch = tx.clone();
        let mut watcher: RecommendedWatcher =
            match notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    if matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    ) {
                        for path in event.paths {
                            if tx_watch.send(Msg::FileChanged(path)).is_err() {
                                return;
                            }
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!("file watcher error: {err}");
                }
            }) {
                Ok(w) => w,
                Err(err) => {
                    tracing::warn!("failed to initialize file watcher: {err}");
                    return;
                }
            };

        if let Err(err) = watcher.watch(&versions_dir, RecursiveMode::Recursive) {
            tracing::warn!(
                "failed to watch versions dir {}: {err}",
                versions_dir.display()
            );
            return;
        }

        loop {
            thread::park();
        }
    });
}
