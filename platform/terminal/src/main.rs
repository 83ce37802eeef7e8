mod config;
mod console;
mod logging;
mod sink;

use std::{fs::File, io::BufWriter, path::PathBuf};

use anyhow::{Context, Result};
use display::{DEFAULT_WINDOW, Display, State};
use tracing::info;

use config::Config;
use sink::TerminalSink;

fn main() -> Result<()> {
    let _guard = logging::init_logging()?;
    let config = Config::load(std::env::args_os().nth(1).map(PathBuf::from))?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start the tokio runtime")?;
    let result = runtime.block_on(run(config));
    // A pending stdin read cannot be cancelled, so don't wait for it.
    runtime.shutdown_background();
    result
}

async fn run(config: Config) -> Result<()> {
    let sink = TerminalSink::new(config.size()).context("failed to prepare the terminal")?;
    let initial = config
        .build_window(&config.circles)
        .context("failed to build the default window")?;
    let display = Display::new(sink, initial, config.framerate())?;

    for (name, circles) in &config.windows {
        display.add_window(name.as_str());
        for circle in circles {
            let circle = circle
                .build(config.size())
                .with_context(|| format!("failed to build window {name:?}"))?;
            display.add_element(name, circle)?;
        }
    }

    if config.debug {
        let dir = logging::get_log_directory()?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let path = dir.join("debug.log");
        let file = File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        display.enable_debugging(BufWriter::new(file));
        info!(path = %path.display(), "display debugging enabled");
    }

    info!(
        size = ?config.size(),
        framerate = ?config.framerate(),
        foreground = DEFAULT_WINDOW,
        "matrix running, type stopped/running/killed, show <window>, windows or dump"
    );

    tokio::select! {
        result = console::run(&display) => result.context("failed to read console input")?,
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for ctrl-c")?;
            info!("interrupted");
        }
        _ = display.closed() => {}
    }

    display.set_state(State::Killed).await;
    display.join().await.context("display loop failed")?;
    Ok(())
}
