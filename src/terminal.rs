use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind};
use futures::StreamExt;
use ratatui::{backend::Backend, Terminal};

use crate::app::MountedApp;

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// How often the app is flushed and redrawn without input
    pub tick_rate: Duration,
    /// Key that ends the event loop
    pub exit_key: KeyCode,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tick_rate: Duration::from_millis(250),
            exit_key: KeyCode::Esc,
        }
    }
}

impl RunConfig {
    pub fn with_tick_rate(mut self, tick_rate: Duration) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    pub fn with_exit_key(mut self, exit_key: KeyCode) -> Self {
        self.exit_key = exit_key;
        self
    }
}

/// Draw `app` and feed it key presses until the exit key is pressed or the
/// terminal closes its event stream. Every pressed `KeyCode` is dispatched
/// to the app's `use_event` listeners.
pub async fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: MountedApp,
    config: RunConfig,
) -> Result<()> {
    let mut reader = EventStream::new();
    let mut tick = tokio::time::interval(config.tick_rate);

    loop {
        terminal.draw(|f| f.render_widget_ref(app, f.size()))?;

        tokio::select! {
            _ = tick.tick() => {
                app.flush();
            },
            ev = reader.next() => match ev {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if key.code == config.exit_key {
                        tracing::debug!("exit key pressed");
                        break;
                    }
                    app.dispatch(key.code);
                }
                Some(Ok(_)) => {}
                Some(Err(error)) => return Err(error.into()),
                None => break,
            }
        }
    }

    Ok(())
}

pub fn init_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_tui();
        original_hook(panic_info);
    }));
}

pub fn init_tui() -> std::io::Result<Terminal<impl Backend>> {
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(std::io::stderr(), crossterm::terminal::EnterAlternateScreen)?;
    Terminal::new(ratatui::backend::CrosstermBackend::new(std::io::stderr()))
}

pub fn restore_tui() -> Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(std::io::stderr(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}
