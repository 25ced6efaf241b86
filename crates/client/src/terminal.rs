//! Line-oriented terminal frontend.
//!
//! A renderer task draws [`OutputEvent`]s as they arrive (revealing narrated
//! lines character by character) while the input loop forwards each line
//! typed by the player to the runtime.
use std::io;

use anyhow::{Context, Result};
use async_trait::async_trait;
use console::{Term, style};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tokio::sync::oneshot;

use runtime::{Event, OutputEvent, RuntimeHandle, Topic};

use crate::frontend::Frontend;

/// Where rendered output goes.
pub trait Screen: Clone + Send + 'static {
    fn write_line(&mut self, line: &str) -> io::Result<()>;
    fn write_str(&mut self, text: &str) -> io::Result<()>;
    fn clear_screen(&mut self) -> io::Result<()>;
    /// Removes the line the player just typed.
    fn clear_last_line(&mut self) -> io::Result<()>;
}

impl Screen for Term {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        Term::write_line(self, line)
    }

    fn write_str(&mut self, text: &str) -> io::Result<()> {
        Term::write_str(self, text)
    }

    fn clear_screen(&mut self) -> io::Result<()> {
        Term::clear_screen(self)
    }

    fn clear_last_line(&mut self) -> io::Result<()> {
        self.clear_last_lines(1)
    }
}

/// Draws output events onto a [`Screen`].
pub struct Renderer<S> {
    screen: S,
    styled: bool,
    /// The session echoes input as `> line`; on a live terminal that echo
    /// replaces what the player typed.
    replace_typed_input: bool,
    last_status: Option<String>,
}

impl<S: Screen> Renderer<S> {
    pub fn new(screen: S, styled: bool, replace_typed_input: bool) -> Self {
        Self {
            screen,
            styled,
            replace_typed_input,
            last_status: None,
        }
    }

    pub async fn render(&mut self, event: &OutputEvent) -> io::Result<()> {
        match event {
            OutputEvent::Line(line) => {
                if self.replace_typed_input && line.starts_with("> ") {
                    self.screen.clear_last_line()?;
                }
                let line = self.style_line(line);
                self.screen.write_line(&line)
            }
            OutputEvent::Reveal { text, char_delay } => {
                let mut buf = [0u8; 4];
                for ch in text.chars() {
                    self.screen.write_str(ch.encode_utf8(&mut buf))?;
                    if !char_delay.is_zero() {
                        tokio::time::sleep(*char_delay).await;
                    }
                }
                self.screen.write_line("")
            }
            OutputEvent::Clear => {
                self.last_status = None;
                self.screen.clear_screen()
            }
            OutputEvent::Status(status) => {
                if self.last_status.as_deref() == Some(status.as_str()) {
                    return Ok(());
                }
                self.last_status = Some(status.clone());
                let line = if self.styled {
                    style(format!("[{status}]")).dim().to_string()
                } else {
                    format!("[{status}]")
                };
                self.screen.write_line(&line)
            }
        }
    }

    fn style_line(&self, line: &str) -> String {
        if !self.styled {
            return line.to_owned();
        }
        let styled = style(line);
        let styled = if line.starts_with("[ERR]") || line.starts_with("[NO]") {
            styled.red()
        } else if line.starts_with("[LOCKED]") || line.starts_with("[COOLDOWN]") {
            styled.yellow()
        } else if line.starts_with("[OK]") || line.starts_with("[UNLOCK]") || line.starts_with("[FRAGMENT]") {
            styled.green()
        } else if line.starts_with("===") {
            styled.cyan().bold()
        } else if line.starts_with("> ") {
            styled.dim()
        } else {
            styled
        };
        styled.to_string()
    }
}

/// Draws events until `stop` fires, then flushes whatever is still queued.
async fn render_loop<S: Screen>(
    mut renderer: Renderer<S>,
    mut output: Receiver<Event>,
    mut stop: oneshot::Receiver<()>,
) -> io::Result<()> {
    loop {
        tokio::select! {
            biased;
            event = output.recv() => match event {
                Ok(Event::Output(event)) => renderer.render(&event).await?,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "renderer fell behind; output dropped");
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut stop => {
                while let Ok(event) = output.try_recv() {
                    if let Event::Output(event) = event {
                        renderer.render(&event).await?;
                    }
                }
                break;
            }
        }
    }
    Ok(())
}

/// Terminal frontend reading lines from `input`.
pub struct TerminalFrontend<R, S> {
    input: R,
    screen: S,
    interactive: bool,
}

impl TerminalFrontend<BufReader<Stdin>, Term> {
    /// Reads stdin and draws on stdout.
    pub fn stdio() -> Self {
        let term = Term::stdout();
        let interactive = term.is_term() && console::user_attended();
        Self {
            input: BufReader::new(tokio::io::stdin()),
            screen: term,
            interactive,
        }
    }
}

impl<R, S> TerminalFrontend<R, S>
where
    R: AsyncBufRead + Unpin + Send,
    S: Screen,
{
    pub fn new(input: R, screen: S) -> Self {
        Self {
            input,
            screen,
            interactive: false,
        }
    }

    /// Forwards input lines until `quit` is accepted (`true`) or input ends.
    async fn read_input(&mut self, handle: &RuntimeHandle) -> Result<bool> {
        let mut lines = (&mut self.input).lines();
        while let Some(line) = lines.next_line().await.context("Failed to read input")? {
            if handle.submit(line).await?.quit {
                return Ok(true);
            }
        }
        tracing::info!("input closed");
        Ok(false)
    }
}

#[async_trait]
impl<R, S> Frontend for TerminalFrontend<R, S>
where
    R: AsyncBufRead + Unpin + Send,
    S: Screen,
{
    async fn run(&mut self, handle: RuntimeHandle) -> Result<()> {
        let output = handle.subscribe(Topic::Output);
        let renderer = Renderer::new(self.screen.clone(), self.interactive, self.interactive);
        let (stop_tx, stop_rx) = oneshot::channel();
        let render_task = tokio::spawn(render_loop(renderer, output, stop_rx));

        handle.boot().await?;
        let result = self.read_input(&handle).await;
        let shutdown = match result {
            Ok(true) => Ok(()),
            _ => handle.shutdown().await,
        };

        let _ = stop_tx.send(());
        render_task
            .await
            .context("Renderer task panicked")?
            .context("Failed to write to the terminal")?;

        let quit = result?;
        shutdown?;
        tracing::debug!(quit, "terminal frontend finished");
        Ok(())
    }
}
