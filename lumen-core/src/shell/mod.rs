//! Serial command shell
//!
//! Bytes from the serial port are fed one at a time into [`Shell::feed`].
//! Completed lines are tokenized on whitespace, resolved against the static
//! command tree and executed before the next byte is accepted. Two commands
//! never return to the prompt; they come back as a [`Terminal`] state for
//! the board to act on.

pub mod commands;
pub mod line;
pub mod ping;
pub mod tree;

use core::fmt::{self, Write};
use core::net::Ipv4Addr;

use embedded_hal_async::delay::DelayNs;
use heapless::Vec;

use crate::config::PingConfig;
use crate::console::SharedConsole;
use crate::log::{LogBook, LogCategory};
use crate::tasks::TaskRegistry;
use crate::traits::{Console, Diagnostics, EchoProbe, PacketEngine};

use commands::InvalidArgument;
pub use line::{Edit, LineEditor, LINE_CAPACITY};
pub use ping::{PingOutcome, PingSummary};
pub use tree::{resolve, Action, DispatchError, Resolved, TraceTarget, COMMANDS, MAX_TOKENS};

pub const PROMPT: &str = "lumen> ";

/// States the shell hands back instead of a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Terminal {
    /// Disable interrupts and spin forever
    Hang,
    /// Reset the chip through the watchdog
    Reset,
}

/// Shared services the shell reads and changes
pub struct ShellContext<'a, E, C, G> {
    pub engine: &'a E,
    pub console: &'a SharedConsole<C>,
    pub diagnostics: &'a G,
    pub tasks: &'a TaskRegistry,
    pub log: &'a LogBook,
    pub ping: PingConfig,
}

pub struct Shell<'a, E, C, G, P, D> {
    ctx: ShellContext<'a, E, C, G>,
    probe: P,
    delay: D,
    editor: LineEditor,
    ping_ident: u16,
}

impl<'a, E, C, G, P, D> Shell<'a, E, C, G, P, D>
where
    E: PacketEngine,
    C: Console,
    G: Diagnostics,
    P: EchoProbe,
    D: DelayNs,
{
    pub fn new(ctx: ShellContext<'a, E, C, G>, probe: P, delay: D) -> Self {
        Self {
            ctx,
            probe,
            delay,
            editor: LineEditor::new(),
            ping_ident: 0,
        }
    }

    pub async fn prompt(&self) {
        let mut con = self.ctx.console.lock().await;
        let _ = con.write_str(PROMPT);
    }

    /// Process one input byte
    pub async fn feed(&mut self, byte: u8) -> Option<Terminal> {
        match self.editor.feed(byte) {
            Edit::Ignored => None,
            Edit::Echo(ch) => {
                let mut con = self.ctx.console.lock().await;
                let _ = con.write_char(ch);
                None
            }
            Edit::Erase => {
                let mut con = self.ctx.console.lock().await;
                let _ = con.write_str("\x08 \x08");
                None
            }
            Edit::Overflow => {
                self.print(format_args!(
                    "\nline too long (max {} characters)\n",
                    LINE_CAPACITY
                ))
                .await;
                self.prompt().await;
                None
            }
            Edit::Submit => {
                let line = self.editor.take();
                self.print(format_args!("\n")).await;
                let terminal = self.execute(&line).await;
                if terminal.is_none() {
                    self.prompt().await;
                }
                terminal
            }
        }
    }

    /// Run one command line
    pub async fn execute(&mut self, line: &str) -> Option<Terminal> {
        let mut tokens: Vec<&str, MAX_TOKENS> = Vec::new();
        let mut overflowed = false;
        for token in line.split_ascii_whitespace() {
            if tokens.push(token).is_err() {
                overflowed = true;
                break;
            }
        }

        let resolved = resolve(&tokens);
        if overflowed && !matches!(resolved, Err(DispatchError::NotRecognized(_))) {
            self.print(format_args!("too many tokens (max {})\n", MAX_TOKENS))
                .await;
            return None;
        }

        match resolved {
            Ok(resolved) => self.run(resolved).await,
            Err(DispatchError::Empty) => None,
            Err(DispatchError::NotRecognized(token)) => {
                self.print(format_args!("not recognized: {}\n", token)).await;
                None
            }
            Err(DispatchError::Syntax { usage }) => {
                self.syntax_error(usage).await;
                None
            }
        }
    }

    async fn run(&mut self, cmd: Resolved<'_, '_>) -> Option<Terminal> {
        let ctx = &self.ctx;
        let arg = cmd.args.first().copied().unwrap_or_default();

        let result = match cmd.action {
            Action::Hang => {
                ctx.log
                    .record(LogCategory::Info, format_args!("hang requested"));
                self.print(format_args!("hanging with interrupts disabled\n"))
                    .await;
                return Some(Terminal::Hang);
            }
            Action::Reset => {
                ctx.log
                    .record(LogCategory::Info, format_args!("reset requested"));
                self.print(format_args!("resetting\n")).await;
                return Some(Terminal::Reset);
            }
            Action::Ping => {
                let Ok(target) = arg.parse::<Ipv4Addr>() else {
                    self.syntax_error(cmd.usage).await;
                    return None;
                };
                self.ping_ident = self.ping_ident.wrapping_add(1);
                ping::ping(
                    &mut self.probe,
                    &mut self.delay,
                    self.ctx.console,
                    target,
                    self.ping_ident,
                    &self.ctx.ping,
                )
                .await;
                return None;
            }
            Action::Log(category) => {
                let entries = ctx.log.entries(category);
                let mut con = ctx.console.lock().await;
                commands::print_log(&mut *con, category, &entries);
                Ok(())
            }
            Action::Help => {
                let mut con = ctx.console.lock().await;
                commands::help(&mut *con);
                Ok(())
            }
            Action::Stats => {
                let mut con = ctx.console.lock().await;
                commands::stats(&mut *con, ctx.diagnostics, ctx.tasks, ctx.engine, ctx.log);
                Ok(())
            }
            Action::SetIp4Addr => {
                let mut con = ctx.console.lock().await;
                commands::set_ip4(ctx.engine, ctx.log, &mut *con, arg)
            }
            Action::GetIp4Addr => {
                let mut con = ctx.console.lock().await;
                commands::get_ip4(ctx.engine, &mut *con);
                Ok(())
            }
            Action::SetTrace(target) => {
                let mut con = ctx.console.lock().await;
                commands::set_trace(ctx.engine, &mut *con, target, arg)
            }
            Action::SetLoopback => {
                let mut con = ctx.console.lock().await;
                commands::set_loopback(ctx.engine, &mut *con, arg)
            }
        };

        if let Err(InvalidArgument) = result {
            self.syntax_error(cmd.usage).await;
        }
        None
    }

    async fn syntax_error(&self, usage: &str) {
        self.print(format_args!("syntax error, usage: {}\n", usage))
            .await;
    }

    async fn print(&self, args: fmt::Arguments<'_>) {
        let mut con = self.ctx.console.lock().await;
        let _ = con.write_fmt(args);
    }
}
