//! Runs the hidden conversion process and relays its prompts.
//!
//! The child writes plain lines to stdout. A line ending in `?` asks the user
//! something; everything printed since the previous question is shown with it
//! and the answer goes back on the child's stdin. A failing child gets its
//! stderr shown as an error; stderr is collected on a helper thread while
//! stdout is relayed.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use tracing::{debug, info, warn};

use crate::error::{LauncherError, Result};
use crate::popup::{Buttons, PopupKind, Prompter};

const ANSI_RED_BOLD: &str = "\x1b[31;1m";
const ANSI_RESET: &str = "\x1b[0m";

/// Accumulates output lines until a question completes a prompt.
#[derive(Debug, Default)]
pub struct PromptBuffer {
    text: String,
}

impl PromptBuffer {
    /// Feed one line without its terminator. Returns the full prompt when
    /// the line is a question, leaving the buffer empty.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return None;
        }
        if line.trim_end().ends_with('?') {
            let mut prompt = std::mem::take(&mut self.text);
            prompt.push('\n');
            prompt.push_str(line);
            Some(prompt)
        } else {
            self.text.push_str(line);
            self.text.push('\n');
            None
        }
    }

    pub fn pending(&self) -> &str {
        &self.text
    }
}

/// Pump `stdout` until end of file, answering each prompt on `stdin`.
pub fn relay_output<R, W>(mut stdout: R, stdin: &mut W, prompter: &dyn Prompter) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    let mut buffer = PromptBuffer::default();
    let mut raw = Vec::new();
    loop {
        raw.clear();
        if stdout.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&raw);
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(prompt) = buffer.push_line(line) else {
            continue;
        };
        debug!(prompt = %prompt, "child asked a question");
        let answer = prompter
            .popup(&prompt, PopupKind::Warning, Buttons::YesNo)?
            .unwrap_or_default();
        info!(answer = %answer, "forwarding answer");
        match writeln!(stdin, "{answer}").and_then(|_| stdin.flush()) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                warn!("child closed its input before the answer was sent");
            }
            Err(e) => return Err(e.into()),
        }
    }
    if !buffer.pending().is_empty() {
        debug!(output = %buffer.pending(), "trailing output without a question");
    }
    Ok(())
}

/// Text to show for the child's error stream, without color codes or the
/// leading `<source> : ` label.
pub fn error_message(stderr: &str) -> Option<String> {
    let cleaned = stderr.replace(ANSI_RED_BOLD, "").replace(ANSI_RESET, "");
    let message = match cleaned.find(':') {
        Some(colon) => {
            let mut rest = cleaned[colon + 1..].chars();
            rest.next();
            rest.as_str()
        }
        None => cleaned.as_str(),
    };
    let message = message.trim_end();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}

/// Start `command`, relay its prompts and block until it exits.
pub fn run(mut command: Command, prompter: &dyn Prompter) -> Result<ExitStatus> {
    let program = command.get_program().to_string_lossy().into_owned();
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| LauncherError::Spawn {
            program: program.clone(),
            source,
        })?;
    info!(pid = child.id(), program = %program, "conversion started");

    let stderr = child
        .stderr
        .take()
        .ok_or(LauncherError::StreamUnavailable("stderr"))?;
    let (relayed, status, captured) = thread::scope(|scope| {
        // stderr must be read while stdout is relayed; a full stderr pipe
        // stalls the child before it closes stdout.
        let drain = scope.spawn(move || {
            let mut stderr = stderr;
            let mut raw = Vec::new();
            stderr.read_to_end(&mut raw).map(|_| raw)
        });
        let mut stdin = child.stdin.take();
        let relayed = match (child.stdout.take(), stdin.as_mut()) {
            (Some(stdout), Some(stdin)) => relay_output(BufReader::new(stdout), stdin, prompter),
            (None, _) => Err(LauncherError::StreamUnavailable("stdout")),
            (_, None) => Err(LauncherError::StreamUnavailable("stdin")),
        };
        // Kill before closing stdin so an unanswered child never reads EOF
        // as its answer.
        if relayed.is_err() {
            if let Err(e) = child.kill() {
                warn!("failed to stop the conversion: {}", e);
            }
        }
        drop(stdin);
        let status = child.wait();
        let captured = drain
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stderr reader panicked")));
        (relayed, status, captured)
    });
    relayed?;

    let status = status?;
    info!(?status, "conversion finished");
    if !status.success() {
        let raw = captured.unwrap_or_else(|e| {
            warn!("failed to read the error stream: {}", e);
            Vec::new()
        });
        let stderr = String::from_utf8_lossy(&raw);
        warn!(stderr = %stderr, "conversion failed");
        if let Some(message) = error_message(&stderr) {
            prompter.popup(&message, PopupKind::Error, Buttons::OkOnly)?;
        }
    }
    Ok(status)
}
