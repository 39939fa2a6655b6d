//! Terminal input for the ballot.

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

/// A command typed at the ballot prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallotCommand {
    /// Toggle the topic at this 1-based position
    Select(usize),
    Vote,
    Refresh,
    Help,
    Quit,
}

/// Parse one input line; `None` for anything unrecognised
pub fn parse_command(line: &str) -> Option<BallotCommand> {
    let line = line.trim();
    if let Ok(index) = line.parse::<usize>() {
        return (index > 0).then_some(BallotCommand::Select(index));
    }
    match line.to_ascii_lowercase().as_str() {
        "v" | "vote" => Some(BallotCommand::Vote),
        "r" | "refresh" => Some(BallotCommand::Refresh),
        "h" | "help" | "?" => Some(BallotCommand::Help),
        "q" | "quit" | "exit" => Some(BallotCommand::Quit),
        _ => None,
    }
}

/// Reads lines with rustyline on a dedicated thread
///
/// The thread only shows the prompt after `next_line` asks for a line, so
/// output printed while handling the previous line never lands on the prompt.
pub struct LineReader {
    ready_tx: std::sync::mpsc::Sender<()>,
    lines_rx: mpsc::UnboundedReceiver<String>,
}

impl LineReader {
    pub fn spawn(prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<()>();
        let (lines_tx, lines_rx) = mpsc::unbounded_channel::<String>();

        std::thread::spawn(move || {
            let mut rl = match DefaultEditor::new() {
                Ok(rl) => rl,
                Err(e) => {
                    eprintln!("Failed to initialize readline: {}", e);
                    return;
                }
            };

            while ready_rx.recv().is_ok() {
                match rl.readline(&prompt) {
                    Ok(line) => {
                        if !line.trim().is_empty() {
                            rl.add_history_entry(line.trim()).ok();
                        }
                        if lines_tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(ReadlineError::Interrupted) => {
                        // Ctrl+C
                        tracing::info!("Interrupted");
                        break;
                    }
                    Err(ReadlineError::Eof) => {
                        // Ctrl+D
                        tracing::info!("EOF");
                        break;
                    }
                    Err(err) => {
                        tracing::error!("Readline error: {}", err);
                        break;
                    }
                }
            }
        });

        Self { ready_tx, lines_rx }
    }

    /// Prompt for the next line; `None` once input has ended
    pub async fn next_line(&mut self) -> Option<String> {
        self.ready_tx.send(()).ok()?;
        self.lines_rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_topic_number() {
        // テスト項目: 数字はトピックの選択になり、0 は無効
        // given (前提条件):
        let inputs = ["2", " 10 ", "0"];

        // when (操作):
        let parsed: Vec<_> = inputs.iter().map(|line| parse_command(line)).collect();

        // then (期待する結果):
        assert_eq!(
            parsed,
            vec![
                Some(BallotCommand::Select(2)),
                Some(BallotCommand::Select(10)),
                None
            ]
        );
    }

    #[test]
    fn test_parse_keywords() {
        // テスト項目: 短縮形と大文字小文字の違いを受け付ける
        // given (前提条件):
        let inputs = ["v", "VOTE", "r", "?", "quit", "dance"];

        // when (操作):
        let parsed: Vec<_> = inputs.iter().map(|line| parse_command(line)).collect();

        // then (期待する結果):
        assert_eq!(
            parsed,
            vec![
                Some(BallotCommand::Vote),
                Some(BallotCommand::Vote),
                Some(BallotCommand::Refresh),
                Some(BallotCommand::Help),
                Some(BallotCommand::Quit),
                None
            ]
        );
    }
}
