//! Interactive read-print loop shared by the assistants.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Inputs that end a session (compared case-insensitively).
pub const EXIT_SENTINELS: [&str; 4] = ["sair", "exit", "quit", "q"];

/// Whether a trimmed input line ends the session.
pub fn is_exit_command(line: &str) -> bool {
    EXIT_SENTINELS
        .iter()
        .any(|sentinel| line.eq_ignore_ascii_case(sentinel))
}

/// Turns one user line into the text printed back.
#[async_trait]
pub trait TurnHandler: Send {
    async fn handle(&mut self, line: &str) -> anyhow::Result<String>;
}

/// Run the loop until a sentinel or end of input.
///
/// Empty lines are skipped. Each turn is finished and printed before the
/// next line is read. A handler error ends the loop and is returned.
/// Returns the number of turns handled.
pub async fn run_loop<R, W, H>(
    input: R,
    output: &mut W,
    prompt: &str,
    handler: &mut H,
) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    H: TurnHandler + ?Sized,
{
    let mut lines = input.lines();
    let mut turns = 0;

    loop {
        output.write_all(prompt.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            debug!("End of input");
            output.write_all(b"\n").await?;
            break;
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_exit_command(line) {
            debug!("Session ended by '{}'", line);
            break;
        }

        let reply = handler.handle(line).await?;
        output.write_all(reply.as_bytes()).await?;
        if !reply.ends_with('\n') {
            output.write_all(b"\n").await?;
        }
        output.write_all(b"\n").await?;
        turns += 1;
    }

    output.flush().await?;
    Ok(turns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Echo {
        seen: Vec<String>,
    }

    #[async_trait]
    impl TurnHandler for Echo {
        async fn handle(&mut self, line: &str) -> anyhow::Result<String> {
            self.seen.push(line.to_string());
            Ok(format!("echo: {}", line))
        }
    }

    struct Failing;

    #[async_trait]
    impl TurnHandler for Failing {
        async fn handle(&mut self, _line: &str) -> anyhow::Result<String> {
            anyhow::bail!("upstream unavailable")
        }
    }

    #[test]
    fn test_is_exit_command() {
        for line in ["sair", "SAIR", "Exit", "quit", "q", "Q"] {
            assert!(is_exit_command(line), "{}", line);
        }
        for line in ["", "sair agora", "quitter", "exit()"] {
            assert!(!is_exit_command(line), "{}", line);
        }
    }

    #[tokio::test]
    async fn test_sentinel_stops_before_remaining_lines() {
        let input: &[u8] = b"first\n\n   \nsecond\nSair\nthird\n";
        let mut output = Vec::new();
        let mut handler = Echo::default();

        let turns = run_loop(input, &mut output, "> ", &mut handler)
            .await
            .unwrap();

        assert_eq!(turns, 2);
        assert_eq!(handler.seen, vec!["first", "second"]);
        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("echo: first\n"));
        assert!(!printed.contains("third"));
    }

    #[tokio::test]
    async fn test_end_of_input_ends_session() {
        let input: &[u8] = b"  padded question  ";
        let mut output = Vec::new();
        let mut handler = Echo::default();

        let turns = run_loop(input, &mut output, "> ", &mut handler)
            .await
            .unwrap();

        assert_eq!(turns, 1);
        assert_eq!(handler.seen, vec!["padded question"]);
    }

    #[tokio::test]
    async fn test_handler_error_ends_session() {
        let input: &[u8] = b"hello\nagain\n";
        let mut output = Vec::new();

        let err = run_loop(input, &mut output, "> ", &mut Failing)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("upstream unavailable"));
    }
}
