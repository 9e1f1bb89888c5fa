//! IDE-facing I/O: a reader task feeding a single dispatch loop.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::dispatch::{Dispatched, Dispatcher};
use crate::request::Request;
use crate::session::Session;

pub const PROMPT: &str = "(gdb)\n";

/// Capacity 1: the reader waits while a command is being handled.
const INPUT_CHANNEL_CAPACITY: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// The IDE sent `gdb-exit`.
    Exit,
    EndOfInput,
}

/// Forwards IDE lines until end of input or until the loop goes away.
pub async fn read_frontend<R>(input: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(input).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                tracing::info!("IDE closed its input");
                break;
            }
            Err(e) => {
                tracing::warn!("Error reading from IDE: {}", e);
                break;
            }
        }
    }
}

/// Handles one line at a time, writing each response followed by the prompt.
pub async fn serve<W>(
    mut rx: mpsc::Receiver<String>,
    writer: &mut W,
    session: &mut Session,
    dispatcher: &Dispatcher,
) -> Result<Shutdown>
where
    W: AsyncWrite + Unpin,
{
    write_out(writer, PROMPT).await?;

    while let Some(line) = rx.recv().await {
        tracing::info!("Received from IDE: {}", line);
        if line.trim().is_empty() {
            continue;
        }

        let request = Request::new(&line);
        match dispatcher.dispatch(session, &request).await {
            Dispatched::Output(out) => {
                write_out(writer, &out).await?;
                write_out(writer, PROMPT).await?;
            }
            Dispatched::Ignored => {
                tracing::warn!("Unrecognized line, ignoring: {}", request.raw);
                write_out(writer, PROMPT).await?;
            }
            Dispatched::Exit => return Ok(Shutdown::Exit),
        }
    }

    Ok(Shutdown::EndOfInput)
}

async fn write_out<W>(writer: &mut W, text: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    tracing::debug!("Sending to IDE: {}", text.trim_end());
    writer.write_all(text.as_bytes()).await?;
    writer.flush().await
}

/// Serves stdin/stdout until `gdb-exit` or end of input, then stops the backend.
pub async fn run(mut session: Session, dispatcher: Dispatcher) -> Result<Shutdown> {
    let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
    let reader = tokio::spawn(read_frontend(tokio::io::stdin(), tx));

    let mut stdout = tokio::io::stdout();
    let result = serve(rx, &mut stdout, &mut session, &dispatcher).await;

    session.shutdown().await;
    reader.abort();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::GoMainScanner;
    use crate::test_support::TempDir;
    use kabuta_core::Config;

    async fn run_lines(session: &mut Session, input: &str) -> (String, Shutdown) {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let input = input.as_bytes().to_vec();
        let reader = tokio::spawn(async move { read_frontend(input.as_slice(), tx).await });

        let dispatcher = Dispatcher::new(Box::new(GoMainScanner));
        let mut out = Vec::new();
        let shutdown = serve(rx, &mut out, session, &dispatcher).await.unwrap();
        reader.abort();
        (String::from_utf8(out).unwrap(), shutdown)
    }

    /// Drops the `time={...}` block so responses compare exactly.
    fn without_timing(output: &str) -> String {
        output
            .lines()
            .map(|line| match line.find(",time={") {
                Some(at) => &line[..at],
                None => line,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_prompt_is_written_at_startup() {
        let mut session = Session::new(&Config::default());
        let (out, shutdown) = run_lines(&mut session, "").await;
        assert_eq!(out, PROMPT);
        assert_eq!(shutdown, Shutdown::EndOfInput);
    }

    #[tokio::test]
    async fn test_pending_breakpoint_insert() {
        let dir = TempDir::new("frontend-a");
        let file = dir.write("main.go", "package main\n");
        let mut session = Session::new(&Config::default());
        session.cwd = Some(dir.path().to_path_buf());

        let (out, _) = run_lines(&mut session, "2-break-insert main.go:10\n").await;

        assert_eq!(
            without_timing(&out),
            format!(
                "(gdb)\n2^done,bkpt={{number=\"1\",type=\"breakpoint\",disp=\"keep\",enabled=\"y\",addr=\"<PENDING>\",func=\"??\",file=\"{}\",line=\"10\",shlib=\"\",times=\"0\"}}\n(gdb)",
                file.display()
            )
        );
        assert_eq!(session.breakpoints.iter().last().map(|bp| bp.number), Some(1));
    }

    #[tokio::test]
    async fn test_exec_and_symbols_before_cd() {
        let mut session = Session::new(&Config::default());
        let (out, _) = run_lines(&mut session, "3-file-exec-and-symbols /bin/foo\n").await;
        assert_eq!(
            out,
            "(gdb)\n3^error,msg=\"cannot determine package directory for /bin/foo\"\n(gdb)\n"
        );
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let mut session = Session::new(&Config::default());
        let (out, _) = run_lines(&mut session, "9-unknown-thing x y\n").await;
        assert_eq!(
            out,
            "(gdb)\n9^error,msg=\"Unknown command 9-unknown-thing x y: no method to process it \\\"UnknownThing\\\" found.\"\n(gdb)\n"
        );
    }

    #[tokio::test]
    async fn test_breakpoint_numbers_increase_in_call_order() {
        let dir = TempDir::new("frontend-d");
        dir.write("main.go", "package main\n");
        let mut session = Session::new(&Config::default());
        session.cwd = Some(dir.path().to_path_buf());

        let (out, _) = run_lines(&mut session, "4-break-insert main.go:3\n5-break-insert main.main\n").await;

        let responses: Vec<&str> = out.lines().filter(|line| !line.starts_with("(gdb)")).collect();
        assert_eq!(responses.len(), 2);
        assert!(responses[0].starts_with("4^done,bkpt={number=\"1\","), "{}", responses[0]);
        assert!(responses[1].starts_with("5^done,bkpt={number=\"2\","), "{}", responses[1]);
    }

    #[tokio::test]
    async fn test_responses_keep_request_order_and_tokens() {
        let mut session = Session::new(&Config::default());
        let input = "7-gdb-show language\n^junk\n8-inferior-tty-set /dev/ttys001\n\n9info threads\n";
        let (out, _) = run_lines(&mut session, input).await;

        let responses: Vec<&str> = out.lines().filter(|line| !line.starts_with("(gdb)")).collect();
        assert_eq!(responses.len(), 3);
        assert!(responses[0].starts_with("7^done,value=\"auto; currently c\",time={"));
        assert!(responses[1].starts_with("8^done,time={"));
        assert!(responses[2].starts_with("9^error,msg=\"not connected"));
    }

    #[tokio::test]
    async fn test_unrecognized_line_still_gets_a_prompt() {
        let mut session = Session::new(&Config::default());
        let (out, shutdown) = run_lines(&mut session, "(gdb)\nhello?\n").await;
        assert_eq!(out, format!("{PROMPT}{PROMPT}{PROMPT}"));
        assert_eq!(shutdown, Shutdown::EndOfInput);
    }

    #[tokio::test]
    async fn test_gdb_exit_stops_without_response() {
        let mut session = Session::new(&Config::default());
        let (out, shutdown) = run_lines(&mut session, "1-gdb-exit\n2-gdb-version\n").await;
        assert_eq!(out, PROMPT);
        assert_eq!(shutdown, Shutdown::Exit);
    }
}
