//! Stream a poem to stdout.
//!
//! Make sure the generation service is running (or set `QUILL_API_URL`) and run:
//!   cargo run --example compose -- "Shall I compare thee to a summer's day?"
//!
//! Press Ctrl-C to stop the stream early. Set `RUST_LOG=debug` for logs.

use std::io::Write;

use quill_http::HttpTransport;
use quill_session::{Outcome, Session};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let prompt = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let session = Session::new(HttpTransport::from_env());
    session.set_draft(prompt);
    if !session.can_submit() {
        eprintln!("usage: compose <prompt>");
        return Ok(());
    }

    let mut watcher = session.subscribe();
    let mut stdout = std::io::stdout();
    let mut printed = 0;

    let outcome = {
        let submit = session.submit();
        tokio::pin!(submit);
        loop {
            tokio::select! {
                outcome = &mut submit => break outcome,
                Some(snapshot) = watcher.changed() => {
                    if !snapshot.active {
                        continue;
                    }
                    if let Some(delta) = snapshot.output.get(printed..) {
                        write!(stdout, "{delta}")?;
                        stdout.flush()?;
                        printed = snapshot.output.len();
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    session.stop();
                }
            }
        }
    };

    match outcome {
        Outcome::Completed(_) => {
            if let Some(rest) = session.output().get(printed..) {
                write!(stdout, "{rest}")?;
            }
            writeln!(stdout)?;
        }
        Outcome::Cancelled => eprintln!("\n[stopped]"),
        Outcome::Failed(err) => eprintln!("\n{} ({err})", session.output()),
        Outcome::Ignored(rejection) => eprintln!("nothing submitted: {rejection:?}"),
    }
    Ok(())
}
