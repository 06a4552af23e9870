//! dashgraph binary: parse flags, run one turn on a thread, print the new messages.

use std::path::PathBuf;

use clap::Parser;
use dashgraph_cli::{init_tracing, render_output, run_with_options, Language, RunOptions, TurnArgs};

#[derive(Parser, Debug)]
#[command(name = "dashgraph")]
#[command(about = "Dashboard agent: send a message (or tool results) and run one turn")]
struct Args {
    /// User message (also accepted as trailing positional words)
    #[arg(short, long, value_name = "TEXT")]
    message: Option<String>,

    /// Conversation thread to continue (default: THREAD_ID or "default")
    #[arg(long, value_name = "ID")]
    thread_id: Option<String>,

    /// Response language
    #[arg(long, value_name = "LANG", value_parser = parse_language)]
    language: Option<Language>,

    /// JSON file with the external actions available this turn
    #[arg(long, value_name = "FILE")]
    actions_file: Option<PathBuf>,

    /// Result for a pending external call; repeatable
    #[arg(long = "tool-result", value_name = "CALL_ID=JSON")]
    tool_results: Vec<String>,

    /// SQLite database path (default: DB_PATH or dashgraph.db)
    #[arg(long, value_name = "PATH")]
    db_path: Option<String>,

    /// Sampling temperature (0-2)
    #[arg(long)]
    temperature: Option<f32>,

    /// Print node progress while the turn runs
    #[arg(long)]
    stream: bool,

    /// Debug logs and node enter/exit logging
    #[arg(short, long)]
    verbose: bool,

    /// User message words when -m/--message is not used
    #[arg(trailing_var_arg = true)]
    rest: Vec<String>,
}

fn parse_language(s: &str) -> Result<Language, String> {
    s.parse()
}

fn get_message(args: &Args) -> Option<String> {
    if let Some(ref m) = args.message {
        return Some(m.clone());
    }
    let joined = args.rest.join(" ").trim().to_string();
    (!joined.is_empty()).then_some(joined)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let turn = TurnArgs {
        message: get_message(&args),
        actions_file: args.actions_file.clone(),
        tool_results: args.tool_results.clone(),
    };
    let options = RunOptions {
        temperature: args.temperature,
        thread_id: args.thread_id.clone(),
        db_path: args.db_path.clone(),
        language: args.language,
        stream: args.stream,
        verbose: args.verbose,
    };

    let out = match run_with_options(&turn, &options).await {
        Ok(out) => out,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    print!("{}", render_output(&out));
    Ok(())
}
