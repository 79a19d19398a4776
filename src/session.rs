// Session layer: the interactive command loop. Reads one line at a time
// from the input source, dispatches on an exact command match, drives
// the logging state machine to a terminal state and reports workflow
// errors on the output stream without leaving the loop.

use crate::api::{ApiClient, FoodItem, ServingEntry};
use crate::workflow::{filter_by_tag, LogWorkflow, PersistRequest};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};

/// Prompt printed before every command read.
pub const COMMAND_PROMPT: &str = "enter command > ";

/// The record all servings are logged against.
const USER_ID: &str = "1";

/// Main interactive loop. Receives an `ApiClient` and the input/output
/// streams and runs until the input source reaches end-of-file.
///
/// Recognized commands are matched against the whitespace-trimmed line:
/// `list vegan foods` and `log`. Anything else silently re-prompts.
/// A failed command prints one `error:` line and the loop continues;
/// nothing here is fatal to the process.
pub fn run_session<R: BufRead, W: Write>(
    api: &ApiClient,
    mut input: R,
    mut output: W,
) -> Result<()> {
    loop {
        write!(output, "{}", COMMAND_PROMPT)?;
        output.flush()?;
        let Some(line) = read_line(&mut input)? else {
            break;
        };
        match line.trim() {
            "list vegan foods" => {
                if let Err(err) = list_foods(api, &mut output, "vegan") {
                    writeln!(output, "error: {:#}", err)?;
                }
            }
            "log" => {
                if let Err(err) = run_log_command(api, &mut input, &mut output) {
                    writeln!(output, "error: {:#}", err)?;
                }
            }
            // unrecognized input re-prompts without comment
            _ => {}
        }
    }
    Ok(())
}

/// Fetch the catalog and print the name of every item carrying `tag`,
/// in catalog order. No matches means no output.
fn list_foods<W: Write>(api: &ApiClient, output: &mut W, tag: &str) -> Result<()> {
    let catalog = fetch_catalog(api)?;
    for item in filter_by_tag(&catalog, tag) {
        writeln!(output, "{}", item.name)?;
    }
    Ok(())
}

/// Run one logging workflow: fetch the catalog, ask the machine's
/// questions one line at a time, and persist the entry if the machine
/// requests it. End-of-input mid-question abandons the flow.
fn run_log_command<R: BufRead, W: Write>(
    api: &ApiClient,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    let catalog = fetch_catalog(api)?;
    let mut flow = LogWorkflow::new(catalog);
    while let Some(question) = flow.question() {
        write!(output, "{}", question)?;
        output.flush()?;
        let Some(line) = read_line(input)? else {
            return Ok(());
        };
        let step = flow.feed(&line);
        for printed in &step.lines {
            writeln!(output, "{}", printed)?;
        }
        if let Some(request) = step.persist {
            persist_entry(api, &request)?;
        }
    }
    Ok(())
}

/// Fetch the user record, append the new serving keyed by the current
/// timestamp, and replace the whole record on the backend.
fn persist_entry(api: &ApiClient, request: &PersistRequest) -> Result<()> {
    let mut user = api.fetch_user(USER_ID)?;
    user.append_entry(ServingEntry {
        food: request.food.clone(),
        serving_size: request.serving_size,
        calories: request.calories,
    });
    let spinner = network_spinner("Saving log entry...");
    let saved = api.save_user(USER_ID, &user);
    spinner.finish_and_clear();
    saved
}

fn fetch_catalog(api: &ApiClient) -> Result<Vec<FoodItem>> {
    let spinner = network_spinner("Fetching foods...");
    let foods = api.fetch_foods();
    spinner.finish_and_clear();
    foods
}

/// Spinner shown while a network call is in flight. Draws to stderr and
/// hides itself when stderr is not a terminal, so piped output stays
/// clean.
fn network_spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    spinner.set_message(message);
    spinner
}

/// Read one line, without its trailing newline. `None` on end-of-input.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut buf = String::new();
    let read = input.read_line(&mut buf).context("Failed to read input")?;
    if read == 0 {
        return Ok(None);
    }
    while buf.ends_with('\n') || buf.ends_with('\r') {
        buf.pop();
    }
    Ok(Some(buf))
}
