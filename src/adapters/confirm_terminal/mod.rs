//! Terminal prompts answering confirmation requests on the main thread

use std::io::{self, BufRead, Write};

use tracing::warn;

use crate::domain::model::{ConfirmationRequest, ConfirmationResponse};

/// Re-ask this many times before falling back to the safe answer
const MAX_ATTEMPTS: usize = 3;

/// Asks on stderr and reads answers from stdin
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }

    /// Blocking prompt on the process's terminal
    pub fn ask(&self, request: &ConfirmationRequest) -> ConfirmationResponse {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stderr();
        self.ask_with(request, &mut input, &mut output)
    }

    /// Prompt using the given streams; EOF or repeated nonsense yields the safe answer
    pub fn ask_with(
        &self,
        request: &ConfirmationRequest,
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> ConfirmationResponse {
        for _ in 0..MAX_ATTEMPTS {
            if let Err(e) = write!(output, "{}", prompt_text(request)).and_then(|_| output.flush()) {
                warn!(error = %e, "Could not write prompt");
                break;
            }
            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if let Some(answer) = parse_answer(request, &line) {
                        return answer;
                    }
                }
            }
        }
        safe_answer(request)
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

fn prompt_text(request: &ConfirmationRequest) -> String {
    match request {
        ConfirmationRequest::FileConflict { path } => format!(
            "'{}' already exists. [o]verwrite, [r]ename, [c]ancel: ",
            path.display()
        ),
        ConfirmationRequest::AcceptCompromise { description } => format!(
            "The selected format is not available. Download {} instead? [y/N]: ",
            description
        ),
        ConfirmationRequest::KeepOriginal { path, reason } => format!(
            "{}. Keep the already downloaded '{}'? [y/N]: ",
            reason,
            path.display()
        ),
    }
}

fn parse_answer(request: &ConfirmationRequest, line: &str) -> Option<ConfirmationResponse> {
    let answer = line.trim().to_lowercase();
    match request {
        ConfirmationRequest::FileConflict { .. } => match answer.as_str() {
            "o" | "overwrite" => Some(ConfirmationResponse::Overwrite),
            "r" | "rename" => Some(ConfirmationResponse::Rename),
            "c" | "cancel" => Some(ConfirmationResponse::Cancel),
            _ => None,
        },
        _ => match answer.as_str() {
            "y" | "yes" => Some(ConfirmationResponse::Yes),
            "" | "n" | "no" => Some(ConfirmationResponse::No),
            _ => None,
        },
    }
}

fn safe_answer(request: &ConfirmationRequest) -> ConfirmationResponse {
    match request {
        ConfirmationRequest::FileConflict { .. } => ConfirmationResponse::Cancel,
        _ => ConfirmationResponse::No,
    }
}
