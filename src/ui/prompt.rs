//! Numbered terminal prompt implementing [`Selector`].

use std::io::{self, BufRead, Write};

use crate::error::AppError;
use crate::models::{Choice, Selection};
use crate::ui::Selector;

/// Blocking prompt over any line reader / writer pair
///
/// Input is a 1-based number; `q` or end of input cancels. Anything else prints a
/// hint and asks again.
///
/// A read or write failure ends the prompt without a choice. The error is kept
/// and [`TerminalSelector::settle`] turns the outcome into [`AppError::Prompt`],
/// so a broken terminal is never reported as a user cancel.
pub struct TerminalSelector<R, W> {
    input: R,
    output: W,
    failure: Option<io::Error>,
}

impl TerminalSelector<io::BufReader<io::Stdin>, io::Stderr> {
    /// Prompt on stderr so stdout stays clean for resolved output
    pub fn stdio() -> Self {
        TerminalSelector::new(io::BufReader::new(io::stdin()), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalSelector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        TerminalSelector {
            input,
            output,
            failure: None,
        }
    }

    /// Surface a terminal failure recorded during the last prompts
    pub fn settle<T>(&mut self, selection: Selection<T>) -> Result<Selection<T>, AppError> {
        match self.failure.take() {
            Some(e) => Err(AppError::Prompt(e)),
            None => Ok(selection),
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn render(&mut self, title: &str, candidates: &[Choice]) -> io::Result<()> {
        writeln!(self.output, "{}", title)?;
        for (idx, choice) in candidates.iter().enumerate() {
            writeln!(self.output, "  {:>3}) {}", idx + 1, choice.label)?;
        }
        write!(self.output, "Select 1-{} (q to cancel): ", candidates.len())?;
        self.output.flush()
    }

    fn read_answer(&mut self, candidates: &[Choice]) -> io::Result<Option<Selection<String>>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(Some(Selection::Cancelled));
        }

        let answer = line.trim();
        if answer.eq_ignore_ascii_case("q") {
            return Ok(Some(Selection::Cancelled));
        }

        let picked = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| candidates.get(idx));

        match picked {
            Some(choice) => Ok(Some(Selection::Chosen(choice.id.clone()))),
            None => {
                write!(
                    self.output,
                    "'{}' is not a number between 1 and {}. Select again: ",
                    answer,
                    candidates.len()
                )?;
                self.output.flush()?;
                Ok(None)
            }
        }
    }

    fn prompt(&mut self, title: &str, candidates: &[Choice]) -> io::Result<Selection<String>> {
        if candidates.is_empty() {
            return Ok(Selection::Cancelled);
        }
        self.render(title, candidates)?;
        loop {
            if let Some(selection) = self.read_answer(candidates)? {
                return Ok(selection);
            }
        }
    }
}

impl<R: BufRead + Send, W: Write + Send> Selector for TerminalSelector<R, W> {
    fn choose(&mut self, title: &str, candidates: &[Choice]) -> Selection<String> {
        match self.prompt(title, candidates) {
            Ok(selection) => selection,
            Err(e) => {
                log::error!("[Selector] Prompt failed for '{}': {}", title, e);
                self.failure = Some(e);
                Selection::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn choices() -> Vec<Choice> {
        vec![
            Choice::new("5.10.78-rt55", "5.10.78-rt55"),
            Choice::new("5.10.77-rt54", "5.10.77-rt54"),
        ]
    }

    fn run(input: &str) -> (Selection<String>, String) {
        let mut selector = TerminalSelector::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let selection = selector.choose("RT patch", &choices());
        let output = String::from_utf8(selector.into_output()).unwrap();
        (selection, output)
    }

    #[test]
    fn test_numbered_choice() {
        let (selection, output) = run("2\n");
        assert_eq!(selection, Selection::Chosen("5.10.77-rt54".to_string()));
        assert!(output.contains("RT patch"));
        assert!(output.contains("  1) 5.10.78-rt55"));
    }

    #[test]
    fn test_invalid_input_reprompts() {
        let (selection, output) = run("0\nabc\n1\n");
        assert_eq!(selection, Selection::Chosen("5.10.78-rt55".to_string()));
        assert_eq!(output.matches("Select again").count(), 2);
    }

    #[test]
    fn test_quit_and_eof_cancel() {
        assert!(run("q\n").0.is_cancelled());
        assert!(run("").0.is_cancelled());
        assert!(run("7\n").0.is_cancelled());
    }

    #[test]
    fn test_settle_passes_user_outcome_through() {
        let mut selector = TerminalSelector::new(Cursor::new(b"q\n".to_vec()), Vec::new());
        let selection = selector.choose("RT patch", &choices());
        assert!(selector.settle(selection).unwrap().is_cancelled());

        let mut selector = TerminalSelector::new(Cursor::new(b"1\n".to_vec()), Vec::new());
        let selection = selector.choose("RT patch", &choices());
        assert_eq!(
            selector.settle(selection).unwrap(),
            Selection::Chosen("5.10.78-rt55".to_string())
        );
    }

    #[test]
    fn test_unreadable_input_is_an_error_not_a_cancel() {
        // Not valid UTF-8, so read_line fails with InvalidData
        let mut selector = TerminalSelector::new(Cursor::new(vec![0xff, b'\n']), Vec::new());
        let selection = selector.choose("RT patch", &choices());

        match selector.settle(selection) {
            Err(AppError::Prompt(e)) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
            other => panic!("unexpected outcome: {:?}", other),
        }
        // The failure is reported once
        assert!(selector.settle(Selection::<String>::Cancelled).is_ok());
    }

    /// Output sink whose every write fails
    struct ClosedOutput;

    impl Write for ClosedOutput {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_closed_output_is_an_error() {
        let mut selector = TerminalSelector::new(Cursor::new(b"1\n".to_vec()), ClosedOutput);
        let selection = selector.choose("RT patch", &choices());
        let err = selector.settle(selection).unwrap_err();
        assert!(err.user_message().contains("terminal"));
    }
}
