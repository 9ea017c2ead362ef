//! Interactive question protocol
//!
//! Every question is one line with a fixed set of accepted answers, matched
//! case-insensitively. An invalid answer repeats the question until a valid
//! one arrives. End of input is an error, never a default.

use std::collections::VecDeque;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::error::ResolveError;

/// Answer channel used by the resolver
pub trait Prompt {
    /// Show `question` and read one line; `None` at end of input
    ///
    /// # Errors
    ///
    /// Returns an error when the channel cannot be read or written.
    fn ask(&mut self, question: &str) -> io::Result<Option<String>>;

    /// Show an informational line
    ///
    /// # Errors
    ///
    /// Returns an error when the channel cannot be written.
    fn say(&mut self, line: &str) -> io::Result<()>;
}

/// Line-oriented console prompt
#[derive(Debug)]
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompt<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on the process's stdin and stdout
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    /// Create prompt over arbitrary streams
    #[inline]
    #[must_use]
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Release the output stream
    #[inline]
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Prompt for ConsolePrompt<R, W> {
    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{question} ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{line}")
    }
}

/// Replays prepared answers and records every question asked
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    transcript: Vec<String>,
}

impl ScriptedPrompt {
    /// Answers in order
    pub fn from_lines<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    /// One answer per line of a file
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_lines(text.lines()))
    }

    /// Answers not consumed yet
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    /// Every question and line shown so far
    #[inline]
    #[must_use]
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        self.transcript.push(question.to_string());
        Ok(self.answers.pop_front())
    }

    fn say(&mut self, line: &str) -> io::Result<()> {
        self.transcript.push(line.to_string());
        Ok(())
    }
}

/// Ask until the answer is one of `choices`; returns the lowercased answer
pub(crate) fn choose(
    prompt: &mut dyn Prompt,
    question: &str,
    choices: &[&str],
) -> Result<String, ResolveError> {
    let rendered = format!("{question} [{}]", choices.join("/"));
    let mut shown = rendered.clone();
    loop {
        let Some(answer) = prompt.ask(&shown)? else {
            return Err(ResolveError::EndOfInput { question: rendered });
        };
        let answer = answer.trim().to_lowercase();
        if choices.iter().any(|choice| choice.eq_ignore_ascii_case(&answer)) {
            return Ok(answer);
        }
        tracing::debug!(%answer, "answer not accepted");
        shown = format!("Answer not accepted. {rendered}");
    }
}

/// Yes/no question
pub(crate) fn confirm(prompt: &mut dyn Prompt, question: &str) -> Result<bool, ResolveError> {
    Ok(choose(prompt, question, &["y", "n"])? == "y")
}

/// Free-text answer, trimmed
pub(crate) fn text(prompt: &mut dyn Prompt, question: &str) -> Result<String, ResolveError> {
    match prompt.ask(question)? {
        Some(answer) => Ok(answer.trim().to_string()),
        None => Err(ResolveError::EndOfInput {
            question: question.to_string(),
        }),
    }
}

/// Numbered choice among `options`; `None` when aborted with `x`
pub(crate) fn pick<'o>(
    prompt: &mut dyn Prompt,
    question: &str,
    options: &'o [String],
) -> Result<Option<&'o str>, ResolveError> {
    for (i, option) in options.iter().enumerate() {
        prompt.say(&format!("  [{}] {option}", i + 1))?;
    }
    let numbers: Vec<String> = (1..=options.len()).map(|i| i.to_string()).collect();
    let mut choices: Vec<&str> = numbers.iter().map(String::as_str).collect();
    choices.push("x");

    let answer = choose(prompt, question, &choices)?;
    if answer == "x" {
        return Ok(None);
    }
    Ok(answer
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| options.get(i))
        .map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn invalid_answers_repeat_the_question() {
        let mut prompt = ScriptedPrompt::from_lines(["maybe", "", "Static"]);
        let answer = choose(&mut prompt, "Disposition", &["static", "dynamic"]).unwrap();
        assert_eq!(answer, "static");
        assert_eq!(
            prompt.transcript(),
            [
                "Disposition [static/dynamic]",
                "Answer not accepted. Disposition [static/dynamic]",
                "Answer not accepted. Disposition [static/dynamic]",
            ]
        );
    }

    #[test]
    fn end_of_input_is_an_error() {
        let mut prompt = ScriptedPrompt::default();
        assert!(matches!(
            confirm(&mut prompt, "Continue"),
            Err(ResolveError::EndOfInput { .. })
        ));
        assert!(text(&mut prompt, "Name").is_err());
    }

    #[test]
    fn pick_is_one_based_and_x_aborts() {
        let options = vec!["title".to_string(), "label".to_string()];
        let mut prompt = ScriptedPrompt::from_lines(["0", "2", "X"]);
        assert_eq!(pick(&mut prompt, "Column", &options).unwrap(), Some("label"));
        assert_eq!(pick(&mut prompt, "Column", &options).unwrap(), None);
        assert_eq!(prompt.remaining(), 0);
    }

    #[test]
    fn console_prompt_reads_lines() {
        let input = io::Cursor::new("Y\r\nnext\n");
        let mut prompt = ConsolePrompt::new(input, Vec::new());
        assert!(confirm(&mut prompt, "Rename").unwrap());
        assert_eq!(text(&mut prompt, "Name").unwrap(), "next");
        assert_eq!(prompt.ask("More").unwrap(), None);
        let output = String::from_utf8(prompt.into_output()).unwrap();
        assert!(output.starts_with("Rename [y/n] Name "));
    }
}
