use std::io::{BufRead, ErrorKind, IsTerminal, Write};

use dialoguer::Input;

use crate::categorizer::UnknownItem;
use crate::error::Result;
use crate::fmt::amount;
use crate::rules::{validate_pattern, RuleStore};

/// Ask one question, get one line back. `None` means input has ended.
pub trait Prompt {
    fn say(&mut self, line: &str) -> Result<()>;
    fn ask(&mut self, question: &str) -> Result<Option<String>>;
}

/// Interactive prompt on the terminal.
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn say(&mut self, line: &str) -> Result<()> {
        println!("{line}");
        Ok(())
    }

    fn ask(&mut self, question: &str) -> Result<Option<String>> {
        match Input::<String>::new()
            .with_prompt(question)
            .allow_empty(true)
            .interact_text()
        {
            Ok(answer) => Ok(Some(answer)),
            Err(dialoguer::Error::IO(e)) if input_closed(e.kind()) => {
                tracing::warn!("input closed, stopping: {e}");
                Ok(None)
            }
            Err(dialoguer::Error::IO(e)) => Err(e.into()),
        }
    }
}

/// Ctrl-C or end of input ends the session like `q`; other I/O errors do not.
fn input_closed(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::Interrupted | ErrorKind::UnexpectedEof)
}

/// Line-oriented prompt over any reader/writer pair (piped stdin, tests).
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Prompt for LinePrompt<R, W> {
    fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{line}")?;
        Ok(())
    }

    fn ask(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "{question} > ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Terminal prompt when stdin is a tty, plain line reading otherwise.
pub fn stdin_prompt() -> Box<dyn Prompt> {
    if std::io::stdin().is_terminal() {
        Box::new(TerminalPrompt)
    } else {
        Box::new(LinePrompt::new(std::io::stdin().lock(), std::io::stdout()))
    }
}

impl<P: Prompt + ?Sized> Prompt for Box<P> {
    fn say(&mut self, line: &str) -> Result<()> {
        (**self).say(line)
    }

    fn ask(&mut self, question: &str) -> Result<Option<String>> {
        (**self).ask(question)
    }
}

/// What an answer to the category question asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Choice {
    Skip,
    Quit,
    Pattern,
    Category(String),
    OutOfRange(usize),
}

/// Read an answer against the numbered category list. Numbers pick an
/// existing category (1-based); any other text names a category.
pub fn interpret(answer: &str, categories: &[String]) -> Choice {
    let answer = answer.trim();
    match answer {
        "" => Choice::Skip,
        "q" => Choice::Quit,
        "r" => Choice::Pattern,
        _ => match answer.parse::<usize>() {
            Ok(n) if (1..=categories.len()).contains(&n) => Choice::Category(categories[n - 1].clone()),
            Ok(n) => Choice::OutOfRange(n),
            Err(_) => Choice::Category(answer.to_string()),
        },
    }
}

fn remember(categories: &mut Vec<String>, category: &str) {
    if !categories.iter().any(|c| c == category) {
        categories.push(category.to_string());
    }
}

fn numbered(categories: &[String]) -> String {
    categories
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {c}", i + 1))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LearnOutcome {
    pub exact_added: usize,
    pub patterns_added: usize,
    pub quit: bool,
}

enum Step {
    Assigned,
    Skip,
    Quit,
}

/// Ask for a category for each unknown item and record the answers in
/// `store`. Persisting the store is left to the caller.
pub fn learn<P: Prompt>(items: &[UnknownItem], store: &mut RuleStore, prompt: &mut P) -> Result<LearnOutcome> {
    let mut outcome = LearnOutcome::default();
    let mut categories = store.categories();

    prompt.say("Please input categories for the following items")?;
    prompt.say("(Enter to skip, q to quit, r to match with a pattern)")?;
    if !categories.is_empty() {
        prompt.say(&format!("Current categories are: {}", numbered(&categories)))?;
    }

    'items: for item in items {
        // an earlier pattern answer may already cover this one
        if item.name.trim().is_empty() || store.matcher().categorize(&item.name).is_some() {
            continue;
        }
        let question = match item.sample_amount {
            Some(value) => format!("{} ({})", item.name, amount(value)),
            None => item.name.clone(),
        };

        loop {
            let Some(answer) = prompt.ask(&question)? else {
                outcome.quit = true;
                break 'items;
            };
            match interpret(&answer, &categories) {
                Choice::Skip => continue 'items,
                Choice::Quit => {
                    outcome.quit = true;
                    break 'items;
                }
                Choice::Category(category) => {
                    store.add_exact(&item.name, &category);
                    remember(&mut categories, &category);
                    outcome.exact_added += 1;
                    continue 'items;
                }
                Choice::OutOfRange(n) => {
                    prompt.say(&format!("There is no category {n}. Current categories are: {}", numbered(&categories)))?;
                }
                Choice::Pattern => match learn_pattern(item, store, &mut categories, prompt)? {
                    Step::Assigned => {
                        outcome.patterns_added += 1;
                        continue 'items;
                    }
                    Step::Skip => continue 'items,
                    Step::Quit => {
                        outcome.quit = true;
                        break 'items;
                    }
                },
            }
        }
    }

    Ok(outcome)
}

fn learn_pattern<P: Prompt>(
    item: &UnknownItem,
    store: &mut RuleStore,
    categories: &mut Vec<String>,
    prompt: &mut P,
) -> Result<Step> {
    let pattern = loop {
        let Some(pattern) = prompt.ask(&format!("Pattern for {}", item.name))? else {
            return Ok(Step::Quit);
        };
        if pattern.is_empty() {
            return Ok(Step::Skip);
        }
        match validate_pattern(&pattern, &item.name) {
            Ok(_) => break pattern,
            Err(e) => prompt.say(&format!("{e}, try again"))?,
        }
    };

    loop {
        let Some(answer) = prompt.ask(&format!("Category for /{pattern}/"))? else {
            return Ok(Step::Quit);
        };
        match interpret(&answer, categories) {
            Choice::Skip => return Ok(Step::Skip),
            Choice::Quit => return Ok(Step::Quit),
            Choice::Category(category) => {
                store.add_pattern(&pattern, &category);
                remember(categories, &category);
                return Ok(Step::Assigned);
            }
            Choice::Pattern => prompt.say("Enter a category name or number")?,
            Choice::OutOfRange(n) => prompt.say(&format!("There is no category {n}"))?,
        }
    }
}
