//! UI Module - selection capability consumed by the orchestrator
//!
//! The core never talks to a terminal directly. It hands a list of [`Choice`]s to a
//! [`Selector`] and gets back exactly one id or an explicit cancellation.

pub mod prompt;

use std::collections::VecDeque;

use crate::models::{Choice, Selection};

pub use prompt::TerminalSelector;

/// Present candidates and block until one is chosen or the user backs out
pub trait Selector: Send {
    /// `title` describes what is being chosen. The returned id must be one of the
    /// offered ids; an empty `candidates` slice yields `Cancelled`.
    fn choose(&mut self, title: &str, candidates: &[Choice]) -> Selection<String>;
}

/// Selector that replays a fixed script of answers
///
/// Each entry is either an id to pick or `None` to cancel. Once the script is
/// exhausted every further prompt is cancelled.
#[derive(Debug, Default, Clone)]
pub struct ScriptedSelector {
    answers: VecDeque<Option<String>>,
    prompts: Vec<String>,
}

impl ScriptedSelector {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        ScriptedSelector {
            answers: answers.into_iter().map(|a| a.map(Into::into)).collect(),
            prompts: Vec::new(),
        }
    }

    /// Pick `ids` in order
    pub fn picking<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ids.into_iter().map(Some))
    }

    /// Titles of the prompts seen so far
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl Selector for ScriptedSelector {
    fn choose(&mut self, title: &str, candidates: &[Choice]) -> Selection<String> {
        self.prompts.push(title.to_string());
        match self.answers.pop_front().flatten() {
            Some(id) if candidates.iter().any(|c| c.id == id) => Selection::Chosen(id),
            Some(id) => {
                log::warn!("[Selector] Scripted answer '{}' not offered for '{}'", id, title);
                Selection::Cancelled
            }
            None => Selection::Cancelled,
        }
    }
}
