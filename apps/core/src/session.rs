use crate::action_executor::{resolve_launch, LaunchRequest};
use crate::candidate_store::CandidateStore;
use crate::filter::{filter, MatchList};

/// Classified key event, produced by the front end's key classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Printable(char),
    Delete,
    Accept,
    Cancel,
    Other,
}

/// What the controller must do after a key was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Buffer changed and matches were recomputed.
    Edited,
    /// Nothing changed.
    Unchanged,
    /// Session ends; launch the request if there is one.
    Accept(Option<LaunchRequest>),
    Cancel,
}

/// Bounded, NUL-free line of typed characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
    len: usize,
    max_len: usize,
}

impl InputBuffer {
    pub fn new(max_len: usize) -> Self {
        Self {
            text: String::new(),
            len: 0,
            max_len,
        }
    }

    /// Appends `ch` unless the buffer is full or `ch` is NUL.
    pub fn push(&mut self, ch: char) -> bool {
        if ch == '\0' || self.len >= self.max_len {
            return false;
        }
        self.text.push(ch);
        self.len += 1;
        true
    }

    pub fn pop(&mut self) -> bool {
        if self.text.pop().is_some() {
            self.len -= 1;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) -> bool {
        if self.text.is_empty() {
            return false;
        }
        self.text.clear();
        self.len = 0;
        true
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

/// Input buffer plus the matches derived from it. Matches are recomputed on
/// every mutation so they never lag behind the buffer.
pub struct SessionState<'a> {
    store: &'a CandidateStore,
    input: InputBuffer,
    matches: MatchList<'a>,
    running: bool,
}

impl<'a> SessionState<'a> {
    pub fn new(store: &'a CandidateStore, max_input_len: usize) -> Self {
        let input = InputBuffer::new(max_input_len);
        let matches = filter(store, input.as_str());
        Self {
            store,
            input,
            matches,
            running: true,
        }
    }

    pub fn apply(&mut self, key: KeyInput) -> Transition {
        if !self.running {
            return Transition::Unchanged;
        }

        match key {
            KeyInput::Cancel => {
                self.running = false;
                Transition::Cancel
            }
            KeyInput::Accept => {
                self.running = false;
                Transition::Accept(resolve_launch(self.input.as_str(), &self.matches))
            }
            KeyInput::Delete => {
                if self.input.pop() {
                    self.refilter();
                    Transition::Edited
                } else {
                    Transition::Unchanged
                }
            }
            KeyInput::Printable(ch) => {
                if self.input.push(ch) {
                    self.refilter();
                    Transition::Edited
                } else {
                    Transition::Unchanged
                }
            }
            KeyInput::Other => Transition::Unchanged,
        }
    }

    /// Empties the buffer. Not bound to a key by the terminal front end.
    pub fn clear(&mut self) -> Transition {
        if self.input.clear() {
            self.refilter();
            Transition::Edited
        } else {
            Transition::Unchanged
        }
    }

    pub fn input(&self) -> &str {
        self.input.as_str()
    }

    pub fn matches(&self) -> &[&'a str] {
        &self.matches
    }

    /// The first match is the one shown highlighted.
    pub fn highlighted_index(&self) -> Option<usize> {
        if self.matches.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn refilter(&mut self) {
        self.matches = filter(self.store, self.input.as_str());
    }
}
