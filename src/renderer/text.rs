//! Host text interop: a pull accessor and an optional push sink.
//!
//! The engine reads the full text through [`TextSource`] and reports its own
//! edits through [`TextSink`]. Both are synchronous; any closure with the
//! right shape works, and [`SharedText`] covers hosts with no text store of
//! their own.

use std::cell::RefCell;
use std::rc::Rc;

/// Pull accessor for the full current text.
pub trait TextSource {
    fn read(&self) -> String;
}

impl<F: Fn() -> String> TextSource for F {
    fn read(&self) -> String {
        self()
    }
}

/// An edit the engine made to the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextUpdate<'a> {
    /// `next = previous + chunk`
    Append(&'a str),
    /// `next = text`
    Replace(&'a str),
}

impl TextUpdate<'_> {
    /// Apply this update to `text` in place.
    pub fn apply(&self, text: &mut String) {
        match self {
            Self::Append(chunk) => text.push_str(chunk),
            Self::Replace(next) => {
                text.clear();
                text.push_str(next);
            }
        }
    }
}

/// Push sink keeping the host's text in step with the engine.
pub trait TextSink {
    fn update(&mut self, update: TextUpdate<'_>);
}

impl<F: FnMut(TextUpdate<'_>)> TextSink for F {
    fn update(&mut self, update: TextUpdate<'_>) {
        self(update)
    }
}

/// Shared text buffer usable as both source and sink.
#[derive(Debug, Clone, Default)]
pub struct SharedText(Rc<RefCell<String>>);

impl SharedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(text.into())))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

impl TextSource for SharedText {
    fn read(&self) -> String {
        self.0.borrow().clone()
    }
}

impl TextSink for SharedText {
    fn update(&mut self, update: TextUpdate<'_>) {
        update.apply(&mut self.0.borrow_mut());
    }
}
