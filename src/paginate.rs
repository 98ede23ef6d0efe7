//! Budgeted pagination
//!
//! A line accumulator: segments (whole lines or whole blocks of lines) are
//! appended to the open page until the next one would push it past the
//! budget, at which point the page is flushed and a new one opened. A
//! segment larger than the whole budget becomes a page of its own.
//!
//! Lengths are counted in chars. A page of exactly `budget` chars fits.
//! Pages concatenated in order reproduce the input exactly.

/// What happened to a pushed segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Appended to the open page
    Accumulated,
    /// The open page was flushed first; the segment opened a new page
    Flushed,
    /// The segment exceeds the budget on its own and was emitted alone
    Oversized,
}

#[derive(Debug, Clone)]
pub struct LineAccumulator {
    budget: usize,
    current: String,
    current_len: usize,
    pages: Vec<String>,
}

impl LineAccumulator {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            current: String::new(),
            current_len: 0,
            pages: Vec::new(),
        }
    }

    pub fn push(&mut self, segment: &str) -> PushOutcome {
        let segment_len = segment.chars().count();

        if segment_len > self.budget {
            self.flush();
            self.pages.push(segment.to_string());
            return PushOutcome::Oversized;
        }

        let outcome = if self.current_len > 0 && self.current_len + segment_len > self.budget {
            self.flush();
            PushOutcome::Flushed
        } else {
            PushOutcome::Accumulated
        };

        self.current.push_str(segment);
        self.current_len += segment_len;
        outcome
    }

    fn flush(&mut self) {
        if self.current_len > 0 {
            self.pages.push(std::mem::take(&mut self.current));
            self.current_len = 0;
        }
    }

    /// Close the open page and return every page in order
    pub fn finish(mut self) -> Vec<String> {
        self.flush();
        self.pages
    }
}

/// Split text on line boundaries into pages of at most `budget` chars
pub fn paginate_lines(text: &str, budget: usize) -> Vec<String> {
    let mut acc = LineAccumulator::new(budget);
    for line in text.split_inclusive('\n') {
        acc.push(line);
    }
    acc.finish()
}
