use std::collections::BTreeSet;
use std::fmt;
use std::fmt::Display;

use chrono::{Datelike, Months, NaiveDate};

#[derive(Clone, Copy, Eq, PartialEq, Debug, Ord, PartialOrd)]
pub enum Interval {
    Daily,
    Monthly,
    Yearly,
}

impl Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Daily => write!(f, "daily"),
            Interval::Monthly => write!(f, "monthly"),
            Interval::Yearly => write!(f, "yearly"),
        }
    }
}

impl TryFrom<&str> for Interval {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "daily" => Ok(Interval::Daily),
            "monthly" => Ok(Interval::Monthly),
            "yearly" => Ok(Interval::Yearly),
            _ => Err(format!("invalid interval: {}", value)),
        }
    }
}

impl Interval {
    /// The date one interval after `d`. Days past the end of the target
    /// month are clamped to its last day.
    pub fn next(self, d: NaiveDate) -> Option<NaiveDate> {
        match self {
            Interval::Daily => d.succ_opt(),
            Interval::Monthly => d.checked_add_months(Months::new(1)),
            Interval::Yearly => d.checked_add_months(Months::new(12)),
        }
    }

    /// The first occurrence of a template declared after a transaction
    /// dated `last`.
    pub fn first_due(self, last: NaiveDate) -> Option<NaiveDate> {
        match self {
            Interval::Daily => self.next(last),
            Interval::Monthly => last.with_day(1).and_then(|d| self.next(d)),
            Interval::Yearly => last.with_month(1).and_then(|d| self.next(d)),
        }
    }
}

/// A posting line of a periodic template, kept unparsed until the template
/// fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub account: String,
    pub token: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodicTemplate {
    pub date: NaiveDate,
    pub interval: Interval,
    pub title: String,
    pub line: usize,
    pub postings: Vec<Posting>,
}

/// An occurrence of a template that has come due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub date: NaiveDate,
    pub title: String,
    pub line: usize,
    pub postings: Vec<Posting>,
}

/// Periodic templates ordered by next due date, ties broken by
/// registration order.
#[derive(Debug, Default)]
pub struct Scheduler {
    templates: Vec<PeriodicTemplate>,
    queue: BTreeSet<(NaiveDate, usize)>,
}

impl Scheduler {
    pub fn add(&mut self, date: NaiveDate, interval: Interval, title: &str, line: usize) -> usize {
        let index = self.templates.len();
        self.templates.push(PeriodicTemplate {
            date,
            interval,
            title: title.to_string(),
            line,
            postings: Vec::new(),
        });
        self.queue.insert((date, index));
        index
    }

    pub fn add_posting(&mut self, index: usize, posting: Posting) {
        self.templates[index].postings.push(posting)
    }

    pub fn templates(&self) -> &[PeriodicTemplate] {
        &self.templates
    }

    /// Pops the earliest template due on or before `until` and reschedules
    /// it one interval later.
    pub fn next_due(&mut self, until: NaiveDate) -> Option<Occurrence> {
        let (date, index) = *self.queue.first()?;
        if date > until {
            return None;
        }
        self.queue.pop_first();
        let template = &mut self.templates[index];
        match template.interval.next(date) {
            Some(next) => {
                template.date = next;
                self.queue.insert((next, index));
            }
            None => tracing::warn!("periodic transaction {:?} ran out of dates", template.title),
        }
        Some(Occurrence {
            date,
            title: template.title.clone(),
            line: template.line,
            postings: template.postings.clone(),
        })
    }
}
