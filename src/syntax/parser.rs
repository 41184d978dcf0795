use chrono::NaiveDate;
use regex::Regex;

use super::error::ParserError;
use crate::model::amount::Amount;
use crate::model::auto::AutoTransaction;
use crate::model::error::ModelError;
use crate::model::periodic::{Interval, Posting, Scheduler};
use crate::model::transaction::DATE_FORMAT;
use crate::model::{Accounts, Ledger, Transaction};

pub type Result<T> = std::result::Result<T, ParserError>;

const COMMENT_MARKERS: &[char] = &[';', '#', '%', '|', '*'];

#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Warn about transactions dated before their predecessor.
    pub check_sorted: bool,
    /// Stop at the first transaction dated after this.
    pub end: Option<NaiveDate>,
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Parses and commits a journal given as lines. Accounts are created in
/// `root` if given, otherwise in a fresh tree.
pub fn parse<I, S>(lines: I, root: Option<Accounts>, options: &Options) -> Result<Ledger>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = Parser::new(root.unwrap_or_default(), options);
    for (i, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        match parser.parse_line(i + 1, line) {
            Ok(true) => (),
            Ok(false) => break,
            Err(e) => {
                tracing::error!("error processing line #{} {}", i + 1, line);
                return Err(e);
            }
        }
    }
    parser.finish()
}

enum Block {
    None,
    Transaction,
    Auto(usize),
    Periodic(usize),
}

struct Parser<'a> {
    options: &'a Options,
    accounts: Accounts,
    transactions: Vec<Transaction>,
    auto_transactions: Vec<AutoTransaction>,
    scheduler: Scheduler,
    block: Block,
    last_date: Option<NaiveDate>,
}

/// Adds an item to `t` and lets every matching rule add its postings.
fn post(
    accounts: &mut Accounts,
    rules: &[AutoTransaction],
    t: &mut Transaction,
    account: &str,
    token: &str,
    line: usize,
) -> std::result::Result<(), ModelError> {
    let index = t.add_item(accounts, account, token, Some(line))?;
    let name = accounts.name(t.items()[index].account);
    for rule in rules.iter().filter(|r| r.matches(&name)) {
        tracing::trace!("rule {:?} matches {}", rule.pattern(), name);
        rule.apply(t, accounts, index)?;
    }
    Ok(())
}

impl<'a> Parser<'a> {
    fn new(accounts: Accounts, options: &'a Options) -> Self {
        Parser {
            options,
            accounts,
            transactions: Vec::new(),
            auto_transactions: Vec::new(),
            scheduler: Scheduler::default(),
            block: Block::None,
            last_date: None,
        }
    }

    /// Returns false once the end bound has been passed.
    fn parse_line(&mut self, n: usize, line: &str) -> Result<bool> {
        let data = line.split(';').next().unwrap_or_default();
        let Some(first) = data.chars().next() else {
            return Ok(true);
        };
        if data.trim().is_empty() {
            return Ok(true);
        }
        let fields = data.split_whitespace().collect::<Vec<_>>();
        match first {
            c if c.is_whitespace() => self.parse_posting(n, line, &fields)?,
            c if COMMENT_MARKERS.contains(&c) => (),
            '~' => self.parse_periodic(n, line, &data[1..])?,
            '=' => self.parse_automatic(n, line, &data[1..])?,
            'P' => self.parse_price(n, line, &fields)?,
            c if c.is_ascii_digit() => return self.parse_transaction(n, line, &fields),
            _ => return Err(ParserError::malformed(n, line, "unexpected directive")),
        }
        Ok(true)
    }

    fn parse_posting(&mut self, n: usize, line: &str, fields: &[&str]) -> Result<()> {
        let account = fields[0];
        let token = fields[1..].join(" ");
        match self.block {
            Block::Transaction => {
                let t = self
                    .transactions
                    .last_mut()
                    .ok_or_else(|| ParserError::malformed(n, line, "no open transaction"))?;
                post(
                    &mut self.accounts,
                    &self.auto_transactions,
                    t,
                    account,
                    &token,
                    n,
                )
                .map_err(|e| ParserError::model(n, line, e))
            }
            Block::Auto(i) => self.auto_transactions[i]
                .add_template(account, &token, Some(n))
                .map_err(|e| match e {
                    ModelError::InvalidTemplate(msg) => ParserError::malformed(n, line, &msg),
                    e => ParserError::model(n, line, e),
                }),
            Block::Periodic(i) => {
                Amount::parse(&token).map_err(|e| ParserError::model(n, line, e))?;
                self.scheduler.add_posting(
                    i,
                    Posting {
                        account: account.to_string(),
                        token,
                        line: n,
                    },
                );
                Ok(())
            }
            Block::None => Err(ParserError::malformed(
                n,
                line,
                "posting outside of a transaction",
            )),
        }
    }

    fn parse_periodic(&mut self, n: usize, line: &str, header: &str) -> Result<()> {
        let header = header.trim();
        let interval = Interval::try_from(header.split_whitespace().next().unwrap_or_default())
            .map_err(|e| ParserError::malformed(n, line, &e))?;
        let last = self.last_date.ok_or_else(|| {
            ParserError::malformed(n, line, "periodic transaction before the first transaction")
        })?;
        let due = interval
            .first_due(last)
            .ok_or_else(|| ParserError::malformed(n, line, "date out of range"))?;
        tracing::debug!("periodic transaction {:?} first due {}", header, due);
        let index = self.scheduler.add(due, interval, header, n);
        self.block = Block::Periodic(index);
        Ok(())
    }

    fn parse_automatic(&mut self, n: usize, line: &str, pattern: &str) -> Result<()> {
        let pattern = Regex::new(pattern.trim())
            .map_err(|e| ParserError::malformed(n, line, &e.to_string()))?;
        self.auto_transactions.push(AutoTransaction::new(pattern));
        self.block = Block::Auto(self.auto_transactions.len() - 1);
        Ok(())
    }

    fn parse_price(&mut self, n: usize, line: &str, fields: &[&str]) -> Result<()> {
        let [_, date, commodity, ..] = fields else {
            return Err(ParserError::malformed(n, line, "want P <date> <currency> <amount>"));
        };
        if fields[0] != "P" || fields.len() < 4 {
            return Err(ParserError::malformed(n, line, "want P <date> <currency> <amount>"));
        }
        parse_date(date).ok_or_else(|| ParserError::malformed(n, line, "invalid date"))?;
        let token = fields[3..].join(" ");
        let amount = Amount::parse(&token).map_err(|e| ParserError::model(n, line, e))?;
        let [(target, rate)] = amount.values.as_slice() else {
            return Err(ParserError::malformed(n, line, "want a single amount"));
        };
        self.accounts.set_market_price(commodity, target, *rate);
        Ok(())
    }

    fn parse_transaction(&mut self, n: usize, line: &str, fields: &[&str]) -> Result<bool> {
        let date =
            parse_date(fields[0]).ok_or_else(|| ParserError::malformed(n, line, "invalid date"))?;
        if self.options.end.is_some_and(|end| date > end) {
            tracing::debug!("stopping at line {}: {} is past the end date", n, date);
            return Ok(false);
        }
        self.last_date = Some(date);
        self.materialize(date)?;
        let t = Transaction::new(date, &fields[1..].join(" "), Some(n));
        if self.options.check_sorted {
            if let Some(last) = self.transactions.last().filter(|last| last.date > date) {
                tracing::warn!("not sorted: {} after {}", t.header(), last.header());
            }
        }
        self.transactions.push(t);
        self.block = Block::Transaction;
        Ok(true)
    }

    /// Queues every periodic occurrence due on or before `date`.
    fn materialize(&mut self, date: NaiveDate) -> Result<()> {
        while let Some(o) = self.scheduler.next_due(date) {
            let mut t = Transaction::new(o.date, &o.title, Some(o.line));
            for p in &o.postings {
                post(
                    &mut self.accounts,
                    &self.auto_transactions,
                    &mut t,
                    &p.account,
                    &p.token,
                    p.line,
                )
                .map_err(|e| {
                    ParserError::model(p.line, &format!("  {} {}", p.account, p.token), e)
                })?;
            }
            self.transactions.push(t);
        }
        Ok(())
    }

    fn finish(self) -> Result<Ledger> {
        for p in self.scheduler.templates() {
            tracing::debug!("{} transaction {:?} next due {}", p.interval, p.title, p.date);
        }
        let Parser {
            mut accounts,
            mut transactions,
            ..
        } = self;
        for t in &mut transactions {
            if let Err(source) = t.commit(&mut accounts) {
                let dump = t.dump(&accounts);
                tracing::error!("Dumping: {}", dump);
                return Err(ParserError::Commit {
                    header: t.header(),
                    dump,
                    source,
                });
            }
        }
        Ok(Ledger {
            accounts,
            transactions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2000/01/31"), Some(date(2000, 1, 31)));
        assert_eq!(parse_date("2000/1/3"), Some(date(2000, 1, 3)));
        assert_eq!(parse_date("2000-01-31"), None);
        assert_eq!(parse_date("2000/02/30"), None);
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let text = [
            "; leading comment",
            "# hash",
            "% percent",
            "| pipe",
            "* star",
            "",
            "   ",
            "2000/01/01 Salary ; trailing comment",
            "  Assets   $100 ; note",
            "  Income",
        ];
        let ledger = parse(text, None, &Options::default()).unwrap();
        assert_eq!(ledger.transactions.len(), 1);
        assert_eq!(ledger.transactions[0].title, "Salary");
        let assets = ledger.accounts.get("Assets").unwrap();
        assert_eq!(ledger.accounts.value(assets, "$").unwrap(), dec!(100));
    }

    #[test]
    fn test_malformed_lines() {
        let tests = [
            (vec!["foo"], 1),
            (vec!["  Assets $1"], 1),
            (vec!["2000/13/01 bad date"], 1),
            (vec!["2000/01/01 x", "  Assets $1", "~weekly"], 3),
            (vec!["~monthly"], 1),
            (vec!["=[unclosed"], 1),
            (vec!["P 2000/01/01 EUR"], 1),
            (vec!["Payee"], 1),
            (vec!["=Expenses", "  Budget =$1"], 2),
        ];
        for (text, want) in tests {
            match parse(&text, None, &Options::default()) {
                Err(ParserError::MalformedLine { line, .. }) => assert_eq!(line, want, "{:?}", text),
                other => panic!("{:?}: unexpected {:?}", text, other.map(|l| l.transactions)),
            }
        }
    }

    #[test]
    fn test_invalid_amount() {
        let text = ["2000/01/01 x", "  Assets $1.2.3", "  Equity"];
        let err = parse(text, None, &Options::default()).unwrap_err();
        assert!(matches!(
            err,
            ParserError::Model {
                line: 2,
                source: ModelError::InvalidAmount(_),
                ..
            }
        ));
    }

    #[test]
    fn test_multiple_inferred_items() {
        let text = ["2000/01/01 x", "  Assets", "  Equity"];
        let err = parse(text, None, &Options::default()).unwrap_err();
        assert_eq!(
            err.model_error(),
            Some(&ModelError::MultipleInferredItems { line: 3 })
        );
    }

    #[test]
    fn test_price_directive() {
        let text = ["P 2000/01/01 EUR $1.10", "P 2000/01/01 CHF 0.9 EUR"];
        let ledger = parse(text, None, &Options::default()).unwrap();
        assert_eq!(ledger.accounts.market_price("EUR", "$"), Ok(dec!(1.10)));
        assert_eq!(ledger.accounts.market_price("CHF", "EUR"), Ok(dec!(0.9)));
    }

    #[test]
    fn test_end_bound() {
        let text = [
            "2000/01/01 a",
            "  Assets $1",
            "  Equity",
            "2000/02/01 b",
            "  Assets $1",
            "  Equity",
            "this line is never read",
        ];
        let options = Options {
            end: Some(date(2000, 1, 31)),
            ..Default::default()
        };
        let ledger = parse(text, None, &options).unwrap();
        assert_eq!(ledger.transactions.len(), 1);
    }

    #[test]
    fn test_existing_root() {
        let mut root = Accounts::new();
        let assets = root.account("Assets");
        root.add_value(assets, "$", dec!(50), false);
        let text = ["2000/01/01 a", "  Assets $1", "  Equity"];
        let ledger = parse(text, Some(root), &Options::default()).unwrap();
        assert_eq!(ledger.accounts.value(assets, "$").unwrap(), dec!(51));
    }
}
