use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally::model::{Ledger, ModelError};
use tally::syntax::{error::ParserError, parse, parser::Options};

fn ledger(text: &str) -> Ledger {
    parse(text.lines(), None, &Options::default()).unwrap()
}

fn value(ledger: &Ledger, account: &str, currency: &str) -> Decimal {
    let id = ledger
        .accounts
        .get(account)
        .unwrap_or_else(|| panic!("no account {}", account));
    ledger.accounts.value(id, currency).unwrap()
}

#[test]
fn test_inferred_item() {
    let l = ledger(
        "
2000/01/01 salary
  Assets  $100
  Expenses
",
    );
    assert_eq!(value(&l, "Assets", "$"), dec!(100));
    assert_eq!(value(&l, "Expenses", "$"), dec!(-100));
}

#[test]
fn test_conversions() {
    let l = ledger(
        "
2000/01/01 buy
  Assets:Broker  10 STOCK @ $100
  Assets:Broker
2000/01/02 buy more
  Assets:Fund  10 FUND @@ $100
  Assets:Fund
",
    );
    assert_eq!(value(&l, "Assets:Broker", "STOCK"), dec!(10));
    assert_eq!(value(&l, "Assets:Broker", "$"), dec!(-1000));
    assert_eq!(value(&l, "Assets:Fund", "FUND"), dec!(10));
    assert_eq!(value(&l, "Assets:Fund", "$"), dec!(-100));
    assert_eq!(l.accounts.market_price("STOCK", "$"), Ok(dec!(100)));
    assert_eq!(l.accounts.market_price("FUND", "$"), Ok(dec!(10)));
}

#[test]
fn test_assertions() {
    let text = "
2000/01/01 * opening
  Assets  $100
2000/01/02 deposit
  Assets  $10=$110
  Income
";
    let l = ledger(text);
    assert_eq!(value(&l, "Assets", "$"), dec!(110));
    assert_eq!(value(&l, "Income", "$"), dec!(-10));

    let failing = format!("{}2000/01/03 check\n  Assets  =$200\n  Assets  $5\n  Income\n", text);
    let err = parse(failing.lines(), None, &Options::default()).unwrap_err();
    assert_eq!(
        err.model_error(),
        Some(&ModelError::BalanceAssertionFailed {
            account: "Assets".into(),
            currency: "$".into(),
            expected: dec!(200),
            actual: dec!(205),
        })
    );
}

#[test]
fn test_assertion_only_item() {
    let l = ledger(
        "
2000/01/01 * opening
  Assets:Bank  $100
2000/02/01 reconcile
  Assets:Bank  =$80
  Expenses:Fees
",
    );
    assert_eq!(value(&l, "Assets:Bank", "$"), dec!(80));
    assert_eq!(value(&l, "Expenses:Fees", "$"), dec!(20));
}

#[test]
fn test_unbalanced() {
    let text = "
2000/01/01 ok
  Assets  $1
  Equity  -$1
2000/01/02 broken
  Assets  $1
  Equity  -$2
";
    match parse(text.lines(), None, &Options::default()) {
        Err(ParserError::Commit { header, source, .. }) => {
            assert_eq!(header, "#5 2000/01/02 broken");
            assert_eq!(
                source,
                ModelError::UnbalancedTransaction {
                    currency: "$".into(),
                    sum: dec!(-1)
                }
            );
        }
        other => panic!("unexpected {:?}", other.map(|l| l.transactions.len())),
    }
}

#[test]
fn test_tolerance() {
    let l = ledger(
        "
2000/01/01 rounding
  Assets  $0.3333333
  Assets  $0.3333333
  Assets  $0.3333333
  Equity  -$1
",
    );
    assert_eq!(value(&l, "Assets", "$"), dec!(0.9999999));
}

#[test]
fn test_daily_periodic() {
    let l = ledger(
        "
1999/12/31 start
  Equity  $0
  Assets
~daily
  Assets:Credit:D  -$1
  Expenses:Interest
2000/12/31 end
  Equity  $0
  Assets
",
    );
    assert_eq!(value(&l, "Assets:Credit:D", "$"), dec!(-366));
    assert_eq!(value(&l, "Expenses:Interest", "$"), dec!(366));
    assert_eq!(l.transactions.len(), 2 + 366);
    assert_eq!(l.transactions[1].title, "daily");
    assert_eq!(l.transactions.last().unwrap().title, "end");
}

#[test]
fn test_monthly_periodic() {
    let l = ledger(
        "
2000/01/15 start
  Equity  $0
  Assets
~monthly rent
  Expenses:Rent  $500
  Assets:Bank
2000/03/31 end
  Equity  $0
  Assets
",
    );
    let dates: Vec<String> = l
        .transactions
        .iter()
        .filter(|t| t.title == "monthly rent")
        .map(|t| t.date_identifier(2))
        .collect();
    assert_eq!(dates, vec!["2000/02/01", "2000/03/01"]);
    assert_eq!(value(&l, "Assets:Bank", "$"), dec!(-1000));
}

#[test]
fn test_automatic_transactions() {
    let l = ledger(
        "
= Expenses:Food
  Budget:Food  -1
  Budget:Available  1
2000/01/01 groceries
  Expenses:Food:Market  $25
  Assets
2000/01/02 rent
  Expenses:Rent  $500
  Assets
",
    );
    assert_eq!(value(&l, "Budget:Food", "$"), dec!(-25));
    assert_eq!(value(&l, "Budget:Available", "$"), dec!(25));
    assert_eq!(value(&l, "Assets", "$"), dec!(-525));
    assert_eq!(l.transactions[0].items().len(), 4);
}

#[test]
fn test_periodic_triggers_automatic() {
    let l = ledger(
        "
= Expenses
  Budget  -1
2000/01/15 start
  Equity  $0
  Assets
~monthly rent
  Expenses:Rent  $500
  Assets:Bank
2000/03/31 end
  Equity  $0
  Assets
",
    );
    assert_eq!(value(&l, "Budget", "$"), dec!(-1000));
    assert_eq!(value(&l, "Expenses:Rent", "$"), dec!(1000));
    assert_eq!(value(&l, "Assets:Bank", "$"), dec!(0));
    let rent = l.transactions.iter().find(|t| t.title == "monthly rent").unwrap();
    assert_eq!(rent.items().len(), 3);
}

#[test]
fn test_overflow_is_an_error() {
    let text = "
2000/01/01 a
  Assets  $79228162514264337593543950335
  Assets  $79228162514264337593543950335
  Equity
";
    let err = parse(text.lines(), None, &Options::default()).unwrap_err();
    assert!(matches!(
        err,
        ParserError::Commit {
            source: ModelError::InvalidAmount(_),
            ..
        }
    ));
}

#[test]
fn test_price_directive() {
    let l = ledger(
        "
P 2000/01/01 EUR $1.25
2000/01/01 x
  Assets  EUR 10
  Equity
",
    );
    assert_eq!(l.accounts.market_price("EUR", "$"), Ok(dec!(1.25)));
    assert_eq!(l.accounts.market_price("$", "EUR"), Ok(dec!(0.8)));
}

#[test]
fn test_end_bound() {
    let text = "
2000/01/01 a
  Assets  $1
  Equity
2000/06/01 b
  Assets  $2
  Equity
";
    let options = Options {
        end: chrono::NaiveDate::from_ymd_opt(2000, 3, 1),
        ..Default::default()
    };
    let l = parse(text.lines(), None, &options).unwrap();
    assert_eq!(l.transactions.len(), 1);
    assert_eq!(value(&l, "Assets", "$"), dec!(1));
}

#[test]
fn test_malformed_line() {
    let text = "
2000/01/01 a
  Assets  $1
  Equity
Payee: unknown
";
    match parse(text.lines(), None, &Options::default()) {
        Err(ParserError::MalformedLine { line, text, .. }) => {
            assert_eq!(line, 5);
            assert_eq!(text, "Payee: unknown");
        }
        other => panic!("unexpected {:?}", other.map(|l| l.transactions.len())),
    }
}

#[test]
fn test_idempotent() {
    let text = "
2000/01/01 a
  Assets:Bank  $1,000
  Equity
2000/01/02 b
  Assets:Broker  3 STOCK @ $7
  Assets:Bank
";
    let first = ledger(text);
    let second = ledger(text);
    assert_eq!(first.accounts, second.accounts);
    assert_eq!(first.transactions, second.transactions);
    assert_eq!(value(&first, "Assets", "$"), dec!(979));
}

#[test]
fn test_dates() {
    let l = ledger(
        "
2000/03/01 b
  Assets  $1
  Equity
2000/01/01 a
  Assets  $1
  Equity
",
    );
    assert_eq!(l.min_date(), chrono::NaiveDate::from_ymd_opt(2000, 1, 1));
    assert_eq!(l.max_date(), chrono::NaiveDate::from_ymd_opt(2000, 3, 1));
    assert_eq!(l.transactions_from(l.max_date()).count(), 1);
    assert!(l.accounts.prices().is_empty());
}
