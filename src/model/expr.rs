//! Evaluation of the arithmetic allowed inside parenthesized amounts:
//! decimal literals, `+ - * /`, unary minus and nested parentheses.

use std::iter::Peekable;
use std::str::CharIndices;

use rust_decimal::Decimal;

use super::error::ModelError;

type Result<T> = std::result::Result<T, ModelError>;

pub fn evaluate(text: &str) -> Result<Decimal> {
    let mut e = Evaluator {
        text,
        chars: text.char_indices().peekable(),
    };
    let res = e.expression()?;
    e.skip_space();
    match e.current() {
        None => Ok(res),
        Some(c) => Err(e.error(&format!("unexpected {:?}", c))),
    }
}

struct Evaluator<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Evaluator<'a> {
    fn current(&mut self) -> Option<char> {
        self.chars.peek().map(|t| t.1)
    }

    fn pos(&mut self) -> usize {
        self.chars.peek().map(|t| t.0).unwrap_or(self.text.len())
    }

    fn skip_space(&mut self) {
        while self.current().is_some_and(char::is_whitespace) {
            self.chars.next();
        }
    }

    fn error(&mut self, msg: &str) -> ModelError {
        let pos = self.pos();
        ModelError::InvalidAmount(format!("{} at {} in {:?}", msg, pos, self.text))
    }

    fn expression(&mut self) -> Result<Decimal> {
        let mut res = self.term()?;
        loop {
            self.skip_space();
            let op = match self.current() {
                Some(c @ ('+' | '-')) => c,
                _ => return Ok(res),
            };
            self.chars.next();
            let rhs = self.term()?;
            res = match op {
                '+' => res.checked_add(rhs),
                _ => res.checked_sub(rhs),
            }
            .ok_or_else(|| self.error("overflow"))?;
        }
    }

    fn term(&mut self) -> Result<Decimal> {
        let mut res = self.factor()?;
        loop {
            self.skip_space();
            let op = match self.current() {
                Some(c @ ('*' | '/')) => c,
                _ => return Ok(res),
            };
            self.chars.next();
            let rhs = self.factor()?;
            res = match op {
                '*' => res.checked_mul(rhs).ok_or_else(|| self.error("overflow"))?,
                _ if rhs.is_zero() => return Err(self.error("division by zero")),
                _ => res.checked_div(rhs).ok_or_else(|| self.error("overflow"))?,
            };
        }
    }

    fn factor(&mut self) -> Result<Decimal> {
        self.skip_space();
        match self.current() {
            Some('-') => {
                self.chars.next();
                Ok(-self.factor()?)
            }
            Some('+') => {
                self.chars.next();
                self.factor()
            }
            Some('(') => {
                self.chars.next();
                let res = self.expression()?;
                self.skip_space();
                match self.current() {
                    Some(')') => {
                        self.chars.next();
                        Ok(res)
                    }
                    _ => Err(self.error("unmatched parenthesis")),
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => Err(self.error(&format!("unexpected {:?}", c))),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn number(&mut self) -> Result<Decimal> {
        let start = self.pos();
        while self
            .current()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        {
            self.chars.next();
        }
        let end = self.pos();
        parse_decimal(&self.text[start..end])
    }
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str_exact(s).map_err(|e| ModelError::InvalidAmount(format!("{:?}: {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_evaluate() {
        let tests = [
            ("1", dec!(1)),
            ("(2 * 10)", dec!(20)),
            ("(2 - 10)", dec!(-8)),
            ("(2 + 10)", dec!(12)),
            ("(2 / 10)", dec!(0.2)),
            ("1 + 2 * 3", dec!(7)),
            ("(1 + 2) * 3", dec!(9)),
            ("-(1.5 + 2.5) / 2", dec!(-2)),
            ("10 - 4 - 3", dec!(3)),
            ("--3", dec!(3)),
        ];
        for (test, expected) in tests {
            assert_eq!(evaluate(test), Ok(expected), "{}", test);
        }
    }

    #[test]
    fn test_evaluate_is_exact() {
        assert_eq!(evaluate("0.1 + 0.2"), Ok(dec!(0.3)));
        assert_eq!(evaluate("(1 / 3) * 3").map(|d| d.round_dp(12)), Ok(dec!(1)));
    }

    #[test]
    fn test_evaluate_errors() {
        for test in ["", "(1 + 2", "1 +", "1 / 0", "1 2", "1 $ 2", "1..2", "()"] {
            assert!(evaluate(test).is_err(), "{}", test);
        }
    }
}
