//! Condition DSL parser.
//!
//! Recursive descent parser for the condition grammar. Converts text to AST
//! with meaningful error messages including character offset, expected/found
//! tokens.
//!
//! ```text
//! condition := CROSS_ABOVE(op, op) | CROSS_BELOW(op, op)
//!            | ABOVE(op, op) | BELOW(op, op)
//!            | BETWEEN(op, number, number)
//!            | RISING(op) | FALLING(op)
//!            | STACKED(op, op, ...)
//!            | AND(condition, condition, ...) | OR(...) | NOT(condition)
//! op        := number | FIELD | number * FIELD | FIELD * number
//! ```

use crate::domain::condition::{Condition, Field, Operand};
use crate::domain::error::ParseError;

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn error(&self, message: String) -> ParseError {
        ParseError {
            message,
            position: self.pos,
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(self.error(format!("expected '{}', found '{}'", expected, ch))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn consume_char(&mut self, ch: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        let remaining = self.remaining();
        remaining.starts_with(keyword)
            && !remaining[keyword.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '_')
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if self.peek_keyword(keyword) {
            self.pos += keyword.len();
            Ok(())
        } else {
            let found = self.peek_word();
            Err(self.error(format!("expected '{}', found '{}'", keyword, found)))
        }
    }

    fn peek_word(&self) -> String {
        let word: String = self
            .remaining()
            .chars()
            .take_while(|ch| ch.is_alphanumeric() || *ch == '_')
            .collect();
        if word.is_empty() {
            self.peek()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "end of input".to_string())
        } else {
            word
        }
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut has_dot = false;
        let mut digits = 0;

        if self.peek() == Some('-') {
            self.advance();
        }

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected number".to_string(),
                position: start,
            });
        }

        let num_str = &self.input[start..self.pos];
        num_str.parse::<f64>().map_err(|_| ParseError {
            message: format!("invalid number: {}", num_str),
            position: start,
        })
    }

    fn parse_field(&mut self) -> Result<Field, ParseError> {
        self.skip_whitespace();
        let word = self.peek_word();
        match Field::from_name(&word) {
            Some(field) => {
                self.pos += word.len();
                Ok(field)
            }
            None => Err(self.error(format!("unknown field '{}'", word))),
        }
    }

    fn parse_operand(&mut self) -> Result<Operand, ParseError> {
        self.skip_whitespace();

        if self
            .peek()
            .is_some_and(|ch| ch.is_ascii_digit() || ch == '-' || ch == '.')
        {
            let num = self.parse_number()?;
            if self.consume_char('*') {
                let field = self.parse_field()?;
                return Ok(Operand::Scaled { factor: num, field });
            }
            return Ok(Operand::Constant(num));
        }

        let field = self.parse_field()?;
        if self.consume_char('*') {
            let factor = self.parse_number()?;
            return Ok(Operand::Scaled { factor, field });
        }
        Ok(Operand::Field(field))
    }

    fn parse_comparison(&mut self, keyword: &str) -> Result<Condition, ParseError> {
        self.expect_keyword(keyword)?;
        self.expect_char('(')?;

        let left = self.parse_operand()?;
        self.expect_char(',')?;
        let right = self.parse_operand()?;
        self.expect_char(')')?;

        Ok(match keyword {
            "CROSS_ABOVE" => Condition::CrossAbove { left, right },
            "CROSS_BELOW" => Condition::CrossBelow { left, right },
            "ABOVE" => Condition::Above { left, right },
            _ => Condition::Below { left, right },
        })
    }

    fn parse_between(&mut self) -> Result<Condition, ParseError> {
        self.expect_keyword("BETWEEN")?;
        self.expect_char('(')?;

        let operand = self.parse_operand()?;
        self.expect_char(',')?;
        let lower = self.parse_number()?;
        self.expect_char(',')?;
        self.skip_whitespace();
        let upper_pos = self.pos;
        let upper = self.parse_number()?;
        self.expect_char(')')?;

        if lower >= upper {
            return Err(ParseError {
                message: format!("BETWEEN lower bound {} must be below upper {}", lower, upper),
                position: upper_pos,
            });
        }

        Ok(Condition::Between {
            operand,
            lower,
            upper,
        })
    }

    fn parse_unary(&mut self, keyword: &str) -> Result<Condition, ParseError> {
        self.expect_keyword(keyword)?;
        self.expect_char('(')?;
        let operand = self.parse_operand()?;
        self.expect_char(')')?;
        Ok(if keyword == "RISING" {
            Condition::Rising(operand)
        } else {
            Condition::Falling(operand)
        })
    }

    fn parse_stacked(&mut self) -> Result<Condition, ParseError> {
        self.expect_keyword("STACKED")?;
        self.expect_char('(')?;

        let mut operands = vec![self.parse_operand()?];
        while !self.consume_char(')') {
            self.expect_char(',')?;
            operands.push(self.parse_operand()?);
        }

        if operands.len() < 2 {
            return Err(self.error("STACKED requires at least 2 operands".to_string()));
        }
        Ok(Condition::Stacked(operands))
    }

    fn parse_list(&mut self, keyword: &str) -> Result<Vec<Condition>, ParseError> {
        self.expect_keyword(keyword)?;
        self.expect_char('(')?;

        let mut conditions = vec![self.parse_condition()?];
        while !self.consume_char(')') {
            self.expect_char(',')?;
            conditions.push(self.parse_condition()?);
        }

        if conditions.len() < 2 {
            return Err(self.error(format!("{} requires at least 2 conditions", keyword)));
        }
        Ok(conditions)
    }

    fn parse_not(&mut self) -> Result<Condition, ParseError> {
        self.expect_keyword("NOT")?;
        self.expect_char('(')?;
        let condition = self.parse_condition()?;
        self.expect_char(')')?;
        Ok(Condition::Not(Box::new(condition)))
    }

    fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        self.skip_whitespace();

        for keyword in ["CROSS_ABOVE", "CROSS_BELOW", "ABOVE", "BELOW"] {
            if self.peek_keyword(keyword) {
                return self.parse_comparison(keyword);
            }
        }
        if self.peek_keyword("BETWEEN") {
            return self.parse_between();
        }
        if self.peek_keyword("RISING") {
            return self.parse_unary("RISING");
        }
        if self.peek_keyword("FALLING") {
            return self.parse_unary("FALLING");
        }
        if self.peek_keyword("STACKED") {
            return self.parse_stacked();
        }
        if self.peek_keyword("AND") {
            return Ok(Condition::And(self.parse_list("AND")?));
        }
        if self.peek_keyword("OR") {
            return Ok(Condition::Or(self.parse_list("OR")?));
        }
        if self.peek_keyword("NOT") {
            return self.parse_not();
        }

        let word = self.peek_word();
        Err(self.error(format!("expected condition, found '{}'", word)))
    }

    fn parse(&mut self) -> Result<Condition, ParseError> {
        let condition = self.parse_condition()?;
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(self.error(format!(
                "unexpected input after condition: '{}'",
                self.remaining()
            )));
        }
        Ok(condition)
    }
}

pub fn parse(input: &str) -> Result<Condition, ParseError> {
    let mut parser = Parser::new(input);
    parser.parse()
}
