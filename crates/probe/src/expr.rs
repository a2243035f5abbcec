//! Restricted expression grammar for user-supplied predicates and
//! transforms.
//!
//! This replaces "hand the string to the host language" with a small,
//! closed grammar: no function calls, no assignment, no recursion, nothing
//! that can touch anything outside the bound variables. Supported syntax:
//!
//! - literals: `null`, `true`, `false`, numbers, `"text"` / `'text'`
//! - variables: whatever the operation binds (`item`, `key`, `index`,
//!   `value`, `acc`, `a`, `b`)
//! - access: `item.field`, `item["field"]`, `item[0]`, plus the `.length`
//!   pseudo-field on strings, arrays, and objects
//! - operators: `!` `-` (unary), `* / %`, `+ -` (`+` also concatenates
//!   strings), `== != < <= > >=`, `&& ||` (short-circuit, returning the
//!   deciding operand), parentheses
//!
//! `null` and `false` are falsy, everything else is truthy. Missing fields
//! and out-of-range indices evaluate to `null` rather than failing, so
//! predicates over ragged data stay usable.

use serde_json::{Number, Value};

use crate::error::{ProbeError, Result};

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal(Value),
    /// Bound variable reference
    Var(String),
    /// Field access: `expr.name` or `expr["name"]`
    Member(Box<Expr>, String),
    /// Array index access: `expr[0]`
    Index(Box<Expr>, usize),
    /// Logical negation: `!expr`
    Not(Box<Expr>),
    /// Numeric negation: `-expr`
    Neg(Box<Expr>),
    /// Binary operation
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Variable bindings for one evaluation.
#[derive(Debug, Default)]
pub struct Scope<'a> {
    vars: Vec<(&'static str, &'a Value)>,
}

impl<'a> Scope<'a> {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    pub fn bind(mut self, name: &'static str, value: &'a Value) -> Self {
        self.vars.push((name, value));
        self
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        self.vars
            .iter()
            .rev()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }
}

/// Falsiness follows JSON: only `null` and `false` are falsy.
pub fn truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

impl Expr {
    /// Parse an expression string.
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = Parser::new(input);
        let expr = parser.parse_or()?;
        parser.skip_ws();
        if !parser.is_eof() {
            return Err(ProbeError::expression(format!(
                "unexpected input at position {}: '{}'",
                parser.pos,
                parser.rest().chars().take(12).collect::<String>()
            )));
        }
        Ok(expr)
    }

    /// Evaluate against a scope of bound variables.
    pub fn eval(&self, scope: &Scope<'_>) -> Result<Value> {
        match self {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Var(name) => scope.get(name).cloned().ok_or_else(|| {
                ProbeError::expression(format!("unknown variable '{name}'"))
            }),
            Expr::Member(target, field) => {
                let target = target.eval(scope)?;
                Ok(member(&target, field))
            }
            Expr::Index(target, index) => {
                let target = target.eval(scope)?;
                Ok(match target {
                    Value::Array(items) => items.get(*index).cloned().unwrap_or(Value::Null),
                    _ => Value::Null,
                })
            }
            Expr::Not(inner) => Ok(Value::Bool(!truthy(&inner.eval(scope)?))),
            Expr::Neg(inner) => {
                let v = inner.eval(scope)?;
                let n = as_number(&v, "unary '-'")?;
                number_value(-n)
            }
            Expr::Binary(op, left, right) => eval_binary(*op, left, right, scope),
        }
    }
}

fn member(target: &Value, field: &str) -> Value {
    if field == "length" {
        let len = match target {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            Value::Object(map) => Some(map.len()),
            _ => None,
        };
        if let Some(len) = len {
            return Value::Number(Number::from(len));
        }
    }
    match target {
        Value::Object(map) => map.get(field).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn eval_binary(op: BinOp, left: &Expr, right: &Expr, scope: &Scope<'_>) -> Result<Value> {
    // Short-circuit forms first. These return the deciding operand, not a
    // coerced boolean, so `x || fallback` and `cond && value` work as
    // selection idioms.
    match op {
        BinOp::And => {
            let lhs = left.eval(scope)?;
            return if truthy(&lhs) { right.eval(scope) } else { Ok(lhs) };
        }
        BinOp::Or => {
            let lhs = left.eval(scope)?;
            return if truthy(&lhs) { Ok(lhs) } else { right.eval(scope) };
        }
        _ => {}
    }

    let lhs = left.eval(scope)?;
    let rhs = right.eval(scope)?;
    match op {
        BinOp::Eq => Ok(Value::Bool(values_equal(&lhs, &rhs))),
        BinOp::Ne => Ok(Value::Bool(!values_equal(&lhs, &rhs))),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = compare(&lhs, &rhs);
            Ok(Value::Bool(match (op, ordering) {
                (BinOp::Lt, Some(o)) => o.is_lt(),
                (BinOp::Le, Some(o)) => o.is_le(),
                (BinOp::Gt, Some(o)) => o.is_gt(),
                (BinOp::Ge, Some(o)) => o.is_ge(),
                // Mismatched or unordered types never compare.
                _ => false,
            }))
        }
        BinOp::Add => {
            if let (Value::String(a), Value::String(b)) = (&lhs, &rhs) {
                return Ok(Value::String(format!("{a}{b}")));
            }
            number_value(as_number(&lhs, "'+'")? + as_number(&rhs, "'+'")?)
        }
        BinOp::Sub => number_value(as_number(&lhs, "'-'")? - as_number(&rhs, "'-'")?),
        BinOp::Mul => number_value(as_number(&lhs, "'*'")? * as_number(&rhs, "'*'")?),
        BinOp::Div => number_value(as_number(&lhs, "'/'")? / as_number(&rhs, "'/'")?),
        BinOp::Rem => number_value(as_number(&lhs, "'%'")? % as_number(&rhs, "'%'")?),
        BinOp::And | BinOp::Or => unreachable!("handled above"),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn as_number(value: &Value, context: &str) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        ProbeError::expression(format!(
            "{context} requires a number, found {}",
            crate::value::type_name(value)
        ))
    })
}

fn number_value(n: f64) -> Result<Value> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9e15 {
        return Ok(Value::Number(Number::from(n as i64)));
    }
    Number::from_f64(n)
        .map(Value::Number)
        .ok_or_else(|| ProbeError::expression("arithmetic produced a non-finite number"))
}

/// Recursive-descent parser state.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.next();
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == expected => {
                self.next();
                Ok(())
            }
            Some(c) => Err(ProbeError::expression(format!(
                "expected '{expected}', found '{c}' at position {}",
                self.pos
            ))),
            None => Err(ProbeError::expression(format!(
                "expected '{expected}', found end of input"
            ))),
        }
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.eat("||") {
            let right = self.parse_and()?;
            left = Expr::Binary(BinOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_comparison()?;
        while self.eat("&&") {
            let right = self.parse_comparison()?;
            left = Expr::Binary(BinOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_additive()?;
        // Two-char operators before their one-char prefixes.
        let op = if self.eat("==") {
            BinOp::Eq
        } else if self.eat("!=") {
            BinOp::Ne
        } else if self.eat("<=") {
            BinOp::Le
        } else if self.eat(">=") {
            BinOp::Ge
        } else if self.eat("<") {
            BinOp::Lt
        } else if self.eat(">") {
            BinOp::Gt
        } else {
            return Ok(left);
        };
        let right = self.parse_additive()?;
        Ok(Expr::Binary(op, Box::new(left), Box::new(right)))
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = if self.eat("+") {
                BinOp::Add
            } else if self.eat("-") {
                BinOp::Sub
            } else {
                return Ok(left);
            };
            let right = self.parse_multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = if self.eat("*") {
                BinOp::Mul
            } else if self.eat("/") {
                BinOp::Div
            } else if self.eat("%") {
                BinOp::Rem
            } else {
                return Ok(left);
            };
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        self.skip_ws();
        if self.eat("!") {
            return Ok(Expr::Not(Box::new(self.parse_unary()?)));
        }
        if self.eat("-") {
            return Ok(Expr::Neg(Box::new(self.parse_unary()?)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            self.skip_ws();
            if self.eat(".") {
                let field = self.parse_identifier()?;
                expr = Expr::Member(Box::new(expr), field);
            } else if self.eat("[") {
                self.skip_ws();
                expr = match self.peek() {
                    Some('"') | Some('\'') => {
                        let key = self.parse_string()?;
                        Expr::Member(Box::new(expr), key)
                    }
                    _ => {
                        let index = self.parse_index()?;
                        Expr::Index(Box::new(expr), index)
                    }
                };
                self.expect(']')?;
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        self.skip_ws();
        if self.eat("(") {
            let inner = self.parse_or()?;
            self.expect(')')?;
            return Ok(inner);
        }
        match self.peek() {
            Some('"') | Some('\'') => Ok(Expr::Literal(Value::String(self.parse_string()?))),
            Some(c) if c.is_ascii_digit() => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' => {
                let word = self.parse_identifier()?;
                Ok(match word.as_str() {
                    "null" => Expr::Literal(Value::Null),
                    "true" => Expr::Literal(Value::Bool(true)),
                    "false" => Expr::Literal(Value::Bool(false)),
                    _ => Expr::Var(word),
                })
            }
            Some(c) => Err(ProbeError::expression(format!(
                "unexpected character '{c}' at position {}",
                self.pos
            ))),
            None => Err(ProbeError::expression("unexpected end of expression")),
        }
    }

    fn parse_identifier(&mut self) -> Result<String> {
        self.skip_ws();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.next();
        }
        if self.pos == start {
            return Err(ProbeError::expression(format!(
                "expected identifier at position {start}"
            )));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_string(&mut self) -> Result<String> {
        let quote = self.next().ok_or_else(|| {
            ProbeError::expression("unexpected end of expression in string")
        })?;
        let mut out = String::new();
        loop {
            match self.next() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => {
                        return Err(ProbeError::expression("unterminated string literal"))
                    }
                },
                Some(c) => out.push(c),
                None => return Err(ProbeError::expression("unterminated string literal")),
            }
        }
    }

    fn parse_number(&mut self) -> Result<Expr> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        {
            self.next();
        }
        let text = &self.input[start..self.pos];
        let n: f64 = text.parse().map_err(|_| {
            ProbeError::expression(format!("invalid number '{text}' at position {start}"))
        })?;
        Ok(Expr::Literal(number_value(n)?))
    }

    fn parse_index(&mut self) -> Result<usize> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.next();
        }
        self.input[start..self.pos].parse().map_err(|_| {
            ProbeError::expression(format!("expected array index at position {start}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn eval_with_item(source: &str, item: &Value) -> Result<Value> {
        Expr::parse(source)?.eval(&Scope::new().bind("item", item))
    }

    #[test]
    fn literals_and_arithmetic() {
        let item = json!(null);
        assert_eq!(eval_with_item("1 + 2 * 3", &item).unwrap(), json!(7));
        assert_eq!(eval_with_item("(1 + 2) * 3", &item).unwrap(), json!(9));
        assert_eq!(eval_with_item("10 % 4", &item).unwrap(), json!(2));
        assert_eq!(eval_with_item("-5 + 1", &item).unwrap(), json!(-4));
        assert_eq!(eval_with_item("1.5 + 1", &item).unwrap(), json!(2.5));
        assert_eq!(
            eval_with_item("'a' + 'b'", &item).unwrap(),
            json!("ab")
        );
    }

    #[test]
    fn member_and_index_access() {
        let item = json!({"name": "ada", "tags": ["x", "y"], "meta": {"n": 3}});
        assert_eq!(eval_with_item("item.name", &item).unwrap(), json!("ada"));
        assert_eq!(eval_with_item("item.tags[1]", &item).unwrap(), json!("y"));
        assert_eq!(eval_with_item("item['meta'].n", &item).unwrap(), json!(3));
        assert_eq!(eval_with_item("item.tags.length", &item).unwrap(), json!(2));
        assert_eq!(eval_with_item("item.name.length", &item).unwrap(), json!(3));
        // Missing fields and out-of-range indices are null, not errors.
        assert_eq!(eval_with_item("item.absent", &item).unwrap(), json!(null));
        assert_eq!(eval_with_item("item.tags[9]", &item).unwrap(), json!(null));
    }

    #[test]
    fn comparisons_and_logic() {
        let item = json!({"age": 31, "name": "ada"});
        for (src, expected) in [
            ("item.age > 30", true),
            ("item.age >= 31", true),
            ("item.age < 31", false),
            ("item.age == 31", true),
            ("item.age != 31", false),
            ("item.name == 'ada'", true),
            ("item.name > 'aaa'", true),
            ("item.age > 30 && item.name == 'ada'", true),
            ("item.age > 40 || item.name == 'ada'", true),
            ("!(item.age > 30)", false),
            // Mismatched types never order.
            ("item.name > 5", false),
            ("item.absent == null", true),
        ] {
            assert_eq!(
                eval_with_item(src, &item).unwrap(),
                json!(expected),
                "{src}"
            );
        }
    }

    #[test]
    fn and_or_return_the_deciding_operand() {
        let item = json!({"n": 5});
        assert_eq!(
            eval_with_item("item.missing || 'fallback'", &item).unwrap(),
            json!("fallback")
        );
        assert_eq!(eval_with_item("item.n || 0", &item).unwrap(), json!(5));
        assert_eq!(
            eval_with_item("item.n && item.n * 2", &item).unwrap(),
            json!(10)
        );
        assert_eq!(eval_with_item("item.missing && 1", &item).unwrap(), json!(null));
    }

    #[test]
    fn integer_results_stay_integers() {
        let item = json!(null);
        assert_eq!(eval_with_item("4 / 2", &item).unwrap(), json!(2));
        assert_eq!(eval_with_item("5 / 2", &item).unwrap(), json!(2.5));
    }

    #[test]
    fn parse_errors_are_reported() {
        assert!(Expr::parse("item .. name").is_err());
        assert!(Expr::parse("1 +").is_err());
        assert!(Expr::parse("(1").is_err());
        assert!(Expr::parse("'open").is_err());
        assert!(Expr::parse("a b").is_err());
    }

    #[test]
    fn eval_errors_are_reported() {
        let item = json!({"name": "ada"});
        assert!(eval_with_item("item.name * 2", &item).is_err());
        assert!(eval_with_item("nope + 1", &item).is_err());
        assert!(eval_with_item("1 / 0", &item).is_err());
    }
}
