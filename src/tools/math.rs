// tools/math.rs
use super::{parse_args, to_value};
use crate::error::ToolError;
use crate::tool::Tool;
use serde::Deserialize;

/// Evaluates an arithmetic expression.
///
/// Supports numbers, parentheses, unary `+`/`-` and the binary operators
/// `+ - * / // % **`, with the usual precedence (`**` binds tighter than a
/// leading minus and is right associative).
pub fn calculate_expression(expression: &str) -> Result<f64, ToolError> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;

    if let Some(token) = parser.peek() {
        return Err(invalid(format!("unexpected {:?}", token)));
    }
    if !value.is_finite() {
        return Err(invalid("result is not a finite number"));
    }
    Ok(value)
}

pub fn add_numbers(a: f64, b: f64) -> f64 {
    a + b
}

pub fn multiply_numbers(a: f64, b: f64) -> f64 {
    a * b
}

pub fn divide_numbers(a: f64, b: f64) -> Result<f64, ToolError> {
    if b == 0.0 {
        return Err(ToolError::failed("Cannot divide by zero"));
    }
    Ok(a / b)
}

pub fn calculate_average(numbers: &[f64]) -> Result<f64, ToolError> {
    if numbers.is_empty() {
        return Err(ToolError::failed("Cannot calculate average of empty list"));
    }
    Ok(numbers.iter().sum::<f64>() / numbers.len() as f64)
}

fn invalid(reason: impl std::fmt::Display) -> ToolError {
    ToolError::failed(format!("Invalid expression: {}", reason))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    Power,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ToolError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' => {
                i += 1;
                continue;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| invalid(format!("bad number '{}'", literal)))?;
                tokens.push(Token::Number(value));
                continue;
            }
            '+' => tokens.push(Token::Plus),
            '-' => tokens.push(Token::Minus),
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Power);
                i += 1;
            }
            '*' => tokens.push(Token::Star),
            '/' if chars.get(i + 1) == Some(&'/') => {
                tokens.push(Token::DoubleSlash);
                i += 1;
            }
            '/' => tokens.push(Token::Slash),
            '%' => tokens.push(Token::Percent),
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            other => return Err(invalid(format!("unexpected character '{}'", other))),
        }
        i += 1;
    }

    if tokens.is_empty() {
        return Err(invalid("empty expression"));
    }
    Ok(tokens)
}

/// Deepest nesting of parentheses, signs and exponents the parser accepts.
const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Result<f64, ToolError> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ToolError> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::DoubleSlash | Token::Percent)) =
            self.peek()
        {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match op {
                Token::Star => value * rhs,
                _ if rhs == 0.0 => return Err(invalid("division by zero")),
                Token::Slash => value / rhs,
                Token::DoubleSlash => (value / rhs).floor(),
                // Result takes the sign of the divisor.
                _ => value - rhs * (value / rhs).floor(),
            };
        }
        Ok(value)
    }

    /// Every recursive path of the grammar passes through here, so the depth
    /// check bounds the parser's stack use.
    fn unary(&mut self) -> Result<f64, ToolError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(invalid("expression nested too deeply"));
        }
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64, ToolError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, ToolError> {
        let base = self.atom()?;
        if self.peek() == Some(Token::Power) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, ToolError> {
        match self.next() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(invalid("missing ')'")),
                }
            }
            Some(token) => Err(invalid(format!("unexpected {:?}", token))),
            None => Err(invalid("unexpected end of input")),
        }
    }
}

#[derive(Deserialize)]
struct ExpressionArgs {
    expression: String,
}

#[derive(Deserialize)]
struct PairArgs {
    a: f64,
    b: f64,
}

#[derive(Deserialize)]
struct NumbersArgs {
    numbers: Vec<f64>,
}

pub fn calculate_expression_tool() -> Tool {
    Tool::new(
        "calculate_expression",
        "Evaluate mathematical expressions",
        |args| {
            let params: ExpressionArgs = parse_args(args)?;
            to_value(&calculate_expression(&params.expression)?)
        },
    )
    .with_parameter("expression", "str")
}

pub fn add_numbers_tool() -> Tool {
    Tool::new("add_numbers", "Add two numbers", |args| {
        let params: PairArgs = parse_args(args)?;
        to_value(&add_numbers(params.a, params.b))
    })
    .with_parameter("a", "float")
    .with_parameter("b", "float")
}

pub fn multiply_numbers_tool() -> Tool {
    Tool::new("multiply_numbers", "Multiply two numbers", |args| {
        let params: PairArgs = parse_args(args)?;
        to_value(&multiply_numbers(params.a, params.b))
    })
    .with_parameter("a", "float")
    .with_parameter("b", "float")
}

pub fn divide_numbers_tool() -> Tool {
    Tool::new("divide_numbers", "Divide two numbers", |args| {
        let params: PairArgs = parse_args(args)?;
        to_value(&divide_numbers(params.a, params.b)?)
    })
    .with_parameter("a", "float")
    .with_parameter("b", "float")
}

pub fn calculate_average_tool() -> Tool {
    Tool::new(
        "calculate_average",
        "Calculate average of a list of numbers",
        |args| {
            let params: NumbersArgs = parse_args(args)?;
            to_value(&calculate_average(&params.numbers)?)
        },
    )
    .with_parameter("numbers", "List[float]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{Args, ToolOutcome};
    use serde_json::json;

    #[test]
    fn test_precedence() {
        assert_eq!(calculate_expression("2**10 + 3*5").unwrap(), 1039.0);
        assert_eq!(calculate_expression("(1 + 2) * 3").unwrap(), 9.0);
        assert_eq!(calculate_expression("2 ** 3 ** 2").unwrap(), 512.0);
        assert_eq!(calculate_expression("-2**2").unwrap(), -4.0);
        assert_eq!(calculate_expression("2**-1").unwrap(), 0.5);
        assert_eq!(calculate_expression("7 // 2 + 7 % 3").unwrap(), 4.0);
        assert_eq!(calculate_expression("-7 % 3").unwrap(), 2.0);
        assert_eq!(calculate_expression("1.5 * 4").unwrap(), 6.0);
    }

    #[test]
    fn test_invalid_expressions() {
        for expression in ["", "1 +", "(1 + 2", "1 / 0", "2 $ 3", "1 2", "1..2"] {
            let err = calculate_expression(expression).unwrap_err();
            assert!(err.to_string().starts_with("Invalid expression"), "{}", expression);
        }
    }

    #[test]
    fn test_nesting_is_bounded() {
        let shallow = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(calculate_expression(&shallow).unwrap(), 1.0);
        assert_eq!(calculate_expression(&format!("{}1", "-".repeat(100))).unwrap(), 1.0);

        let parens = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        let signs = format!("{}1", "-".repeat(100_000));
        let powers = vec!["2"; 100_000].join("**");
        for expression in [parens, signs, powers] {
            let mut args = Args::new();
            args.insert("expression".to_string(), json!(expression));
            let outcome = calculate_expression_tool().execute(&args);
            assert_eq!(
                outcome.error(),
                Some("Invalid expression: expression nested too deeply")
            );
        }
    }

    #[test]
    fn test_divide_and_average() {
        assert_eq!(divide_numbers(9.0, 3.0).unwrap(), 3.0);
        assert!(divide_numbers(1.0, 0.0).is_err());
        assert_eq!(calculate_average(&[1.0, 2.0, 3.0]).unwrap(), 2.0);
        assert!(calculate_average(&[]).is_err());
        assert_eq!(add_numbers(1.5, 2.5), 4.0);
        assert_eq!(multiply_numbers(1.5, 2.0), 3.0);
    }

    #[test]
    fn test_tool_wrapping() {
        let mut args = Args::new();
        args.insert("a".to_string(), json!(1));
        args.insert("b".to_string(), json!(0));
        let outcome = divide_numbers_tool().execute(&args);
        assert_eq!(outcome.error(), Some("Cannot divide by zero"));

        let mut args = Args::new();
        args.insert("expression".to_string(), json!("6 * 7"));
        let outcome = calculate_expression_tool().execute(&args);
        assert_eq!(outcome, ToolOutcome::Success { result: json!(42.0) });
    }
}
