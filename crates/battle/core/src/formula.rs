//! Arithmetic formulas carried by skill data.
//!
//! Grammar:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := number | dice | variable | '(' expr ')' | '-' factor
//! ```
//!
//! Variables: `level`, `prof`, `str`, `dex`, `con`, `int`, `wis`, `cha`
//! (ability modifiers), `hp`, `maxhp`. Dice terms (`2d6`) evaluate to their
//! average. The result is floored. Anything that fails to parse or divides by
//! zero evaluates to 0.

use tracing::warn;

use crate::dice::DiceExpr;
use crate::state::{Ability, Participant};

/// Variable bindings for one evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FormulaVars {
    pub level: i64,
    pub proficiency: i64,
    pub modifiers: [i64; 6],
    pub hp: i64,
    pub max_hp: i64,
}

impl FormulaVars {
    pub fn of(participant: &Participant) -> Self {
        let mut modifiers = [0; 6];
        for (slot, ability) in modifiers.iter_mut().zip(Ability::ALL) {
            *slot = i64::from(participant.modifier(ability));
        }
        Self {
            level: i64::from(participant.level),
            proficiency: i64::from(participant.proficiency),
            modifiers,
            hp: i64::from(participant.current_hp),
            max_hp: i64::from(participant.max_hp),
        }
    }

    fn lookup(&self, name: &str) -> Option<f64> {
        let value = match name {
            "level" | "lvl" => self.level,
            "prof" | "proficiency" => self.proficiency,
            "hp" => self.hp,
            "maxhp" | "max_hp" => self.max_hp,
            other => {
                let ability: Ability = other.parse().ok()?;
                let index = Ability::ALL.iter().position(|a| *a == ability)?;
                self.modifiers[index]
            }
        };
        Some(value as f64)
    }
}

/// Evaluates `formula`, returning 0 on any error.
pub fn evaluate(formula: &str, vars: &FormulaVars) -> i64 {
    match try_evaluate(formula, vars) {
        Some(value) => value,
        None => {
            warn!(formula, "unparsable formula, treating as 0");
            0
        }
    }
}

/// Evaluates `formula`, returning `None` on any error.
pub fn try_evaluate(formula: &str, vars: &FormulaVars) -> Option<i64> {
    let tokens = tokenize(formula)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        vars,
    };
    let value = parser.expr()?;
    if parser.pos != tokens.len() || !value.is_finite() {
        return None;
    }
    Some(value.floor() as i64)
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Word(String),
    Op(char),
    Open,
    Close,
}

fn tokenize(input: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' | '-' | '*' | '/' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            c if c.is_ascii_alphanumeric() || c == '_' || c == '.' => {
                let mut word = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' || next == '.' {
                        word.push(next.to_ascii_lowercase());
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(classify(word)?);
            }
            _ => return None,
        }
    }
    Some(tokens)
}

fn classify(word: String) -> Option<Token> {
    if let Ok(number) = word.parse::<f64>() {
        return Some(Token::Number(number));
    }
    let starts_numeric = word.starts_with(|c: char| c.is_ascii_digit());
    if word.starts_with('d') && word[1..].chars().all(|c| c.is_ascii_digit()) && word.len() > 1
        || starts_numeric
    {
        let dice = DiceExpr::parse(&word);
        if dice.is_empty() {
            return None;
        }
        return Some(Token::Number(dice.average()));
    }
    Some(Token::Word(word))
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    vars: &'a FormulaVars,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Option<f64> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Some(value)
    }

    fn term(&mut self) -> Option<f64> {
        let mut value = self.factor()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.factor()?;
            value = if op == '*' {
                value * rhs
            } else {
                if rhs == 0.0 {
                    return None;
                }
                value / rhs
            };
        }
        Some(value)
    }

    fn factor(&mut self) -> Option<f64> {
        match self.next()? {
            Token::Number(value) => Some(value),
            Token::Word(name) => self.vars.lookup(&name),
            Token::Op('-') => self.factor().map(|value| -value),
            Token::Open => {
                let value = self.expr()?;
                match self.next()? {
                    Token::Close => Some(value),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> FormulaVars {
        FormulaVars {
            level: 5,
            proficiency: 3,
            modifiers: [2, 1, 0, -1, 4, 0],
            hp: 12,
            max_hp: 30,
        }
    }

    #[test]
    fn precedence_and_parentheses() {
        assert_eq!(evaluate("2 + 3 * 4", &vars()), 14);
        assert_eq!(evaluate("(2 + 3) * 4", &vars()), 20);
        assert_eq!(evaluate("-3 + 10", &vars()), 7);
        assert_eq!(evaluate("7 / 2", &vars()), 3);
    }

    #[test]
    fn variables_and_dice() {
        assert_eq!(evaluate("level * 2 + STR", &vars()), 12);
        assert_eq!(evaluate("prof + wis", &vars()), 7);
        assert_eq!(evaluate("maxhp - hp", &vars()), 18);
        assert_eq!(evaluate("2d6 + level", &vars()), 12);
    }

    #[test]
    fn failures_evaluate_to_zero() {
        assert_eq!(evaluate("level +", &vars()), 0);
        assert_eq!(evaluate("mana * 2", &vars()), 0);
        assert_eq!(evaluate("4 / (level - 5)", &vars()), 0);
        assert_eq!(evaluate("(1 + 2", &vars()), 0);
        assert_eq!(evaluate("3 $ 4", &vars()), 0);
        assert_eq!(try_evaluate("", &vars()), None);
    }
}
