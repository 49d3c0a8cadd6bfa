//! Interface to the reactive expression evaluator that plots the curve.
//!
//! The evaluator is treated as an opaque symbol table: the model writes
//! named expressions into it and observes numeric outputs for a handful of
//! symbols. Writes take effect before the next observed value is delivered.

mod headless;

pub use headless::HeadlessEvaluator;

use serde::{Deserialize, Serialize};

pub const SYMBOL_INITIAL_POPULATION: &str = "N_0";
pub const SYMBOL_RATE: &str = "r";
pub const SYMBOL_CAPACITY: &str = "k";
pub const SYMBOL_TIME: &str = "T";
pub const SYMBOL_POPULATION: &str = "P";
pub const SYMBOL_SLOPE: &str = "m";

pub const EXPR_TIME_POINT: &str = "time-point";
pub const EXPR_CURVE: &str = "curve";
pub const EXPR_CAPACITY_LINE: &str = "capacity-line";
pub const EXPR_SLOPE_LINE: &str = "slope-line";

pub const CURVE_LATEX: &str =
    "N\\left(t\\right)=\\frac{kN_0e^{rt}}{k+N_0\\left(e^{rt}-1\\right)}\\left\\{t\\ge 0\\right\\}";
pub const CAPACITY_LINE_LATEX: &str = "y=k\\left\\{x\\ge 0\\right\\}";
pub const SLOPE_LINE_LATEX: &str = "y-N(T) = m(x-T)";
pub const TIME_POINT_LATEX: &str = "(T, N(T))";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    Blue,
    Black,
}

impl Color {
    pub const fn hex(self) -> &'static str {
        match self {
            Color::Red => "#c74440",
            Color::Blue => "#2d70b3",
            Color::Black => "#000000",
        }
    }
}

/// Display attributes of an expression. `None` leaves the current
/// attribute untouched when merged into an existing expression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionStyle {
    pub color: Option<Color>,
    pub hidden: Option<bool>,
}

/// One entry of the evaluator's symbol table, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub id: String,
    pub latex: Option<String>,
    pub style: ExpressionStyle,
}

impl Expression {
    pub fn new(id: impl Into<String>, latex: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            latex: Some(latex.into()),
            style: ExpressionStyle::default(),
        }
    }

    /// `symbol=value` assignment, e.g. `N_0=100`.
    pub fn assignment(symbol: &str, value: f64) -> Self {
        Self::new(symbol, format!("{symbol}={value}"))
    }

    /// A style-only update that keeps the existing formula.
    pub fn visibility(id: impl Into<String>, hidden: bool) -> Self {
        Self {
            id: id.into(),
            latex: None,
            style: ExpressionStyle {
                color: None,
                hidden: Some(hidden),
            },
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.style.color = Some(color);
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.style.hidden = Some(hidden);
        self
    }
}

/// Plot axis bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

pub type Observer = Box<dyn FnMut(f64) + Send>;

pub trait Evaluator: Send {
    fn set_expression(&mut self, expression: Expression);

    fn set_expressions(&mut self, expressions: Vec<Expression>) {
        for expression in expressions {
            self.set_expression(expression);
        }
    }

    fn set_math_bounds(&mut self, viewport: Viewport);

    /// Registers `observer` for the numeric value of `symbol`.
    fn observe(&mut self, symbol: &str, observer: Observer);
}

/// The expression set written when a model is first attached.
pub fn initial_expressions(initial_population: f64, rate: f64, capacity: f64) -> Vec<Expression> {
    vec![
        Expression::assignment(SYMBOL_INITIAL_POPULATION, initial_population),
        Expression::assignment(SYMBOL_RATE, rate).hidden(true),
        Expression::assignment(SYMBOL_CAPACITY, capacity),
        Expression::assignment(SYMBOL_TIME, 0.0),
        Expression::new(SYMBOL_POPULATION, "P=N(T)").hidden(true),
        Expression::new(SYMBOL_SLOPE, "m=N'(T)"),
        Expression::new(EXPR_TIME_POINT, TIME_POINT_LATEX).with_color(Color::Red),
        Expression::new(EXPR_CURVE, CURVE_LATEX).with_color(Color::Red),
        Expression::new(EXPR_CAPACITY_LINE, CAPACITY_LINE_LATEX)
            .with_color(Color::Black)
            .hidden(true),
        Expression::new(EXPR_SLOPE_LINE, SLOPE_LINE_LATEX)
            .with_color(Color::Blue)
            .hidden(true),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_formats_like_plain_numbers() {
        assert_eq!(
            Expression::assignment(SYMBOL_INITIAL_POPULATION, 100.0).latex,
            Some("N_0=100".to_string())
        );
        assert_eq!(
            Expression::assignment(SYMBOL_RATE, 0.6).latex,
            Some("r=0.6".to_string())
        );
    }

    #[test]
    fn test_initial_expressions_hide_reference_lines() {
        let expressions = initial_expressions(100.0, 0.6, 1000.0);
        let capacity = expressions
            .iter()
            .find(|e| e.id == EXPR_CAPACITY_LINE)
            .unwrap();
        assert_eq!(capacity.style.hidden, Some(true));
        assert_eq!(capacity.style.color, Some(Color::Black));
        assert!(expressions.iter().any(|e| e.id == SYMBOL_TIME));
    }
}
