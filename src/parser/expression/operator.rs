use crate::lexer::TokenKind;

/// Binding strength of an operator, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
}

impl Precedence {
    /// Left and right binding powers for the Pratt loop. Assignment is the
    /// only right-associative level.
    pub fn infix_binding_power(self) -> (u8, u8) {
        let base = 2 * self as u8;
        match self {
            Precedence::Assignment => (base + 1, base),
            _ => (base, base + 1),
        }
    }

    pub fn prefix_binding_power(self) -> u8 {
        2 * self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrefixOperator {
    Bang,
    Minus,
}

impl PrefixOperator {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Bang => Some(Self::Bang),
            TokenKind::Minus => Some(Self::Minus),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InfixOperator {
    Multiply,
    Divide,
    Add,
    Subtract,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    EqualEqual,
    BangEqual,
}

impl InfixOperator {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        let operator = match kind {
            TokenKind::Star => Self::Multiply,
            TokenKind::Slash => Self::Divide,
            TokenKind::Plus => Self::Add,
            TokenKind::Minus => Self::Subtract,
            TokenKind::LessThan => Self::LessThan,
            TokenKind::LessThanEqual => Self::LessThanEqual,
            TokenKind::GreaterThan => Self::GreaterThan,
            TokenKind::GreaterThanEqual => Self::GreaterThanEqual,
            TokenKind::EqualEqual => Self::EqualEqual,
            TokenKind::BangEqual => Self::BangEqual,
            _ => return None,
        };
        Some(operator)
    }

    pub fn precedence(self) -> Precedence {
        match self {
            Self::Multiply | Self::Divide => Precedence::Factor,
            Self::Add | Self::Subtract => Precedence::Term,
            Self::LessThan | Self::LessThanEqual | Self::GreaterThan | Self::GreaterThanEqual => {
                Precedence::Comparison
            }
            Self::EqualEqual | Self::BangEqual => Precedence::Equality,
        }
    }
}

/// `and` and `or`, which may skip their right operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InfixShortCircuitOperator {
    And,
    Or,
}

impl InfixShortCircuitOperator {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::KeywordAnd => Some(Self::And),
            TokenKind::KeywordOr => Some(Self::Or),
            _ => None,
        }
    }

    pub fn precedence(self) -> Precedence {
        match self {
            Self::And => Precedence::And,
            Self::Or => Precedence::Or,
        }
    }
}
