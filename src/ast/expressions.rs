use crate::value::Value;

/// Abstract Syntax Tree node representing a parsed filter expression.
///
/// Operators are stored by symbol and resolved against the registry when the
/// tree is evaluated, so a tree can outlive the registration it was parsed with.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal number, string, boolean or null
    Literal(Value),

    /// Context lookup
    ///
    /// A relative identifier (`.name`) only appears inside a filter and
    /// resolves against the element currently being tested.
    ///
    /// # Examples
    /// ```text
    /// normandy          // Identifier { name: "normandy", relative: false }
    /// .id               // Identifier { name: "id", relative: true }
    /// ```
    Identifier { name: String, relative: bool },

    /// Field or index access
    ///
    /// `computed` is false for `.name` access, where `property` is a string
    /// literal, and true for bracketed expressions.
    ///
    /// # Examples
    /// ```text
    /// normandy.channel
    /// addons["uBlock"]
    /// experiments[0]
    /// ```
    Member {
        subject: Box<Expr>,
        property: Box<Expr>,
        computed: bool,
    },

    /// Array literal
    Array(Vec<Expr>),

    /// Object literal
    ///
    /// # Example
    /// ```text
    /// {channel: normandy.channel, "id": 7}
    /// ```
    Object(Vec<(String, Expr)>),

    /// Prefix operator application
    Unary { op: String, operand: Box<Expr> },

    /// Infix operator application
    Binary {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `test ? consequent : alternate`
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },

    /// Array filter: keeps the elements of `subject` for which `predicate`
    /// is truthy
    ///
    /// # Example
    /// ```text
    /// addons[.type == "extension" && .isActive]
    /// ```
    Filter {
        subject: Box<Expr>,
        predicate: Box<Expr>,
    },

    /// Named transform applied through a pipe
    ///
    /// # Examples
    /// ```text
    /// creationDate|date
    /// [userId, recipe.id]|bucketSample(0, 10, 100)
    /// ```
    Transform {
        subject: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Whether the expression resolves anything relative to a filter element.
    ///
    /// Nested filter predicates are not searched: their relative identifiers
    /// bind to the nested filter.
    pub fn has_relative_identifier(&self) -> bool {
        match self {
            Expr::Identifier { relative, .. } => *relative,
            Expr::Literal(_) => false,
            Expr::Member {
                subject, property, ..
            } => subject.has_relative_identifier() || property.has_relative_identifier(),
            Expr::Array(items) => items.iter().any(Expr::has_relative_identifier),
            Expr::Object(pairs) => pairs.iter().any(|(_, value)| value.has_relative_identifier()),
            Expr::Unary { operand, .. } => operand.has_relative_identifier(),
            Expr::Binary { left, right, .. } => {
                left.has_relative_identifier() || right.has_relative_identifier()
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                test.has_relative_identifier()
                    || consequent.has_relative_identifier()
                    || alternate.has_relative_identifier()
            }
            Expr::Filter { subject, .. } => subject.has_relative_identifier(),
            Expr::Transform { subject, args, .. } => {
                subject.has_relative_identifier() || args.iter().any(Expr::has_relative_identifier)
            }
        }
    }
}
