use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Decimal(Decimal),
    Str(String),
    Bool(bool),
    None,
}

/// The only names an expression can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Name {
    /// The source table.
    Df,
    /// The value produced by earlier steps.
    Current,
    /// Analytic helpers (`to_numeric`, `to_datetime`).
    Pd,
    Str,
    Int,
    Float,
}

impl Name {
    pub fn from_ident(ident: &str) -> Option<Name> {
        match ident {
            "df" => Some(Name::Df),
            "current" => Some(Name::Current),
            "pd" => Some(Name::Pd),
            "str" => Some(Name::Str),
            "int" => Some(Name::Int),
            "float" => Some(Name::Float),
            _ => None,
        }
    }
}

/// Attribute and method names an expression may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attr {
    ToNumeric,
    ToDatetime,
    Sum,
    Mean,
    Min,
    Max,
    Count,
    Nunique,
    Abs,
    Round,
    Fillna,
    Clip,
    Shift,
    Diff,
    Cumsum,
    Cummax,
    Cummin,
    Add,
    Sub,
    Mul,
    Div,
    StrAccessor,
    DtAccessor,
    Lower,
    Upper,
    Strip,
    Len,
    Contains,
    Startswith,
    Endswith,
    Replace,
    Slice,
    Year,
    Month,
    Day,
    Date,
}

impl Attr {
    pub fn from_ident(ident: &str) -> Option<Attr> {
        let attr = match ident {
            "to_numeric" => Attr::ToNumeric,
            "to_datetime" => Attr::ToDatetime,
            "sum" => Attr::Sum,
            "mean" => Attr::Mean,
            "min" => Attr::Min,
            "max" => Attr::Max,
            "count" => Attr::Count,
            "nunique" => Attr::Nunique,
            "abs" => Attr::Abs,
            "round" => Attr::Round,
            "fillna" => Attr::Fillna,
            "clip" => Attr::Clip,
            "shift" => Attr::Shift,
            "diff" => Attr::Diff,
            "cumsum" => Attr::Cumsum,
            "cummax" => Attr::Cummax,
            "cummin" => Attr::Cummin,
            "add" => Attr::Add,
            "sub" => Attr::Sub,
            "mul" => Attr::Mul,
            "div" => Attr::Div,
            "str" => Attr::StrAccessor,
            "dt" => Attr::DtAccessor,
            "lower" => Attr::Lower,
            "upper" => Attr::Upper,
            "strip" => Attr::Strip,
            "len" => Attr::Len,
            "contains" => Attr::Contains,
            "startswith" => Attr::Startswith,
            "endswith" => Attr::Endswith,
            "replace" => Attr::Replace,
            "slice" => Attr::Slice,
            "year" => Attr::Year,
            "month" => Attr::Month,
            "day" => Attr::Day,
            "date" => Attr::Date,
            _ => return None,
        };
        Some(attr)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Attr::ToNumeric => "to_numeric",
            Attr::ToDatetime => "to_datetime",
            Attr::Sum => "sum",
            Attr::Mean => "mean",
            Attr::Min => "min",
            Attr::Max => "max",
            Attr::Count => "count",
            Attr::Nunique => "nunique",
            Attr::Abs => "abs",
            Attr::Round => "round",
            Attr::Fillna => "fillna",
            Attr::Clip => "clip",
            Attr::Shift => "shift",
            Attr::Diff => "diff",
            Attr::Cumsum => "cumsum",
            Attr::Cummax => "cummax",
            Attr::Cummin => "cummin",
            Attr::Add => "add",
            Attr::Sub => "sub",
            Attr::Mul => "mul",
            Attr::Div => "div",
            Attr::StrAccessor => "str",
            Attr::DtAccessor => "dt",
            Attr::Lower => "lower",
            Attr::Upper => "upper",
            Attr::Strip => "strip",
            Attr::Len => "len",
            Attr::Contains => "contains",
            Attr::Startswith => "startswith",
            Attr::Endswith => "endswith",
            Attr::Replace => "replace",
            Attr::Slice => "slice",
            Attr::Year => "year",
            Attr::Month => "month",
            Attr::Day => "day",
            Attr::Date => "date",
        }
    }
}

/// Keyword arguments accepted by calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Ndigits,
    Errors,
    Utc,
}

impl Keyword {
    pub fn from_ident(ident: &str) -> Option<Keyword> {
        match ident {
            "ndigits" | "decimals" => Some(Keyword::Ndigits),
            "errors" => Some(Keyword::Errors),
            "utc" => Some(Keyword::Utc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Name(Name),
    Attribute {
        value: Box<Expr>,
        attr: Attr,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<(Keyword, Expr)>,
    },
    Index {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Bool {
        op: BoolOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}
