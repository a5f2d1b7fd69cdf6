//! Operator catalog: every filter operator the expression language accepts,
//! as a closed enum compiled by exhaustive match.
//!
//! Each operator renders to a SQL fragment with at most one `?` placeholder.
//! The column identifier is embedded literally (callers validate it against
//! the cube schema first); the value, when the operator takes one, is always
//! a bound parameter.

use crate::sql::{quote_ident, Scalar};

/// Pattern shape for text operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    /// Exact match (still LIKE-based so wildcards in the value are escaped).
    Exact,
    /// Value anywhere in the column.
    Contains,
    /// Value at the start of the column.
    StartsWith,
    /// Value at the end of the column.
    EndsWith,
    /// Value is a regular expression evaluated by the database.
    Regex,
}

/// Truncation granularity for date operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateGranularity {
    Day,
    Week,
    Month,
    Year,
}

impl DateGranularity {
    fn sql_unit(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    fn name_suffix(&self) -> &'static str {
        match self {
            Self::Day => "Day",
            Self::Week => "Week",
            Self::Month => "Month",
            Self::Year => "Year",
        }
    }

    const ALL: [Self; 4] = [Self::Day, Self::Week, Self::Month, Self::Year];
}

/// Comparison applied after truncating both sides to the granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCompare {
    Same,
    SameOrBefore,
    SameOrAfter,
    Before,
    After,
}

impl DateCompare {
    fn sql_op(&self) -> &'static str {
        match self {
            Self::Same => "=",
            Self::SameOrBefore => "<=",
            Self::SameOrAfter => ">=",
            Self::Before => "<",
            Self::After => ">",
        }
    }

    fn name_prefix(&self) -> &'static str {
        match self {
            Self::Same => "same",
            Self::SameOrBefore => "sameOrBefore",
            Self::SameOrAfter => "sameOrAfter",
            Self::Before => "before",
            Self::After => "after",
        }
    }

    const ALL: [Self; 5] = [
        Self::Same,
        Self::SameOrBefore,
        Self::SameOrAfter,
        Self::Before,
        Self::After,
    ];
}

/// A filter operator from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    // Universal comparisons.
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,

    // Null checks.
    IsNull,
    IsNotNull,

    // Tri-state boolean predicates. NULL is neither true nor false, so
    // `isNotTrue` matches both FALSE and NULL rows.
    IsTrue,
    IsNotTrue,
    IsFalse,
    IsNotFalse,

    /// Text match family: shape x case sensitivity x negation.
    Text {
        matcher: TextMatch,
        case_insensitive: bool,
        negated: bool,
    },

    /// Date family: both sides truncated to the granularity, then compared.
    Date {
        granularity: DateGranularity,
        compare: DateCompare,
    },
}

impl Operator {
    /// Resolve a catalog name, or `None` if the name is unknown.
    pub fn parse(name: &str) -> Option<Self> {
        let op = match name {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "isNull" => Self::IsNull,
            "isNotNull" => Self::IsNotNull,
            "isTrue" => Self::IsTrue,
            "isNotTrue" => Self::IsNotTrue,
            "isFalse" => Self::IsFalse,
            "isNotFalse" => Self::IsNotFalse,
            other => return Self::parse_text(other).or_else(|| Self::parse_date(other)),
        };
        Some(op)
    }

    fn parse_text(name: &str) -> Option<Self> {
        let (name, negated) = match name.strip_prefix("not") {
            Some(rest) => {
                // Lower the first letter back: notContains -> contains.
                let mut chars = rest.chars();
                let first = chars.next()?;
                (format!("{}{}", first.to_lowercase(), chars.as_str()), true)
            }
            None => (name.to_string(), false),
        };
        let (name, case_insensitive) = match name.strip_suffix("CI") {
            Some(rest) => (rest.to_string(), true),
            None => (name, false),
        };
        let matcher = match name.as_str() {
            "eq" if case_insensitive || negated => TextMatch::Exact,
            "contains" => TextMatch::Contains,
            "startsWith" => TextMatch::StartsWith,
            "endsWith" => TextMatch::EndsWith,
            "matches" => TextMatch::Regex,
            _ => return None,
        };
        Some(Self::Text {
            matcher,
            case_insensitive,
            negated,
        })
    }

    fn parse_date(name: &str) -> Option<Self> {
        for compare in DateCompare::ALL {
            for granularity in DateGranularity::ALL {
                if name == format!("{}{}", compare.name_prefix(), granularity.name_suffix()) {
                    return Some(Self::Date {
                        granularity,
                        compare,
                    });
                }
            }
        }
        None
    }

    /// The catalog name of this operator.
    pub fn name(&self) -> String {
        match self {
            Self::Eq => "eq".into(),
            Self::Ne => "ne".into(),
            Self::Gt => "gt".into(),
            Self::Gte => "gte".into(),
            Self::Lt => "lt".into(),
            Self::Lte => "lte".into(),
            Self::IsNull => "isNull".into(),
            Self::IsNotNull => "isNotNull".into(),
            Self::IsTrue => "isTrue".into(),
            Self::IsNotTrue => "isNotTrue".into(),
            Self::IsFalse => "isFalse".into(),
            Self::IsNotFalse => "isNotFalse".into(),
            Self::Text {
                matcher,
                case_insensitive,
                negated,
            } => {
                let base = match matcher {
                    TextMatch::Exact => "eq",
                    TextMatch::Contains => "contains",
                    TextMatch::StartsWith => "startsWith",
                    TextMatch::EndsWith => "endsWith",
                    TextMatch::Regex => "matches",
                };
                let mut name = if *negated {
                    let mut chars = base.chars();
                    let first = chars.next().unwrap();
                    format!("not{}{}", first.to_uppercase(), chars.as_str())
                } else {
                    base.to_string()
                };
                if *case_insensitive {
                    name.push_str("CI");
                }
                name
            }
            Self::Date {
                granularity,
                compare,
            } => format!("{}{}", compare.name_prefix(), granularity.name_suffix()),
        }
    }

    /// Whether this operator binds a value parameter.
    ///
    /// The null checks and tri-state boolean predicates take no value; every
    /// other operator requires exactly one.
    pub fn binds_value(&self) -> bool {
        !matches!(
            self,
            Self::IsNull
                | Self::IsNotNull
                | Self::IsTrue
                | Self::IsNotTrue
                | Self::IsFalse
                | Self::IsNotFalse
        )
    }

    /// Render the SQL fragment for this operator applied to `column`.
    ///
    /// The fragment contains exactly one `?` when [`binds_value`] is true and
    /// none otherwise.
    ///
    /// [`binds_value`]: Self::binds_value
    pub fn fragment(&self, column: &str) -> String {
        let col = quote_ident(column);
        match self {
            Self::Eq => format!("{col} = ?"),
            Self::Ne => format!("{col} <> ?"),
            Self::Gt => format!("{col} > ?"),
            Self::Gte => format!("{col} >= ?"),
            Self::Lt => format!("{col} < ?"),
            Self::Lte => format!("{col} <= ?"),
            Self::IsNull => format!("{col} IS NULL"),
            Self::IsNotNull => format!("{col} IS NOT NULL"),
            Self::IsTrue => format!("{col} IS TRUE"),
            Self::IsNotTrue => format!("{col} IS NOT TRUE"),
            Self::IsFalse => format!("{col} IS FALSE"),
            Self::IsNotFalse => format!("{col} IS NOT FALSE"),
            Self::Text {
                matcher: TextMatch::Regex,
                case_insensitive,
                negated,
            } => {
                let op = match (*negated, *case_insensitive) {
                    (false, false) => "~",
                    (false, true) => "~*",
                    (true, false) => "!~",
                    (true, true) => "!~*",
                };
                format!("{col} {op} ?")
            }
            Self::Text {
                case_insensitive,
                negated,
                ..
            } => {
                let like = if *case_insensitive { "ILIKE" } else { "LIKE" };
                if *negated {
                    format!("{col} NOT {like} ?")
                } else {
                    format!("{col} {like} ?")
                }
            }
            Self::Date {
                granularity,
                compare,
            } => {
                let unit = granularity.sql_unit();
                format!(
                    "DATE_TRUNC('{unit}', {col}) {} DATE_TRUNC('{unit}', ?)",
                    compare.sql_op()
                )
            }
        }
    }

    /// Shape the raw clause value into the bound parameter.
    ///
    /// LIKE-based operators escape wildcard characters in the value and then
    /// add their own: `contains` wraps both sides, `startsWith`/`endsWith`
    /// one side. Everything else binds the raw text.
    pub fn bind_value(&self, raw: &str) -> Scalar {
        match self {
            Self::Text {
                matcher, ..
            } if *matcher != TextMatch::Regex => {
                let escaped = escape_like(raw);
                let pattern = match matcher {
                    TextMatch::Exact => escaped,
                    TextMatch::Contains => format!("%{escaped}%"),
                    TextMatch::StartsWith => format!("{escaped}%"),
                    TextMatch::EndsWith => format!("%{escaped}"),
                    TextMatch::Regex => unreachable!(),
                };
                Scalar::Text(pattern)
            }
            _ => Scalar::Text(raw.to_string()),
        }
    }

    /// Every operator in the catalog. Drives exhaustive catalog tests.
    pub fn all() -> Vec<Self> {
        let mut ops = vec![
            Self::Eq,
            Self::Ne,
            Self::Gt,
            Self::Gte,
            Self::Lt,
            Self::Lte,
            Self::IsNull,
            Self::IsNotNull,
            Self::IsTrue,
            Self::IsNotTrue,
            Self::IsFalse,
            Self::IsNotFalse,
        ];
        for matcher in [
            TextMatch::Exact,
            TextMatch::Contains,
            TextMatch::StartsWith,
            TextMatch::EndsWith,
            TextMatch::Regex,
        ] {
            for case_insensitive in [false, true] {
                for negated in [false, true] {
                    // Plain case-sensitive `eq` is the universal Eq above.
                    if matcher == TextMatch::Exact && !case_insensitive && !negated {
                        continue;
                    }
                    ops.push(Self::Text {
                        matcher,
                        case_insensitive,
                        negated,
                    });
                }
            }
        }
        for compare in DateCompare::ALL {
            for granularity in DateGranularity::ALL {
                ops.push(Self::Date {
                    granularity,
                    compare,
                });
            }
        }
        ops
    }
}

/// Escape LIKE wildcards in a user value. Backslash is the escape character.
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
