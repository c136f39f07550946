use serde::{Deserialize, Serialize};

/// Boolean condition tree evaluated against a record.
///
/// `And` and `Or` are understood by the evaluator but not advertised in the
/// published configuration schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    Equal {
        #[serde(rename = "fieldName")]
        field_name: String,
        #[serde(rename = "comparisonValue")]
        comparison_value: String,
    },
    /// Holds when none of the sub-conditions hold.
    Not { conditions: Vec<Condition> },
    And { conditions: Vec<Condition> },
    Or { conditions: Vec<Condition> },
}

impl Condition {
    #[must_use]
    pub fn equal(field_name: impl Into<String>, comparison_value: impl Into<String>) -> Self {
        Self::Equal {
            field_name: field_name.into(),
            comparison_value: comparison_value.into(),
        }
    }

    /// Nesting depth; a leaf has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Equal { .. } => 1,
            Self::Not { conditions } | Self::And { conditions } | Self::Or { conditions } => {
                1 + conditions.iter().map(Condition::depth).max().unwrap_or(0)
            }
        }
    }
}

/// Keeps or drops whole records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowFilteringConfig {
    pub conditions: Condition,
}
