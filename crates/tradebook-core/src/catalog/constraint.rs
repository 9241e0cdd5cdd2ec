//! Unique constraint definitions.

use rkyv::{Archive, Deserialize, Serialize};

/// Uniqueness of a single column across all live rows of a table.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct UniqueConstraint {
    /// Constraint name.
    pub name: String,
    /// Table this constraint applies to.
    pub table: String,
    /// Column that must be unique.
    pub field: String,
    /// Compare text values after lowercasing.
    pub case_insensitive: bool,
}

impl UniqueConstraint {
    /// Create a case-sensitive unique constraint.
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            field: field.into(),
            case_insensitive: false,
        }
    }

    /// Create a unique constraint that ignores case.
    pub fn case_insensitive(
        name: impl Into<String>,
        table: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            case_insensitive: true,
            ..Self::new(name, table, field)
        }
    }

    /// Normalize a text value into its index form.
    pub fn normalize(&self, value: &str) -> String {
        if self.case_insensitive {
            value.to_lowercase()
        } else {
            value.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let ci = UniqueConstraint::case_insensitive("clients_email_unique", "clients", "email");
        assert_eq!(ci.normalize("JoeK@Example.com"), "joek@example.com");

        let cs = UniqueConstraint::new("vendors_name_unique", "vendors", "name");
        assert_eq!(cs.normalize("CB2"), "CB2");
    }
}
