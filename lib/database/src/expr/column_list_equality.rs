use crate::expr::Expression;
use crate::renamer::Renamer;
use crate::schema::{ColumnList, TableName};
use crate::vendor::Vendor;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// Pairwise equality of two column lists, typically the columns of a foreign key and the key
/// they reference.
///
/// The side that sorts first is always stored on the left.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnListEquality {
    left: ColumnList,
    right: ColumnList,
}

impl ColumnListEquality {
    pub fn new(left: ColumnList, right: ColumnList) -> Self {
        if right < left {
            Self {
                left: right,
                right: left,
            }
        } else {
            Self { left, right }
        }
    }

    pub fn left(&self) -> &ColumnList {
        &self.left
    }

    pub fn right(&self) -> &ColumnList {
        &self.right
    }

    /// The tables referenced by the two sides.
    pub fn tables(&self) -> impl Iterator<Item = &TableName> {
        self.left
            .iter()
            .chain(self.right.iter())
            .filter_map(|c| c.qualifier())
            .unique()
    }

    pub fn to_simple_expression(&self) -> Expression {
        Expression::conjunction(
            self.left
                .iter()
                .zip(self.right.iter())
                .map(|(l, r)| Expression::column_equality(l, r)),
        )
    }

    #[must_use]
    pub fn rename(&self, renamer: &Renamer) -> ColumnListEquality {
        let rename = |list: &ColumnList| -> ColumnList {
            list.iter().map(|c| renamer.apply_to_column(c)).collect()
        };
        ColumnListEquality::new(rename(&self.left), rename(&self.right))
    }

    pub(crate) fn to_sql(&self, vendor: Vendor) -> String {
        self.left
            .iter()
            .zip(self.right.iter())
            .map(|(l, r)| {
                format!(
                    "{} = {}",
                    vendor.quote_column_name(l),
                    vendor.quote_column_name(r)
                )
            })
            .join(" AND ")
    }
}

impl Display for ColumnListEquality {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Join({} = {})", self.left, self.right)
    }
}
