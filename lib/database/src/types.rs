use crate::vendor::Vendor;
use rdb2rdf_model::vocab::xsd;
use rdb2rdf_model::xsd::is_valid_lexical_form;
use regex::Regex;
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

static NUMERIC_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").unwrap()
});

static HEX_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9a-fA-F]{2})*$").unwrap()
});

/// The family of an SQL column type. Literal rendering only depends on the family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GenericType {
    Character,
    Binary,
    Numeric,
    Boolean,
    Date,
    Time,
    Timestamp,
    Interval,
    Bit,
}

impl GenericType {
    /// Returns a data type of this family with a standard SQL name.
    pub fn data_type(self) -> DataType {
        let name = match self {
            GenericType::Character => "VARCHAR",
            GenericType::Binary => "VARBINARY",
            GenericType::Numeric => "NUMERIC",
            GenericType::Boolean => "BOOLEAN",
            GenericType::Date => "DATE",
            GenericType::Time => "TIME",
            GenericType::Timestamp => "TIMESTAMP",
            GenericType::Interval => "INTERVAL",
            GenericType::Bit => "BIT",
        };
        DataType::new(name, self)
    }
}

/// An SQL column type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataType {
    name: String,
    generic: GenericType,
}

impl DataType {
    pub fn new(name: impl Into<String>, generic: GenericType) -> Self {
        Self {
            name: name.into(),
            generic,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generic(&self) -> GenericType {
        self.generic
    }

    /// Renders `value` as an SQL literal of this type.
    ///
    /// Returns `None` if `value` is not a valid value of this type. Timestamps may use either
    /// a space or the XSD `T` between date and time.
    pub fn to_sql_literal(&self, value: &str, vendor: Vendor) -> Option<String> {
        match self.generic {
            GenericType::Character | GenericType::Interval => {
                Some(vendor.quote_string_literal(value))
            }
            GenericType::Numeric => {
                let value = value.trim();
                NUMERIC_LITERAL.is_match(value).then(|| value.to_owned())
            }
            GenericType::Boolean => match value {
                "true" | "1" => Some("TRUE".to_owned()),
                "false" | "0" => Some("FALSE".to_owned()),
                _ => None,
            },
            GenericType::Bit => (!value.is_empty() && value.chars().all(|c| c == '0' || c == '1'))
                .then(|| format!("B'{value}'")),
            GenericType::Binary => HEX_LITERAL
                .is_match(value)
                .then(|| vendor.quote_binary_literal(value)),
            GenericType::Date => {
                is_valid_lexical_form(xsd::DATE, value).then(|| vendor.quote_date_literal(value))
            }
            GenericType::Time => {
                is_valid_lexical_form(xsd::TIME, value).then(|| vendor.quote_time_literal(value))
            }
            GenericType::Timestamp => {
                let xsd_form = value.replacen(' ', "T", 1);
                is_valid_lexical_form(xsd::DATE_TIME, &xsd_form)
                    .then(|| vendor.quote_timestamp_literal(&xsd_form.replacen('T', " ", 1)))
            }
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
