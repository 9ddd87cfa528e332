use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel used in both `country` and `region` for the global aggregate rows.
pub const WORLD: &str = "World";
/// `segment` value of rows that sum every sub-segment of a type.
pub const TOTAL_SEGMENT: &str = "Total";
/// `reason` value of rows that sum every cause of a segment.
pub const ALL_REASONS: &str = "All";

/// Top-level emission category (CSV column `type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EmissionType {
    Agriculture,
    Energy,
    Waste,
    Other,
}

impl EmissionType {
    pub const ALL: [EmissionType; 4] = [
        EmissionType::Agriculture,
        EmissionType::Energy,
        EmissionType::Waste,
        EmissionType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmissionType::Agriculture => "Agriculture",
            EmissionType::Energy => "Energy",
            EmissionType::Waste => "Waste",
            EmissionType::Other => "Other",
        }
    }
}

impl fmt::Display for EmissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmissionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmissionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(())
    }
}

/// One typed row of the cleaned emissions table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub country: String,
    pub region: String,
    #[serde(rename = "type")]
    pub kind: EmissionType,
    pub segment: String,
    pub reason: String,
    /// Kilotons.
    pub emissions: f64,
}

impl Record {
    /// Text value of a filterable/groupable column.
    pub fn field(&self, column: Column) -> &str {
        match column {
            Column::Country => &self.country,
            Column::Region => &self.region,
            Column::Type => self.kind.as_str(),
            Column::Segment => &self.segment,
            Column::Reason => &self.reason,
        }
    }
}

/// Text dimensions a query can filter or group on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Country,
    Region,
    Type,
    Segment,
    Reason,
}

impl Column {
    /// CSV header name.
    pub fn name(&self) -> &'static str {
        match self {
            Column::Country => "country",
            Column::Region => "region",
            Column::Type => "type",
            Column::Segment => "segment",
            Column::Reason => "reason",
        }
    }

    /// Geographic breakdowns must not see the `World` sentinel rows.
    pub fn is_geographic(&self) -> bool {
        matches!(self, Column::Country | Column::Region)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "country" => Ok(Column::Country),
            "region" => Ok(Column::Region),
            "type" => Ok(Column::Type),
            "segment" => Ok(Column::Segment),
            "reason" => Ok(Column::Reason),
            other => Err(AnalysisError::UnknownColumn(other.to_string())),
        }
    }
}

/// Grouping key: one label per group-by column, in group-by order.
/// The empty key stands for "the whole filtered set".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey(pub Vec<String>);

impl GroupKey {
    pub fn single(label: impl Into<String>) -> Self {
        GroupKey(vec![label.into()])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Human label; multi-column keys are joined with " / ".
    pub fn label(&self) -> String {
        if self.0.is_empty() {
            "(all)".to_string()
        } else {
            self.0.join(" / ")
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emission_type_parses_exact_names_only() {
        assert_eq!("Energy".parse::<EmissionType>(), Ok(EmissionType::Energy));
        assert!("energy".parse::<EmissionType>().is_err());
        assert!("Industry".parse::<EmissionType>().is_err());
    }

    #[test]
    fn column_parse_is_case_insensitive() {
        assert_eq!(" Region ".parse::<Column>().unwrap(), Column::Region);
        assert!(matches!(
            "emissions".parse::<Column>(),
            Err(AnalysisError::UnknownColumn(c)) if c == "emissions"
        ));
    }

    #[test]
    fn group_key_labels() {
        assert_eq!(GroupKey::default().label(), "(all)");
        assert_eq!(
            GroupKey(vec!["China".into(), "Energy".into()]).label(),
            "China / Energy"
        );
    }
}
