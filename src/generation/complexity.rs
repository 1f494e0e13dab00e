//! Hop-count complexity buckets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::graph_catalog::cypher_refs::count_relationship_hops;

/// Number of relationship traversals in a query pattern, capped at `5+hop`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Complexity {
    ZeroHop,
    OneHop,
    TwoHop,
    ThreeHop,
    FourHop,
    FivePlusHop,
}

impl Complexity {
    pub fn from_hops(hops: usize) -> Self {
        match hops {
            0 => Complexity::ZeroHop,
            1 => Complexity::OneHop,
            2 => Complexity::TwoHop,
            3 => Complexity::ThreeHop,
            4 => Complexity::FourHop,
            _ => Complexity::FivePlusHop,
        }
    }

    /// Bucket for the relationship patterns literally present in `cypher`
    pub fn of_query(cypher: &str) -> Self {
        Self::from_hops(count_relationship_hops(cypher))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::ZeroHop => "0-hop",
            Complexity::OneHop => "1-hop",
            Complexity::TwoHop => "2-hop",
            Complexity::ThreeHop => "3-hop",
            Complexity::FourHop => "4-hop",
            Complexity::FivePlusHop => "5+hop",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("not a hop bucket: `{0}`")]
pub struct ParseComplexityError(pub String);

impl FromStr for Complexity {
    type Err = ParseComplexityError;

    /// Accepts `2-hop`, `2 hop`, `2hop`, `5+hop`, `5+ hops`, and any count above 4.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
        let rest = s.trim()[digits.len()..].to_ascii_lowercase();
        let hops: usize = digits
            .parse()
            .map_err(|_| ParseComplexityError(s.to_string()))?;
        if !rest.contains("hop") {
            return Err(ParseComplexityError(s.to_string()));
        }
        Ok(Self::from_hops(hops))
    }
}

impl TryFrom<String> for Complexity {
    type Error = ParseComplexityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Complexity> for String {
    fn from(value: Complexity) -> Self {
        value.as_str().to_string()
    }
}
