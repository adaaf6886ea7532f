// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Military rank taxonomy.
//!
//! Ranks form a fixed two-level mapping: a category owns an ordered list of
//! rank labels. A `Rank` can only be obtained by parsing a label that appears
//! in that mapping, so user records never carry free-text ranks.

use crate::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// A rank category (staff group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankCategory {
    /// Privates.
    Enlisted,
    /// Sergeants.
    Sergeants,
    /// Junior officers.
    JuniorOfficers,
    /// Senior officers.
    SeniorOfficers,
}

impl RankCategory {
    /// All categories in display order.
    pub const ALL: [Self; 4] = [
        Self::Enlisted,
        Self::Sergeants,
        Self::JuniorOfficers,
        Self::SeniorOfficers,
    ];

    /// Display label of the category.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Enlisted => "Рядовий",
            Self::Sergeants => "Сержантський склад",
            Self::JuniorOfficers => "Молодший офіцерський склад",
            Self::SeniorOfficers => "Старший офіцерський склад",
        }
    }

    /// Rank labels belonging to this category, lowest first.
    #[must_use]
    pub const fn ranks(self) -> &'static [&'static str] {
        match self {
            Self::Enlisted => &["солдат", "старший солдат"],
            Self::Sergeants => &[
                "молодший сержант",
                "сержант",
                "старший сержант",
                "головний сержант",
                "штаб-сержант",
                "майстер-сержант",
                "старший майстер-сержант",
                "головний майстер-сержант",
            ],
            Self::JuniorOfficers => &[
                "молодший лейтенант",
                "лейтенант",
                "старший лейтенант",
                "капітан",
            ],
            Self::SeniorOfficers => &["майор", "підполковник", "полковник"],
        }
    }
}

/// A validated rank label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rank {
    category: RankCategory,
    label: &'static str,
}

impl Rank {
    /// Looks up a rank label in the catalog.
    ///
    /// Leading and trailing whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRank` if the label is not in the catalog.
    pub fn parse(label: &str) -> Result<Self, DomainError> {
        let wanted = label.trim();
        RankCategory::ALL
            .iter()
            .find_map(|category| {
                category
                    .ranks()
                    .iter()
                    .find(|candidate| **candidate == wanted)
                    .map(|found| Self {
                        category: *category,
                        label: found,
                    })
            })
            .ok_or_else(|| DomainError::InvalidRank(label.to_string()))
    }

    /// The category this rank belongs to.
    #[must_use]
    pub const fn category(&self) -> RankCategory {
        self.category
    }

    /// The rank label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }
}

impl FromStr for Rank {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label)
    }
}

impl Serialize for Rank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label)
    }
}

impl<'de> Deserialize<'de> for Rank {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Self::parse(&label).map_err(serde::de::Error::custom)
    }
}

/// Parses an optional rank coming from a request, treating an empty string
/// as "no rank".
///
/// # Errors
///
/// Returns `DomainError::InvalidRank` for labels outside the catalog.
pub fn parse_optional_rank(label: Option<&str>) -> Result<Option<Rank>, DomainError> {
    match label.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Rank::parse(value).map(Some),
    }
}
