//! Party directory model: customers, salesmen and companies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of party kinds. Codes match the console's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "lowercase")]
pub enum PartyKind {
    Customer = 1,
    Salesman = 2,
    Company = 3,
}

impl PartyKind {
    pub fn from_code(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Customer),
            2 => Some(Self::Salesman),
            3 => Some(Self::Company),
            _ => None,
        }
    }

    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Salesman => "salesman",
            Self::Company => "company",
        }
    }
}

impl std::fmt::Display for PartyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fields every party carries regardless of kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name_full: String,
    pub name_short: Option<String>,
    pub email1: Option<String>,
    pub email2: Option<String>,
    pub email3: Option<String>,
    pub phone1: Option<String>,
    pub phone2: Option<String>,
    pub phone3: Option<String>,
}

/// Kind-specific attributes. A company has none, so it cannot hold a salesman.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PartyProfile {
    Customer { area_name: String, salesman_id: Uuid },
    Salesman { address: Option<String> },
    Company,
}

impl PartyProfile {
    pub fn kind(&self) -> PartyKind {
        match self {
            Self::Customer { .. } => PartyKind::Customer,
            Self::Salesman { .. } => PartyKind::Salesman,
            Self::Company => PartyKind::Company,
        }
    }

    /// Salesman a customer is assigned to.
    pub fn salesman_id(&self) -> Option<Uuid> {
        match self {
            Self::Customer { salesman_id, .. } => Some(*salesman_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub party_id: Uuid,
    pub contact: ContactInfo,
    pub profile: PartyProfile,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Party {
    pub fn kind(&self) -> PartyKind {
        self.profile.kind()
    }

    pub fn name(&self) -> &str {
        &self.contact.name_full
    }
}

/// Input for creating or updating a party.
#[derive(Debug, Clone, PartialEq)]
pub struct PartyInput {
    pub contact: ContactInfo,
    pub profile: PartyProfile,
}

impl PartyInput {
    pub fn kind(&self) -> PartyKind {
        self.profile.kind()
    }
}
