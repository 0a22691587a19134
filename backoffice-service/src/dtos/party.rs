use super::{de, required};
use crate::models::{ContactInfo, Party, PartyInput, PartyKind, PartyProfile};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PartyRequest {
    /// "1" customer, "2" salesman, "3" company. Names are accepted too.
    #[serde(default, rename = "type", deserialize_with = "de::opt_string")]
    pub party_type: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub name_full: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub name_short: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    #[serde(default, deserialize_with = "de::opt_string")]
    pub email1: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    #[serde(default, deserialize_with = "de::opt_string")]
    pub email2: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    #[serde(default, deserialize_with = "de::opt_string")]
    pub email3: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub phone1: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub phone2: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub phone3: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub area_name: Option<String>,
    #[serde(default, rename = "salesmanID", deserialize_with = "de::opt_uuid")]
    pub salesman_id: Option<Uuid>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub address: Option<String>,
}

pub fn parse_party_kind(value: &str) -> Result<PartyKind, AppError> {
    let kind = match value.parse::<i16>() {
        Ok(code) => PartyKind::from_code(code),
        Err(_) => match value.to_lowercase().as_str() {
            "customer" => Some(PartyKind::Customer),
            "salesman" => Some(PartyKind::Salesman),
            "company" => Some(PartyKind::Company),
            _ => None,
        },
    };
    kind.ok_or_else(|| AppError::BadRequest(anyhow!("Invalid party type: {}", value)))
}

impl PartyRequest {
    pub fn into_input(self) -> Result<PartyInput, AppError> {
        let kind = parse_party_kind(&required(self.party_type, "type")?)?;
        let profile = match kind {
            PartyKind::Customer => PartyProfile::Customer {
                area_name: self.area_name.unwrap_or_default(),
                salesman_id: required(self.salesman_id, "salesmanID")?,
            },
            PartyKind::Salesman => PartyProfile::Salesman {
                address: self.address,
            },
            PartyKind::Company => PartyProfile::Company,
        };
        Ok(PartyInput {
            contact: ContactInfo {
                name_full: self.name_full.unwrap_or_default(),
                name_short: self.name_short,
                email1: self.email1,
                email2: self.email2,
                email3: self.email3,
                phone1: self.phone1,
                phone2: self.phone2,
                phone3: self.phone3,
            },
            profile,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub party_type: String,
    pub kind: PartyKind,
    pub name_full: String,
    pub name_short: Option<String>,
    pub email1: Option<String>,
    pub email2: Option<String>,
    pub email3: Option<String>,
    pub phone1: Option<String>,
    pub phone2: Option<String>,
    pub phone3: Option<String>,
    pub area_name: Option<String>,
    #[serde(rename = "salesmanID")]
    pub salesman_id: Option<Uuid>,
    pub address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Party> for PartyResponse {
    fn from(party: Party) -> Self {
        let kind = party.kind();
        let (area_name, salesman_id, address) = match party.profile {
            PartyProfile::Customer {
                area_name,
                salesman_id,
            } => (Some(area_name), Some(salesman_id), None),
            PartyProfile::Salesman { address } => (None, None, address),
            PartyProfile::Company => (None, None, None),
        };
        let contact = party.contact;
        Self {
            id: party.party_id,
            party_type: kind.code().to_string(),
            kind,
            name_full: contact.name_full,
            name_short: contact.name_short,
            email1: contact.email1,
            email2: contact.email2,
            email3: contact.email3,
            phone1: contact.phone1,
            phone2: contact.phone2,
            phone3: contact.phone3,
            area_name,
            salesman_id,
            address,
            created_at: party.created_utc.to_rfc3339(),
            updated_at: party.updated_utc.to_rfc3339(),
        }
    }
}
