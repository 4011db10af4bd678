use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizdesk_core::{DomainError, DomainResult};

/// Firm identifier, assigned by the caller (unique within a collection).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FirmId(String);

impl FirmId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for FirmId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FirmId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FirmId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Firm status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirmStatus {
    #[default]
    Active,
    Inactive,
    Pending,
}

/// A registered firm.
///
/// Serialized camelCase to match the persisted `firm-storage` layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Firm {
    pub id: FirmId,
    pub name: String,
    pub registration_number: String,
    pub industry: String,
    pub status: FirmStatus,
    pub employee_count: u32,
    pub location: String,
    pub established_date: NaiveDate,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub revenue: f64,
    pub description: String,
}

impl Firm {
    /// Minimal firm with the given id and name; other fields take defaults.
    pub fn new(id: impl Into<FirmId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            registration_number: String::new(),
            industry: String::new(),
            status: FirmStatus::default(),
            employee_count: 0,
            location: String::new(),
            established_date: NaiveDate::default(),
            contact_person: String::new(),
            email: String::new(),
            phone: String::new(),
            revenue: 0.0,
            description: String::new(),
        }
    }

    /// Merge a patch into this firm. The id never changes.
    pub fn apply(&mut self, patch: FirmPatch) {
        let FirmPatch {
            name,
            registration_number,
            industry,
            status,
            employee_count,
            location,
            established_date,
            contact_person,
            email,
            phone,
            revenue,
            description,
        } = patch;

        if let Some(v) = name {
            self.name = v;
        }
        if let Some(v) = registration_number {
            self.registration_number = v;
        }
        if let Some(v) = industry {
            self.industry = v;
        }
        if let Some(v) = status {
            self.status = v;
        }
        if let Some(v) = employee_count {
            self.employee_count = v;
        }
        if let Some(v) = location {
            self.location = v;
        }
        if let Some(v) = established_date {
            self.established_date = v;
        }
        if let Some(v) = contact_person {
            self.contact_person = v;
        }
        if let Some(v) = email {
            self.email = v;
        }
        if let Some(v) = phone {
            self.phone = v;
        }
        if let Some(v) = revenue {
            self.revenue = v;
        }
        if let Some(v) = description {
            self.description = v;
        }
    }
}

/// Partial update for a [`Firm`] (if a field is None, keep existing).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FirmPatch {
    pub name: Option<String>,
    pub registration_number: Option<String>,
    pub industry: Option<String>,
    pub status: Option<FirmStatus>,
    pub employee_count: Option<u32>,
    pub location: Option<String>,
    pub established_date: Option<NaiveDate>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub revenue: Option<f64>,
    pub description: Option<String>,
}

/// The firm collection, insertion-ordered.
///
/// Every operation either applies fully or leaves the collection untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirmsState {
    #[serde(default)]
    pub firms: Vec<Firm>,
}

impl FirmsState {
    pub fn new(firms: Vec<Firm>) -> Self {
        Self { firms }
    }

    pub fn get(&self, id: &FirmId) -> Option<&Firm> {
        self.firms.iter().find(|f| &f.id == id)
    }

    pub fn len(&self) -> usize {
        self.firms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.firms.is_empty()
    }

    /// Append a firm; ids must be non-empty and unique. Other fields are
    /// stored as given.
    pub fn add(&mut self, firm: Firm) -> DomainResult<()> {
        if firm.id.as_str().trim().is_empty() {
            return Err(DomainError::validation("firm id cannot be empty"));
        }
        if self.get(&firm.id).is_some() {
            return Err(DomainError::conflict(format!(
                "firm id '{}' already exists",
                firm.id
            )));
        }

        self.firms.push(firm);
        Ok(())
    }

    /// Merge `patch` into the firm with `id`. Never inserts.
    pub fn update(&mut self, id: &FirmId, patch: FirmPatch) -> DomainResult<()> {
        let firm = self
            .firms
            .iter_mut()
            .find(|f| &f.id == id)
            .ok_or_else(|| DomainError::not_found(format!("firm '{id}'")))?;

        firm.apply(patch);
        Ok(())
    }

    pub fn delete(&mut self, id: &FirmId) -> DomainResult<Firm> {
        let idx = self
            .firms
            .iter()
            .position(|f| &f.id == id)
            .ok_or_else(|| DomainError::not_found(format!("firm '{id}'")))?;

        Ok(self.firms.remove(idx))
    }
}
