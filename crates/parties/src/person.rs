use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use brokerdesk_core::{DomainError, DomainResult, Entity, PersonId, Timestamps, Versioned};

const MAX_NAME_LEN: usize = 200;

/// Person kind: client (buys services) or provider (translator, notary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonKind {
    Client,
    Provider,
}

/// Contact information for a person.
///
/// The phone number is stored as entered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Input for registering a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
    pub kind: PersonKind,
    pub name: String,
    pub tax_id: Option<String>,
    pub contact: ContactInfo,
    pub note: Option<String>,
}

impl NewPerson {
    pub fn client(name: impl Into<String>) -> Self {
        Self {
            kind: PersonKind::Client,
            name: name.into(),
            tax_id: None,
            contact: ContactInfo::default(),
            note: None,
        }
    }

    pub fn provider(name: impl Into<String>) -> Self {
        Self {
            kind: PersonKind::Provider,
            ..Self::client(name)
        }
    }
}

/// Partial edit of a person; `None` keeps the current value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonChanges {
    pub name: Option<String>,
    /// `Some(None)` clears the tax id.
    pub tax_id: Option<Option<String>>,
    pub contact: Option<ContactInfo>,
    pub note: Option<Option<String>>,
}

/// A client or provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    id: PersonId,
    kind: PersonKind,
    name: String,
    tax_id: Option<String>,
    contact: ContactInfo,
    note: Option<String>,
    active: bool,
    timestamps: Timestamps,
    version: u64,
}

impl Person {
    pub fn register(id: PersonId, input: NewPerson, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = validate_name(&input.name)?;
        let tax_id = input.tax_id.as_deref().map(normalize_tax_id).transpose()?;
        validate_contact(&input.contact)?;

        Ok(Self {
            id,
            kind: input.kind,
            name,
            tax_id,
            contact: input.contact,
            note: input.note.filter(|n| !n.trim().is_empty()),
            active: true,
            timestamps: Timestamps::new(now),
            version: 1,
        })
    }

    pub fn kind(&self) -> PersonKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tax_id(&self) -> Option<&str> {
        self.tax_id.as_deref()
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    /// Inactive persons cannot appear on new documents.
    pub fn can_transact(&self) -> bool {
        self.active
    }

    /// Apply an edit. Validation happens before anything is changed.
    pub fn update(&mut self, changes: PersonChanges, now: DateTime<Utc>) -> DomainResult<()> {
        let name = changes.name.as_deref().map(validate_name).transpose()?;
        let tax_id = match &changes.tax_id {
            Some(Some(raw)) => Some(Some(normalize_tax_id(raw)?)),
            Some(None) => Some(None),
            None => None,
        };
        if let Some(contact) = &changes.contact {
            validate_contact(contact)?;
        }

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(tax_id) = tax_id {
            self.tax_id = tax_id;
        }
        if let Some(contact) = changes.contact {
            self.contact = contact;
        }
        if let Some(note) = changes.note {
            self.note = note.filter(|n| !n.trim().is_empty());
        }
        self.bump(now);
        Ok(())
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.active {
            return Err(DomainError::conflict("person is already inactive"));
        }
        self.active = false;
        self.bump(now);
        Ok(())
    }

    pub fn reactivate(&mut self, now: DateTime<Utc>) {
        if !self.active {
            self.active = true;
            self.bump(now);
        }
    }

    fn bump(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.timestamps.touch(now);
    }
}

impl Entity for Person {
    type Id = PersonId;

    fn id(&self) -> PersonId {
        self.id
    }
}

impl Versioned for Person {
    fn version(&self) -> u64 {
        self.version
    }
}

fn validate_name(raw: &str) -> DomainResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::validation("person name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "person name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// Polish NIP: 10 digits, separators (`-`, spaces) are dropped.
fn normalize_tax_id(raw: &str) -> DomainResult<String> {
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .collect();
    if digits.len() != 10 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(DomainError::validation(format!(
            "tax id must have 10 digits, got {raw:?}"
        )));
    }
    Ok(digits)
}

fn validate_contact(contact: &ContactInfo) -> DomainResult<()> {
    if let Some(email) = &contact.email {
        if !email.contains('@') {
            return Err(DomainError::validation(format!("invalid email: {email}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn client() -> Person {
        Person::register(PersonId::new(), NewPerson::client("  Anna Nowak "), now()).unwrap()
    }

    #[test]
    fn register_trims_name_and_starts_active() {
        let person = client();
        assert_eq!(person.name(), "Anna Nowak");
        assert_eq!(person.kind(), PersonKind::Client);
        assert!(person.can_transact());
        assert_eq!(person.version(), 1);
    }

    #[test]
    fn register_rejects_empty_name() {
        let err = Person::register(PersonId::new(), NewPerson::client("   "), now()).unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("name cannot be empty") => {}
            _ => panic!("Expected Validation error for empty name"),
        }
    }

    #[test]
    fn tax_id_is_normalized() {
        let mut input = NewPerson::provider("Biuro Tłumaczeń");
        input.tax_id = Some("123-456-78-90".to_string());
        let person = Person::register(PersonId::new(), input, now()).unwrap();
        assert_eq!(person.tax_id(), Some("1234567890"));
    }

    #[test]
    fn malformed_tax_id_is_rejected() {
        let mut input = NewPerson::provider("X");
        input.tax_id = Some("12345".to_string());
        assert!(Person::register(PersonId::new(), input, now()).is_err());
    }

    #[test]
    fn failed_update_changes_nothing() {
        let mut person = client();
        let before = person.clone();
        let changes = PersonChanges {
            name: Some("Jan Kowalski".to_string()),
            contact: Some(ContactInfo {
                email: Some("broken".to_string()),
                ..ContactInfo::default()
            }),
            ..PersonChanges::default()
        };
        assert!(person.update(changes, now()).is_err());
        assert_eq!(person, before);
    }

    #[test]
    fn update_can_clear_tax_id() {
        let mut input = NewPerson::client("Firma");
        input.tax_id = Some("1234567890".to_string());
        let mut person = Person::register(PersonId::new(), input, now()).unwrap();

        person
            .update(
                PersonChanges {
                    tax_id: Some(None),
                    ..PersonChanges::default()
                },
                now(),
            )
            .unwrap();
        assert_eq!(person.tax_id(), None);
        assert_eq!(person.version(), 2);
    }

    #[test]
    fn deactivate_twice_conflicts() {
        let mut person = client();
        person.deactivate(now()).unwrap();
        assert!(!person.can_transact());
        assert!(matches!(person.deactivate(now()), Err(DomainError::Conflict(_))));
        person.reactivate(now());
        assert!(person.can_transact());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: any separator layout of 10 digits normalizes to the bare digits.
            #[test]
            fn tax_id_separators_are_ignored(digits in "[0-9]{10}") {
                let spaced = format!("{}-{} {}", &digits[..3], &digits[3..6], &digits[6..]);
                prop_assert_eq!(normalize_tax_id(&spaced).unwrap(), digits);
            }
        }
    }
}
