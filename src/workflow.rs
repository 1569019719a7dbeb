// 📝 Registration Workflow - create / find / update / delete
//
// Takes raw field strings, runs every validator, resolves the address
// from the postal code, and only then touches the store.
// Address fields are never taken from the caller.

use crate::config::AppConfig;
use crate::record::{Address, Record, Schema};
use crate::resolver::AddressResolver;
use crate::session::Session;
use crate::store::{RecordStore, StoreContents, StoreError};
use crate::validators::{
    validate_birth_date, validate_birth_date_at, validate_email, validate_full_name,
    validate_house_number, validate_identifier, validate_postal_code,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

// ============================================================================
// INPUT TYPES
// ============================================================================

/// Raw values of the registration form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Submission {
    pub full_name: String,
    pub identifier: String,
    pub email: String,
    /// Only read when the store uses `Schema::WithBirthDate`
    pub birth_date: Option<String>,
    pub postal_code: String,
    pub number: String,
    pub complement: String,
}

/// Editable fields of an existing registration.
/// Name and identifier are kept from the stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Changes {
    pub email: String,
    pub birth_date: Option<String>,
    pub postal_code: String,
    pub number: String,
    pub complement: String,
}

impl Changes {
    /// Pre-filled with the stored values, as the edit form shows them
    pub fn from_record(record: &Record) -> Self {
        Changes {
            email: record.email.clone(),
            birth_date: record.birth_date.clone(),
            postal_code: record.postal_code.clone(),
            number: record.number.clone(),
            complement: record.complement.clone(),
        }
    }
}

/// Which fields an update re-validates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevalidationPolicy {
    /// Fields equal to the stored value are accepted as they are
    #[default]
    ChangedOnly,
    /// Every editable field is validated, and the address re-resolved
    All,
}

// ============================================================================
// ERRORS
// ============================================================================

/// One rejected field. Display text is shown to the user verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Full name must contain only letters and a space between first and last name.")]
    FullName,

    #[error("Identifier must contain only digits and have 11 digits.")]
    Identifier,

    #[error("Invalid email.")]
    Email,

    #[error("Birth date must be in dd/mm/yyyy format.")]
    BirthDateFormat,

    #[error("Birth date must be between 1900 and 2024 and the student must be at least 18 years old.")]
    BirthDate,

    #[error("Postal code must contain only digits and have 8 digits.")]
    PostalCode,

    #[error("Postal code not found.")]
    AddressNotFound,

    #[error("House number must contain only digits.")]
    HouseNumber,
}

impl FieldError {
    /// Form field the error belongs to
    pub fn field(&self) -> &'static str {
        match self {
            FieldError::FullName => "full_name",
            FieldError::Identifier => "identifier",
            FieldError::Email => "email",
            FieldError::BirthDateFormat | FieldError::BirthDate => "birth_date",
            FieldError::PostalCode | FieldError::AddressNotFound => "postal_code",
            FieldError::HouseNumber => "number",
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// One or more fields failed; never empty
    #[error("{}", join_reasons(.0))]
    Invalid(Vec<FieldError>),

    #[error("Identifier {0} not found.")]
    NotFound(String),

    #[error("No registered students found.")]
    NoRecords,

    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

fn join_reasons(reasons: &[FieldError]) -> String {
    reasons
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl WorkflowError {
    /// Human-readable reasons, one per line of output
    pub fn messages(&self) -> Vec<String> {
        match self {
            WorkflowError::Invalid(reasons) => reasons.iter().map(|r| r.to_string()).collect(),
            other => vec![other.to_string()],
        }
    }

    /// Field failures, empty for the other variants
    pub fn reasons(&self) -> &[FieldError] {
        match self {
            WorkflowError::Invalid(reasons) => reasons,
            _ => &[],
        }
    }
}

// ============================================================================
// REGISTRAR
// ============================================================================

pub struct Registrar {
    store: RecordStore,
    resolver: AddressResolver,
    revalidation: RevalidationPolicy,
    /// Fixed year for the age rule; `None` reads the local clock
    current_year: Option<i32>,
}

impl Registrar {
    pub fn new(store: RecordStore, resolver: AddressResolver) -> Self {
        Registrar {
            store,
            resolver,
            revalidation: RevalidationPolicy::default(),
            current_year: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let resolver = AddressResolver::new(config.directory()?);
        Ok(Registrar::new(config.store(), resolver).with_revalidation(config.revalidation))
    }

    pub fn with_revalidation(mut self, policy: RevalidationPolicy) -> Self {
        self.revalidation = policy;
        self
    }

    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = Some(year);
        self
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn schema(&self) -> Schema {
        self.store.schema()
    }

    pub fn revalidation(&self) -> RevalidationPolicy {
        self.revalidation
    }

    fn check_birth_date(&self, raw: &str, errors: &mut Vec<FieldError>) {
        let verdict = match self.current_year {
            Some(year) => validate_birth_date_at(raw, year),
            None => validate_birth_date(raw),
        };
        match verdict {
            Ok(true) => {}
            Ok(false) => errors.push(FieldError::BirthDate),
            Err(_) => errors.push(FieldError::BirthDateFormat),
        }
    }

    /// Resolver runs only for a well-formed code. Either failure is recorded.
    fn resolve_postal_code(&self, postal_code: &str, errors: &mut Vec<FieldError>) -> Option<Address> {
        if !validate_postal_code(postal_code) {
            errors.push(FieldError::PostalCode);
            return None;
        }
        let address = self.resolver.resolve(postal_code);
        if address.is_none() {
            errors.push(FieldError::AddressNotFound);
        }
        address
    }

    /// Address for a postal code, for forms that show it while typing.
    pub fn preview_address(&self, postal_code: &str) -> Result<Address, FieldError> {
        let mut errors = Vec::new();
        match self.resolve_postal_code(postal_code, &mut errors) {
            Some(address) => Ok(address),
            None => Err(errors.first().copied().unwrap_or(FieldError::AddressNotFound)),
        }
    }

    /// Validate every field, resolve the address, append one row and mark
    /// the session as registered. All failures are reported together.
    #[instrument(skip_all, fields(identifier = %submission.identifier))]
    pub fn create(&self, session: &mut Session, submission: &Submission) -> Result<Record, WorkflowError> {
        let mut errors = Vec::new();

        if !validate_full_name(&submission.full_name) {
            errors.push(FieldError::FullName);
        }
        if !validate_identifier(&submission.identifier) {
            errors.push(FieldError::Identifier);
        }
        if !validate_email(&submission.email) {
            errors.push(FieldError::Email);
        }

        let birth_date = if self.schema().has_birth_date() {
            let raw = submission.birth_date.as_deref().unwrap_or("");
            self.check_birth_date(raw, &mut errors);
            Some(raw.to_string())
        } else {
            None
        };

        let address = self.resolve_postal_code(&submission.postal_code, &mut errors);

        if !validate_house_number(&submission.number) {
            errors.push(FieldError::HouseNumber);
        }

        let address = match (errors.is_empty(), address) {
            (true, Some(address)) => address,
            _ => {
                info!(failures = errors.len(), "registration rejected");
                return Err(WorkflowError::Invalid(errors));
            }
        };

        let record = Record {
            full_name: submission.full_name.clone(),
            identifier: submission.identifier.clone(),
            email: submission.email.clone(),
            birth_date,
            postal_code: submission.postal_code.clone(),
            address,
            number: submission.number.clone(),
            complement: submission.complement.clone(),
        };

        self.store.append(&record)?;
        session.mark_registered(&record.identifier);

        info!("registration created");
        Ok(record)
    }

    /// Stored record for an identifier.
    pub fn find(&self, identifier: &str) -> Result<Record, WorkflowError> {
        if !validate_identifier(identifier) {
            return Err(WorkflowError::Invalid(vec![FieldError::Identifier]));
        }

        let contents = self.store.load()?;
        if contents.is_vacant() {
            return Err(WorkflowError::NoRecords);
        }

        contents
            .into_records()
            .into_iter()
            .find(|r| r.identifier == identifier)
            .ok_or_else(|| WorkflowError::NotFound(identifier.to_string()))
    }

    /// Replace the stored record with the edited one. Nothing is written
    /// unless every checked field passes and the address resolves.
    #[instrument(skip_all, fields(identifier = %identifier))]
    pub fn update(&self, identifier: &str, changes: &Changes) -> Result<Record, WorkflowError> {
        let current = self.find(identifier)?;
        let policy = self.revalidation;
        let needs_check = |new: &str, old: &str| policy == RevalidationPolicy::All || new != old;

        let mut errors = Vec::new();

        if needs_check(changes.email.as_str(), current.email.as_str()) && !validate_email(&changes.email) {
            errors.push(FieldError::Email);
        }

        let birth_date = if self.schema().has_birth_date() {
            let raw = changes.birth_date.as_deref().unwrap_or("");
            if needs_check(raw, current.birth_date.as_deref().unwrap_or("")) {
                self.check_birth_date(raw, &mut errors);
            }
            Some(raw.to_string())
        } else {
            None
        };

        let address = if needs_check(changes.postal_code.as_str(), current.postal_code.as_str()) {
            self.resolve_postal_code(&changes.postal_code, &mut errors)
        } else {
            Some(current.address.clone())
        };

        if needs_check(changes.number.as_str(), current.number.as_str()) && !validate_house_number(&changes.number) {
            errors.push(FieldError::HouseNumber);
        }

        let address = match (errors.is_empty(), address) {
            (true, Some(address)) => address,
            _ => {
                info!(failures = errors.len(), "update rejected");
                return Err(WorkflowError::Invalid(errors));
            }
        };

        let record = Record {
            full_name: current.full_name,
            identifier: current.identifier,
            email: changes.email.clone(),
            birth_date,
            postal_code: changes.postal_code.clone(),
            address,
            number: changes.number.clone(),
            complement: changes.complement.clone(),
        };

        if !self.store.replace_by_identifier(identifier, &record)? {
            return Err(WorkflowError::NotFound(identifier.to_string()));
        }

        info!("registration updated");
        Ok(record)
    }

    /// Remove every row with this identifier.
    #[instrument(skip_all, fields(identifier = %identifier))]
    pub fn delete(&self, identifier: &str) -> Result<(), WorkflowError> {
        if !validate_identifier(identifier) {
            return Err(WorkflowError::Invalid(vec![FieldError::Identifier]));
        }

        if self.store.delete_by_identifier(identifier)? {
            info!("registration deleted");
            Ok(())
        } else {
            Err(WorkflowError::NotFound(identifier.to_string()))
        }
    }

    /// Whole store for list views
    pub fn list(&self) -> Result<StoreContents, WorkflowError> {
        Ok(self.store.load()?)
    }
}

impl std::fmt::Debug for Registrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registrar")
            .field("store", &self.store)
            .field("resolver", &self.resolver)
            .field("revalidation", &self.revalidation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::StaticPostalDirectory;
    use tempfile::TempDir;

    fn directory() -> StaticPostalDirectory {
        StaticPostalDirectory::new()
            .with_entry("01001000", Address::new("São Paulo", "Praça da Sé", "Sé"))
            .with_entry("20040002", Address::new("Rio de Janeiro", "Avenida Rio Branco", "Centro"))
    }

    fn registrar(schema: Schema) -> (TempDir, Registrar) {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("cadastros.csv"), schema);
        let registrar = Registrar::new(store, AddressResolver::new(Box::new(directory())))
            .with_current_year(2026);
        (dir, registrar)
    }

    fn ana() -> Submission {
        Submission {
            full_name: "Ana Silva".to_string(),
            identifier: "12345678901".to_string(),
            email: "ana@x.com".to_string(),
            birth_date: Some("15/05/1990".to_string()),
            postal_code: "01001000".to_string(),
            number: "100".to_string(),
            complement: "apto 12".to_string(),
        }
    }

    #[test]
    fn test_create_success_marks_session() {
        let (_dir, registrar) = registrar(Schema::Basic);
        let mut session = Session::new();

        let record = registrar.create(&mut session, &ana()).unwrap();

        assert_eq!(record.address.locality, "São Paulo");
        assert_eq!(record.birth_date, None);
        assert!(session.has_registration());
        assert_eq!(registrar.store().list().unwrap(), vec![record]);
    }

    #[test]
    fn test_create_accumulates_all_failures() {
        let (_dir, registrar) = registrar(Schema::WithBirthDate);
        let mut session = Session::new();
        let submission = Submission {
            full_name: "Ana".to_string(),
            identifier: "123".to_string(),
            email: "ana@x".to_string(),
            birth_date: Some("1990-05-15".to_string()),
            postal_code: "0100".to_string(),
            number: "s/n".to_string(),
            complement: String::new(),
        };

        let err = registrar.create(&mut session, &submission).unwrap_err();

        assert_eq!(
            err.reasons(),
            &[
                FieldError::FullName,
                FieldError::Identifier,
                FieldError::Email,
                FieldError::BirthDateFormat,
                FieldError::PostalCode,
                FieldError::HouseNumber,
            ]
        );
        assert_eq!(err.messages().len(), 6);
        assert!(!session.has_registration());
        assert!(!registrar.store().path().exists());
    }

    #[test]
    fn test_unresolved_postal_code_is_a_failure() {
        let (_dir, registrar) = registrar(Schema::Basic);
        let mut session = Session::new();
        let submission = Submission {
            postal_code: "99999999".to_string(),
            ..ana()
        };

        let err = registrar.create(&mut session, &submission).unwrap_err();

        assert_eq!(err.reasons(), &[FieldError::AddressNotFound]);
        assert_eq!(registrar.store().count().unwrap(), 0);
    }

    #[test]
    fn test_birth_date_schema_requires_adult() {
        let (_dir, registrar) = registrar(Schema::WithBirthDate);
        let mut session = Session::new();

        let young = Submission {
            birth_date: Some("01/01/2012".to_string()),
            ..ana()
        };
        let err = registrar.create(&mut session, &young).unwrap_err();
        assert_eq!(err.reasons(), &[FieldError::BirthDate]);

        let missing = Submission {
            birth_date: None,
            ..ana()
        };
        let err = registrar.create(&mut session, &missing).unwrap_err();
        assert_eq!(err.reasons(), &[FieldError::BirthDateFormat]);

        let record = registrar.create(&mut session, &ana()).unwrap();
        assert_eq!(record.birth_date.as_deref(), Some("15/05/1990"));
    }

    #[test]
    fn test_find_distinguishes_vacant_store() {
        let (_dir, registrar) = registrar(Schema::Basic);

        assert!(matches!(registrar.find("12345678901"), Err(WorkflowError::NoRecords)));
        assert!(matches!(
            registrar.find("123"),
            Err(WorkflowError::Invalid(ref r)) if r == &[FieldError::Identifier]
        ));

        registrar.create(&mut Session::new(), &ana()).unwrap();
        assert!(matches!(registrar.find("98765432100"), Err(WorkflowError::NotFound(_))));
        assert_eq!(registrar.find("12345678901").unwrap().full_name, "Ana Silva");
    }

    #[test]
    fn test_update_changes_address_through_resolver() {
        let (_dir, registrar) = registrar(Schema::Basic);
        let created = registrar.create(&mut Session::new(), &ana()).unwrap();

        let mut changes = Changes::from_record(&created);
        changes.postal_code = "20040002".to_string();
        changes.email = "ana@novo.com".to_string();

        let updated = registrar.update("12345678901", &changes).unwrap();

        assert_eq!(updated.full_name, "Ana Silva");
        assert_eq!(updated.address.locality, "Rio de Janeiro");
        assert_eq!(registrar.find("12345678901").unwrap(), updated);
    }

    #[test]
    fn test_update_with_unresolved_postal_code_writes_nothing() {
        let (_dir, registrar) = registrar(Schema::Basic);
        let created = registrar.create(&mut Session::new(), &ana()).unwrap();

        let mut changes = Changes::from_record(&created);
        changes.postal_code = "99999999".to_string();
        changes.complement = "casa".to_string();

        let err = registrar.update("12345678901", &changes).unwrap_err();
        assert_eq!(err.reasons(), &[FieldError::AddressNotFound]);
        assert_eq!(registrar.find("12345678901").unwrap(), created);
    }

    #[test]
    fn test_update_unknown_identifier() {
        let (_dir, registrar) = registrar(Schema::Basic);
        let created = registrar.create(&mut Session::new(), &ana()).unwrap();

        let err = registrar
            .update("98765432100", &Changes::from_record(&created))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }

    #[test]
    fn test_changed_only_accepts_unchanged_legacy_value() {
        let (_dir, registrar) = registrar(Schema::Basic);
        // A row written by an older form that allowed any house number
        let legacy = Record {
            full_name: "Ana Silva".to_string(),
            identifier: "12345678901".to_string(),
            email: "ana@x.com".to_string(),
            birth_date: None,
            postal_code: "01001000".to_string(),
            address: Address::new("São Paulo", "Praça da Sé", "Sé"),
            number: "s/n".to_string(),
            complement: String::new(),
        };
        registrar.store().append(&legacy).unwrap();

        let mut changes = Changes::from_record(&legacy);
        changes.complement = "fundos".to_string();

        let updated = registrar.update("12345678901", &changes).unwrap();
        assert_eq!(updated.number, "s/n");
        assert_eq!(updated.complement, "fundos");

        let strict = Registrar::new(
            registrar.store().clone(),
            AddressResolver::new(Box::new(directory())),
        )
        .with_revalidation(RevalidationPolicy::All);
        let err = strict.update("12345678901", &changes).unwrap_err();
        assert_eq!(err.reasons(), &[FieldError::HouseNumber]);
    }

    #[test]
    fn test_all_policy_re_resolves_unchanged_postal_code() {
        let (dir, registrar) = registrar(Schema::Basic);
        let created = registrar.create(&mut Session::new(), &ana()).unwrap();

        // Directory no longer knows the stored code
        let strict = Registrar::new(
            RecordStore::new(dir.path().join("cadastros.csv"), Schema::Basic),
            AddressResolver::new(Box::new(StaticPostalDirectory::new())),
        )
        .with_revalidation(RevalidationPolicy::All);
        let err = strict
            .update("12345678901", &Changes::from_record(&created))
            .unwrap_err();
        assert_eq!(err.reasons(), &[FieldError::AddressNotFound]);

        let lenient = Registrar::new(
            RecordStore::new(dir.path().join("cadastros.csv"), Schema::Basic),
            AddressResolver::new(Box::new(StaticPostalDirectory::new())),
        );
        let updated = lenient
            .update("12345678901", &Changes::from_record(&created))
            .unwrap();
        assert_eq!(updated.address, created.address);
    }

    #[test]
    fn test_delete_reports_from_store_signal() {
        let (_dir, registrar) = registrar(Schema::Basic);

        assert!(matches!(registrar.delete("12345678901"), Err(WorkflowError::NotFound(_))));

        registrar.create(&mut Session::new(), &ana()).unwrap();
        registrar.delete("12345678901").unwrap();
        assert!(matches!(registrar.delete("12345678901"), Err(WorkflowError::NotFound(_))));

        let err = registrar.delete("123").unwrap_err();
        assert_eq!(err.reasons(), &[FieldError::Identifier]);
    }

    #[test]
    fn test_preview_address() {
        let (_dir, registrar) = registrar(Schema::Basic);
        assert_eq!(
            registrar.preview_address("01001000").unwrap().street,
            "Praça da Sé"
        );
        assert_eq!(registrar.preview_address("0100"), Err(FieldError::PostalCode));
        assert_eq!(registrar.preview_address("99999999"), Err(FieldError::AddressNotFound));
    }

    #[test]
    fn test_field_names() {
        assert_eq!(FieldError::AddressNotFound.field(), "postal_code");
        assert_eq!(FieldError::BirthDateFormat.field(), "birth_date");
    }
}
