// 🧾 Record Model - one student registration = one flat-file row
//
// Columns are positional. The schema decides whether the birth date
// column exists; a deployment picks one schema and keeps it.

use serde::{Deserialize, Serialize};

// ============================================================================
// SCHEMA
// ============================================================================

/// Column layout of the record file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schema {
    /// name, identifier, email, postal code, locality, street, district, number, complement
    #[default]
    Basic,

    /// Same as `Basic` with the birth date inserted after the email
    WithBirthDate,
}

impl Schema {
    /// Number of columns per row
    pub fn column_count(&self) -> usize {
        match self {
            Schema::Basic => 9,
            Schema::WithBirthDate => 10,
        }
    }

    /// Column titles, in file order (for list views; the file has no header)
    pub fn headers(&self) -> Vec<&'static str> {
        let mut headers = vec!["Full Name", "Identifier", "Email"];
        if *self == Schema::WithBirthDate {
            headers.push("Birth Date");
        }
        headers.extend([
            "Postal Code",
            "Locality",
            "Street",
            "District",
            "Number",
            "Complement",
        ]);
        headers
    }

    pub fn has_birth_date(&self) -> bool {
        *self == Schema::WithBirthDate
    }
}

// ============================================================================
// ADDRESS
// ============================================================================

/// Address triple derived from a postal code, never typed by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub locality: String,
    pub street: String,
    pub district: String,
}

impl Address {
    pub fn new(
        locality: impl Into<String>,
        street: impl Into<String>,
        district: impl Into<String>,
    ) -> Self {
        Address {
            locality: locality.into(),
            street: street.into(),
            district: district.into(),
        }
    }

    /// One-line rendering: "street, district - locality"
    pub fn format(&self) -> String {
        format!("{}, {} - {}", self.street, self.district, self.locality)
    }
}

// ============================================================================
// RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub full_name: String,
    /// Natural key, compared as a string
    pub identifier: String,
    pub email: String,
    /// `dd/mm/yyyy`, only stored by `Schema::WithBirthDate`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    pub postal_code: String,
    #[serde(flatten)]
    pub address: Address,
    pub number: String,
    pub complement: String,
}

impl Record {
    /// Row cells in file order for the given schema
    pub fn to_row(&self, schema: Schema) -> Vec<&str> {
        let mut row = vec![
            self.full_name.as_str(),
            self.identifier.as_str(),
            self.email.as_str(),
        ];
        if schema.has_birth_date() {
            row.push(self.birth_date.as_deref().unwrap_or(""));
        }
        row.extend([
            self.postal_code.as_str(),
            self.address.locality.as_str(),
            self.address.street.as_str(),
            self.address.district.as_str(),
            self.number.as_str(),
            self.complement.as_str(),
        ]);
        row
    }

    /// Build a record from row cells. Returns `None` when the cell count
    /// does not match the schema.
    pub fn from_row<'a, I>(cells: I, schema: Schema) -> Option<Record>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let cells: Vec<&str> = cells.into_iter().collect();
        if cells.len() != schema.column_count() {
            return None;
        }

        let owned = |i: usize| cells[i].to_string();
        let (birth_date, rest) = if schema.has_birth_date() {
            (Some(owned(3)), 4)
        } else {
            (None, 3)
        };

        Some(Record {
            full_name: owned(0),
            identifier: owned(1),
            email: owned(2),
            birth_date,
            postal_code: owned(rest),
            address: Address {
                locality: owned(rest + 1),
                street: owned(rest + 2),
                district: owned(rest + 3),
            },
            number: owned(rest + 4),
            complement: owned(rest + 5),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record {
            full_name: "Ana Silva".to_string(),
            identifier: "12345678901".to_string(),
            email: "ana@x.com".to_string(),
            birth_date: Some("15/05/1990".to_string()),
            postal_code: "01001000".to_string(),
            address: Address::new("São Paulo", "Praça da Sé", "Sé"),
            number: "100".to_string(),
            complement: "apto 1".to_string(),
        }
    }

    #[test]
    fn test_basic_row_layout() {
        let record = sample();
        let row = record.to_row(Schema::Basic);
        assert_eq!(row.len(), 9);
        assert_eq!(row[3], "01001000");
        assert_eq!(row[4], "São Paulo");
        assert_eq!(row[8], "apto 1");
    }

    #[test]
    fn test_birth_date_column_follows_email() {
        let record = sample();
        let row = record.to_row(Schema::WithBirthDate);
        assert_eq!(row.len(), 10);
        assert_eq!(row[2], "ana@x.com");
        assert_eq!(row[3], "15/05/1990");
        assert_eq!(row[4], "01001000");
    }

    #[test]
    fn test_basic_schema_drops_birth_date() {
        let record = sample();
        let row = record.to_row(Schema::Basic);
        let back = Record::from_row(row, Schema::Basic).unwrap();
        assert_eq!(back.birth_date, None);
        assert_eq!(back.address.street, "Praça da Sé");
    }

    #[test]
    fn test_from_row_rejects_wrong_width() {
        let record = sample();
        let row = record.to_row(Schema::WithBirthDate);
        assert!(Record::from_row(row, Schema::Basic).is_none());
    }

    #[test]
    fn test_headers_match_column_count() {
        for schema in [Schema::Basic, Schema::WithBirthDate] {
            assert_eq!(schema.headers().len(), schema.column_count());
        }
    }
}
