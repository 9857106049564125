//! Dataset layout
//!
//! The dataset is a UTF-8 CSV prefixed with a byte-order mark so spreadsheet
//! tools detect the encoding. Column order is fixed.

use csv::StringRecord;

/// UTF-8 byte-order mark written at the start of every dataset file
pub const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Number of columns in a dataset row
pub const COLUMN_COUNT: usize = 15;

/// Dataset header, in column order
pub const HEADER: [&str; COLUMN_COUNT] = [
    "title",
    "salary",
    "company",
    "company_size",
    "funding_stage",
    "industry",
    "experience",
    "education",
    "tags",
    "work_address",
    "description",
    "responsibilities",
    "requirements",
    "benefits",
    "interview_address",
];

/// One job listing. Absent fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRecord {
    pub title: String,
    pub salary: String,
    pub company: String,
    pub company_size: String,
    pub funding_stage: String,
    pub industry: String,
    pub experience: String,
    pub education: String,
    /// Space-joined tag list
    pub tags: String,
    pub work_address: String,
    pub description: String,
    pub responsibilities: String,
    pub requirements: String,
    /// Space-joined benefit list
    pub benefits: String,
    pub interview_address: String,
}

impl JobRecord {
    /// Fields in column order
    pub fn to_row(&self) -> [&str; COLUMN_COUNT] {
        [
            &self.title,
            &self.salary,
            &self.company,
            &self.company_size,
            &self.funding_stage,
            &self.industry,
            &self.experience,
            &self.education,
            &self.tags,
            &self.work_address,
            &self.description,
            &self.responsibilities,
            &self.requirements,
            &self.benefits,
            &self.interview_address,
        ]
    }

    /// Rebuilds a record from a dataset row
    ///
    /// Returns None for rows with fewer than [`COLUMN_COUNT`] fields. Extra
    /// trailing fields are ignored.
    pub fn from_row(row: &StringRecord) -> Option<Self> {
        if row.len() < COLUMN_COUNT {
            return None;
        }
        let field = |i: usize| row.get(i).unwrap_or_default().to_string();

        Some(Self {
            title: field(0),
            salary: field(1),
            company: field(2),
            company_size: field(3),
            funding_stage: field(4),
            industry: field(5),
            experience: field(6),
            education: field(7),
            tags: field(8),
            work_address: field(9),
            description: field(10),
            responsibilities: field(11),
            requirements: field(12),
            benefits: field(13),
            interview_address: field(14),
        })
    }
}
