//! Field values entered for a document run, and the placeholder map they
//! produce.
//!
//! A fields file is TOML:
//!
//! ```toml
//! [letter]
//! date = "2024-05-01"
//! company = "My Client Company Pvt Ltd"
//! address1 = "123 Business Park"
//!
//! [nav]
//! valuation_date = "2024-03-31"
//! company = "My Client Company Pvt Ltd"
//!
//! [extra]
//! "<<engagement_fee>>" = "50,000"
//! ```

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%d-%b-%Y";

/// Token → replacement text.
pub type Placeholders = BTreeMap<String, String>;

/// Fields of the standard firm letters (board resolution, engagement letter,
/// representation letter). Tokens are `<<name>>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentFields {
    /// Defaults to today.
    pub date: Option<NaiveDate>,
    pub company: String,
    pub valuation_statement: String,
    pub authority: String,
    pub designation: String,
    /// Salutation, e.g. "Sir".
    pub addressed_to: String,
    pub address1: String,
    pub address2: String,
    pub address3: String,
    pub group_designation: String,
}

impl DocumentFields {
    pub fn full_address(&self) -> String {
        format!("{}, {}, {}", self.address1, self.address2, self.address3)
    }

    pub fn placeholders(&self) -> Placeholders {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        let address = self.full_address();
        [
            ("<<date>>", date.format(DATE_FORMAT).to_string()),
            ("<<company>>", self.company.clone()),
            ("<<company_caps>>", self.company.to_uppercase()),
            ("<<valuation_type_statement>>", self.valuation_statement.clone()),
            ("<<authority>>", self.authority.clone()),
            ("<<designation>>", self.designation.clone()),
            ("<<addressed_to>>", self.addressed_to.clone()),
            ("<<address_caps>>", address.to_uppercase()),
            ("<<address>>", address),
            ("<<address1>>", self.address1.clone()),
            ("<<address2>>", self.address2.clone()),
            ("<<address3>>", self.address3.clone()),
            ("<<group_designation>>", self.group_designation.clone()),
            ("<<authority_designation>>", self.designation.clone()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

/// Fields of the NAV valuation report. Tokens are `{{name}}`; the spaced
/// form `{{ name }}` is filled too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavReportFields {
    pub valuation_date: Option<NaiveDate>,
    pub company: String,
    pub directed_to: String,
    pub appointing_company: String,
    pub appointing_company_address: String,
    /// Line breaks are kept.
    pub appointing_company_3line_address: String,
}

impl NavReportFields {
    pub fn placeholders(&self) -> Placeholders {
        let date = self
            .valuation_date
            .unwrap_or_else(|| Local::now().date_naive());
        let values = [
            ("valuation_date", date.format(DATE_FORMAT).to_string()),
            ("company", self.company.clone()),
            ("directed_to", self.directed_to.clone()),
            ("appointing_company", self.appointing_company.clone()),
            ("appointing_company_address", self.appointing_company_address.clone()),
            (
                "appointing_company_3line_address",
                self.appointing_company_3line_address.clone(),
            ),
        ];
        let mut out = Placeholders::new();
        for (name, value) in values {
            out.insert(format!("{{{{{name}}}}}"), value.clone());
            out.insert(format!("{{{{ {name} }}}}"), value);
        }
        out
    }

    /// Download name of a generated report, e.g. `NAV_Report_Acme_Ltd.docx`.
    pub fn report_file_name(&self) -> String {
        format!("NAV_Report_{}.docx", self.company.replace(' ', "_"))
    }
}

/// Everything a fields file may carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldsFile {
    pub letter: Option<DocumentFields>,
    pub nav: Option<NavReportFields>,
    /// Literal tokens; these win over the generated ones.
    pub extra: Placeholders,
}

impl FieldsFile {
    pub fn placeholders(&self) -> Placeholders {
        let mut out = Placeholders::new();
        if let Some(letter) = &self.letter {
            out.extend(letter.placeholders());
        }
        if let Some(nav) = &self.nav {
            out.extend(nav.placeholders());
        }
        out.extend(self.extra.clone());
        out
    }
}
