//! Offline template inspection
//!
//! Lists the placeholders of a local template and checks each group against
//! the configured secret groups, without contacting AWS.

use serde::Serialize;

use crate::placeholder::{self, Placeholder};
use crate::secret_source::SecretGroups;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanEntry {
    pub key_path: String,
    pub group: String,
    pub path: Vec<String>,
    /// How many times the token appears
    pub occurrences: usize,
    /// Whether a secret source is bound to the group
    pub configured: bool,
    /// `remote` or `inline`, when configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<&'static str>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub placeholders: Vec<ScanEntry>,
    /// Key paths without a nested key
    pub malformed: Vec<String>,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty()
    }

    pub fn unconfigured(&self) -> impl Iterator<Item = &ScanEntry> {
        self.placeholders.iter().filter(|e| !e.configured)
    }

    /// Human readable listing
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.placeholders {
            let status = match entry.strategy {
                Some(strategy) => format!("configured ({strategy})"),
                None => "UNCONFIGURED".to_string(),
            };
            out.push_str(&format!(
                "{} x{} [{}]\n",
                placeholder::token_for(&entry.key_path),
                entry.occurrences,
                status
            ));
        }
        for key_path in &self.malformed {
            out.push_str(&format!(
                "{} [MALFORMED: no key after group]\n",
                placeholder::token_for(key_path)
            ));
        }
        out.push_str(&format!(
            "{} placeholder(s), {} unconfigured, {} malformed\n",
            self.placeholders.len(),
            self.unconfigured().count(),
            self.malformed.len()
        ));
        out
    }
}

/// Inspect `template` against `groups`
pub fn scan_template(template: &str, groups: &SecretGroups) -> ScanReport {
    let all = placeholder::scan(template);
    let mut report = ScanReport::default();

    for key_path in placeholder::scan_unique(template) {
        match Placeholder::parse(key_path) {
            Ok(p) => {
                let reference = groups.get(&p.group);
                report.placeholders.push(ScanEntry {
                    occurrences: all.iter().filter(|k| **k == key_path).count(),
                    configured: reference.is_some(),
                    strategy: reference.map(|r| r.strategy()),
                    key_path: p.key_path,
                    group: p.group,
                    path: p.path,
                });
            }
            Err(_) => report.malformed.push(key_path.to_string()),
        }
    }

    report
}
