//! Configuration payload handling
//!
//! The payload is plain text, one device command per line. Blank lines and
//! `!` comment lines are carried in the raw text but dropped at deployment
//! time.

/// Findings from a payload validation pass.
///
/// Validation never blocks a deployment; it backs the `--check` command and
/// pre-run log output.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Raw configuration text for one run
#[derive(Debug, Clone)]
pub struct ConfigPayload {
    raw: String,
}

impl ConfigPayload {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// True when nothing but whitespace is present
    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }

    /// Trimmed command lines with blanks and `!` comments removed, in order
    pub fn effective_lines(&self) -> Vec<String> {
        self.raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('!'))
            .map(str::to_string)
            .collect()
    }

    /// Check for common configuration pitfalls.
    ///
    /// Unbalanced quotes are errors; a missing `hostname` command and
    /// interior tab characters are warnings.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        let has_hostname = self
            .raw
            .lines()
            .any(|line| line.to_lowercase().contains("hostname"));
        if !has_hostname {
            report
                .warnings
                .push("No hostname configuration found".to_string());
        }

        for (number, line) in self.raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('!') {
                continue;
            }

            if line.matches('"').count() % 2 != 0 {
                report
                    .errors
                    .push(format!("Line {}: Unclosed quotes", number + 1));
            }

            if line.contains('\t') {
                report.warnings.push(format!(
                    "Line {}: Contains tabs (use spaces instead)",
                    number + 1
                ));
            }
        }

        report
    }
}
