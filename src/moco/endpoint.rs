use reqwest::Url;

use crate::{catalog::ProjectId, config::ConfigError};

/// Host every MOCO company lives under.
pub const SERVICE_HOST: &str = "mocoapp.com";

/// Resolved API urls for one company. Built once per operation from the configured domain, so
/// an invalid domain fails before any request is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MocoEndpoint {
    assigned_projects: Url,
    tasks: Url,
    activities: Url,
}

impl MocoEndpoint {
    /// Accepts either the bare company name (`acme`) or the full host (`acme.mocoapp.com`).
    pub fn new(domain: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidDomain(domain.to_string());

        let trimmed = domain.trim().trim_end_matches('/');
        let trimmed = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);
        let company = trimmed
            .strip_suffix(SERVICE_HOST)
            .and_then(|v| v.strip_suffix('.'))
            .unwrap_or(trimmed);

        if !is_valid_label(company) {
            return Err(invalid());
        }

        let base = Url::parse(&format!("https://{company}.{SERVICE_HOST}/api/v1/"))
            .map_err(|_| invalid())?;

        Ok(Self {
            assigned_projects: base.join("projects/assigned").map_err(|_| invalid())?,
            tasks: base.join("tasks").map_err(|_| invalid())?,
            activities: base.join("activities").map_err(|_| invalid())?,
        })
    }

    pub fn assigned_projects(&self) -> Url {
        self.assigned_projects.clone()
    }

    pub fn tasks(&self, project_id: ProjectId) -> Url {
        let mut url = self.tasks.clone();
        url.query_pairs_mut()
            .append_pair("project_id", &project_id.to_string());
        url
    }

    pub fn activities(&self) -> Url {
        self.activities.clone()
    }
}

/// A single DNS label: letters, digits and inner hyphens.
fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
