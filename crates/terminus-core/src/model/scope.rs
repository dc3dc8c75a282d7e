// ── Collection scope and command addressing ──
//
// A `Scope` is the fetch key of a collection: the parent ids needed to
// address its listing endpoint. Models carry a copy of their collection's
// scope instead of a pointer back to the collection.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// The owner a collection (and each of its models) hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Top-level resources addressed only by their own id.
    Root,
    User {
        user_id: String,
    },
    Organization {
        org_id: String,
    },
    Site {
        site_id: String,
    },
    Environment {
        site_id: String,
        env_id: String,
    },
}

impl Scope {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self::User {
            user_id: user_id.into(),
        }
    }

    pub fn organization(org_id: impl Into<String>) -> Self {
        Self::Organization {
            org_id: org_id.into(),
        }
    }

    pub fn site(site_id: impl Into<String>) -> Self {
        Self::Site {
            site_id: site_id.into(),
        }
    }

    pub fn environment(site_id: impl Into<String>, env_id: impl Into<String>) -> Self {
        Self::Environment {
            site_id: site_id.into(),
            env_id: env_id.into(),
        }
    }

    /// Owning site id, for site and environment scopes.
    pub fn site_id(&self) -> Option<&str> {
        match self {
            Self::Site { site_id } | Self::Environment { site_id, .. } => Some(site_id),
            _ => None,
        }
    }

    /// Owning environment id, for environment scopes.
    pub fn env_id(&self) -> Option<&str> {
        match self {
            Self::Environment { env_id, .. } => Some(env_id),
            _ => None,
        }
    }

    /// API path of the owner itself, e.g. `sites/{id}/environments/{env}`.
    pub fn owner_path(&self) -> Option<String> {
        match self {
            Self::Root => None,
            Self::User { user_id } => Some(format!("users/{user_id}")),
            Self::Organization { org_id } => Some(format!("organizations/{org_id}")),
            Self::Site { site_id } => Some(format!("sites/{site_id}")),
            Self::Environment { site_id, env_id } => {
                Some(format!("sites/{site_id}/environments/{env_id}"))
            }
        }
    }

    pub(crate) fn require_site(&self, entity_type: &'static str) -> Result<&str, CoreError> {
        self.site_id().ok_or_else(|| unsupported(entity_type, self))
    }

    pub(crate) fn require_environment(
        &self,
        entity_type: &'static str,
    ) -> Result<(&str, &str), CoreError> {
        match self {
            Self::Environment { site_id, env_id } => Ok((site_id, env_id)),
            _ => Err(unsupported(entity_type, self)),
        }
    }
}

pub(crate) fn unsupported(entity_type: &'static str, scope: &Scope) -> CoreError {
    CoreError::validation(format!("{entity_type} resources are not addressable under {scope}"))
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.owner_path() {
            Some(path) => f.write_str(&path),
            None => f.write_str("the API root"),
        }
    }
}

// ── Command addressing ──────────────────────────────────────────────

/// A `<site>.<environment>` locator as typed on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteEnv {
    pub site: String,
    pub env: String,
}

impl FromStr for SiteEnv {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((site, env)) if !site.is_empty() && !env.is_empty() && !env.contains('.') => {
                Ok(Self {
                    site: site.to_owned(),
                    env: env.to_owned(),
                })
            }
            _ => Err(CoreError::validation(format!(
                "'{s}' is not a valid <site>.<env> locator"
            ))),
        }
    }
}

impl fmt::Display for SiteEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.site, self.env)
    }
}
