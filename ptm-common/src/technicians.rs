//! Technician roster
//!
//! Immutable value built once from configuration and handed to whichever
//! caller needs to map technician names or usernames to scheduling ids.

use crate::config::TechnicianConfig;
use serde::Serialize;

/// A technician known to the scheduling system
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Technician {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: Option<String>,
    pub active: bool,
}

impl From<&TechnicianConfig> for Technician {
    fn from(config: &TechnicianConfig) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone(),
            username: config.username.clone(),
            email: config.email.clone(),
            active: config.active,
        }
    }
}

/// Read-only collection of technicians, in configuration order
#[derive(Debug, Clone, Default)]
pub struct TechnicianRoster {
    technicians: Vec<Technician>,
}

impl TechnicianRoster {
    pub fn new(technicians: Vec<Technician>) -> Self {
        Self { technicians }
    }

    pub fn from_config(entries: &[TechnicianConfig]) -> Self {
        Self::new(entries.iter().map(Technician::from).collect())
    }

    pub fn len(&self) -> usize {
        self.technicians.len()
    }

    pub fn is_empty(&self) -> bool {
        self.technicians.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Technician> {
        self.technicians.iter()
    }

    /// Case-insensitive username lookup; surrounding whitespace is ignored
    pub fn find_by_username(&self, username: &str) -> Option<&Technician> {
        let wanted = username.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        self.technicians
            .iter()
            .find(|t| t.username.to_lowercase() == wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> TechnicianRoster {
        TechnicianRoster::new(vec![
            Technician {
                id: "usr_jp".into(),
                name: "Jean-Philippe".into(),
                username: "jeanphilippe".into(),
                email: None,
                active: true,
            },
            Technician {
                id: "usr_ni".into(),
                name: "Nicolas".into(),
                username: "Nicolas".into(),
                email: Some("nicolas@example.com".into()),
                active: false,
            },
        ])
    }

    #[test]
    fn test_find_by_username_ignores_case_and_whitespace() {
        let roster = roster();
        assert_eq!(roster.find_by_username(" JeanPhilippe ").unwrap().id, "usr_jp");
        assert_eq!(roster.find_by_username("nicolas").unwrap().id, "usr_ni");
        assert!(roster.find_by_username("jean-philippe").is_none());
        assert!(roster.find_by_username("  ").is_none());
    }

    #[test]
    fn test_lookup_keeps_inactive_entries() {
        let roster = roster();
        assert_eq!(roster.len(), 2);
        let nicolas = roster.find_by_username("NICOLAS").unwrap();
        assert!(!nicolas.active);
        let order: Vec<_> = roster.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec!["usr_jp", "usr_ni"]);
    }
}
