//! Roles, application sections and the static role -> permission table.
//!
//! The table is keyed by the closed `Role` enum and stored as a fixed array, so
//! once a `PermissionTable` exists every role has an entry. Tables loaded from
//! JSON are validated to cover every role before they are accepted.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Production Manager")]
    ProductionManager,
    #[serde(rename = "Director")]
    Director,
    #[serde(rename = "Assistant Director")]
    AssistantDirector,
    #[serde(rename = "Production Coordinator")]
    ProductionCoordinator,
    #[serde(rename = "Cast Member")]
    CastMember,
    #[serde(rename = "Crew Member")]
    CrewMember,
}

impl Role {
    pub const COUNT: usize = 6;

    /// Every role, in the order the signup form lists them.
    pub const ALL: [Role; Role::COUNT] = [
        Role::ProductionManager,
        Role::Director,
        Role::AssistantDirector,
        Role::ProductionCoordinator,
        Role::CastMember,
        Role::CrewMember,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::ProductionManager => "Production Manager",
            Role::Director => "Director",
            Role::AssistantDirector => "Assistant Director",
            Role::ProductionCoordinator => "Production Coordinator",
            Role::CastMember => "Cast Member",
            Role::CrewMember => "Crew Member",
        }
    }

    /// Exact, case-sensitive match against the display names.
    pub fn parse(name: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.as_str() == name)
    }

    fn index(&self) -> usize {
        match self {
            Role::ProductionManager => 0,
            Role::Director => 1,
            Role::AssistantDirector => 2,
            Role::ProductionCoordinator => 3,
            Role::CastMember => 4,
            Role::CrewMember => 5,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
    type Err = AppError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| AppError::user("unknown_role".to_string(), format!("unknown role '{}'", s)))
    }
}

/// One gated application area. Declaration order is the navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    Dashboard,
    Projects,
    Budget,
    CastCrew,
    Schedule,
    Tasks,
    Assets,
    Locations,
    Communication,
    Reports,
    Feedback,
}

impl Section {
    pub const ALL: [Section; 11] = [
        Section::Dashboard,
        Section::Projects,
        Section::Budget,
        Section::CastCrew,
        Section::Schedule,
        Section::Tasks,
        Section::Assets,
        Section::Locations,
        Section::Communication,
        Section::Reports,
        Section::Feedback,
    ];

    /// Flag name used in serialized permission sets.
    pub fn key(&self) -> &'static str {
        match self {
            Section::Dashboard => "dashboard",
            Section::Projects => "projects",
            Section::Budget => "budget",
            Section::CastCrew => "castCrew",
            Section::Schedule => "schedule",
            Section::Tasks => "tasks",
            Section::Assets => "assets",
            Section::Locations => "locations",
            Section::Communication => "communication",
            Section::Reports => "reports",
            Section::Feedback => "feedback",
        }
    }

    pub fn route(&self) -> &'static str {
        match self {
            Section::Dashboard => "/",
            Section::Projects => "/projects",
            Section::Budget => "/budget",
            Section::CastCrew => "/cast-crew",
            Section::Schedule => "/schedule",
            Section::Tasks => "/tasks",
            Section::Assets => "/assets",
            Section::Locations => "/locations",
            Section::Communication => "/communication",
            Section::Reports => "/reports",
            Section::Feedback => "/feedback",
        }
    }

    /// Sidebar label.
    pub fn label(&self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::Projects => "Projects",
            Section::Budget => "Budget",
            Section::CastCrew => "Cast & Crew",
            Section::Schedule => "Schedule",
            Section::Tasks => "Tasks",
            Section::Assets => "Assets",
            Section::Locations => "Locations",
            Section::Communication => "Communication",
            Section::Reports => "Reports",
            Section::Feedback => "Feedback",
        }
    }

    pub fn from_route(route: &str) -> Option<Section> {
        Section::ALL.into_iter().find(|s| s.route() == route)
    }

    pub fn from_key(key: &str) -> Option<Section> {
        Section::ALL.into_iter().find(|s| s.key() == key)
    }
}

impl Display for Section {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.key()) }
}

/// Eleven per-section flags. Every flag is required when deserializing so a
/// hand-written table cannot silently omit one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PermissionSet {
    pub dashboard: bool,
    pub projects: bool,
    pub budget: bool,
    pub cast_crew: bool,
    pub schedule: bool,
    pub tasks: bool,
    pub assets: bool,
    pub locations: bool,
    pub communication: bool,
    pub reports: bool,
    pub feedback: bool,
}

impl PermissionSet {
    pub const NONE: PermissionSet = PermissionSet {
        dashboard: false,
        projects: false,
        budget: false,
        cast_crew: false,
        schedule: false,
        tasks: false,
        assets: false,
        locations: false,
        communication: false,
        reports: false,
        feedback: false,
    };

    pub fn all() -> Self {
        Self::from_sections(&Section::ALL)
    }

    pub fn from_sections(sections: &[Section]) -> Self {
        sections.iter().fold(Self::NONE, |acc, s| acc.with(*s, true))
    }

    pub fn get(&self, section: Section) -> bool {
        match section {
            Section::Dashboard => self.dashboard,
            Section::Projects => self.projects,
            Section::Budget => self.budget,
            Section::CastCrew => self.cast_crew,
            Section::Schedule => self.schedule,
            Section::Tasks => self.tasks,
            Section::Assets => self.assets,
            Section::Locations => self.locations,
            Section::Communication => self.communication,
            Section::Reports => self.reports,
            Section::Feedback => self.feedback,
        }
    }

    pub fn with(mut self, section: Section, allowed: bool) -> Self {
        let flag = match section {
            Section::Dashboard => &mut self.dashboard,
            Section::Projects => &mut self.projects,
            Section::Budget => &mut self.budget,
            Section::CastCrew => &mut self.cast_crew,
            Section::Schedule => &mut self.schedule,
            Section::Tasks => &mut self.tasks,
            Section::Assets => &mut self.assets,
            Section::Locations => &mut self.locations,
            Section::Communication => &mut self.communication,
            Section::Reports => &mut self.reports,
            Section::Feedback => &mut self.feedback,
        };
        *flag = allowed;
        self
    }

    /// Granted sections in navigation order.
    pub fn granted(&self) -> impl Iterator<Item = Section> + '_ {
        Section::ALL.into_iter().filter(move |s| self.get(*s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionTable {
    sets: [PermissionSet; Role::COUNT],
}

impl Default for PermissionTable {
    fn default() -> Self { Self::builtin() }
}

impl PermissionTable {
    /// The shipped role table.
    pub fn builtin() -> Self {
        use Section::*;
        let crew_and_cast = PermissionSet::from_sections(&[Communication, Reports, Feedback]);
        let mut sets = [PermissionSet::NONE; Role::COUNT];
        sets[Role::ProductionManager.index()] = PermissionSet::all();
        sets[Role::Director.index()] = PermissionSet::all();
        sets[Role::AssistantDirector.index()] = PermissionSet::from_sections(&[Schedule, Communication, Reports]);
        sets[Role::ProductionCoordinator.index()] =
            PermissionSet::from_sections(&[CastCrew, Assets, Locations, Communication, Reports]);
        sets[Role::CastMember.index()] = crew_and_cast;
        sets[Role::CrewMember.index()] = crew_and_cast;
        Self { sets }
    }

    /// Build a table from explicit entries; every role must be present.
    pub fn from_entries(entries: BTreeMap<Role, PermissionSet>) -> AppResult<Self> {
        let missing: Vec<&str> = Role::ALL.iter().filter(|r| !entries.contains_key(*r)).map(|r| r.as_str()).collect();
        if !missing.is_empty() {
            return Err(AppError::config(
                "permission_table_incomplete".to_string(),
                format!("permission table is missing roles: {}", missing.join(", ")),
            ));
        }
        let mut sets = [PermissionSet::NONE; Role::COUNT];
        for (role, set) in entries {
            sets[role.index()] = set;
        }
        Ok(Self { sets })
    }

    /// Parse `{"<role name>": {<flags>}, ...}`. Unknown role names are rejected.
    pub fn from_json_str(text: &str) -> AppResult<Self> {
        let raw: BTreeMap<String, PermissionSet> = serde_json::from_str(text)
            .map_err(|e| AppError::config("permission_table_parse".to_string(), e.to_string()))?;
        let mut entries = BTreeMap::new();
        for (name, set) in raw {
            let role = Role::parse(&name).ok_or_else(|| {
                AppError::config("permission_table_unknown_role".to_string(), format!("unknown role '{}' in permission table", name))
            })?;
            entries.insert(role, set);
        }
        Self::from_entries(entries)
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::config("permission_table_read".to_string(), format!("{}: {}", path.display(), e))
        })?;
        let table = Self::from_json_str(&text)?;
        info!(path = %path.display(), "permission table loaded");
        Ok(table)
    }

    pub fn permissions_for(&self, role: Role) -> PermissionSet {
        self.sets[role.index()]
    }

    /// Resolve a stored role string. `None` for an unrecognized role.
    pub fn resolve(&self, role_name: &str) -> Option<PermissionSet> {
        let resolved = Role::parse(role_name).map(|r| self.permissions_for(r));
        if resolved.is_none() {
            debug!(role = role_name, "unrecognized role resolves to no permissions");
        }
        resolved
    }

    pub fn to_json_string(&self) -> AppResult<String> {
        let map: BTreeMap<&str, PermissionSet> = Role::ALL.iter().map(|r| (r.as_str(), self.permissions_for(*r))).collect();
        serde_json::to_string_pretty(&map).map_err(|e| AppError::internal("permission_table_encode".to_string(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_roundtrip() {
        for r in Role::ALL {
            assert_eq!(Role::parse(r.as_str()), Some(r));
            assert_eq!(r.as_str().parse::<Role>().unwrap(), r);
            assert_eq!(serde_json::to_value(r).unwrap(), serde_json::json!(r.as_str()));
        }
        assert!(Role::parse("production manager").is_none());
        assert!(Role::parse("Producer").is_none());
        assert_eq!("Producer".parse::<Role>().unwrap_err().code_str(), "unknown_role");
    }

    #[test]
    fn section_routes_and_keys() {
        assert_eq!(Section::CastCrew.route(), "/cast-crew");
        assert_eq!(Section::CastCrew.key(), "castCrew");
        assert_eq!(Section::CastCrew.label(), "Cast & Crew");
        assert_eq!(Section::from_route("/"), Some(Section::Dashboard));
        assert_eq!(Section::from_route("/feedback"), Some(Section::Feedback));
        assert_eq!(Section::from_route("/nowhere"), None);
        assert_eq!(Section::from_key("castCrew"), Some(Section::CastCrew));
        for s in Section::ALL {
            assert_eq!(serde_json::to_value(s).unwrap(), serde_json::json!(s.key()));
        }
    }

    #[test]
    fn permission_set_serializes_with_section_keys() {
        let set = PermissionSet::from_sections(&[Section::CastCrew]);
        let v = serde_json::to_value(set).unwrap();
        assert_eq!(v["castCrew"], true);
        assert_eq!(v["dashboard"], false);
        assert_eq!(v.as_object().unwrap().len(), 11);
        for s in Section::ALL {
            assert!(v.get(s.key()).is_some(), "missing key {}", s.key());
        }
    }

    #[test]
    fn builtin_coordinator_row() {
        let t = PermissionTable::builtin();
        let p = t.permissions_for(Role::ProductionCoordinator);
        let granted: Vec<Section> = p.granted().collect();
        assert_eq!(
            granted,
            vec![Section::CastCrew, Section::Assets, Section::Locations, Section::Communication, Section::Reports]
        );
    }

    #[test]
    fn resolve_unknown_role_is_none() {
        let t = PermissionTable::builtin();
        assert!(t.resolve("Caterer").is_none());
        assert_eq!(t.resolve("Director"), Some(PermissionSet::all()));
    }

    #[test]
    fn json_table_roundtrip_and_validation() {
        let t = PermissionTable::builtin();
        let text = t.to_json_string().unwrap();
        assert_eq!(PermissionTable::from_json_str(&text).unwrap(), t);

        let mut v: serde_json::Value = serde_json::from_str(&text).unwrap();
        v.as_object_mut().unwrap().remove("Crew Member");
        let err = PermissionTable::from_json_str(&v.to_string()).unwrap_err();
        assert_eq!(err.code_str(), "permission_table_incomplete");
        assert!(err.message().contains("Crew Member"));

        let mut v2: serde_json::Value = serde_json::from_str(&text).unwrap();
        v2["Caterer"] = serde_json::to_value(PermissionSet::NONE).unwrap();
        assert_eq!(PermissionTable::from_json_str(&v2.to_string()).unwrap_err().code_str(), "permission_table_unknown_role");

        let mut v3: serde_json::Value = serde_json::from_str(&text).unwrap();
        v3["Director"].as_object_mut().unwrap().remove("budget");
        assert_eq!(PermissionTable::from_json_str(&v3.to_string()).unwrap_err().code_str(), "permission_table_parse");
    }
}
