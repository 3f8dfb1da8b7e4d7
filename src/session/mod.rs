//! Durable storage for the user's plan: one versioned JSON document.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::core::{
    BasicInfo, CashflowEvent, FamilyPlan, LifeGoal, LoanEvent, LoanPlan, PlanError, PlanInputs,
    PlanResult, PlanSettings,
};

pub const SESSION_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub version: u32,
    #[serde(default)]
    pub basic_info: BasicInfo,
    #[serde(default)]
    pub family_plan: FamilyPlan,
    #[serde(default)]
    pub life_events: Vec<CashflowEvent>,
    #[serde(default)]
    pub life_goals: Vec<LifeGoal>,
    #[serde(default)]
    pub loans: Vec<LoanEvent>,
    #[serde(default)]
    pub loan_plans: Vec<LoanPlan>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::from_inputs(&PlanInputs::default())
    }
}

impl SessionSnapshot {
    pub fn from_inputs(inputs: &PlanInputs) -> Self {
        Self {
            version: SESSION_VERSION,
            basic_info: inputs.basic_info.clone(),
            family_plan: inputs.family_plan.clone(),
            life_events: inputs.life_events.clone(),
            life_goals: inputs.life_goals.clone(),
            loans: inputs.loans.clone(),
            loan_plans: inputs.loan_plans.clone(),
        }
    }

    /// Projection settings are not part of the stored plan and are supplied per request.
    pub fn to_inputs(&self, settings: PlanSettings) -> PlanInputs {
        PlanInputs {
            basic_info: self.basic_info.clone(),
            family_plan: self.family_plan.clone(),
            life_goals: self.life_goals.clone(),
            life_events: self.life_events.clone(),
            loans: self.loans.clone(),
            loan_plans: self.loan_plans.clone(),
            settings,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored snapshot, or defaults when nothing usable is stored.
    /// A malformed or foreign-version document is deleted rather than merged.
    pub fn load(&self) -> SessionSnapshot {
        match self.read() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => SessionSnapshot::default(),
            Err(err) => {
                log::warn!(
                    "discarding stored session at {}: {err}",
                    self.path.display()
                );
                if let Err(err) = self.clear() {
                    log::warn!("could not remove {}: {err}", self.path.display());
                }
                SessionSnapshot::default()
            }
        }
    }

    fn read(&self) -> PlanResult<Option<SessionSnapshot>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        let version = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0);
        if version != u64::from(SESSION_VERSION) {
            return Err(PlanError::UnsupportedVersion {
                expected: SESSION_VERSION,
                actual: u32::try_from(version).unwrap_or(u32::MAX),
            });
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Writes to a sibling temp file and renames it over the target, so a
    /// crash never leaves a half-written document behind.
    pub fn save(&self, snapshot: &SessionSnapshot) -> PlanResult<()> {
        let snapshot = SessionSnapshot {
            version: SESSION_VERSION,
            ..snapshot.clone()
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&snapshot)?)?;
        fs::rename(&tmp, &self.path)?;
        log::info!("saved session to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> PlanResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Child, ProjectionMode, UserType};

    fn store_in(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::new(dir.path().join("session.json"))
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        assert_eq!(store.load(), SessionSnapshot::default());
    }

    #[test]
    fn saved_snapshot_loads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let mut inputs = PlanInputs::default();
        inputs.basic_info.user_type = UserType::Student;
        inputs.basic_info.current_age = 21;
        inputs.family_plan.marriage_age = Some(31);
        inputs.family_plan.children.push(Child::default());
        let snapshot = SessionSnapshot::from_inputs(&inputs);

        store.save(&snapshot).expect("save");
        assert_eq!(store.load(), snapshot);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_discarded_and_removed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        fs::write(store.path(), "{ not json").expect("write");

        assert_eq!(store.load(), SessionSnapshot::default());
        assert!(!store.path().exists());
    }

    #[test]
    fn unversioned_document_is_discarded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        fs::write(store.path(), r#"{ "basicInfo": { "currentAge": 40 } }"#).expect("write");

        assert!(matches!(
            store.read(),
            Err(PlanError::UnsupportedVersion { actual: 0, .. })
        ));
        assert_eq!(store.load().basic_info.current_age, 20);
        assert!(!store.path().exists());
    }

    #[test]
    fn wrong_field_type_is_not_partially_applied() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        fs::write(
            store.path(),
            r#"{ "version": 1, "basicInfo": { "currentAge": 40 }, "lifeGoals": "oops" }"#,
        )
        .expect("write");

        assert_eq!(store.load(), SessionSnapshot::default());
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        store.save(&SessionSnapshot::default()).expect("save");
        store.clear().expect("first clear");
        store.clear().expect("second clear");
        assert!(!store.path().exists());
    }

    #[test]
    fn settings_are_supplied_when_rebuilding_inputs() {
        let snapshot = SessionSnapshot::default();
        let settings = PlanSettings {
            mode: ProjectionMode::RequiredFlat,
            end_age: Some(70),
            target_monthly_surplus: 10_000.0,
        };
        let inputs = snapshot.to_inputs(settings.clone());
        assert_eq!(inputs.settings, settings);
        assert_eq!(SessionSnapshot::from_inputs(&inputs), snapshot);
    }
}
