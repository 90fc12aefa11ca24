//! Per-user records: owned properties, saved simulations and preferences.
//!
//! Everything lives in memory behind a single lock. When the store is
//! opened with a snapshot path, every mutation rewrites the whole snapshot
//! as JSON before the lock is released. A mutation only becomes visible
//! once its snapshot is written; a failed write leaves the previous records
//! in place.

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::{
    PortfolioSummary, Preferences, Property, PropertyDraft, SavedSimulation, SimulationInput,
    compute_results,
};

/// Opaque identity handed over by the external auth provider.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Trims the raw identity; blank identities are rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("property {0} not found")]
    PropertyNotFound(Uuid),

    #[error("simulation {0} not found")]
    SimulationNotFound(Uuid),

    #[error("snapshot I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Records are kept in insertion order; listings return them newest first.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
struct UserRecords {
    properties: Vec<Property>,
    simulations: Vec<SavedSimulation>,
    preferences: Preferences,
}

impl UserRecords {
    fn summary(&self) -> PortfolioSummary {
        PortfolioSummary::from_records(&self.properties, &self.simulations)
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct Snapshot {
    users: HashMap<UserId, UserRecords>,
}

#[derive(Debug)]
pub struct PortfolioStore {
    state: RwLock<Snapshot>,
    snapshot_path: Option<PathBuf>,
}

impl PortfolioStore {
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(Snapshot::default()),
            snapshot_path: None,
        }
    }

    /// Loads the snapshot at `path`, or starts empty when the file does not
    /// exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Snapshot>(&bytes)?,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                log::info!("no snapshot at {}, starting empty", path.display());
                Snapshot::default()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        log::info!(
            "loaded {} user record(s) from {}",
            snapshot.users.len(),
            path.display()
        );

        Ok(Self {
            state: RwLock::new(snapshot),
            snapshot_path: Some(path),
        })
    }

    pub async fn list_properties(&self, user: &UserId) -> Vec<Property> {
        let state = self.state.read().await;
        state
            .users
            .get(user)
            .map(|records| records.properties.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn add_property(
        &self,
        user: &UserId,
        draft: PropertyDraft,
    ) -> Result<Property, StoreError> {
        let property = self
            .commit(user, |records| {
                let property = draft.into_property(Uuid::new_v4(), Utc::now());
                records.properties.push(property.clone());
                Ok(property)
            })
            .await?;

        log::info!("user {user} added property {}", property.id);
        Ok(property)
    }

    pub async fn update_property(
        &self,
        user: &UserId,
        id: Uuid,
        draft: PropertyDraft,
    ) -> Result<Property, StoreError> {
        let updated = self
            .commit(user, |records| {
                let slot = records
                    .properties
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or(StoreError::PropertyNotFound(id))?;
                *slot = draft.into_property(id, slot.created_at);
                Ok(slot.clone())
            })
            .await?;

        log::info!("user {user} updated property {id}");
        Ok(updated)
    }

    pub async fn delete_property(&self, user: &UserId, id: Uuid) -> Result<(), StoreError> {
        self.commit(user, |records| {
            let before = records.properties.len();
            records.properties.retain(|p| p.id != id);
            if records.properties.len() == before {
                return Err(StoreError::PropertyNotFound(id));
            }
            Ok(())
        })
        .await?;

        log::info!("user {user} deleted property {id}");
        Ok(())
    }

    pub async fn list_simulations(&self, user: &UserId) -> Vec<SavedSimulation> {
        let state = self.state.read().await;
        state
            .users
            .get(user)
            .map(|records| records.simulations.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    /// Dashboard totals over one consistent view of the user's records.
    pub async fn summary(&self, user: &UserId) -> PortfolioSummary {
        let state = self.state.read().await;
        state
            .users
            .get(user)
            .map(UserRecords::summary)
            .unwrap_or_default()
    }

    /// Computes `input` against the user's current portfolio baseline and
    /// stores it. The baseline is read under the same write lock as the
    /// insert, and the id and creation time are assigned here.
    pub async fn save_simulation(
        &self,
        user: &UserId,
        input: SimulationInput,
    ) -> Result<SavedSimulation, StoreError> {
        let simulation = self
            .commit(user, |records| {
                let results = compute_results(&input, records.summary().baseline());
                let simulation = SavedSimulation {
                    id: Uuid::new_v4(),
                    input,
                    results,
                    created_at: Utc::now(),
                };
                records.simulations.push(simulation.clone());
                Ok(simulation)
            })
            .await?;

        log::info!("user {user} saved simulation {}", simulation.id);
        Ok(simulation)
    }

    pub async fn delete_simulation(&self, user: &UserId, id: Uuid) -> Result<(), StoreError> {
        self.commit(user, |records| {
            let before = records.simulations.len();
            records.simulations.retain(|s| s.id != id);
            if records.simulations.len() == before {
                return Err(StoreError::SimulationNotFound(id));
            }
            Ok(())
        })
        .await?;

        log::info!("user {user} deleted simulation {id}");
        Ok(())
    }

    pub async fn preferences(&self, user: &UserId) -> Preferences {
        let state = self.state.read().await;
        state
            .users
            .get(user)
            .map(|records| records.preferences.clone())
            .unwrap_or_default()
    }

    pub async fn set_rental_goal(
        &self,
        user: &UserId,
        rental_goal: f64,
    ) -> Result<Preferences, StoreError> {
        self.update_preferences(user, Some(rental_goal), None).await
    }

    pub async fn set_monthly_salaries(
        &self,
        user: &UserId,
        salaries: Vec<f64>,
    ) -> Result<Preferences, StoreError> {
        self.update_preferences(user, None, Some(salaries)).await
    }

    /// Applies whichever fields are given in a single persisted write.
    pub async fn update_preferences(
        &self,
        user: &UserId,
        rental_goal: Option<f64>,
        monthly_salaries: Option<Vec<f64>>,
    ) -> Result<Preferences, StoreError> {
        let updated = self
            .commit(user, |records| {
                let prefs = &mut records.preferences;
                if let Some(goal) = rental_goal {
                    prefs.rental_goal = goal;
                }
                if let Some(salaries) = monthly_salaries {
                    prefs.monthly_salaries = salaries;
                }
                Ok(prefs.clone())
            })
            .await?;

        log::debug!("user {user} updated preferences");
        Ok(updated)
    }

    /// Runs `apply` on a copy of the user's records and persists the result
    /// before it becomes visible. On any error the previous records stay in
    /// place.
    async fn commit<T>(
        &self,
        user: &UserId,
        apply: impl FnOnce(&mut UserRecords) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.state.write().await;
        let mut records = state.users.get(user).cloned().unwrap_or_default();
        let out = apply(&mut records)?;

        let previous = state.users.insert(user.clone(), records);
        if let Err(err) = self.persist(&state).await {
            match previous {
                Some(records) => state.users.insert(user.clone(), records),
                None => state.users.remove(user),
            };
            return Err(err);
        }
        Ok(out)
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        write_atomically(path, &bytes).await.map_err(|source| {
            log::error!("failed to persist snapshot to {}: {source}", path.display());
            StoreError::Io {
                path: path.clone(),
                source,
            }
        })?;

        log::debug!("persisted snapshot to {}", path.display());
        Ok(())
    }
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}
