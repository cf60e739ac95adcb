use crate::domain::models::Team;
use crate::error::AppError;
use chrono::Utc;
use rand::Rng;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

const INVITE_CODE_LEN: usize = 6;
const INVITE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Teams, their members, and each user's explicitly selected team.
#[derive(Default)]
pub struct TeamDirectory {
    teams: HashMap<Uuid, Team>,
    members: HashMap<Uuid, BTreeSet<Uuid>>,
    active: HashMap<Uuid, Uuid>, // user_id -> team_id
}

impl TeamDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The creator joins immediately and the new team becomes active.
    pub fn create_team(&mut self, user_id: Uuid, name: &str) -> Result<Team, AppError> {
        let name = validate_name(name)?;
        let invite_code = self.fresh_invite_code();

        let team = Team {
            id: Uuid::new_v4(),
            name,
            invite_code,
            created_by: user_id,
            created_at: Utc::now(),
        };
        self.teams.insert(team.id, team.clone());
        self.members.entry(team.id).or_default().insert(user_id);
        self.active.insert(user_id, team.id);
        tracing::info!("User {} created team {} ({})", user_id, team.id, team.name);
        Ok(team)
    }

    /// Joining a team the user already belongs to just re-activates it.
    pub fn join_team(&mut self, user_id: Uuid, code: &str) -> Result<Team, AppError> {
        let code = code.trim().to_uppercase();
        let team = self
            .teams
            .values()
            .find(|t| t.invite_code == code)
            .cloned()
            .ok_or(AppError::NotFound("team"))?;

        let inserted = self.members.entry(team.id).or_default().insert(user_id);
        self.active.insert(user_id, team.id);
        if inserted {
            tracing::info!("User {} joined team {}", user_id, team.id);
        } else {
            tracing::debug!("User {} already in team {}", user_id, team.id);
        }
        Ok(team)
    }

    /// Leaves the active team; no other team is selected in its place.
    pub fn leave_team(&mut self, user_id: Uuid) -> Result<(), AppError> {
        let team_id = self
            .active_team_id(user_id)
            .ok_or(AppError::Precondition("not in a team"))?;

        if let Some(members) = self.members.get_mut(&team_id) {
            members.remove(&user_id);
        }
        self.active.remove(&user_id);
        tracing::info!("User {} left team {}", user_id, team_id);
        Ok(())
    }

    pub fn select_team(&mut self, user_id: Uuid, team_id: Uuid) -> Result<Team, AppError> {
        if !self.is_member(user_id, team_id) {
            return Err(AppError::NotFound("team"));
        }
        self.active.insert(user_id, team_id);
        self.team(team_id).cloned().ok_or(AppError::NotFound("team"))
    }

    pub fn active_team_id(&self, user_id: Uuid) -> Option<Uuid> {
        self.active
            .get(&user_id)
            .copied()
            .filter(|team_id| self.is_member(user_id, *team_id))
    }

    pub fn active_team(&self, user_id: Uuid) -> Option<&Team> {
        self.active_team_id(user_id).and_then(|id| self.team(id))
    }

    pub fn team(&self, team_id: Uuid) -> Option<&Team> {
        self.teams.get(&team_id)
    }

    /// Teams the user belongs to, oldest first.
    pub fn teams_for(&self, user_id: Uuid) -> Vec<Team> {
        let mut teams: Vec<Team> = self
            .members
            .iter()
            .filter(|(_, members)| members.contains(&user_id))
            .filter_map(|(team_id, _)| self.teams.get(team_id).cloned())
            .collect();
        teams.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        teams
    }

    /// Member ids in ascending order.
    pub fn members(&self, team_id: Uuid) -> Vec<Uuid> {
        self.members
            .get(&team_id)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_member(&self, user_id: Uuid, team_id: Uuid) -> bool {
        self.members
            .get(&team_id)
            .is_some_and(|m| m.contains(&user_id))
    }

    pub fn is_creator(&self, user_id: Uuid, team_id: Uuid) -> bool {
        self.teams
            .get(&team_id)
            .is_some_and(|t| t.created_by == user_id)
    }

    pub fn update_team(&mut self, user_id: Uuid, team_id: Uuid, name: &str) -> Result<Team, AppError> {
        if !self.is_creator(user_id, team_id) {
            return Err(AppError::Forbidden);
        }
        let name = validate_name(name)?;
        let team = self.teams.get_mut(&team_id).ok_or(AppError::NotFound("team"))?;
        team.name = name;
        tracing::info!("Team {} renamed by {}", team_id, user_id);
        Ok(team.clone())
    }

    pub fn remove_member(&mut self, user_id: Uuid, team_id: Uuid, member_id: Uuid) -> Result<(), AppError> {
        if !self.is_creator(user_id, team_id) {
            return Err(AppError::Forbidden);
        }
        if member_id == user_id {
            return Err(AppError::Conflict("team creator cannot be removed".into()));
        }
        let removed = self
            .members
            .get_mut(&team_id)
            .is_some_and(|m| m.remove(&member_id));
        if !removed {
            return Err(AppError::NotFound("member"));
        }
        if self.active.get(&member_id) == Some(&team_id) {
            self.active.remove(&member_id);
        }
        tracing::info!("User {} removed {} from team {}", user_id, member_id, team_id);
        Ok(())
    }

    fn fresh_invite_code(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let code: String = (0..INVITE_CODE_LEN)
                .map(|_| INVITE_ALPHABET[rng.gen_range(0..INVITE_ALPHABET.len())] as char)
                .collect();
            if !self.teams.values().any(|t| t.invite_code == code) {
                return code;
            }
        }
    }
}

fn validate_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation("team name must not be empty".into()));
    }
    if name.chars().count() > 80 {
        return Err(AppError::Validation("team name is too long".into()));
    }
    Ok(name.to_string())
}
