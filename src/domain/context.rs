use crate::error::AppError;
use uuid::Uuid;

/// Who is writing, and into which team. Both halves are optional so the
/// store can report which precondition is missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteContext {
    pub user_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub team_id: Uuid,
}

impl WriteContext {
    pub fn new(user_id: Option<Uuid>, team_id: Option<Uuid>) -> Self {
        Self { user_id, team_id }
    }

    pub fn require(&self) -> Result<Actor, AppError> {
        let user_id = self.user_id.ok_or(AppError::Precondition("not authenticated"))?;
        let team_id = self.team_id.ok_or(AppError::Precondition("not in a team"))?;
        Ok(Actor { user_id, team_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_reports_missing_user_first() {
        let err = WriteContext::default().require().unwrap_err();
        assert_eq!(err.to_string(), "not authenticated");

        let err = WriteContext::new(Some(Uuid::new_v4()), None).require().unwrap_err();
        assert_eq!(err.to_string(), "not in a team");
    }

    #[test]
    fn test_require_ok() {
        let user = Uuid::new_v4();
        let team = Uuid::new_v4();
        let actor = WriteContext::new(Some(user), Some(team)).require().unwrap();
        assert_eq!(actor, Actor { user_id: user, team_id: team });
    }
}
