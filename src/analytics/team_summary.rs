use super::daily::{bucket_daily, DailySummary};
use super::user_summary::{summarize_user, UserSummary};
use super::TrailingWindow;
use crate::domain::models::{Activity, Blocker, Team};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub team_id: Uuid,
    pub team_name: String,
    pub total_activities: u64,
    pub member_summaries: Vec<UserSummary>,
    pub daily_activities: Vec<DailySummary>,
    pub blockers: Vec<Blocker>,
    pub peak_day: NaiveDate,
    pub most_active_user: Option<Uuid>,
}

/// `None` when the window holds no team activity at all.
pub fn summarize_team(
    team: &Team,
    activities: &[Activity],
    blockers: &[Blocker],
    member_ids: &[Uuid],
    window: &TrailingWindow,
) -> Option<TeamSummary> {
    let team_activities: Vec<Activity> = activities
        .iter()
        .filter(|a| a.team_id == team.id)
        .cloned()
        .collect();

    let daily = bucket_daily(&team_activities, window);
    let total: u64 = daily.iter().map(DailySummary::total).sum();
    if total == 0 {
        return None;
    }

    // Earliest day wins ties: only a strictly larger total replaces the peak.
    let peak_day = daily
        .iter()
        .fold(None::<&DailySummary>, |best, bucket| match best {
            Some(b) if b.total() >= bucket.total() => Some(b),
            _ => Some(bucket),
        })?
        .date;

    let mut members: Vec<Uuid> = member_ids.to_vec();
    members.sort();
    members.dedup();

    let member_summaries: Vec<UserSummary> = members
        .iter()
        .map(|id| summarize_user(*id, &team_activities, window))
        .collect();

    let most_active_user = member_summaries
        .iter()
        .fold(None::<&UserSummary>, |best, summary| match best {
            Some(b) if b.total() >= summary.total() => Some(b),
            _ if summary.total() > 0 => Some(summary),
            _ => best,
        })
        .map(|s| s.user_id);

    let relevant_blockers = blockers
        .iter()
        .filter(|b| b.team_id == team.id)
        .filter(|b| !b.resolved || window.contains(b.created_at))
        .cloned()
        .collect();

    Some(TeamSummary {
        team_id: team.id,
        team_name: team.name.clone(),
        total_activities: total,
        member_summaries,
        peak_day,
        daily_activities: daily,
        blockers: relevant_blockers,
        most_active_user,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::*;
    use crate::domain::models::ActivityKind;
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn team() -> Team {
        Team {
            id: Uuid::new_v4(),
            name: "Platform".to_string(),
            invite_code: "ABC123".to_string(),
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    fn blocker(team_id: Uuid, resolved: bool, created: u32) -> Blocker {
        Blocker {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            team_id,
            description: "waiting on review".to_string(),
            tags: BTreeSet::new(),
            resolved,
            created_at: at(created, 9),
            resolved_at: resolved.then(|| at(created, 18)),
        }
    }

    #[test]
    fn test_none_without_window_activity() {
        let t = team();
        let member = Uuid::new_v4();
        let old = vec![activity(member, t.id, ActivityKind::Code, 4, at(1, 10))];

        assert!(summarize_team(&t, &[], &[], &[member], &window(10, 7)).is_none());
        assert!(summarize_team(&t, &old, &[], &[member], &window(10, 7)).is_none());
    }

    #[test]
    fn test_worked_example_total() {
        let t = team();
        let member = Uuid::new_v4();
        let activities = vec![
            activity(member, t.id, ActivityKind::Code, 3, at(0, 10)),
            activity(member, t.id, ActivityKind::Chat, 2, at(0, 11)),
            activity(member, t.id, ActivityKind::Code, 1, at(1, 10)),
        ];

        let summary = summarize_team(&t, &activities, &[], &[member], &window(1, 2)).unwrap();
        assert_eq!(summary.total_activities, 6);
        assert_eq!(summary.peak_day, day(0));
        assert_eq!(summary.most_active_user, Some(member));
        assert_eq!(summary.daily_activities.len(), 2);
    }

    #[test]
    fn test_includes_idle_members_in_id_order() {
        let t = team();
        let busy = Uuid::new_v4();
        let idle = Uuid::new_v4();
        let activities = vec![activity(busy, t.id, ActivityKind::Review, 2, at(5, 10))];

        let summary = summarize_team(&t, &activities, &[], &[busy, idle], &window(5, 7)).unwrap();
        assert_eq!(summary.member_summaries.len(), 2);
        let ids: Vec<Uuid> = summary.member_summaries.iter().map(|s| s.user_id).collect();
        let mut sorted = vec![busy, idle];
        sorted.sort();
        assert_eq!(ids, sorted);

        let idle_summary = summary.member_summaries.iter().find(|s| s.user_id == idle).unwrap();
        assert_eq!(idle_summary.total(), 0);
    }

    #[test]
    fn test_tie_breaks() {
        let t = team();
        let mut ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        ids.sort();
        let activities = vec![
            activity(ids[1], t.id, ActivityKind::Code, 4, at(3, 10)),
            activity(ids[0], t.id, ActivityKind::Code, 4, at(5, 10)),
        ];

        let summary = summarize_team(&t, &activities, &[], &[ids[1], ids[0]], &window(6, 7)).unwrap();
        assert_eq!(summary.peak_day, day(3));
        assert_eq!(summary.most_active_user, Some(ids[0]));
    }

    #[test]
    fn test_former_member_activity_has_no_most_active() {
        let t = team();
        let former = Uuid::new_v4();
        let current = Uuid::new_v4();
        let activities = vec![activity(former, t.id, ActivityKind::Chat, 3, at(4, 10))];

        let summary = summarize_team(&t, &activities, &[], &[current], &window(4, 7)).unwrap();
        assert_eq!(summary.total_activities, 3);
        assert_eq!(summary.most_active_user, None);
    }

    #[test]
    fn test_blocker_filter_and_team_isolation() {
        let t = team();
        let member = Uuid::new_v4();
        let other_team = Uuid::new_v4();
        let activities = vec![
            activity(member, t.id, ActivityKind::Code, 1, at(10, 10)),
            activity(member, other_team, ActivityKind::Code, 50, at(10, 10)),
        ];
        let open_old = blocker(t.id, false, 1);
        let resolved_recent = blocker(t.id, true, 9);
        let resolved_old = blocker(t.id, true, 1);
        let foreign = blocker(other_team, false, 9);
        let blockers = vec![
            open_old.clone(),
            resolved_recent.clone(),
            resolved_old,
            foreign,
        ];

        let summary = summarize_team(&t, &activities, &blockers, &[member], &window(10, 7)).unwrap();
        assert_eq!(summary.total_activities, 1);
        assert_eq!(summary.blockers, vec![open_old, resolved_recent]);
    }

    #[test]
    fn test_idempotent() {
        let t = team();
        let member = Uuid::new_v4();
        let activities = vec![activity(member, t.id, ActivityKind::Chat, 3, at(4, 10))];
        let w = window(4, 7);

        let first = summarize_team(&t, &activities, &[], &[member], &w);
        let second = summarize_team(&t, &activities, &[], &[member], &w);
        assert_eq!(first, second);
    }
}
