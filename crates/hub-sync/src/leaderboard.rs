//! Revenue leaderboard derived from the roster and the wins log.

use std::collections::HashMap;

use hub_storage::{Member, UserId, Win};

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub member: Member,
    pub total_revenue: f64,
}

/// Sum each member's win revenue and rank members by total, highest first.
///
/// Ties keep roster order. Wins whose `user_id` has no member are ignored;
/// non-finite amounts count as zero.
pub fn compute_leaderboard(members: &[Member], wins: &[Win]) -> Vec<LeaderboardEntry> {
    let mut totals: HashMap<&UserId, f64> = HashMap::new();
    for win in wins {
        let amount = if win.revenue_amount.is_finite() {
            win.revenue_amount
        } else {
            0.0
        };
        *totals.entry(&win.user_id).or_default() += amount;
    }

    let mut entries: Vec<LeaderboardEntry> = members
        .iter()
        .map(|member| LeaderboardEntry {
            total_revenue: totals.get(&member.id).copied().unwrap_or(0.0),
            member: member.clone(),
        })
        .collect();
    entries.sort_by(|a, b| b.total_revenue.total_cmp(&a.total_revenue));
    entries
}
