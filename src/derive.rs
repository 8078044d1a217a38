//! Metric deriver: fills the derived columns of the four fact tables.
//!
//! Ratios are null when the denominator is zero or missing, or when the
//! numerator is missing. Percentages are on a 0–100 scale and are never
//! clamped; out-of-range values are left for the validator to report. A sum
//! that would overflow is left null, which the validator also reports.

use log::info;

use crate::model::{Dataset, MatchAdvanced, MatchBase, MatchOutcome, PlayerStat, StandingRow};

fn ratio(numerator: Option<i32>, denominator: Option<i32>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(num), Some(den)) if den != 0 => Some(f64::from(num) / f64::from(den)),
        _ => None,
    }
}

fn percentage(numerator: Option<i32>, denominator: Option<i32>) -> Option<f64> {
    ratio(numerator, denominator).map(|value| value * 100.0)
}

fn difference(home: Option<f64>, away: Option<f64>) -> Option<f64> {
    Some(home? - away?)
}

/// Sum of counts treating missing as zero; `None` on overflow.
fn total(counts: &[Option<i32>]) -> Option<i32> {
    counts
        .iter()
        .try_fold(0i32, |acc, count| acc.checked_add(count.unwrap_or(0)))
}

pub fn derive_match_base(row: &mut MatchBase) {
    row.goal_difference = row.home_goals.checked_sub(row.away_goals);
    row.total_goals = row.home_goals.checked_add(row.away_goals);
    row.total_cards = total(&[row.home_yellow, row.away_yellow, row.home_red, row.away_red]);
    row.home_shot_accuracy = percentage(row.home_sot, row.home_shots);
    row.away_shot_accuracy = percentage(row.away_sot, row.away_shots);
    row.result = Some(MatchOutcome::from_score(row.home_goals, row.away_goals));
}

pub fn derive_match_advanced(row: &mut MatchAdvanced) {
    row.home_pass_accuracy = percentage(row.home_passes_completed, row.home_passes_attempted);
    row.away_pass_accuracy = percentage(row.away_passes_completed, row.away_passes_attempted);
    row.possession_delta = difference(row.home_possession, row.away_possession);
    row.xg_difference = difference(row.home_xg, row.away_xg);
}

pub fn derive_player_stat(row: &mut PlayerStat) {
    let contributions = total(&[row.goals, row.assists]);
    row.goals_per_game = ratio(row.goals, row.games);
    row.assists_per_game = ratio(row.assists, row.games);
    row.shot_efficiency = percentage(row.goals, row.shots);
    row.sot_percentage = percentage(row.shots_on_target, row.shots);
    row.goal_contributions = contributions;
    row.contributions_per_game = ratio(contributions, row.games);
}

/// `clean_sheets` is played minus losses, matching the published tables.
pub fn derive_standing(row: &mut StandingRow) {
    row.goal_difference = row.goals_for.checked_sub(row.goals_against);
    row.win_percentage = percentage(Some(row.wins), Some(row.played));
    row.points_per_game = ratio(Some(row.points), Some(row.played));
    row.goals_per_game = ratio(Some(row.goals_for), Some(row.played));
    row.clean_sheets = row.played.checked_sub(row.losses);
}

/// Derives every table in place. Row order and raw columns are untouched.
pub fn derive_all(dataset: &mut Dataset) {
    dataset.matches_base.iter_mut().for_each(derive_match_base);
    dataset
        .matches_advanced
        .iter_mut()
        .for_each(derive_match_advanced);
    dataset.player_stats.iter_mut().for_each(derive_player_stat);
    dataset.standings.iter_mut().for_each(derive_standing);
    info!(
        "Derived metrics for {} match(es), {} advanced row(s), {} player(s), {} standings row(s)",
        dataset.matches_base.len(),
        dataset.matches_advanced.len(),
        dataset.player_stats.len(),
        dataset.standings.len()
    );
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn base(home_shots: Option<i32>, home_sot: Option<i32>) -> MatchBase {
        MatchBase {
            match_id: 1,
            competition_name: "La Liga".into(),
            season: "2022-23".into(),
            date: NaiveDate::from_ymd_opt(2022, 8, 12).unwrap(),
            time: None,
            home_team_id: 1,
            away_team_id: 2,
            home_goals: 1,
            away_goals: 3,
            home_shots,
            away_shots: Some(0),
            home_sot,
            away_sot: Some(0),
            home_fouls: None,
            away_fouls: None,
            home_corners: None,
            away_corners: None,
            home_yellow: Some(2),
            away_yellow: None,
            home_red: Some(1),
            away_red: None,
            venue: None,
            referee: None,
            goal_difference: None,
            total_goals: None,
            total_cards: None,
            home_shot_accuracy: None,
            away_shot_accuracy: None,
            result: None,
        }
    }

    #[test]
    fn match_metrics_follow_fixed_formulas() {
        let mut row = base(Some(25), Some(10));
        derive_match_base(&mut row);
        assert_eq!(row.home_shot_accuracy, Some(40.0));
        assert_eq!(row.away_shot_accuracy, None);
        assert_eq!(row.goal_difference, Some(-2));
        assert_eq!(row.total_goals, Some(4));
        assert_eq!(row.total_cards, Some(3));
        assert_eq!(row.result, Some(MatchOutcome::AwayWin));
        assert_eq!(row.home_shots, Some(25));
    }

    #[test]
    fn missing_shots_give_null_accuracy() {
        let mut row = base(None, Some(4));
        derive_match_base(&mut row);
        assert_eq!(row.home_shot_accuracy, None);
    }

    #[test]
    fn advanced_metrics_need_both_sides() {
        let mut row = MatchAdvanced {
            match_id: 1,
            home_xg: Some(2.5),
            away_xg: None,
            home_possession: Some(60.0),
            away_possession: Some(40.0),
            home_passes_completed: Some(450),
            home_passes_attempted: Some(500),
            away_passes_completed: Some(10),
            away_passes_attempted: Some(0),
            home_tackles: None,
            away_tackles: None,
            home_interceptions: None,
            away_interceptions: None,
            home_clearances: None,
            away_clearances: None,
            home_saves: None,
            away_saves: None,
            home_pass_accuracy: None,
            away_pass_accuracy: None,
            possession_delta: None,
            xg_difference: None,
        };
        derive_match_advanced(&mut row);
        assert_eq!(row.home_pass_accuracy, Some(90.0));
        assert_eq!(row.away_pass_accuracy, None);
        assert_eq!(row.possession_delta, Some(20.0));
        assert_eq!(row.xg_difference, None);
    }

    #[test]
    fn player_contributions_treat_missing_as_zero() {
        let mut row = PlayerStat {
            player_id: 1,
            team_id: 1,
            player: "Enner Valencia".into(),
            team: "Ecuador".into(),
            position: Some("FW".into()),
            age: Some(33.0),
            minutes: Some(229),
            games: Some(3),
            goals: Some(3),
            assists: None,
            shots: Some(6),
            shots_on_target: Some(4),
            passes_completed: None,
            passes: None,
            passes_pct: None,
            tackles: None,
            interceptions: None,
            clearances: None,
            touches: None,
            dispossessed: None,
            xg: Some(2.4),
            xg_assist: None,
            goals_per_game: None,
            assists_per_game: None,
            shot_efficiency: None,
            sot_percentage: None,
            goal_contributions: None,
            contributions_per_game: None,
        };
        derive_player_stat(&mut row);
        assert_eq!(row.goals_per_game, Some(1.0));
        assert_eq!(row.assists_per_game, None);
        assert_eq!(row.shot_efficiency, Some(50.0));
        assert_eq!(row.goal_contributions, Some(3));
        assert_eq!(row.contributions_per_game, Some(1.0));

        row.games = Some(0);
        derive_player_stat(&mut row);
        assert_eq!(row.goals_per_game, None);
        assert_eq!(row.goal_contributions, Some(3));
    }

    #[test]
    fn standings_arithmetic() {
        let mut row = StandingRow {
            group: "Group B".into(),
            rank: 1,
            team_id: 4,
            team: "England".into(),
            played: 3,
            wins: 2,
            draws: 1,
            losses: 0,
            goals_for: 9,
            goals_against: 2,
            points: 7,
            goal_difference: None,
            win_percentage: None,
            points_per_game: None,
            goals_per_game: None,
            clean_sheets: None,
        };
        derive_standing(&mut row);
        assert!((row.win_percentage.unwrap() - 66.67).abs() < 0.01);
        assert!((row.points_per_game.unwrap() - 2.333).abs() < 0.001);
        assert_eq!(row.goal_difference, Some(7));
        assert_eq!(row.clean_sheets, Some(3));

        row.played = 0;
        derive_standing(&mut row);
        assert_eq!(row.win_percentage, None);
    }

    #[test]
    fn overflowing_sums_are_left_null() {
        let mut row = base(Some(25), Some(10));
        row.home_goals = i32::MAX;
        row.away_goals = 1;
        row.home_yellow = Some(i32::MAX);
        derive_match_base(&mut row);
        assert_eq!(row.total_goals, None);
        assert_eq!(row.total_cards, None);
        assert_eq!(row.goal_difference, Some(i32::MAX - 1));
        assert_eq!(row.result, Some(MatchOutcome::HomeWin));
    }
}
