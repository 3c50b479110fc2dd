use std::collections::BTreeMap;

use golf_schema::{
    HoleResult, HoleStat, Round, SampleSizes, Statistics, Timestamp, User, TRACKED_HOLES,
};

use crate::reader::RecordStore;

/// Statistics for every user with at least one round, keyed by user id.
pub fn compute_all_statistics(
    store: &RecordStore,
    generated_at: Timestamp,
) -> BTreeMap<String, Statistics> {
    let mut out = BTreeMap::new();
    for user in &store.users {
        match compute_statistics(user, store.rounds_for(&user.id), generated_at) {
            Some(stats) => {
                out.insert(user.id.clone(), stats);
            }
            None => log::debug!("no rounds for user {}, skipping statistics", user.id),
        }
    }
    out
}

/// Rolls a user's full round history into one `Statistics` record.
///
/// Returns `None` when there are no rounds. Rounds are put in date order
/// first (stable, so same-day rounds keep the order they were given in);
/// `recent_form` is the last three of that order, oldest first.
pub fn compute_statistics(
    user: &User,
    rounds: &[Round],
    generated_at: Timestamp,
) -> Option<Statistics> {
    let ordered = chronological(rounds);
    let totals: Vec<u32> = ordered.iter().map(|r| r.total_score).collect();
    let best_score = totals.iter().copied().min()?;

    let avg_score = Sample::over(totals.iter().map(|&s| f64::from(s))).mean();
    let recent_form = totals[totals.len().saturating_sub(3)..].to_vec();

    let holes: Vec<&HoleResult> = ordered.iter().copied().flat_map(|r| &r.hole_results).collect();

    let fairway = Sample::over(holes.iter().filter_map(|h| h.fairway_hit).map(hit_value));
    let green = Sample::over(holes.iter().filter_map(|h| h.green_hit).map(hit_value));
    let putts = Sample::over(holes.iter().filter_map(|h| h.putts).map(f64::from));

    Some(Statistics {
        user_id: user.id.clone(),
        rounds_played: totals.len() as u32,
        avg_score,
        best_score,
        recent_form,
        fairway_hit_rate: fairway.mean(),
        green_hit_rate: green.mean(),
        avg_putts_per_round: putts.mean(),
        sample_sizes: SampleSizes {
            fairway_hit: fairway.count,
            green_hit: green.count,
            putts: putts.count,
        },
        hole_stats: hole_stats(&holes),
        last_updated: generated_at,
    })
}

fn chronological(rounds: &[Round]) -> Vec<&Round> {
    let mut ordered: Vec<&Round> = rounds.iter().collect();
    ordered.sort_by_key(|r| r.date);
    ordered
}

/// One entry per tracked hole; holes nobody played get `0`/`0`.
fn hole_stats(holes: &[&HoleResult]) -> Vec<HoleStat> {
    (1..=TRACKED_HOLES)
        .map(|hole_number| {
            let scores = Sample::over(
                holes
                    .iter()
                    .filter(|h| h.hole_number == hole_number)
                    .map(|h| f64::from(h.score)),
            );
            HoleStat {
                hole_number,
                avg_score: scores.mean(),
                score_count: scores.count,
            }
        })
        .collect()
}

fn hit_value(hit: bool) -> f64 {
    if hit {
        1.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Sample {
    sum: f64,
    count: u32,
}

impl Sample {
    fn over(values: impl Iterator<Item = f64>) -> Self {
        values.fold(Self::default(), |acc, v| Self {
            sum: acc.sum + v,
            count: acc.count + 1,
        })
    }

    /// Rounded mean, `0.0` for an empty sample.
    fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        round2(self.sum / f64::from(self.count))
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
