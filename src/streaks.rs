use time::Date;

use crate::store::Streak;

/// Streak after food is logged on `logged_on`.
///
/// Logging again on the last logged day, or backfilling an earlier day,
/// leaves the streak as is. The day after extends it; anything later
/// restarts it at 1.
pub fn advance(current: Streak, logged_on: Date) -> Streak {
    let next = match current.last_log_date {
        Some(last) if logged_on <= last => return current,
        Some(last) if last.next_day() == Some(logged_on) => current.current_streak + 1,
        _ => 1,
    };
    Streak {
        current_streak: next,
        best_streak: current.best_streak.max(next),
        last_log_date: Some(logged_on),
    }
}

/// The streak as it stands on `on`. Once a full day has passed without a
/// log the run is broken, so `current_streak` reads 0; `best_streak` stays.
pub fn as_of(streak: Streak, on: Date) -> Streak {
    match streak.last_log_date {
        Some(last) if last.next_day().is_some_and(|d| d < on) => Streak {
            current_streak: 0,
            ..streak
        },
        _ => streak,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn streak(current: i32, best: i32, last: Option<Date>) -> Streak {
        Streak {
            current_streak: current,
            best_streak: best,
            last_log_date: last,
        }
    }

    #[test]
    fn first_log_starts_at_one() {
        let s = advance(Streak::default(), date!(2024 - 06 - 01));
        assert_eq!(s, streak(1, 1, Some(date!(2024 - 06 - 01))));
    }

    #[test]
    fn consecutive_days_extend_and_raise_best() {
        let s = advance(streak(3, 3, Some(date!(2024 - 02 - 28))), date!(2024 - 02 - 29));
        assert_eq!(s, streak(4, 4, Some(date!(2024 - 02 - 29))));
    }

    #[test]
    fn same_day_and_backfill_are_no_ops() {
        let s = streak(2, 5, Some(date!(2024 - 06 - 10)));
        assert_eq!(advance(s, date!(2024 - 06 - 10)), s);
        assert_eq!(advance(s, date!(2024 - 06 - 02)), s);
    }

    #[test]
    fn read_after_a_missed_day_reports_broken_run() {
        let s = streak(3, 5, Some(date!(2024 - 06 - 03)));
        assert_eq!(
            as_of(s, date!(2024 - 06 - 30)),
            streak(0, 5, Some(date!(2024 - 06 - 03)))
        );
        assert_eq!(
            as_of(s, date!(2024 - 06 - 05)),
            streak(0, 5, Some(date!(2024 - 06 - 03)))
        );
    }

    #[test]
    fn read_on_or_the_day_after_last_log_keeps_run() {
        let s = streak(3, 5, Some(date!(2024 - 06 - 03)));
        assert_eq!(as_of(s, date!(2024 - 06 - 03)), s);
        assert_eq!(as_of(s, date!(2024 - 06 - 04)), s);
        assert_eq!(as_of(s, date!(2024 - 05 - 20)), s);
        assert_eq!(as_of(Streak::default(), date!(2024 - 06 - 04)), Streak::default());
    }

    #[test]
    fn gap_restarts_but_keeps_best() {
        let s = advance(streak(6, 9, Some(date!(2024 - 06 - 01))), date!(2024 - 06 - 03));
        assert_eq!(s, streak(1, 9, Some(date!(2024 - 06 - 03))));
    }
}
