//! Finance reports.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use bloom_core::finance::{FinanceReport, Granularity, ReportPeriod};
use bloom_store::OrderRepository;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Window used when the query names no dates.
const DEFAULT_REPORT_DAYS: u32 = 30;

/// `?from=&to=&granularity=`; dates are inclusive calendar days (UTC).
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub granularity: Granularity,
}

impl ReportQuery {
    /// Resolve the period. A missing `to` means today; a missing `from`
    /// means thirty days before `to`.
    fn period(&self, now: DateTime<Utc>) -> Result<ReportPeriod> {
        if self.from.is_none() && self.to.is_none() {
            return Ok(ReportPeriod::last_days(now, DEFAULT_REPORT_DAYS));
        }
        let to = self.to.unwrap_or_else(|| now.date_naive());
        let from = match self.from {
            Some(from) => from,
            None => to
                .checked_sub_days(chrono::Days::new(u64::from(DEFAULT_REPORT_DAYS - 1)))
                .ok_or_else(|| AppError::BadRequest("invalid report range".to_string()))?,
        };
        Ok(ReportPeriod::from_dates(from, to)?)
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/report", get(report))
}

#[instrument(skip(state))]
pub async fn report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<FinanceReport>> {
    let period = query.period(Utc::now())?;
    let orders = OrderRepository::new(state.store()).all().await?;
    Ok(Json(FinanceReport::build(
        &orders,
        period,
        query.granularity,
    )?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_period_is_last_thirty_days() {
        let period = ReportQuery::default().period(now()).unwrap();
        assert_eq!(period, ReportPeriod::last_days(now(), 30));
    }

    #[test]
    fn test_explicit_dates_are_inclusive() {
        let query = ReportQuery {
            from: Some(date(2024, 3, 1)),
            to: Some(date(2024, 3, 1)),
            ..ReportQuery::default()
        };
        let period = query.period(now()).unwrap();
        assert_eq!(
            period,
            ReportPeriod::from_dates(date(2024, 3, 1), date(2024, 3, 1)).unwrap()
        );
    }

    #[test]
    fn test_only_to_given() {
        let query = ReportQuery {
            to: Some(date(2024, 2, 29)),
            ..ReportQuery::default()
        };
        let period = query.period(now()).unwrap();
        assert_eq!(
            period,
            ReportPeriod::from_dates(date(2024, 1, 31), date(2024, 2, 29)).unwrap()
        );
    }

    #[test]
    fn test_reversed_range_rejected() {
        let query = ReportQuery {
            from: Some(date(2024, 3, 10)),
            to: Some(date(2024, 3, 1)),
            ..ReportQuery::default()
        };
        assert!(matches!(query.period(now()), Err(AppError::BadRequest(_))));
    }
}
