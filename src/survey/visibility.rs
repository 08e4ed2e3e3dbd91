//! Role-scoped survey listings.
//!
//! Respondents only see what they could answer right now; creators see their
//! own surveys in any state; admins see everything.

use super::availability::{is_available_now, time_of_day_key};
use crate::error::SurveyResult;
use crate::orm::survey_invitations::InvitationStatus;
use crate::orm::users::Role;
use crate::orm::{survey_responses, surveys, surveys::SurveyType};
use crate::user::Principal;
use chrono::{DateTime, TimeZone};
use sea_orm::sea_query::Expr;
use sea_orm::{
    entity::*, query::*, ActiveEnum, Condition, DatabaseConnection, PaginatorTrait, Value,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_PER_PAGE: u64 = 15;

/// Listing filters shared by every role.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SurveyFilters {
    #[serde(rename = "type")]
    pub survey_type: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub per_page: Option<i64>,
    pub page: Option<i64>,
}

impl SurveyFilters {
    /// Non-positive or missing sizes fall back to the default.
    pub fn per_page(&self) -> u64 {
        match self.per_page {
            Some(n) if n > 0 => n as u64,
            _ => DEFAULT_PER_PAGE,
        }
    }

    /// One-based page number.
    pub fn page(&self) -> u64 {
        match self.page {
            Some(n) if n > 0 => n as u64,
            _ => 1,
        }
    }
}

/// A survey annotated for the requesting user.
#[derive(Clone, Debug)]
pub struct SurveyListing {
    pub survey: surveys::Model,
    pub available_now: bool,
    pub already_submitted: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub last_page: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
        }
    }
}

pub async fn list_for_user<Tz: TimeZone>(
    db: &DatabaseConnection,
    user: &Principal,
    filters: &SurveyFilters,
    now: &DateTime<Tz>,
) -> SurveyResult<Page<SurveyListing>>
where
    Tz::Offset: std::fmt::Display,
{
    let mut query = surveys::Entity::find().filter(surveys::Column::DeletedAt.is_null());

    query = match user.role {
        Role::Respondent => query.filter(respondent_scope(user, now)),
        Role::Creator => query.filter(surveys::Column::CreatedBy.eq(user.id)),
        Role::Admin => query,
    };

    let query = apply_filters(query, filters)
        .order_by_desc(surveys::Column::CreatedAt)
        .order_by_desc(surveys::Column::Id);

    let (rows, page) = fetch_page(db, query, filters).await?;
    let submitted = submitted_survey_ids(db, user.id, &rows).await?;

    Ok(page.with_items(
        rows.into_iter()
            .map(|survey| SurveyListing {
                available_now: is_available_now(&survey, now),
                already_submitted: submitted.contains(&survey.id),
                survey,
            })
            .collect(),
    ))
}

/// Soft-deleted surveys, newest deletion first. Admin only.
pub async fn list_deleted(
    db: &DatabaseConnection,
    user: &Principal,
    filters: &SurveyFilters,
) -> SurveyResult<Page<SurveyListing>> {
    user.require_admin()?;

    let query = surveys::Entity::find().filter(surveys::Column::DeletedAt.is_not_null());
    let query = apply_filters(query, filters)
        .order_by_desc(surveys::Column::DeletedAt)
        .order_by_desc(surveys::Column::Id);

    let (rows, page) = fetch_page(db, query, filters).await?;

    Ok(page.with_items(
        rows.into_iter()
            .map(|survey| SurveyListing {
                survey,
                available_now: false,
                already_submitted: false,
            })
            .collect(),
    ))
}

/// Surveys a respondent could open and answer at `now`.
fn respondent_scope<Tz: TimeZone>(user: &Principal, now: &DateTime<Tz>) -> Condition
where
    Tz::Offset: std::fmt::Display,
{
    let now_utc = now.naive_utc();
    let clock = time_of_day_key(now);

    let not_expired = Condition::any()
        .add(surveys::Column::ExpiresAt.is_null())
        .add(surveys::Column::ExpiresAt.gt(now_utc));

    // Window bounds are stored as zero-padded HH:MM:SS, so text order is time order.
    let in_window = Condition::any()
        .add(surveys::Column::AvailableFromTime.is_null())
        .add(surveys::Column::AvailableUntilTime.is_null())
        .add(
            Condition::all()
                .add(surveys::Column::AvailableFromTime.lte(clock.clone()))
                .add(surveys::Column::AvailableUntilTime.gte(clock)),
        );

    let not_answered = Expr::cust_with_values(
        "NOT EXISTS (SELECT 1 FROM survey_responses \
         WHERE survey_responses.survey_id = surveys.id \
         AND survey_responses.respondent_id = ?)",
        vec![Value::from(user.id)],
    );

    let invited = Expr::cust_with_values(
        "EXISTS (SELECT 1 FROM survey_invitations \
         WHERE survey_invitations.survey_id = surveys.id \
         AND survey_invitations.email = ? \
         AND survey_invitations.status = ? \
         AND (survey_invitations.expires_at IS NULL OR survey_invitations.expires_at > ?))",
        vec![
            Value::from(user.normalized_email()),
            Value::from(InvitationStatus::Pending.to_value()),
            Value::from(now_utc),
        ],
    );

    Condition::all()
        .add(surveys::Column::IsActive.eq(true))
        .add(surveys::Column::IsClosed.eq(false))
        .add(not_expired)
        .add(in_window)
        .add(not_answered)
        .add(
            Condition::any()
                .add(surveys::Column::IsPublic.eq(true))
                .add(invited),
        )
}

fn apply_filters(mut query: Select<surveys::Entity>, filters: &SurveyFilters) -> Select<surveys::Entity> {
    // Unknown types are ignored rather than rejected.
    if let Some(survey_type) = filters
        .survey_type
        .as_deref()
        .and_then(SurveyType::from_str)
    {
        query = query.filter(surveys::Column::SurveyType.eq(survey_type));
    }

    if filters.status.as_deref() == Some("active") {
        query = query.filter(surveys::Column::IsActive.eq(true));
    }

    if let Some(search) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
        query = query.filter(Expr::cust_with_values(
            "(LOWER(surveys.title) LIKE ? ESCAPE '!' OR LOWER(surveys.description) LIKE ? ESCAPE '!')",
            vec![Value::from(pattern.clone()), Value::from(pattern)],
        ));
    }

    query
}

/// Makes `%` and `_` match literally under `ESCAPE '!'`.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '!' | '%' | '_') {
            out.push('!');
        }
        out.push(c);
    }
    out
}

struct PageInfo {
    page: u64,
    per_page: u64,
    total: u64,
    last_page: u64,
}

impl PageInfo {
    fn with_items<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
        }
    }
}

async fn fetch_page(
    db: &DatabaseConnection,
    query: Select<surveys::Entity>,
    filters: &SurveyFilters,
) -> SurveyResult<(Vec<surveys::Model>, PageInfo)> {
    let per_page = filters.per_page();
    let page = filters.page();

    let paginator = query.paginate(db, per_page as usize);
    let total = paginator.num_items().await? as u64;
    let rows = paginator.fetch_page((page - 1) as usize).await?;

    Ok((
        rows,
        PageInfo {
            page,
            per_page,
            total,
            last_page: total.div_ceil(per_page).max(1),
        },
    ))
}

async fn submitted_survey_ids(
    db: &DatabaseConnection,
    respondent_id: i32,
    rows: &[surveys::Model],
) -> SurveyResult<HashSet<i32>> {
    if rows.is_empty() {
        return Ok(HashSet::new());
    }

    let ids: Vec<i32> = rows.iter().map(|s| s.id).collect();
    let responses = survey_responses::Entity::find()
        .filter(survey_responses::Column::RespondentId.eq(respondent_id))
        .filter(survey_responses::Column::SurveyId.is_in(ids))
        .all(db)
        .await?;

    Ok(responses.into_iter().map(|r| r.survey_id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_page_defaults_and_coercion() {
        let mut filters = SurveyFilters::default();
        assert_eq!(filters.per_page(), 15);

        filters.per_page = Some(0);
        assert_eq!(filters.per_page(), 15);

        filters.per_page = Some(-4);
        assert_eq!(filters.per_page(), 15);

        filters.per_page = Some(3);
        assert_eq!(filters.per_page(), 3);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("lunch"), "lunch");
        assert_eq!(escape_like("100%"), "100!%");
        assert_eq!(escape_like("a_b!"), "a!_b!!");
    }

    #[test]
    fn test_page_is_one_based() {
        let mut filters = SurveyFilters::default();
        assert_eq!(filters.page(), 1);

        filters.page = Some(0);
        assert_eq!(filters.page(), 1);

        filters.page = Some(4);
        assert_eq!(filters.page(), 4);
    }
}
