use crate::error::{SurveyError, SurveyResult};
use crate::orm::surveys;
use crate::orm::users::{self, Role};
use sea_orm::{entity::*, DatabaseConnection};

/// The authenticated caller of a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub id: i32,
    pub email: String,
    pub role: Role,
}

impl From<users::Model> for Principal {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

impl Principal {
    /// Returns a principal by user id.
    pub async fn get_by_id(
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<Option<Self>, sea_orm::DbErr> {
        Ok(users::Entity::find_by_id(id).one(db).await?.map(Self::from))
    }

    /// Lower-cased email, the form invitations are keyed by.
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }

    /// Creators and admins author and manage surveys.
    pub fn require_author(&self) -> SurveyResult<()> {
        match self.role {
            Role::Admin | Role::Creator => Ok(()),
            Role::Respondent => Err(SurveyError::forbidden(
                "You do not have permission to perform this action.",
            )),
        }
    }

    pub fn require_respondent(&self) -> SurveyResult<()> {
        match self.role {
            Role::Respondent => Ok(()),
            Role::Admin | Role::Creator => Err(SurveyError::forbidden(
                "You do not have permission to perform this action.",
            )),
        }
    }

    pub fn require_admin(&self) -> SurveyResult<()> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Creator | Role::Respondent => Err(SurveyError::forbidden(
                "You do not have permission to perform this action.",
            )),
        }
    }

    /// Admins manage every survey, everyone else only their own.
    pub fn ensure_survey_manager(&self, survey: &surveys::Model) -> SurveyResult<()> {
        let allowed = match self.role {
            Role::Admin => true,
            Role::Creator | Role::Respondent => survey.created_by == self.id,
        };

        if allowed {
            Ok(())
        } else {
            Err(SurveyError::forbidden("You cannot modify this survey."))
        }
    }
}
