//! SeaORM entities.

pub mod question_options;
pub mod questions;
pub mod survey_answers;
pub mod survey_invitations;
pub mod survey_responses;
pub mod surveys;
pub mod users;
