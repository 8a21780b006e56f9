//! Input validation for engine operations

use crate::contract::{ActivityPatch, EnrollmentError, NewActivity, Schedule};

/// Longest accepted activity title
pub const MAX_TITLE_LEN: usize = 200;

/// Longest accepted free-text field (messages, notes, feedback)
pub const MAX_TEXT_LEN: usize = 4000;

/// Highest participation score
pub const MAX_SCORE: u8 = 100;

/// Largest capacity any store can hold (SQL columns are 32-bit signed)
pub const MAX_PARTICIPANTS: u32 = i32::MAX as u32;

pub fn validate_new_activity(input: &NewActivity) -> Result<(), EnrollmentError> {
    validate_title(&input.title)?;
    validate_max_participants(input.max_participants)?;
    validate_text("description", Some(&input.description))?;
    validate_schedule(&input.schedule)
}

pub fn validate_patch(patch: &ActivityPatch) -> Result<(), EnrollmentError> {
    if let Some(title) = &patch.title {
        validate_title(title)?;
    }
    validate_text("description", patch.description.as_deref())?;
    if let Some(max) = patch.max_participants {
        validate_max_participants(max)?;
    }
    if let Some(schedule) = &patch.schedule {
        validate_schedule(schedule)?;
    }
    Ok(())
}

pub fn validate_max_participants(max_participants: u32) -> Result<(), EnrollmentError> {
    if max_participants == 0 {
        return Err(EnrollmentError::validation("max_participants must be positive"));
    }
    if max_participants > MAX_PARTICIPANTS {
        return Err(EnrollmentError::validation(format!(
            "max_participants cannot exceed {}",
            MAX_PARTICIPANTS
        )));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), EnrollmentError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(EnrollmentError::validation("title cannot be empty"));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(EnrollmentError::validation(format!(
            "title exceeds {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(())
}

/// Free text is optional but bounded
pub fn validate_text(field: &str, value: Option<&str>) -> Result<(), EnrollmentError> {
    match value {
        Some(text) if text.chars().count() > MAX_TEXT_LEN => Err(EnrollmentError::validation(
            format!("{} exceeds {} characters", field, MAX_TEXT_LEN),
        )),
        _ => Ok(()),
    }
}

pub fn validate_score(score: Option<u8>) -> Result<(), EnrollmentError> {
    match score {
        Some(s) if s > MAX_SCORE => Err(EnrollmentError::validation(format!(
            "participation score {} is outside 0-{}",
            s, MAX_SCORE
        ))),
        _ => Ok(()),
    }
}

/// Schedule fields are opaque, only obviously broken shapes are rejected
pub fn validate_schedule(schedule: &Schedule) -> Result<(), EnrollmentError> {
    if let (Some(start), Some(end)) = (schedule.start_date, schedule.end_date) {
        if end < start {
            return Err(EnrollmentError::validation(format!(
                "schedule ends ({}) before it starts ({})",
                end, start
            )));
        }
    }
    if schedule.duration_minutes == Some(0) {
        return Err(EnrollmentError::validation("duration_minutes must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{ActivityCategory, ActivityLevel};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn input() -> NewActivity {
        NewActivity {
            school_id: Uuid::new_v4(),
            title: "Debate Team".to_string(),
            description: "Weekly practice".to_string(),
            category: ActivityCategory::Academic,
            level: ActivityLevel::Intermediate,
            max_participants: 12,
            requires_approval: true,
            allow_waitlist: false,
            is_public: true,
            schedule: Schedule::default(),
        }
    }

    #[test]
    fn test_valid_activity_passes() {
        assert!(validate_new_activity(&input()).is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut s = input();
        s.max_participants = 0;
        assert!(matches!(
            validate_new_activity(&s),
            Err(EnrollmentError::Validation { .. })
        ));
    }

    #[test]
    fn test_capacity_upper_bound() {
        let mut s = input();
        s.max_participants = MAX_PARTICIPANTS;
        assert!(validate_new_activity(&s).is_ok());
        s.max_participants = u32::MAX;
        assert!(matches!(
            validate_new_activity(&s),
            Err(EnrollmentError::Validation { .. })
        ));

        let patch = ActivityPatch {
            max_participants: Some(MAX_PARTICIPANTS + 1),
            ..Default::default()
        };
        assert!(matches!(
            validate_patch(&patch),
            Err(EnrollmentError::Validation { .. })
        ));
    }

    #[test]
    fn test_blank_title_rejected() {
        let mut s = input();
        s.title = "   ".to_string();
        assert!(validate_new_activity(&s).is_err());
        s.title = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(validate_new_activity(&s).is_err());
    }

    #[test]
    fn test_schedule_order() {
        let mut s = input();
        s.schedule.start_date = NaiveDate::from_ymd_opt(2024, 9, 1);
        s.schedule.end_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        assert!(validate_new_activity(&s).is_err());
    }

    #[test]
    fn test_score_bounds() {
        assert!(validate_score(None).is_ok());
        assert!(validate_score(Some(100)).is_ok());
        assert!(validate_score(Some(101)).is_err());
    }

    #[test]
    fn test_patch_validation() {
        let patch = ActivityPatch {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(validate_patch(&patch).is_err());
        assert!(validate_patch(&ActivityPatch::default()).is_ok());
    }
}
