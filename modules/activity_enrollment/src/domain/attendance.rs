//! Attendance tracker
//!
//! Attendance facts live on the participation they belong to. Rates and
//! summaries are derived on every read and never cached.

use crate::contract::{
    AttendanceRecord, AttendanceSummary, EnrollmentError, Participation, ParticipationStatus,
};
use chrono::NaiveDate;
use uuid::Uuid;

/// Attendance may only be recorded for APPROVED participations
pub fn ensure_recordable(participation: &Participation) -> Result<(), EnrollmentError> {
    if participation.status == ParticipationStatus::Approved {
        Ok(())
    } else {
        Err(EnrollmentError::ParticipationNotApproved {
            participation_id: participation.id,
            status: participation.status.to_string(),
        })
    }
}

/// Insert or overwrite the record for `record.date`, keeping the list sorted.
///
/// Returns `true` when an existing record for that date was replaced.
pub fn upsert(records: &mut Vec<AttendanceRecord>, mut record: AttendanceRecord) -> bool {
    if record.present {
        record.excused = false;
    }
    match records.binary_search_by(|r| r.date.cmp(&record.date)) {
        Ok(idx) => {
            records[idx] = record;
            true
        }
        Err(idx) => {
            records.insert(idx, record);
            false
        }
    }
}

/// Fraction of recorded sessions attended; 0 when nothing is recorded
pub fn rate(records: &[AttendanceRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let present = records.iter().filter(|r| r.present).count();
    present as f64 / records.len() as f64
}

/// Aggregate one date across the APPROVED participations of an activity.
///
/// A participant without a record for `date` counts as absent (not present,
/// not excused).
pub fn summarize(
    activity_id: Uuid,
    date: NaiveDate,
    participations: &[Participation],
) -> AttendanceSummary {
    let mut summary = AttendanceSummary {
        activity_id,
        date,
        present: 0,
        excused: 0,
        absent: 0,
        rate: 0.0,
    };

    for participation in participations
        .iter()
        .filter(|p| p.activity_id == activity_id && p.status == ParticipationStatus::Approved)
    {
        match participation.attendance_on(date) {
            Some(r) if r.present => summary.present += 1,
            Some(r) if r.excused => summary.excused += 1,
            _ => summary.absent += 1,
        }
    }

    let total = summary.total();
    if total > 0 {
        summary.rate = f64::from(summary.present) / f64::from(total);
    }
    summary
}
