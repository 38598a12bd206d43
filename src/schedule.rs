//! Weekly staff calendar.
//!
//! A pure projection of jobs onto a Monday-start, 7-day grid with one row per
//! active staff member. Dates are compared as plain calendar days with no
//! timezone conversion. Overlaps are not prevented; `find_conflicts` only
//! reports them.

use chrono::{Datelike, Duration, Local, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

use crate::format::{end_time, format_duration, format_time};
use crate::lifecycle::MAX_JOB_MINUTES;
use crate::models::{Job, JobStatus, Staff};

pub const DAYS_PER_WEEK: usize = 7;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScheduledSlot {
    pub job_id: String,
    pub client_name: String,
    pub address: String,
    pub description: String,
    pub start: String,
    pub end: String,
    pub duration_minutes: u32,
    pub duration_label: String,
    #[serde(skip)]
    start_minute: u32,
}

impl ScheduledSlot {
    fn from_job(job: &Job, default_minutes: u32) -> Option<Self> {
        let start = job.start_time()?;
        let minutes = job
            .estimated_duration
            .filter(|&m| m > 0)
            .unwrap_or(default_minutes)
            .min(MAX_JOB_MINUTES);

        Some(ScheduledSlot {
            job_id: job.id.clone(),
            client_name: job.client_name.clone(),
            address: job.address.clone(),
            description: job.description.clone(),
            start: format_time(start),
            end: format_time(end_time(start, minutes)),
            duration_minutes: minutes,
            duration_label: format_duration(minutes),
            start_minute: start.hour() * 60 + start.minute(),
        })
    }

    fn overlaps(&self, other: &ScheduledSlot) -> bool {
        let a0 = self.start_minute;
        let a1 = a0.saturating_add(self.duration_minutes);
        let b0 = other.start_minute;
        let b1 = b0.saturating_add(other.duration_minutes);
        a0 < b1 && b0 < a1
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StaffRow {
    pub staff_id: String,
    pub staff_name: String,
    /// One entry per day, Monday first.
    pub cells: Vec<Vec<ScheduledSlot>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WeeklySchedule {
    pub week_start: String,
    pub days: Vec<String>,
    pub rows: Vec<StaffRow>,
}

impl WeeklySchedule {
    pub fn cell(&self, staff_id: &str, day: usize) -> Option<&[ScheduledSlot]> {
        self.rows
            .iter()
            .find(|r| r.staff_id == staff_id)
            .and_then(|r| r.cells.get(day))
            .map(|c| c.as_slice())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Conflict {
    pub staff_id: String,
    pub date: String,
    pub first_job_id: String,
    pub second_job_id: String,
}

/// Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn current_week_start() -> NaiveDate {
    week_start(Local::now().date_naive())
}

pub fn week_days(start: NaiveDate) -> Vec<NaiveDate> {
    (0..DAYS_PER_WEEK as i64)
        .map(|offset| start + Duration::days(offset))
        .collect()
}

/// Build the grid for the week containing `any_day`. Archived staff get no row.
pub fn build_week(
    jobs: &[Job],
    staff: &[Staff],
    any_day: NaiveDate,
    default_minutes: u32,
) -> WeeklySchedule {
    let start = week_start(any_day);
    let days = week_days(start);

    let rows = staff
        .iter()
        .filter(|member| !member.archived)
        .map(|member| {
            let cells = days
                .iter()
                .map(|&day| {
                    let mut slots: Vec<ScheduledSlot> = jobs
                        .iter()
                        .filter(|job| {
                            job.status == JobStatus::Scheduled
                                && job.is_assigned_to(&member.id)
                                && job.scheduled_date() == Some(day)
                        })
                        .filter_map(|job| {
                            let slot = ScheduledSlot::from_job(job, default_minutes);
                            if slot.is_none() {
                                tracing::warn!(job_id = %job.id, time = %job.time, "Scheduled job has no readable start time");
                            }
                            slot
                        })
                        .collect();
                    slots.sort_by_key(|s| s.start_minute);
                    slots
                })
                .collect();

            StaffRow {
                staff_id: member.id.clone(),
                staff_name: member.name.clone(),
                cells,
            }
        })
        .collect();

    WeeklySchedule {
        week_start: start.format("%Y-%m-%d").to_string(),
        days: days.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect(),
        rows,
    }
}

/// Pairs of slots that overlap for the same staff member on the same day.
pub fn find_conflicts(schedule: &WeeklySchedule) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for row in &schedule.rows {
        for (day, cell) in row.cells.iter().enumerate() {
            for (i, first) in cell.iter().enumerate() {
                for second in &cell[i + 1..] {
                    if first.overlaps(second) {
                        conflicts.push(Conflict {
                            staff_id: row.staff_id.clone(),
                            date: schedule.days.get(day).cloned().unwrap_or_default(),
                            first_job_id: first.job_id.clone(),
                            second_job_id: second.job_id.clone(),
                        });
                    }
                }
            }
        }
    }

    conflicts
}
