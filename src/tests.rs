//! Integration tests for the store and workflow layers.
//! These tests use an in-memory SQLite database with the real schema.

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rusqlite::Connection;
    use std::sync::Mutex;

    use crate::access;
    use crate::admin;
    use crate::ai::allocation;
    use crate::ai::chat::{ChatAssistant, MAX_HISTORY};
    use crate::ai::{ChatMessage, ChatRole, CompletionBackend};
    use crate::config::AppConfig;
    use crate::db::Database;
    use crate::error::AppError;
    use crate::lifecycle;
    use crate::models::*;
    use crate::receipts;
    use crate::schedule;
    use crate::store::{clients, consumables, finance, job_records, jobs, settings, staff};

    /// Create a test database with schema
    fn setup_test_db() -> Connection {
        let db = Database::open_in_memory().expect("Failed to create in-memory database");
        db.initialize().expect("Failed to create schema");
        db.conn.into_inner().expect("Lock poisoned")
    }

    fn add_staff(conn: &Connection, name: &str, email: &str) -> Staff {
        staff::create_staff(
            conn,
            CreateStaff {
                name: name.to_string(),
                email: email.to_string(),
                position: StaffPosition::Staff,
                skills: vec!["Office".to_string()],
                location: "Parramatta".to_string(),
                availability: "Weekdays".to_string(),
                avatar: None,
            },
        )
        .unwrap()
    }

    fn new_job(client: &str, date: &str, time: &str, cleaner_ids: Vec<String>) -> CreateJob {
        CreateJob {
            client_name: client.to_string(),
            address: "1 George St".to_string(),
            date: Some(date.to_string()),
            time: Some(time.to_string()),
            description: "Office clean".to_string(),
            cleaner_ids,
            ..Default::default()
        }
    }

    /// A Scheduled job on Monday 15 Jan 2024 at 09:00 for `member`.
    fn scheduled_job(conn: &Connection, client: &str, member: &Staff) -> Job {
        jobs::create_job(
            conn,
            new_job(client, "2024-01-15", "09:00", vec![member.id.clone()]),
        )
        .unwrap()
    }

    fn completion(job_id: &str, price: f64) -> CompleteJob {
        CompleteJob {
            job_id: job_id.to_string(),
            price_charged: price,
            notes: None,
            completed_at: None,
        }
    }

    fn purchase(name: &str, kind: ConsumableType, amount: f64, date: &str) -> CreateConsumable {
        CreateConsumable {
            name: name.to_string(),
            consumable_type: kind,
            purchased_from: "Bunnings".to_string(),
            purchase_amount: amount,
            date_purchased: date.to_string(),
            receipt_path: None,
            created_by: "owner@example.com".to_string(),
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ===== JOB LIFECYCLE TESTS =====

    #[test]
    fn test_job_without_staff_starts_unscheduled() {
        let conn = setup_test_db();

        let job = jobs::create_job(&conn, new_job("Acme Corp", "2024-01-15", "09:00", vec![])).unwrap();
        assert_eq!(job.status, JobStatus::Unscheduled);

        let undated = jobs::create_job(
            &conn,
            CreateJob {
                client_name: "Acme Corp".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(undated.status, JobStatus::Unscheduled);
        assert_eq!(undated.date, "");
    }

    #[test]
    fn test_job_with_full_slot_starts_scheduled() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");

        let job = scheduled_job(&conn, "Acme Corp", &alice);
        assert_eq!(job.status, JobStatus::Scheduled);
        assert_eq!(job.cleaner_ids, vec![alice.id.clone()]);
    }

    #[test]
    fn test_create_job_requires_client_name() {
        let conn = setup_test_db();

        let result = jobs::create_job(&conn, new_job("  ", "2024-01-15", "09:00", vec![]));
        assert!(matches!(result, Err(AppError::Validation(_))));

        let bad_date = jobs::create_job(&conn, new_job("Acme Corp", "15/01/2024", "09:00", vec![]));
        assert!(matches!(bad_date, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_acme_job_end_to_end() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");
        clients::create_client(
            &conn,
            CreateClient {
                name: "Acme Corp".to_string(),
                email: None,
                phone: None,
                address: None,
                avatar: None,
            },
        )
        .unwrap();

        let job = jobs::create_job(&conn, new_job("Acme Corp", "2024-01-15", "09:00", vec![])).unwrap();
        assert_eq!(job.status, JobStatus::Unscheduled);

        let job = jobs::assign_job(
            &conn,
            AssignJob {
                job_id: job.id.clone(),
                cleaner_ids: vec![alice.id.clone()],
                date: "2024-01-15".to_string(),
                time: "09:00".to_string(),
            },
        )
        .unwrap();
        assert_eq!(job.status, JobStatus::Scheduled);

        let (job, record) = jobs::complete_job(&conn, completion(&job.id, 150.0)).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.price_charged, Some(150.0));
        assert_eq!(record.job_id, job.id);
        assert_eq!(record.client_name, "Acme Corp");
        assert_eq!(record.staff, vec!["Alice Smith".to_string()]);
        assert!((record.price_charged - 150.0).abs() < 0.01);

        let register = job_records::list_records(&conn).unwrap();
        assert_eq!(register.len(), 1);

        let months = job_records::monthly_revenue(&conn).unwrap();
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].month, "2024-01");
        assert_eq!(months[0].label, "January 2024");
        assert_eq!(months[0].job_count, 1);
        assert!((months[0].revenue - 150.0).abs() < 0.01);

        let client_list = clients::list_clients(&conn).unwrap();
        assert!((client_list[0].total_spent - 150.0).abs() < 0.01);
    }

    #[test]
    fn test_complete_rejects_non_positive_price() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");
        let job = scheduled_job(&conn, "Acme Corp", &alice);

        for price in [0.0, -10.0, f64::NAN] {
            let result = jobs::complete_job(&conn, completion(&job.id, price));
            assert!(matches!(result, Err(AppError::Validation(_))), "price {price} should fail");
        }

        let job = jobs::get_job(&conn, &job.id).unwrap();
        assert_eq!(job.status, JobStatus::Scheduled);
        assert!(job_records::list_records(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_validate_completion() {
        let ok = lifecycle::validate_completion(150.0);
        assert!(ok.is_valid);
        assert!(ok.errors.is_empty());

        let zero = lifecycle::validate_completion(0.0);
        assert!(!zero.is_valid);
        assert_eq!(zero.errors.len(), 1);
    }

    #[test]
    fn test_completion_time_override() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");
        let job = scheduled_job(&conn, "Acme Corp", &alice);

        let (_, record) = jobs::complete_job(
            &conn,
            CompleteJob {
                job_id: job.id.clone(),
                price_charged: 95.5,
                notes: Some("Extra windows".to_string()),
                completed_at: Some("2024-02-01T10:30:00+11:00".to_string()),
            },
        )
        .unwrap();

        assert_eq!(job_records::completion_month(&record.completed_at).as_deref(), Some("2024-02"));
        assert_eq!(record.notes.as_deref(), Some("Extra windows"));

        let bad = jobs::create_job(&conn, new_job("Acme Corp", "2024-01-16", "09:00", vec![alice.id.clone()]))
            .unwrap();
        let result = jobs::complete_job(
            &conn,
            CompleteJob {
                job_id: bad.id,
                price_charged: 10.0,
                notes: None,
                completed_at: Some("yesterday".to_string()),
            },
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_register_orders_by_instant_across_offsets() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");
        let complete_at = |client: &str, at: &str| {
            let job = scheduled_job(&conn, client, &alice);
            jobs::complete_job(
                &conn,
                CompleteJob {
                    completed_at: Some(at.to_string()),
                    ..completion(&job.id, 100.0)
                },
            )
            .unwrap()
            .1
        };

        // 04:30 UTC on the 16th
        let late = complete_at("Acme Corp", "2024-01-15T23:30:00-05:00");
        let early = complete_at("Acme Corp", "2024-01-16T01:00:00+00:00");

        let register = job_records::list_records(&conn).unwrap();
        assert_eq!(register[0].id, late.id);
        assert_eq!(register[1].id, early.id);

        let history = job_records::records_for_client(&conn, "Acme Corp").unwrap();
        assert_eq!(history[0].id, late.id);
        assert_eq!(history[1].id, early.id);
    }

    #[test]
    fn test_invalid_transitions() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");

        let unscheduled = jobs::create_job(&conn, new_job("Acme Corp", "", "", vec![])).unwrap();
        assert!(matches!(
            jobs::complete_job(&conn, completion(&unscheduled.id, 100.0)),
            Err(AppError::InvalidTransition {
                from: JobStatus::Unscheduled,
                to: JobStatus::Completed
            })
        ));
        assert!(matches!(
            jobs::start_job(&conn, &unscheduled.id),
            Err(AppError::InvalidTransition { .. })
        ));

        let job = scheduled_job(&conn, "Acme Corp", &alice);
        let started = jobs::start_job(&conn, &job.id).unwrap();
        assert_eq!(started.status, JobStatus::InProgress);

        // In Progress cannot be re-assigned
        let reassign = jobs::assign_job(
            &conn,
            AssignJob {
                job_id: job.id.clone(),
                cleaner_ids: vec![alice.id.clone()],
                date: "2024-01-16".to_string(),
                time: "10:00".to_string(),
            },
        );
        assert!(matches!(reassign, Err(AppError::InvalidTransition { .. })));

        jobs::complete_job(&conn, completion(&job.id, 120.0)).unwrap();

        // Completed is terminal
        assert!(jobs::complete_job(&conn, completion(&job.id, 120.0)).is_err());
        assert!(jobs::start_job(&conn, &job.id).is_err());
        assert_eq!(job_records::list_records(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_transition_table() {
        use JobStatus::*;

        assert!(lifecycle::can_transition(Unscheduled, Scheduled));
        assert!(lifecycle::can_transition(Scheduled, Scheduled));
        assert!(lifecycle::can_transition(Scheduled, InProgress));
        assert!(lifecycle::can_transition(Scheduled, Completed));
        assert!(lifecycle::can_transition(InProgress, Completed));

        assert!(!lifecycle::can_transition(Unscheduled, InProgress));
        assert!(!lifecycle::can_transition(InProgress, Scheduled));
        for &to in JobStatus::ALL {
            assert!(!lifecycle::can_transition(Completed, to));
        }
    }

    #[test]
    fn test_assign_requires_full_slot() {
        let conn = setup_test_db();
        let job = jobs::create_job(&conn, new_job("Acme Corp", "", "", vec![])).unwrap();

        let result = jobs::assign_job(
            &conn,
            AssignJob {
                job_id: job.id.clone(),
                cleaner_ids: vec![],
                date: "2024-01-15".to_string(),
                time: String::new(),
            },
        );
        match result {
            Err(AppError::Validation(msg)) => {
                assert!(msg.contains("start time"));
                assert!(msg.contains("staff member"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let unknown = jobs::assign_job(
            &conn,
            AssignJob {
                job_id: job.id,
                cleaner_ids: vec!["no-such-id".to_string()],
                date: "2024-01-15".to_string(),
                time: "09:00".to_string(),
            },
        );
        assert!(matches!(unknown, Err(AppError::NotFound { .. })));
    }

    #[test]
    fn test_scheduled_jobs_always_have_slot() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");
        scheduled_job(&conn, "Acme Corp", &alice);
        jobs::create_job(&conn, new_job("Beta Pty", "2024-01-16", "", vec![alice.id.clone()])).unwrap();
        jobs::create_job(&conn, new_job("Gamma Ltd", "", "", vec![])).unwrap();

        for job in jobs::list_jobs(&conn).unwrap() {
            if job.status != JobStatus::Unscheduled {
                assert!(lifecycle::has_slot(&job.date, &job.time, &job.cleaner_ids));
            }
        }
        assert_eq!(
            jobs::list_jobs_by_status(&conn, JobStatus::Scheduled).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_update_rules() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");

        let job = jobs::create_job(&conn, new_job("Acme Corp", "", "", vec![])).unwrap();
        let update = |job: &Job, date: &str, time: &str, ids: Vec<String>| UpdateJob {
            id: job.id.clone(),
            client_name: job.client_name.clone(),
            address: job.address.clone(),
            date: Some(date.to_string()),
            time: Some(time.to_string()),
            description: "Deep clean".to_string(),
            cleaner_ids: ids,
            estimated_duration: Some(180),
            quoted_price: Some(200.0),
            estimated_value: None,
            notes: None,
        };

        // Unscheduled job gaining a full slot becomes Scheduled
        let scheduled = jobs::update_job(
            &conn,
            update(&job, "2024-01-15", "09:00", vec![alice.id.clone()]),
        )
        .unwrap();
        assert_eq!(scheduled.status, JobStatus::Scheduled);
        assert_eq!(scheduled.description, "Deep clean");
        assert_eq!(scheduled.estimated_duration, Some(180));

        // A scheduled job cannot drop its time
        let cleared = jobs::update_job(&conn, update(&scheduled, "2024-01-15", "", vec![alice.id.clone()]));
        assert!(matches!(cleared, Err(AppError::Validation(_))));

        // Completed jobs are frozen
        jobs::complete_job(&conn, completion(&job.id, 200.0)).unwrap();
        let frozen = jobs::update_job(
            &conn,
            update(&scheduled, "2024-01-20", "09:00", vec![alice.id.clone()]),
        );
        assert!(matches!(frozen, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_delete_job() {
        let conn = setup_test_db();
        let job = jobs::create_job(&conn, new_job("Acme Corp", "", "", vec![])).unwrap();

        jobs::delete_job(&conn, &job.id).unwrap();
        assert!(matches!(jobs::get_job(&conn, &job.id), Err(AppError::NotFound { .. })));
        assert!(matches!(jobs::delete_job(&conn, &job.id), Err(AppError::NotFound { .. })));
    }

    // ===== SCHEDULE TESTS =====

    #[test]
    fn test_week_starts_monday() {
        assert_eq!(schedule::week_start(ymd(2024, 1, 17)), ymd(2024, 1, 15));
        assert_eq!(schedule::week_start(ymd(2024, 1, 15)), ymd(2024, 1, 15));
        assert_eq!(schedule::week_start(ymd(2024, 1, 21)), ymd(2024, 1, 15));

        let days = schedule::week_days(ymd(2024, 1, 15));
        assert_eq!(days.len(), 7);
        assert_eq!(days[6], ymd(2024, 1, 21));
    }

    #[test]
    fn test_scheduled_job_appears_in_exactly_one_cell() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");
        let bob = add_staff(&conn, "Bob Jones", "bob@example.com");
        let job = scheduled_job(&conn, "Acme Corp", &alice);

        let all_jobs = jobs::list_jobs(&conn).unwrap();
        let roster = staff::list_staff(&conn, false).unwrap();
        let week = schedule::build_week(&all_jobs, &roster, ymd(2024, 1, 17), 120);

        assert_eq!(week.week_start, "2024-01-15");
        assert_eq!(week.rows.len(), 2);

        let mut hits = 0;
        for row in &week.rows {
            for cell in &row.cells {
                hits += cell.iter().filter(|s| s.job_id == job.id).count();
            }
        }
        assert_eq!(hits, 1);

        let cell = week.cell(&alice.id, 0).unwrap();
        assert_eq!(cell[0].start, "09:00");
        assert_eq!(cell[0].end, "11:00");
        assert_eq!(cell[0].duration_label, "2h");
        assert!(week.cell(&bob.id, 0).unwrap().is_empty());

        // The following week is empty
        let next = schedule::build_week(&all_jobs, &roster, ymd(2024, 1, 22), 120);
        assert!(next.rows.iter().all(|r| r.cells.iter().all(|c| c.is_empty())));
    }

    #[test]
    fn test_only_scheduled_jobs_on_grid() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");
        let started = scheduled_job(&conn, "Acme Corp", &alice);
        jobs::start_job(&conn, &started.id).unwrap();
        let done = scheduled_job(&conn, "Beta Pty", &alice);
        jobs::complete_job(&conn, completion(&done.id, 80.0)).unwrap();

        let all_jobs = jobs::list_jobs(&conn).unwrap();
        let roster = staff::list_staff(&conn, false).unwrap();
        let week = schedule::build_week(&all_jobs, &roster, ymd(2024, 1, 15), 120);

        assert!(week.cell(&alice.id, 0).unwrap().is_empty());
    }

    #[test]
    fn test_multi_cleaner_job_shows_for_each() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");
        let bob = add_staff(&conn, "Bob Jones", "bob@example.com");
        jobs::create_job(
            &conn,
            new_job("Acme Corp", "2024-01-18", "13:30", vec![alice.id.clone(), bob.id.clone()]),
        )
        .unwrap();

        let all_jobs = jobs::list_jobs(&conn).unwrap();
        let roster = staff::list_staff(&conn, false).unwrap();
        let week = schedule::build_week(&all_jobs, &roster, ymd(2024, 1, 15), 90);

        assert_eq!(week.cell(&alice.id, 3).unwrap().len(), 1);
        assert_eq!(week.cell(&bob.id, 3).unwrap().len(), 1);
        assert_eq!(week.cell(&bob.id, 3).unwrap()[0].end, "15:00");
    }

    #[test]
    fn test_find_conflicts() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");
        let first = scheduled_job(&conn, "Acme Corp", &alice);
        let second = jobs::create_job(
            &conn,
            new_job("Beta Pty", "2024-01-15", "10:00", vec![alice.id.clone()]),
        )
        .unwrap();
        // Back-to-back is not a conflict
        jobs::create_job(
            &conn,
            new_job("Gamma Ltd", "2024-01-15", "13:00", vec![alice.id.clone()]),
        )
        .unwrap();

        let all_jobs = jobs::list_jobs(&conn).unwrap();
        let roster = staff::list_staff(&conn, false).unwrap();
        let week = schedule::build_week(&all_jobs, &roster, ymd(2024, 1, 15), 120);
        let conflicts = schedule::find_conflicts(&week);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].staff_id, alice.id);
        assert_eq!(conflicts[0].date, "2024-01-15");
        assert_eq!(conflicts[0].first_job_id, first.id);
        assert_eq!(conflicts[0].second_job_id, second.id);
    }

    #[test]
    fn test_duration_bounds() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");

        for minutes in [0, lifecycle::MAX_JOB_MINUTES + 1, u32::MAX] {
            let result = jobs::create_job(
                &conn,
                CreateJob {
                    estimated_duration: Some(minutes),
                    ..new_job("Acme Corp", "2024-01-15", "09:00", vec![alice.id.clone()])
                },
            );
            assert!(matches!(result, Err(AppError::Validation(_))), "{minutes} minutes should fail");
        }

        let job = scheduled_job(&conn, "Acme Corp", &alice);
        let result = jobs::update_job(
            &conn,
            UpdateJob {
                id: job.id.clone(),
                client_name: job.client_name.clone(),
                address: job.address.clone(),
                date: Some(job.date.clone()),
                time: Some(job.time.clone()),
                description: job.description.clone(),
                cleaner_ids: job.cleaner_ids.clone(),
                estimated_duration: Some(u32::MAX),
                quoted_price: None,
                estimated_value: None,
                notes: None,
            },
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_oversized_stored_duration_is_clamped() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");
        scheduled_job(&conn, "Acme Corp", &alice);
        jobs::create_job(
            &conn,
            new_job("Beta Pty", "2024-01-15", "10:00", vec![alice.id.clone()]),
        )
        .unwrap();
        // Rows written before the bound existed
        conn.execute("UPDATE jobs SET estimated_duration = 4294967295", [])
            .unwrap();

        let all_jobs = jobs::list_jobs(&conn).unwrap();
        let roster = staff::list_staff(&conn, false).unwrap();
        let week = schedule::build_week(&all_jobs, &roster, ymd(2024, 1, 15), 120);

        let cell = week.cell(&alice.id, 0).unwrap();
        assert_eq!(cell.len(), 2);
        assert!(cell.iter().all(|s| s.duration_minutes == lifecycle::MAX_JOB_MINUTES));
        assert_eq!(cell[0].duration_label, "24h");

        let conflicts = schedule::find_conflicts(&week);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].staff_id, alice.id);
    }

    // ===== STAFF TESTS =====

    #[test]
    fn test_create_staff_validation() {
        let conn = setup_test_db();

        let result = staff::create_staff(
            &conn,
            CreateStaff {
                name: "Alice".to_string(),
                email: "not-an-email".to_string(),
                position: StaffPosition::Contractor,
                skills: vec![],
                location: String::new(),
                availability: String::new(),
                avatar: None,
            },
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_archived_staff_leave_grid_but_keep_history() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");
        let done = scheduled_job(&conn, "Acme Corp", &alice);
        jobs::complete_job(&conn, completion(&done.id, 150.0)).unwrap();
        scheduled_job(&conn, "Beta Pty", &alice);

        staff::set_archived(&conn, &alice.id, true).unwrap();

        let active = staff::list_staff(&conn, false).unwrap();
        assert!(active.is_empty());
        assert_eq!(staff::list_staff(&conn, true).unwrap().len(), 1);

        let all_jobs = jobs::list_jobs(&conn).unwrap();
        let everyone = staff::list_staff(&conn, true).unwrap();
        let week = schedule::build_week(&all_jobs, &everyone, ymd(2024, 1, 15), 120);
        assert!(week.rows.is_empty());

        let register = job_records::list_records(&conn).unwrap();
        assert_eq!(register[0].staff, vec!["Alice Smith".to_string()]);

        // Archived staff cannot take new work
        let result = jobs::create_job(
            &conn,
            new_job("Gamma Ltd", "2024-01-17", "09:00", vec![alice.id.clone()]),
        );
        assert!(matches!(result, Err(AppError::Validation(_))));

        let restored = staff::set_archived(&conn, &alice.id, false).unwrap();
        assert!(!restored.archived);
    }

    #[test]
    fn test_job_with_archived_member_stays_editable() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");
        let bob = add_staff(&conn, "Bob Jones", "bob@example.com");
        let job = scheduled_job(&conn, "Acme Corp", &alice);
        staff::set_archived(&conn, &alice.id, true).unwrap();
        staff::set_archived(&conn, &bob.id, true).unwrap();

        let edit = |ids: Vec<String>| UpdateJob {
            id: job.id.clone(),
            client_name: job.client_name.clone(),
            address: job.address.clone(),
            date: Some(job.date.clone()),
            time: Some(job.time.clone()),
            description: job.description.clone(),
            cleaner_ids: ids,
            estimated_duration: None,
            quoted_price: None,
            estimated_value: None,
            notes: Some("Key under the mat".to_string()),
        };

        let edited = jobs::update_job(&conn, edit(vec![alice.id.clone()])).unwrap();
        assert_eq!(edited.notes.as_deref(), Some("Key under the mat"));
        assert_eq!(edited.cleaner_ids, vec![alice.id.clone()]);
        assert_eq!(edited.status, JobStatus::Scheduled);

        // Adding a second archived member is still refused
        let result = jobs::update_job(&conn, edit(vec![alice.id.clone(), bob.id.clone()]));
        assert!(matches!(result, Err(AppError::Validation(_))));

        let other = jobs::create_job(&conn, new_job("Beta Pty", "", "", vec![])).unwrap();
        let result = jobs::assign_job(
            &conn,
            AssignJob {
                job_id: other.id,
                cleaner_ids: vec![bob.id.clone()],
                date: "2024-01-16".to_string(),
                time: "09:00".to_string(),
            },
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_delete_staff_with_active_jobs_refused() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");
        let job = scheduled_job(&conn, "Acme Corp", &alice);

        assert_eq!(staff::active_assignment_count(&conn, &alice.id).unwrap(), 1);
        assert!(matches!(
            staff::delete_staff(&conn, &alice.id),
            Err(AppError::Validation(_))
        ));

        jobs::complete_job(&conn, completion(&job.id, 100.0)).unwrap();
        assert_eq!(staff::active_assignment_count(&conn, &alice.id).unwrap(), 0);
        staff::delete_staff(&conn, &alice.id).unwrap();

        // Register keeps the name after the member is gone
        let register = job_records::list_records(&conn).unwrap();
        assert_eq!(register[0].staff, vec!["Alice Smith".to_string()]);
    }

    #[test]
    fn test_staff_names_keep_unknown_ids() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");

        let names = staff::staff_names(&conn, &[alice.id.clone(), "ghost".to_string()]).unwrap();
        assert_eq!(names, vec!["Alice Smith".to_string(), "ghost".to_string()]);
    }

    // ===== CLIENT TESTS =====

    #[test]
    fn test_client_stats_refresh() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");
        jobs::create_job(
            &conn,
            new_job("Acme Corp", "2099-06-01", "09:00", vec![alice.id.clone()]),
        )
        .unwrap();
        let past = scheduled_job(&conn, "Acme Corp", &alice);
        jobs::complete_job(&conn, completion(&past.id, 220.0)).unwrap();

        // Created after the jobs; picks them up immediately
        let client = clients::create_client(
            &conn,
            CreateClient {
                name: "Acme Corp".to_string(),
                email: Some("accounts@acme.test".to_string()),
                phone: None,
                address: None,
                avatar: None,
            },
        )
        .unwrap();
        assert_eq!(client.upcoming_jobs, 1);
        assert!((client.total_spent - 220.0).abs() < 0.01);

        let history = job_records::records_for_client(&conn, "Acme Corp").unwrap();
        assert_eq!(history.len(), 1);
        assert!(job_records::records_for_client(&conn, "Beta Pty").unwrap().is_empty());
    }

    #[test]
    fn test_refresh_unknown_client_is_noop() {
        let conn = setup_test_db();
        assert_eq!(clients::refresh_client_stats(&conn, "Nobody").unwrap(), 0);
    }

    // ===== CONSUMABLE TESTS =====

    #[test]
    fn test_purchase_validation() {
        let bad = purchase("", ConsumableType::Consumable, 0.0, "2024-13-01");
        let validation = consumables::validate_purchase(&bad);
        assert!(!validation.is_valid);
        assert_eq!(validation.errors.len(), 3);

        let conn = setup_test_db();
        assert!(consumables::create_consumable(&conn, bad).is_err());
        assert!(consumables::list_consumables(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_consumables_grouped_by_month() {
        let conn = setup_test_db();
        consumables::create_consumable(&conn, purchase("Mop", ConsumableType::Consumable, 25.0, "2024-01-05")).unwrap();
        consumables::create_consumable(&conn, purchase("Spray", ConsumableType::Consumable, 12.5, "2024-01-20")).unwrap();
        consumables::create_consumable(&conn, purchase("Vacuum", ConsumableType::PlantEquipment, 450.0, "2024-03-02")).unwrap();

        let months = consumables::group_by_month(consumables::list_consumables(&conn).unwrap());
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, "2024-03");
        assert_eq!(months[1].label, "January 2024");
        assert_eq!(months[1].items.len(), 2);
        assert!((months[1].total - 37.5).abs() < 0.01);
    }

    #[test]
    fn test_eofy_summary_uses_july_to_june() {
        let conn = setup_test_db();
        consumables::create_consumable(&conn, purchase("Before", ConsumableType::Consumable, 10.0, "2023-06-30")).unwrap();
        consumables::create_consumable(&conn, purchase("First day", ConsumableType::Consumable, 20.0, "2023-07-01")).unwrap();
        consumables::create_consumable(&conn, purchase("Printer", ConsumableType::OfficeEquipment, 300.0, "2024-02-14")).unwrap();
        consumables::create_consumable(&conn, purchase("Last day", ConsumableType::PlantEquipment, 500.0, "2024-06-30")).unwrap();
        consumables::create_consumable(&conn, purchase("After", ConsumableType::Consumable, 40.0, "2024-07-01")).unwrap();

        let summary = consumables::eofy_summary(&conn, 2024).unwrap();
        assert_eq!(summary.financial_year, "2023-24");
        assert_eq!(summary.start_date, "2023-07-01");
        assert_eq!(summary.end_date, "2024-06-30");
        assert_eq!(summary.records.len(), 3);
        assert!((summary.total - 820.0).abs() < 0.01);

        let consumable = summary
            .totals_by_type
            .iter()
            .find(|t| t.consumable_type == ConsumableType::Consumable)
            .unwrap();
        assert_eq!(consumable.count, 1);
        assert!((consumable.total - 20.0).abs() < 0.01);
        assert_eq!(summary.totals_by_type.len(), ConsumableType::ALL.len());
    }

    #[test]
    fn test_update_and_delete_consumable() {
        let conn = setup_test_db();
        let item = consumables::create_consumable(&conn, purchase("Mop", ConsumableType::Consumable, 25.0, "2024-01-05")).unwrap();

        let updated = consumables::update_consumable(
            &conn,
            &item.id,
            purchase("Mop head", ConsumableType::Consumable, 30.0, "2024-01-06"),
        )
        .unwrap();
        assert_eq!(updated.name, "Mop head");
        assert!((updated.purchase_amount - 30.0).abs() < 0.01);

        consumables::delete_consumable(&conn, &item.id).unwrap();
        assert!(matches!(
            consumables::get_consumable(&conn, &item.id),
            Err(AppError::NotFound { .. })
        ));
    }

    // ===== FINANCE TESTS =====

    #[test]
    fn test_invoice_mark_paid() {
        let conn = setup_test_db();
        let invoice = finance::create_invoice(
            &conn,
            CreateInvoice {
                number: "INV-001".to_string(),
                client_name: "Acme Corp".to_string(),
                amount: 150.0,
                issue_date: "2024-01-15".to_string(),
                due_date: "2024-01-29".to_string(),
                notes: None,
            },
        )
        .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Pending);

        assert!(finance::mark_invoice_paid(&conn, &invoice.id, "not a date").is_err());

        let paid = finance::mark_invoice_paid(&conn, &invoice.id, "2024-01-20").unwrap();
        assert_eq!(paid.status, InvoiceStatus::Paid);
        assert_eq!(paid.paid_date.as_deref(), Some("2024-01-20"));

        assert!(matches!(
            finance::mark_invoice_paid(&conn, &invoice.id, "2024-01-21"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_invoice_edit_cannot_change_payment() {
        let conn = setup_test_db();
        let invoice = finance::create_invoice(
            &conn,
            CreateInvoice {
                number: "INV-002".to_string(),
                client_name: "Acme Corp".to_string(),
                amount: 150.0,
                issue_date: "2024-01-15".to_string(),
                due_date: "2024-01-29".to_string(),
                notes: None,
            },
        )
        .unwrap();

        // Paid without a payment date
        let mut edit = invoice.clone();
        edit.status = InvoiceStatus::Paid;
        assert!(matches!(
            finance::update_invoice(&conn, edit),
            Err(AppError::Validation(_))
        ));
        let stored = finance::get_invoice(&conn, &invoice.id).unwrap();
        assert_eq!(stored.status, InvoiceStatus::Pending);
        assert_eq!(stored.paid_date, None);

        let mut edit = invoice.clone();
        edit.status = InvoiceStatus::Overdue;
        let overdue = finance::update_invoice(&conn, edit).unwrap();
        assert_eq!(overdue.status, InvoiceStatus::Overdue);

        let paid = finance::mark_invoice_paid(&conn, &invoice.id, "2024-02-02").unwrap();

        let mut edit = paid.clone();
        edit.status = InvoiceStatus::Pending;
        assert!(matches!(
            finance::update_invoice(&conn, edit),
            Err(AppError::Validation(_))
        ));

        let mut edit = paid.clone();
        edit.notes = Some("Paid by transfer".to_string());
        edit.paid_date = None;
        let noted = finance::update_invoice(&conn, edit).unwrap();
        assert_eq!(noted.status, InvoiceStatus::Paid);
        assert_eq!(noted.paid_date.as_deref(), Some("2024-02-02"));
        assert_eq!(noted.notes.as_deref(), Some("Paid by transfer"));
    }

    #[test]
    fn test_invoice_number_unique() {
        let conn = setup_test_db();
        let make = || CreateInvoice {
            number: "INV-001".to_string(),
            client_name: "Acme Corp".to_string(),
            amount: 99.0,
            issue_date: "2024-01-15".to_string(),
            due_date: "2024-01-29".to_string(),
            notes: None,
        };

        finance::create_invoice(&conn, make()).unwrap();
        assert!(matches!(
            finance::create_invoice(&conn, make()),
            Err(AppError::Database(_))
        ));
    }

    #[test]
    fn test_bill_mark_paid() {
        let conn = setup_test_db();
        let bill = finance::create_bill(
            &conn,
            CreateBill {
                supplier: "Cleaning Supplies Co".to_string(),
                description: "Chemicals".to_string(),
                amount: 320.0,
                due_date: "2024-02-01".to_string(),
            },
        )
        .unwrap();
        assert_eq!(bill.status, BillStatus::Unpaid);

        let paid = finance::mark_bill_paid(&conn, &bill.id, "2024-01-31").unwrap();
        assert_eq!(paid.status, BillStatus::Paid);
        assert!(finance::mark_bill_paid(&conn, &bill.id, "2024-02-01").is_err());
    }

    #[test]
    fn test_bill_edit_cannot_change_payment() {
        let conn = setup_test_db();
        let bill = finance::create_bill(
            &conn,
            CreateBill {
                supplier: "Cleaning Supplies Co".to_string(),
                description: "Chemicals".to_string(),
                amount: 320.0,
                due_date: "2024-02-01".to_string(),
            },
        )
        .unwrap();

        let mut edit = bill.clone();
        edit.status = BillStatus::Paid;
        assert!(matches!(
            finance::update_bill(&conn, edit),
            Err(AppError::Validation(_))
        ));
        assert_eq!(finance::get_bill(&conn, &bill.id).unwrap().status, BillStatus::Unpaid);

        let paid = finance::mark_bill_paid(&conn, &bill.id, "2024-01-31").unwrap();

        let mut edit = paid.clone();
        edit.status = BillStatus::Unpaid;
        assert!(matches!(
            finance::update_bill(&conn, edit),
            Err(AppError::Validation(_))
        ));

        let mut edit = paid.clone();
        edit.description = "Chemicals and cloths".to_string();
        edit.paid_date = None;
        let updated = finance::update_bill(&conn, edit).unwrap();
        assert_eq!(updated.status, BillStatus::Paid);
        assert_eq!(updated.paid_date.as_deref(), Some("2024-01-31"));
        assert_eq!(updated.description, "Chemicals and cloths");
    }

    #[test]
    fn test_quotes() {
        let conn = setup_test_db();
        let zero = finance::create_quote(
            &conn,
            CreateQuote {
                client_name: "Acme Corp".to_string(),
                description: "Carpet steam".to_string(),
                amount: 0.0,
                date: "2024-01-10".to_string(),
                valid_until: None,
            },
        );
        assert!(matches!(zero, Err(AppError::Validation(_))));

        let mut quote = finance::create_quote(
            &conn,
            CreateQuote {
                client_name: "Acme Corp".to_string(),
                description: "Carpet steam".to_string(),
                amount: 480.0,
                date: "2024-01-10".to_string(),
                valid_until: Some("2024-02-10".to_string()),
            },
        )
        .unwrap();
        assert_eq!(quote.status, QuoteStatus::Draft);

        quote.status = QuoteStatus::Accepted;
        let accepted = finance::update_quote(&conn, quote).unwrap();
        assert_eq!(accepted.status, QuoteStatus::Accepted);

        finance::delete_quote(&conn, &accepted.id).unwrap();
        assert!(finance::list_quotes(&conn).unwrap().is_empty());
    }

    // ===== SETTINGS TESTS =====

    #[test]
    fn test_settings_upsert() {
        let conn = setup_test_db();
        assert_eq!(settings::get_setting(&conn, settings::COMPANY_NAME).unwrap(), None);

        settings::set_setting(&conn, settings::COMPANY_NAME, "Sparkle Cleaning").unwrap();
        settings::set_setting(&conn, settings::COMPANY_NAME, "Sparkle Cleaning Co").unwrap();
        settings::set_setting(&conn, settings::ABN, "12 345 678 901").unwrap();

        assert_eq!(
            settings::get_setting(&conn, settings::COMPANY_NAME).unwrap().as_deref(),
            Some("Sparkle Cleaning Co")
        );
        assert_eq!(settings::list_settings(&conn).unwrap().len(), 2);
    }

    #[test]
    fn test_default_job_minutes() {
        let conn = setup_test_db();
        let config = AppConfig::default();

        assert_eq!(settings::default_job_minutes(&conn, &config).unwrap(), config.default_job_minutes);

        settings::set_setting(&conn, settings::DEFAULT_JOB_MINUTES, "junk").unwrap();
        assert_eq!(settings::default_job_minutes(&conn, &config).unwrap(), config.default_job_minutes);

        settings::set_setting(&conn, settings::DEFAULT_JOB_MINUTES, "90").unwrap();
        assert_eq!(settings::default_job_minutes(&conn, &config).unwrap(), 90);
    }

    // ===== ACCESS TESTS =====

    #[test]
    fn test_resolve_role() {
        let config = AppConfig {
            admin_emails: vec!["Owner@Example.com".to_string()],
            ..AppConfig::default()
        };

        assert_eq!(access::resolve_role(&config, "owner@example.com", None), Role::Admin);
        assert_eq!(
            access::resolve_role(&config, "owner@example.com", Some(Role::Customer)),
            Role::Admin
        );
        assert_eq!(
            access::resolve_role(&config, "alice@example.com", Some(Role::Staff)),
            Role::Staff
        );
        assert_eq!(access::resolve_role(&config, "someone@else.com", None), Role::Customer);
    }

    // ===== RECEIPT TESTS =====

    #[test]
    fn test_receipt_storage() {
        let dir = tempfile::tempdir().unwrap();

        let path = receipts::save_receipt(dir.path(), "jane@example.com", ".PNG", b"fake image").unwrap();
        assert!(path.starts_with("jane_example_com/"));
        assert!(path.ends_with(".png"));
        assert_eq!(receipts::load_receipt(dir.path(), &path).unwrap(), b"fake image");

        receipts::delete_receipt(dir.path(), &path).unwrap();
        assert!(matches!(
            receipts::load_receipt(dir.path(), &path),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn test_receipt_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();

        assert!(receipts::save_receipt(dir.path(), "jane", "exe", b"data").is_err());
        assert!(receipts::save_receipt(dir.path(), "jane", "jpg", b"").is_err());
        assert!(matches!(
            receipts::load_receipt(dir.path(), "../secrets.png"),
            Err(AppError::Validation(_))
        ));
        assert!(receipts::load_receipt(dir.path(), "/etc/passwd").is_err());
    }

    // ===== ADMIN TESTS =====

    #[test]
    fn test_dedupe_staff_rewrites_jobs() {
        let conn = setup_test_db();
        let original = add_staff(&conn, "Alice Smith", "alice@example.com");
        let duplicate = add_staff(&conn, "Alice S", "Alice@Example.com");
        let bob = add_staff(&conn, "Bob Jones", "bob@example.com");

        conn.execute(
            "UPDATE staff SET created_at = '2023-01-01T00:00:00+00:00' WHERE id = ?1",
            [&original.id],
        )
        .unwrap();
        conn.execute(
            "UPDATE staff SET created_at = '2023-06-01T00:00:00+00:00' WHERE id = ?1",
            [&duplicate.id],
        )
        .unwrap();

        let both = jobs::create_job(
            &conn,
            new_job("Acme Corp", "2024-01-15", "09:00", vec![duplicate.id.clone(), original.id.clone()]),
        )
        .unwrap();
        let shared = jobs::create_job(
            &conn,
            new_job("Beta Pty", "2024-01-16", "09:00", vec![duplicate.id.clone(), bob.id.clone()]),
        )
        .unwrap();
        jobs::create_job(&conn, new_job("Gamma Ltd", "2024-01-17", "09:00", vec![bob.id.clone()])).unwrap();

        let report = admin::dedupe_staff(&conn, "alice@example.com").unwrap();
        assert_eq!(report.kept.id, original.id);
        assert_eq!(report.removed, vec![duplicate.id.clone()]);
        assert_eq!(report.jobs_updated, 2);

        assert_eq!(jobs::get_job(&conn, &both.id).unwrap().cleaner_ids, vec![original.id.clone()]);
        assert_eq!(
            jobs::get_job(&conn, &shared.id).unwrap().cleaner_ids,
            vec![original.id.clone(), bob.id.clone()]
        );
        assert!(staff::get_staff(&conn, &duplicate.id).is_err());

        // Running again is a no-op
        let again = admin::dedupe_staff(&conn, "alice@example.com").unwrap();
        assert!(again.removed.is_empty());
    }

    #[test]
    fn test_ensure_staff() {
        let conn = setup_test_db();
        let existing = add_staff(&conn, "Alice Smith", "alice@example.com");

        let make = |email: &str| CreateStaff {
            name: "Someone".to_string(),
            email: email.to_string(),
            position: StaffPosition::OwnerManager,
            skills: vec![],
            location: String::new(),
            availability: String::new(),
            avatar: None,
        };

        let (found, created) = admin::ensure_staff(&conn, make("alice@example.com")).unwrap();
        assert!(!created);
        assert_eq!(found.id, existing.id);

        let (added, created) = admin::ensure_staff(&conn, make("owner@example.com")).unwrap();
        assert!(created);
        assert_eq!(added.position, StaffPosition::OwnerManager);
    }

    // ===== MIGRATION TESTS =====

    #[test]
    fn test_initialize_adds_missing_columns() {
        let db = Database::open_in_memory().unwrap();
        {
            let conn = db.lock().unwrap();
            conn.execute_batch(
                "
                CREATE TABLE staff (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL,
                    position TEXT NOT NULL DEFAULT 'Staff',
                    skills TEXT NOT NULL DEFAULT '[]',
                    location TEXT NOT NULL DEFAULT '',
                    availability TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL
                );
                INSERT INTO staff (id, name, email, created_at)
                VALUES ('s1', 'Legacy', 'legacy@example.com', '2022-01-01T00:00:00+00:00');
                ",
            )
            .unwrap();
        }

        db.initialize().unwrap();
        // Running twice is harmless
        db.initialize().unwrap();

        let conn = db.lock().unwrap();
        let member = staff::get_staff(&conn, "s1").unwrap();
        assert!(!member.archived);
        assert_eq!(member.avatar, None);
        assert_eq!(member.position, StaffPosition::Staff);
    }

    // ===== AI TESTS =====

    struct StubBackend {
        reply: String,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl StubBackend {
        fn new(reply: &str) -> Self {
            StubBackend {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl CompletionBackend for StubBackend {
        async fn complete(&self, messages: &[ChatMessage]) -> crate::Result<String> {
            self.seen.lock().unwrap().push(messages.to_vec());
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn test_parse_recommendation_tolerates_wrapping() {
        let text = "Here you go:\n```json\n{\"optimalCleaner\": \"s1\", \"reasoning\": \"Lives nearby\", \"potentialConflicts\": \"\"}\n```";
        let rec = allocation::parse_recommendation(text).unwrap();
        assert_eq!(rec.optimal_cleaner, "s1");
        assert_eq!(rec.reasoning, "Lives nearby");
        assert_eq!(rec.potential_conflicts, None);

        assert!(matches!(
            allocation::parse_recommendation("I can't decide"),
            Err(AppError::Completion(_))
        ));
        assert!(allocation::parse_recommendation("{\"optimalCleaner\": \"\", \"reasoning\": \"x\"}").is_err());
    }

    #[test]
    fn test_allocation_prompt_contains_roster() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");

        let messages = allocation::build_prompt("Office clean, Parramatta", &[alice.clone()]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[1].content.contains(&alice.id));
        assert!(messages[1].content.contains("Parramatta"));
    }

    #[tokio::test]
    async fn test_suggest_allocation_skips_archived_staff() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");
        let bob = add_staff(&conn, "Bob Jones", "bob@example.com");
        let bob = staff::set_archived(&conn, &bob.id, true).unwrap();
        let roster = vec![alice.clone(), bob];

        let backend = StubBackend::new(&format!(
            "{{\"optimalCleaner\": \"{}\", \"reasoning\": \"Has office experience\"}}",
            alice.id
        ));
        let rec = allocation::suggest_allocation(&backend, "Office clean", &roster)
            .await
            .unwrap();

        assert_eq!(rec.resolve(&roster).map(|s| s.name.as_str()), Some("Alice Smith"));

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(!seen[0][1].content.contains("Bob Jones"));
    }

    #[tokio::test]
    async fn test_suggest_allocation_unknown_cleaner_is_relayed() {
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");
        let roster = vec![alice];

        let backend = StubBackend::new("{\"optimalCleaner\": \"someone-else\", \"reasoning\": \"?\"}");
        let rec = allocation::suggest_allocation(&backend, "Office clean", &roster)
            .await
            .unwrap();

        assert_eq!(rec.optimal_cleaner, "someone-else");
        assert!(rec.resolve(&roster).is_none());
    }

    #[tokio::test]
    async fn test_suggest_allocation_requires_input() {
        let backend = StubBackend::new("{}");
        let conn = setup_test_db();
        let alice = add_staff(&conn, "Alice Smith", "alice@example.com");

        assert!(matches!(
            allocation::suggest_allocation(&backend, "   ", &[alice]).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            allocation::suggest_allocation(&backend, "Office clean", &[]).await,
            Err(AppError::Validation(_))
        ));
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_chat_history_is_trimmed() {
        let assistant = ChatAssistant::new("Sparkle Cleaning");
        let mut history = vec![ChatMessage::system("old system prompt")];
        for i in 0..30 {
            history.push(ChatMessage::user(format!("question {i}")));
            history.push(ChatMessage::assistant(format!("answer {i}")));
        }

        let messages = assistant.build_messages(&history, "  How many jobs this week?  ");
        assert_eq!(messages.len(), MAX_HISTORY + 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[0].content.contains("Sparkle Cleaning"));
        assert!(messages[1..].iter().all(|m| m.role != ChatRole::System));
        assert_eq!(messages[MAX_HISTORY].content, "answer 29");
        assert_eq!(messages.last().unwrap().content, "How many jobs this week?");
    }

    #[tokio::test]
    async fn test_chat_reply() {
        let assistant = ChatAssistant::new("Sparkle Cleaning");
        let backend = StubBackend::new("You have 3 jobs.");

        let reply = assistant.reply(&backend, &[], "Jobs this week?").await.unwrap();
        assert_eq!(reply, "You have 3 jobs.");

        assert!(assistant.reply(&backend, &[], " ").await.is_err());
        assert_eq!(backend.seen.lock().unwrap().len(), 1);
    }
}
