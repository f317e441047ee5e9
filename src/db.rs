use std::path::Path;

use anyhow::Context;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::adapters::{
    start_of_day, AttendanceMark, ChapterProgress, Domain, FeeInvoice, TestSubmission,
    TimetableSlot,
};
use crate::config::Settings;
use crate::period::DateRange;
use crate::source;

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// A source row kept in its own table under the `school_analytics` schema.
///
/// `FETCH_SQL` binds the first and last day of the range as `$1` and `$2`.
/// `INSERT_SQL` binds a fresh id as `$1`, the source key as `$2` and the
/// row's own columns after that.
pub trait Stored: serde::de::DeserializeOwned + for<'r> FromRow<'r, PgRow> + Send + Unpin {
    const TABLE: &'static str;
    const FETCH_SQL: &'static str;
    const INSERT_SQL: &'static str;

    fn source_key(&self) -> Option<&str>;

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q>;
}

impl Stored for AttendanceMark {
    const TABLE: &'static str = "attendance_marks";
    const FETCH_SQL: &'static str = r#"
        SELECT source_key, class_id, class_name, student_id, marked_on, status
        FROM school_analytics.attendance_marks
        WHERE marked_on BETWEEN $1 AND $2
        "#;
    const INSERT_SQL: &'static str = r#"
        INSERT INTO school_analytics.attendance_marks
        (id, source_key, class_id, class_name, student_id, marked_on, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (source_key) DO NOTHING
        "#;

    fn source_key(&self) -> Option<&str> {
        self.source_key.as_deref()
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(&self.class_id)
            .bind(&self.class_name)
            .bind(&self.student_id)
            .bind(self.marked_on)
            .bind(&self.status)
    }
}

impl Stored for FeeInvoice {
    const TABLE: &'static str = "fee_invoices";
    const FETCH_SQL: &'static str = r#"
        SELECT source_key, class_id, class_name, student_id,
               amount_due_minor, amount_paid_minor, updated_at
        FROM school_analytics.fee_invoices
        WHERE updated_at::date BETWEEN $1 AND $2
        "#;
    const INSERT_SQL: &'static str = r#"
        INSERT INTO school_analytics.fee_invoices
        (id, source_key, class_id, class_name, student_id,
         amount_due_minor, amount_paid_minor, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (source_key) DO NOTHING
        "#;

    fn source_key(&self) -> Option<&str> {
        self.source_key.as_deref()
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(&self.class_id)
            .bind(&self.class_name)
            .bind(&self.student_id)
            .bind(self.amount_due_minor)
            .bind(self.amount_paid_minor)
            .bind(self.updated_at)
    }
}

impl Stored for TestSubmission {
    const TABLE: &'static str = "test_submissions";
    const FETCH_SQL: &'static str = r#"
        SELECT source_key, class_id, class_name, subject_id, subject_name,
               student_id, submitted, held_on
        FROM school_analytics.test_submissions
        WHERE held_on BETWEEN $1 AND $2
        "#;
    const INSERT_SQL: &'static str = r#"
        INSERT INTO school_analytics.test_submissions
        (id, source_key, class_id, class_name, subject_id, subject_name,
         student_id, submitted, held_on)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (source_key) DO NOTHING
        "#;

    fn source_key(&self) -> Option<&str> {
        self.source_key.as_deref()
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(&self.class_id)
            .bind(&self.class_name)
            .bind(&self.subject_id)
            .bind(&self.subject_name)
            .bind(&self.student_id)
            .bind(self.submitted)
            .bind(self.held_on)
    }
}

impl Stored for ChapterProgress {
    const TABLE: &'static str = "syllabus_chapters";
    const FETCH_SQL: &'static str = r#"
        SELECT source_key, subject_id, subject_name, chapter, completed, updated_at
        FROM school_analytics.syllabus_chapters
        WHERE updated_at::date BETWEEN $1 AND $2
        "#;
    const INSERT_SQL: &'static str = r#"
        INSERT INTO school_analytics.syllabus_chapters
        (id, source_key, subject_id, subject_name, chapter, completed, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (source_key) DO NOTHING
        "#;

    fn source_key(&self) -> Option<&str> {
        self.source_key.as_deref()
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(&self.subject_id)
            .bind(&self.subject_name)
            .bind(&self.chapter)
            .bind(self.completed)
            .bind(self.updated_at)
    }
}

impl Stored for TimetableSlot {
    const TABLE: &'static str = "timetable_slots";
    const FETCH_SQL: &'static str = r#"
        SELECT source_key, teacher_id, teacher_name, slot_date, covered
        FROM school_analytics.timetable_slots
        WHERE slot_date BETWEEN $1 AND $2
        "#;
    const INSERT_SQL: &'static str = r#"
        INSERT INTO school_analytics.timetable_slots
        (id, source_key, teacher_id, teacher_name, slot_date, covered)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (source_key) DO NOTHING
        "#;

    fn source_key(&self) -> Option<&str> {
        self.source_key.as_deref()
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(&self.teacher_id)
            .bind(&self.teacher_name)
            .bind(self.slot_date)
            .bind(self.covered)
    }
}

pub async fn connect(settings: &Settings) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(settings.database_url()?)
        .await
        .context("failed to connect to Postgres")?;
    Ok(pool)
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn fetch_sources<S: Stored>(pool: &PgPool, range: DateRange) -> anyhow::Result<Vec<S>> {
    let rows = sqlx::query_as::<_, S>(S::FETCH_SQL)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(pool)
        .await
        .with_context(|| format!("failed to fetch {} for {range}", S::TABLE))?;

    tracing::info!(table = S::TABLE, %range, rows = rows.len(), "fetched source rows");
    Ok(rows)
}

/// Inserts rows, skipping any whose source key is already stored. Returns
/// how many were new.
pub async fn insert_rows<S: Stored>(pool: &PgPool, rows: &[S]) -> anyhow::Result<usize> {
    let mut inserted = 0usize;

    for row in rows {
        let source_key = row
            .source_key()
            .map(str::to_string)
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let query = sqlx::query(S::INSERT_SQL)
            .bind(Uuid::new_v4())
            .bind(&source_key);
        let result = row
            .bind_columns(query)
            .execute(pool)
            .await
            .with_context(|| format!("failed to insert into {}", S::TABLE))?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    tracing::info!(table = S::TABLE, rows = rows.len(), inserted, "stored source rows");
    Ok(inserted)
}

pub async fn import_csv(pool: &PgPool, domain: Domain, csv_path: &Path) -> anyhow::Result<usize> {
    match domain {
        Domain::Attendance => import_file::<AttendanceMark>(pool, csv_path).await,
        Domain::Fees => import_file::<FeeInvoice>(pool, csv_path).await,
        Domain::Academics => import_file::<TestSubmission>(pool, csv_path).await,
        Domain::Syllabus => import_file::<ChapterProgress>(pool, csv_path).await,
        Domain::Operations => import_file::<TimetableSlot>(pool, csv_path).await,
    }
}

async fn import_file<S: Stored>(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    let rows: Vec<S> = source::read_csv_file(csv_path)?;
    insert_rows(pool, &rows).await
}

const SEED_CLASSES: [(&str, &str); 4] = [
    ("7A", "Grade 7A"),
    ("7B", "Grade 7B"),
    ("8A", "Grade 8A"),
    ("8B", "Grade 8B"),
];

const SEED_SUBJECTS: [(&str, &str); 3] = [
    ("math", "Mathematics"),
    ("sci", "Science"),
    ("eng", "English"),
];

const SEED_TEACHERS: [(&str, &str); 3] = [
    ("t-otieno", "Mr. Otieno"),
    ("t-wanjiru", "Ms. Wanjiru"),
    ("t-achieng", "Mrs. Achieng"),
];

const SEED_STUDENTS_PER_CLASS: usize = 6;
const SEED_DAYS: i64 = 180;
const SEED_TERM_FEE_MINOR: i64 = 150_000;

fn school_days(reference_date: NaiveDate) -> Vec<NaiveDate> {
    (0..SEED_DAYS)
        .rev()
        .map(|offset| reference_date - Duration::days(offset))
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

/// Seed data ending at `reference_date`. Keys are derived from the data
/// itself, so seeding twice for the same date inserts nothing new.
pub fn seed_rows(reference_date: NaiveDate) -> SeedRows {
    let days = school_days(reference_date);
    let mut seed = SeedRows::default();

    for (class_index, (class_id, class_name)) in SEED_CLASSES.iter().enumerate() {
        for student in 0..SEED_STUDENTS_PER_CLASS {
            let student_id = format!("{class_id}-s{student:02}");

            for (day_index, day) in days.iter().enumerate() {
                // Later classes drift upward over the term so trends show up.
                let roll = (day_index * 7 + student * 3 + class_index * 5) % 20;
                let cutoff = 14 + (class_index * day_index / days.len().max(1)).min(4);
                let status = if roll < cutoff {
                    "present"
                } else if roll < cutoff + 2 {
                    "late"
                } else if roll % 2 == 0 {
                    "excused"
                } else {
                    "absent"
                };
                seed.attendance.push(AttendanceMark {
                    source_key: Some(format!("seed-att-{student_id}-{day}")),
                    class_id: class_id.to_string(),
                    class_name: class_name.to_string(),
                    student_id: student_id.clone(),
                    marked_on: *day,
                    status: status.to_string(),
                });
            }

            for (cycle, day) in days.iter().filter(|day| day.day() <= 3).enumerate() {
                let paid_share = ((student + cycle + class_index) % 5) as i64;
                seed.fees.push(FeeInvoice {
                    source_key: Some(format!("seed-fee-{student_id}-{day}")),
                    class_id: class_id.to_string(),
                    class_name: class_name.to_string(),
                    student_id: student_id.clone(),
                    amount_due_minor: SEED_TERM_FEE_MINOR,
                    amount_paid_minor: SEED_TERM_FEE_MINOR * paid_share / 4,
                    updated_at: start_of_day(*day) + Duration::hours(10),
                });
            }

            for (week, day) in days.iter().filter(|day| day.weekday() == Weekday::Fri).enumerate() {
                for (subject_index, (subject_id, subject_name)) in SEED_SUBJECTS.iter().enumerate() {
                    seed.academics.push(TestSubmission {
                        source_key: Some(format!("seed-test-{student_id}-{subject_id}-{day}")),
                        class_id: class_id.to_string(),
                        class_name: class_name.to_string(),
                        subject_id: subject_id.to_string(),
                        subject_name: subject_name.to_string(),
                        student_id: student_id.clone(),
                        submitted: (student + week + subject_index) % 6 != 0,
                        held_on: *day,
                    });
                }
            }
        }
    }

    for (subject_index, (subject_id, subject_name)) in SEED_SUBJECTS.iter().enumerate() {
        for chapter in 0..24i64 {
            let updated_on = reference_date - Duration::days(SEED_DAYS - 1 - chapter * 7);
            seed.syllabus.push(ChapterProgress {
                source_key: Some(format!("seed-ch-{subject_id}-{chapter:02}")),
                subject_id: subject_id.to_string(),
                subject_name: subject_name.to_string(),
                chapter: format!("Chapter {}", chapter + 1),
                completed: (chapter as usize + subject_index) % 4 != 3,
                updated_at: start_of_day(updated_on) + Duration::hours(15),
            });
        }
    }

    for (teacher_index, (teacher_id, teacher_name)) in SEED_TEACHERS.iter().enumerate() {
        for (day_index, day) in days.iter().enumerate() {
            for slot in 0..4 {
                seed.operations.push(TimetableSlot {
                    source_key: Some(format!("seed-slot-{teacher_id}-{day}-{slot}")),
                    teacher_id: teacher_id.to_string(),
                    teacher_name: teacher_name.to_string(),
                    slot_date: *day,
                    covered: (day_index + slot + teacher_index * 2) % 9 != 0,
                });
            }
        }
    }

    seed
}

#[derive(Debug, Default)]
pub struct SeedRows {
    pub attendance: Vec<AttendanceMark>,
    pub fees: Vec<FeeInvoice>,
    pub academics: Vec<TestSubmission>,
    pub syllabus: Vec<ChapterProgress>,
    pub operations: Vec<TimetableSlot>,
}

pub async fn seed(pool: &PgPool, reference_date: NaiveDate) -> anyhow::Result<usize> {
    let rows = seed_rows(reference_date);
    let mut inserted = 0usize;

    inserted += insert_rows(pool, &rows.attendance).await?;
    inserted += insert_rows(pool, &rows.fees).await?;
    inserted += insert_rows(pool, &rows.academics).await?;
    inserted += insert_rows(pool, &rows.syllabus).await?;
    inserted += insert_rows(pool, &rows.operations).await?;

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
    }

    #[test]
    fn seed_skips_weekends() {
        let rows = seed_rows(reference());
        assert!(!rows.attendance.is_empty());
        assert!(rows
            .attendance
            .iter()
            .all(|mark| !matches!(mark.marked_on.weekday(), Weekday::Sat | Weekday::Sun)));
    }

    #[test]
    fn seed_keys_are_unique_and_stable() {
        let first = seed_rows(reference());
        let second = seed_rows(reference());

        let keys: HashSet<&str> = first
            .attendance
            .iter()
            .filter_map(|mark| mark.source_key.as_deref())
            .collect();
        assert_eq!(keys.len(), first.attendance.len());
        assert_eq!(first.attendance, second.attendance);
        assert_eq!(first.operations, second.operations);
    }

    #[test]
    fn seed_fees_never_exceed_amount_due() {
        let rows = seed_rows(reference());
        assert!(!rows.fees.is_empty());
        assert!(rows
            .fees
            .iter()
            .all(|fee| fee.amount_paid_minor <= fee.amount_due_minor));
    }

    #[test]
    fn seed_stays_inside_seeded_span() {
        let rows = seed_rows(reference());
        let earliest = reference() - Duration::days(SEED_DAYS - 1);
        assert!(rows
            .syllabus
            .iter()
            .all(|c| c.updated_at.date() >= earliest && c.updated_at.date() <= reference()));
    }
}
