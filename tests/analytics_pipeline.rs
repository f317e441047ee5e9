use chrono::NaiveDate;

use school_analytics::adapters::{
    AcademicsAdapter, AttendanceAdapter, AttendanceMark, ChapterProgress, Domain, FeeInvoice,
    FeesAdapter, OperationsAdapter, SyllabusAdapter, TestSubmission, TimetableSlot,
};
use school_analytics::aggregate::aggregate;
use school_analytics::models::{FactRow, GroupKey, TrendDirection};
use school_analytics::period::{resolve_period, resolve_period_str, Period};
use school_analytics::pipeline::{analyze, AnalysisRequest};
use school_analytics::source::read_csv;
use school_analytics::trend::{rank_with_trend, Metric, SortOrder, TrendThresholds};
use school_analytics::AnalyticsError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn request() -> AnalysisRequest {
    AnalysisRequest::new(Period::Daily, date(2025, 1, 31)).unwrap()
}

#[test]
fn daily_period_resolves_to_trailing_week() {
    let window = resolve_period(Period::Daily, date(2025, 1, 31)).unwrap();
    assert_eq!(window.current().start, date(2025, 1, 25));
    assert_eq!(window.current().end, date(2025, 1, 31));
    assert_eq!(window.previous().start, date(2025, 1, 18));
    assert_eq!(window.previous().end, date(2025, 1, 24));
}

#[test]
fn unknown_period_symbol_is_rejected() {
    assert_eq!(
        resolve_period_str("fortnightly", date(2025, 1, 31)),
        Err(AnalyticsError::InvalidPeriod("fortnightly".to_string()))
    );
}

#[test]
fn aggregate_and_rank_match_worked_examples() {
    let in_window = date(2025, 1, 28).and_hms_opt(9, 0, 0).unwrap();
    let earlier = date(2025, 1, 20).and_hms_opt(9, 0, 0).unwrap();
    let fact = |key: &str, numerator: f64, timestamp| FactRow {
        group_key: GroupKey::subject(key),
        group_label: key.to_string(),
        numerator,
        denominator: 1.0,
        timestamp,
    };

    let rows = vec![
        fact("A", 1.0, in_window),
        fact("A", 0.0, in_window),
        fact("B", 1.0, in_window),
    ];
    let current = aggregate(&rows, date(2025, 1, 25), date(2025, 1, 31));
    assert_eq!(current[0].numerator, 1.0);
    assert_eq!(current[0].denominator, 2.0);
    assert_eq!(current[0].percentage, 50.0);
    assert_eq!(current[1].percentage, 100.0);

    let previous_rows: Vec<FactRow> = (0..10)
        .map(|i| fact("A", if i < 4 { 1.0 } else { 0.0 }, earlier))
        .collect();
    let previous = aggregate(&previous_rows, date(2025, 1, 18), date(2025, 1, 24));
    assert_eq!(previous[0].percentage, 40.0);

    let ranked = rank_with_trend(
        &current,
        &previous,
        |row| Metric::Percentage.value(row),
        SortOrder::Asc,
        &TrendThresholds::default(),
    );
    assert_eq!(ranked[0].row.group_label, "A");
    assert_eq!(ranked[0].rank, 1);
    assert_eq!(ranked[0].trend_delta, Some(10.0));
    assert_eq!(ranked[0].trend_direction, TrendDirection::Improving);
    assert_eq!(ranked[1].trend_direction, TrendDirection::Unknown);
}

#[test]
fn attendance_csv_ranks_classes() {
    let text = "\
class_id,class_name,student_id,marked_on,status
7A,Grade 7A,s-1,2025-01-21,present
7A,Grade 7A,s-2,2025-01-21,present
7A,Grade 7A,s-1,2025-01-28,present
7A,Grade 7A,s-2,2025-01-28,absent
7B,Grade 7B,s-3,2025-01-22,absent
7B,Grade 7B,s-4,2025-01-22,present
7B,Grade 7B,s-3,2025-01-29,late
7B,Grade 7B,s-4,2025-01-29,present
7B,Grade 7B,s-4,2025-02-01,absent
";
    let marks: Vec<AttendanceMark> = read_csv(text.as_bytes()).unwrap();
    let analysis = analyze::<AttendanceAdapter>(&marks, &request());

    assert_eq!(analysis.domain, Domain::Attendance);
    let labels: Vec<&str> = analysis
        .ranked
        .iter()
        .map(|row| row.row.group_label.as_str())
        .collect();
    assert_eq!(labels, vec!["Grade 7B", "Grade 7A"]);
    assert_eq!(analysis.ranked[0].row.denominator, 2.0);
    assert_eq!(analysis.ranked[0].trend_direction, TrendDirection::Improving);
    assert_eq!(analysis.ranked[1].trend_direction, TrendDirection::Declining);
}

#[test]
fn fees_csv_weights_by_amount() {
    let text = "\
class_id,class_name,student_id,amount_due_minor,amount_paid_minor,updated_at
8A,Grade 8A,s-1,100000,100000,2025-01-26T09:00:00
8A,Grade 8A,s-2,300000,0,2025-01-27T09:00:00
8B,Grade 8B,s-3,50000,25000,2025-01-27T11:00:00
";
    let invoices: Vec<FeeInvoice> = read_csv(text.as_bytes()).unwrap();
    let analysis = analyze::<FeesAdapter>(&invoices, &request());

    assert_eq!(analysis.ranked[0].row.group_key, GroupKey::class("8B"));
    assert_eq!(analysis.ranked[0].row.percentage, 50.0);
    assert_eq!(analysis.ranked[1].row.percentage, 25.0);
    let summary = analysis.current_summary.unwrap();
    assert_eq!(summary.numerator, 125_000.0);
    assert_eq!(summary.denominator, 450_000.0);
}

#[test]
fn academics_csv_groups_by_class_and_subject() {
    let text = "\
class_id,class_name,subject_id,subject_name,student_id,submitted,held_on
7A,Grade 7A,math,Mathematics,s-1,true,2025-01-31
7A,Grade 7A,math,Mathematics,s-2,false,2025-01-31
7A,Grade 7A,sci,Science,s-1,true,2025-01-30
";
    let submissions: Vec<TestSubmission> = read_csv(text.as_bytes()).unwrap();
    let analysis = analyze::<AcademicsAdapter>(&submissions, &request());

    assert_eq!(analysis.ranked.len(), 2);
    assert_eq!(
        analysis.ranked[0].row.group_key,
        GroupKey::class_subject("7A", "sci")
    );
    assert_eq!(analysis.ranked[1].row.percentage, 50.0);
}

#[test]
fn syllabus_csv_tracks_latest_update() {
    let text = "\
subject_id,subject_name,chapter,completed,updated_at
eng,English,Poetry,true,2025-01-26T08:00:00
eng,English,Drama,false,2025-01-30T16:45:00
eng,English,Prose,true,2025-01-22T08:00:00
";
    let chapters: Vec<ChapterProgress> = read_csv(text.as_bytes()).unwrap();
    let analysis = analyze::<SyllabusAdapter>(&chapters, &request());

    let row = &analysis.ranked[0];
    assert_eq!(row.row.percentage, 50.0);
    assert_eq!(row.previous_percentage, Some(100.0));
    assert_eq!(
        row.row.last_updated,
        date(2025, 1, 30).and_hms_opt(16, 45, 0).unwrap()
    );
}

#[test]
fn operations_csv_ties_break_by_teacher_name() {
    let text = "\
teacher_id,teacher_name,slot_date,covered
t-2,ms. wanjiru,2025-01-27,true
t-1,Mr. Otieno,2025-01-27,true
t-3,Mrs. Achieng,2025-01-27,false
";
    let slots: Vec<TimetableSlot> = read_csv(text.as_bytes()).unwrap();
    let analysis = analyze::<OperationsAdapter>(&slots, &request());

    let labels: Vec<&str> = analysis
        .ranked
        .iter()
        .map(|row| row.row.group_label.as_str())
        .collect();
    assert_eq!(labels, vec!["Mr. Otieno", "ms. wanjiru", "Mrs. Achieng"]);
    assert!(analysis
        .ranked
        .iter()
        .all(|row| row.trend_direction == TrendDirection::Unknown));
}

#[test]
fn analysis_serializes_tagged_group_keys() {
    let text = "\
teacher_id,teacher_name,slot_date,covered
t-1,Mr. Otieno,2025-01-27,true
";
    let slots: Vec<TimetableSlot> = read_csv(text.as_bytes()).unwrap();
    let analysis = analyze::<OperationsAdapter>(&slots, &request());
    let json = serde_json::to_value(&analysis).unwrap();

    let row = &json["ranked"][0];
    assert_eq!(row["group_key"]["kind"], "teacher");
    assert_eq!(row["group_key"]["id"], "t-1");
    assert_eq!(row["percentage"], 100.0);
    assert_eq!(row["trend_direction"], "unknown");
    assert!(row["trend_delta"].is_null());
    assert_eq!(json["domain"], "operations");
}
