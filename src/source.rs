//! Where adapter rows come from: the school's Postgres service or a CSV
//! export of one of its tables.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;
use sqlx::PgPool;

use crate::adapters::{
    AcademicsAdapter, AttendanceAdapter, Domain, DomainAdapter, FeesAdapter, OperationsAdapter,
    SyllabusAdapter,
};
use crate::db::{self, Stored};
use crate::models::FactRow;
use crate::period::DateRange;

pub enum FactSource {
    Database(PgPool),
    Csv(PathBuf),
    /// A directory holding one `<domain>.csv` export per domain.
    CsvDir(PathBuf),
}

pub fn domain_csv_path(dir: &Path, domain: Domain) -> PathBuf {
    dir.join(format!("{domain}.csv"))
}

pub fn read_csv<T: DeserializeOwned, R: Read>(reader: R) -> anyhow::Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();

    for (index, result) in reader.deserialize::<T>().enumerate() {
        let row = result.with_context(|| format!("invalid CSV record {}", index + 1))?;
        rows.push(row);
    }

    Ok(rows)
}

pub fn read_csv_file<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    read_csv(file).with_context(|| format!("failed to read {}", path.display()))
}

/// Loads one domain's rows covering `span` and maps them to facts. CSV
/// exports are taken whole; the aggregator discards what falls outside.
pub async fn load_facts(
    domain: Domain,
    source: &FactSource,
    span: DateRange,
) -> anyhow::Result<Vec<FactRow>> {
    match domain {
        Domain::Attendance => load::<AttendanceAdapter>(source, span).await,
        Domain::Fees => load::<FeesAdapter>(source, span).await,
        Domain::Academics => load::<AcademicsAdapter>(source, span).await,
        Domain::Syllabus => load::<SyllabusAdapter>(source, span).await,
        Domain::Operations => load::<OperationsAdapter>(source, span).await,
    }
}

async fn load<A>(source: &FactSource, span: DateRange) -> anyhow::Result<Vec<FactRow>>
where
    A: DomainAdapter,
    A::Source: Stored,
{
    let rows: Vec<A::Source> = match source {
        FactSource::Database(pool) => db::fetch_sources(pool, span).await?,
        FactSource::Csv(path) => read_csv_file(path)?,
        FactSource::CsvDir(dir) => {
            let path = domain_csv_path(dir, A::DOMAIN);
            if !path.exists() {
                tracing::warn!(domain = %A::DOMAIN, path = %path.display(), "no export for domain");
                return Ok(Vec::new());
            }
            read_csv_file(&path)?
        }
    };

    tracing::info!(domain = %A::DOMAIN, rows = rows.len(), "loaded source rows");
    Ok(A::to_facts(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{AttendanceMark, FeeInvoice};
    use chrono::NaiveDate;

    #[test]
    fn reads_rows_with_and_without_source_key() {
        let text = "\
class_id,class_name,student_id,marked_on,status
7A, Grade 7A ,s-1,2025-01-30,present
7A,Grade 7A,s-2,2025-01-30,absent
";
        let marks: Vec<AttendanceMark> = read_csv(text.as_bytes()).unwrap();
        assert_eq!(marks.len(), 2);
        assert_eq!(marks[0].class_name, "Grade 7A");
        assert_eq!(marks[0].source_key, None);
        assert_eq!(marks[1].status, "absent");
    }

    #[test]
    fn reads_timestamps() {
        let text = "\
source_key,class_id,class_name,student_id,amount_due_minor,amount_paid_minor,updated_at
inv-1,8B,Grade 8B,s-9,150000,75000,2025-01-20T14:30:00
";
        let invoices: Vec<FeeInvoice> = read_csv(text.as_bytes()).unwrap();
        assert_eq!(invoices[0].source_key.as_deref(), Some("inv-1"));
        assert_eq!(invoices[0].updated_at.to_string(), "2025-01-20 14:30:00");
    }

    #[test]
    fn reports_malformed_record() {
        let text = "\
class_id,class_name,student_id,marked_on,status
7A,Grade 7A,s-1,not-a-date,present
";
        let err = read_csv::<AttendanceMark, _>(text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("invalid CSV record 1"));
    }

    #[test]
    fn export_directory_names_files_by_domain() {
        let path = domain_csv_path(Path::new("/srv/exports"), Domain::Operations);
        assert_eq!(path, PathBuf::from("/srv/exports/operations.csv"));
    }

    #[tokio::test]
    async fn export_directory_skips_missing_domains() {
        let dir = std::env::temp_dir().join(format!("school-analytics-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            domain_csv_path(&dir, Domain::Attendance),
            "class_id,class_name,student_id,marked_on,status\n7A,Grade 7A,s-1,2025-01-30,present\n",
        )
        .unwrap();

        let source = FactSource::CsvDir(dir.clone());
        let span = DateRange {
            start: NaiveDate::from_ymd_opt(2025, 1, 25).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        };
        let attendance = load_facts(Domain::Attendance, &source, span).await.unwrap();
        let fees = load_facts(Domain::Fees, &source, span).await.unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(attendance.len(), 1);
        assert!(fees.is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = read_csv_file::<AttendanceMark>(Path::new("/nonexistent/marks.csv"));
        assert!(result.is_err());
    }
}
