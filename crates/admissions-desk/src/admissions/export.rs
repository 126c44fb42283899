use std::io::Write;

use serde::Serialize;
use url::Url;

use super::attachments::resolve_attachment_url;
use super::domain::Application;

const HEADER: [&str; 10] = [
    "id",
    "applicant_name",
    "grade_level",
    "gender",
    "status",
    "activities",
    "image",
    "document",
    "created_at",
    "updated_at",
];

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: u64,
    applicant_name: &'a str,
    grade_level: &'a str,
    gender: &'static str,
    status: &'static str,
    activities: String,
    image: Option<String>,
    document: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

/// Write the given applications as CSV, one row each, in the order supplied.
/// Attachment columns carry absolute URLs. The header is written even when
/// there are no rows.
pub fn write_csv<'a, W, I>(writer: W, applications: I, api_base: &Url) -> Result<(), csv::Error>
where
    W: Write,
    I: IntoIterator<Item = &'a Application>,
{
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(HEADER)?;
    for application in applications {
        csv.serialize(ExportRow {
            id: application.id.0,
            applicant_name: &application.applicant_name,
            grade_level: &application.grade_level,
            gender: application.gender.token(),
            status: application.status.token(),
            activities: application.activities.join(";"),
            image: resolve_attachment_url(api_base, application.image.as_deref()),
            document: resolve_attachment_url(api_base, application.document.as_deref()),
            created_at: application.created_at.map(|ts| ts.to_rfc3339()),
            updated_at: application.updated_at.map(|ts| ts.to_rfc3339()),
        })?;
    }
    csv.flush()?;
    Ok(())
}
