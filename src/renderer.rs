use crate::contact::{Contact, Photo};
use crate::filename::uid_line;
use chrono::{DateTime, Utc};

const FRONTMATTER_DELIMITER: &str = "---";
const REV_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const CONTACT_TAG: &str = "#Contact";

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Write the `NOTE` text under the Notes heading.
    pub include_notes: bool,
}

/// Render a contact note, stamping `REV` with the current UTC time.
pub fn render_markdown(contact: &Contact, options: &RenderOptions) -> String {
    render_markdown_at(contact, options, Utc::now())
}

/// Render a contact note in the line-oriented frontmatter layout read by the
/// obsidian-vcf-contacts plugin.
///
/// Keys containing `[` or `.` are quoted. Phone numbers, postal codes and the
/// version are always quoted values. The output ends with exactly one newline.
pub fn render_markdown_at(
    contact: &Contact,
    options: &RenderOptions,
    rev: DateTime<Utc>,
) -> String {
    let mut lines: Vec<String> = vec![FRONTMATTER_DELIMITER.to_string()];

    if let Some(family) = &contact.family_name {
        lines.push(format!("N.FN: {}", family));
    }
    if let Some(given) = &contact.given_name {
        lines.push(format!("N.GN: {}", given));
    }
    if let Some(full_name) = &contact.full_name {
        lines.push(format!("FN: {}", full_name));
    }
    // Binary and remote (`http...`) photos are never written.
    if let Some(Photo::Text(photo)) = &contact.photo
        && !photo.starts_with("http")
    {
        lines.push(format!("PHOTO: {}", photo));
    }
    for email in &contact.email_addresses {
        lines.push(format!("\"EMAIL[{}]\": {}", email.type_label, email.value));
    }
    for tel in &contact.phone_numbers {
        lines.push(format!("\"TEL[{}]\": \"{}\"", tel.type_label, tel.value));
    }
    if let Some(bday) = &contact.birthday {
        lines.push(format!("BDAY: {}", bday));
    }
    for url in &contact.urls {
        lines.push(format!("\"URL[{}]\": {}", url.type_label, url.value));
    }
    if let Some(org) = &contact.organization {
        lines.push(format!("ORG: {}", org));
    }
    for adr in &contact.addresses {
        for (component, value) in adr.components() {
            let Some(value) = value else { continue };
            if component == "POSTAL" {
                lines.push(format!("\"ADR[{}].{}\": \"{}\"", adr.type_label, component, value));
            } else {
                lines.push(format!("\"ADR[{}].{}\": {}", adr.type_label, component, value));
            }
        }
    }
    if let Some(categories) = &contact.categories {
        lines.push(format!("CATEGORIES: {}", categories));
    }
    if let Some(uid) = &contact.identifier {
        lines.push(uid_line(uid));
    }
    if let Some(version) = &contact.format_version {
        lines.push(format!("VERSION: \"{}\"", version));
    }
    lines.push(format!("REV: {}", rev.format(REV_FORMAT)));
    lines.push(FRONTMATTER_DELIMITER.to_string());

    if contact.notes.is_some() || contact.categories.is_some() {
        lines.push("#### Notes".to_string());
        lines.push(String::new());
        if options.include_notes
            && let Some(notes) = &contact.notes
        {
            lines.push(notes.clone());
            lines.push(String::new());
        }
        lines.push(tag_line(contact));
    }

    let mut out = lines.join("\n");
    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}

/// `#Contact` followed by one `#<category>` per comma-separated entry.
/// Entries are trimmed and empty ones are dropped, so a bare `#` is never written.
fn tag_line(contact: &Contact) -> String {
    let mut line = CONTACT_TAG.to_string();
    for category in contact.category_list() {
        line.push_str(" #");
        line.push_str(category);
    }
    line
}
