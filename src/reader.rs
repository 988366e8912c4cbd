use crate::contact::{Address, Contact, DEFAULT_TYPE, Photo, TypedValue};
use crate::error::{ConvertError, ParseError};
use ical::VcardParser;
use ical::property::Property;
use quoted_printable::ParseMode;
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Read a `.vcf` file and parse its first card.
pub fn read_contact_file(path: &Path) -> Result<Contact, ConvertError> {
    let text = fs::read_to_string(path).map_err(|source| ConvertError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_vcard(&text)?)
}

/// Parse the text of one vCard record into a [`Contact`].
///
/// Only the first `BEGIN:VCARD` … `END:VCARD` block is read. Missing
/// properties leave the corresponding field empty; they are never an error.
/// vCard 2.1 bare parameters (`TEL;CELL:`) are read as `TYPE` values and
/// quoted-printable values are decoded as UTF-8.
pub fn parse_vcard(text: &str) -> Result<Contact, ParseError> {
    let has_header = text
        .lines()
        .any(|l| l.trim().eq_ignore_ascii_case("BEGIN:VCARD"));
    if !has_header {
        return Err(ParseError::new("no BEGIN:VCARD record found"));
    }

    let text = normalize_legacy_lines(text);
    let mut parser = VcardParser::new(text.as_bytes());
    match parser.next() {
        Some(Ok(card)) => Ok(contact_from_properties(&card.properties)),
        Some(Err(e)) => Err(ParseError::new(e.to_string())),
        None => Err(ParseError::new("no vCard record found")),
    }
}

/// Whether `value` is a syntactically valid UUID (hyphenated, simple, braced
/// or `urn:uuid:` form).
pub fn is_valid_uuid(value: &str) -> bool {
    !value.is_empty() && Uuid::parse_str(value).is_ok()
}

/// Rewrites vCard 2.1 content lines into the `name;key=value:` form the
/// grammar parser accepts.
///
/// Bare encodings (`QUOTED-PRINTABLE`, `BASE64`, ...) become `ENCODING=`
/// parameters and any other bare parameter becomes `TYPE=`. Quoted-printable
/// soft line breaks (a trailing `=`) are joined onto one line.
fn normalize_legacy_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut lines = text.lines();
    while let Some(line) = lines.next() {
        let header_len = if line.starts_with([' ', '\t']) {
            None
        } else {
            header_end(line)
        };
        let Some(header_len) = header_len else {
            out.push_str(line);
            out.push('\n');
            continue;
        };

        let (header, value) = line.split_at(header_len);
        let header = normalize_header(header);
        out.push_str(&header);

        let mut value = value.to_string();
        if header.to_ascii_uppercase().contains("ENCODING=QUOTED-PRINTABLE") {
            while value.ends_with('=') {
                let Some(next) = lines.next() else { break };
                value.pop();
                value.push_str(next);
            }
        }
        out.push_str(&value);
        out.push('\n');
    }
    out
}

// Byte offset of the first `:` outside double quotes.
fn header_end(line: &str) -> Option<usize> {
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ':' if !quoted => return Some(i),
            _ => {}
        }
    }
    None
}

fn normalize_header(header: &str) -> String {
    let mut segments = split_unquoted(header, ';').into_iter();
    let mut out = segments.next().unwrap_or_default().to_string();
    for param in segments {
        let param = param.trim();
        if param.is_empty() {
            continue;
        }
        out.push(';');
        if param.contains('=') {
            out.push_str(param);
        } else if LEGACY_ENCODINGS
            .iter()
            .any(|e| param.eq_ignore_ascii_case(e))
        {
            out.push_str("ENCODING=");
            out.push_str(param);
        } else {
            out.push_str("TYPE=");
            out.push_str(param);
        }
    }
    out
}

const LEGACY_ENCODINGS: [&str; 5] = ["QUOTED-PRINTABLE", "BASE64", "B", "8BIT", "7BIT"];

fn split_unquoted(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == '"' {
            quoted = !quoted;
        } else if c == separator && !quoted {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

fn contact_from_properties(properties: &[Property]) -> Contact {
    let mut contact = Contact::default();
    let mut categories: Vec<String> = Vec::new();

    for prop in properties {
        let Some(raw) = decoded_value(prop) else {
            continue;
        };
        let raw: &str = &raw;
        match property_name(prop).to_ascii_uppercase().as_str() {
            "UID" => set_once(&mut contact.identifier, unescape(raw)),
            "FN" => set_once(&mut contact.full_name, unescape(raw)),
            "N" => {
                if contact.family_name.is_none() && contact.given_name.is_none() {
                    let mut parts = split_structured(raw).into_iter();
                    contact.family_name = parts.next().and_then(non_empty);
                    contact.given_name = parts.next().and_then(non_empty);
                }
            }
            "ORG" => {
                if let Some(first) = split_structured(raw).into_iter().next() {
                    set_once(&mut contact.organization, first);
                }
            }
            "TEL" => push_typed(&mut contact.phone_numbers, prop, unescape(raw)),
            "EMAIL" => push_typed(&mut contact.email_addresses, prop, unescape(raw)),
            "URL" => push_typed(&mut contact.urls, prop, raw.trim().to_string()),
            "ADR" => {
                let address = parse_address(raw, type_label(prop));
                if !address.is_empty() {
                    contact.addresses.push(address);
                }
            }
            "BDAY" => set_once(&mut contact.birthday, unescape(raw)),
            "PHOTO" => {
                if contact.photo.is_none() {
                    contact.photo = if is_binary(prop) {
                        Some(Photo::Binary)
                    } else {
                        non_empty(raw.trim().to_string()).map(Photo::Text)
                    };
                }
            }
            "CATEGORIES" => {
                if let Some(c) = non_empty(unescape(raw)) {
                    categories.push(c);
                }
            }
            "NOTE" => set_once(&mut contact.notes, unescape(raw)),
            "VERSION" => set_once(&mut contact.format_version, raw.trim().to_string()),
            _ => {}
        }
    }

    if !categories.is_empty() {
        contact.categories = Some(categories.join(","));
    }
    contact
}

// Drops the `item1.` style group prefix.
fn property_name(prop: &Property) -> &str {
    prop.name.rsplit('.').next().unwrap_or(&prop.name)
}

fn set_once(field: &mut Option<String>, value: String) {
    if field.is_none() {
        *field = non_empty(value);
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn push_typed(list: &mut Vec<TypedValue>, prop: &Property, value: String) {
    if let Some(value) = non_empty(value) {
        list.push(match declared_type(prop) {
            Some(label) => TypedValue::new(value, label),
            None => TypedValue::untyped(value),
        });
    }
}

// Quoted-printable values are decoded before unescaping; undecodable bytes
// are replaced rather than failing the card.
fn decoded_value(prop: &Property) -> Option<Cow<'_, str>> {
    let raw = prop.value.as_deref()?;
    if !param_is(prop, "ENCODING", &["quoted-printable"]) {
        return Some(Cow::Borrowed(raw));
    }
    match quoted_printable::decode(raw, ParseMode::Robust) {
        Ok(bytes) => Some(Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())),
        Err(_) => Some(Cow::Borrowed(raw)),
    }
}

fn param_values<'a>(prop: &'a Property, name: &str) -> Option<&'a [String]> {
    prop.params
        .iter()
        .flatten()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, values)| values.as_slice())
}

fn type_label(prop: &Property) -> String {
    declared_type(prop).unwrap_or_else(|| DEFAULT_TYPE.to_string())
}

/// First declared `TYPE` value, upper-cased. Further values are ignored.
fn declared_type(prop: &Property) -> Option<String> {
    param_values(prop, "TYPE")
        .and_then(|values| {
            values
                .iter()
                .flat_map(|v| v.split(','))
                .map(|v| v.trim().trim_matches('"'))
                .find(|v| !v.is_empty())
        })
        .map(str::to_uppercase)
}

fn param_is(prop: &Property, name: &str, accepted: &[&str]) -> bool {
    param_values(prop, name).is_some_and(|values| {
        values
            .iter()
            .any(|v| accepted.iter().any(|a| v.trim().eq_ignore_ascii_case(a)))
    })
}

fn is_binary(prop: &Property) -> bool {
    param_is(prop, "ENCODING", &["b", "base64"]) || param_is(prop, "VALUE", &["binary"])
}

fn parse_address(raw: &str, type_label: String) -> Address {
    let mut parts = split_structured(raw).into_iter().map(non_empty);
    let mut next = || parts.next().flatten();
    Address {
        pobox: next(),
        extended: next(),
        street: next(),
        locality: next(),
        region: next(),
        postal: next(),
        country: next(),
        type_label,
    }
}

/// Split a structured value on unescaped `;` and unescape each component.
fn split_structured(raw: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ';' => parts.push(unescape(&std::mem::take(&mut current))),
            _ => current.push(c),
        }
    }
    parts.push(unescape(&current));
    parts
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CARD: &str = "BEGIN:VCARD
VERSION:3.0
UID:0f6c4b1e-3d2a-4c1b-9a8e-2b7f5d9c1e00
FN:Jane Q. Public
N:Public;Jane;Q.;Dr.;
ORG:Acme Corp;Research
TEL;TYPE=cell:+1 (555) 010-0001
TEL:555-0002
EMAIL;TYPE=work,internet:jane@acme.example
URL;TYPE=home:https://jane.example
ADR;TYPE=home:PO 7;Apt 2;123 Main St;Springfield;IL;01234;USA
BDAY:1985-04-12
CATEGORIES:Friends,Work
NOTE:Met at the conference\\, 2019
END:VCARD
";

    #[test]
    fn parses_every_supported_property() {
        let c = parse_vcard(FULL_CARD).unwrap();
        assert_eq!(
            c.identifier.as_deref(),
            Some("0f6c4b1e-3d2a-4c1b-9a8e-2b7f5d9c1e00")
        );
        assert_eq!(c.full_name.as_deref(), Some("Jane Q. Public"));
        assert_eq!(c.family_name.as_deref(), Some("Public"));
        assert_eq!(c.given_name.as_deref(), Some("Jane"));
        assert_eq!(c.organization.as_deref(), Some("Acme Corp"));
        assert_eq!(
            c.phone_numbers,
            vec![
                TypedValue::new("+1 (555) 010-0001", "CELL"),
                TypedValue::untyped("555-0002"),
            ]
        );
        assert_eq!(
            c.email_addresses,
            vec![TypedValue::new("jane@acme.example", "WORK")]
        );
        assert_eq!(c.urls, vec![TypedValue::new("https://jane.example", "HOME")]);
        assert_eq!(c.birthday.as_deref(), Some("1985-04-12"));
        assert_eq!(c.categories.as_deref(), Some("Friends,Work"));
        assert_eq!(c.notes.as_deref(), Some("Met at the conference, 2019"));
        assert_eq!(c.format_version.as_deref(), Some("3.0"));

        let adr = &c.addresses[0];
        assert_eq!(adr.type_label, "HOME");
        assert_eq!(adr.pobox.as_deref(), Some("PO 7"));
        assert_eq!(adr.extended.as_deref(), Some("Apt 2"));
        assert_eq!(adr.street.as_deref(), Some("123 Main St"));
        assert_eq!(adr.locality.as_deref(), Some("Springfield"));
        assert_eq!(adr.region.as_deref(), Some("IL"));
        assert_eq!(adr.postal.as_deref(), Some("01234"));
        assert_eq!(adr.country.as_deref(), Some("USA"));
    }

    #[test]
    fn missing_properties_leave_fields_empty() {
        let c = parse_vcard("BEGIN:VCARD\nVERSION:3.0\nEND:VCARD\n").unwrap();
        assert_eq!(
            c,
            Contact {
                format_version: Some("3.0".into()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn empty_name_components_are_absent() {
        let c = parse_vcard("BEGIN:VCARD\nVERSION:3.0\nN:;Cher;;;\nEND:VCARD\n").unwrap();
        assert_eq!(c.family_name, None);
        assert_eq!(c.given_name.as_deref(), Some("Cher"));
    }

    #[test]
    fn grouped_properties_are_recognised() {
        let c = parse_vcard(
            "BEGIN:VCARD\nVERSION:3.0\nitem1.EMAIL;TYPE=HOME:a@b.example\nEND:VCARD\n",
        )
        .unwrap();
        assert_eq!(c.email_addresses, vec![TypedValue::new("a@b.example", "HOME")]);
    }

    #[test]
    fn binary_photo_is_flagged_not_kept() {
        let c = parse_vcard(
            "BEGIN:VCARD\nVERSION:3.0\nPHOTO;ENCODING=b;TYPE=JPEG:/9j/4AAQSkZJRg==\nEND:VCARD\n",
        )
        .unwrap();
        assert_eq!(c.photo, Some(Photo::Binary));

        let c = parse_vcard(
            "BEGIN:VCARD\nVERSION:4.0\nPHOTO:https://example.com/me.jpg\nEND:VCARD\n",
        )
        .unwrap();
        assert_eq!(
            c.photo,
            Some(Photo::Text("https://example.com/me.jpg".into()))
        );
    }

    #[test]
    fn legacy_bare_parameters_are_types() {
        let c = parse_vcard(
            "BEGIN:VCARD\r\nVERSION:2.1\r\nN:Doe;John;;;\r\nFN:John Doe\r\n\
             TEL;CELL;VOICE:+1 555\r\nTEL;;HOME:555-0100\r\nEMAIL;INTERNET:j@example.com\r\n\
             TEL:555-0199\r\nEND:VCARD\r\n",
        )
        .unwrap();
        assert_eq!(c.full_name.as_deref(), Some("John Doe"));
        assert_eq!(
            c.phone_numbers,
            vec![
                TypedValue::new("+1 555", "CELL"),
                TypedValue::new("555-0100", "HOME"),
                TypedValue::untyped("555-0199"),
            ]
        );
        assert_eq!(
            c.email_addresses,
            vec![TypedValue::new("j@example.com", "INTERNET")]
        );
    }

    #[test]
    fn quoted_printable_values_are_decoded() {
        let c = parse_vcard(
            "BEGIN:VCARD\nVERSION:2.1\n\
             FN;ENCODING=QUOTED-PRINTABLE;CHARSET=UTF-8:caf=C3=A9\n\
             N;CHARSET=UTF-8;QUOTED-PRINTABLE:M=C3=BCller;J=C3=BCrgen;;;\n\
             NOTE;ENCODING=QUOTED-PRINTABLE:First line=0ASecond =\nline\n\
             TEL;CELL:+1 555\n\
             END:VCARD\n",
        )
        .unwrap();
        assert_eq!(c.full_name.as_deref(), Some("café"));
        assert_eq!(c.family_name.as_deref(), Some("Müller"));
        assert_eq!(c.given_name.as_deref(), Some("Jürgen"));
        assert_eq!(c.notes.as_deref(), Some("First line\nSecond line"));
        assert_eq!(c.phone_numbers, vec![TypedValue::new("+1 555", "CELL")]);
    }

    #[test]
    fn quoted_parameter_values_keep_their_colons() {
        assert_eq!(
            normalize_header("TEL;X-LABEL=\"a;b:c\";WORK"),
            "TEL;X-LABEL=\"a;b:c\";TYPE=WORK"
        );
        assert_eq!(header_end("URL;X-A=\"x:y\":http://e.example"), Some(13));
    }

    #[test]
    fn text_without_a_card_is_a_parse_error() {
        assert!(parse_vcard("").is_err());
        assert!(parse_vcard("this is not a vcard").is_err());
    }

    #[test]
    fn uuid_predicate() {
        assert!(is_valid_uuid("0f6c4b1e-3d2a-4c1b-9a8e-2b7f5d9c1e00"));
        assert!(is_valid_uuid("urn:uuid:0f6c4b1e-3d2a-4c1b-9a8e-2b7f5d9c1e00"));
        assert!(!is_valid_uuid("12345"));
        assert!(!is_valid_uuid(""));
    }

    #[test]
    fn read_contact_file_reports_missing_file() {
        let err = read_contact_file(Path::new("/nonexistent/contact.vcf")).unwrap_err();
        assert!(matches!(err, ConvertError::Read { .. }));
    }
}
