//! # vcf-to-obsidian
//!
//! Converts vCard (`.vcf`) contacts into Markdown notes for the
//! [obsidian-vcf-contacts](https://github.com/broekema41/obsidian-vcf-contacts) plugin.
//!
//! ## What it does
//!
//! Each card is parsed into a [`Contact`], rendered as a note whose frontmatter
//! uses the plugin's key layout (`N.FN`, `"EMAIL[WORK]"`, `"ADR[HOME].STREET"`, …),
//! and written to `<destination>/<name>.md`. The name is the contact's full name,
//! falling back to given + family name, then the UID, then the source file name.
//!
//! ## Re-running
//!
//! Every note carries a `UID: <identifier>` line. When a contact is renamed,
//! the next run finds the older note by that line and removes it, so each UID
//! keeps a single note in the destination directory. The directory itself is
//! the only state; nothing else is persisted between runs.
//!
//! ## Usage
//!
//! ```sh
//! # Convert every .vcf in a folder
//! vcf-to-obsidian --folder ~/exports/contacts --obsidian ~/vault/Contacts
//!
//! # Individual files, four workers, skip one card
//! vcf-to-obsidian --file a.vcf --file b.vcf --ignore b.vcf --workers 4 --obsidian ~/vault/Contacts
//! ```
//!
//! Preferences can be persisted in `~/.config/vcf-to-obsidian/config.toml`.
pub mod config;
pub mod contact;
pub mod converter;
pub mod discover;
pub mod error;
pub mod filename;
pub mod parallel;
pub mod reader;
pub mod renderer;

pub use config::{ConvertOptions, IdentifierValidation};
pub use contact::{Address, Contact, Photo, TypedValue};
pub use converter::{Converter, ProcessResult};
pub use error::{ConvertError, ParseError};
pub use parallel::BatchSummary;
