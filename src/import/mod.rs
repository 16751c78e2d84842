//! CSV catalog loaders
//!
//! Seed files carry one row per audio item with the columns
//! `Source_id, Title, Audio_url, Image_url, Location, Creator_id, Tag`.
//! `Image_url` and `Tag` cells hold comma-separated lists; blank or
//! literal `Null` cells mean empty. Two loading modes exist: direct
//! repository writes, and row-by-row POSTs against a running server.
//! Directory imports keep a ledger file so re-running skips files that
//! were already loaded.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::db::{Database, UpsertAudioMeta};

/// Name of the processed-files ledger kept inside the import directory
const LEDGER_FILE: &str = "added_files.log";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("POST {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("server rejected {src_id} with status {status}")]
    Rejected { src_id: String, status: u16 },
    #[error("{path} has no {column} column")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// One seed-file row as written by the catalog spreadsheets
#[derive(Debug, serde::Deserialize)]
struct SeedRow {
    #[serde(rename = "Source_id")]
    source_id: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Audio_url")]
    audio_url: String,
    #[serde(rename = "Image_url", default)]
    image_url: String,
    #[serde(rename = "Location", default)]
    location: String,
    #[serde(rename = "Creator_id", default)]
    creator_id: String,
    #[serde(rename = "Tag", default)]
    tag: String,
}

impl SeedRow {
    fn into_meta(self) -> UpsertAudioMeta {
        UpsertAudioMeta {
            src_id: self.source_id,
            description: non_null(self.title),
            audio_src: non_null(self.audio_url),
            location: non_null(self.location),
            creator: non_null(self.creator_id),
            images: split_cell(&self.image_url),
            tags: split_cell(&self.tag),
        }
    }
}

fn non_null(cell: String) -> Option<String> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || trimmed == "Null" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split a comma-separated cell, dropping blanks and `Null`
fn split_cell(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty() && *part != "Null")
        .map(str::to_string)
        .collect()
}

fn read_rows(path: &Path) -> Result<Vec<SeedRow>, ImportError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| ImportError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rows = Vec::new();
    for result in reader.deserialize::<SeedRow>() {
        rows.push(result.map_err(|source| ImportError::Csv {
            path: path.to_path_buf(),
            source,
        })?);
    }
    Ok(rows)
}

/// Import one CSV file directly through the repositories; returns the row count
pub async fn import_file(db: &Database, path: &Path) -> Result<usize, ImportError> {
    let rows = read_rows(path)?;
    let audio = db.audio();

    let mut imported = 0;
    for row in rows {
        let meta = row.into_meta();
        audio.upsert(&meta).await?;
        imported += 1;
    }

    info!(file = %path.display(), rows = imported, "imported catalog file");
    Ok(imported)
}

/// Import every unprocessed `*.csv` file in a directory.
///
/// Files already named in the `added_files.log` ledger are skipped; each
/// newly processed file is appended to it. Returns the total row count.
pub async fn import_dir(db: &Database, dir: &Path) -> Result<usize, ImportError> {
    let ledger_path = dir.join(LEDGER_FILE);
    let processed = load_ledger(&ledger_path)?;

    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".csv"))
        .collect();
    names.sort();

    let mut total = 0;
    for name in names {
        if processed.contains(&name) {
            continue;
        }
        total += import_file(db, &dir.join(&name)).await?;
        append_ledger(&ledger_path, &name)?;
    }
    Ok(total)
}

/// POST each row of one CSV file to `<base>/add-audio-meta`
pub async fn import_via_http(base_url: &str, path: &Path) -> Result<usize, ImportError> {
    let rows = read_rows(path)?;
    let url = format!("{}/add-audio-meta", base_url.trim_end_matches('/'));
    let client = reqwest::Client::new();

    let mut imported = 0;
    for row in rows {
        let meta = row.into_meta();
        let src_id = meta.src_id.clone();

        let response = client
            .post(&url)
            .json(&meta)
            .send()
            .await
            .map_err(|source| ImportError::Http {
                url: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            warn!(src_id = %src_id, status = %response.status(), "row rejected");
            return Err(ImportError::Rejected {
                src_id,
                status: response.status().as_u16(),
            });
        }
        imported += 1;
    }

    info!(file = %path.display(), rows = imported, url = %url, "posted catalog file");
    Ok(imported)
}

/// Rewrite relative `Audio_url`/`Image_url` cells to absolute URLs in place.
///
/// Cells that are blank, `Null`, or already absolute are left alone.
/// Returns the number of rewritten rows.
pub fn rewrite_urls(path: &Path, audio_base: &str, image_base: &str) -> Result<usize, ImportError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| ImportError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    let headers = reader
        .headers()
        .map_err(|source| ImportError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let column = |name: &'static str| -> Result<usize, ImportError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(ImportError::MissingColumn {
                path: path.to_path_buf(),
                column: name,
            })
    };
    let audio_col = column("Audio_url")?;
    let image_col = column("Image_url")?;

    let mut rows = Vec::new();
    for result in reader.records() {
        rows.push(result.map_err(|source| ImportError::Csv {
            path: path.to_path_buf(),
            source,
        })?);
    }

    let mut rewritten = 0;
    let mut writer = csv::Writer::from_path(path).map_err(|source| ImportError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    writer
        .write_record(&headers)
        .map_err(|source| ImportError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    for record in rows {
        let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
        let mut changed = false;

        if let Some(cell) = fields.get_mut(audio_col) {
            if let Some(updated) = prefix_cell(cell, audio_base) {
                *cell = updated;
                changed = true;
            }
        }
        if let Some(cell) = fields.get_mut(image_col) {
            if let Some(updated) = prefix_cell(cell, image_base) {
                *cell = updated;
                changed = true;
            }
        }

        if changed {
            rewritten += 1;
        }
        writer
            .write_record(&fields)
            .map_err(|source| ImportError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
    }

    writer.flush()?;
    Ok(rewritten)
}

/// Prefix every relative part of a (possibly comma-separated) URL cell
fn prefix_cell(cell: &str, base: &str) -> Option<String> {
    if cell.trim().is_empty() || cell.trim() == "Null" {
        return None;
    }

    let mut changed = false;
    let parts: Vec<String> = cell
        .split(',')
        .map(str::trim)
        .map(|part| {
            if part.is_empty() || part == "Null" || part.starts_with("http") {
                part.to_string()
            } else {
                changed = true;
                format!("{}{}", base, part)
            }
        })
        .collect();

    changed.then(|| parts.join(","))
}

fn load_ledger(path: &Path) -> Result<HashSet<String>, ImportError> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    Ok(fs::read_to_string(path)?
        .lines()
        .map(str::to_string)
        .collect())
}

fn append_ledger(path: &Path, name: &str) -> Result<(), ImportError> {
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", name)?;
    Ok(())
}
