//! Minimal CLI parsing for the serve/import modes.

use std::env;
use std::path::PathBuf;

/// What the binary should do this run
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Import every unprocessed CSV file in a directory directly into the database
    ImportDir { dir: PathBuf },
    /// POST each row of one CSV file to a running server
    ImportUrl { base_url: String, file: PathBuf },
    /// Rewrite relative audio/image URLs in a CSV file to absolute ones
    RewriteUrls {
        file: PathBuf,
        audio_base: String,
        image_base: String,
    },
}

#[derive(Debug)]
pub struct CliOptions {
    pub command: Command,
}

impl CliOptions {
    pub fn from_args() -> Result<Self, String> {
        Self::parse(env::args().skip(1).collect())
    }

    fn parse(args: Vec<String>) -> Result<Self, String> {
        let mut import_dir: Option<PathBuf> = None;
        let mut import_url: Option<String> = None;
        let mut file: Option<PathBuf> = None;
        let mut rewrite: Option<PathBuf> = None;
        let mut audio_base: Option<String> = None;
        let mut image_base: Option<String> = None;

        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--import" => {
                    import_dir = Some(PathBuf::from(
                        iter.next().ok_or("--import requires a directory")?,
                    ));
                }
                "--import-url" => {
                    import_url = Some(iter.next().ok_or("--import-url requires a base URL")?);
                }
                "--file" => {
                    file = Some(PathBuf::from(iter.next().ok_or("--file requires a path")?));
                }
                "--rewrite-urls" => {
                    rewrite = Some(PathBuf::from(
                        iter.next().ok_or("--rewrite-urls requires a path")?,
                    ));
                }
                "--audio-base" => {
                    audio_base = Some(iter.next().ok_or("--audio-base requires a URL")?);
                }
                "--image-base" => {
                    image_base = Some(iter.next().ok_or("--image-base requires a URL")?);
                }
                other => return Err(format!("unknown argument: {}", other)),
            }
        }

        let command = if let Some(dir) = import_dir {
            Command::ImportDir { dir }
        } else if let Some(base_url) = import_url {
            Command::ImportUrl {
                base_url,
                file: file.ok_or("--import-url requires --file <path>")?,
            }
        } else if let Some(path) = rewrite {
            Command::RewriteUrls {
                file: path,
                audio_base: audio_base.ok_or("--rewrite-urls requires --audio-base <url>")?,
                image_base: image_base.ok_or("--rewrite-urls requires --image-base <url>")?,
            }
        } else {
            Command::Serve
        };

        Ok(Self { command })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliOptions, String> {
        CliOptions::parse(args.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn no_args_means_serve() {
        assert_eq!(parse(&[]).unwrap().command, Command::Serve);
    }

    #[test]
    fn import_dir() {
        let options = parse(&["--import", "data.input"]).unwrap();
        assert_eq!(
            options.command,
            Command::ImportDir {
                dir: PathBuf::from("data.input")
            }
        );
    }

    #[test]
    fn import_url_requires_file() {
        assert!(parse(&["--import-url", "http://localhost:8000"]).is_err());

        let options = parse(&["--import-url", "http://localhost:8000", "--file", "book1.csv"]).unwrap();
        assert_eq!(
            options.command,
            Command::ImportUrl {
                base_url: "http://localhost:8000".to_string(),
                file: PathBuf::from("book1.csv"),
            }
        );
    }

    #[test]
    fn rewrite_requires_both_bases() {
        assert!(parse(&["--rewrite-urls", "a.csv", "--audio-base", "http://a/"]).is_err());

        let options = parse(&[
            "--rewrite-urls",
            "a.csv",
            "--audio-base",
            "http://a/",
            "--image-base",
            "http://i/",
        ])
        .unwrap();
        assert_eq!(
            options.command,
            Command::RewriteUrls {
                file: PathBuf::from("a.csv"),
                audio_base: "http://a/".to_string(),
                image_base: "http://i/".to_string(),
            }
        );
    }

    #[test]
    fn unknown_argument_is_rejected() {
        assert!(parse(&["--bogus"]).is_err());
    }
}
