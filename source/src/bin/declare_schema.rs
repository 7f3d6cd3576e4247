//! Declare the content schema for a directory of custom types.
//!
//! Reads every `<id>.json` custom type in `--custom-types`, declares the
//! schema, writes the type path registry to `--cache-dir`, and prints the
//! type descriptors as JSON on stdout. Repository settings are layered by
//! OrthoConfig from configuration files, `PRISMIC_*` environment variables,
//! and the settings flags given after `--`, e.g.
//! `declare-schema --custom-types types -- --repository-name blog`.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs::Dir};
use clap::Parser;
use ortho_config::OrthoConfig;
use prismic_source::domain::ports::{FixtureCmsClient, FixtureSchemaRegistrar};
use prismic_source::domain::{CustomTypeDefinition, Document};
use prismic_source::outbound::{FsTypePathCache, InMemoryNodeStore};
use prismic_source::{ContentSourcingService, SourceSettings, SourcingPorts};
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// `declare-schema` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "declare-schema",
    about = "Declare content types and cache the type path registry",
    version
)]
struct CliArgs {
    /// Directory holding one `<custom-type-id>.json` file per custom type.
    #[arg(long = "custom-types", value_name = "dir")]
    custom_types: Utf8PathBuf,
    /// JSON array of sample documents used to infer integration fields.
    #[arg(long = "samples", value_name = "path")]
    samples: Option<Utf8PathBuf>,
    /// Directory receiving the registry snapshot.
    #[arg(long = "cache-dir", value_name = "dir", default_value = ".prismic-cache")]
    cache_dir: Utf8PathBuf,
    /// Source settings flags such as `--repository-name`, highest precedence.
    #[arg(last = true, value_name = "settings")]
    settings: Vec<OsString>,
}

/// Layer the forwarded settings flags over files and environment.
fn load_settings(forwarded: Vec<OsString>) -> io::Result<SourceSettings> {
    let argv = std::iter::once(OsString::from("declare-schema")).chain(forwarded);
    SourceSettings::load_from_iter(argv)
        .map_err(|error| io::Error::other(format!("load settings: {error}")))
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

#[expect(clippy::print_stdout, reason = "the declaration is the command's output")]
async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;

    let options = load_settings(args.settings)?
        .into_options()
        .map_err(|error| io::Error::other(format!("invalid settings: {error}")))?;

    let custom_types = read_custom_types(&args.custom_types)?;
    let samples = match &args.samples {
        Some(path) => read_samples(path)?,
        None => Vec::new(),
    };
    let cache = FsTypePathCache::open(&args.cache_dir)
        .map_err(|error| io::Error::other(format!("open cache directory: {error}")))?;

    let service = ContentSourcingService::new(
        SourcingPorts {
            client: Arc::new(FixtureCmsClient::default()),
            store: Arc::new(InMemoryNodeStore::new()),
            cache: Arc::new(cache),
            registrar: Arc::new(FixtureSchemaRegistrar),
        },
        options,
    );
    let declaration = service
        .declare_schema(&custom_types, &samples)
        .await
        .map_err(|error| io::Error::other(format!("declare schema failed: {error}")))?;

    let rendered = serde_json::to_string_pretty(&declaration)
        .map_err(|error| io::Error::other(format!("render declaration: {error}")))?;
    println!("{rendered}");
    Ok(())
}

fn read_custom_types(path: &Utf8Path) -> io::Result<Vec<CustomTypeDefinition>> {
    let dir = Dir::open_ambient_dir(path, ambient_authority())
        .map_err(|error| io::Error::other(format!("open custom types directory '{path}': {error}")))?;
    let mut definitions = Vec::new();
    for entry in dir.entries()? {
        let file_name = entry?.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        let Some(id) = name.strip_suffix(".json") else {
            continue;
        };
        let contents = dir
            .read_to_string(name)
            .map_err(|error| io::Error::other(format!("read custom type '{name}': {error}")))?;
        let json = serde_json::from_str(&contents)
            .map_err(|error| io::Error::other(format!("parse custom type '{name}': {error}")))?;
        definitions.push(CustomTypeDefinition::new(id, json));
    }
    definitions.sort_by(|left, right| left.id.cmp(&right.id));
    Ok(definitions)
}

fn read_samples(path: &Utf8Path) -> io::Result<Vec<Document>> {
    let parent = path.parent().filter(|parent| !parent.as_str().is_empty()).unwrap_or(Utf8Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "samples path must be a file"))?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|error| io::Error::other(format!("open samples directory '{parent}': {error}")))?;
    let contents = dir
        .read_to_string(file_name)
        .map_err(|error| io::Error::other(format!("read samples '{path}': {error}")))?;
    serde_json::from_str(&contents).map_err(|error| io::Error::other(format!("parse samples '{path}': {error}")))
}
