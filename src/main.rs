use std::cmp::Ordering;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use dependi_versions::config::Config;
use dependi_versions::docker::{DockerTag, LatestTagFinder};
use dependi_versions::gradle::{GradleVersion, RequirementEntry, RequirementsUpdater};
use dependi_versions::requirement::Requirement;
use dependi_versions::scheme::{Docker, Ecosystem, Gradle, VersionScheme};

#[derive(Parser)]
#[command(name = "dependi-versions")]
#[command(about = "Version ordering and requirement matching for Docker and Gradle", long_about = None)]
#[command(version)]
struct Cli {
    /// Version scheme to use (defaults to the configured one)
    #[arg(short, long, global = true)]
    ecosystem: Option<Ecosystem>,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two versions
    Compare { left: String, right: String },
    /// Check whether a version satisfies a requirement (exit code 1 if not)
    Check { requirement: String, version: String },
    /// Sort versions in ascending order
    Sort {
        #[arg(required = true)]
        versions: Vec<String>,
    },
    /// Pick the latest Docker tag from a tag list
    LatestTag {
        /// Tag currently in use
        #[arg(long)]
        current: String,

        /// File with one tag per line, or `-` for stdin
        #[arg(long)]
        tags: PathBuf,

        /// Image name, used to look up ignore conditions
        #[arg(long)]
        dependency: Option<String>,
    },
    /// Rewrite a Gradle requirement to a new version
    UpdateRequirement {
        requirement: String,
        latest: String,

        /// Repository URL recorded as the requirement source
        #[arg(long, default_value = "https://repo.maven.apache.org/maven2")]
        source_url: String,
    },
    /// Show how a Docker tag is decomposed
    Classify { tag: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let ecosystem = cli.ecosystem.unwrap_or(config.ecosystem);
    tracing::debug!("Using {} versions", ecosystem);

    match cli.command {
        Commands::Compare { left, right } => match ecosystem {
            Ecosystem::Docker => run_compare::<Docker>(&left, &right, cli.json),
            Ecosystem::Gradle => run_compare::<Gradle>(&left, &right, cli.json),
        },
        Commands::Check {
            requirement,
            version,
        } => match ecosystem {
            Ecosystem::Docker => run_check::<Docker>(&requirement, &version, cli.json),
            Ecosystem::Gradle => run_check::<Gradle>(&requirement, &version, cli.json),
        },
        Commands::Sort { versions } => match ecosystem {
            Ecosystem::Docker => run_sort::<Docker>(versions, cli.json),
            Ecosystem::Gradle => run_sort::<Gradle>(versions, cli.json),
        },
        Commands::LatestTag {
            current,
            tags,
            dependency,
        } => run_latest_tag(&config, &current, &tags, dependency.as_deref(), cli.json),
        Commands::UpdateRequirement {
            requirement,
            latest,
            source_url,
        } => run_update_requirement(&requirement, &latest, &source_url, cli.json),
        Commands::Classify { tag } => run_classify(&tag, cli.json),
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_compare<S: VersionScheme>(left: &str, right: &str, json: bool) -> Result<ExitCode> {
    let ordering = S::parse(left).cmp(&S::parse(right));
    let symbol = match ordering {
        Ordering::Less => "<",
        Ordering::Equal => "=",
        Ordering::Greater => ">",
    };

    if json {
        print_json(&serde_json::json!({
            "ecosystem": S::NAME,
            "left": left,
            "right": right,
            "ordering": symbol,
        }))?;
    } else {
        println!("{} {} {}", left, symbol, right);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_check<S: VersionScheme>(requirement: &str, version: &str, json: bool) -> Result<ExitCode> {
    let alternatives = Requirement::<S>::requirements_array(requirement)
        .with_context(|| format!("invalid requirement '{}'", requirement))?;
    let candidate = S::parse(version);
    let satisfied = alternatives.iter().any(|req| req.satisfied_by(&candidate));

    if json {
        let normalized: Vec<String> = alternatives.iter().map(|r| r.to_string()).collect();
        print_json(&serde_json::json!({
            "ecosystem": S::NAME,
            "requirement": requirement,
            "normalized": normalized,
            "version": version,
            "prerelease": S::is_prerelease(&candidate),
            "satisfied": satisfied,
        }))?;
    } else if satisfied {
        println!("[OK] {} satisfies {}", version, requirement);
    } else {
        println!("{} does not satisfy {}", version, requirement);
    }

    Ok(if satisfied {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_sort<S: VersionScheme>(versions: Vec<String>, json: bool) -> Result<ExitCode> {
    let mut parsed: Vec<(S::Version, String)> =
        versions.into_iter().map(|raw| (S::parse(&raw), raw)).collect();
    insertion_sort(&mut parsed);
    let sorted: Vec<String> = parsed.into_iter().map(|(_, raw)| raw).collect();

    if json {
        print_json(&serde_json::json!(sorted))?;
    } else {
        for version in &sorted {
            println!("{}", version);
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Stable sort that never panics on the few Gradle orderings that aren't
/// transitive (`1.0.RC1 < 1 < 1-sp < 1.0.RC1`).
fn insertion_sort<T: Ord>(items: &mut [(T, String)]) {
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && items[j - 1].0 > items[j].0 {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}

fn read_tags(path: &Path) -> Result<Vec<String>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read tags from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read tags from {}", path.display()))?
    };

    // Registry responses (`{"name": ..., "tags": [...]}`) are accepted as-is
    if let Ok(response) = serde_json::from_str::<serde_json::Value>(&content)
        && let Some(tags) = response.get("tags").and_then(|t| t.as_array())
    {
        return Ok(tags
            .iter()
            .filter_map(|t| t.as_str().map(str::to_string))
            .collect());
    }

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn run_latest_tag(
    config: &Config,
    current: &str,
    tags_path: &Path,
    dependency: Option<&str>,
    json: bool,
) -> Result<ExitCode> {
    let tags = read_tags(tags_path)?;
    if tags.is_empty() {
        bail!("no tags found in {}", tags_path.display());
    }
    tracing::debug!("Read {} tags", tags.len());

    let ignored = dependency
        .map(|name| config.ignored_requirements::<Docker>(name))
        .unwrap_or_default();
    let finder = LatestTagFinder::new(&tags).with_ignored(ignored);
    let latest = finder.try_latest_tag(current)?;
    let up_to_date = finder.is_up_to_date(current);

    if json {
        print_json(&serde_json::json!({
            "current": current,
            "latest": latest.name(),
            "up_to_date": up_to_date,
        }))?;
    } else {
        println!("{}", latest);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_update_requirement(
    requirement: &str,
    latest: &str,
    source_url: &str,
    json: bool,
) -> Result<ExitCode> {
    if !GradleVersion::is_correct(latest) {
        bail!("'{}' is not a valid Gradle version", latest);
    }
    let entry = RequirementEntry::new("build.gradle", Some(requirement));
    let updater = RequirementsUpdater::new(
        vec![entry],
        Some(GradleVersion::new(latest)),
        source_url,
        Vec::new(),
    );
    let updated = updater
        .updated_requirements()
        .with_context(|| format!("invalid requirement '{}'", requirement))?;
    let Some(entry) = updated.into_iter().next() else {
        bail!("no requirement produced for '{}'", requirement);
    };

    if json {
        print_json(&serde_json::to_value(&entry)?)?;
    } else {
        println!("{}", entry.requirement.as_deref().unwrap_or(requirement));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_classify(tag: &str, json: bool) -> Result<ExitCode> {
    let tag = DockerTag::new(tag);
    let version = Docker::parse(tag.name());
    let semver = version.to_semver();

    if json {
        print_json(&serde_json::json!({
            "name": tag.name(),
            "comparable": tag.is_comparable(),
            "prefix": tag.prefix(),
            "version": tag.version(),
            "suffix": tag.suffix(),
            "format": tag.format(),
            "numeric_version": tag.numeric_version(),
            "precision": tag.precision(),
            "canonical": tag.is_canonical(),
            "prerelease": tag.looks_like_prerelease(),
            "semver": semver,
        }))?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("Tag:        {}", tag);
    if !tag.is_comparable() {
        println!("  not comparable, never updated");
        return Ok(ExitCode::SUCCESS);
    }
    println!("  prefix:   {}", tag.prefix().unwrap_or("-"));
    println!("  version:  {}", tag.version().unwrap_or("-"));
    println!("  suffix:   {}", tag.suffix().unwrap_or("-"));
    println!("  format:   {}", tag.format());
    println!("  numeric:  {}", tag.numeric_version().unwrap_or_default());
    println!("  semver:   {}", semver.as_deref().unwrap_or("-"));
    Ok(ExitCode::SUCCESS)
}
