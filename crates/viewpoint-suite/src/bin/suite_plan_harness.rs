use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use viewpoint_suite::suite_plan::{load_suite_plan_fixture, run_suite_plan, SuitePlanSummary};

#[derive(Debug, Clone)]
struct HarnessCli {
    fixture: PathBuf,
    summary_json_out: PathBuf,
    log_filter: String,
}

impl HarnessCli {
    fn parse() -> Result<Self> {
        let mut fixture: Option<PathBuf> = None;
        let mut summary_json_out: Option<PathBuf> = None;
        let mut log_filter = "info".to_string();

        let mut args = std::env::args().skip(1);
        while let Some(flag) = args.next() {
            match flag.as_str() {
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                "--fixture" => fixture = Some(PathBuf::from(require_arg_value(&mut args, &flag)?)),
                "--summary-json-out" => {
                    summary_json_out = Some(PathBuf::from(require_arg_value(&mut args, &flag)?));
                }
                "--log-filter" => {
                    log_filter = require_arg_value(&mut args, &flag)?;
                }
                other => {
                    bail!("unknown argument '{other}'");
                }
            }
        }

        let fixture = fixture.context("--fixture is required")?;
        let summary_json_out = summary_json_out.unwrap_or_else(|| {
            fixture
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default()
                .join("suite-plan-summary.json")
        });

        Ok(Self {
            fixture,
            summary_json_out,
            log_filter,
        })
    }
}

fn require_arg_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .with_context(|| format!("missing value for {flag}"))
}

fn init_tracing(filter: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .with_context(|| format!("invalid log filter '{filter}'"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to initialize tracing subscriber: {error}"))
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

fn write_summary_json(path: &Path, summary: &SuitePlanSummary) -> Result<()> {
    ensure_parent_dir(path)?;
    let rendered = serde_json::to_string_pretty(summary).context("serialize plan summary json")?;
    std::fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))
}

fn print_usage() {
    println!(
        "Usage: suite_plan_harness \
--fixture <path> \
[--summary-json-out <path>] \
[--log-filter <directives>]"
    );
}

fn run() -> Result<()> {
    let cli = HarnessCli::parse()?;
    init_tracing(&cli.log_filter)?;
    if !cli.fixture.exists() {
        bail!("fixture '{}' does not exist", cli.fixture.display());
    }
    if !cli.fixture.is_file() {
        bail!("fixture '{}' must point to a file", cli.fixture.display());
    }

    let fixture = load_suite_plan_fixture(&cli.fixture)
        .with_context(|| format!("failed to load fixture '{}'", cli.fixture.display()))?;
    let summary = run_suite_plan(&fixture)?;
    write_summary_json(&cli.summary_json_out, &summary)?;

    println!(
        "suite plan harness summary: discovered={} skip={} device_context={} location_context={} default={}",
        summary.discovered_entries,
        summary.skip_entries,
        summary.device_context_entries,
        summary.location_context_entries,
        summary.default_entries,
    );
    for (index, entry) in summary.timeline.iter().enumerate() {
        println!(
            "timeline[{index}] entry_id={} ident={} display_name=\"{}\" strategy={}",
            entry.entry_id, entry.ident, entry.display_name, entry.strategy,
        );
    }
    println!("summary_json={}", cli.summary_json_out.display());

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("suite plan harness failed: {error:#}");
        std::process::exit(1);
    }
}
