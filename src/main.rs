//! NXD Engine - command line front end
//!
//! Score names, rank suggestions, check availability, price names for the
//! secondary market and send autonomous operations through the AI gateway.

use std::env;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};

use nxd_engine::{
    domain::{DEFAULT_TLD, MAX_ALTERNATIVES},
    gateway::available_providers,
    AiGateway, AvailabilityReport, DomainScorer, DomainSuggestion, EngineHealth, GatewayHealth,
    GatewayResponse, MarketAnalysis, NxdError, OperationContext, OperationRequest, OperationType,
    PriceTrend, ProviderHealth, ProviderId, RegistryOracle, ScoreBreakdown, Settings,
    SuggestionEngine, TldTable,
};

const DEFAULT_MAX_RESULTS: usize = 10;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let cli = match CliArgs::parse(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("💡 Run `nxd-engine --help` for usage");
            process::exit(2);
        }
    };

    match cli.command {
        Command::Help => {
            print_help();
            return;
        }
        Command::Version => {
            println!("nxd-engine {}", nxd_engine::VERSION);
            return;
        }
        _ => {}
    }

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("❌ Failed to initialize logging: {}", e);
        process::exit(1);
    }

    match run(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            match e.downcast_ref::<NxdError>() {
                Some(err) => eprintln!("{}", err.user_message()),
                None => eprintln!("❌ Error: {:#}", e),
            }
            process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = if verbose {
        EnvFilter::new("nxd_engine=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nxd_engine=info"))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow!(e))
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Score,
    Suggest,
    Check,
    Analyze,
    Ask,
    Health,
    Help,
    Version,
}

#[derive(Debug)]
struct CliArgs {
    command: Command,
    positionals: Vec<String>,
    tlds: Vec<String>,
    max_results: usize,
    trend: PriceTrend,
    provider: Option<String>,
    approval: bool,
    json: bool,
    verbose: bool,
}

impl CliArgs {
    fn parse(args: &[String]) -> anyhow::Result<Self> {
        let command = match args.first().map(String::as_str) {
            None | Some("-h") | Some("--help") | Some("help") => Command::Help,
            Some("-V") | Some("--version") => Command::Version,
            Some("score") => Command::Score,
            Some("suggest") => Command::Suggest,
            Some("check") => Command::Check,
            Some("analyze") => Command::Analyze,
            Some("ask") => Command::Ask,
            Some("health") => Command::Health,
            Some(other) => bail!("Unknown command '{}'", other),
        };

        let mut cli = CliArgs {
            command,
            positionals: Vec::new(),
            tlds: Vec::new(),
            max_results: DEFAULT_MAX_RESULTS,
            trend: PriceTrend::default(),
            provider: None,
            approval: false,
            json: false,
            verbose: false,
        };

        let mut rest = args.iter().skip(1);
        while let Some(arg) = rest.next() {
            match arg.as_str() {
                "--tld" | "-t" => {
                    let value = rest.next().context("--tld needs a value")?;
                    cli.tlds
                        .extend(nxd_engine::domain::validator::utils::parse_tld_input(value));
                }
                "--max" | "-n" => {
                    let value = rest.next().context("--max needs a value")?;
                    cli.max_results = value
                        .parse()
                        .with_context(|| format!("--max expects a number, got '{}'", value))?;
                }
                "--trend" => {
                    cli.trend = rest.next().context("--trend needs a value")?.parse()?;
                }
                "--provider" | "-p" => {
                    cli.provider = Some(rest.next().context("--provider needs a value")?.clone());
                }
                "--approval" => cli.approval = true,
                "--json" => cli.json = true,
                "--verbose" | "-v" => cli.verbose = true,
                "-h" | "--help" => cli.command = Command::Help,
                flag if flag.starts_with('-') && flag.len() > 1 => bail!("Unknown option '{}'", flag),
                _ => cli.positionals.push(arg.clone()),
            }
        }

        Ok(cli)
    }

    fn first_tld(&self) -> &str {
        self.tlds.first().map(String::as_str).unwrap_or(DEFAULT_TLD)
    }

    fn positional(&self, what: &str) -> anyhow::Result<&str> {
        self.positionals
            .first()
            .map(String::as_str)
            .ok_or_else(|| anyhow!("Missing {}", what))
    }
}

/// Returns the process exit code
async fn run(cli: CliArgs) -> anyhow::Result<i32> {
    nxd_engine::init()?;

    match cli.command {
        Command::Score => run_score(&cli),
        Command::Suggest => run_suggest(&cli).await,
        Command::Check => run_check(&cli).await,
        Command::Analyze => run_analyze(&cli),
        Command::Ask => run_ask(&cli).await,
        Command::Health => run_health(&cli).await,
        Command::Help | Command::Version => Ok(0),
    }
}

fn run_score(cli: &CliArgs) -> anyhow::Result<i32> {
    let scorer = DomainScorer::default();
    let tld = cli.first_tld();

    if cli.positionals.is_empty() {
        bail!("Missing name to score");
    }

    let mut exit_code = 0;
    for (name, result) in cli
        .positionals
        .iter()
        .zip(scorer.score_batch(&cli.positionals, tld))
    {
        match result {
            Ok(score) if cli.json => println!("{}", serde_json::to_string_pretty(&score)?),
            Ok(score) => display_score(&score, tld),
            Err(e @ NxdError::UnsupportedTld { .. }) => return Err(e.into()),
            Err(e) => {
                eprintln!("{}", e.user_message());
                tracing::debug!(name = %name, error = %e, "Name rejected");
                exit_code = 1;
            }
        }
    }

    Ok(exit_code)
}

async fn run_suggest(cli: &CliArgs) -> anyhow::Result<i32> {
    let query = cli.positionals.join(" ");
    if query.trim().is_empty() {
        bail!("Missing search query");
    }

    let engine = build_engine()?;
    let spinner = spinner(format!("Searching suggestions for \"{}\"...", query));
    let suggestions = engine.suggest(&query, &cli.tlds, cli.max_results).await;
    spinner.finish_and_clear();
    let suggestions = suggestions?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
    } else {
        display_suggestions(&query, &suggestions);
    }

    Ok(0)
}

async fn run_check(cli: &CliArgs) -> anyhow::Result<i32> {
    let input = cli.positional("domain name to check")?;
    let (name, tld) = nxd_engine::domain::DomainValidator::new()
        .split_domain(input, cli.first_tld())?;

    let engine = build_engine()?;
    let spinner = spinner(format!("Checking {}...", name.qualified(&tld)));
    let report = engine.check(name.as_str(), &tld).await;
    spinner.finish_and_clear();
    let report = report?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display_report(&report);
    }

    Ok(0)
}

fn run_analyze(cli: &CliArgs) -> anyhow::Result<i32> {
    let input = cli.positional("domain name to analyze")?;
    let (name, tld) = nxd_engine::domain::DomainValidator::new()
        .split_domain(input, cli.first_tld())?;

    let analysis = build_engine()?.analyze(name.as_str(), &tld, cli.trend)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        display_analysis(&analysis);
    }

    Ok(0)
}

async fn run_ask(cli: &CliArgs) -> anyhow::Result<i32> {
    let operation: OperationType = cli.positional("operation")?.parse()?;
    let preferred = cli
        .provider
        .as_deref()
        .map(str::parse::<ProviderId>)
        .transpose()?;
    let context = parse_context(&cli.positionals[1..])?;

    let gateway = build_gateway()?;
    let request = OperationRequest::new(operation, context).requires_approval(cli.approval);

    let spinner = spinner(format!("Asking AI providers ({})...", operation));
    let response = gateway.invoke(&request, preferred).await;
    spinner.finish_and_clear();
    let response = response?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        display_response(&response);
    }

    Ok(if response.success { 0 } else { 3 })
}

async fn run_health(cli: &CliArgs) -> anyhow::Result<i32> {
    let engine = build_engine()?;
    let gateway = build_gateway()?;

    let spinner = spinner("Running domain engine self-test and probing AI providers...".to_string());
    let (engine_health, gateway_health) =
        tokio::join!(engine.health_check(), gateway.health_check());
    spinner.finish_and_clear();

    if cli.json {
        let report = json!({ "engine": engine_health, "gateway": gateway_health });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display_engine_health(&engine_health);
        display_health(&gateway_health);
    }

    Ok(if engine_health.healthy && gateway_health.healthy { 0 } else { 1 })
}

fn build_engine() -> anyhow::Result<SuggestionEngine> {
    let settings = Settings::from_env()?;
    Ok(SuggestionEngine::new(
        Arc::new(TldTable::default()),
        Arc::new(RegistryOracle::new()),
        settings.suggest,
    ))
}

/// Every known provider is registered; ones without a key fail fast and
/// the gateway moves on
fn build_gateway() -> anyhow::Result<AiGateway> {
    let settings = Settings::from_env()?;

    let configured: Vec<&str> = settings.configured_providers().map(|p| p.id.as_str()).collect();
    if configured.is_empty() {
        tracing::warn!(
            providers = %available_providers().join(", "),
            "No AI provider API keys configured"
        );
    } else {
        tracing::info!(providers = %configured.join(", "), "AI providers configured");
    }

    Ok(AiGateway::from_configs(settings.gateway, &settings.providers)?)
}

/// `key=value` pairs; values that parse as JSON keep their type
fn parse_context(pairs: &[String]) -> anyhow::Result<OperationContext> {
    let mut context = OperationContext::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("Context entries must look like key=value, got '{}'", pair))?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        context.insert(key.trim().to_string(), value);
    }
    Ok(context)
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn display_score(score: &ScoreBreakdown, tld: &str) {
    println!();
    println!("📊 {}.{}", score.name, tld);
    println!("═══════════════════");
    println!("   Length:        {:>6.2}", score.length_score);
    println!("   Brandability:  {:>6.2}", score.brandability_score);
    println!("   Keywords:      {:>6.2}", score.keyword_score);
    println!("   Memorability:  {:>6.2}", score.memorability_score);
    println!("   ─────────────────────");
    println!("   Overall:       {:>6.2} ({})", score.overall_score, score.category());
    println!("   Market value:  {:.4} ETH", score.market_value);
    if !score.reasons.is_empty() {
        println!();
        for reason in &score.reasons {
            println!("   💡 {}", reason);
        }
    }
    println!();
}

fn display_suggestions(query: &str, suggestions: &[DomainSuggestion]) {
    println!();
    if suggestions.is_empty() {
        println!("😔 No available suggestions for \"{}\"", query);
        return;
    }

    println!("🎨 Suggestions for \"{}\" ({}):", query, suggestions.len());
    println!("═══════════════════");
    for (i, suggestion) in suggestions.iter().enumerate() {
        println!(
            "{:2}. {:<24} {:>6.2}  {:<8}  ~{:.4} ETH",
            i + 1,
            suggestion.full_domain,
            suggestion.overall_score(),
            suggestion.category,
            suggestion.estimated_value
        );
    }
    println!();
}

fn display_report(report: &AvailabilityReport) {
    println!();
    if report.available {
        println!("✅ {} - AVAILABLE", report.full_domain);
        if let Some(score) = &report.score {
            println!(
                "   📊 Score: {:.2} ({})",
                score.overall_score,
                score.category()
            );
        }
    } else {
        println!("❌ {} - TAKEN", report.full_domain);
    }

    let pricing = &report.pricing;
    println!(
        "   💰 Registration: {:.4} ETH{}  Renewal: {:.4} ETH",
        pricing.registration_eth,
        if pricing.is_premium { " (premium)" } else { "" },
        pricing.renewal_eth
    );

    if !report.alternatives.is_empty() {
        println!();
        println!("💡 Alternatives (up to {}):", MAX_ALTERNATIVES);
        for alt in &report.alternatives {
            println!("   • {:<24} {:>6.2}  {}", alt.full_domain, alt.overall_score(), alt.category);
        }
    }
    println!();
}

fn display_analysis(analysis: &MarketAnalysis) {
    let prices = &analysis.price_recommendations;
    println!();
    println!("📈 Market analysis: {}", analysis.full_domain);
    println!("═══════════════════");
    println!(
        "   Score:           {:.2} ({})",
        analysis.score.overall_score,
        analysis.score.category()
    );
    println!("   Market value:    {:.4} ETH", analysis.score.market_value);
    println!("   Price trend:     {}", analysis.price_trend);
    println!("   ─────────────────────");
    println!("   Listing price:   {:.4} ETH", prices.suggested_listing_price);
    println!("   Minimum offer:   {:.4} ETH", prices.minimum_acceptable_price);
    println!("   Premium price:   {:.4} ETH", prices.premium_price);
    println!("   ─────────────────────");
    println!("   Investment:      {}", analysis.investment_potential);
    println!("   Liquidity:       {}", analysis.liquidity_estimate);
    println!();
}

fn display_response(response: &GatewayResponse) {
    println!();
    match response.provider {
        Some(provider) => {
            let via = if response.fallback_used { " (fallback)" } else { "" };
            println!("🤖 {} answered by {}{}", response.operation, provider, via);
        }
        None => println!("⚠️  {}: all AI providers failed", response.operation),
    }
    println!("═══════════════════");
    println!("{}", response.response);
    println!();
    for attempt in &response.attempts {
        let status = if attempt.succeeded { "✅" } else { "❌" };
        print!("   {} {} ({}ms)", status, attempt.provider, attempt.duration_ms);
        if let Some(error) = &attempt.error {
            print!(" - {}", error);
        }
        println!();
    }
    println!("   📝 Decision log id: {}", response.log_id);
}

fn display_engine_health(health: &EngineHealth) {
    println!();
    println!(
        "🩺 Domain engine: {}",
        if health.healthy { "healthy" } else { "unavailable" }
    );
    println!("═══════════════════");
    println!("   🔎 Oracle: {}", health.oracle);
    println!("   🌐 TLDs: {}", health.supported_tlds.join(", "));
    if let Some(score) = health.test_score {
        println!("   📊 Test score: {:.2}", score);
    }
    println!("   🎨 Test suggestions: {}", health.test_suggestions);
    if let Some(error) = &health.error {
        println!("   ❌ {}", error);
    }
}

fn display_health(health: &GatewayHealth) {
    println!();
    println!(
        "🩺 AI gateway: {}",
        if health.healthy { "healthy" } else { "unavailable" }
    );
    println!("═══════════════════");
    for (provider, status) in &health.providers {
        match status {
            ProviderHealth::Healthy => println!("   ✅ {}", provider),
            ProviderHealth::Degraded => println!("   ⚠️  {} (degraded)", provider),
            ProviderHealth::Error(e) => println!("   ❌ {} - {}", provider, e),
        }
    }
    println!("   📝 Decision log entries: {}", health.decision_log_count);
    println!();
}

/// Print help information
fn print_help() {
    println!("🔷 NXD Engine - domain scoring and AI decision gateway");
    println!("═══════════════════════════════════════════════════");
    println!();
    println!("USAGE:");
    println!("    nxd-engine score <NAME>... [--tld TLD] [--json]");
    println!("    nxd-engine suggest <QUERY> [--tld TLD]... [--max N] [--json]");
    println!("    nxd-engine check <NAME[.TLD]> [--tld TLD] [--json]");
    println!("    nxd-engine analyze <NAME[.TLD]> [--trend increasing|stable|decreasing] [--json]");
    println!("    nxd-engine ask <OPERATION> [KEY=VALUE]... [--provider P] [--approval] [--json]");
    println!("    nxd-engine health [--json]");
    println!();
    println!("OPERATIONS:");
    println!("    {}", OperationType::names().join(", "));
    println!();
    println!("TLDS:");
    println!("    {}", TldTable::default().tlds().join(", "));
    println!();
    println!("ENVIRONMENT VARIABLES:");
    for provider in ProviderId::ALL {
        println!(
            "    {:<20} {} API key (model: {}, default {})",
            provider.api_key_var(),
            provider,
            provider.model_var(),
            provider.default_model()
        );
    }
    println!("    NXD_AI_ATTEMPT_TIMEOUT_SECS   per-provider timeout (default 20)");
    println!("    NXD_AI_TOTAL_TIMEOUT_SECS     whole failover chain timeout (default 60)");
    println!("    NXD_DECISION_LOG_CAPACITY     decision log size (default 1000)");
    println!("    NXD_ORACLE_CONCURRENCY        parallel availability checks (default 10)");
    println!("    NXD_ORACLE_TIMEOUT_SECS       availability check timeout (default 5)");
    println!("    RUST_LOG                      log filter (default nxd_engine=info)");
}
