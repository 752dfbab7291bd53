use libscout::client::ClientConfig;
use libscout::{
    CancelSignal, Config, Credentials, JobResult, OutputFormat, PoolConfig, ScoutError,
    SearchConfig, SearchReport, Searcher, collect_records, sort_records,
};

pub mod handlers;


/// Command-line arguments of `scout images`.
///
/// Every field is optional; unset fields fall back to the loaded config.
#[derive(Debug, Clone, Default)]
pub struct ImagesArgs {
    pub url: Option<String>,
    /// `user` or `user:password`
    pub user: Option<String>,
    pub name: Option<String>,
    pub output: Option<String>,
    pub insecure: bool,
    pub workers: Option<usize>,
    pub rate: Option<u32>,
    pub burst: Option<u32>,
    pub unsorted: bool,
}

/// Settings for one invocation after flags have been layered over the config.
#[derive(Debug, Clone)]
pub struct ResolvedSearch {
    pub search: SearchConfig,
    pub pool: PoolConfig,
    pub timeout_seconds: u64,
}

/// Applies CLI flags on top of the file/environment configuration.
pub fn apply_overrides(config: &mut Config, args: &ImagesArgs) {
    if let Some(url) = &args.url {
        config.search.url = Some(url.clone());
    }
    if let Some(output) = &args.output {
        config.search.output = output.clone();
    }
    if args.insecure {
        config.search.verify_tls = false;
    }
    if let Some(workers) = args.workers {
        config.pool.workers = workers;
    }
    if let Some(rate) = args.rate {
        config.pool.rate_per_second = rate;
    }
    if let Some(burst) = args.burst {
        config.pool.burst = burst;
    }
}

/// Resolves the search settings for `args`, leaving `base` untouched.
pub fn resolve(base: &Config, args: &ImagesArgs) -> libscout::Result<ResolvedSearch> {
    let mut config = base.clone();
    apply_overrides(&mut config, args);

    Ok(ResolvedSearch {
        search: config.search_config()?,
        pool: config.pool_config(),
        timeout_seconds: config.network.timeout,
    })
}

/// Splits `user[:password]` at the first colon.
pub fn split_user(user: &str) -> (&str, Option<&str>) {
    match user.split_once(':') {
        Some((name, password)) => (name, Some(password)),
        None => (user, None),
    }
}

/// Builds credentials from the `--user` flag.
///
/// `prompt` is called for the password when the flag carries only a username.
pub fn resolve_credentials<F>(user: Option<&str>, prompt: F) -> Result<Credentials, String>
where
    F: FnOnce(&str) -> std::io::Result<String>,
{
    let Some(user) = user else {
        return Ok(Credentials::Anonymous);
    };

    let (username, password) = split_user(user);
    if username.is_empty() {
        return Err("Username must not be empty".to_string());
    }

    let password = match password {
        Some(password) => password.to_string(),
        None => prompt(username).map_err(|e| format!("Failed to read password: {}", e))?,
    };

    Ok(Credentials::from_pair(username, &password))
}

/// Runs one search to completion on the current runtime.
///
/// `on_result` sees every result as it arrives. The report keeps arrival
/// order; see [`finish_report`].
pub async fn run_search<F>(
    resolved: &ResolvedSearch,
    credentials: Credentials,
    image_name: Option<&str>,
    cancel: CancelSignal,
    mut on_result: F,
) -> libscout::Result<SearchReport>
where
    F: FnMut(&JobResult),
{
    let searcher = Searcher::with_client_config(
        resolved.search.clone(),
        resolved.pool.clone(),
        ClientConfig::default().with_timeout(resolved.timeout_seconds),
    )?;

    let mut handle = searcher.start(credentials, image_name, cancel)?;
    let mut results = Vec::new();
    while let Some(result) = handle.recv().await {
        on_result(&result);
        results.push(result);
    }

    Ok(collect_records(results))
}

/// Sorts the report for display unless `--unsorted` was given.
pub fn finish_report(mut report: SearchReport, args: &ImagesArgs) -> SearchReport {
    if !args.unsorted {
        sort_records(&mut report.images);
    }
    report
}

/// Process exit code for a finished search.
///
/// A search that produced nothing but failures is an error; partial results
/// with some failures still succeed.
pub fn exit_code(report: &SearchReport, cancelled: bool) -> i32 {
    if cancelled {
        130
    } else if report.images.is_empty() && !report.failures.is_empty() {
        1
    } else {
        0
    }
}

/// One line summarizing the search for stderr.
pub fn summary(report: &SearchReport) -> String {
    let mut line = format!(
        "Found {} tag(s) in {} image(s)",
        report.tag_count(),
        report.images.len()
    );
    if !report.failures.is_empty() {
        line.push_str(&format!(", {} failure(s)", report.failures.len()));
    }
    if report.cancelled > 0 {
        line.push_str(&format!(", {} cancelled", report.cancelled));
    }
    line
}

/// Describes one failure, attributing it to the image and tag when known.
pub fn describe_failure(image: Option<&str>, tag: Option<&str>, error: &ScoutError) -> String {
    match (image, tag) {
        (Some(image), Some(tag)) => format!("{}:{}: {}", image, tag, error),
        (Some(image), None) => format!("{}: {}", image, error),
        _ => format!("catalog: {}", error),
    }
}

/// Whether results should be printed as they arrive.
pub fn streams(args: &ImagesArgs, format: OutputFormat) -> bool {
    args.unsorted && format == OutputFormat::Text
}
