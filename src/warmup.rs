use std::fs;
use std::panic;
use std::path::Path;
use std::str::FromStr;
use std::sync::Once;

use rayon::prelude::*;
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::model::Record;
use crate::response::{records_response, ProxyRequest};

static INIT: Once = Once::new();

pub type WarmupResult = Result<(), String>;

#[derive(Clone, Copy)]
pub struct WarmupUnit {
    pub name: &'static str,
    pub run: fn() -> WarmupResult,
}

// Code paths the first request would otherwise pay for
pub static CATALOG: &[WarmupUnit] = &[
    WarmupUnit {
        name: "priming::record",
        run: warm_record,
    },
    WarmupUnit {
        name: "priming::response",
        run: warm_response,
    },
    WarmupUnit {
        name: "serde_json::de",
        run: warm_request_decoding,
    },
    WarmupUnit {
        name: "uuid::parse",
        run: warm_uuid,
    },
    WarmupUnit {
        name: "tokio_postgres::config",
        run: warm_pg_config,
    },
];

const SAMPLE_ID: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

fn warm_record() -> WarmupResult {
    Record::from_text(Some(SAMPLE_ID), Some("warmup"), Some("warmup"))
        .map(drop)
        .map_err(|e| e.to_string())
}

fn warm_response() -> WarmupResult {
    let id = Uuid::parse_str(SAMPLE_ID).map_err(|e| e.to_string())?;
    let response = records_response(&[Record::new(id, "warmup", "warmup")]);
    match response.status_code {
        200 => Ok(()),
        status => Err(format!("unexpected status {}", status)),
    }
}

fn warm_request_decoding() -> WarmupResult {
    let raw = json!({
        "httpMethod": "GET",
        "path": "/priming",
        "headers": { "accept": "application/json" },
    });
    serde_json::from_value::<ProxyRequest>(raw)
        .map(drop)
        .map_err(|e| e.to_string())
}

fn warm_uuid() -> WarmupResult {
    let id = Uuid::parse_str(SAMPLE_ID).map_err(|e| e.to_string())?;
    let _ = id.hyphenated().to_string();
    Ok(())
}

fn warm_pg_config() -> WarmupResult {
    tokio_postgres::Config::from_str("postgresql://postgres@localhost:5432/priming")
        .map(drop)
        .map_err(|e| e.to_string())
}

/// Unit names to warm, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarmupPlan {
    names: Vec<String>,
}

impl WarmupPlan {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// One name per line; blank lines and `#` comments are ignored. JVM
    /// class-load trace lines (`[class,load] NAME source: ...`) contribute
    /// NAME.
    pub fn parse(manifest: &str) -> Self {
        let names = manifest
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| match line.find("[class,load] ") {
                Some(start) => {
                    let rest = &line[start + "[class,load] ".len()..];
                    rest.find(" source: ").map(|end| rest[..end].trim().to_string())
                }
                None => Some(line.to_string()),
            })
            .filter(|name| !name.is_empty())
            .collect();

        Self { names }
    }

    /// Reads a manifest file. A missing or unreadable file is logged and
    /// yields an empty plan.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(manifest) => Self::parse(&manifest),
            Err(e) => {
                error!(path = %path.display(), "failed to read warm-up manifest: {}", e);
                Self::default()
            }
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarmupReport {
    pub executed: Vec<&'static str>,
    pub unknown: Vec<String>,
    pub failed: Vec<&'static str>,
}

// Size the Rayon global pool once per environment; a pool built earlier wins
pub fn init_thread_pool(workers: usize) {
    INIT.call_once(|| {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build_global()
        {
            debug!(workers, "warm-up pool size ignored: {}", e);
        }
    });
}

pub fn preload(plan: &WarmupPlan, workers: usize) -> WarmupReport {
    preload_from(CATALOG, plan, workers)
}

// Never fails: unknown names, errors and panics land in the report
pub fn preload_from(catalog: &[WarmupUnit], plan: &WarmupPlan, workers: usize) -> WarmupReport {
    info!(units = plan.names().len(), workers, "preload started");
    init_thread_pool(workers);

    let mut report = WarmupReport::default();
    let mut selected: Vec<WarmupUnit> = Vec::new();

    for name in plan.names() {
        match catalog.iter().find(|unit| unit.name == name.as_str()) {
            Some(unit) if selected.iter().any(|s| s.name == unit.name) => {}
            Some(unit) => selected.push(*unit),
            None => {
                warn!(unit = %name, "unknown warm-up unit, skipping");
                report.unknown.push(name.clone());
            }
        }
    }

    let outcomes: Vec<(&'static str, bool)> = selected
        .par_iter()
        .map(|unit| (unit.name, run_unit(unit)))
        .collect();

    for (name, ok) in outcomes {
        if ok {
            report.executed.push(name);
        } else {
            report.failed.push(name);
        }
    }

    info!(
        executed = report.executed.len(),
        unknown = report.unknown.len(),
        failed = report.failed.len(),
        "preload finished"
    );
    report
}

fn run_unit(unit: &WarmupUnit) -> bool {
    match panic::catch_unwind(unit.run) {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(unit = unit.name, "warm-up unit failed, ignoring: {}", e);
            false
        }
        Err(_) => {
            warn!(unit = unit.name, "warm-up unit panicked, ignoring");
            false
        }
    }
}
