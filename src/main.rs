//! claude-reconcile - Permission rule reconciler for Claude Code settings
//!
//! Reads the three settings layers, reports duplicates, conflicts, and
//! safe consolidation proposals. Never modifies the settings files.
//!
//! # Usage
//!
//! ```bash
//! # Reconcile the standard settings files
//! claude-reconcile --user ~/.claude/settings.json \
//!     --shared .claude/settings.json --local .claude/settings.local.json
//!
//! # Or pipe a combined JSON document on stdin
//! echo '{"project_shared":{"allow":["Bash(git diff)"]}}' | claude-reconcile
//!
//! # Human-readable summary instead of JSON
//! claude-reconcile --pretty < input.json
//! ```

use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

use claude_reconcile::{
    audit::AuditLogger,
    config::Config,
    engine::Reconciler,
    input::ReconcileInput,
};

/// Print version information
fn print_version() {
    println!("claude-reconcile {}", env!("CARGO_PKG_VERSION"));
}

/// Print help message
fn print_help() {
    println!(
        r#"claude-reconcile - Permission rule reconciler for Claude Code settings

USAGE:
    claude-reconcile [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -v, --version           Print version information
    -c, --config PATH       Path to config file
        --user PATH         User settings file (~/.claude/settings.json)
        --shared PATH       Project settings file (.claude/settings.json)
        --local PATH        Local settings file (.claude/settings.local.json)
    -p, --pretty            Human-readable summary instead of JSON

With no path options, a combined JSON document is read from stdin:
    {{"user": {{...}}, "project_shared": {{...}}, "project_local": {{...}}}}
where each scope is a permissions object with allow/ask/deny lists.
Missing scopes and missing lists are treated as empty.

ENVIRONMENT:
    RECONCILE_MEDIUM_OK=1   Confirmation signal for medium-tier proposals
    RECONCILE_NO_AUDIT=1    Disable the audit log for this run
"#
    );
}

/// Parse command line arguments
struct Args {
    help: bool,
    version: bool,
    config_path: Option<String>,
    user: Option<String>,
    shared: Option<String>,
    local: Option<String>,
    pretty: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut result = Args {
            help: false,
            version: false,
            config_path: None,
            user: None,
            shared: None,
            local: None,
            pretty: false,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "-h" | "--help" => result.help = true,
                "-v" | "--version" => result.version = true,
                "-p" | "--pretty" => result.pretty = true,
                "-c" | "--config" => {
                    if i + 1 < args.len() {
                        i += 1;
                        result.config_path = Some(args[i].clone());
                    }
                }
                "--user" => {
                    if i + 1 < args.len() {
                        i += 1;
                        result.user = Some(args[i].clone());
                    }
                }
                "--shared" => {
                    if i + 1 < args.len() {
                        i += 1;
                        result.shared = Some(args[i].clone());
                    }
                }
                "--local" => {
                    if i + 1 < args.len() {
                        i += 1;
                        result.local = Some(args[i].clone());
                    }
                }
                arg if arg.starts_with("--config=") => {
                    result.config_path = Some(arg.trim_start_matches("--config=").to_string());
                }
                arg if arg.starts_with("--user=") => {
                    result.user = Some(arg.trim_start_matches("--user=").to_string());
                }
                arg if arg.starts_with("--shared=") => {
                    result.shared = Some(arg.trim_start_matches("--shared=").to_string());
                }
                arg if arg.starts_with("--local=") => {
                    result.local = Some(arg.trim_start_matches("--local=").to_string());
                }
                _ => {}
            }
            i += 1;
        }

        result
    }

    fn has_paths(&self) -> bool {
        self.user.is_some() || self.shared.is_some() || self.local.is_some()
    }
}

fn main() {
    let args = Args::parse();

    // Handle help and version
    if args.help {
        print_help();
        return;
    }

    if args.version {
        print_version();
        return;
    }

    // Load configuration
    let config = if let Some(ref path) = args.config_path {
        Config::load_from(Path::new(path)).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config from {}: {}", path, e);
            Config::default()
        })
    } else {
        Config::load()
    };

    // Gather the input: settings files, or a combined document on stdin
    let input = if args.has_paths() {
        let to_path = |s: &Option<String>| s.as_ref().map(|p| Path::new(p.as_str()).to_path_buf());
        let user = to_path(&args.user);
        let shared = to_path(&args.shared);
        let local = to_path(&args.local);
        match ReconcileInput::load(user.as_deref(), shared.as_deref(), local.as_deref()) {
            Ok(input) => input,
            Err(e) => {
                eprintln!("Error: Failed to read settings files: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        let stdin = io::stdin();
        let mut input_json = String::new();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => input_json.push_str(&line),
                Err(_) => break,
            }
        }

        if input_json.trim().is_empty() {
            // No input = nothing to reconcile
            ReconcileInput::default()
        } else {
            match ReconcileInput::from_json(&input_json) {
                Ok(input) => input,
                Err(e) => {
                    eprintln!("Error: Failed to parse input: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    // Run the reconciler
    let engine = Reconciler::new(config.clone());
    let rule_count = input.len();
    let report = engine.reconcile(&input);

    // Log the run
    let audit_disabled = env::var("RECONCILE_NO_AUDIT").is_ok();
    let audit_path = if config.general.audit_log && !audit_disabled {
        config.audit_path()
    } else {
        None
    };
    let mut logger = AuditLogger::new(audit_path.as_deref());
    if let Err(e) = logger.log_report(rule_count, &report) {
        eprintln!("Warning: Failed to write audit log: {}", e);
    }

    // Write the report to stdout
    let out = if args.pretty {
        report.render_text()
    } else {
        report.to_json_pretty()
    };
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let _ = writeln!(handle, "{}", out);
    let _ = handle.flush();
}
