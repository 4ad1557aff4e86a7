use clap::{Parser, Subcommand};
use docbridge::{Bridge, BridgeError, MemoryStore, OperandList, ParamValue, ParsedQuery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct AppConfig {
    seed: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    log_level: Option<String>,
}

fn load_config(cli_cfg: Option<PathBuf>) -> AppConfig {
    // Precedence: CLI > env > config files > defaults
    // 1) Start with defaults
    let mut cfg = AppConfig::default();
    // 2) Environment variables
    if let Ok(s) = std::env::var("DOCBRIDGE_SEED") {
        cfg.seed = Some(PathBuf::from(s));
    }
    if let Ok(s) = std::env::var("DOCBRIDGE_LOG_DIR") {
        cfg.log_dir = Some(PathBuf::from(s));
    }
    if let Ok(s) = std::env::var("DOCBRIDGE_LOG_LEVEL") {
        cfg.log_level = Some(s);
    }
    // 3) Config files fill whatever is still unset
    //    (custom path, ~/.docbridgerc, ~/.config/docbridge.toml, ./docbridge.toml)
    let mut paths: Vec<PathBuf> = vec![];
    if let Some(p) = &cli_cfg {
        paths.push(p.clone());
    }
    if let Ok(p) = std::env::var("DOCBRIDGE_CONFIG") {
        paths.push(PathBuf::from(p));
    }
    if let Ok(home) = std::env::var("USERPROFILE").or_else(|_| std::env::var("HOME")) {
        let home_pb = PathBuf::from(home);
        paths.push(home_pb.join(".docbridgerc"));
        paths.push(home_pb.join(".config").join("docbridge.toml"));
    }
    if let Ok(cur) = std::env::current_dir() {
        paths.push(cur.join("docbridge.toml"));
    }
    for p in paths {
        if p.exists()
            && let Ok(s) = std::fs::read_to_string(&p)
            && let Ok(file_cfg) = toml::from_str::<AppConfig>(&s)
        {
            if cfg.seed.is_none() {
                cfg.seed = file_cfg.seed;
            }
            if cfg.log_dir.is_none() {
                cfg.log_dir = file_cfg.log_dir;
            }
            if cfg.log_level.is_none() {
                cfg.log_level = file_cfg.log_level;
            }
        }
    }
    cfg
}

#[derive(Parser, Debug)]
#[command(name = "docbridge", version, about = "Document-store query bridge CLI", long_about = None)]
struct Cli {
    /// Path to a config file (TOML)
    #[arg(long, help = "Path to a config file (TOML). If omitted, defaults are used.")]
    config: Option<PathBuf>,
    /// Override seed file (takes precedence over config)
    #[arg(
        long,
        help = "Seed JSON file: an object mapping collection names to document arrays. Takes precedence over config/env."
    )]
    seed: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run a query expression against the seeded store; prints NDJSON to stdout")]
    Exec {
        #[arg(help = "Query expression, e.g. people.find({\"age\": {\"$gte\": 21}})")]
        expression: String,
        #[arg(
            long = "param",
            help = "Value substituted for the next '#' marker; repeat once per marker"
        )]
        params: Vec<String>,
        #[arg(
            long,
            value_delimiter = ',',
            help = "Comma-separated field paths to project from each row (e.g., result.name,result.age)"
        )]
        fields: Option<Vec<String>>,
    },
    #[command(about = "Parse a query expression and print its parts without executing it")]
    Parse {
        #[arg(help = "Query expression to parse")]
        expression: String,
    },
    #[command(name = "collections", about = "List collection names in the seeded store")]
    Collections,
}

fn seed_store(path: Option<&PathBuf>) -> Result<MemoryStore, Box<dyn std::error::Error>> {
    let store = MemoryStore::new();
    let Some(path) = path else {
        return Ok(store);
    };
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let serde_json::Value::Object(map) = value else {
        return Err(format!(
            "seed file {} must be a JSON object mapping collection names to arrays",
            path.display()
        )
        .into());
    };
    for (name, docs) in map {
        let serde_json::Value::Array(items) = docs else {
            return Err(format!("seed collection {name} must be a JSON array").into());
        };
        let mut converted = Vec::with_capacity(items.len());
        for item in items {
            let serde_json::Value::Object(obj) = item else {
                return Err(format!("seed collection {name} must contain JSON objects").into());
            };
            converted.push(bson::Document::try_from(obj)?);
        }
        store.seed(&name, converted);
    }
    Ok(store)
}

fn infer_param(raw: &str) -> ParamValue {
    if raw == "null" {
        return ParamValue::Null;
    }
    if raw == "true" {
        return ParamValue::Bool(true);
    }
    if raw == "false" {
        return ParamValue::Bool(false);
    }
    if let Ok(n) = raw.parse::<i64>() {
        return ParamValue::Int(n);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return ParamValue::Float(f);
    }
    ParamValue::String(raw.to_string())
}

fn run_exec(
    store: MemoryStore,
    expression: &str,
    raw_params: &[String],
    fields: Option<Vec<String>>,
) -> Result<(), BridgeError> {
    let params: Vec<ParamValue> = raw_params.iter().map(|s| infer_param(s)).collect();
    let bridge = Bridge::new(store);
    let mut rows = match fields {
        Some(fields) => bridge.execute_with(expression, &params, fields)?,
        None => bridge.execute(expression, &params)?,
    };
    while rows.has_next() {
        let entry = rows.next_entry()?;
        let mut obj = serde_json::Map::new();
        for (column, value) in entry.iter() {
            let rendered = match value {
                Some(v) => serde_json::Value::String(v.to_string()),
                None => serde_json::Value::Null,
            };
            obj.insert(column.to_string(), rendered);
        }
        println!("{}", serde_json::Value::Object(obj));
    }
    Ok(())
}

fn run_parse(expression: &str) -> Result<(), BridgeError> {
    let parsed = ParsedQuery::parse(expression)?;
    let operands: Vec<serde_json::Value> = match &parsed.operands {
        OperandList::Single(None) => vec![],
        OperandList::Single(Some(operand)) => vec![serde_json::Value::String(operand.clone())],
        OperandList::Split(tokens) => {
            tokens.iter().map(|t| serde_json::Value::String(t.clone())).collect()
        }
    };
    let mut obj = serde_json::Map::new();
    obj.insert("collection".into(), serde_json::Value::String(parsed.collection.clone()));
    obj.insert(
        "operation".into(),
        serde_json::Value::String(parsed.operation.label().to_string()),
    );
    obj.insert("operands".into(), serde_json::Value::Array(operands));
    println!("{}", serde_json::Value::Object(obj));
    Ok(())
}

fn run_collections(store: &MemoryStore) -> Result<(), BridgeError> {
    use docbridge::DocumentStore;
    for name in store.list_collection_names()? {
        println!("{name}");
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let cfg = load_config(cli.config.clone());
    let _ = docbridge::logger::configure(cfg.log_dir.as_deref(), cfg.log_level.as_deref(), None);
    let store = match seed_store(cli.seed.as_ref().or(cfg.seed.as_ref())) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let r = match cli.command {
        Commands::Exec { expression, params, fields } => {
            run_exec(store, &expression, &params, fields)
        }
        Commands::Parse { expression } => run_parse(&expression),
        Commands::Collections => run_collections(&store),
    };
    if let Err(e) = r {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
