//! # TRDB Server
//!
//! Entry point for the **TRDB** database server: loads configuration,
//! installs logging, builds the storage stack, and runs a minimal
//! line-oriented request loop exercising a B-tree index over it.

use btree::{BTree, Datum, IndexDescriptor, KeySchema, RecordId};
use std::cmp::Ordering;
use std::io::{self, BufRead, Write};
use trdb::config::EngineConfig;
use trdb::engine_environment::EngineEnvironment;

/// The demo index's key schema: a single `i64` field. The real system would
/// derive a `KeySchema` per indexed column from its catalog; this binary
/// only needs one to exercise the tree end to end.
struct DemoSchema;

impl KeySchema for DemoSchema {
    fn num_fields(&self) -> usize {
        1
    }

    fn write_payload(&self, values: &[Datum], out: &mut Vec<u8>) {
        let Datum::Int(v) = values[0] else {
            panic!("DemoSchema only supports Datum::Int keys")
        };
        out.extend_from_slice(&v.to_le_bytes());
    }

    fn disassemble_payload(&self, bytes: &[u8]) -> Vec<Datum> {
        vec![Datum::Int(i64::from_le_bytes(bytes.try_into().expect("8-byte key payload")))]
    }

    fn compare_field(&self, _index: usize, a: &Datum, b: &Datum) -> Ordering {
        let (Datum::Int(a), Datum::Int(b)) = (a, b) else {
            panic!("DemoSchema only supports Datum::Int keys")
        };
        a.cmp(b)
    }
}

const DEMO_FILE_ID: u32 = 1;

fn main() {
    let cfg = match EngineConfig::load_from_file("trdb.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let _logging_guard = trdb::init_logging(&cfg.storage.logs_dir).unwrap_or_else(|e| {
        eprintln!("failed to initialize logging: {e}");
        std::process::exit(2);
    });

    let env = EngineEnvironment::new(cfg);
    env.register_file(DEMO_FILE_ID, "index.tbl");

    let tree = BTree::create(
        env.storage.clone(),
        IndexDescriptor {
            file_id: DEMO_FILE_ID,
            unique: true,
        },
        DemoSchema,
    )
    .expect("failed to initialize demo index");

    tracing::info!("trdb ready; commands: insert <key>, delete <key>, scan, quit");
    run_request_loop(&tree);
    tracing::info!("shutdown complete");
}

/// Reads one command per line from stdin until EOF or `quit`, dispatching
/// each to the index and printing the result. This stands in for the real
/// query-execution layer, which is out of this repository's scope.
fn run_request_loop<F: file::api::FileManager>(tree: &BTree<F, DemoSchema>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let response = match command {
            "insert" => match parts.next().and_then(|s| s.parse::<i64>().ok()) {
                Some(key) => handle_insert(tree, key),
                None => "ERR usage: insert <i64>".to_string(),
            },
            "delete" => match parts.next().and_then(|s| s.parse::<i64>().ok()) {
                Some(key) => handle_delete(tree, key),
                None => "ERR usage: delete <i64>".to_string(),
            },
            "scan" => handle_scan(tree),
            "quit" | "exit" => break,
            other => format!("ERR unknown command {other:?}"),
        };

        let _ = writeln!(stdout, "{response}");
    }
}

fn handle_insert<F: file::api::FileManager>(tree: &BTree<F, DemoSchema>, key: i64) -> String {
    let recid = RecordId::new(DEMO_FILE_ID, key as u32, 1);
    match tree.insert_key(&[Datum::Int(key)], recid) {
        Ok(true) => format!("OK inserted {key}"),
        Ok(false) => format!("DUPLICATE {key}"),
        Err(e) => format!("ERR {e}"),
    }
}

fn handle_delete<F: file::api::FileManager>(tree: &BTree<F, DemoSchema>, key: i64) -> String {
    match tree.delete_key(&[Datum::Int(key)], None) {
        Ok(Some(recid)) => format!("OK deleted {key} (was {recid:?})"),
        Ok(None) => format!("NOTFOUND {key}"),
        Err(e) => format!("ERR {e}"),
    }
}

fn handle_scan<F: file::api::FileManager>(tree: &BTree<F, DemoSchema>) -> String {
    let mut it = match tree.start_scan(None, false, None, false) {
        Ok(it) => it,
        Err(e) => return format!("ERR {e}"),
    };

    let mut keys = Vec::new();
    while it.is_at_valid_item() {
        match it.current_item() {
            Ok(payload) => {
                let values = tree.key_schema().disassemble_payload(&payload);
                if let Datum::Int(v) = values[0] {
                    keys.push(v.to_string());
                }
            }
            Err(e) => return format!("ERR {e}"),
        }
        match it.next() {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => return format!("ERR {e}"),
        }
    }
    format!("OK [{}]", keys.join(", "))
}
