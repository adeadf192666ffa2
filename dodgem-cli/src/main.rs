//! Dodgem command line
//!
//! Compiles a source file (or the bundled demo unit) entirely in memory,
//! constructs an instance, and invokes one method. `--dump-bytecode`
//! prints the compiled image as JSON instead of running it.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde_json::json;

use dodgem_api::{compile_and_load, global, init, RunConfig, TypeHandle, Value};
use dodgem_core::{ClassImage, MethodImage, OpCode};
use dodgem_log::{Level, Logger, StderrSink};
use dodgem_vfs::{NativeFileSystem, VirtualFileSystem};

const DEMO_UNIT: &str = "com.stellariver.dodgem.Student";
const DEMO_SOURCE: &str = r#"package com.stellariver.dodgem;
class Student {
    var name;
    init() { this.name = "work"; }
    fn testPrint() { print this.name; }
}
"#;

#[derive(Parser)]
#[command(
    name = "dodgem",
    version,
    about = "Compile and run Dodgem classes entirely in memory"
)]
struct Cli {
    /// Source file to compile; the bundled demo runs when omitted
    source: Option<PathBuf>,

    /// Unit name (package.Class) the source declares; required with a
    /// source file
    #[arg(long)]
    name: Option<String>,

    /// Method to invoke after construction
    #[arg(long, default_value = "testPrint")]
    invoke: String,

    /// Print the compiled bytecode as JSON instead of invoking
    #[arg(long)]
    dump_bytecode: bool,

    /// Log each pipeline step
    #[arg(long)]
    show_steps: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let level = parse_level(&cli.log_level)
        .ok_or_else(|| format!("unknown log level '{}'", cli.log_level))?;
    let logger = Logger::new(level).with_sink(StderrSink);

    let (unit_name, source_text) = match &cli.source {
        Some(path) => {
            let name = cli
                .name
                .clone()
                .ok_or_else(|| "--name is required with a source file".to_string())?;
            let bytes = NativeFileSystem::new()
                .read_file(path)
                .map_err(|err| format!("cannot read {}: {err}", path.display()))?;
            let text = String::from_utf8(bytes)
                .map_err(|_| format!("{} is not valid UTF-8", path.display()))?;
            (name, text)
        }
        None => (DEMO_UNIT.to_string(), DEMO_SOURCE.to_string()),
    };

    let mut config = RunConfig::with_logger(logger);
    config.show_steps = cli.show_steps;
    // First install wins; later calls in the same process reuse it
    let _ = init(config);
    let config = global();

    let handle =
        compile_and_load(&unit_name, &source_text, config).map_err(|err| err.to_string())?;
    for warning in handle.warnings().iter() {
        eprintln!("{}: {warning}", warning.unit_name);
    }

    if cli.dump_bytecode {
        let rendered = serde_json::to_string_pretty(&bytecode_json(handle.image()))
            .map_err(|err| err.to_string())?;
        println!("{rendered}");
        return Ok(());
    }

    invoke(&handle, &cli.invoke)
}

fn invoke(handle: &TypeHandle, method: &str) -> Result<(), String> {
    let instance = handle.construct(&[]).map_err(|err| err.to_string())?;
    print!("{}", instance.stdout());
    let output = handle
        .invoke(&instance, method, &[])
        .map_err(|err| err.to_string())?;
    print!("{}", output.stdout);
    if output.value != Value::Null {
        println!("=> {}", output.value);
    }
    Ok(())
}

fn parse_level(text: &str) -> Option<Level> {
    let level = match text.to_ascii_lowercase().as_str() {
        "trace" => Level::Trace,
        "debug" => Level::Debug,
        "info" => Level::Info,
        "warn" => Level::Warn,
        "error" => Level::Error,
        _ => return None,
    };
    Some(level)
}

fn bytecode_json(image: &ClassImage) -> serde_json::Value {
    let methods: Vec<_> = image
        .ctor
        .iter()
        .chain(image.methods.iter())
        .map(method_json)
        .collect();
    json!({
        "class": image.fqn,
        "fields": image.fields,
        "methods": methods,
    })
}

fn method_json(method: &MethodImage) -> serde_json::Value {
    let constants: Vec<String> = method
        .chunk
        .constants
        .iter()
        .map(|value| value.to_string())
        .collect();

    let mut instructions = Vec::new();
    let code = &method.chunk.code;
    let mut ip = 0;
    while ip < code.len() {
        let offset = ip;
        let Some(op) = OpCode::from_u8(code[ip]) else {
            instructions.push(json!({ "offset": offset, "op": "???", "byte": code[ip] }));
            ip += 1;
            continue;
        };
        ip += 1;
        let operands: Vec<u8> = code[ip..(ip + op.operand_size()).min(code.len())].to_vec();
        ip += op.operand_size();
        instructions.push(json!({
            "offset": offset,
            "op": op.name(),
            "operands": operands,
        }));
    }

    json!({
        "name": method.name,
        "arity": method.arity,
        "locals": method.local_count,
        "constants": constants,
        "instructions": instructions,
    })
}
