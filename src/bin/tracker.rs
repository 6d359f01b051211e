// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use std::error::Error;
use std::fs::{self, File};
use std::io::{self, Write};

use clap::{arg, AppSettings, Arg, Command};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
//
use tracker::engine::{CapstoneDecoder, Engine, PtraceProcess, Syntax};
use tracker::probe::{Executable, ProbeError};
use tracker::store::DEFAULT_STORE_SIZE;

fn main() -> Result<(), Box<dyn Error>> {
    // Parse command-line arguments
    let matches = Command::new("tracker")
        .about("Trace the execution of EXEC on the given arguments ARGS")
        .version("0.1.0")
        .setting(AppSettings::TrailingVarArg)
        .arg(arg!(-o --output <FILE> "write result to FILE").required(false))
        .arg(arg!(-i --intel "switch to intel syntax (default: at&t)"))
        .arg(arg!(-v --verbose "verbose output"))
        .arg(arg!(-d --debug "debug output"))
        .arg(
            Arg::new("command")
                .value_name("EXEC [ARGS]")
                .required(true)
                .multiple_values(true),
        )
        .get_matches();
    // Extract top-level flags
    let verbose = matches.is_present("verbose");
    let debug = matches.is_present("debug");
    let intel = matches.is_present("intel");
    // Initialise logging
    if debug {
        init_logging(LevelFilter::Debug);
    } else if verbose {
        init_logging(LevelFilter::Info);
    }
    let syntax = if intel { Syntax::Intel } else { Syntax::Att };
    // Open the output sink
    let mut out: Box<dyn Write> = match matches.get_one::<String>("output") {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    };
    // The target and its arguments
    let command: Vec<String> = matches
        .get_many::<String>("command")
        .unwrap()
        .cloned()
        .collect();
    // One engine accumulates the store and the graph across every
    // invocation of this execution.
    let mut engine = Engine::new(DEFAULT_STORE_SIZE)?;
    // Dispatch: an ELF target is traced directly; anything else is
    // read as a batch file of command lines.
    match Executable::probe(&command[0]) {
        Ok(_) => {
            trace_command(&mut engine, &command, syntax, &mut out)?;
        }
        Err(ProbeError::NotElf(_)) | Err(ProbeError::NotExecutable(_)) => {
            let batch = fs::read_to_string(&command[0])?;
            for line in batch.lines() {
                let argv: Vec<String> = line.split_whitespace().map(String::from).collect();
                if argv.is_empty() {
                    continue;
                }
                trace_command(&mut engine, &argv, syntax, &mut out)?;
            }
        }
        Err(e) => return Err(Box::new(e)),
    }
    //
    Ok(())
}

/// Trace one tracee invocation, logging every executed instruction
/// and the end-of-run statistics to `out`.
fn trace_command(
    engine: &mut Engine,
    argv: &[String],
    syntax: Syntax,
    out: &mut dyn Write,
) -> Result<(), Box<dyn Error>> {
    // Perform various checks on the executable file
    let exec = Executable::probe(&argv[0])?;
    log::info!("target '{}' is {}", exec.path().display(), exec.arch());
    if let Some(text) = exec.text() {
        log::info!(".text section at {:#x} ({} bytes)", text.address, text.size);
    }
    log::debug!("sections: {:?}", exec.sections());
    // Display the traced command
    writeln!(out, "tracker: starting to trace '{}'\n", argv.join(" "))?;
    // Initialize the assembly decoder
    let mut decoder = CapstoneDecoder::new(exec.arch(), syntax)?;
    // Fork and trace
    let mut process = PtraceProcess::spawn(argv)?;
    let report = engine.run(&mut process, &mut decoder, out)?;
    engine.write_statistics(out, report.executed)?;
    log::info!("tracee finished with exit code {}", report.exit_code);
    // Summarize the inferred functions so far
    for (fid, entry) in engine.cfg().function_entries().iter().enumerate() {
        let addr = engine.store().get(engine.cfg().node(*entry).instr()).address();
        log::info!(
            "function {}: entry {:#x}, {} nodes",
            fid,
            addr,
            engine.cfg().function_size(fid as u16)
        );
    }
    //
    Ok(())
}

/// Initialise logging using a suitable pattern.
fn init_logging(level: LevelFilter) {
    let encoder = PatternEncoder::new("[{l}] {m}{n}");
    //
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(encoder))
        .build();
    //
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .unwrap();
    //
    let _handle = log4rs::init_config(config).unwrap();
}
