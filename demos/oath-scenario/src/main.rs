use std::{path::PathBuf, sync::Arc};

use clap::{Parser as ClapParser, ValueEnum};
use oathcore::{
    base::{
        OathContext,
        api::{ContextCreateInfo, create_context},
        config::{OathConfig, ReleaseOrder},
        global,
    },
    ext::trace::{StdoutSink, TraceSink},
    func_time_counter,
    prelude::*,
};

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// Owner, two nested borrows, released in reverse order.
    Nested,
    /// Two nested borrows released in the wrong order without the strict check.
    OutOfOrder,
    All,
}

#[derive(ClapParser)]
pub struct Arguments {
    /// Scenario to run
    #[arg(value_enum, default_value = "all")]
    scenario: Scenario,

    /// Configuration file (defaults to the usual lookup)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn context_for(config: OathConfig) -> Arc<OathContext> {
    create_context(ContextCreateInfo {
        config,
        violation_hook: None,
        trace_sink: Some(Arc::new(StdoutSink) as Arc<dyn TraceSink>),
    })
}

fn nested_scenario() {
    let owned = Owned::make_owned(42);
    let b1 = owned.borrow();
    println!("depth after b1: {}", owned.depth());
    let b2 = b1.borrow();
    println!("depth after b2: {}", owned.depth());

    let chain: Vec<String> = b2
        .provenance()
        .unwrap_or_default()
        .iter()
        .map(|origin| origin.to_string())
        .collect();
    println!("origin chain: {}", chain.join(" -> "));

    drop(b2);
    drop(b1);
    assert_eq!(owned.depth(), 0);
    assert_eq!(*owned.get(), 42);
}

fn out_of_order_scenario() {
    let config = OathConfig {
        release_order: ReleaseOrder::Unchecked,
        ..global::current().config().clone()
    };
    let arena = Arena::with_context(context_for(config));

    let owned = arena.make_owned(42);
    let b1 = owned.borrow();
    let b2 = b1.borrow();

    // b1 goes first; its own frame stays on the stack.
    drop(b1);
    if let Some(key) = owned.key() {
        for frame in arena.frames(key).unwrap_or_default() {
            println!("remaining frame {} pushed by {}", frame.token, frame.origin);
        }
    }
    drop(b2);
    assert_eq!(owned.depth(), 0);
}

fn main() {
    let args = Arguments::parse();

    let loaded = match &args.config {
        Some(path) => OathConfig::load_from_toml(path),
        None => OathConfig::load_or_default(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Error: {}", error);
            std::process::exit(1);
        }
    };
    global::install(context_for(config));

    let mut results = Vec::new();
    if matches!(args.scenario, Scenario::Nested | Scenario::All) {
        results.push(func_time_counter!(nested_scenario));
    }
    if matches!(args.scenario, Scenario::OutOfOrder | Scenario::All) {
        results.push(func_time_counter!(out_of_order_scenario));
    }

    global::teardown();

    let mut failed = false;
    for result in results {
        match result {
            Ok(duration) => println!("passed in {} ms", duration.as_secs_f64() * 1000.0),
            Err(message) => {
                eprintln!("{}", message);
                failed = true;
            }
        }
    }
    if failed {
        std::process::exit(1);
    }
}
