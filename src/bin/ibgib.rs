//! ibgib CLI: hash, validate and create records from the command line
//!
//! Commands:
//!   ibgib hash       <file>                 recompute the gib of a record
//!   ibgib validate   <file>                 validate one record or an array
//!   ibgib fork       <label> [parent-file]  fork a new record
//!   ibgib first-gen  <label> <data-json>    fork + mut8 in one step
//!   ibgib demo                              walk through a small timeline

use ibgib_core::{
    Factory, FirstGenOptions, ForkOptions, Hasher, IbGib, Mut8Options, PrimitiveRegistry,
    ProtocolConfig, Rel8Options, Rel8ns, TjpOptions, TransformResult, Transformer, Validator,
};
use std::env;
use std::fs;
use std::process::ExitCode;

type CliResult = Result<ExitCode, Box<dyn std::error::Error>>;

fn print_usage() {
    println!(
        r#"
ibgib: content-addressed immutable records

Usage: ibgib [--config <file>] <command> [options]

Commands:
  hash      <file>                  Recompute the gib of the record in <file>
  validate  <file>                  Validate a record (or JSON array of records)
  fork      <label> [parent-file]   Fork a new record (from the root by default)
  first-gen <label> <data-json>     Fork from the root and add data in one step
  demo                              Build and validate a small timeline

Examples:
  ibgib fork comment
  ibgib first-gen "comment hi" '{{"text":"hi"}}'
  ibgib --config protocol.json validate records.json
"#
    );
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let config = match take_config(&mut args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("  Bad config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if args.is_empty() {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let hasher = Hasher::with_config(config);
    let result = match args[0].as_str() {
        "hash" => cmd_hash(&hasher, &args[1..]),
        "validate" => cmd_validate(&hasher, &args[1..]),
        "fork" => cmd_fork(&hasher, &args[1..]),
        "first-gen" => cmd_first_gen(&hasher, &args[1..]),
        "demo" => cmd_demo(&hasher),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(ExitCode::SUCCESS)
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            Ok(ExitCode::FAILURE)
        }
    };

    result.unwrap_or_else(|e| {
        eprintln!("  Error: {}", e);
        ExitCode::FAILURE
    })
}

/// Strip `--config <file>` from the args and load it
fn take_config(args: &mut Vec<String>) -> Result<ProtocolConfig, Box<dyn std::error::Error>> {
    let Some(pos) = args.iter().position(|a| a == "--config") else {
        return Ok(ProtocolConfig::default());
    };
    if pos + 1 >= args.len() {
        return Err("--config needs a file path".into());
    }
    let path = args.remove(pos + 1);
    args.remove(pos);
    let text = fs::read_to_string(&path)?;
    let config = ProtocolConfig::from_json_str(&text)?;
    log::info!("loaded protocol config from {}", path);
    Ok(config)
}

fn read_records(path: &str) -> Result<Vec<IbGib>, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let records = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    Ok(records)
}

fn print_result(result: &TransformResult) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&result.new_ibgib)?);
    if let Some(intermediates) = &result.intermediate_ibgibs {
        for record in intermediates {
            log::info!("intermediate {}", record.addr());
        }
    }
    if let Some(dnas) = &result.dnas {
        for dna in dnas {
            log::info!("dna {}", dna.addr());
        }
    }
    Ok(())
}

fn cmd_hash(hasher: &Hasher, args: &[String]) -> CliResult {
    let Some(path) = args.first() else {
        eprintln!("Usage: ibgib hash <file>");
        return Ok(ExitCode::FAILURE);
    };
    let mut all_match = true;
    for record in read_records(path)? {
        let computed = hasher.gib(&record)?;
        let matches = computed == record.gib;
        all_match &= matches;
        println!(
            "  {} {} computed={}",
            if matches { "OK  " } else { "DIFF" },
            record.addr_with(&hasher.config().address_delimiter),
            computed
        );
    }
    Ok(if all_match {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_validate(hasher: &Hasher, args: &[String]) -> CliResult {
    let Some(path) = args.first() else {
        eprintln!("Usage: ibgib validate <file>");
        return Ok(ExitCode::FAILURE);
    };
    let records = read_records(path)?;
    let validator = Validator::new(hasher.clone());
    let report = validator.validate_all(&records);
    println!(
        "\n  Validated {} record(s) with scheme {} / {}",
        records.len(),
        hasher.scheme().name(),
        hasher.digest_name()
    );
    if report.is_empty() {
        println!("  All valid");
        return Ok(ExitCode::SUCCESS);
    }
    for (addr, issues) in &report {
        println!("  {}", addr);
        for issue in issues {
            println!("    - {}", issue);
        }
    }
    Ok(ExitCode::FAILURE)
}

fn cmd_fork(hasher: &Hasher, args: &[String]) -> CliResult {
    let Some(label) = args.first() else {
        eprintln!("Usage: ibgib fork <label> [parent-file]");
        return Ok(ExitCode::FAILURE);
    };
    let parent = match args.get(1) {
        Some(path) => read_records(path)?
            .into_iter()
            .next()
            .ok_or("parent file holds no record")?,
        None => PrimitiveRegistry::root(),
    };
    let transformer = Transformer::new(hasher.clone());
    let result = transformer.fork(
        &parent,
        &ForkOptions {
            dest_ib: Some(label.clone()),
            dna: true,
            ..Default::default()
        },
    )?;
    print_result(&result)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_first_gen(hasher: &Hasher, args: &[String]) -> CliResult {
    if args.len() < 2 {
        eprintln!("Usage: ibgib first-gen <label> <data-json>");
        return Ok(ExitCode::FAILURE);
    }
    let data: serde_json::Value = serde_json::from_str(&args[1])?;
    let data = data
        .as_object()
        .cloned()
        .ok_or("data must be a JSON object")?;
    let factory = Factory::new(Transformer::new(hasher.clone()));
    let result = factory.first_gen(&FirstGenOptions {
        data: Some(data),
        dna: true,
        ..FirstGenOptions::new(args[0].clone(), PrimitiveRegistry::root())
    })?;
    print_result(&result)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_demo(hasher: &Hasher) -> CliResult {
    let transformer = Transformer::new(hasher.clone());
    let factory = Factory::new(transformer.clone());
    let validator = Validator::new(hasher.clone());

    println!("\n  1. first-gen a timeline origin under 'comment'");
    let origin = factory.first_gen(&FirstGenOptions {
        tjp: Some(TjpOptions {
            uuid: true,
            timestamp: true,
        }),
        dna: true,
        n_counter: true,
        ..FirstGenOptions::new("comment demo", factory.primitive("comment")?)
    })?;
    let origin = origin.new_ibgib;
    println!("     {}", origin.summary());

    println!("\n  2. mut8: add text");
    let patch = serde_json::json!({"text": "hello"}).as_object().cloned();
    let step1 = transformer.mut8(
        &origin,
        &Mut8Options {
            data_to_add_or_patch: patch,
            n_counter: true,
            dna: true,
            ..Default::default()
        },
    )?;
    println!("     {}", step1.new_ibgib.summary());

    println!("\n  3. rel8: tag it");
    let mut tags = Rel8ns::new();
    tags.insert("tag".into(), vec![factory.primitive("greeting")?.addr()]);
    let step2 = transformer.rel8(
        &step1.new_ibgib,
        &Rel8Options {
            rel8ns_to_add_by_addr: Some(tags),
            n_counter: true,
            dna: true,
            linked_rel8ns: vec!["tag".into()],
            ..Default::default()
        },
    )?;
    println!("     {}", step2.new_ibgib.summary());

    println!("\n  4. replay the mut8 dna onto the tagged frame");
    let dna = step1
        .dnas
        .as_ref()
        .and_then(|d| d.first())
        .ok_or("mut8 produced no dna")?;
    let replayed = transformer.replay(dna, &step2.new_ibgib)?;
    let same_dna = replayed.dnas.as_ref().and_then(|d| d.first()) == Some(dna);
    println!("     {}", replayed.new_ibgib.summary());
    println!("     regenerated dna identical: {}", same_dna);

    println!("\n  5. validate everything");
    let mut all = vec![origin, step1.new_ibgib, step2.new_ibgib, replayed.new_ibgib];
    for result_dnas in [step1.dnas, step2.dnas, replayed.dnas].into_iter().flatten() {
        all.extend(result_dnas);
    }
    let report = validator.validate_all(&all);
    println!("     {} records, {} with issues", all.len(), report.len());
    for (addr, issues) in &report {
        println!("     {}: {:?}", addr, issues);
    }
    Ok(if report.is_empty() && same_dna {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
