//TODO: update clap to remove the need for this
#![allow(dangerous_implicit_autorefs)]

use std::process;

use anyhow::Context;
use clap::{
    crate_authors, crate_description, crate_name, crate_version, App, AppSettings, Arg, ArgMatches,
    SubCommand,
};
use tape::{create, extract_file, list_file, CompressionMethod, PackOptions, VERSION};

fn value<'a>(matches: &'a ArgMatches<'_>, name: &str) -> anyhow::Result<&'a str> {
    matches
        .value_of(name)
        .with_context(|| format!("missing argument <{}>", name))
}

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> anyhow::Result<()> {
    let method_names: Vec<&str> = CompressionMethod::ALL.iter().map(|m| m.name()).collect();
    let help_compression = format!(
        "Compression method (defaults to '{}')",
        CompressionMethod::default()
    );

    let arg_archive = Arg::with_name("archive")
        .help("Archive file")
        .required(true)
        .value_name("FILE");

    let arg_password = Arg::with_name("password")
        .help("Password the payload is obfuscated with")
        .short("p")
        .long("password")
        .takes_value(true)
        .value_name("PASSWORD");

    let matches = App::new(crate_name!())
        .author(crate_authors!(", "))
        .about(crate_description!())
        .version(crate_version!())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .help("Log more (repeat for debug output)")
                .short("v")
                .long("verbose")
                .multiple(true)
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("tape")
                .alias("t")
                .about("Pack files into a tape")
                .arg(&arg_archive)
                .arg(
                    Arg::with_name("files")
                        .help("Files and directories to pack (use -- before names starting with -)")
                        .required(true)
                        .multiple(true)
                        .value_name("FILES"),
                )
                .arg(
                    Arg::with_name("recursive")
                        .help("Descend into directories")
                        .short("r")
                        .long("recursive"),
                )
                .arg(
                    Arg::with_name("compression")
                        .help(&help_compression)
                        .short("c")
                        .long("compression")
                        .takes_value(true)
                        .possible_values(&method_names)
                        .value_name("METHOD"),
                )
                .arg(&arg_password),
        )
        .subcommand(
            SubCommand::with_name("extract")
                .aliases(&["e", "x"])
                .about("Unpack a tape into a directory")
                .arg(&arg_archive)
                .arg(
                    Arg::with_name("dst")
                        .help("Directory to unpack to (defaults to '.')")
                        .value_name("DIR")
                        .default_value("."),
                )
                .arg(&arg_password),
        )
        .subcommand(
            SubCommand::with_name("list")
                .alias("l")
                .about("List files in a tape")
                .arg(&arg_archive),
        )
        .get_matches();

    let verbosity = matches
        .subcommand()
        .1
        .map_or(0, |sub| sub.occurrences_of("verbose"))
        .max(matches.occurrences_of("verbose"));
    init_logging(verbosity);
    tracing::info!("taper, binary version {}", VERSION);

    if let Some(matches) = matches.subcommand_matches("tape") {
        let mut options = PackOptions::new().recursive(matches.is_present("recursive"));
        if let Some(method) = matches.value_of("compression") {
            options = options.compression(method.parse()?);
        }
        if let Some(password) = matches.value_of("password") {
            options = options.password(password);
        }
        let files: Vec<&str> = matches.values_of("files").into_iter().flatten().collect();

        let written = create(value(matches, "archive")?, &files, &options)?;
        println!("wrote {} bytes", written);
    } else if let Some(matches) = matches.subcommand_matches("extract") {
        let entries = extract_file(
            value(matches, "archive")?,
            value(matches, "dst")?,
            matches.value_of("password"),
        )?;
        for entry in entries {
            println!("{}", entry.path());
        }
    } else if let Some(matches) = matches.subcommand_matches("list") {
        println!("{}", list_file(value(matches, "archive")?)?);
    }
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {:#}", err);
        process::exit(1);
    }
}
