use std::path::{Path, PathBuf};

use clap::{command, value_parser, Arg, ArgMatches, Command};
use config::Config;
use context::Context;
use env_logger::Env;
use generator::generate;

mod aggregate;
mod config;
mod context;
mod frontmatter;
mod generator;
mod markdown;
mod post;
mod renderer;
mod sample;
mod server;
mod slug;
mod template;

fn cli() -> Command {
    command!()
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path of the site configuration file")
                .value_parser(value_parser!(PathBuf))
                .default_value("config.json")
                .global(true),
        )
        .subcommand(Command::new("build").about("Generate the site (the default)"))
        .subcommand(
            Command::new("serve")
                .about("Serve the generated site locally")
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_parser(value_parser!(u16))
                        .default_value("4000"),
                )
                .arg(
                    Arg::new("dir")
                        .short('d')
                        .long("dir")
                        .help("Directory to serve. Defaults to the configured output directory.")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

fn serve(config_path: &Path, matches: &ArgMatches) -> anyhow::Result<()> {
    let port: u16 = *matches.get_one("port").unwrap();
    let root = match matches.get_one::<PathBuf>("dir") {
        Some(dir) => dir.to_owned(),
        None => Config::load(config_path)?.output,
    };
    tokio::runtime::Runtime::new()?.block_on(server::run(root, port))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let matches = cli().get_matches();
    let config_path: &PathBuf = matches.get_one("config").unwrap();

    match matches.subcommand() {
        Some(("serve", sub)) => serve(config_path, sub),
        _ => generate(&Context::load(config_path)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn serve_takes_port_and_global_config() {
        let matches = cli()
            .try_get_matches_from(["blogsmith", "serve", "-p", "8080", "-c", "site/config.json"])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("config"),
            Some(&PathBuf::from("site/config.json"))
        );
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "serve");
        assert_eq!(sub.get_one::<u16>("port"), Some(&8080));
        assert_eq!(sub.get_one::<PathBuf>("dir"), None);
    }

    #[test]
    fn build_is_the_default() {
        let matches = cli().try_get_matches_from(["blogsmith"]).unwrap();
        assert!(matches.subcommand().is_none());
        assert_eq!(
            matches.get_one::<PathBuf>("config"),
            Some(&PathBuf::from("config.json"))
        );
    }
}
