use colored::Colorize;
use csbind::cli;
use csbind::driver::REPORTED_FAILURE;

fn main() -> anyhow::Result<()> {
    if let Err(e) = cli::run() {
        // Located model errors were already rendered against the source.
        if e.to_string() == REPORTED_FAILURE {
            std::process::exit(1);
        }
        eprintln!("{} {:?}", "error:".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use csbind::cli::{Command, CsbindCli};

    #[test]
    fn generate_command_honors_output_flag() {
        let cli = CsbindCli::parse_from([
            "csbind",
            "generate",
            "models/atomic/model.yaml",
            "--out",
            "target/bindings",
            "-p",
            "Atomic",
            "-p",
            "Network",
        ]);
        match cli.command() {
            Command::Generate {
                model,
                out,
                packages,
                ..
            } => {
                assert_eq!(model.to_string_lossy(), "models/atomic/model.yaml");
                assert_eq!(
                    out.as_ref().map(|p| p.to_string_lossy().into_owned()),
                    Some("target/bindings".into())
                );
                assert_eq!(packages, &["Atomic".to_string(), "Network".to_string()]);
            }
            other => panic!("expected generate command, got {other:?}"),
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli = CsbindCli::parse_from(["csbind", "check", "model.yaml", "--verbose"]);
        assert!(cli.verbose());
        assert!(matches!(cli.command(), Command::Check { .. }));
    }
}
