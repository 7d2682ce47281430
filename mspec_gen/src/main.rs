use clap::{Parser, Subcommand};
use mspec_gen::codegen::Backend;
use std::path::PathBuf;

mod cmds;

#[derive(Parser)]
#[command(name = "mspec-gen")]
#[command(about = "Protocol message compiler for mspec type definitions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /* Compile specification files into per-type generation plans */
    Codegen {
        /* Input YAML files containing type definitions */
        #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /* Target backend for code generation */
        #[arg(short = 'l', long = "language", value_enum, default_value = "go")]
        language: Backend,

        /* Output directory for generated plans */
        #[arg(
            short = 'o',
            long = "output",
            value_name = "DIR",
            default_value = "generated"
        )]
        output_dir: PathBuf,

        /* Override the protocol name used in generated identifiers */
        #[arg(long = "protocol", value_name = "NAME")]
        protocol: Option<String>,

        /* Override the flavor name used in generated identifiers */
        #[arg(long = "flavor", value_name = "NAME")]
        flavor: Option<String>,

        /* Enable verbose output */
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },

    /* Show the types, hierarchy and switch cases of specification files */
    Analyze {
        /* Input YAML files containing type definitions */
        #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /* Print the generation plan (JSON) of a specific type */
        #[arg(long = "print-plan", value_name = "TYPE")]
        print_plan: Option<String>,

        /* Backend used for --print-plan */
        #[arg(short = 'l', long = "language", value_enum, default_value = "go")]
        language: Backend,

        /* Enable verbose output */
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Codegen {
            files,
            language,
            output_dir,
            protocol,
            flavor,
            verbose,
        } => {
            cmds::common::init_tracing(verbose);
            cmds::codegen::run(files, language, output_dir, protocol, flavor, verbose)?;
        }

        Commands::Analyze {
            files,
            print_plan,
            language,
            verbose,
        } => {
            cmds::common::init_tracing(verbose);
            cmds::analyze::run(files, print_plan, language, verbose)?;
        }
    }

    Ok(())
}
