mod cli;

use galley::node::NodeData;
use galley::recipe_documents::RecipeDocuments;
use std::io::Write;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("GALLEY_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Compile(compile_cli) => compile(compile_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn compile(cli: cli::CompileCommand) -> anyhow::Result<()> {
    let documents = load(&cli.input)?;
    let mut recipe = documents.into_recipe();
    recipe.set_node(load_node(&cli.node)?);

    let script = recipe.to_script()?;

    let mut stdout = std::io::stdout().lock();
    if cli.shebang {
        writeln!(stdout, "#!/bin/sh")?;
    }
    stdout.write_all(script.as_bytes())?;
    Ok(())
}

fn load(input: &cli::InputArgs) -> anyhow::Result<RecipeDocuments> {
    if !input.workdir && input.files.is_empty() && input.directories.is_empty() {
        let stdin = std::io::read_to_string(std::io::stdin())?;
        let body = hcl_edit::parser::parse_body(&stdin)?;
        return Ok(body.into());
    }

    let mut documents = RecipeDocuments::default();

    if input.workdir {
        documents.load_directory(&std::env::current_dir()?)?;
    }

    for file_path in &input.files {
        documents.load_file(file_path)?;
    }

    for dir_path in &input.directories {
        documents.load_directory(dir_path)?;
    }

    anyhow::ensure!(documents.source_count() > 0, "No files loaded");

    Ok(documents)
}

fn load_node(args: &cli::NodeArgs) -> anyhow::Result<NodeData> {
    let Some(path) = &args.node else {
        return Ok(NodeData::default());
    };

    tracing::info!(path=%path.display(), "loading node data");
    let contents = std::fs::read_to_string(path)?;
    // yaml is a superset of json
    let node = serde_yaml::from_str(&contents)?;
    Ok(node)
}

fn output(output: &cli::OutputArgs, node: &NodeData) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), node)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), node)?,
    };

    Ok(())
}

/// (galley-)developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    use cli::DevSubCommand::*;

    let documents = load(&cli.input)?;
    let node = load_node(&cli.node)?;

    match cli.command {
        Documents => println!("{documents:#?}"),
        Tree => {
            let mut recipe = documents.into_recipe();
            recipe.set_node(node);
            println!("{:#?}", recipe.evaluate());
        }
        Node(output_args) => output(&output_args, &node)?,
    }

    Ok(())
}
