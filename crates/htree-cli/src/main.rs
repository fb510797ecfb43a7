use anyhow::Context;
use htree_cli::commands::{self, RestartArgs};
use htree_cli::{cli, logging, CliConfig};
use std::io;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli::command().get_matches();
    logging::init(matches.get_flag("log-json"));

    let Some((name, args)) = matches.subcommand() else {
        anyhow::bail!("no subcommand given");
    };
    let config = CliConfig::load(args.get_one::<PathBuf>("config").map(PathBuf::as_path))?
        .with_endpoint(args.try_get_one::<String>("endpoint").ok().flatten().map(String::as_str));
    let json = args.get_flag("json");
    let mut out = io::stdout().lock();

    match name {
        "run" => {
            let problem = args.get_one::<String>("problem").context("missing problem")?;
            let scratchpad = args.get_one::<String>("scratchpad").map(String::as_str);
            commands::run(&config, problem, scratchpad, json, &mut out).await
        }
        "replay" => {
            let file = args.get_one::<PathBuf>("file").context("missing file")?;
            let chunk_size = args.get_one::<usize>("chunk-size").copied().unwrap_or(512);
            commands::replay(&config, file, chunk_size, json, &mut out).await
        }
        "restart" => {
            let get = |id: &str| {
                args.get_one::<String>(id)
                    .map(String::as_str)
                    .with_context(|| format!("missing --{id}"))
            };
            let tree = args.get_one::<PathBuf>("tree").context("missing --tree")?;
            let restart = RestartArgs {
                tree,
                node: get("node")?,
                text: get("text")?,
                reasoning: get("reasoning")?,
                problem: get("problem")?,
            };
            commands::restart(&config, restart, json, &mut out).await
        }
        "layout" => {
            let tree = args.get_one::<PathBuf>("tree").context("missing tree")?;
            commands::layout(&config, tree, json, &mut out)
        }
        other => anyhow::bail!("unknown subcommand: {other}"),
    }
}
