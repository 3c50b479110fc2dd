use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
struct Args {
    root: PathBuf,
    user_id: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let api = golf_api::ApiTree::open(args.root)?;
    let user = api.user(&args.user_id)?;
    println!("name={}", user.user.name);
    println!("handicap={}", user.user.handicap);
    println!("rounds={}", user.rounds.len());
    match &user.statistics {
        Some(stats) => {
            println!("avg_score={}", stats.avg_score);
            println!("best_score={}", stats.best_score);
            println!("recent_form={:?}", stats.recent_form);
        }
        None => println!("statistics=none"),
    }
    Ok(())
}
