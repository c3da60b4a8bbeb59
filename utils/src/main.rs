mod convert;
mod graph;
mod inspect;

use structopt::StructOpt;

#[derive(StructOpt)]
pub enum Options {
    Convert(convert::ConvertOptions),
    Graph(graph::GraphOptions),
    Inspect(inspect::InspectOptions),
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Options::from_args() {
        Options::Convert(options) => options.run(),
        Options::Graph(options) => options.run(),
        Options::Inspect(options) => options.run(),
    }
}
