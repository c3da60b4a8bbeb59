use std::path::PathBuf;

use anyhow::Context;
use pvnet::{trainer::set_cbcs, NeuralNet};
use structopt::StructOpt;

/// Prints the structure of a saved network.
#[derive(StructOpt)]
pub struct InspectOptions {
    #[structopt(required = true, short, long)]
    input: PathBuf,
    /// Read the compact format instead of the labelled one.
    #[structopt(short, long)]
    compact: bool,
    /// Colour-blind-friendly colour scheme.
    #[structopt(long)]
    cbcs: bool,
}

impl InspectOptions {
    pub fn run(&self) -> anyhow::Result<()> {
        set_cbcs(self.cbcs);

        let loaded = if self.compact { NeuralNet::load_compact(&self.input) } else { NeuralNet::load(&self.input) };
        let net = loaded.with_context(|| format!("Failed to load network from {}.", self.input.display()))?;

        println!("{net}");
        net.print_structure();

        Ok(())
    }
}
