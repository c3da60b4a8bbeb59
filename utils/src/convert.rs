use std::{path::PathBuf, time::Instant};

use anyhow::Context;
use pvnet::NeuralNet;
use structopt::StructOpt;

/// Rewrites a network saved in the labelled format in the compact format.
#[derive(StructOpt)]
pub struct ConvertOptions {
    #[structopt(required = true, short, long)]
    input: PathBuf,
    #[structopt(required = true, short, long)]
    output: PathBuf,
}

impl ConvertOptions {
    pub fn run(&self) -> anyhow::Result<()> {
        let timer = Instant::now();

        let mut net = NeuralNet::load(&self.input)
            .with_context(|| format!("Failed to load network from {}.", self.input.display()))?;

        net.save_compact(&self.output)
            .with_context(|| format!("Failed to write network to {}.", self.output.display()))?;

        println!("Converted {net} in {:.3}s", timer.elapsed().as_secs_f32());
        Ok(())
    }
}
