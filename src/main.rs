use {
    anyhow::Result,
    clap::Parser,
    ddpg_ig::cli::{
        run,
        Args,
    },
};


fn main() -> Result<()> {
    run(Args::parse())
}
