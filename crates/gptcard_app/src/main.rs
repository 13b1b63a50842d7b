use clap::Parser;

mod platform;

fn main() -> anyhow::Result<()> {
    platform::run_replay(platform::ReplayArgs::parse())
}
